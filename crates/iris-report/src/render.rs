//! Report rendering.

use std::path::{Path, PathBuf};

use minijinja::{context, Environment};
use serde::Serialize;

use iris_models::{Metric, Report, ViolationInterval};

use crate::error::{ReportError, ReportResult};

/// Name of the report page template.
pub const REPORT_TEMPLATE: &str = "report.html";

const EMBEDDED_REPORT_TEMPLATE: &str = include_str!("../templates/report.html");

/// Turns a finished report into markup.
pub trait ReportRenderer: Send + Sync {
    fn render(&self, template: &str, report: &Report) -> ReportResult<String>;
}

#[derive(Debug, Serialize)]
struct ViolationRow {
    index: u32,
    start: String,
    end: String,
    duration_secs: f64,
    artifact_path: Option<String>,
}

impl From<&ViolationInterval> for ViolationRow {
    fn from(interval: &ViolationInterval) -> Self {
        Self {
            index: interval.index,
            start: interval.start.to_string(),
            end: interval.end.to_string(),
            duration_secs: interval.duration_millis() as f64 / 1000.0,
            artifact_path: interval.artifact_path.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct MetricSection {
    metric: Metric,
    label: &'static str,
    violations: Vec<ViolationRow>,
}

fn sections(report: &Report) -> Vec<MetricSection> {
    report
        .metric_logs()
        .iter()
        .map(|(metric, log)| MetricSection {
            metric: *metric,
            label: metric.label(),
            violations: log.iter().map(ViolationRow::from).collect(),
        })
        .collect()
}

/// [`ReportRenderer`] backed by minijinja templates.
///
/// A report template file is read and compiled on every render, so a bad
/// file only fails the render step.
pub struct TemplateRenderer {
    env: Environment<'static>,
    report_file: Option<PathBuf>,
}

impl TemplateRenderer {
    /// Renderer with the built-in report template.
    pub fn new() -> ReportResult<Self> {
        let mut env = Environment::new();
        env.add_template(REPORT_TEMPLATE, EMBEDDED_REPORT_TEMPLATE)
            .map_err(|e| ReportError::render(e.to_string()))?;
        Ok(Self {
            env,
            report_file: None,
        })
    }

    /// Renderer whose report template is read from `path` when rendering.
    pub fn from_file(path: impl AsRef<Path>) -> ReportResult<Self> {
        let mut renderer = Self::new()?;
        renderer.report_file = Some(path.as_ref().to_path_buf());
        Ok(renderer)
    }

    fn read_report_file(path: &Path) -> ReportResult<String> {
        std::fs::read_to_string(path).map_err(|e| {
            ReportError::render(format!("cannot read template {}: {}", path.display(), e))
        })
    }

    /// Register or replace a template.
    pub fn with_template(
        mut self,
        name: impl Into<String>,
        source: impl Into<String>,
    ) -> ReportResult<Self> {
        self.env
            .add_template_owned(name.into(), source.into())
            .map_err(|e| ReportError::render(e.to_string()))?;
        Ok(self)
    }
}

impl ReportRenderer for TemplateRenderer {
    fn render(&self, template: &str, report: &Report) -> ReportResult<String> {
        let ctx = context! {
            video_id => report.source_video_id(),
            generated_at => report.generated_at().to_rfc3339(),
            total_violations => report.total_violations(),
            sections => sections(report),
            report => report,
        };

        let rendered = match &self.report_file {
            Some(path) if template == REPORT_TEMPLATE => {
                let source = Self::read_report_file(path)?;
                self.env.render_named_str(REPORT_TEMPLATE, &source, ctx)
            }
            _ => self
                .env
                .get_template(template)
                .and_then(|tmpl| tmpl.render(ctx)),
        };
        rendered.map_err(|e| ReportError::render(e.to_string()))
    }
}
