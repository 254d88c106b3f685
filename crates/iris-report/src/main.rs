//! Photosensitivity report binary.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use iris_report::{ReportConfig, ReportOutput, ReportPipeline, DEFAULT_LOG_FILTER};

/// Report flashing-content violations for a video from its metrics file.
#[derive(Parser)]
#[command(name = "iris-report")]
#[command(about = "Generate a photosensitivity violation report", long_about = None)]
struct Cli {
    /// Metrics CSV, stored in a directory named after the source video
    metrics_file: PathBuf,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();
    init_tracing();

    let config = ReportConfig::from_env();
    info!("Report config: {:?}", config);

    match run(config, cli).await {
        Ok(output) => {
            info!(
                violations = output.report.total_violations(),
                frames_captured = output.sampling.captured,
                frames_failed = output.sampling.failed,
                "Report written to {}",
                output.report_path.display()
            );
        }
        Err(e) => {
            error!("{:#}", e);
            std::process::exit(1);
        }
    }
}

async fn run(config: ReportConfig, cli: Cli) -> anyhow::Result<ReportOutput> {
    let pipeline = ReportPipeline::from_config(config).context("failed to set up report pipeline")?;
    let output = pipeline
        .run(&cli.metrics_file)
        .await
        .with_context(|| format!("report for {} failed", cli.metrics_file.display()))?;
    Ok(output)
}

/// Colored output by default, JSON when `LOG_FORMAT=json`.
fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}
