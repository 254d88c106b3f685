//! End-to-end report pipeline tests with an in-memory frame capture.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;

use iris_media::{CaptureRequest, FrameCapture, MediaError, MediaResult, OutputCleaner};
use iris_models::{Metric, Timestamp};
use iris_report::{
    ColumnMapping, ColumnSelector, ReportConfig, ReportError, ReportPipeline, TemplateRenderer,
};

/// Writes a placeholder image, failing at chosen timestamps.
#[derive(Default)]
struct FakeCapture {
    fail_at: Vec<Timestamp>,
    requests: Mutex<Vec<CaptureRequest>>,
}

#[async_trait]
impl FrameCapture for FakeCapture {
    async fn capture(&self, request: &CaptureRequest) -> MediaResult<PathBuf> {
        self.requests.lock().unwrap().push(request.clone());
        if self.fail_at.contains(&request.timestamp) {
            return Err(MediaError::ProcessFailed {
                exit_code: Some(1),
                stderr: "simulated failure".to_string(),
            });
        }
        let path = request.output_path();
        tokio::fs::write(&path, b"\x89PNG").await?;
        Ok(path)
    }
}

/// Cleanup that always fails, as on a read-only report root.
struct FailingCleaner;

#[async_trait]
impl OutputCleaner for FailingCleaner {
    async fn clean(&self, _dir: &Path) -> MediaResult<()> {
        Err(MediaError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "read-only report directory",
        )))
    }
}

struct Fixture {
    dir: TempDir,
    metrics_path: PathBuf,
}

impl Fixture {
    fn new(csv: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let video_dir = dir.path().join("flash-test.mp4");
        std::fs::create_dir_all(&video_dir).unwrap();
        let metrics_path = video_dir.join("metrics.csv");
        std::fs::write(&metrics_path, csv).unwrap();
        Self { dir, metrics_path }
    }

    fn report_dir(&self) -> PathBuf {
        self.dir.path().join("report")
    }

    fn config(&self) -> ReportConfig {
        ReportConfig {
            report_dir: self.report_dir(),
            video_dir: self.dir.path().join("videos"),
            columns: ColumnMapping {
                timestamp: ColumnSelector::Name("TimeStamp".to_string()),
                luminance: ColumnSelector::Name("LuminanceFlash".to_string()),
                red: ColumnSelector::Name("RedFlash".to_string()),
            },
            ..Default::default()
        }
    }

    fn pipeline(&self, capture: Arc<FakeCapture>) -> ReportPipeline {
        self.pipeline_with(self.config(), capture)
    }

    fn pipeline_with(&self, config: ReportConfig, capture: Arc<FakeCapture>) -> ReportPipeline {
        ReportPipeline::new(config, capture, Arc::new(TemplateRenderer::new().unwrap()))
    }
}

fn csv(rows: &[(&str, f64, f64)]) -> String {
    let mut out = String::from("TimeStamp,LuminanceFlash,RedFlash\n");
    for (ts, lum, red) in rows {
        out.push_str(&format!("{},{},{}\n", ts, lum, red));
    }
    out
}

fn ts(raw: &str) -> Timestamp {
    Timestamp::parse(raw).unwrap()
}

#[tokio::test]
async fn test_full_run_writes_report_and_frames() {
    let fixture = Fixture::new(&csv(&[
        ("00:00:01", 2.0, 0.0),
        ("00:00:02", 4.0, 0.0),
        ("00:00:03", 5.0, 3.0),
        ("00:00:04", 1.0, 3.5),
        ("00:00:05", 0.0, 1.0),
    ]));
    let capture = Arc::new(FakeCapture::default());

    let output = fixture.pipeline(capture.clone()).run(&fixture.metrics_path).await.unwrap();

    let report = &output.report;
    assert_eq!(report.source_video_id(), "flash-test.mp4");
    assert_eq!(report.total_violations(), 2);

    let lum = &report.log(Metric::Luminance).unwrap().intervals()[0];
    assert_eq!((lum.start, lum.end, lum.index), (ts("00:00:02"), ts("00:00:04"), 1));
    let red = &report.log(Metric::Red).unwrap().intervals()[0];
    assert_eq!((red.start, red.end, red.index), (ts("00:00:03"), ts("00:00:05"), 1));

    let lum_frame = lum.artifact_path.as_deref().unwrap();
    assert_eq!(lum_frame, "luminanceFrames/frame_001_at_00-00-02.png");
    assert!(fixture.report_dir().join(lum_frame).is_file());
    assert!(fixture
        .report_dir()
        .join(red.artifact_path.as_deref().unwrap())
        .is_file());

    let requests = capture.requests.lock().unwrap();
    assert_eq!(requests.len(), 2);
    assert!(requests
        .iter()
        .all(|r| r.video_path == fixture.dir.path().join("videos").join("flash-test.mp4")));

    let html = std::fs::read_to_string(&output.report_path).unwrap();
    assert!(html.contains("flash-test.mp4"));
    assert!(html.contains("frame_001_at_00-00-02.png"));

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&output.violations_path).unwrap()).unwrap();
    assert_eq!(json["source_video_id"], "flash-test.mp4");
    assert_eq!(json["metric_logs"]["red"]["intervals"][0]["end"], "00:00:05");
}

#[tokio::test]
async fn test_open_violation_is_flushed_at_last_sample() {
    let fixture = Fixture::new(&csv(&[
        ("00:00:07", 1.0, 0.0),
        ("00:00:08", 1.0, 0.0),
        ("00:00:09", 6.0, 0.0),
    ]));

    let output = fixture
        .pipeline(Arc::new(FakeCapture::default()))
        .run(&fixture.metrics_path)
        .await
        .unwrap();

    let intervals = output.report.log(Metric::Luminance).unwrap().intervals();
    assert_eq!(intervals.len(), 1);
    assert_eq!(intervals[0].start, ts("00:00:09"));
    assert_eq!(intervals[0].end, ts("00:00:09"));
}

#[tokio::test]
async fn test_quiet_video_issues_no_captures() {
    let fixture = Fixture::new(&csv(&[("00:00:01", 1.0, 2.0), ("00:00:02", 2.9, 0.0)]));
    let capture = Arc::new(FakeCapture::default());

    let output = fixture.pipeline(capture.clone()).run(&fixture.metrics_path).await.unwrap();

    assert_eq!(output.report.total_violations(), 0);
    assert_eq!(output.sampling.requested, 0);
    assert!(capture.requests.lock().unwrap().is_empty());
    assert!(output.report_path.is_file());
}

#[tokio::test]
async fn test_failed_capture_degrades_single_interval() {
    let fixture = Fixture::new(&csv(&[
        ("00:00:01", 4.0, 0.0),
        ("00:00:02", 1.0, 0.0),
        ("00:00:03", 4.0, 0.0),
        ("00:00:04", 1.0, 0.0),
    ]));
    let capture = Arc::new(FakeCapture {
        fail_at: vec![ts("00:00:03")],
        ..Default::default()
    });

    let output = fixture.pipeline(capture).run(&fixture.metrics_path).await.unwrap();

    let intervals = output.report.log(Metric::Luminance).unwrap().intervals();
    assert_eq!(intervals.len(), 2);
    assert_eq!(intervals[0].index, 1);
    assert!(intervals[0].artifact_path.is_some());
    assert_eq!(intervals[1].index, 2);
    assert!(intervals[1].artifact_path.is_none());
    assert_eq!(output.sampling.failed, 1);

    let html = std::fs::read_to_string(&output.report_path).unwrap();
    assert!(html.contains("frame unavailable"));
}

#[tokio::test]
async fn test_stale_output_is_removed() {
    let fixture = Fixture::new(&csv(&[("00:00:01", 0.0, 0.0)]));
    let stale = fixture.report_dir().join("redFrames").join("old.png");
    std::fs::create_dir_all(stale.parent().unwrap()).unwrap();
    std::fs::write(&stale, b"old").unwrap();

    fixture
        .pipeline(Arc::new(FakeCapture::default()))
        .run(&fixture.metrics_path)
        .await
        .unwrap();

    assert!(!stale.exists());
    assert!(fixture.report_dir().join("redFrames").is_dir());
}

#[tokio::test]
async fn test_malformed_row_is_input_error() {
    let fixture = Fixture::new("TimeStamp,LuminanceFlash,RedFlash\n00:00:01,4,0\n00:00:02,x,0\n");
    let capture = Arc::new(FakeCapture::default());

    let err = fixture
        .pipeline(capture.clone())
        .run(&fixture.metrics_path)
        .await
        .unwrap_err();

    assert!(err.is_input_error());
    assert!(capture.requests.lock().unwrap().is_empty());
    assert!(!fixture.report_dir().join("index.html").exists());
}

#[tokio::test]
async fn test_missing_metrics_file() {
    let fixture = Fixture::new(&csv(&[]));
    let missing = fixture.dir.path().join("other.mp4").join("metrics.csv");

    let err = fixture
        .pipeline(Arc::new(FakeCapture::default()))
        .run(&missing)
        .await
        .unwrap_err();

    assert!(matches!(err, ReportError::Reader(_)));
}

#[tokio::test]
async fn test_unwritable_output_is_output_error() {
    let fixture = Fixture::new(&csv(&[("00:00:01", 5.0, 0.0)]));
    let blocked = fixture.dir.path().join("not-a-dir");
    std::fs::write(&blocked, b"file").unwrap();
    let config = ReportConfig {
        report_dir: blocked,
        ..fixture.config()
    };

    let err = fixture
        .pipeline_with(config, Arc::new(FakeCapture::default()))
        .run(&fixture.metrics_path)
        .await
        .unwrap_err();

    assert!(err.is_output_error());
}

#[tokio::test]
async fn test_default_columns_read_legacy_layout() {
    let header = std::iter::once("TimeStamp".to_string())
        .chain((1..14).map(|i| format!("col{}", i)))
        .collect::<Vec<_>>()
        .join(",");
    let row = |t: &str, lum: f64, red: f64| {
        format!("{},0,0,0,0,0,0,0,0,0,0,0,{},{}", t, lum, red)
    };
    let body = [
        header,
        row("00:00:01", 0.0, 3.0),
        row("00:00:02", 0.0, 0.0),
    ]
    .join("\n");
    let fixture = Fixture::new(&body);
    let config = ReportConfig {
        columns: ColumnMapping::default(),
        ..fixture.config()
    };

    let output = fixture
        .pipeline_with(config, Arc::new(FakeCapture::default()))
        .run(&fixture.metrics_path)
        .await
        .unwrap();

    assert!(output.report.log(Metric::Luminance).unwrap().is_empty());
    assert_eq!(output.report.log(Metric::Red).unwrap().len(), 1);
}

#[tokio::test]
async fn test_cleanup_failure_is_not_fatal() {
    let fixture = Fixture::new(&csv(&[("00:00:01", 5.0, 0.0), ("00:00:02", 0.0, 0.0)]));
    let stale = fixture.report_dir().join("old.html");
    std::fs::create_dir_all(fixture.report_dir()).unwrap();
    std::fs::write(&stale, b"old").unwrap();

    let output = fixture
        .pipeline(Arc::new(FakeCapture::default()))
        .with_cleaner(Arc::new(FailingCleaner))
        .run(&fixture.metrics_path)
        .await
        .unwrap();

    assert!(stale.exists());
    assert!(output.report_path.is_file());
    assert_eq!(output.sampling.captured, 1);
    assert_eq!(output.report.total_violations(), 1);
}

#[tokio::test]
async fn test_missing_template_file_fails_only_at_render() {
    let fixture = Fixture::new(&csv(&[("00:00:01", 5.0, 0.0), ("00:00:02", 0.0, 0.0)]));
    let template = fixture.dir.path().join("missing.html");
    let config = ReportConfig {
        template_path: Some(template.clone()),
        ..fixture.config()
    };
    assert!(ReportPipeline::from_config(config.clone()).is_ok());

    let capture = Arc::new(FakeCapture::default());
    let renderer = TemplateRenderer::from_file(&template).unwrap();
    let err = ReportPipeline::new(config, capture.clone(), Arc::new(renderer))
        .run(&fixture.metrics_path)
        .await
        .unwrap_err();

    assert!(matches!(err, ReportError::Render(_)));
    assert!(err.is_output_error());
    assert_eq!(capture.requests.lock().unwrap().len(), 1);
    assert!(fixture
        .report_dir()
        .join("luminanceFrames/frame_001_at_00-00-01.png")
        .is_file());
    assert!(!fixture.report_dir().join("index.html").exists());
}
