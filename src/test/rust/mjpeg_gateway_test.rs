use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use mjpeg_gateway::{
    metrics_routes, routes, BackoffPolicy, Config, DecodeOutcome, DomainError, Frame, FrameDecoder,
    JpegCodec, MetricsReporter, NoopMetrics, PrometheusReporter, RegistryService, Result,
    RetryPolicy, SourceKind, SourceLocator, SourceOpener, SqliteSourceRegistry, StreamConfig,
    StreamingService,
};
use serde_json::Value;
use tempfile::TempDir;
use warp::http::StatusCode;

/// Plays back a script chosen by the locator:
/// `frames:N` yields N frames then ends, `broken` fails every read,
/// `offline` refuses to open.
struct ScriptedOpener;

struct ScriptedDecoder {
    remaining: usize,
    broken: bool,
}

impl FrameDecoder for ScriptedDecoder {
    fn read(&mut self) -> Result<DecodeOutcome> {
        if self.broken {
            return Err(DomainError::Decode("corrupt stream".to_string()));
        }
        if self.remaining == 0 {
            return Ok(DecodeOutcome::EndOfStream);
        }
        self.remaining -= 1;
        let frame = Frame::from_rgb(vec![128; 8 * 8 * 3], 8, 8)?;
        Ok(DecodeOutcome::Frame(frame))
    }

    fn release(&mut self) {}
}

impl SourceOpener for ScriptedOpener {
    fn open(
        &self,
        _kind: SourceKind,
        locator: &SourceLocator,
        _config: &StreamConfig,
    ) -> Result<Box<dyn FrameDecoder>> {
        let script = locator.as_str();
        if script == "offline" {
            return Err(DomainError::Open("connection refused".to_string()));
        }
        let remaining = script
            .strip_prefix("frames:")
            .and_then(|n| n.parse().ok())
            .unwrap_or(0);
        Ok(Box::new(ScriptedDecoder {
            remaining,
            broken: script == "broken",
        }))
    }
}

struct Gateway {
    _dir: TempDir,
    db_path: PathBuf,
    registry: Arc<RegistryService>,
    streaming: Arc<StreamingService>,
}

fn create_gateway() -> Gateway {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("cameras.db");
    let store = Arc::new(SqliteSourceRegistry::open(&db_path).unwrap());

    let config = StreamConfig::new()
        .with_retry_policy(RetryPolicy::new(3, BackoffPolicy::immediate()));
    let streaming = StreamingService::new(
        store.clone(),
        Arc::new(ScriptedOpener),
        Arc::new(JpegCodec::default()),
        Arc::new(NoopMetrics),
        config,
    )
    .unwrap();

    Gateway {
        _dir: dir,
        db_path,
        registry: Arc::new(RegistryService::new(store)),
        streaming: Arc::new(streaming),
    }
}

fn create_test_config() -> Config {
    Config {
        port: 5000,
        db_path: PathBuf::from("cameras.db"),
        metrics_port: 9001,
        capture_width: 1920,
        capture_height: 1080,
        open_timeout_ms: 10_000,
        read_timeout_ms: 5_000,
        max_read_failures: 100,
        retry_initial_delay_ms: 50,
        retry_max_delay_ms: 2_000,
        retry_multiplier: 2.0,
        jpeg_quality: 80,
        verbose: false,
    }
}

fn message_of(body: &[u8]) -> String {
    let json: Value = serde_json::from_slice(body).unwrap();
    json["message"].as_str().unwrap().to_string()
}

async fn add_camera(gw: &Gateway, id: i64, url: &str) -> (StatusCode, String) {
    let res = warp::test::request()
        .method("POST")
        .path("/add_camera")
        .json(&serde_json::json!({ "camera_id": id, "rtsp_url": url }))
        .reply(&routes(gw.registry.clone(), gw.streaming.clone()))
        .await;
    (res.status(), message_of(res.body()))
}

async fn add_video(gw: &Gateway, id: i64, path: &str) -> (StatusCode, String) {
    let res = warp::test::request()
        .method("POST")
        .path("/add_video")
        .json(&serde_json::json!({ "video_id": id, "video_path": path }))
        .reply(&routes(gw.registry.clone(), gw.streaming.clone()))
        .await;
    (res.status(), message_of(res.body()))
}

#[tokio::test]
async fn test_camera_registry_lifecycle() {
    let gw = create_gateway();
    let api = routes(gw.registry.clone(), gw.streaming.clone());

    assert_eq!(
        add_camera(&gw, 1, "rtsp://x").await,
        (StatusCode::OK, "Camera added successfully".to_string())
    );
    assert_eq!(
        add_camera(&gw, 1, "rtsp://y").await,
        (StatusCode::BAD_REQUEST, "Camera already exists".to_string())
    );

    let res = warp::test::request()
        .method("DELETE")
        .path("/delete_camera/1")
        .reply(&api)
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(message_of(res.body()), "Camera deleted successfully");

    let res = warp::test::request()
        .method("DELETE")
        .path("/delete_camera/1")
        .reply(&api)
        .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(message_of(res.body()), "Camera not found");
}

#[tokio::test]
async fn test_add_camera_requires_both_fields() {
    let gw = create_gateway();

    let res = warp::test::request()
        .method("POST")
        .path("/add_camera")
        .json(&serde_json::json!({ "camera_id": 3 }))
        .reply(&routes(gw.registry.clone(), gw.streaming.clone()))
        .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        message_of(res.body()),
        "Both camera_id and rtsp_url are required"
    );
}

#[tokio::test]
async fn test_video_ids_are_separate_from_camera_ids() {
    let gw = create_gateway();

    assert_eq!(add_camera(&gw, 7, "rtsp://cam").await.0, StatusCode::OK);
    assert_eq!(
        add_video(&gw, 7, "/videos/a.mp4").await,
        (StatusCode::OK, "Video added successfully".to_string())
    );

    let res = warp::test::request()
        .method("DELETE")
        .path("/delete_video/8")
        .reply(&routes(gw.registry.clone(), gw.streaming.clone()))
        .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(message_of(res.body()), "Video not found");
}

#[tokio::test]
async fn test_registry_survives_restart() {
    let gw = create_gateway();
    assert_eq!(add_video(&gw, 2, "/videos/b.mp4").await.0, StatusCode::OK);

    let reopened = SqliteSourceRegistry::open(&gw.db_path).unwrap();
    let service = RegistryService::new(Arc::new(reopened));
    let locator = service
        .locate(SourceKind::VideoFile, mjpeg_gateway::SourceId::new(2).unwrap())
        .await
        .unwrap();

    assert_eq!(locator.as_str(), "/videos/b.mp4");
}

#[tokio::test]
async fn test_stream_unknown_id_is_not_found() {
    let gw = create_gateway();
    let api = routes(gw.registry.clone(), gw.streaming.clone());

    for path in ["/camera/99", "/video/99", "/single_frame/99", "/single_frame_video/99"] {
        let res = warp::test::request().path(path).reply(&api).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND, "{}", path);
    }
}

#[tokio::test]
async fn test_video_stream_sends_every_frame_then_ends() {
    let gw = create_gateway();
    assert_eq!(add_video(&gw, 1, "frames:4").await.0, StatusCode::OK);

    let res = warp::test::request()
        .path("/video/1")
        .reply(&routes(gw.registry.clone(), gw.streaming.clone()))
        .await;

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers()["content-type"],
        "multipart/x-mixed-replace; boundary=frame"
    );

    let body = res.body();
    let marker = b"--frame\r\nContent-Type: image/jpeg\r\n\r\n";
    let parts = body.windows(marker.len()).filter(|w| *w == marker).count();
    assert_eq!(parts, 4);
    assert!(body.starts_with(marker));
    assert!(body.ends_with(&[0xFF, 0xD9, b'\r', b'\n']));
}

#[tokio::test]
async fn test_stream_open_failure_is_server_error() {
    let gw = create_gateway();
    assert_eq!(add_camera(&gw, 1, "offline").await.0, StatusCode::OK);

    let res = warp::test::request()
        .path("/camera/1")
        .reply(&routes(gw.registry.clone(), gw.streaming.clone()))
        .await;

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(message_of(res.body()), "Unable to open source");
}

#[tokio::test]
async fn test_single_frame_returns_jpeg() {
    let gw = create_gateway();
    assert_eq!(add_camera(&gw, 1, "frames:1").await.0, StatusCode::OK);

    let res = warp::test::request()
        .path("/single_frame/1")
        .reply(&routes(gw.registry.clone(), gw.streaming.clone()))
        .await;

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["content-type"], "image/jpeg");
    assert!(res.body().starts_with(&[0xFF, 0xD8]));
}

#[tokio::test]
async fn test_single_frame_failures_are_server_errors() {
    let gw = create_gateway();
    assert_eq!(add_video(&gw, 1, "broken").await.0, StatusCode::OK);
    assert_eq!(add_video(&gw, 2, "offline").await.0, StatusCode::OK);
    assert_eq!(add_video(&gw, 3, "frames:0").await.0, StatusCode::OK);
    let api = routes(gw.registry.clone(), gw.streaming.clone());

    for path in [
        "/single_frame_video/1",
        "/single_frame_video/2",
        "/single_frame_video/3",
    ] {
        let res = warp::test::request().path(path).reply(&api).await;
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR, "{}", path);
        assert_eq!(message_of(res.body()), "Unable to fetch frame");
    }
}

#[tokio::test]
async fn test_non_positive_path_id_is_not_found() {
    let gw = create_gateway();

    let res = warp::test::request()
        .path("/camera/0")
        .reply(&routes(gw.registry.clone(), gw.streaming.clone()))
        .await;

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_wrong_method_is_rejected() {
    let gw = create_gateway();

    let res = warp::test::request()
        .method("GET")
        .path("/add_camera")
        .reply(&routes(gw.registry.clone(), gw.streaming.clone()))
        .await;

    assert!(res.status().is_client_error());
}

#[test]
fn test_config_validation() {
    let config = create_test_config();
    assert!(config.validate().is_ok());

    let mut same_ports = create_test_config();
    same_ports.metrics_port = same_ports.port;
    assert!(same_ports.validate().is_err());

    let mut bad_quality = create_test_config();
    bad_quality.jpeg_quality = 0;
    assert!(bad_quality.validate().is_err());

    for multiplier in [1.0, f64::NAN, f64::INFINITY] {
        let mut bad_multiplier = create_test_config();
        bad_multiplier.retry_multiplier = multiplier;
        assert!(bad_multiplier.validate().is_err(), "accepted {}", multiplier);
        assert!(bad_multiplier.to_backoff_policy().is_err());
    }
}

#[test]
fn test_config_converts_to_stream_config() {
    let config = create_test_config();
    let stream = config.to_stream_config().unwrap();

    assert_eq!(stream.capture_hint().width(), 1920);
    assert_eq!(stream.capture_hint().height(), 1080);
    assert_eq!(stream.open_timeout(), Duration::from_secs(10));
    assert_eq!(stream.read_timeout(), Duration::from_secs(5));
    assert_eq!(stream.retry_policy().max_consecutive_failures(), Some(100));
}

#[tokio::test]
async fn test_metrics_endpoints_report_gateway_activity() {
    match PrometheusReporter::init_metrics() {
        Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
        Err(e) => panic!("metrics failed to register: {}", e),
    }

    let reporter = PrometheusReporter::new();
    reporter.report_session_started(SourceKind::Camera);
    reporter.report_frame_sent(2048);
    reporter.report_transient_failure();
    reporter.report_snapshot(SourceKind::VideoFile, false);
    reporter.report_session_aborted(SourceKind::Camera);

    let gw = create_gateway();
    let registry = Arc::new(SqliteSourceRegistry::open(&gw.db_path).unwrap());
    let ops = metrics_routes(registry);

    let res = warp::test::request().path("/metrics").reply(&ops).await;
    assert_eq!(res.status(), StatusCode::OK);
    let text = String::from_utf8(res.body().to_vec()).unwrap();
    assert!(text.contains("mjpeg_frames_sent_total"));
    assert!(text.contains("mjpeg_bytes_sent_total"));
    assert!(text.contains("mjpeg_transient_read_failures_total"));
    assert!(text.contains(r#"mjpeg_streams_total{kind="camera"}"#));
    assert!(text.contains(r#"mjpeg_snapshots_total{kind="video",outcome="failed"}"#));

    let res = warp::test::request().path("/health").reply(&ops).await;
    assert_eq!(res.status(), StatusCode::OK);
    let health: Value = serde_json::from_slice(res.body()).unwrap();
    assert_eq!(health["service"], "mjpeg-gateway");
    assert_eq!(health["status"], "healthy");

    let res = warp::test::request().path("/readyz").reply(&ops).await;
    assert_eq!(res.status(), StatusCode::OK);
    let ready: Value = serde_json::from_slice(res.body()).unwrap();
    assert_eq!(ready["status"], "ready");
}
