use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

use crate::domain::entities::SessionReport;
use crate::domain::ports::MetricsReporter;
use crate::domain::value_objects::SourceKind;

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();
    pub static ref ACTIVE_STREAMS: IntGauge = IntGauge::new(
        "mjpeg_active_streams",
        "Number of MJPEG stream sessions currently running"
    ).expect("metric can be created");
    pub static ref STREAMS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("mjpeg_streams_total", "Total stream sessions started since server start"),
        &["kind"]
    ).expect("metric can be created");
    pub static ref FRAMES_SENT: IntCounter = IntCounter::new(
        "mjpeg_frames_sent_total",
        "Total multipart frames written to clients"
    ).expect("metric can be created");
    pub static ref BYTES_SENT: IntCounter = IntCounter::new(
        "mjpeg_bytes_sent_total",
        "Total multipart bytes written to clients"
    ).expect("metric can be created");
    pub static ref TRANSIENT_READ_FAILURES: IntCounter = IntCounter::new(
        "mjpeg_transient_read_failures_total",
        "Camera reads that failed and were retried"
    ).expect("metric can be created");
    pub static ref SNAPSHOTS: IntCounterVec = IntCounterVec::new(
        Opts::new("mjpeg_snapshots_total", "Single-frame fetches by outcome"),
        &["kind", "outcome"]
    ).expect("metric can be created");
}

pub struct PrometheusReporter;

impl PrometheusReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn init_metrics() -> Result<(), prometheus::Error> {
        REGISTRY.register(Box::new(ACTIVE_STREAMS.clone()))?;
        REGISTRY.register(Box::new(STREAMS_TOTAL.clone()))?;
        REGISTRY.register(Box::new(FRAMES_SENT.clone()))?;
        REGISTRY.register(Box::new(BYTES_SENT.clone()))?;
        REGISTRY.register(Box::new(TRANSIENT_READ_FAILURES.clone()))?;
        REGISTRY.register(Box::new(SNAPSHOTS.clone()))?;
        Ok(())
    }

    pub fn gather_metrics() -> Vec<u8> {
        let encoder = TextEncoder::new();
        let metric_families = REGISTRY.gather();
        let mut buffer = vec![];
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            tracing::error!("Failed to encode metrics: {}", e);
            return b"# Error encoding metrics\n".to_vec();
        }
        buffer
    }

    pub fn active_streams() -> i64 {
        ACTIVE_STREAMS.get()
    }
}

impl Default for PrometheusReporter {
    fn default() -> Self {
        Self::new()
    }
}

fn kind_label(kind: SourceKind) -> &'static str {
    match kind {
        SourceKind::Camera => "camera",
        SourceKind::VideoFile => "video",
    }
}

impl MetricsReporter for PrometheusReporter {
    fn report_session_started(&self, kind: SourceKind) {
        ACTIVE_STREAMS.inc();
        STREAMS_TOTAL.with_label_values(&[kind_label(kind)]).inc();
    }

    fn report_session_stopped(&self, _report: &SessionReport) {
        ACTIVE_STREAMS.dec();
    }

    fn report_session_aborted(&self, _kind: SourceKind) {
        ACTIVE_STREAMS.dec();
    }

    fn report_frame_sent(&self, bytes: usize) {
        FRAMES_SENT.inc();
        BYTES_SENT.inc_by(bytes as u64);
    }

    fn report_transient_failure(&self) {
        TRANSIENT_READ_FAILURES.inc();
    }

    fn report_snapshot(&self, kind: SourceKind, succeeded: bool) {
        let outcome = if succeeded { "ok" } else { "failed" };
        SNAPSHOTS
            .with_label_values(&[kind_label(kind), outcome])
            .inc();
    }
}
