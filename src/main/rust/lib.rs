pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

// Re-exports for convenience
pub use application::services::{ChannelSink, RegistryService, StreamingService};
pub use config::Config;
pub use domain::entities::{
    HandleState, MjpegParts, SessionReport, SessionState, SnapshotFetcher, SourceHandle,
    StreamSession, Termination,
};
pub use domain::errors::{DomainError, Result};
pub use domain::ports::{
    DecodeOutcome, FrameCodec, FrameDecoder, FrameSink, MetricsReporter, NoopMetrics,
    SourceOpener, SourceRegistry,
};
pub use domain::value_objects::{
    BackoffPolicy, CaptureHint, EncodedFrame, Frame, RetryPolicy, SourceId, SourceKind,
    SourceLocator, StreamConfig,
};
pub use infrastructure::codec::JpegCodec;
pub use infrastructure::gstreamer::{GStreamerSourceOpener, PipelineBuilder};
pub use infrastructure::http::routes;
pub use infrastructure::metrics::{metrics_routes, serve_metrics, PrometheusReporter};
pub use infrastructure::storage::SqliteSourceRegistry;
