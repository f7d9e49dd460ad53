mod frame_codec;
mod frame_sink;
mod frame_source;
mod metrics_reporter;
mod source_registry;

pub use frame_codec::FrameCodec;
pub use frame_sink::FrameSink;
pub use frame_source::{DecodeOutcome, FrameDecoder, SourceOpener};
pub use metrics_reporter::{MetricsReporter, NoopMetrics};
pub use source_registry::SourceRegistry;
