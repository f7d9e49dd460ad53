mod channel_sink;
mod registry_service;
mod streaming_service;

pub use channel_sink::ChannelSink;
pub use registry_service::RegistryService;
pub use streaming_service::StreamingService;
