pub mod codec;
pub mod gstreamer;
pub mod http;
pub mod metrics;
pub mod storage;
