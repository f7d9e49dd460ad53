mod backoff_policy;
mod capture_hint;
mod frame;
pub mod multipart;
mod retry_policy;
mod source_id;
mod source_kind;
mod source_locator;
mod stream_config;

pub use backoff_policy::BackoffPolicy;
pub use capture_hint::CaptureHint;
pub use frame::{EncodedFrame, Frame};
pub use retry_policy::RetryPolicy;
pub use source_id::SourceId;
pub use source_kind::SourceKind;
pub use source_locator::SourceLocator;
pub use stream_config::StreamConfig;
