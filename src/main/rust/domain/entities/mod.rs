mod snapshot_fetcher;
mod source_handle;
mod stream_session;

pub use snapshot_fetcher::SnapshotFetcher;
pub use source_handle::{HandleState, SourceHandle};
pub use stream_session::{MjpegParts, SessionReport, SessionState, StreamSession, Termination};
