use crate::domain::errors::Result;
use crate::domain::value_objects::{Frame, SourceKind, SourceLocator, StreamConfig};

/// Raw result of pulling from a decoder
#[derive(Debug)]
pub enum DecodeOutcome {
    Frame(Frame),
    EndOfStream,
}

/// One open decoding context. Adapters report raw outcomes; the kind-specific
/// retry policy is applied by `SourceHandle`.
pub trait FrameDecoder: Send {
    /// Block until the next frame, end of stream, or a failure
    fn read(&mut self) -> Result<DecodeOutcome>;

    /// Tear down the decoding context. Called at most once by the owning handle.
    fn release(&mut self);
}

/// Port for opening decoding contexts against a locator
pub trait SourceOpener: Send + Sync {
    fn open(
        &self,
        kind: SourceKind,
        locator: &SourceLocator,
        config: &StreamConfig,
    ) -> Result<Box<dyn FrameDecoder>>;
}
