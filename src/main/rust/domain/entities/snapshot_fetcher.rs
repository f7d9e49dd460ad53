use std::sync::Arc;

use super::SourceHandle;
use crate::domain::errors::{DomainError, Result};
use crate::domain::ports::{DecodeOutcome, FrameCodec, SourceOpener};
use crate::domain::value_objects::{EncodedFrame, SourceKind, SourceLocator, StreamConfig};

/// Single-frame fetch: open, read once, encode, close.
pub struct SnapshotFetcher {
    opener: Arc<dyn SourceOpener>,
    codec: Arc<dyn FrameCodec>,
    config: StreamConfig,
}

impl SnapshotFetcher {
    pub fn new(
        opener: Arc<dyn SourceOpener>,
        codec: Arc<dyn FrameCodec>,
        config: StreamConfig,
    ) -> Self {
        Self {
            opener,
            codec,
            config,
        }
    }

    /// No retry: the first failed read is the answer.
    pub fn fetch(&self, kind: SourceKind, locator: &SourceLocator) -> Result<EncodedFrame> {
        let mut handle = SourceHandle::open(self.opener.as_ref(), kind, locator, &self.config)?;

        let result = match handle.read() {
            Ok(DecodeOutcome::Frame(frame)) => self.codec.encode(&frame),
            Ok(DecodeOutcome::EndOfStream) => Err(DomainError::Decode(
                "source produced no frame".to_string(),
            )),
            Err(DomainError::Decode(reason)) => Err(DomainError::Decode(reason)),
            Err(other) => Err(DomainError::Decode(other.to_string())),
        };

        handle.close();
        result
    }
}
