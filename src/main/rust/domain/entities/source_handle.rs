use crate::domain::errors::{DomainError, Result};
use crate::domain::ports::{DecodeOutcome, FrameDecoder, SourceOpener};
use crate::domain::value_objects::{SourceKind, SourceLocator, StreamConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleState {
    Opened,
    Reading,
    /// File sources only: no more frames.
    Exhausted,
    /// Last read failed; cameras may recover on the next read.
    Failed,
    Closed,
}

/// Exclusive owner of one decoding context for the lifetime of a request.
///
/// The context is released exactly once: by the first `close()`, or on drop
/// if nobody closed it.
pub struct SourceHandle {
    kind: SourceKind,
    locator: SourceLocator,
    decoder: Option<Box<dyn FrameDecoder>>,
    state: HandleState,
}

impl SourceHandle {
    /// Open a fresh decoding context. Not retried here.
    pub fn open(
        opener: &dyn SourceOpener,
        kind: SourceKind,
        locator: &SourceLocator,
        config: &StreamConfig,
    ) -> Result<Self> {
        let decoder = opener
            .open(kind, locator, config)
            .map_err(|e| match e {
                DomainError::Open(_) => e,
                other => DomainError::Open(other.to_string()),
            })?;

        tracing::debug!(kind = %kind, locator = %locator, "Source handle opened");

        Ok(Self {
            kind,
            locator: locator.clone(),
            decoder: Some(decoder),
            state: HandleState::Opened,
        })
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    pub fn locator(&self) -> &SourceLocator {
        &self.locator
    }

    pub fn state(&self) -> HandleState {
        self.state
    }

    pub fn is_closed(&self) -> bool {
        self.state == HandleState::Closed
    }

    /// Pull the next frame.
    ///
    /// Cameras report every failure (including an unexpected end of stream)
    /// as a transient `Decode` error and stay readable. Files turn any
    /// failure into `EndOfStream` and stay exhausted.
    pub fn read(&mut self) -> Result<DecodeOutcome> {
        let Some(decoder) = self.decoder.as_mut() else {
            return Err(DomainError::Closed);
        };

        if self.state == HandleState::Exhausted {
            return Ok(DecodeOutcome::EndOfStream);
        }

        self.state = HandleState::Reading;
        let outcome = decoder.read();

        match (self.kind.is_live(), outcome) {
            (_, Ok(DecodeOutcome::Frame(frame))) => Ok(DecodeOutcome::Frame(frame)),
            (true, Ok(DecodeOutcome::EndOfStream)) => {
                self.state = HandleState::Failed;
                Err(DomainError::Decode(
                    "live stream reported end of stream".to_string(),
                ))
            }
            (true, Err(e)) => {
                self.state = HandleState::Failed;
                Err(match e {
                    DomainError::Decode(_) => e,
                    other => DomainError::Decode(other.to_string()),
                })
            }
            (false, Ok(DecodeOutcome::EndOfStream)) => {
                self.state = HandleState::Exhausted;
                Ok(DecodeOutcome::EndOfStream)
            }
            (false, Err(e)) => {
                tracing::debug!(locator = %self.locator, error = %e, "File read failed, treating as end of stream");
                self.state = HandleState::Exhausted;
                Ok(DecodeOutcome::EndOfStream)
            }
        }
    }

    /// Release the decoding context. Idempotent.
    pub fn close(&mut self) {
        if let Some(mut decoder) = self.decoder.take() {
            decoder.release();
            self.state = HandleState::Closed;
            tracing::debug!(kind = %self.kind, locator = %self.locator, "Source handle closed");
        }
    }
}

impl Drop for SourceHandle {
    fn drop(&mut self) {
        self.close();
    }
}
