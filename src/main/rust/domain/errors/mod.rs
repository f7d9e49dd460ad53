use thiserror::Error;

use crate::domain::value_objects::{SourceId, SourceKind};

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{kind} not found")]
    NotFound { kind: SourceKind, id: SourceId },

    #[error("{kind} already exists")]
    Duplicate { kind: SourceKind, id: SourceId },

    #[error("{0}")]
    Validation(String),

    #[error("Failed to open source: {0}")]
    Open(String),

    #[error("Failed to decode frame: {0}")]
    Decode(String),

    #[error("Failed to encode frame: {0}")]
    Encode(String),

    #[error("Client disconnected")]
    ClientDisconnected,

    #[error("Source handle is closed")]
    Closed,

    #[error("Storage failure: {0}")]
    Storage(String),

    #[error("Invalid backoff multiplier: must be > 1.0")]
    InvalidBackoffMultiplier,
}

pub type Result<T> = std::result::Result<T, DomainError>;
