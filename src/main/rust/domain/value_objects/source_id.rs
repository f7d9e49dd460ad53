use std::fmt;

use crate::domain::errors::{DomainError, Result};

/// Positive integer key, unique within one [`SourceKind`](super::SourceKind) namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(i64);

impl SourceId {
    pub fn new(value: i64) -> Result<Self> {
        if value <= 0 {
            return Err(DomainError::Validation(format!(
                "Source id must be a positive integer, got {}",
                value
            )));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
