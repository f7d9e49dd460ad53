use std::fmt;

use crate::domain::errors::{DomainError, Result};

/// Connection string (camera) or filesystem path (video file). Immutable once stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocator(String);

impl SourceLocator {
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(DomainError::Validation(
                "Source locator cannot be empty".to_string(),
            ));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
