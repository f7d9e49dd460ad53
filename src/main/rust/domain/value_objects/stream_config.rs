use std::time::Duration;

use super::{CaptureHint, RetryPolicy};
use crate::domain::errors::{DomainError, Result};

/// Per-request knobs shared by streams and snapshots
#[derive(Debug, Clone, PartialEq)]
pub struct StreamConfig {
    capture_hint: CaptureHint,
    open_timeout: Duration,
    read_timeout: Duration,
    retry_policy: RetryPolicy,
}

impl StreamConfig {
    pub fn new() -> Self {
        Self {
            capture_hint: CaptureHint::default(),
            open_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(5),
            retry_policy: RetryPolicy::default(),
        }
    }

    pub fn with_capture_hint(mut self, hint: CaptureHint) -> Self {
        self.capture_hint = hint;
        self
    }

    pub fn with_open_timeout(mut self, timeout: Duration) -> Self {
        self.open_timeout = timeout;
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    pub fn capture_hint(&self) -> CaptureHint {
        self.capture_hint
    }

    pub fn open_timeout(&self) -> Duration {
        self.open_timeout
    }

    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// Pure validation logic (domain concern)
    pub fn validate(&self) -> Result<()> {
        if self.open_timeout.is_zero() {
            return Err(DomainError::Validation(
                "Open timeout cannot be zero".to_string(),
            ));
        }

        if self.read_timeout.is_zero() {
            return Err(DomainError::Validation(
                "Read timeout cannot be zero".to_string(),
            ));
        }

        if self.capture_hint.width() == 0 || self.capture_hint.height() == 0 {
            return Err(DomainError::Validation(
                "Capture resolution hint cannot be zero".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self::new()
    }
}
