use super::BackoffPolicy;

/// How a live stream reacts to transient read failures.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    max_consecutive_failures: Option<u32>,
    backoff: BackoffPolicy,
}

impl RetryPolicy {
    /// `max_consecutive_failures == 0` retries forever.
    pub fn new(max_consecutive_failures: u32, backoff: BackoffPolicy) -> Self {
        Self {
            max_consecutive_failures: (max_consecutive_failures > 0)
                .then_some(max_consecutive_failures),
            backoff,
        }
    }

    pub fn unbounded(backoff: BackoffPolicy) -> Self {
        Self::new(0, backoff)
    }

    pub fn max_consecutive_failures(&self) -> Option<u32> {
        self.max_consecutive_failures
    }

    pub fn backoff(&self) -> &BackoffPolicy {
        &self.backoff
    }

    pub fn is_exhausted(&self, consecutive_failures: u32) -> bool {
        self.max_consecutive_failures
            .is_some_and(|max| consecutive_failures >= max)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(100, BackoffPolicy::default())
    }
}
