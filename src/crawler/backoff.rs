use crate::config::RetryConfig;
use std::time::Duration;

/// Doubling delay schedule between fetch attempts, capped at a maximum
#[derive(Debug, Clone, Copy)]
pub struct ExponentialBackoff {
    base_ms: u64,
    max_ms: u64,
}

impl ExponentialBackoff {
    pub const fn new(base_ms: u64, max_ms: u64) -> Self {
        Self { base_ms, max_ms }
    }

    /// Delay before retry number `retry` (0 for the first retry)
    pub fn delay(&self, retry: u32) -> Duration {
        let exponential = self
            .base_ms
            .saturating_mul(2u64.saturating_pow(retry.min(20)));
        Duration::from_millis(exponential.min(self.max_ms))
    }
}

impl From<&RetryConfig> for ExponentialBackoff {
    fn from(config: &RetryConfig) -> Self {
        Self::new(config.base_delay, config.max_delay)
    }
}
