use std::time::Duration;

/// Retry budget and base delay for a single call site.
///
/// `max_retries` counts retries *after* the first attempt, so an operation
/// guarded by `RetryConfig::new(3, _)` is invoked at most four times.
/// The value is never mutated by the executor; the setters below hand back
/// a new config.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct RetryConfig {
    max_retries: u32,
    base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { max_retries: 5, base_delay_ms: 500 }
    }
}

impl RetryConfig {
    pub fn new(max_retries: u32, base_delay_ms: u64) -> Self {
        Self { max_retries, base_delay_ms }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_base_delay_ms(mut self, base_delay_ms: u64) -> Self {
        self.base_delay_ms = base_delay_ms;
        self
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn base_delay_ms(&self) -> u64 {
        self.base_delay_ms
    }

    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }
}
