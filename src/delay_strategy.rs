pub mod exponential;
pub mod normal;

use crate::RetryConfig;
use std::time::Duration;

/// Maps a 1-based attempt index and a base delay (milliseconds)
/// to the time to wait before that attempt.
///
/// Implemented for plain functions and closures, so a custom backoff
/// can be passed wherever a [DelayStrategy] is accepted:
///
/// ```
/// use retry_executor::DelayCalculator;
///
/// let constant = |_attempt: u32, base: u64| base;
/// assert_eq!(constant.calculate(4, 250), 250);
/// ```
pub trait DelayCalculator {
    fn calculate(&self, attempt: u32, base_delay_ms: u64) -> u64;

    fn delay(&self, attempt: u32, config: &RetryConfig) -> Duration {
        Duration::from_millis(self.calculate(attempt, config.base_delay_ms()))
    }
}

impl<F> DelayCalculator for F
where
    F: Fn(u32, u64) -> u64,
{
    fn calculate(&self, attempt: u32, base_delay_ms: u64) -> u64 {
        (self)(attempt, base_delay_ms)
    }
}

/// The two built-in backoff curves.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum DelayStrategy {
    /// `attempt * base_delay`
    #[default]
    Normal,
    /// `base_delay ^ attempt`. Grows very quickly: a base of 5 ms
    /// reaches 625 ms on the fourth retry.
    Exponential,
}

impl DelayCalculator for DelayStrategy {
    fn calculate(&self, attempt: u32, base_delay_ms: u64) -> u64 {
        match self {
            DelayStrategy::Normal => normal::calculate(attempt, base_delay_ms),
            DelayStrategy::Exponential => exponential::calculate(attempt, base_delay_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_dispatch() {
        assert_eq!(DelayStrategy::Normal.calculate(3, 300), 900);
        assert_eq!(DelayStrategy::Exponential.calculate(3, 5), 125);
        assert_eq!(DelayStrategy::default(), DelayStrategy::Normal);
    }

    #[test]
    fn delay_uses_config_base() {
        let config = RetryConfig::new(3, 300);
        assert_eq!(DelayStrategy::Normal.delay(2, &config), Duration::from_millis(600));
        assert_eq!(
            DelayStrategy::Exponential.delay(2, &config),
            Duration::from_millis(90_000)
        );
    }

    #[test]
    fn closure_calculator() {
        let fixed = |_: u32, base: u64| base + 1;
        assert_eq!(fixed.calculate(10, 99), 100);
    }
}
