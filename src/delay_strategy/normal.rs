/// Linear backoff: every retry waits one more `base_delay_ms` than the last.
///
/// Saturates at `u64::MAX` instead of overflowing.
pub fn calculate(attempt: u32, base_delay_ms: u64) -> u64 {
    u64::from(attempt).saturating_mul(base_delay_ms)
}
