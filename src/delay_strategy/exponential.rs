/// The base delay raised to the power of the attempt index.
///
/// Note this is *not* `base * 2^attempt`: with a base of 300 ms the
/// second retry already waits 90 s. Saturates at `u64::MAX`.
pub fn calculate(attempt: u32, base_delay_ms: u64) -> u64 {
    base_delay_ms.saturating_pow(attempt)
}
