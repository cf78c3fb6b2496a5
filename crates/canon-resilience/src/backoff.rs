use std::time::Duration;

/// Delay before the retry that follows failed attempt `attempt` (zero-based):
/// `base * 2^attempt`, capped at `max`.
pub fn backoff_delay(base: Duration, max: Duration, attempt: u32) -> Duration {
    let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
    base.saturating_mul(factor).min(max)
}

/// Sum of every backoff sleep a fully failing call performs.
pub fn total_backoff(base: Duration, max: Duration, max_retries: u32) -> Duration {
    (0..max_retries)
        .map(|attempt| backoff_delay(base, max, attempt))
        .fold(Duration::ZERO, Duration::saturating_add)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubles_each_attempt() {
        let base = Duration::from_millis(100);
        let max = Duration::from_secs(60);
        assert_eq!(backoff_delay(base, max, 0), Duration::from_millis(100));
        assert_eq!(backoff_delay(base, max, 1), Duration::from_millis(200));
        assert_eq!(backoff_delay(base, max, 3), Duration::from_millis(800));
    }

    #[test]
    fn capped_and_overflow_safe() {
        let base = Duration::from_millis(100);
        let max = Duration::from_secs(1);
        assert_eq!(backoff_delay(base, max, 10), max);
        assert_eq!(backoff_delay(base, max, 64), max);
    }

    #[test]
    fn total_sums_all_sleeps() {
        let base = Duration::from_millis(100);
        let max = Duration::from_secs(60);
        assert_eq!(total_backoff(base, max, 3), Duration::from_millis(700));
        assert_eq!(total_backoff(base, max, 0), Duration::ZERO);
    }
}
