//! Monotonic clock helpers for deferred due times.

use std::time::{Duration, Instant};

/// Far-future horizon used when a delay overflows `Instant`.
const MAX_HORIZON: Duration = Duration::from_secs(60 * 60 * 24 * 365 * 30);

/// Current monotonic time.
#[must_use]
pub fn now() -> Instant {
    Instant::now()
}

/// Absolute due time `delay_ms` from now, saturating at a far-future horizon.
#[must_use]
pub fn due_after(delay_ms: u64) -> Instant {
    let now = now();
    now.checked_add(Duration::from_millis(delay_ms))
        .or_else(|| now.checked_add(MAX_HORIZON))
        .unwrap_or(now)
}

/// Milliseconds remaining until `due`, zero if it has passed.
#[must_use]
pub fn millis_until(due: Instant) -> u64 {
    u64::try_from(due.saturating_duration_since(now()).as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_due_after_is_in_future() {
        let before = now();
        let due = due_after(50);
        assert!(due >= before + Duration::from_millis(50));
        assert!(millis_until(due) <= 50);
    }

    #[test]
    fn test_past_due_is_zero() {
        let past = now();
        std::thread::sleep(Duration::from_millis(2));
        assert_eq!(millis_until(past), 0);
    }

    #[test]
    fn test_huge_delay_saturates() {
        let due = due_after(u64::MAX);
        assert!(due > now());
    }
}
