//! Drift-free periodic scheduling. Each task's next fire time is derived
//! from its previous *scheduled* fire time, not from when the previous
//! run actually finished, so a slow run doesn't push every future tick
//! later by the same amount.

use chrono::{DateTime, Utc};
use std::time::Duration;

/// Compute the next fire time as an arithmetic progression from
/// `previous_next_run`. If the interval has already elapsed more than
/// once (the process was asleep, or a run overran badly), this skips
/// forward to the next tick that is still in the future rather than
/// firing a burst of catch-up runs.
pub fn next_fire(previous_next_run: DateTime<Utc>, interval: Duration, now: DateTime<Utc>) -> DateTime<Utc> {
    let interval = chrono::Duration::from_std(interval).unwrap_or(chrono::Duration::seconds(1));
    if interval <= chrono::Duration::zero() {
        return now;
    }

    let mut next = previous_next_run + interval;
    while next <= now {
        next += interval;
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_next_fire_is_arithmetic_progression() {
        let first = at(0);
        let interval = Duration::from_secs(60);

        let second = next_fire(first, interval, at(1));
        assert_eq!(second, at(60));

        let third = next_fire(second, interval, at(61));
        assert_eq!(third, at(120));
    }

    #[test]
    fn test_next_fire_skips_forward_after_long_overrun() {
        let previous_next_run = at(0);
        let interval = Duration::from_secs(60);

        // A run finished 500s after it was scheduled to fire.
        let next = next_fire(previous_next_run, interval, at(500));
        assert_eq!(next, at(540));
        assert!(next > at(500));
    }

    #[test]
    fn test_next_fire_does_not_drift_with_execution_time() {
        let interval = Duration::from_secs(100);
        let mut scheduled = at(0);

        for tick in 1..=5 {
            scheduled = next_fire(scheduled, interval, scheduled);
            assert_eq!(scheduled, at(100 * tick));
        }
    }
}
