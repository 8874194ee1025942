use chrono::{DateTime, TimeDelta, Utc};
use std::time::Duration;

/// Decides when tracked locations are re-fetched.
///
/// Deadlines sit on multiples of the interval since the Unix epoch, so a
/// 900 second interval refreshes at :00, :15, :30 and :45 whatever the start time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshScheduler {
    interval_secs: i64,
    next_deadline: DateTime<Utc>,
}

impl RefreshScheduler {
    pub fn new(interval: Duration, now: DateTime<Utc>) -> Self {
        let interval_secs = i64::try_from(interval.as_secs()).unwrap_or(i64::MAX).max(1);
        Self { interval_secs, next_deadline: next_boundary(now, interval_secs) }
    }

    pub fn next_deadline(&self) -> DateTime<Utc> {
        self.next_deadline
    }

    /// Returns `true` when a refresh is due and moves the deadline to the next boundary.
    pub fn tick(&mut self, now: DateTime<Utc>) -> bool {
        if now < self.next_deadline {
            return false;
        }
        self.next_deadline = next_boundary(now, self.interval_secs);
        true
    }
}

fn next_boundary(now: DateTime<Utc>, interval_secs: i64) -> DateTime<Utc> {
    let ts = now.timestamp();
    let aligned = ts - ts.rem_euclid(interval_secs);
    aligned
        .checked_add(interval_secs)
        .and_then(|next| DateTime::from_timestamp(next, 0))
        .unwrap_or_else(|| now + TimeDelta::seconds(interval_secs))
}
