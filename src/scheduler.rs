//! One-shot run scheduling
//!
//! Exactly one future run is pending at a time. The bot arms it, sleeps until it is
//! due, runs a cycle, and the cycle arms its successor.

use crate::state::TradeRecord;
use chrono::{DateTime, Duration, Utc};

/// What to do at process start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Startup {
    /// No future run is pending: trade immediately
    RunNow,
    /// Re-arm the persisted run
    Restore(DateTime<Utc>),
}

/// Decide between re-arming the persisted run and trading right away
pub fn plan_startup(record: &TradeRecord, now: DateTime<Utc>) -> Startup {
    match record.next_trade {
        Some(next) if next > now => Startup::Restore(next),
        _ => Startup::RunNow,
    }
}

/// `basis + interval + jitter`
pub fn next_run(basis: DateTime<Utc>, interval_hours: u32, jitter: Duration) -> DateTime<Utc> {
    basis + Duration::hours(i64::from(interval_hours)) + jitter
}

/// Holds the single pending run
#[derive(Debug, Default)]
pub struct Scheduler {
    pending: Option<DateTime<Utc>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the next run, replacing any earlier one
    pub fn schedule_at(&mut self, when: DateTime<Utc>) {
        if let Some(previous) = self.pending.replace(when) {
            tracing::warn!(%previous, %when, "Replacing pending run");
        }
        tracing::info!(next_trade = %when, "Next trade scheduled");
    }

    pub fn pending(&self) -> Option<DateTime<Utc>> {
        self.pending
    }

    /// Sleep until the pending run is due and consume it.
    ///
    /// Returns `None` when nothing is scheduled. A run already in the past fires at once.
    pub async fn wait(&mut self) -> Option<DateTime<Utc>> {
        let when = self.pending?;
        let delay = (when - Utc::now()).to_std().unwrap_or_default();
        if !delay.is_zero() {
            tracing::debug!(delay_secs = delay.as_secs(), "Sleeping until next run");
            tokio::time::sleep(delay).await;
        }
        self.pending.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_future_record_is_restored() {
        let now = Utc::now();
        let record = TradeRecord {
            next_trade: Some(now + Duration::hours(1)),
            ..Default::default()
        };
        assert_eq!(
            plan_startup(&record, now),
            Startup::Restore(now + Duration::hours(1))
        );
    }

    #[test]
    fn test_past_or_missing_record_runs_now() {
        let now = Utc::now();
        let past = TradeRecord {
            next_trade: Some(now - Duration::hours(1)),
            ..Default::default()
        };
        assert_eq!(plan_startup(&past, now), Startup::RunNow);
        assert_eq!(plan_startup(&TradeRecord::default(), now), Startup::RunNow);
    }

    #[test]
    fn test_next_run_adds_interval_and_jitter() {
        let basis = Utc::now();
        let next = next_run(basis, 12, Duration::milliseconds(3000));
        assert_eq!(next - basis, Duration::hours(12) + Duration::milliseconds(3000));
    }

    #[tokio::test]
    async fn test_wait_fires_past_run_immediately() {
        let mut scheduler = Scheduler::new();
        assert!(scheduler.wait().await.is_none());

        let when = Utc::now() - Duration::seconds(5);
        scheduler.schedule_at(when);
        assert_eq!(scheduler.pending(), Some(when));

        assert_eq!(scheduler.wait().await, Some(when));
        assert!(scheduler.pending().is_none());
    }

    #[test]
    fn test_schedule_replaces_pending() {
        let mut scheduler = Scheduler::new();
        let first = Utc::now() + Duration::hours(1);
        let second = first + Duration::hours(1);
        scheduler.schedule_at(first);
        scheduler.schedule_at(second);
        assert_eq!(scheduler.pending(), Some(second));
    }
}
