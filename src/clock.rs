use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Local, NaiveDate, Utc};

/// Source of wall-clock time for cache expiry and quota day rollover.
pub trait Clock: Send + Sync + 'static {
    fn now_millis(&self) -> i64;

    /// Calendar day used to stamp the daily quota.
    fn today(&self) -> NaiveDate;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A clock that only moves when told to. The calendar day is derived from the
/// current millis in UTC.
#[derive(Debug, Default)]
pub struct ManualClock {
    millis: AtomicI64,
}

impl ManualClock {
    pub fn new(start_millis: i64) -> Self {
        Self {
            millis: AtomicI64::new(start_millis),
        }
    }

    pub fn starting_on(day: NaiveDate) -> Self {
        let millis = day
            .and_hms_opt(12, 0, 0)
            .map(|dt| dt.and_utc().timestamp_millis())
            .unwrap_or_default();
        Self::new(millis)
    }

    pub fn advance_millis(&self, millis: i64) {
        self.millis.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.millis.load(Ordering::SeqCst)
    }

    fn today(&self) -> NaiveDate {
        DateTime::<Utc>::from_timestamp_millis(self.now_millis())
            .map(|dt| dt.date_naive())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_rolls_over_day() {
        let day = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let clock = ManualClock::starting_on(day);
        assert_eq!(clock.today(), day);

        clock.advance_millis(12 * 60 * 60 * 1000);
        assert_eq!(clock.today(), day.succ_opt().unwrap());
    }
}
