use chrono::{DateTime, Duration, FixedOffset, NaiveTime, TimeZone, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

/// Source of wall-clock time, swappable for deterministic tests
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Clock backed by `Utc::now()`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock with millisecond resolution
#[derive(Debug)]
pub struct ManualClock {
    millis: AtomicI64,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            millis: AtomicI64::new(start.timestamp_millis()),
        }
    }

    pub fn set(&self, at: DateTime<Utc>) {
        self.millis.store(at.timestamp_millis(), Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        self.millis.fetch_add(by.num_milliseconds(), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.millis.load(Ordering::SeqCst)).unwrap_or_default()
    }
}

/// Day boundaries around an instant, in the service's reference offset
///
/// Rounds, the daily draw and the `today`/`week` leaderboards all roll over
/// at `next_reset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub day_start: DateTime<Utc>,
    /// Start of the trailing seven-day window, today included
    pub week_start: DateTime<Utc>,
    pub next_reset: DateTime<Utc>,
}

impl DayWindow {
    pub fn containing(now: DateTime<Utc>, offset: FixedOffset) -> Self {
        let local_midnight = now
            .with_timezone(&offset)
            .date_naive()
            .and_time(NaiveTime::MIN);
        let utc_midnight = local_midnight - Duration::seconds(offset.local_minus_utc() as i64);
        let day_start = Utc.from_utc_datetime(&utc_midnight);

        Self {
            day_start,
            week_start: day_start - Duration::days(6),
            next_reset: day_start + Duration::days(1),
        }
    }

    /// Start of the window whose votes hide a profile from new decks
    pub fn seen_since(&self, seen_window_days: u32) -> DateTime<Utc> {
        self.day_start - Duration::days(seen_window_days.saturating_sub(1) as i64)
    }
}
