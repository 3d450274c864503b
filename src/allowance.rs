use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The allowance period currently in effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AllowanceWindow {
    /// Most recent reset instant
    pub reset_instant: DateTime<Utc>,
    /// Sends available between resets
    pub allowance_cap: u64,
}

impl AllowanceWindow {
    /// The instant this window closes and the next one opens.
    pub fn next_reset(&self) -> DateTime<Utc> {
        self.reset_instant + Duration::days(1)
    }

    /// Whether a post created at `ts` counts against this window.
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.reset_instant && ts < self.next_reset()
    }

    /// Allowance consumed by `sends_since_reset`, clamped to the cap.
    pub fn daily_used(&self, sends_since_reset: u64) -> u64 {
        sends_since_reset.min(self.allowance_cap)
    }
}

/// Resolves the daily reset boundary at a fixed UTC hour.
///
/// Pure function of the instant it is given; holds no mutable state and can be
/// shared freely between tasks.
#[derive(Debug, Clone, Copy)]
pub struct AllowanceClock {
    reset_time: NaiveTime,
    allowance_cap: u64,
}

impl AllowanceClock {
    /// `reset_hour_utc` outside 0..=23 falls back to midnight; config validation
    /// rejects those values before a clock is built.
    pub fn new(reset_hour_utc: u32, allowance_cap: u64) -> Self {
        Self {
            reset_time: NaiveTime::from_hms_opt(reset_hour_utc, 0, 0).unwrap_or(NaiveTime::MIN),
            allowance_cap,
        }
    }

    /// Window in effect at `now`.
    ///
    /// Today's reset applies only once `now` is strictly past it; at or before
    /// the reset hour the previous day's occurrence is still current.
    ///
    /// So at exactly the reset instant the window is `[yesterday, now)`, and a
    /// post stamped at that same instant falls outside it. It counts toward
    /// the next window instead, which opens one tick later.
    pub fn window_at(&self, now: DateTime<Utc>) -> AllowanceWindow {
        let today_reset = now.date_naive().and_time(self.reset_time).and_utc();
        let reset_instant = if now > today_reset {
            today_reset
        } else {
            today_reset - Duration::days(1)
        };

        AllowanceWindow {
            reset_instant,
            allowance_cap: self.allowance_cap,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    #[test]
    fn test_one_second_before_reset_uses_previous_day() {
        let clock = AllowanceClock::new(11, 10);
        let window = clock.window_at(at(2025, 3, 10, 10, 59, 59));
        assert_eq!(window.reset_instant, at(2025, 3, 9, 11, 0, 0));
    }

    #[test]
    fn test_one_second_after_reset_uses_today() {
        let clock = AllowanceClock::new(11, 10);
        let window = clock.window_at(at(2025, 3, 10, 11, 0, 1));
        assert_eq!(window.reset_instant, at(2025, 3, 10, 11, 0, 0));
    }

    #[test]
    fn test_exact_reset_instant_uses_previous_day() {
        let clock = AllowanceClock::new(11, 10);
        let window = clock.window_at(at(2025, 3, 10, 11, 0, 0));
        assert_eq!(window.reset_instant, at(2025, 3, 9, 11, 0, 0));
    }

    #[test]
    fn test_reset_crosses_month_boundary() {
        let clock = AllowanceClock::new(11, 10);
        let window = clock.window_at(at(2025, 3, 1, 3, 0, 0));
        assert_eq!(window.reset_instant, at(2025, 2, 28, 11, 0, 0));
        assert_eq!(window.next_reset(), at(2025, 3, 1, 11, 0, 0));
    }

    #[test]
    fn test_reset_never_after_now() {
        let clock = AllowanceClock::new(11, 10);
        let start = at(2025, 6, 1, 0, 0, 0);
        for minutes in (0..(48 * 60)).step_by(7) {
            let now = start + Duration::minutes(minutes);
            let window = clock.window_at(now);
            assert!(window.reset_instant <= now);
            assert!(now - window.reset_instant <= Duration::days(1));
        }
    }

    #[test]
    fn test_contains_is_half_open() {
        let window = AllowanceClock::new(11, 10).window_at(at(2025, 3, 10, 15, 0, 0));
        assert!(window.contains(at(2025, 3, 10, 11, 0, 0)));
        assert!(window.contains(at(2025, 3, 10, 14, 0, 0)));
        assert!(!window.contains(at(2025, 3, 10, 10, 59, 59)));
        assert!(!window.contains(at(2025, 3, 11, 11, 0, 0)));
    }

    #[test]
    fn test_post_at_reset_instant_belongs_to_next_window() {
        let clock = AllowanceClock::new(11, 10);
        let reset = at(2025, 3, 10, 11, 0, 0);

        let at_reset = clock.window_at(reset);
        assert!(!at_reset.contains(reset));
        assert!(at_reset.contains(reset - Duration::seconds(1)));

        let after_reset = clock.window_at(reset + Duration::seconds(1));
        assert!(after_reset.contains(reset));
    }

    #[test]
    fn test_daily_used_is_clamped_to_cap() {
        let window = AllowanceClock::new(11, 10).window_at(Utc::now());
        assert_eq!(window.daily_used(0), 0);
        assert_eq!(window.daily_used(7), 7);
        assert_eq!(window.daily_used(10), 10);
        assert_eq!(window.daily_used(500), 10);
    }

    #[test]
    fn test_invalid_hour_falls_back_to_midnight() {
        let clock = AllowanceClock::new(30, 10);
        let window = clock.window_at(at(2025, 3, 10, 5, 0, 0));
        assert_eq!(window.reset_instant, at(2025, 3, 10, 0, 0, 0));
    }
}
