//! Wall-clock hour:minute in a fixed local timezone (spec.md §3).
//!
//! All arithmetic is modulo 1,440 minutes; comparisons wrap across
//! midnight when a duration is added. Grounded in the parsing idioms of
//! `original_source/src/schedulers/time_based_scheduler.py::_parse_time`
//! (strict `HH:MM`) with the legacy 12-hour `am/pm` form additionally
//! accepted on input, per SPEC_FULL.md's supplemented-features section.

use crate::common::constants::MINUTES_PER_DAY;
use std::fmt;

/// Minutes since local midnight, always in `[0, 1440)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct TimeOfDay(u32);

impl TimeOfDay {
    pub fn from_minutes(minutes: u32) -> Self {
        TimeOfDay(minutes % MINUTES_PER_DAY)
    }

    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        if hour < 24 && minute < 60 {
            Some(TimeOfDay(hour * 60 + minute))
        } else {
            None
        }
    }

    pub fn minutes(self) -> u32 {
        self.0
    }

    pub fn hour(self) -> u32 {
        self.0 / 60
    }

    pub fn minute(self) -> u32 {
        self.0 % 60
    }

    /// Add a (possibly fractional) number of minutes, wrapping across midnight.
    pub fn add_minutes(self, minutes: f64) -> TimeOfDay {
        let total = self.0 as i64 + minutes.round() as i64;
        let wrapped = total.rem_euclid(MINUTES_PER_DAY as i64) as u32;
        TimeOfDay(wrapped)
    }

    /// Minutes from `self` forward to `other`, always in `[0, 1440)`;
    /// `0` only when `self == other`.
    pub fn minutes_until(self, other: TimeOfDay) -> u32 {
        (other.0 + MINUTES_PER_DAY - self.0) % MINUTES_PER_DAY
    }

    /// Parse `HH:MM` (24-hour, whitespace-tolerant) or the legacy 12-hour
    /// `H:MM am`/`H:MM pm` form. Returns `None` on anything else — callers
    /// must drop invalid entries rather than raise (spec.md §4.8).
    pub fn parse(s: &str) -> Option<TimeOfDay> {
        let s = s.trim();
        if let Some(t) = Self::parse_24h(s) {
            return Some(t);
        }
        Self::parse_12h(s)
    }

    fn parse_24h(s: &str) -> Option<TimeOfDay> {
        let (h, m) = s.split_once(':')?;
        let hour: u32 = h.trim().parse().ok()?;
        let minute: u32 = m.trim().parse().ok()?;
        TimeOfDay::from_hm(hour, minute)
    }

    fn parse_12h(s: &str) -> Option<TimeOfDay> {
        let lower = s.to_ascii_lowercase();
        let (body, is_pm) = if let Some(b) = lower.strip_suffix("am") {
            (b, false)
        } else if let Some(b) = lower.strip_suffix("pm") {
            (b, true)
        } else {
            return None;
        };
        let body = body.trim();
        let (h, m) = body.split_once(':')?;
        let mut hour: u32 = h.trim().parse().ok()?;
        let minute: u32 = m.trim().parse().ok()?;
        if hour == 12 {
            hour = 0;
        }
        if hour > 12 || minute >= 60 {
            return None;
        }
        if is_pm {
            hour += 12;
        }
        TimeOfDay::from_hm(hour, minute)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_24h() {
        assert_eq!(TimeOfDay::parse("06:00"), TimeOfDay::from_hm(6, 0));
        assert_eq!(TimeOfDay::parse(" 23:59 "), TimeOfDay::from_hm(23, 59));
    }

    #[test]
    fn parses_legacy_12h() {
        assert_eq!(TimeOfDay::parse("6:00am"), TimeOfDay::from_hm(6, 0));
        assert_eq!(TimeOfDay::parse("6:00 pm"), TimeOfDay::from_hm(18, 0));
        assert_eq!(TimeOfDay::parse("12:00 am"), TimeOfDay::from_hm(0, 0));
        assert_eq!(TimeOfDay::parse("12:30 pm"), TimeOfDay::from_hm(12, 30));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(TimeOfDay::parse("not-a-time"), None);
        assert_eq!(TimeOfDay::parse("25:00"), None);
    }

    #[test]
    fn add_minutes_wraps_midnight() {
        let t = TimeOfDay::from_hm(23, 50).unwrap();
        assert_eq!(t.add_minutes(20.0), TimeOfDay::from_hm(0, 10).unwrap());
    }

    #[test]
    fn minutes_until_wraps() {
        let a = TimeOfDay::from_hm(23, 0).unwrap();
        let b = TimeOfDay::from_hm(1, 0).unwrap();
        assert_eq!(a.minutes_until(b), 120);
        assert_eq!(b.minutes_until(a), 1320);
        assert_eq!(a.minutes_until(a), 0);
    }
}
