//! Cycle, schedule and period types (spec.md §3).

use crate::common::constants::{
    DEFAULT_DAY_START_MINUTES, DEFAULT_EVENING_START_MINUTES, DEFAULT_MORNING_START_MINUTES,
    DEFAULT_NIGHT_START_MINUTES, SUNRISE_ADJUST_WINDOW, SUNSET_ADJUST_WINDOW,
};
use crate::time_of_day::TimeOfDay;
use serde::{Deserialize, Serialize};

/// One of the four daily periods (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Morning,
    Day,
    Evening,
    Night,
}

impl Period {
    pub fn as_str(self) -> &'static str {
        match self {
            Period::Morning => "morning",
            Period::Day => "day",
            Period::Evening => "evening",
            Period::Night => "night",
        }
    }
}

/// The four period boundaries, after sunrise/sunset adjustment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodBoundaries {
    pub morning_start: TimeOfDay,
    pub day_start: TimeOfDay,
    pub evening_start: TimeOfDay,
    pub night_start: TimeOfDay,
}

impl Default for PeriodBoundaries {
    fn default() -> Self {
        PeriodBoundaries {
            morning_start: TimeOfDay::from_minutes(DEFAULT_MORNING_START_MINUTES),
            day_start: TimeOfDay::from_minutes(DEFAULT_DAY_START_MINUTES),
            evening_start: TimeOfDay::from_minutes(DEFAULT_EVENING_START_MINUTES),
            night_start: TimeOfDay::from_minutes(DEFAULT_NIGHT_START_MINUTES),
        }
    }
}

impl PeriodBoundaries {
    /// Apply the sunrise/sunset adjustment rule from spec.md §3.
    pub fn with_daylight(sunrise: Option<TimeOfDay>, sunset: Option<TimeOfDay>) -> Self {
        let mut b = PeriodBoundaries::default();
        if let Some(sunrise) = sunrise {
            let m = sunrise.minutes();
            if m >= SUNRISE_ADJUST_WINDOW.0 && m <= SUNRISE_ADJUST_WINDOW.1 {
                b.morning_start = sunrise;
            }
        }
        if let Some(sunset) = sunset {
            let m = sunset.minutes();
            if m >= SUNSET_ADJUST_WINDOW.0 && m <= SUNSET_ADJUST_WINDOW.1 {
                b.evening_start = sunset;
            }
        }
        b
    }

    /// Classify `t` into exactly one period (spec.md §8 invariant 4).
    ///
    /// The night period wraps midnight: `t >= night_start || t < morning_start`.
    pub fn period_of(&self, t: TimeOfDay) -> Period {
        let m = t.minutes();
        if m >= self.night_start.minutes() || m < self.morning_start.minutes() {
            Period::Night
        } else if m < self.day_start.minutes() {
            Period::Morning
        } else if m < self.evening_start.minutes() {
            Period::Day
        } else {
            Period::Evening
        }
    }

    pub fn start_of(&self, period: Period) -> TimeOfDay {
        match period {
            Period::Morning => self.morning_start,
            Period::Day => self.day_start,
            Period::Evening => self.evening_start,
            Period::Night => self.night_start,
        }
    }

    /// End of `period`, i.e. the start of the next period, not wrap-adjusted.
    pub fn end_of(&self, period: Period) -> TimeOfDay {
        match period {
            Period::Morning => self.day_start,
            Period::Day => self.evening_start,
            Period::Evening => self.night_start,
            Period::Night => self.morning_start,
        }
    }
}

/// One scheduled energisation: `(on_time, off_duration_minutes)` plus
/// diagnostic annotations populated only by the Adaptive Generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cycle {
    pub on_time: TimeOfDay,
    pub off_duration_minutes: f64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub period: Option<Period>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub temperature_c: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub humidity_pct: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub temperature_factor: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub humidity_factor: Option<f64>,
}

impl Cycle {
    pub fn new(on_time: TimeOfDay, off_duration_minutes: f64) -> Self {
        Cycle {
            on_time,
            off_duration_minutes,
            period: None,
            temperature_c: None,
            humidity_pct: None,
            temperature_factor: None,
            humidity_factor: None,
        }
    }
}

/// An ordered, non-empty, circular day-periodic sequence of cycles.
#[derive(Debug, Clone)]
pub struct Schedule {
    cycles: Vec<Cycle>,
}

impl Schedule {
    /// Sort `cycles` by `on_time` ascending. Panics if empty — callers must
    /// have already validated non-emptiness (spec.md §3 invariant).
    pub fn new(mut cycles: Vec<Cycle>) -> Self {
        assert!(!cycles.is_empty(), "a schedule must hold at least one cycle");
        cycles.sort_by_key(|c| c.on_time);
        Schedule { cycles }
    }

    pub fn cycles(&self) -> &[Cycle] {
        &self.cycles
    }

    pub fn len(&self) -> usize {
        self.cycles.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Index of the first cycle whose `on_time` is strictly later than `t`,
    /// or `0` if none (spec.md §4.8 initialisation, §8 invariant 5).
    pub fn first_index_after(&self, t: TimeOfDay) -> usize {
        self.cycles
            .iter()
            .position(|c| c.on_time > t)
            .unwrap_or(0)
    }

    /// The next `on_time` strictly after `t`, or the smallest `on_time`
    /// overall (tomorrow) if `t` is past the last cycle (spec.md §8
    /// invariant 5).
    pub fn next_on_time_after(&self, t: TimeOfDay) -> TimeOfDay {
        self.cycles[self.first_index_after(t)].on_time
    }
}
