//! Application-wide default values and validation limits.
//!
//! Mirrors the defaults scattered across `original_source/src/core/config_schema.py`
//! and `original_source/src/schedulers/adaptive_scheduler.py`.

/// Minutes in one day; all [`crate::time_of_day::TimeOfDay`] arithmetic wraps at this.
pub const MINUTES_PER_DAY: u32 = 24 * 60;

// # Cycle / constraint defaults (spec.md §3, §4.9)

pub const DEFAULT_MIN_WAIT_MINUTES: f64 = 5.0;
pub const DEFAULT_MAX_WAIT_MINUTES: f64 = 180.0;
pub const DEFAULT_MIN_FLOOD_MINUTES: f64 = 2.0;
pub const DEFAULT_MAX_FLOOD_MINUTES: f64 = 15.0;

// # Period boundary defaults (spec.md §3)

pub const DEFAULT_MORNING_START_MINUTES: u32 = 6 * 60;
pub const DEFAULT_DAY_START_MINUTES: u32 = 9 * 60;
pub const DEFAULT_EVENING_START_MINUTES: u32 = 18 * 60;
pub const DEFAULT_NIGHT_START_MINUTES: u32 = 20 * 60;

/// Sunrise is only allowed to move `morning_start` when it falls in this window.
pub const SUNRISE_ADJUST_WINDOW: (u32, u32) = (5 * 60, 7 * 60);
/// Sunset is only allowed to move `evening_start` when it falls in this window.
pub const SUNSET_ADJUST_WINDOW: (u32, u32) = (17 * 60, 19 * 60);

/// A projected period-end time this close to (or past) the next period's
/// nominal start lets that next period begin from the projection instead
/// of its nominal start (spec.md §4.9 step 2b).
pub const PERIOD_CARRYOVER_TOLERANCE_MINUTES: i64 = 10;

// # Period base OFF-duration defaults, minutes (spec.md §4.9)

pub const DEFAULT_MORNING_BASE_WAIT: f64 = 18.0;
pub const DEFAULT_DAY_BASE_WAIT: f64 = 28.0;
pub const DEFAULT_EVENING_BASE_WAIT: f64 = 18.0;
pub const DEFAULT_NIGHT_BASE_WAIT: f64 = 118.0;

// # Observation service (spec.md §4.3, §4.4)

/// Used when `station_id = "auto"` but no location has been resolved yet
/// to pick a nearest station (Sydney Observatory Hill).
pub const DEFAULT_STATION_ID: &str = "94768";

pub const OBSERVATION_RING_CAPACITY: usize = 24;
pub const DEFAULT_TREND_WINDOW_HOURS: i64 = 3;
/// A |Δtemperature| greater than this over the trend window is rising/falling.
pub const TREND_CHANGE_THRESHOLD_C: f64 = 1.0;

pub const MIN_TEMPERATURE_C: f64 = 0.0;
pub const MAX_TEMPERATURE_C: f64 = 50.0;
pub const MIN_HUMIDITY_PCT: f64 = 0.0;
pub const MAX_HUMIDITY_PCT: f64 = 100.0;

pub const DEFAULT_UPDATE_INTERVAL_MINUTES: u64 = 60;

// # Device registry (spec.md §4.5)

pub const DEFAULT_DEVICE_RETRY_ATTEMPTS: u32 = 3;

// # Validator (spec.md §4.10)

pub const DEFAULT_VALIDATOR_THRESHOLD: f64 = 0.5;
pub const EVENT_COUNT_WARN_PERCENT: f64 = 30.0;

// # Worker polling granularity (spec.md §5)

pub const SHUTDOWN_POLL_INTERVAL_SECS: u64 = 1;
pub const ACTIVE_HOURS_POLL_INTERVAL_SECS: u64 = 60;

/// Earth radius used for Haversine distance, kilometres (spec.md §4.1).
pub const EARTH_RADIUS_KM: f64 = 6371.0;
