//! Observation Service: periodic fetch of temperature/humidity from a
//! weather station, a bounded history ring, and the adjustment-factor and
//! diurnal-estimator math the Adaptive Generator consumes (spec.md §4.3).
//!
//! Grounded in `original_source/src/bom_temperature.py`.

use crate::common::constants::{
    MAX_HUMIDITY_PCT, MAX_TEMPERATURE_C, MIN_HUMIDITY_PCT, MIN_TEMPERATURE_C,
    OBSERVATION_RING_CAPACITY, TREND_CHANGE_THRESHOLD_C,
};
use crate::error::CoreError;
use crate::time_of_day::TimeOfDay;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::VecDeque;

const OBSERVATION_BASE_URL: &str = "http://www.bom.gov.au/fwo/IDN60801/IDN60801";
/// BOM rejects requests without a browser-identifying header (spec.md §4.3).
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sensitivity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Rising,
    Falling,
    Stable,
}

#[derive(Debug, Clone, Copy)]
pub struct Observation {
    pub timestamp: DateTime<Utc>,
    pub temperature_c: Option<f64>,
    pub relative_humidity_pct: Option<f64>,
}

#[derive(Deserialize)]
struct ObservationResponse {
    observations: ObservationsField,
}

#[derive(Deserialize)]
struct ObservationsField {
    data: Vec<ObservationEntry>,
}

#[derive(Deserialize)]
struct ObservationEntry {
    air_temp: Option<f64>,
    rel_hum: Option<f64>,
}

/// Fixed-capacity ring buffer, overwrite-oldest-on-insert (spec.md §9).
struct Ring {
    buf: VecDeque<Observation>,
    capacity: usize,
}

impl Ring {
    fn new(capacity: usize) -> Self {
        Ring { buf: VecDeque::with_capacity(capacity), capacity }
    }

    fn push(&mut self, obs: Observation) {
        if self.buf.len() == self.capacity {
            self.buf.pop_front();
        }
        self.buf.push_back(obs);
    }
}

pub struct ObservationService {
    station_id: String,
    display_name: Option<String>,
    last_temperature: Option<f64>,
    last_humidity: Option<f64>,
    last_update: Option<DateTime<Utc>>,
    ring: Ring,
    client: reqwest::blocking::Client,
    base_url: String,
}

impl ObservationService {
    pub fn new(station_id: impl Into<String>, display_name: Option<String>) -> Self {
        ObservationService {
            station_id: station_id.into(),
            display_name,
            last_temperature: None,
            last_humidity: None,
            last_update: None,
            ring: Ring::new(OBSERVATION_RING_CAPACITY),
            client: reqwest::blocking::Client::new(),
            base_url: OBSERVATION_BASE_URL.to_string(),
        }
    }

    pub fn last_temperature(&self) -> Option<f64> {
        self.last_temperature
    }

    pub fn last_humidity(&self) -> Option<f64> {
        self.last_humidity
    }

    /// Issue one request to the upstream endpoint. On transport/parse
    /// failure, logs and returns the cached temperature (spec.md §4.3,
    /// §7 `UpstreamFetchFailed`/`UpstreamParseFailed`) — never propagates.
    pub fn fetch(&mut self) -> Option<f64> {
        match self.fetch_inner() {
            Ok(temp) => Some(temp),
            Err(e) => {
                crate::log_warn!("observation fetch failed for station {}: {}", self.station_id, e);
                self.last_temperature
            }
        }
    }

    fn fetch_inner(&mut self) -> Result<f64, CoreError> {
        let url = format!("{}.{}.json", self.base_url, self.station_id);
        let response = self
            .client
            .get(&url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .send()
            .map_err(|e| CoreError::UpstreamFetchFailed {
                station_id: self.station_id.clone(),
                message: e.to_string(),
            })?;

        let body: ObservationResponse = response.json().map_err(|e| CoreError::UpstreamParseFailed {
            station_id: self.station_id.clone(),
            message: e.to_string(),
        })?;

        let entry = body.observations.data.first().ok_or_else(|| CoreError::UpstreamParseFailed {
            station_id: self.station_id.clone(),
            message: "empty observation data".to_string(),
        })?;

        let temperature = entry.air_temp.ok_or_else(|| CoreError::UpstreamParseFailed {
            station_id: self.station_id.clone(),
            message: "missing air_temp".to_string(),
        })?;

        let now = Utc::now();
        self.last_temperature = Some(temperature);
        self.last_humidity = entry.rel_hum;
        self.last_update = Some(now);
        self.ring.push(Observation {
            timestamp: now,
            temperature_c: Some(temperature),
            relative_humidity_pct: entry.rel_hum,
        });
        Ok(temperature)
    }

    /// For tests: record an observation without a network round-trip.
    #[doc(hidden)]
    pub fn record_for_test(&mut self, timestamp: DateTime<Utc>, temp: Option<f64>, humidity: Option<f64>) {
        self.last_temperature = temp.or(self.last_temperature);
        self.last_humidity = humidity.or(self.last_humidity);
        self.last_update = Some(timestamp);
        self.ring.push(Observation {
            timestamp,
            temperature_c: temp,
            relative_humidity_pct: humidity,
        });
    }

    /// Base factor by temperature band, scaled by sensitivity (spec.md §4.3).
    pub fn temperature_factor(temperature_c: f64, sensitivity: Sensitivity) -> f64 {
        let base = if temperature_c < 15.0 {
            1.15
        } else if temperature_c <= 25.0 {
            1.00
        } else if temperature_c < 30.0 {
            0.85
        } else {
            0.70
        };
        scale_by_sensitivity(base, sensitivity)
    }

    pub fn humidity_factor(humidity_pct: f64) -> f64 {
        if humidity_pct < 40.0 {
            0.9
        } else if humidity_pct <= 70.0 {
            1.0
        } else {
            1.1
        }
    }

    /// Diurnal estimator (spec.md §4.3): with ≥2 samples, project the linear
    /// trend between ring endpoints to `time`; otherwise offset
    /// `last_temperature`. Clamped to [0, 50] °C.
    pub fn temperature_at(&self, time: TimeOfDay) -> Option<f64> {
        let projected = self.project_temperature(time)?;
        Some(projected.clamp(MIN_TEMPERATURE_C, MAX_TEMPERATURE_C))
    }

    fn project_temperature(&self, time: TimeOfDay) -> Option<f64> {
        if self.ring.buf.len() >= 2 {
            let oldest = self.ring.buf.front()?;
            let newest = self.ring.buf.back()?;
            let (ot, nt) = (oldest.temperature_c?, newest.temperature_c?);
            let dt_hours = (newest.timestamp - oldest.timestamp).num_seconds() as f64 / 3600.0;
            let base = if dt_hours > 0.0 {
                let slope_per_hour = (nt - ot) / dt_hours;
                let newest_tod = TimeOfDay::from_minutes(
                    (newest.timestamp.timestamp() / 60).rem_euclid(1440) as u32,
                );
                let hours_ahead = signed_hours_between(newest_tod, time);
                nt + slope_per_hour * hours_ahead
            } else {
                nt
            };
            Some(base + diurnal_temperature_offset(time.hour()))
        } else {
            self.last_temperature
                .map(|t| t + diurnal_temperature_offset(time.hour()))
        }
    }

    /// Humidity counterpart of [`Self::temperature_at`]. Clamped to [0, 100]%.
    pub fn humidity_at(&self, time: TimeOfDay) -> Option<f64> {
        if self.ring.buf.len() >= 2 {
            let oldest = self.ring.buf.front()?;
            let newest = self.ring.buf.back()?;
            let (oh, nh) = (oldest.relative_humidity_pct?, newest.relative_humidity_pct?);
            let dt_hours = (newest.timestamp - oldest.timestamp).num_seconds() as f64 / 3600.0;
            let base = if dt_hours > 0.0 {
                let slope_per_hour = (nh - oh) / dt_hours;
                let newest_tod = TimeOfDay::from_minutes(
                    (newest.timestamp.timestamp() / 60).rem_euclid(1440) as u32,
                );
                let hours_ahead = signed_hours_between(newest_tod, time);
                nh + slope_per_hour * hours_ahead
            } else {
                nh
            };
            Some((base + diurnal_humidity_offset(time.hour())).clamp(MIN_HUMIDITY_PCT, MAX_HUMIDITY_PCT))
        } else {
            self.last_humidity
                .map(|h| (h + diurnal_humidity_offset(time.hour())).clamp(MIN_HUMIDITY_PCT, MAX_HUMIDITY_PCT))
        }
    }

    /// Coarse trend classification over the trailing `window_hours`
    /// (spec.md §4.3, §8 invariant 9).
    pub fn trend(&self, window_hours: i64) -> Trend {
        let cutoff = Utc::now() - chrono::Duration::hours(window_hours);
        let windowed: Vec<&Observation> = self
            .ring
            .buf
            .iter()
            .filter(|o| o.timestamp >= cutoff && o.temperature_c.is_some())
            .collect();
        if windowed.len() < 2 {
            return Trend::Stable;
        }
        let oldest = windowed.first().unwrap().temperature_c.unwrap();
        let newest = windowed.last().unwrap().temperature_c.unwrap();
        let delta = newest - oldest;
        if delta > TREND_CHANGE_THRESHOLD_C {
            Trend::Rising
        } else if delta < -TREND_CHANGE_THRESHOLD_C {
            Trend::Falling
        } else {
            Trend::Stable
        }
    }
}

fn scale_by_sensitivity(base_factor: f64, sensitivity: Sensitivity) -> f64 {
    if (base_factor - 1.0).abs() < f64::EPSILON {
        return 1.0;
    }
    let scale = match sensitivity {
        Sensitivity::Low => 0.7,
        Sensitivity::Medium => 1.0,
        Sensitivity::High => 1.3,
    };
    1.0 + (base_factor - 1.0) * scale
}

/// Fixed diurnal temperature offset keyed by hour-of-day: morning cool,
/// afternoon warm, overnight cool (spec.md §4.3).
fn diurnal_temperature_offset(hour: u32) -> f64 {
    match hour {
        0..=4 => -2.0,
        5..=8 => -1.0,
        9..=11 => 0.5,
        12..=16 => 2.0,
        17..=20 => 0.5,
        _ => -1.0,
    }
}

/// Humidity runs opposite to temperature through the day.
fn diurnal_humidity_offset(hour: u32) -> f64 {
    match hour {
        0..=4 => 5.0,
        5..=8 => 8.0,
        9..=11 => 0.0,
        12..=16 => -8.0,
        17..=20 => -2.0,
        _ => 5.0,
    }
}

fn signed_hours_between(from: TimeOfDay, to: TimeOfDay) -> f64 {
    let forward = from.minutes_until(to) as f64;
    if forward <= 720.0 {
        forward / 60.0
    } else {
        (forward - 1440.0) / 60.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> TimeOfDay {
        TimeOfDay::from_hm(h, m).unwrap()
    }

    #[test]
    fn temperature_factor_unit_at_band_midpoint() {
        for s in [Sensitivity::Low, Sensitivity::Medium, Sensitivity::High] {
            assert_eq!(ObservationService::temperature_factor(20.0, s), 1.0);
        }
    }

    #[test]
    fn temperature_factor_bands() {
        assert_eq!(ObservationService::temperature_factor(10.0, Sensitivity::Medium), 1.15);
        assert_eq!(ObservationService::temperature_factor(27.0, Sensitivity::Medium), 0.85);
        assert_eq!(ObservationService::temperature_factor(31.0, Sensitivity::Medium), 0.70);
    }

    #[test]
    fn sensitivity_scales_non_unit_factors() {
        let cold_low = ObservationService::temperature_factor(10.0, Sensitivity::Low);
        let cold_high = ObservationService::temperature_factor(10.0, Sensitivity::High);
        assert!((cold_low - (1.0 + 0.15 * 0.7)).abs() < 1e-9);
        assert!((cold_high - (1.0 + 0.15 * 1.3)).abs() < 1e-9);
    }

    #[test]
    fn humidity_factor_bands() {
        assert_eq!(ObservationService::humidity_factor(30.0), 0.9);
        assert_eq!(ObservationService::humidity_factor(55.0), 1.0);
        assert_eq!(ObservationService::humidity_factor(71.0), 1.1);
        assert_eq!(ObservationService::humidity_factor(70.0), 1.0);
    }

    #[test]
    fn trend_rising_over_window() {
        // spec.md §8 scenario S5
        let mut svc = ObservationService::new("94768", None);
        let now = Utc::now();
        svc.record_for_test(now - chrono::Duration::hours(3), Some(18.0), None);
        svc.record_for_test(now - chrono::Duration::hours(2), Some(20.0), None);
        svc.record_for_test(now - chrono::Duration::hours(1), Some(22.0), None);
        svc.record_for_test(now, Some(24.0), None);
        assert_eq!(svc.trend(3), Trend::Rising);
    }

    #[test]
    fn trend_stable_within_half_degree() {
        let mut svc = ObservationService::new("94768", None);
        let now = Utc::now();
        svc.record_for_test(now - chrono::Duration::hours(2), Some(20.0), None);
        svc.record_for_test(now, Some(20.5), None);
        assert_eq!(svc.trend(3), Trend::Stable);
    }

    #[test]
    fn trend_falling() {
        let mut svc = ObservationService::new("94768", None);
        let now = Utc::now();
        svc.record_for_test(now - chrono::Duration::hours(2), Some(22.0), None);
        svc.record_for_test(now, Some(20.0), None);
        assert_eq!(svc.trend(3), Trend::Falling);
    }

    #[test]
    fn trend_with_fewer_than_two_points_is_stable() {
        let mut svc = ObservationService::new("94768", None);
        svc.record_for_test(Utc::now(), Some(20.0), None);
        assert_eq!(svc.trend(3), Trend::Stable);
    }

    #[test]
    fn no_history_uses_last_temperature_plus_offset() {
        let mut svc = ObservationService::new("94768", None);
        svc.last_temperature = Some(20.0);
        let estimate = svc.temperature_at(t(14, 0)).unwrap();
        assert!((estimate - 22.0).abs() < 1e-9);
    }

    #[test]
    fn estimates_clamp_to_valid_range() {
        let mut svc = ObservationService::new("94768", None);
        svc.last_temperature = Some(49.0);
        let estimate = svc.temperature_at(t(14, 0)).unwrap();
        assert_eq!(estimate, MAX_TEMPERATURE_C);
    }

    proptest::proptest! {
        // spec.md §8 invariant 8: the factor is unit (1.0) anywhere inside
        // the "normal" 15-25 C band, for every sensitivity.
        #[test]
        fn temperature_factor_is_unit_across_normal_band(
            temperature_c in 15.0f64..=25.0,
            sensitivity_idx in 0..3u8,
        ) {
            let sensitivity = match sensitivity_idx {
                0 => Sensitivity::Low,
                1 => Sensitivity::High,
                _ => Sensitivity::Medium,
            };
            prop_assert_eq!(ObservationService::temperature_factor(temperature_c, sensitivity), 1.0);
        }

        // spec.md §8 invariant 9: a monotonic rise of at least 1.5 C across
        // the window reads as rising; a drift of at most 0.5 C reads as
        // stable, regardless of the starting temperature.
        #[test]
        fn trend_boundary_rising_and_stable(
            base_temp in -5.0f64..40.0,
            rise in 1.5f64..10.0,
            drift in -0.5f64..=0.5,
        ) {
            let now = Utc::now();

            let mut rising = ObservationService::new("94768", None);
            rising.record_for_test(now - chrono::Duration::hours(2), Some(base_temp), None);
            rising.record_for_test(now, Some(base_temp + rise), None);
            prop_assert_eq!(rising.trend(3), Trend::Rising);

            let mut stable = ObservationService::new("94768", None);
            stable.record_for_test(now - chrono::Duration::hours(2), Some(base_temp), None);
            stable.record_for_test(now, Some(base_temp + drift), None);
            prop_assert_eq!(stable.trend(3), Trend::Stable);
        }
    }
}
