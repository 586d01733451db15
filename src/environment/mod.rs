//! Environmental Service: composes the optional Daylight and Observation
//! services behind one facade, and resolves `station_id == "auto"` against
//! the Station Registry (spec.md §4.2, §4.1).

use crate::common::constants::DEFAULT_STATION_ID;
use crate::geo::DaylightService;
use crate::observation::{ObservationService, Sensitivity, Trend};
use crate::stations;
use crate::time_of_day::TimeOfDay;
use chrono::NaiveDate;

pub struct EnvironmentalService {
    daylight: DaylightService,
    observation: Option<ObservationService>,
    sensitivity: Sensitivity,
}

impl EnvironmentalService {
    pub fn new(
        postcode: Option<&str>,
        timezone_name: &str,
        station_id: Option<&str>,
        sensitivity: Sensitivity,
    ) -> Self {
        let daylight = DaylightService::new(postcode, timezone_name);

        let observation = station_id.and_then(|requested| {
            let resolved = if requested.eq_ignore_ascii_case("auto") {
                match daylight.resolved_coordinates() {
                    Some((lat, lon)) => stations::nearest(lat, lon).map(|n| (n.id.to_string(), Some(n.display_name.to_string()))),
                    // No location yet to find a nearest station from: fall
                    // back to the default station rather than disabling
                    // observations outright (spec.md §4.4).
                    None => stations::info(DEFAULT_STATION_ID).map(|s| (s.id.to_string(), Some(s.display_name.to_string()))),
                }
            } else {
                stations::info(requested).map(|s| (s.id.to_string(), Some(s.display_name.to_string())))
            };
            match resolved {
                Some((id, name)) => Some(ObservationService::new(id, name)),
                None => {
                    crate::log_warn!("could not resolve station {:?}; observations disabled", requested);
                    None
                }
            }
        });

        EnvironmentalService { daylight, observation, sensitivity }
    }

    pub fn sunrise_sunset(&self, date: Option<NaiveDate>) -> (Option<TimeOfDay>, Option<TimeOfDay>) {
        self.daylight.sunrise_sunset(date)
    }

    pub fn has_daylight(&self) -> bool {
        self.daylight.has_location()
    }

    pub fn has_observation(&self) -> bool {
        self.observation.is_some()
    }

    /// Refresh the current observation. No-op if no station resolved.
    pub fn refresh_observation(&mut self) {
        if let Some(obs) = self.observation.as_mut() {
            obs.fetch();
        }
    }

    pub fn current_temperature(&self) -> Option<f64> {
        self.observation.as_ref().and_then(|o| o.last_temperature())
    }

    pub fn current_humidity(&self) -> Option<f64> {
        self.observation.as_ref().and_then(|o| o.last_humidity())
    }

    pub fn estimated_temperature_at(&self, time: TimeOfDay) -> Option<f64> {
        self.observation.as_ref().and_then(|o| o.temperature_at(time))
    }

    pub fn estimated_humidity_at(&self, time: TimeOfDay) -> Option<f64> {
        self.observation.as_ref().and_then(|o| o.humidity_at(time))
    }

    pub fn temperature_factor_at(&self, time: TimeOfDay) -> f64 {
        self.estimated_temperature_at(time)
            .map(|t| ObservationService::temperature_factor(t, self.sensitivity))
            .unwrap_or(1.0)
    }

    pub fn humidity_factor_at(&self, time: TimeOfDay) -> f64 {
        self.estimated_humidity_at(time)
            .map(ObservationService::humidity_factor)
            .unwrap_or(1.0)
    }

    pub fn trend(&self, window_hours: i64) -> Trend {
        self.observation.as_ref().map(|o| o.trend(window_hours)).unwrap_or(Trend::Stable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_station_disables_observation() {
        let env = EnvironmentalService::new(Some("2000"), "Australia/Sydney", None, Sensitivity::Medium);
        assert!(!env.has_observation());
        assert_eq!(env.temperature_factor_at(TimeOfDay::from_hm(14, 0).unwrap()), 1.0);
    }

    #[test]
    fn explicit_station_resolves() {
        let env = EnvironmentalService::new(Some("2000"), "Australia/Sydney", Some("94768"), Sensitivity::Medium);
        assert!(env.has_observation());
    }

    #[test]
    fn auto_station_resolves_via_nearest() {
        let env = EnvironmentalService::new(Some("2000"), "Australia/Sydney", Some("auto"), Sensitivity::Medium);
        assert!(env.has_observation());
    }

    #[test]
    fn auto_without_location_falls_back_to_default_station() {
        let env = EnvironmentalService::new(None, "Australia/Sydney", Some("auto"), Sensitivity::Medium);
        assert!(env.has_observation());
    }

    #[test]
    fn unresolvable_named_station_degrades_gracefully() {
        let env = EnvironmentalService::new(Some("2000"), "Australia/Sydney", Some("not-a-real-station"), Sensitivity::Medium);
        assert!(!env.has_observation());
    }
}
