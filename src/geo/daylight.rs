//! Daylight Service: postal-code → location, and sunrise/sunset for a date
//! (spec.md §4.2).

use super::postal::{lookup_postcode, PostalEntry};
use crate::time_of_day::TimeOfDay;
use chrono::{Datelike, NaiveDate, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

/// Constructed from a postal code and timezone name. Fails silently: an
/// unknown postcode or timezone degrades the service to "location not set"
/// rather than raising (spec.md §4.2, `LocationUnresolved`).
pub struct DaylightService {
    location: Option<PostalEntry>,
    timezone: Tz,
}

impl DaylightService {
    pub fn new(postcode: Option<&str>, timezone_name: &str) -> Self {
        let timezone = timezone_name.parse::<Tz>().unwrap_or(chrono_tz::Australia::Sydney);
        let location = postcode.and_then(lookup_postcode);
        if postcode.is_some() && location.is_none() {
            crate::log_warn!("postal code {:?} not found in database; daylight disabled", postcode);
        }
        DaylightService { location, timezone }
    }

    pub fn has_location(&self) -> bool {
        self.location.is_some()
    }

    pub fn resolved_coordinates(&self) -> Option<(f64, f64)> {
        self.location.map(|l| (l.latitude, l.longitude))
    }

    pub fn display_name(&self) -> Option<&'static str> {
        self.location.map(|l| l.place_name)
    }

    /// Sunrise/sunset, local wall-clock, for `date` (defaults to today in the
    /// configured timezone). A missing location yields `(None, None)`.
    pub fn sunrise_sunset(&self, date: Option<NaiveDate>) -> (Option<TimeOfDay>, Option<TimeOfDay>) {
        let Some(location) = self.location else {
            return (None, None);
        };
        let date = date.unwrap_or_else(|| Utc::now().with_timezone(&self.timezone).date_naive());

        let (sunrise_ts, sunset_ts) = sunrise::sunrise_sunset(
            location.latitude,
            location.longitude,
            date.year(),
            date.month(),
            date.day(),
        );

        let sunrise_local = self.timezone.timestamp_opt(sunrise_ts, 0).single();
        let sunset_local = self.timezone.timestamp_opt(sunset_ts, 0).single();

        (
            sunrise_local.and_then(|d| TimeOfDay::from_hm(d.hour(), d.minute())),
            sunset_local.and_then(|d| TimeOfDay::from_hm(d.hour(), d.minute())),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_postcode_degrades_to_no_location() {
        let svc = DaylightService::new(Some("00000"), "Australia/Sydney");
        assert!(!svc.has_location());
        assert_eq!(svc.sunrise_sunset(None), (None, None));
    }

    #[test]
    fn known_postcode_resolves_coordinates() {
        let svc = DaylightService::new(Some("2000"), "Australia/Sydney");
        assert!(svc.has_location());
        let (lat, lon) = svc.resolved_coordinates().unwrap();
        assert!((-34.0..-33.0).contains(&lat));
        assert!((150.0..152.0).contains(&lon));
    }

    #[test]
    fn no_postcode_has_no_location() {
        let svc = DaylightService::new(None, "Australia/Sydney");
        assert!(!svc.has_location());
    }
}
