//! A local postal-code database (spec.md §6): `postcode -> (lat, lon, place_name)`.
//!
//! `original_source/src/daylight.py` resolved Australian postcodes via the
//! `pgeocode` Python package; this reimplementation carries a small embedded
//! table in the teacher's "process-wide immutable data loaded at start"
//! style (`sunsetr`'s station/city tables are the same shape) rather than
//! depending on an external geocoding service. See DESIGN.md for the open
//! question this records.

use once_cell::sync::Lazy;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PostalEntry {
    pub latitude: f64,
    pub longitude: f64,
    pub place_name: &'static str,
}

static POSTCODES: &[(&str, f64, f64, &str)] = &[
    ("2000", -33.8688, 151.2093, "Sydney"),
    ("2010", -33.8810, 151.2170, "Surry Hills"),
    ("2150", -33.8151, 151.0011, "Parramatta"),
    ("2250", -33.2833, 151.4167, "Gosford"),
    ("2300", -32.9283, 151.7817, "Newcastle"),
    ("2500", -34.4278, 150.8931, "Wollongong"),
    ("2650", -35.1082, 147.3598, "Wagga Wagga"),
    ("3000", -37.8136, 144.9631, "Melbourne"),
    ("3220", -38.1499, 144.3617, "Geelong"),
    ("3350", -37.5622, 143.8503, "Ballarat"),
    ("3550", -36.7570, 144.2794, "Bendigo"),
    ("4000", -27.4698, 153.0251, "Brisbane"),
    ("4217", -28.0167, 153.4000, "Gold Coast"),
    ("4350", -27.5598, 151.9507, "Toowoomba"),
    ("4870", -16.9186, 145.7781, "Cairns"),
    ("5000", -34.9285, 138.6007, "Adelaide"),
    ("5290", -38.0000, 140.7667, "Mount Gambier"),
    ("6000", -31.9505, 115.8605, "Perth"),
    ("6530", -28.7667, 114.6000, "Geraldton"),
    ("7000", -42.8821, 147.3272, "Hobart"),
    ("7250", -41.4332, 147.1441, "Launceston"),
    ("0800", -12.4634, 130.8456, "Darwin"),
    ("0870", -23.6980, 133.8807, "Alice Springs"),
    ("2600", -35.2809, 149.1300, "Canberra"),
];

static POSTCODE_INDEX: Lazy<HashMap<&'static str, PostalEntry>> = Lazy::new(|| {
    POSTCODES
        .iter()
        .map(|&(code, lat, lon, name)| {
            (
                code,
                PostalEntry {
                    latitude: lat,
                    longitude: lon,
                    place_name: name,
                },
            )
        })
        .collect()
});

/// Returns `None` for an unknown postcode — callers degrade gracefully
/// rather than raise (spec.md §4.2, `LocationUnresolved`).
pub fn lookup_postcode(postcode: &str) -> Option<PostalEntry> {
    POSTCODE_INDEX.get(postcode.trim()).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_postcode_resolves() {
        let e = lookup_postcode("2000").unwrap();
        assert_eq!(e.place_name, "Sydney");
    }

    #[test]
    fn unknown_postcode_degrades_to_none() {
        assert_eq!(lookup_postcode("99999"), None);
    }
}
