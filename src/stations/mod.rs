//! Station Registry: a process-global immutable directory of weather
//! observation stations (spec.md §4.1), grounded in
//! `original_source/src/data/bom_stations.py`.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// `(id, display_name, latitude, longitude, region)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    pub id: &'static str,
    pub display_name: &'static str,
    pub latitude: f64,
    pub longitude: f64,
    pub region: &'static str,
}

/// `(station_id, station_name, distance_km)`.
#[derive(Debug, Clone, PartialEq)]
pub struct NearestStation {
    pub id: &'static str,
    pub display_name: &'static str,
    pub distance_km: f64,
}

// id -> (name, lat, lon, region). A representative subset of the Bureau of
// Meteorology observation network, in the same shape as the original's
// `BOM_STATIONS` table.
static STATIONS: &[(&str, &str, f64, f64, &str)] = &[
    ("94768", "Sydney Observatory Hill", -33.8597, 151.2053, "NSW"),
    ("94767", "Sydney Airport", -33.9399, 151.1753, "NSW"),
    ("94752", "Bankstown Airport", -33.9244, 150.9883, "NSW"),
    ("94710", "Cessnock Airport", -32.7875, 151.3422, "NSW"),
    ("94693", "Tamworth Airport", -31.0839, 150.8467, "NSW"),
    ("94637", "Wagga Wagga", -35.1667, 147.4667, "NSW"),
    ("94594", "Wollongong", -34.4333, 150.8833, "NSW"),
    ("95936", "Melbourne", -37.8136, 144.9631, "VIC"),
    ("95904", "Melbourne Airport", -37.6733, 144.8433, "VIC"),
    ("95832", "Ballarat", -37.5000, 143.8167, "VIC"),
    ("95829", "Bendigo", -36.7500, 144.2833, "VIC"),
    ("95716", "Warrnambool", -38.2833, 142.4333, "VIC"),
    ("94578", "Brisbane", -27.4698, 153.0251, "QLD"),
    ("94576", "Brisbane Airport", -27.3842, 153.1175, "QLD"),
    ("94527", "Toowoomba", -27.5500, 151.9167, "QLD"),
    ("94360", "Townsville", -19.2500, 146.7667, "QLD"),
    ("94346", "Cairns", -16.8833, 145.7500, "QLD"),
    ("94610", "Perth", -31.9505, 115.8605, "WA"),
    ("94608", "Perth Airport", -31.9383, 115.9669, "WA"),
    ("94592", "Geraldton", -28.8000, 114.7000, "WA"),
    ("94498", "Kalgoorlie", -30.7833, 121.4500, "WA"),
    ("94672", "Adelaide", -34.9285, 138.6007, "SA"),
    ("94668", "Adelaide Airport", -34.9450, 138.5306, "SA"),
    ("94518", "Mount Gambier", -37.7500, 140.7667, "SA"),
    ("94995", "Hobart", -42.8806, 147.3250, "TAS"),
    ("94975", "Launceston", -41.4333, 147.1333, "TAS"),
    ("94120", "Darwin", -12.4167, 130.8833, "NT"),
    ("94077", "Alice Springs", -23.8000, 133.8833, "NT"),
    ("94926", "Canberra", -35.3075, 149.1244, "ACT"),
];

static STATION_INDEX: Lazy<HashMap<&'static str, Station>> = Lazy::new(|| {
    STATIONS
        .iter()
        .map(|&(id, name, lat, lon, region)| {
            (
                id,
                Station {
                    id,
                    display_name: name,
                    latitude: lat,
                    longitude: lon,
                    region,
                },
            )
        })
        .collect()
});

/// Haversine great-circle distance in kilometres (spec.md §4.1).
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    use crate::common::constants::EARTH_RADIUS_KM;
    let (lat1r, lat2r) = (lat1.to_radians(), lat2.to_radians());
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();
    let a = (dlat / 2.0).sin().powi(2) + lat1r.cos() * lat2r.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

/// `O(1)` lookup by station id.
pub fn info(id: &str) -> Option<Station> {
    STATION_INDEX.get(id).cloned()
}

/// Nearest station by great-circle distance; ties broken by first-encountered
/// in the table (spec.md §4.1).
pub fn nearest(lat: f64, lon: f64) -> Option<NearestStation> {
    STATIONS
        .iter()
        .map(|&(id, name, slat, slon, _)| NearestStation {
            id,
            display_name: name,
            distance_km: haversine_km(lat, lon, slat, slon),
        })
        .min_by(|a, b| a.distance_km.partial_cmp(&b.distance_km).unwrap())
}

/// Case-insensitive substring match against name, region or id, sorted by
/// `(region, name)`.
pub fn search(query: &str) -> Vec<Station> {
    let q = query.to_ascii_lowercase();
    let mut matches: Vec<Station> = STATIONS
        .iter()
        .filter(|&&(id, name, _, _, region)| {
            id.to_ascii_lowercase().contains(&q)
                || name.to_ascii_lowercase().contains(&q)
                || region.to_ascii_lowercase().contains(&q)
        })
        .map(|&(id, name, lat, lon, region)| Station {
            id,
            display_name: name,
            latitude: lat,
            longitude: lon,
            region,
        })
        .collect();
    matches.sort_by(|a, b| (a.region, a.display_name).cmp(&(b.region, b.display_name)));
    matches
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn info_lookup() {
        let s = info("94768").unwrap();
        assert_eq!(s.display_name, "Sydney Observatory Hill");
    }

    #[test]
    fn nearest_station_sydney() {
        // spec.md §8 scenario S4
        let n = nearest(-33.87, 151.21).unwrap();
        assert_eq!(n.id, "94768");
        assert!(n.distance_km < 2.0);
    }

    #[test]
    fn haversine_identity_and_symmetry() {
        assert_eq!(haversine_km(-33.86, 151.21, -33.86, 151.21), 0.0);
        let d1 = haversine_km(-33.86, 151.21, -37.81, 144.96);
        let d2 = haversine_km(-37.81, 144.96, -33.86, 151.21);
        assert!((d1 - d2).abs() < 1e-9);
    }

    #[test]
    fn search_is_case_insensitive_and_sorted() {
        let results = search("airport");
        assert!(results.len() > 1);
        for w in results.windows(2) {
            assert!((w[0].region, w[0].display_name) <= (w[1].region, w[1].display_name));
        }
    }

    proptest::proptest! {
        // spec.md §8 invariant 7: round-trip Haversine distance is
        // symmetric and satisfies the triangle inequality.
        #[test]
        fn haversine_is_symmetric_and_obeys_triangle_inequality(
            lat_a in -89.0f64..89.0, lon_a in -179.0f64..179.0,
            lat_b in -89.0f64..89.0, lon_b in -179.0f64..179.0,
            lat_c in -89.0f64..89.0, lon_c in -179.0f64..179.0,
        ) {
            let d_ab = haversine_km(lat_a, lon_a, lat_b, lon_b);
            let d_ba = haversine_km(lat_b, lon_b, lat_a, lon_a);
            prop_assert!((d_ab - d_ba).abs() < 1e-6);

            let d_ac = haversine_km(lat_a, lon_a, lat_c, lon_c);
            let d_cb = haversine_km(lat_c, lon_c, lat_b, lon_b);
            // floating-point slack on top of the true inequality
            prop_assert!(d_ab <= d_ac + d_cb + 1e-6);
        }
    }
}
