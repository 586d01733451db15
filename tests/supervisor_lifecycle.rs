//! End-to-end wiring: config load -> Supervisor::bootstrap -> run -> clean
//! shutdown, exercising the whole stack with a `NullDriver` device and an
//! interval schedule (spec.md §4.12, §5).

use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use hydro_scheduler::config::load_config;
use hydro_scheduler::supervisor::Supervisor;

fn write_config(contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    fs::write(&path, contents).unwrap();
    (dir, path)
}

#[test]
fn interval_schedule_runs_and_shuts_down_cleanly() {
    let config_json = r#"{
        "devices": {"devices": [{"device_id": "plug1", "name": "Test Plug", "brand": "generic", "address": "10.0.0.5"}]},
        "growing_system": {"type": "flood_drain", "primary_device_id": "plug1"},
        "schedule": {"type": "interval", "enabled": true, "flood_minutes": 0.02, "drain_minutes": 0.02, "interval_minutes": 0.02}
    }"#;
    let (_dir, path) = write_config(config_json);

    let loaded = load_config(&path).expect("config should load and validate");
    let mut supervisor = Supervisor::bootstrap(&loaded, false).expect("bootstrap should connect the mock device");

    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = Arc::clone(&shutdown);
    std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(300));
        shutdown_clone.store(true, Ordering::SeqCst);
    });

    supervisor.run(shutdown);
    // If `run` returns, `stop()` completed within its join timeout and
    // `ensure_all_off` was attempted — nothing further to assert here
    // beyond "this didn't hang or panic".
}

#[test]
fn adaptive_schedule_bootstraps_without_network_access() {
    // No `location.postcode` means the Environmental Service has no
    // coordinates to resolve a station from, so construction must degrade
    // gracefully rather than block on a real HTTP fetch.
    let config_json = r#"{
        "devices": {"devices": [{"device_id": "pump", "name": "Pump", "brand": "generic", "address": "10.0.0.6"}]},
        "growing_system": {"type": "flood_drain", "primary_device_id": "pump"},
        "schedule": {
            "type": "time_based",
            "flood_minutes": 2.0,
            "cycles": [{"on_time": "06:00", "off_duration_minutes": 18.0}],
            "adaptation": {"enabled": true, "temperature": {"sensitivity": "medium"}, "adaptive": {"enabled": true}}
        }
    }"#;
    let (_dir, path) = write_config(config_json);

    let loaded = load_config(&path).expect("config should load and validate");
    let supervisor = Supervisor::bootstrap(&loaded, false);
    assert!(supervisor.is_ok());
}

#[test]
fn rejects_a_config_referencing_an_unknown_primary_device() {
    let config_json = r#"{
        "devices": {"devices": [{"device_id": "plug1", "name": "Plug", "brand": "generic", "address": "10.0.0.5"}]},
        "growing_system": {"type": "flood_drain", "primary_device_id": "nonexistent"},
        "schedule": {"type": "interval", "enabled": true, "flood_minutes": 2.0, "drain_minutes": 18.0, "interval_minutes": 30.0}
    }"#;
    let (_dir, path) = write_config(config_json);

    let result = load_config(&path);
    assert!(result.is_err());
}
