//! File load + validation step, producing a single fully-typed value
//! (spec.md §9 "Configuration").

use std::fs;
use std::path::Path;

use super::validation::validate;
use super::RootConfig;
use crate::error::CoreError;

/// Load, parse and validate the configuration file. On success, downstream
/// code consumes the result only by borrow (spec.md §5 "frozen after load").
pub fn load_config(path: &Path) -> Result<RootConfig, CoreError> {
    let contents = fs::read_to_string(path)
        .map_err(|e| CoreError::ConfigInvalid(format!("could not read {}: {e}", path.display())))?;

    let config: RootConfig =
        serde_json::from_str(&contents).map_err(|e| CoreError::ConfigInvalid(format!("invalid JSON in {}: {e}", path.display())))?;

    let errors = validate(&config);
    if !errors.is_empty() {
        return Err(CoreError::ConfigValidation(errors));
    }

    warn_about_unhonoured_bands(&config);
    Ok(config)
}

fn warn_about_unhonoured_bands(config: &RootConfig) {
    if let super::ScheduleConfig::TimeBased { adaptation: Some(adaptation), .. } = &config.schedule {
        if let Some(adaptive) = &adaptation.adaptive {
            if adaptive.temperature_bands.is_some() || adaptive.humidity_bands.is_some() {
                crate::log_warn!("custom temperature/humidity bands in config are not honoured; using fixed thresholds");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f
    }

    #[test]
    fn rejects_malformed_json() {
        let f = write_temp("{ not json");
        let err = load_config(f.path()).unwrap_err();
        assert!(matches!(err, CoreError::ConfigInvalid(_)));
    }

    #[test]
    fn loads_a_minimal_valid_interval_config() {
        let json = r#"{
            "devices": {"devices": [{"device_id": "plug1", "name": "Plug", "brand": "generic", "address": "10.0.0.2"}]},
            "growing_system": {"type": "flood_drain", "primary_device_id": "plug1"},
            "schedule": {"type": "interval", "enabled": true, "flood_minutes": 2.0, "drain_minutes": 18.0, "interval_minutes": 30.0}
        }"#;
        let f = write_temp(json);
        let config = load_config(f.path()).unwrap();
        assert_eq!(config.growing_system.primary_device_id, "plug1");
    }

    #[test]
    fn rejects_unknown_primary_device_id() {
        let json = r#"{
            "devices": {"devices": [{"device_id": "plug1", "name": "Plug", "brand": "generic", "address": "10.0.0.2"}]},
            "growing_system": {"type": "flood_drain", "primary_device_id": "missing"},
            "schedule": {"type": "interval", "enabled": true, "flood_minutes": 2.0, "drain_minutes": 18.0, "interval_minutes": 30.0}
        }"#;
        let f = write_temp(json);
        let err = load_config(f.path()).unwrap_err();
        assert!(matches!(err, CoreError::ConfigValidation(_)));
    }
}
