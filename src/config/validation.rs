//! Field-path validation of a freshly-parsed [`super::RootConfig`]
//! (spec.md §4.11 "validation errors are collected, not short-circuited").

use std::collections::HashSet;

use super::{RootConfig, ScheduleConfig};
use crate::error::FieldError;
use crate::time_of_day::TimeOfDay;

const VALID_LOG_LEVELS: [&str; 4] = ["debug", "info", "warn", "error"];
const VALID_SENSITIVITIES: [&str; 3] = ["low", "medium", "high"];

pub fn validate(config: &RootConfig) -> Vec<FieldError> {
    let mut errors = Vec::new();

    validate_devices(config, &mut errors);
    validate_growing_system(config, &mut errors);
    validate_schedule(&config.schedule, &mut errors);
    validate_logging(config, &mut errors);
    validate_web(config, &mut errors);

    errors
}

fn err(errors: &mut Vec<FieldError>, pointer: &str, message: impl Into<String>) {
    errors.push(FieldError { pointer: pointer.to_string(), message: message.into() });
}

fn validate_devices(config: &RootConfig, errors: &mut Vec<FieldError>) {
    if config.devices.devices.is_empty() {
        err(errors, "/devices/devices", "must contain at least one device");
        return;
    }

    let mut seen_ids = HashSet::new();
    for (i, device) in config.devices.devices.iter().enumerate() {
        let base = format!("/devices/devices/{i}");
        if device.device_id.trim().is_empty() {
            err(errors, &format!("{base}/device_id"), "must not be empty");
        } else if !seen_ids.insert(device.device_id.as_str()) {
            err(errors, &format!("{base}/device_id"), format!("duplicate device_id '{}'", device.device_id));
        }
        if device.brand.trim().is_empty() {
            err(errors, &format!("{base}/brand"), "must not be empty");
        }
        if device.address.trim().is_empty() {
            err(errors, &format!("{base}/address"), "must not be empty");
        }
    }
}

fn validate_growing_system(config: &RootConfig, errors: &mut Vec<FieldError>) {
    let gs = &config.growing_system;
    if gs.system_type != "flood_drain" && gs.system_type != "nft" {
        err(errors, "/growing_system/type", format!("must be 'flood_drain' or 'nft', got '{}'", gs.system_type));
    }

    let known = config.devices.devices.iter().any(|d| d.device_id == gs.primary_device_id);
    if !known {
        err(
            errors,
            "/growing_system/primary_device_id",
            format!("references unknown device_id '{}'", gs.primary_device_id),
        );
    }
}

fn validate_schedule(schedule: &ScheduleConfig, errors: &mut Vec<FieldError>) {
    match schedule {
        ScheduleConfig::Interval { flood_minutes, drain_minutes, interval_minutes, active_hours, .. } => {
            if *flood_minutes <= 0.0 {
                err(errors, "/schedule/flood_minutes", "must be positive");
            }
            if *drain_minutes <= 0.0 {
                err(errors, "/schedule/drain_minutes", "must be positive");
            }
            if *interval_minutes <= 0.0 {
                err(errors, "/schedule/interval_minutes", "must be positive");
            }
            if let Some((start, end)) = active_hours {
                if TimeOfDay::parse(start).is_none() {
                    err(errors, "/schedule/active_hours/0", format!("'{start}' is not a valid time"));
                }
                if TimeOfDay::parse(end).is_none() {
                    err(errors, "/schedule/active_hours/1", format!("'{end}' is not a valid time"));
                }
            }
        }
        ScheduleConfig::TimeBased { flood_minutes, cycles, adaptation } => {
            if *flood_minutes <= 0.0 {
                err(errors, "/schedule/flood_minutes", "must be positive");
            }
            if cycles.is_empty() {
                err(errors, "/schedule/cycles", "must contain at least one cycle");
            }
            for (i, cycle) in cycles.iter().enumerate() {
                if TimeOfDay::parse(&cycle.on_time).is_none() {
                    err(errors, &format!("/schedule/cycles/{i}/on_time"), format!("'{}' is not a valid time", cycle.on_time));
                }
                if cycle.off_duration_minutes <= 0.0 {
                    err(errors, &format!("/schedule/cycles/{i}/off_duration_minutes"), "must be positive");
                }
            }
            if let Some(adaptation) = adaptation {
                validate_adaptation(adaptation, errors);
            }
        }
    }
}

fn validate_adaptation(adaptation: &super::AdaptationConfig, errors: &mut Vec<FieldError>) {
    if let Some(temperature) = &adaptation.temperature {
        if let Some(sensitivity) = &temperature.sensitivity {
            if !VALID_SENSITIVITIES.contains(&sensitivity.to_lowercase().as_str()) {
                err(
                    errors,
                    "/schedule/adaptation/temperature/sensitivity",
                    format!("must be one of {VALID_SENSITIVITIES:?}, got '{sensitivity}'"),
                );
            }
        }
        if let Some(interval) = temperature.update_interval_minutes {
            if interval <= 0.0 {
                err(errors, "/schedule/adaptation/temperature/update_interval_minutes", "must be positive");
            }
        }
    }

    if let Some(adaptive) = &adaptation.adaptive {
        if let Some(constraints) = &adaptive.constraints {
            if constraints.min_wait_duration > constraints.max_wait_duration {
                err(errors, "/schedule/adaptation/adaptive/constraints", "min_wait_duration exceeds max_wait_duration");
            }
            if constraints.min_flood_duration > constraints.max_flood_duration {
                err(errors, "/schedule/adaptation/adaptive/constraints", "min_flood_duration exceeds max_flood_duration");
            }
        }
    }
}

fn validate_logging(config: &RootConfig, errors: &mut Vec<FieldError>) {
    if !VALID_LOG_LEVELS.contains(&config.logging.level.to_lowercase().as_str()) {
        err(errors, "/logging/level", format!("must be one of {VALID_LOG_LEVELS:?}, got '{}'", config.logging.level));
    }
}

fn validate_web(config: &RootConfig, errors: &mut Vec<FieldError>) {
    if let Some(web) = &config.web {
        if web.enabled && web.port == Some(0) {
            err(errors, "/web/port", "must not be 0 when web is enabled");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DeviceEntry, DevicesConfig, GrowingSystemConfig, LoggingConfig, RawCycleEntry};

    fn base_config() -> RootConfig {
        RootConfig {
            devices: DevicesConfig {
                devices: vec![DeviceEntry {
                    device_id: "plug1".into(),
                    name: "Plug".into(),
                    brand: "generic".into(),
                    address: "10.0.0.2".into(),
                    auth: None,
                    auto_discovery: None,
                    config: None,
                }],
            },
            growing_system: GrowingSystemConfig { system_type: "flood_drain".into(), primary_device_id: "plug1".into(), config: None },
            schedule: ScheduleConfig::TimeBased {
                flood_minutes: 2.0,
                cycles: vec![RawCycleEntry { on_time: "06:00".into(), off_duration_minutes: 18.0 }],
                adaptation: None,
            },
            logging: LoggingConfig::default(),
            web: None,
            sensors: None,
            actuators: None,
        }
    }

    #[test]
    fn accepts_a_well_formed_config() {
        assert!(validate(&base_config()).is_empty());
    }

    #[test]
    fn rejects_empty_device_list() {
        let mut config = base_config();
        config.devices.devices.clear();
        let errors = validate(&config);
        assert!(errors.iter().any(|e| e.pointer == "/devices/devices"));
    }

    #[test]
    fn rejects_duplicate_device_ids() {
        let mut config = base_config();
        let dup = config.devices.devices[0].clone();
        config.devices.devices.push(dup);
        let errors = validate(&config);
        assert!(errors.iter().any(|e| e.message.contains("duplicate")));
    }

    #[test]
    fn rejects_unparseable_cycle_time() {
        let mut config = base_config();
        config.schedule = ScheduleConfig::TimeBased {
            flood_minutes: 2.0,
            cycles: vec![RawCycleEntry { on_time: "not-a-time".into(), off_duration_minutes: 18.0 }],
            adaptation: None,
        };
        let errors = validate(&config);
        assert!(errors.iter().any(|e| e.pointer.contains("on_time")));
    }

    #[test]
    fn rejects_unknown_log_level() {
        let mut config = base_config();
        config.logging.level = "verbose".into();
        let errors = validate(&config);
        assert!(errors.iter().any(|e| e.pointer == "/logging/level"));
    }

    #[test]
    fn collects_multiple_errors_without_short_circuiting() {
        let mut config = base_config();
        config.devices.devices.clear();
        config.logging.level = "verbose".into();
        let errors = validate(&config);
        assert!(errors.len() >= 2);
    }
}
