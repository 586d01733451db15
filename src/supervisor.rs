//! Wires a loaded configuration into running services and owns the
//! shutdown sequence (spec.md §4.12, §5).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::{AdaptationConfig, RootConfig, ScheduleConfig};
use crate::device::{DeviceHandle, DeviceInfo, DeviceRegistry, NullDriver};
use crate::environment::EnvironmentalService;
use crate::error::CoreError;
use crate::observation::Sensitivity;
use crate::scheduler::adaptive::{Constraints, PeriodBaseWaits};
use crate::scheduler::factory::{build_scheduler, GrowingSystem, ScheduleKind};
use crate::scheduler::interval::IntervalConfig;
use crate::scheduler::time_of_day::RawCycle;
use crate::scheduler::Scheduler;
use crate::time_of_day::TimeOfDay;

const SHUTDOWN_JOIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Owns every live service for the lifetime of one run. `main` constructs
/// one, calls `run`, and lets it drop on exit.
pub struct Supervisor {
    scheduler: Box<dyn Scheduler>,
    primary: Arc<Mutex<DeviceHandle>>,
    secondary: Arc<Mutex<DeviceRegistry>>,
    primary_device_id: String,
}

impl Supervisor {
    /// Build every service from a validated configuration. The only
    /// fallible step left at this point is establishing the initial
    /// connection to every device.
    pub fn bootstrap(config: &RootConfig, force_web: bool) -> Result<Supervisor, CoreError> {
        let _ = force_web; // the control surface is out of scope here; flag is wired through for parity with the CLI contract.

        let primary_device_id = config.growing_system.primary_device_id.clone();
        let mut primary: Option<DeviceHandle> = None;
        let mut secondary = DeviceRegistry::new();

        for entry in &config.devices.devices {
            let info = DeviceInfo {
                device_id: entry.device_id.clone(),
                display_name: entry.name.clone(),
                brand: entry.brand.clone(),
                model: "unknown".to_string(),
                address: entry.address.clone(),
            };
            let driver = Box::new(NullDriver::new(info));
            let mut handle = DeviceHandle::new(driver);
            handle.connect().map_err(|e| CoreError::DeviceUnreachable { device_id: entry.device_id.clone(), message: e.to_string() })?;
            crate::log_info!("device {} ({}) connected", entry.device_id, entry.brand);

            if entry.device_id == primary_device_id {
                primary = Some(handle);
            } else {
                secondary.register(entry.device_id.clone(), handle);
            }
        }

        let primary = primary
            .ok_or_else(|| CoreError::DeviceUnreachable { device_id: primary_device_id.clone(), message: "not registered".to_string() })?;
        let primary = Arc::new(Mutex::new(primary));
        let secondary = Arc::new(Mutex::new(secondary));

        let growing_system = match config.growing_system.system_type.as_str() {
            "nft" => GrowingSystem::Nft,
            _ => GrowingSystem::FloodDrain,
        };

        let env = Arc::new(Mutex::new(build_environment(&config.schedule)));
        let schedule_kind = build_schedule_kind(&config.schedule);
        let scheduler = build_scheduler(growing_system, schedule_kind, Arc::clone(&primary), env);

        Ok(Supervisor { scheduler, primary, secondary, primary_device_id })
    }

    pub fn run(&mut self, shutdown: Arc<AtomicBool>) {
        self.scheduler.start();
        crate::log_info!("controller running; primary device {}", self.primary_device_id);

        while !shutdown.load(Ordering::SeqCst) {
            std::thread::sleep(Duration::from_secs(1));
        }

        crate::log_info!("shutdown signal received");
        self.scheduler.stop(SHUTDOWN_JOIN_TIMEOUT);
        if !self.primary.lock().unwrap().ensure_off() {
            crate::log_error!("primary device {} could not be confirmed off during shutdown", self.primary_device_id);
        }
        self.secondary.lock().unwrap().ensure_all_off();
        crate::log_info!("shutdown complete");
    }
}

fn build_environment(schedule: &ScheduleConfig) -> EnvironmentalService {
    let adaptation = match schedule {
        ScheduleConfig::TimeBased { adaptation: Some(a), .. } => Some(a),
        _ => None,
    };

    let (postcode, timezone, station_id, sensitivity) = match adaptation {
        Some(AdaptationConfig { location, temperature, .. }) => {
            let postcode = location.as_ref().and_then(|l| l.postcode.clone());
            let timezone = location.as_ref().and_then(|l| l.timezone.clone()).unwrap_or_else(|| "UTC".to_string());
            let station_id = location.as_ref().and_then(|l| l.station_id.clone());
            let sensitivity = temperature
                .as_ref()
                .and_then(|t| t.sensitivity.as_deref())
                .map(parse_sensitivity)
                .unwrap_or(Sensitivity::Medium);
            (postcode, timezone, station_id, sensitivity)
        }
        None => (None, "UTC".to_string(), None, Sensitivity::Medium),
    };

    EnvironmentalService::new(postcode.as_deref(), &timezone, station_id.as_deref(), sensitivity)
}

fn parse_sensitivity(s: &str) -> Sensitivity {
    match s.to_ascii_lowercase().as_str() {
        "low" => Sensitivity::Low,
        "high" => Sensitivity::High,
        _ => Sensitivity::Medium,
    }
}

fn build_schedule_kind(schedule: &ScheduleConfig) -> ScheduleKind {
    match schedule {
        ScheduleConfig::Interval { enabled, flood_minutes, drain_minutes, interval_minutes, active_hours } => {
            // `enabled` gates the active-hours window itself, not the
            // scheduler: disabled means run continuously, ignoring any
            // configured window (original_source's `schedule_enabled`).
            let active_hours = if *enabled {
                active_hours.as_ref().and_then(|(start, end)| Some((TimeOfDay::parse(start)?, TimeOfDay::parse(end)?)))
            } else {
                None
            };
            ScheduleKind::Interval(IntervalConfig {
                flood_minutes: *flood_minutes,
                drain_minutes: *drain_minutes,
                interval_minutes: *interval_minutes,
                active_hours,
            })
        }
        ScheduleConfig::TimeBased { flood_minutes, cycles, adaptation } => {
            let raw: Vec<RawCycle> = cycles.iter().map(|c| RawCycle { on_time: c.on_time.clone(), off_duration_minutes: c.off_duration_minutes }).collect();

            // Dispatch requires both `adaptation.enabled` and
            // `adaptation.adaptive.enabled` (original_source's
            // `scheduler_factory.py`): the former turns on environmental
            // awareness at all, the latter specifically the full-day
            // adaptive generator rather than plain time-of-day cycles.
            let adaptive_active = match adaptation {
                Some(AdaptationConfig { enabled: true, adaptive, .. }) => adaptive.as_ref().map_or(false, |a| a.enabled),
                _ => false,
            };

            if adaptive_active {
                let AdaptationConfig { adaptive, temperature, .. } = adaptation.as_ref().unwrap();
                let base_waits = adaptive
                    .as_ref()
                    .and_then(|a| a.tod_frequencies)
                    .map(|t| PeriodBaseWaits { morning: t.morning, day: t.day, evening: t.evening, night: t.night })
                    .unwrap_or_default();
                let constraints = adaptive
                    .as_ref()
                    .and_then(|a| a.constraints)
                    .map(|c| Constraints {
                        min_wait: c.min_wait_duration,
                        max_wait: c.max_wait_duration,
                        min_flood: c.min_flood_duration,
                        max_flood: c.max_flood_duration,
                    })
                    .unwrap_or_default();
                let sensitivity = temperature.as_ref().and_then(|t| t.sensitivity.as_deref()).map(parse_sensitivity).unwrap_or(Sensitivity::Medium);
                let update_interval_minutes = temperature.as_ref().and_then(|t| t.update_interval_minutes);
                ScheduleKind::Adaptive { flood_minutes: *flood_minutes, base_waits, constraints, sensitivity, update_interval_minutes }
            } else {
                ScheduleKind::TimeBased { cycles: raw, flood_minutes: *flood_minutes }
            }
        }
    }
}
