//! Scheduler factory: dispatches `(growing_system.type, schedule.type,
//! adaptive.enabled)` to a concrete scheduler (spec.md §4.12).

use std::sync::{Arc, Mutex};

use super::adaptive::{AdaptiveGenerator, Constraints, PeriodBaseWaits};
use super::interval::{IntervalConfig, IntervalScheduler};
use super::nft::NftScheduler;
use super::time_of_day::{RawCycle, TimeOfDayScheduler};
use super::Scheduler;
use crate::device::DeviceHandle;
use crate::environment::EnvironmentalService;
use crate::observation::Sensitivity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrowingSystem {
    FloodDrain,
    Nft,
}

pub enum ScheduleKind {
    Interval(IntervalConfig),
    TimeBased { cycles: Vec<RawCycle>, flood_minutes: f64 },
    Adaptive {
        flood_minutes: f64,
        base_waits: PeriodBaseWaits,
        constraints: Constraints,
        sensitivity: Sensitivity,
        update_interval_minutes: Option<f64>,
    },
}

/// Factory dispatch table (spec.md §4.12):
///
/// | growing     | schedule    | adaptive | -> scheduler              |
/// |-------------|-------------|----------|----------------------------|
/// | flood_drain | interval    | —        | Interval                   |
/// | flood_drain | time_based  | false    | Time-of-Day                |
/// | flood_drain | time_based  | true     | Adaptive (wraps Time-of-Day) |
/// | nft         | *           | —        | Nft (reserved placeholder) |
pub fn build_scheduler(
    growing_system: GrowingSystem,
    schedule: ScheduleKind,
    device: Arc<Mutex<DeviceHandle>>,
    env: Arc<Mutex<EnvironmentalService>>,
) -> Box<dyn Scheduler> {
    if growing_system == GrowingSystem::Nft {
        return Box::new(NftScheduler::new(device));
    }

    match schedule {
        ScheduleKind::Interval(config) => Box::new(IntervalScheduler::new(config, device)),
        ScheduleKind::TimeBased { cycles, flood_minutes } => {
            Box::new(TimeOfDayScheduler::from_raw(cycles, flood_minutes, device))
        }
        ScheduleKind::Adaptive { flood_minutes, base_waits, constraints, sensitivity, update_interval_minutes } => {
            Box::new(AdaptiveGenerator::new(true, flood_minutes, base_waits, constraints, sensitivity, update_interval_minutes, env, device))
        }
    }
}
