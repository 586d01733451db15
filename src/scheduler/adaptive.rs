//! Adaptive Generator: emits a full-day cycle list from environmental
//! inputs and wraps a Time-of-Day Scheduler (spec.md §4.9), grounded in
//! `original_source/src/schedulers/adaptive_scheduler.py`.

use std::collections::BTreeMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Local};

use super::time_of_day::{CycleUpdater, TimeOfDayScheduler};
use super::{sleep_polling, Scheduler, SchedulerState, WorkerHandle};
use crate::common::constants::{
    DEFAULT_DAY_BASE_WAIT, DEFAULT_EVENING_BASE_WAIT, DEFAULT_MAX_FLOOD_MINUTES,
    DEFAULT_MAX_WAIT_MINUTES, DEFAULT_MIN_FLOOD_MINUTES, DEFAULT_MIN_WAIT_MINUTES,
    DEFAULT_MORNING_BASE_WAIT, DEFAULT_NIGHT_BASE_WAIT, DEFAULT_UPDATE_INTERVAL_MINUTES,
    PERIOD_CARRYOVER_TOLERANCE_MINUTES,
};
use crate::device::DeviceHandle;
use crate::environment::EnvironmentalService;
use crate::model::{Cycle, Period, PeriodBoundaries};
use crate::observation::{ObservationService, Sensitivity};
use crate::time_of_day::TimeOfDay;

#[derive(Debug, Clone, Copy)]
pub struct PeriodBaseWaits {
    pub morning: f64,
    pub day: f64,
    pub evening: f64,
    pub night: f64,
}

impl Default for PeriodBaseWaits {
    fn default() -> Self {
        PeriodBaseWaits {
            morning: DEFAULT_MORNING_BASE_WAIT,
            day: DEFAULT_DAY_BASE_WAIT,
            evening: DEFAULT_EVENING_BASE_WAIT,
            night: DEFAULT_NIGHT_BASE_WAIT,
        }
    }
}

impl PeriodBaseWaits {
    pub fn get(&self, period: Period) -> f64 {
        match period {
            Period::Morning => self.morning,
            Period::Day => self.day,
            Period::Evening => self.evening,
            Period::Night => self.night,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Constraints {
    pub min_wait: f64,
    pub max_wait: f64,
    pub min_flood: f64,
    pub max_flood: f64,
}

impl Default for Constraints {
    fn default() -> Self {
        Constraints {
            min_wait: DEFAULT_MIN_WAIT_MINUTES,
            max_wait: DEFAULT_MAX_WAIT_MINUTES,
            min_flood: DEFAULT_MIN_FLOOD_MINUTES,
            max_flood: DEFAULT_MAX_FLOOD_MINUTES,
        }
    }
}

/// Pure generation algorithm (spec.md §4.9 steps 1-3), separated from the
/// worker so it can be exercised without a live Environmental Service.
pub(crate) fn generate_schedule(
    sunrise: Option<TimeOfDay>,
    sunset: Option<TimeOfDay>,
    flood_minutes: f64,
    base_waits: PeriodBaseWaits,
    constraints: Constraints,
    sensitivity: Sensitivity,
    mut estimate: impl FnMut(TimeOfDay) -> (Option<f64>, Option<f64>),
) -> Vec<Cycle> {
    let boundaries = PeriodBoundaries::with_daylight(sunrise, sunset);
    let periods = [Period::Morning, Period::Day, Period::Evening, Period::Night];

    let mut all_events: Vec<Cycle> = Vec::new();
    let mut prev_completion_abs: Option<f64> = None;

    for period in periods {
        let start = boundaries.start_of(period).minutes() as f64;
        let mut end = boundaries.end_of(period).minutes() as f64;
        if end <= start {
            end += 1440.0;
        }

        let mut actual_start = start;
        if let Some(prev) = prev_completion_abs {
            let mut prev_norm = prev;
            while prev_norm < start - 720.0 {
                prev_norm += 1440.0;
            }
            while prev_norm > start + 720.0 {
                prev_norm -= 1440.0;
            }
            let diff = (prev_norm - start).abs();
            let inside = prev_norm > start && prev_norm < end;
            if diff <= PERIOD_CARRYOVER_TOLERANCE_MINUTES as f64 || inside {
                actual_start = prev_norm;
            }
        }

        let mut cursor = actual_start;
        let mut last_on_abs = None;
        let mut last_wait = None;
        let base = base_waits.get(period);

        while cursor < end {
            let event_tod = TimeOfDay::from_minutes(cursor.rem_euclid(1440.0) as u32);
            let (temperature, humidity) = estimate(event_tod);
            let t_factor = temperature
                .map(|t| ObservationService::temperature_factor(t, sensitivity))
                .unwrap_or(1.0);
            let h_factor = humidity.map(ObservationService::humidity_factor).unwrap_or(1.0);
            let wait = (base * t_factor * h_factor).clamp(constraints.min_wait, constraints.max_wait);

            let mut cycle = Cycle::new(event_tod, wait);
            cycle.period = Some(period);
            cycle.temperature_c = temperature;
            cycle.humidity_pct = humidity;
            cycle.temperature_factor = Some(t_factor);
            cycle.humidity_factor = Some(h_factor);
            all_events.push(cycle);

            last_on_abs = Some(cursor);
            last_wait = Some(wait);
            cursor += wait + flood_minutes;
        }

        if let (Some(on_abs), Some(wait)) = (last_on_abs, last_wait) {
            prev_completion_abs = Some(on_abs + wait + flood_minutes);
        }
    }

    all_events.sort_by_key(|c| c.on_time);
    all_events
}

pub struct AdaptiveGenerator {
    inner: TimeOfDayScheduler,
    env: Arc<Mutex<EnvironmentalService>>,
    base_waits: PeriodBaseWaits,
    constraints: Constraints,
    sensitivity: Sensitivity,
    flood_minutes: f64,
    enabled: bool,
    update_interval_minutes: f64,
    refresh_worker: WorkerHandle,
}

impl AdaptiveGenerator {
    pub fn new(
        enabled: bool,
        flood_minutes: f64,
        base_waits: PeriodBaseWaits,
        constraints: Constraints,
        sensitivity: Sensitivity,
        update_interval_minutes: Option<f64>,
        env: Arc<Mutex<EnvironmentalService>>,
        device: Arc<Mutex<DeviceHandle>>,
    ) -> Self {
        let flood_minutes = flood_minutes.clamp(constraints.min_flood, constraints.max_flood);
        let initial_cycles = if enabled {
            let guard = env.lock().unwrap();
            let (sunrise, sunset) = guard.sunrise_sunset(None);
            let cycles = generate_schedule(sunrise, sunset, flood_minutes, base_waits, constraints, sensitivity, |t| {
                (guard.estimated_temperature_at(t), guard.estimated_humidity_at(t))
            });
            cycles
        } else {
            vec![Cycle::new(TimeOfDay::from_minutes(0), 60.0)]
        };

        AdaptiveGenerator {
            inner: TimeOfDayScheduler::new(initial_cycles, flood_minutes, device),
            env,
            base_waits,
            constraints,
            sensitivity,
            flood_minutes,
            enabled,
            update_interval_minutes: update_interval_minutes.unwrap_or(DEFAULT_UPDATE_INTERVAL_MINUTES),
            refresh_worker: WorkerHandle::new(),
        }
    }

    fn regenerate(env: &Arc<Mutex<EnvironmentalService>>, flood_minutes: f64, base_waits: PeriodBaseWaits, constraints: Constraints, sensitivity: Sensitivity) -> Vec<Cycle> {
        let guard = env.lock().unwrap();
        let (sunrise, sunset) = guard.sunrise_sunset(None);
        generate_schedule(sunrise, sunset, flood_minutes, base_waits, constraints, sensitivity, |t| {
            (guard.estimated_temperature_at(t), guard.estimated_humidity_at(t))
        })
    }
}

impl Scheduler for AdaptiveGenerator {
    fn start(&mut self) {
        self.inner.start();
        if !self.enabled {
            return;
        }
        let env = self.env.clone();
        let flood_minutes = self.flood_minutes;
        let base_waits = self.base_waits;
        let constraints = self.constraints;
        let sensitivity = self.sensitivity;
        let update_interval_minutes = self.update_interval_minutes;
        let updater = self.inner.updater();
        self.refresh_worker.spawn("adaptive-refresh", move |shutdown| {
            Self::refresh_loop(updater, env, flood_minutes, base_waits, constraints, sensitivity, update_interval_minutes, shutdown);
        });
    }

    fn stop(&mut self, timeout: Duration) {
        self.refresh_worker.stop(timeout);
        self.inner.stop(timeout);
    }

    fn state(&self) -> SchedulerState {
        self.inner.state()
    }

    fn running(&self) -> bool {
        self.inner.running()
    }

    fn next_event_time(&self) -> Option<DateTime<Local>> {
        self.inner.next_event_time()
    }

    fn status(&self) -> BTreeMap<String, String> {
        let mut map = self.inner.status();
        map.insert("scheduler_type".to_string(), "adaptive".to_string());
        map.insert("adaptive_enabled".to_string(), self.enabled.to_string());
        map
    }
}

impl AdaptiveGenerator {
    fn refresh_loop(
        updater: CycleUpdater,
        env: Arc<Mutex<EnvironmentalService>>,
        flood_minutes: f64,
        base_waits: PeriodBaseWaits,
        constraints: Constraints,
        sensitivity: Sensitivity,
        update_interval_minutes: f64,
        shutdown: Arc<AtomicBool>,
    ) {
        super::run_worker_loop(&shutdown, || {
            if !sleep_polling(update_interval_minutes * 60.0, &shutdown) {
                return false;
            }
            {
                let mut guard = env.lock().unwrap();
                guard.refresh_observation();
            }
            let new_cycles = Self::regenerate(&env, flood_minutes, base_waits, constraints, sensitivity);
            updater.update(new_cycles);
            crate::log_info!("adaptive schedule regenerated");
            true
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> TimeOfDay {
        TimeOfDay::from_hm(h, m).unwrap()
    }

    #[test]
    fn s3_adaptive_generation_constant_environment() {
        // spec.md §8 scenario S3
        let cycles = generate_schedule(
            Some(t(6, 10)),
            Some(t(18, 5)),
            2.0,
            PeriodBaseWaits::default(),
            Constraints::default(),
            Sensitivity::Medium,
            |_t| (Some(22.0), Some(55.0)),
        );
        let morning: Vec<_> = cycles.iter().filter(|c| c.period == Some(Period::Morning)).collect();
        assert_eq!(morning[0].on_time, t(6, 10));
        assert_eq!(morning[1].on_time, t(6, 30));
        assert_eq!(morning[2].on_time, t(6, 50));
        for c in &morning {
            assert!((c.off_duration_minutes - 18.0).abs() < 1e-9);
        }
    }

    #[test]
    fn clamping_invariant_holds_across_all_events() {
        let constraints = Constraints::default();
        let cycles = generate_schedule(
            None,
            None,
            2.0,
            PeriodBaseWaits::default(),
            constraints,
            Sensitivity::Medium,
            |_t| (Some(35.0), Some(20.0)),
        );
        for c in &cycles {
            assert!(c.off_duration_minutes >= constraints.min_wait);
            assert!(c.off_duration_minutes <= constraints.max_wait);
        }
    }

    #[test]
    fn ordering_invariant_non_decreasing_on_time() {
        let cycles = generate_schedule(
            Some(t(6, 10)),
            Some(t(18, 5)),
            2.0,
            PeriodBaseWaits::default(),
            Constraints::default(),
            Sensitivity::Medium,
            |_t| (Some(18.0), Some(60.0)),
        );
        for w in cycles.windows(2) {
            assert!(w[0].on_time <= w[1].on_time);
        }
    }

    #[test]
    fn disabled_generator_produces_no_events() {
        let cycles = generate_schedule(None, None, 2.0, PeriodBaseWaits::default(), Constraints::default(), Sensitivity::Medium, |_t| {
            (None, None)
        });
        // With no temperature/humidity, factors default to 1.0, so this
        // still generates a full day — "disabled" is modelled one layer up
        // in `AdaptiveGenerator::new`, which never calls this function.
        assert!(!cycles.is_empty());
    }

    proptest::proptest! {
        // spec.md §8 invariants 1 and 2, across arbitrary constant
        // temperature/humidity readings and sensitivities.
        #[test]
        fn clamping_and_ordering_hold_for_any_constant_reading(
            temp_c in -10.0f64..45.0,
            humidity_pct in 0.0f64..100.0,
            sensitivity_idx in 0..3u8,
        ) {
            let sensitivity = match sensitivity_idx {
                0 => Sensitivity::Low,
                1 => Sensitivity::High,
                _ => Sensitivity::Medium,
            };
            let constraints = Constraints::default();
            let cycles = generate_schedule(
                Some(t(6, 10)),
                Some(t(18, 5)),
                2.0,
                PeriodBaseWaits::default(),
                constraints,
                sensitivity,
                |_t| (Some(temp_c), Some(humidity_pct)),
            );

            for c in &cycles {
                prop_assert!(c.off_duration_minutes >= constraints.min_wait - 1e-9);
                prop_assert!(c.off_duration_minutes <= constraints.max_wait + 1e-9);
            }
            for w in cycles.windows(2) {
                prop_assert!(w[0].on_time <= w[1].on_time);
            }
        }
    }
}
