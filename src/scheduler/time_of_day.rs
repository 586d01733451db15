//! Time-of-Day Scheduler: sorted cycles executed in cascading order
//! (spec.md §4.8), grounded in
//! `original_source/src/schedulers/time_based_scheduler.py`.
//!
//! **Resolved open question — cascade trigger.** The source's
//! `just_completed_cycle` flag unconditionally skips the wait on the very
//! next iteration, which would run the rest of the day's cycles back to
//! back with no regard for their anchors. That reading cannot produce the
//! two illustrative scenarios simultaneously (a far-future anchor must
//! still be honoured; a just-missed anchor must cascade). The rule
//! implemented here instead asks whether today's nominal anchor has
//! already elapsed: if so, a just-completed cycle cascades into it
//! immediately; if the anchor is still ahead, it is honoured normally
//! regardless of `just_completed`. See DESIGN.md.

use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Local};

use super::{current_time_of_day, roll_to_datetime, sleep_polling, Scheduler, SchedulerState, WorkerHandle};
use crate::device::DeviceHandle;
use crate::model::{Cycle, Schedule};
use crate::time_of_day::TimeOfDay;
use std::collections::BTreeMap;

/// One resolved iteration of the cascading algorithm: the wall-clock
/// moment to begin flooding, whether that moment is "now" (cascaded) or a
/// future anchor being waited on, and the index to advance to next.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct CyclePlan {
    pub start_time: TimeOfDay,
    pub cascaded: bool,
    pub off_duration_minutes: f64,
    pub next_index: usize,
}

/// Pure decision function — see module docs for the cascade rule.
pub(crate) fn plan_next(cycles: &[Cycle], current_index: usize, now: TimeOfDay, just_completed: bool) -> CyclePlan {
    let cycle = cycles[current_index];
    let anchor_elapsed_today = now.minutes() >= cycle.on_time.minutes();
    let cascaded = just_completed && anchor_elapsed_today;
    let start_time = if cascaded { now } else { cycle.on_time };
    CyclePlan {
        start_time,
        cascaded,
        off_duration_minutes: cycle.off_duration_minutes,
        next_index: (current_index + 1) % cycles.len(),
    }
}

fn parse_cycles(raw: Vec<RawCycle>) -> Vec<Cycle> {
    let mut parsed: Vec<Cycle> = raw
        .into_iter()
        .filter_map(|r| {
            let on_time = TimeOfDay::parse(&r.on_time)?;
            Some(Cycle::new(on_time, r.off_duration_minutes.max(0.0)))
        })
        .collect();
    if parsed.is_empty() {
        crate::log_warn!("no valid cycles parsed; installing a single placeholder cycle");
        parsed.push(Cycle::new(TimeOfDay::from_minutes(0), 60.0));
    }
    parsed.sort_by_key(|c| c.on_time);
    parsed
}

/// Pre-parse input shape for cycles coming from configuration.
#[derive(Debug, Clone)]
pub struct RawCycle {
    pub on_time: String,
    pub off_duration_minutes: f64,
}

struct Shared {
    cycles: Vec<Cycle>,
    current_index: usize,
    just_completed: bool,
}

fn apply_update(shared: &Arc<Mutex<Shared>>, new_cycles: Vec<Cycle>) {
    let mut new_cycles = new_cycles;
    if new_cycles.is_empty() {
        new_cycles.push(Cycle::new(TimeOfDay::from_minutes(0), 60.0));
    }
    new_cycles.sort_by_key(|c| c.on_time);
    let mut guard = shared.lock().unwrap();
    guard.current_index = Schedule::new(new_cycles.clone()).first_index_after(current_time_of_day());
    guard.cycles = new_cycles;
    crate::log_info!("time-of-day cycles reloaded ({} entries)", guard.cycles.len());
}

/// See [`TimeOfDayScheduler::updater`].
#[derive(Clone)]
pub struct CycleUpdater(Arc<Mutex<Shared>>);

impl CycleUpdater {
    pub fn update(&self, new_cycles: Vec<Cycle>) {
        apply_update(&self.0, new_cycles);
    }
}

pub struct TimeOfDayScheduler {
    shared: Arc<Mutex<Shared>>,
    flood_minutes: f64,
    state: Arc<Mutex<SchedulerState>>,
    device: Arc<Mutex<DeviceHandle>>,
    worker: WorkerHandle,
}

impl TimeOfDayScheduler {
    pub fn new(cycles: Vec<Cycle>, flood_minutes: f64, device: Arc<Mutex<DeviceHandle>>) -> Self {
        let mut cycles = cycles;
        if cycles.is_empty() {
            cycles.push(Cycle::new(TimeOfDay::from_minutes(0), 60.0));
        }
        cycles.sort_by_key(|c| c.on_time);
        let current_index = Schedule::new(cycles.clone()).first_index_after(current_time_of_day());
        TimeOfDayScheduler {
            shared: Arc::new(Mutex::new(Shared { cycles, current_index, just_completed: false })),
            flood_minutes,
            state: Arc::new(Mutex::new(SchedulerState::Idle)),
            device,
            worker: WorkerHandle::new(),
        }
    }

    pub fn from_raw(raw: Vec<RawCycle>, flood_minutes: f64, device: Arc<Mutex<DeviceHandle>>) -> Self {
        Self::new(parse_cycles(raw), flood_minutes, device)
    }

    /// Live-reload: re-sort, replace atomically, recompute `current_index`
    /// from the clock. Does not interrupt an in-flight flood/drain
    /// (spec.md §4.8).
    pub fn update_cycles(&self, new_cycles: Vec<Cycle>) {
        apply_update(&self.shared, new_cycles);
    }

    pub fn cycles(&self) -> Vec<Cycle> {
        self.shared.lock().unwrap().cycles.clone()
    }

    /// A cheap, cloneable handle that can push a live-reload from another
    /// thread without holding a reference to the scheduler itself — used
    /// by the Adaptive Generator's refresh worker.
    pub fn updater(&self) -> CycleUpdater {
        CycleUpdater(self.shared.clone())
    }

    fn run_loop(shared: Arc<Mutex<Shared>>, flood_minutes: f64, state: Arc<Mutex<SchedulerState>>, device: Arc<Mutex<DeviceHandle>>, shutdown: Arc<AtomicBool>) {
        super::run_worker_loop(&shutdown, || {
            let (cycles, index, just_completed) = {
                let guard = shared.lock().unwrap();
                (guard.cycles.clone(), guard.current_index, guard.just_completed)
            };
            let now = current_time_of_day();
            let plan = plan_next(&cycles, index, now, just_completed);

            {
                let mut guard = shared.lock().unwrap();
                guard.just_completed = false;
            }

            if !plan.cascaded {
                let wait_minutes = now.minutes_until(plan.start_time) as f64;
                if !sleep_polling(wait_minutes * 60.0, &shutdown) {
                    return false;
                }
            }

            *state.lock().unwrap() = SchedulerState::Flood;
            device.lock().unwrap().turn_on(true);
            if !sleep_polling(flood_minutes * 60.0, &shutdown) {
                device.lock().unwrap().turn_off(true);
                return false;
            }

            *state.lock().unwrap() = SchedulerState::Drain;
            device.lock().unwrap().turn_off(true);
            if !sleep_polling(plan.off_duration_minutes * 60.0, &shutdown) {
                return false;
            }

            *state.lock().unwrap() = SchedulerState::Waiting;
            {
                let mut guard = shared.lock().unwrap();
                guard.current_index = plan.next_index;
                guard.just_completed = true;
            }
            true
        });
    }
}

impl Scheduler for TimeOfDayScheduler {
    fn start(&mut self) {
        let shared = self.shared.clone();
        let flood_minutes = self.flood_minutes;
        let state = self.state.clone();
        let device = self.device.clone();
        *self.state.lock().unwrap() = SchedulerState::Idle;
        self.worker.spawn("time-of-day-scheduler", move |shutdown| {
            Self::run_loop(shared, flood_minutes, state, device, shutdown);
        });
    }

    fn stop(&mut self, timeout: Duration) {
        self.worker.stop(timeout);
        self.device.lock().unwrap().ensure_off();
        *self.state.lock().unwrap() = SchedulerState::Idle;
    }

    fn state(&self) -> SchedulerState {
        *self.state.lock().unwrap()
    }

    fn running(&self) -> bool {
        self.worker.is_started()
    }

    fn next_event_time(&self) -> Option<DateTime<Local>> {
        let guard = self.shared.lock().unwrap();
        let schedule = Schedule::new(guard.cycles.clone());
        Some(roll_to_datetime(schedule.next_on_time_after(current_time_of_day())))
    }

    fn status(&self) -> BTreeMap<String, String> {
        let guard = self.shared.lock().unwrap();
        let mut map = BTreeMap::new();
        map.insert("scheduler_type".to_string(), "time_based".to_string());
        map.insert("running".to_string(), self.running().to_string());
        map.insert("state".to_string(), self.state().as_str().to_string());
        map.insert("total_cycles".to_string(), guard.cycles.len().to_string());
        map.insert("current_cycle_index".to_string(), guard.current_index.to_string());
        if let Some(next) = self.next_event_time() {
            map.insert("next_event_time".to_string(), next.to_rfc3339());
        }
        map
    }
}
