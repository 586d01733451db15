//! Interval Scheduler: fixed flood-drain-wait loop gated by an optional
//! active-hours window (spec.md §4.7), grounded in
//! `original_source/src/schedulers/interval_scheduler.py`.

use std::collections::BTreeMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Local};

use super::{current_time_of_day, roll_to_datetime, sleep_polling, Scheduler, SchedulerState, WorkerHandle};
use crate::common::constants::ACTIVE_HOURS_POLL_INTERVAL_SECS;
use crate::device::DeviceHandle;
use crate::time_of_day::TimeOfDay;

#[derive(Debug, Clone, Copy)]
pub struct IntervalConfig {
    pub flood_minutes: f64,
    pub drain_minutes: f64,
    pub interval_minutes: f64,
    pub active_hours: Option<(TimeOfDay, TimeOfDay)>,
}

/// Wrap-aware window membership (spec.md §4.7): if `start > end`, "inside"
/// means `now >= start || now <= end`.
pub(crate) fn inside_active_hours(now: TimeOfDay, start: TimeOfDay, end: TimeOfDay) -> bool {
    if start.minutes() <= end.minutes() {
        now.minutes() >= start.minutes() && now.minutes() <= end.minutes()
    } else {
        now.minutes() >= start.minutes() || now.minutes() <= end.minutes()
    }
}

pub struct IntervalScheduler {
    config: IntervalConfig,
    state: Arc<Mutex<SchedulerState>>,
    device: Arc<Mutex<DeviceHandle>>,
    worker: WorkerHandle,
}

impl IntervalScheduler {
    pub fn new(config: IntervalConfig, device: Arc<Mutex<DeviceHandle>>) -> Self {
        IntervalScheduler { config, state: Arc::new(Mutex::new(SchedulerState::Idle)), device, worker: WorkerHandle::new() }
    }

    fn run_loop(config: IntervalConfig, state: Arc<Mutex<SchedulerState>>, device: Arc<Mutex<DeviceHandle>>, shutdown: Arc<AtomicBool>) {
        super::run_worker_loop(&shutdown, || {
            if let Some((start, end)) = config.active_hours {
                if !inside_active_hours(current_time_of_day(), start, end) {
                    return sleep_polling(ACTIVE_HOURS_POLL_INTERVAL_SECS as f64, &shutdown);
                }
            }

            *state.lock().unwrap() = SchedulerState::Flood;
            if !device.lock().unwrap().turn_on(true) {
                crate::log_error!("interval scheduler: flood command failed; continuing best-effort");
            }
            if !sleep_polling(config.flood_minutes * 60.0, &shutdown) {
                device.lock().unwrap().turn_off(true);
                return false;
            }

            *state.lock().unwrap() = SchedulerState::Drain;
            if !device.lock().unwrap().turn_off(true) {
                crate::log_error!("interval scheduler: drain command failed; continuing best-effort");
            }
            if !sleep_polling(config.drain_minutes * 60.0, &shutdown) {
                return false;
            }

            *state.lock().unwrap() = SchedulerState::Waiting;
            sleep_polling(config.interval_minutes * 60.0, &shutdown)
        });
    }
}

impl Scheduler for IntervalScheduler {
    fn start(&mut self) {
        let config = self.config;
        let state = self.state.clone();
        let device = self.device.clone();
        *self.state.lock().unwrap() = SchedulerState::Idle;
        self.worker.spawn("interval-scheduler", move |shutdown| {
            Self::run_loop(config, state, device, shutdown);
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
        if !self.running() {
            return None;
        }
        match self.state() {
            SchedulerState::Waiting => {
                let target = current_time_of_day().add_minutes(self.config.interval_minutes);
                Some(roll_to_datetime(target))
            }
            _ => Some(Local::now()),
        }
    }

    fn status(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        map.insert("scheduler_type".to_string(), "interval".to_string());
        map.insert("running".to_string(), self.running().to_string());
        map.insert("state".to_string(), self.state().as_str().to_string());
        map.insert("flood_minutes".to_string(), self.config.flood_minutes.to_string());
        map.insert("drain_minutes".to_string(), self.config.drain_minutes.to_string());
        map.insert("interval_minutes".to_string(), self.config.interval_minutes.to_string());
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> TimeOfDay {
        TimeOfDay::from_hm(h, m).unwrap()
    }

    #[test]
    fn active_hours_simple_window() {
        assert!(inside_active_hours(t(10, 0), t(8, 0), t(18, 0)));
        assert!(!inside_active_hours(t(20, 0), t(8, 0), t(18, 0)));
    }

    #[test]
    fn active_hours_wraps_midnight() {
        // e.g. 22:00 -> 06:00 overnight watering window
        assert!(inside_active_hours(t(23, 0), t(22, 0), t(6, 0)));
        assert!(inside_active_hours(t(3, 0), t(22, 0), t(6, 0)));
        assert!(!inside_active_hours(t(12, 0), t(22, 0), t(6, 0)));
    }
}
