//! NFT Scheduler: reserved continuous-flow placeholder (spec.md §4.12).
//! `growing_system.type = "nft"` dispatches here regardless of
//! `schedule.type`; nutrient-film technique is continuous-flow and has no
//! flood/drain cadence to schedule yet.

use std::collections::BTreeMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Local};

use super::{sleep_polling, Scheduler, SchedulerState, WorkerHandle};
use crate::common::constants::ACTIVE_HOURS_POLL_INTERVAL_SECS;
use crate::device::DeviceHandle;

/// Keeps the device continuously energised and otherwise idles; there is
/// no cycle list to publish.
pub struct NftScheduler {
    state: Arc<Mutex<SchedulerState>>,
    device: Arc<Mutex<DeviceHandle>>,
    worker: WorkerHandle,
}

impl NftScheduler {
    pub fn new(device: Arc<Mutex<DeviceHandle>>) -> Self {
        NftScheduler { state: Arc::new(Mutex::new(SchedulerState::Idle)), device, worker: WorkerHandle::new() }
    }

    fn run_loop(state: Arc<Mutex<SchedulerState>>, device: Arc<Mutex<DeviceHandle>>, shutdown: Arc<AtomicBool>) {
        let mut activated = false;
        super::run_worker_loop(&shutdown, || {
            if !activated {
                *state.lock().unwrap() = SchedulerState::Flood;
                device.lock().unwrap().turn_on(true);
                activated = true;
            }
            sleep_polling(ACTIVE_HOURS_POLL_INTERVAL_SECS as f64, &shutdown);
            true
        });
    }
}

impl Scheduler for NftScheduler {
    fn start(&mut self) {
        let state = self.state.clone();
        let device = self.device.clone();
        self.worker.spawn("nft-scheduler", move |shutdown| {
            Self::run_loop(state, device, shutdown);
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
        None
    }

    fn status(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        map.insert("scheduler_type".to_string(), "nft".to_string());
        map.insert("running".to_string(), self.running().to_string());
        map.insert("state".to_string(), self.state().as_str().to_string());
        map
    }
}
