//! Scheduler Interface (spec.md §4.6) and the production variants.

pub mod adaptive;
pub mod factory;
pub mod interval;
pub mod nft;
pub mod time_of_day;

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use chrono::{DateTime, Local, TimeZone, Timelike};

use crate::time_of_day::TimeOfDay;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Flood,
    Drain,
    Waiting,
}

impl SchedulerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchedulerState::Idle => "idle",
            SchedulerState::Flood => "flood",
            SchedulerState::Drain => "drain",
            SchedulerState::Waiting => "waiting",
        }
    }
}

/// Every scheduler variant exposes exactly this contract (spec.md §4.6).
/// State reads are serialised under a single mutex internal to each impl.
pub trait Scheduler: Send {
    fn start(&mut self);
    fn stop(&mut self, timeout: Duration);
    fn state(&self) -> SchedulerState;
    fn running(&self) -> bool;
    fn next_event_time(&self) -> Option<DateTime<Local>>;
    fn status(&self) -> BTreeMap<String, String>;
}

pub(crate) fn current_time_of_day() -> TimeOfDay {
    let now = Local::now();
    TimeOfDay::from_minutes(now.hour() * 60 + now.minute())
}

/// Rolls `time` to the next wall-clock occurrence: today if `time` is still
/// ahead of `Local::now()`, otherwise tomorrow.
pub(crate) fn roll_to_datetime(time: TimeOfDay) -> DateTime<Local> {
    let now = Local::now();
    let today = now.date_naive();
    let naive_today = today.and_hms_opt(time.hour(), time.minute(), 0).expect("valid h/m");
    let candidate = Local.from_local_datetime(&naive_today).single().unwrap_or(now);
    if candidate > now {
        candidate
    } else {
        candidate + chrono::Duration::days(1)
    }
}

/// Sleeps up to `total_seconds`, polling `shutdown` once per second
/// (spec.md §5 suspension points). Returns `false` if interrupted early.
pub(crate) fn sleep_polling(total_seconds: f64, shutdown: &AtomicBool) -> bool {
    let mut remaining = total_seconds;
    while remaining > 0.0 {
        if shutdown.load(Ordering::SeqCst) {
            return false;
        }
        let step = remaining.min(1.0);
        std::thread::sleep(Duration::from_secs_f64(step.max(0.0)));
        remaining -= step;
    }
    !shutdown.load(Ordering::SeqCst)
}

/// One named background worker with a cooperative shutdown flag
/// (spec.md §9 "Background workers"). `start` is idempotent; `stop` joins
/// with a timeout and abandons the thread if it overruns.
pub(crate) struct WorkerHandle {
    shutdown: Arc<AtomicBool>,
    join: Option<JoinHandle<()>>,
    started: bool,
}

impl WorkerHandle {
    pub fn new() -> Self {
        WorkerHandle { shutdown: Arc::new(AtomicBool::new(false)), join: None, started: false }
    }

    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        self.shutdown.clone()
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn spawn<F>(&mut self, name: &str, body: F)
    where
        F: FnOnce(Arc<AtomicBool>) + Send + 'static,
    {
        if self.started {
            crate::log_warn!("{} is already running; start() is a no-op", name);
            return;
        }
        self.started = true;
        self.shutdown.store(false, Ordering::SeqCst);
        let flag = self.shutdown.clone();
        let handle = std::thread::Builder::new()
            .name(name.to_string())
            .spawn(move || body(flag))
            .expect("failed to spawn worker thread");
        self.join = Some(handle);
    }

    pub fn stop(&mut self, timeout: Duration) {
        if !self.started {
            return;
        }
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(handle) = self.join.take() {
            join_with_timeout(handle, timeout);
        }
        self.started = false;
    }
}

/// `JoinHandle::join` has no timeout; bridge one via a watcher thread and a
/// channel, matching `stop(timeout)`'s "abandon if overrun" policy (spec.md §5).
fn join_with_timeout(handle: JoinHandle<()>, timeout: Duration) -> bool {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let _ = handle.join();
        let _ = tx.send(());
    });
    rx.recv_timeout(timeout).is_ok()
}

/// Drives `iteration` until it returns `false`, `shutdown` is set, or the
/// worker is abandoned. A panic inside `iteration` is caught rather than
/// left to kill the thread: it is logged as a `CoreError::WorkerPanic`, the
/// worker backs off for 60s, and the loop retries (spec.md §7).
pub(crate) fn run_worker_loop<F>(shutdown: &Arc<AtomicBool>, mut iteration: F)
where
    F: FnMut() -> bool,
{
    loop {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }
        match std::panic::catch_unwind(std::panic::AssertUnwindSafe(&mut iteration)) {
            Ok(keep_going) => {
                if !keep_going {
                    break;
                }
            }
            Err(payload) => {
                crate::log_error!("{}", crate::error::CoreError::WorkerPanic(panic_message(&payload)));
                if !sleep_polling(60.0, shutdown) {
                    break;
                }
            }
        }
    }
}

fn panic_message(payload: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
