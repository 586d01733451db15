//! SIGINT/SIGTERM handling (spec.md §6 "Signals").
//!
//! Grounded in `sunsetr`'s signal thread: one background thread blocks on
//! `Signals::forever()` and flips a shared atomic; nothing else in the
//! process touches signal state directly.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};
use signal_hook::consts::signal::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;

/// What caller-visible shutdown handle the process ended up taking.
/// Distinguishing `SIGINT` lets `main` return exit code 130, per
/// spec.md §6.
pub struct ShutdownHandle {
    pub flag: Arc<AtomicBool>,
    pub interrupted: Arc<AtomicBool>,
}

/// Spawns the signal-watching thread and returns the flag it sets on
/// `INT`/`TERM`. The main loop polls this flag (spec.md §5 suspension
/// points); `run()` blocks the whole process until it flips.
pub fn install_shutdown_handler() -> Result<ShutdownHandle> {
    let shutdown = Arc::new(AtomicBool::new(false));
    let interrupted = Arc::new(AtomicBool::new(false));
    let mut signals = Signals::new([SIGINT, SIGTERM]).context("failed to register signal handlers")?;

    let flag = Arc::clone(&shutdown);
    let interrupted_flag = Arc::clone(&interrupted);
    thread::spawn(move || {
        for sig in signals.forever() {
            let name = match sig {
                SIGINT => "SIGINT",
                SIGTERM => "SIGTERM",
                _ => "signal",
            };
            crate::log_info!("received {}, initiating graceful shutdown", name);
            if sig == SIGINT {
                interrupted_flag.store(true, Ordering::SeqCst);
            }
            flag.store(true, Ordering::SeqCst);
        }
    });

    Ok(ShutdownHandle { flag: shutdown, interrupted })
}
