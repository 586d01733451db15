//! Leveled, macro-based structured logging.
//!
//! Grounded in `sunsetr`'s `Log` facility: a process-wide enable flag plus
//! an optional background writer thread so a slow disk never blocks a
//! scheduler worker. Unlike the teacher, output is plain `[LEVEL] message`
//! lines — the box-drawing styling was specific to sunsetr's interactive
//! terminal daemon and has no place in a headless controller.

use std::fs::OpenOptions;
use std::io::Write;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::mpsc::{Sender, channel};

static LOGGING_ENABLED: AtomicBool = AtomicBool::new(true);
static MIN_LEVEL: AtomicU8 = AtomicU8::new(Level::Info as u8);
static FILE_SINK: OnceLock<Option<Sender<String>>> = OnceLock::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Level {
    Debug = 0,
    Info = 1,
    Warn = 2,
    Error = 3,
}

impl Level {
    pub fn parse(s: &str) -> Level {
        match s.to_ascii_lowercase().as_str() {
            "debug" | "trace" => Level::Debug,
            "warn" | "warning" => Level::Warn,
            "error" => Level::Error,
            _ => Level::Info,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        }
    }
}

pub struct Log;

impl Log {
    /// Enable or disable logging entirely (used by tests to keep output quiet).
    pub fn set_enabled(enabled: bool) {
        LOGGING_ENABLED.store(enabled, Ordering::SeqCst);
    }

    pub fn set_min_level(level: Level) {
        MIN_LEVEL.store(level as u8, Ordering::SeqCst);
    }

    /// Start writing log lines to `path` in addition to stdout/stderr.
    ///
    /// Spawns one writer thread so callers (scheduler workers) never block
    /// on disk I/O; it is torn down only on process exit.
    pub fn start_file_sink(path: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        let (tx, rx) = channel::<String>();
        std::thread::spawn(move || {
            for line in rx {
                let _ = writeln!(file, "{line}");
            }
        });
        let _ = FILE_SINK.set(Some(tx));
        Ok(())
    }

    pub fn log(level: Level, args: std::fmt::Arguments<'_>) {
        if !LOGGING_ENABLED.load(Ordering::SeqCst) {
            return;
        }
        if (level as u8) < MIN_LEVEL.load(Ordering::SeqCst) {
            return;
        }
        let line = format!("[{}] {}", level.label(), args);
        if level >= Level::Warn {
            eprintln!("{line}");
        } else {
            println!("{line}");
        }
        if let Some(Some(tx)) = FILE_SINK.get() {
            let _ = tx.send(line);
        }
    }
}

#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => { $crate::logger::Log::log($crate::logger::Level::Debug, format_args!($($arg)*)) };
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => { $crate::logger::Log::log($crate::logger::Level::Info, format_args!($($arg)*)) };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => { $crate::logger::Log::log($crate::logger::Level::Warn, format_args!($($arg)*)) };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => { $crate::logger::Log::log($crate::logger::Level::Error, format_args!($($arg)*)) };
}

/// Logs at error level, then exits the process with status 1. Startup-only.
#[macro_export]
macro_rules! log_error_exit {
    ($($arg:tt)*) => {{
        $crate::logger::Log::log($crate::logger::Level::Error, format_args!($($arg)*));
        std::process::exit(1);
    }};
}
