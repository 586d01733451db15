//! CLI entry point.
//!
//! Parses arguments, loads and validates configuration, then hands off to
//! the [`hydro_scheduler::supervisor::Supervisor`]. All application logic
//! lives in the library; this file only wires it to the process.

use std::sync::atomic::Ordering;

#[macro_use]
extern crate hydro_scheduler;

use hydro_scheduler::args::{self, CliAction, ParsedArgs};
use hydro_scheduler::config;
use hydro_scheduler::logger::{Level, Log};
use hydro_scheduler::signals;
use hydro_scheduler::supervisor::Supervisor;

fn main() {
    let parsed = ParsedArgs::parse(std::env::args());

    let (config_path, force_web) = match parsed.action {
        CliAction::ShowVersion => {
            println!("hydro-scheduler {}", env!("CARGO_PKG_VERSION"));
            std::process::exit(0);
        }
        CliAction::ShowHelp => {
            print!("{}", args::help_text());
            std::process::exit(0);
        }
        CliAction::ShowHelpDueToError { message } => {
            eprintln!("error: {message}\n");
            print!("{}", args::help_text());
            std::process::exit(1);
        }
        CliAction::Run { config_path, force_web } => (config_path, force_web),
    };

    let loaded = match config::load_config(&config_path) {
        Ok(config) => config,
        Err(e) => log_error_exit!("{e}"),
    };

    Log::set_min_level(Level::parse(&loaded.logging.level));
    if let Some(path) = &loaded.logging.file {
        if let Err(e) = Log::start_file_sink(path) {
            log_warn!("could not open log file {}: {}", path, e);
        }
    }

    log_info!("loaded configuration from {}", config_path.display());

    let mut supervisor = match Supervisor::bootstrap(&loaded, force_web) {
        Ok(supervisor) => supervisor,
        Err(e) => log_error_exit!("{e}"),
    };

    let handle = match signals::install_shutdown_handler() {
        Ok(handle) => handle,
        Err(e) => log_error_exit!("{e}"),
    };

    supervisor.run(handle.flag);

    if handle.interrupted.load(Ordering::SeqCst) {
        std::process::exit(130);
    }
    std::process::exit(0);
}
