//! Error kinds for the controller, per spec.md §7.
//!
//! Two propagation policies apply throughout the crate:
//! - startup paths (config loading/validation, device connect) return
//!   `anyhow::Result` wrapping one of these and the caller exits loudly;
//! - worker loops catch these, log, and continue — nothing escapes a
//!   running scheduler's background thread.

use std::fmt;

/// A single field-path validation failure, used by [`CoreError::ConfigValidation`].
#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    pub pointer: String,
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.pointer, self.message)
    }
}

/// Error kinds named in spec.md §7.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("configuration is invalid: {0}")]
    ConfigInvalid(String),

    #[error("configuration failed validation:\n{}", format_field_errors(.0))]
    ConfigValidation(Vec<FieldError>),

    #[error("device {device_id} unreachable: {message}")]
    DeviceUnreachable { device_id: String, message: String },

    #[error("device {device_id} did not verify the requested state")]
    DeviceVerifyFailed { device_id: String },

    #[error("failed to fetch observation for station {station_id}: {message}")]
    UpstreamFetchFailed { station_id: String, message: String },

    #[error("failed to parse observation payload for station {station_id}: {message}")]
    UpstreamParseFailed { station_id: String, message: String },

    #[error("location could not be resolved: {0}")]
    LocationUnresolved(String),

    #[error("worker panicked: {0}")]
    WorkerPanic(String),
}

fn format_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {e}"))
        .collect::<Vec<_>>()
        .join("\n")
}
