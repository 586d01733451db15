//! Configuration schema: a typed, closed-set JSON document with union
//! dispatch on `schedule.type` (spec.md §4.11).

pub mod loading;
pub mod validation;

use serde::Deserialize;

pub use loading::load_config;

#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct RootConfig {
    pub devices: DevicesConfig,
    pub growing_system: GrowingSystemConfig,
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub web: Option<WebConfig>,
    #[serde(default)]
    pub sensors: Option<serde_json::Value>,
    #[serde(default)]
    pub actuators: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct DevicesConfig {
    pub devices: Vec<DeviceEntry>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DeviceEntry {
    pub device_id: String,
    pub name: String,
    pub brand: String,
    pub address: String,
    #[serde(default)]
    pub auth: Option<serde_json::Value>,
    #[serde(default)]
    pub auto_discovery: Option<bool>,
    #[serde(default)]
    pub config: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct GrowingSystemConfig {
    #[serde(rename = "type")]
    pub system_type: String,
    pub primary_device_id: String,
    #[serde(default)]
    pub config: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
#[serde(deny_unknown_fields)]
pub enum ScheduleConfig {
    Interval {
        #[serde(default = "default_true")]
        enabled: bool,
        flood_minutes: f64,
        drain_minutes: f64,
        interval_minutes: f64,
        #[serde(default)]
        active_hours: Option<(String, String)>,
    },
    TimeBased {
        flood_minutes: f64,
        cycles: Vec<RawCycleEntry>,
        #[serde(default)]
        adaptation: Option<AdaptationConfig>,
    },
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
pub struct RawCycleEntry {
    pub on_time: String,
    pub off_duration_minutes: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AdaptationConfig {
    pub enabled: bool,
    #[serde(default)]
    pub location: Option<LocationConfig>,
    #[serde(default)]
    pub temperature: Option<TemperatureConfig>,
    #[serde(default)]
    pub daylight: Option<DaylightConfig>,
    #[serde(default)]
    pub adaptive: Option<AdaptiveConfig>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct LocationConfig {
    pub postcode: Option<String>,
    pub timezone: Option<String>,
    pub station_id: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct TemperatureConfig {
    pub update_interval_minutes: Option<f64>,
    pub sensitivity: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct DaylightConfig {
    pub enabled: Option<bool>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AdaptiveConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub tod_frequencies: Option<PeriodBaseWaitsConfig>,
    #[serde(default)]
    pub constraints: Option<ConstraintsConfig>,
    /// Custom band tables are accepted for schema fidelity but not
    /// honoured; the fixed thresholds of spec.md §4.3 are always used
    /// (logged once at load time — see `loading::load_config`).
    #[serde(default)]
    pub temperature_bands: Option<serde_json::Value>,
    #[serde(default)]
    pub humidity_bands: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct PeriodBaseWaitsConfig {
    pub morning: f64,
    pub day: f64,
    pub evening: f64,
    pub night: f64,
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct ConstraintsConfig {
    pub min_wait_duration: f64,
    pub max_wait_duration: f64,
    pub min_flood_duration: f64,
    pub max_flood_duration: f64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig { file: None, level: default_log_level() }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct WebConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
}
