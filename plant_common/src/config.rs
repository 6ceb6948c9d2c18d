//! Configuration loading traits and types.
//!
//! Standardized TOML configuration for both plant binaries. Each section
//! struct carries serde defaults matching the reference plant (6 conveyors,
//! 2 s update tick, 5 s aggregation poll, anomaly tolerance 10), so both
//! binaries run without a config file and a file only needs the keys it
//! overrides.
//!
//! # Usage
//!
//! ```rust,no_run
//! use plant_common::config::{ConfigLoader, ServerConfig};
//! use std::path::Path;
//!
//! fn main() -> Result<(), plant_common::config::ConfigError> {
//!     let config = ServerConfig::load(Path::new("plant_server.toml"))?;
//!     config.validate()?;
//!     println!("conveyors: {}", config.line.conveyor_count);
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Error type for configuration loading operations.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log level for application logging.
///
/// Uses lowercase serde values for TOML compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive string accepted by `tracing_subscriber::EnvFilter`.
    pub const fn as_filter(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Common configuration fields shared by both plant binaries.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// log_level = "debug"
/// service_name = "plant-server-01"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedConfig {
    /// Logging verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Application instance identifier.
    pub service_name: String,
}

impl SharedConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

// ─── Simulation profiles ────────────────────────────────────────────

fn probability_in_range(name: &str, p: f64) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&p) {
        return Err(ConfigError::ValidationError(format!(
            "{name} must be within [0, 1], got {p}"
        )));
    }
    Ok(())
}

/// Behavior constants for one conveyor tick.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ConveyorProfile {
    /// Chance per tick of dropping into Alarm while powered.
    #[serde(default = "ConveyorProfile::default_alarm_probability")]
    pub alarm_probability: f64,

    /// Chance per running tick of counting one more bottle.
    #[serde(default = "ConveyorProfile::default_bottle_probability")]
    pub bottle_probability: f64,

    /// Lower bound of the running power draw, kW.
    #[serde(default = "ConveyorProfile::default_power_min_kw")]
    pub power_min_kw: f32,

    /// Upper bound of the running power draw, kW.
    #[serde(default = "ConveyorProfile::default_power_max_kw")]
    pub power_max_kw: f32,
}

impl ConveyorProfile {
    fn default_alarm_probability() -> f64 {
        0.05
    }
    fn default_bottle_probability() -> f64 {
        0.30
    }
    fn default_power_min_kw() -> f32 {
        1.0
    }
    fn default_power_max_kw() -> f32 {
        3.0
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        probability_in_range("alarm_probability", self.alarm_probability)?;
        probability_in_range("bottle_probability", self.bottle_probability)?;
        if self.power_min_kw < 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "power_min_kw must be non-negative, got {}",
                self.power_min_kw
            )));
        }
        if self.power_max_kw <= self.power_min_kw {
            return Err(ConfigError::ValidationError(format!(
                "power_max_kw ({}) must exceed power_min_kw ({})",
                self.power_max_kw, self.power_min_kw
            )));
        }
        Ok(())
    }
}

impl Default for ConveyorProfile {
    fn default() -> Self {
        Self {
            alarm_probability: Self::default_alarm_probability(),
            bottle_probability: Self::default_bottle_probability(),
            power_min_kw: Self::default_power_min_kw(),
            power_max_kw: Self::default_power_max_kw(),
        }
    }
}

/// Behavior constants for one filler tick.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FillerProfile {
    /// Chance per tick of dropping into Alarm while powered.
    #[serde(default = "FillerProfile::default_alarm_probability")]
    pub alarm_probability: f64,

    /// Chance per non-alarm tick of actively filling (vs standing by).
    #[serde(default = "FillerProfile::default_run_probability")]
    pub run_probability: f64,

    /// Chance per running tick of counting one more bottle.
    #[serde(default = "FillerProfile::default_bottle_probability")]
    pub bottle_probability: f64,

    /// Lower bound of the filling power draw, kW.
    #[serde(default = "FillerProfile::default_power_min_kw")]
    pub power_min_kw: f32,

    /// Upper bound of the filling power draw, kW.
    #[serde(default = "FillerProfile::default_power_max_kw")]
    pub power_max_kw: f32,

    /// Draw while powered but idle, kW.
    #[serde(default = "FillerProfile::default_standby_power_kw")]
    pub standby_power_kw: f32,
}

impl FillerProfile {
    fn default_alarm_probability() -> f64 {
        0.03
    }
    fn default_run_probability() -> f64 {
        0.70
    }
    fn default_bottle_probability() -> f64 {
        0.40
    }
    fn default_power_min_kw() -> f32 {
        3.0
    }
    fn default_power_max_kw() -> f32 {
        8.0
    }
    fn default_standby_power_kw() -> f32 {
        0.5
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        probability_in_range("alarm_probability", self.alarm_probability)?;
        probability_in_range("run_probability", self.run_probability)?;
        probability_in_range("bottle_probability", self.bottle_probability)?;
        if self.power_min_kw < 0.0 || self.standby_power_kw < 0.0 {
            return Err(ConfigError::ValidationError(
                "power draws must be non-negative".to_string(),
            ));
        }
        if self.power_max_kw <= self.power_min_kw {
            return Err(ConfigError::ValidationError(format!(
                "power_max_kw ({}) must exceed power_min_kw ({})",
                self.power_max_kw, self.power_min_kw
            )));
        }
        Ok(())
    }
}

impl Default for FillerProfile {
    fn default() -> Self {
        Self {
            alarm_probability: Self::default_alarm_probability(),
            run_probability: Self::default_run_probability(),
            bottle_probability: Self::default_bottle_probability(),
            power_min_kw: Self::default_power_min_kw(),
            power_max_kw: Self::default_power_max_kw(),
            standby_power_kw: Self::default_standby_power_kw(),
        }
    }
}

// ─── Server configuration ───────────────────────────────────────────

/// Conveyor-line subsystem section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineConfig {
    /// Number of conveyor units along the line.
    #[serde(default = "LineConfig::default_conveyor_count")]
    pub conveyor_count: u8,

    /// Simulation tick interval in milliseconds.
    #[serde(default = "LineConfig::default_update_interval_ms")]
    pub update_interval_ms: u64,

    #[serde(default)]
    pub profile: ConveyorProfile,
}

impl LineConfig {
    fn default_conveyor_count() -> u8 {
        6
    }
    fn default_update_interval_ms() -> u64 {
        2000
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.conveyor_count == 0 || self.conveyor_count > 32 {
            return Err(ConfigError::ValidationError(format!(
                "conveyor_count must be within 1..=32, got {}",
                self.conveyor_count
            )));
        }
        if self.update_interval_ms == 0 {
            return Err(ConfigError::ValidationError(
                "update_interval_ms must be positive".to_string(),
            ));
        }
        self.profile.validate()
    }
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            conveyor_count: Self::default_conveyor_count(),
            update_interval_ms: Self::default_update_interval_ms(),
            profile: ConveyorProfile::default(),
        }
    }
}

/// Filler subsystem section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FillerConfig {
    /// Simulation tick interval in milliseconds.
    #[serde(default = "FillerConfig::default_update_interval_ms")]
    pub update_interval_ms: u64,

    #[serde(default)]
    pub profile: FillerProfile,
}

impl FillerConfig {
    fn default_update_interval_ms() -> u64 {
        2000
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.update_interval_ms == 0 {
            return Err(ConfigError::ValidationError(
                "update_interval_ms must be positive".to_string(),
            ));
        }
        self.profile.validate()
    }
}

impl Default for FillerConfig {
    fn default() -> Self {
        Self {
            update_interval_ms: Self::default_update_interval_ms(),
            profile: FillerProfile::default(),
        }
    }
}

/// Top-level configuration of the `plant_server` binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "ServerConfig::default_shared")]
    pub shared: SharedConfig,

    #[serde(default)]
    pub line: LineConfig,

    #[serde(default)]
    pub filler: FillerConfig,
}

impl ServerConfig {
    fn default_shared() -> SharedConfig {
        SharedConfig {
            log_level: LogLevel::default(),
            service_name: "plant_server".to_string(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        self.line.validate()?;
        self.filler.validate()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            shared: Self::default_shared(),
            line: LineConfig::default(),
            filler: FillerConfig::default(),
        }
    }
}

// ─── Aggregator configuration ───────────────────────────────────────

/// Polling/aggregation section of the aggregator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PollConfig {
    /// Aggregation cycle interval in milliseconds.
    #[serde(default = "PollConfig::default_interval_ms")]
    pub interval_ms: u64,

    /// Bottle-counter anomaly tolerance (filler ahead of conveyors by
    /// more than this raises the anomaly flag).
    #[serde(default = "PollConfig::default_counter_tolerance")]
    pub counter_tolerance: u32,

    /// Depth bound of the discovery walk.
    #[serde(default = "PollConfig::default_max_browse_depth")]
    pub max_browse_depth: u32,
}

impl PollConfig {
    fn default_interval_ms() -> u64 {
        5000
    }
    fn default_counter_tolerance() -> u32 {
        10
    }
    fn default_max_browse_depth() -> u32 {
        4
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval_ms == 0 {
            return Err(ConfigError::ValidationError(
                "interval_ms must be positive".to_string(),
            ));
        }
        if self.max_browse_depth == 0 {
            return Err(ConfigError::ValidationError(
                "max_browse_depth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: Self::default_interval_ms(),
            counter_tolerance: Self::default_counter_tolerance(),
            max_browse_depth: Self::default_max_browse_depth(),
        }
    }
}

/// Top-level configuration of the `plant_aggregator` binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatorConfig {
    #[serde(default = "AggregatorConfig::default_shared")]
    pub shared: SharedConfig,

    #[serde(default)]
    pub poll: PollConfig,
}

impl AggregatorConfig {
    fn default_shared() -> SharedConfig {
        SharedConfig {
            log_level: LogLevel::default(),
            service_name: "plant_aggregator".to_string(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        self.poll.validate()
    }
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            shared: Self::default_shared(),
            poll: PollConfig::default(),
        }
    }
}

// ─── Loader ─────────────────────────────────────────────────────────

/// Trait for loading configuration from TOML files.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
/// - Semantic validation is separate: call `validate()` after loading
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

// Blanket implementation for all types that implement DeserializeOwned.
impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn log_level_default_and_filter() {
        assert_eq!(LogLevel::default(), LogLevel::Info);
        assert_eq!(LogLevel::Debug.as_filter(), "debug");
    }

    #[test]
    fn server_defaults_match_reference_plant() {
        let config = ServerConfig::default();
        assert_eq!(config.line.conveyor_count, 6);
        assert_eq!(config.line.update_interval_ms, 2000);
        assert_eq!(config.filler.update_interval_ms, 2000);
        assert!((config.line.profile.alarm_probability - 0.05).abs() < f64::EPSILON);
        assert!((config.filler.profile.run_probability - 0.70).abs() < f64::EPSILON);
        assert!((config.filler.profile.standby_power_kw - 0.5).abs() < f32::EPSILON);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn aggregator_defaults_match_reference_plant() {
        let config = AggregatorConfig::default();
        assert_eq!(config.poll.interval_ms, 5000);
        assert_eq!(config.poll.counter_tolerance, 10);
        assert_eq!(config.poll.max_browse_depth, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn probability_out_of_range_rejected() {
        let mut profile = ConveyorProfile::default();
        profile.alarm_probability = 1.5;
        let result = profile.validate();
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn inverted_power_range_rejected() {
        let mut profile = FillerProfile::default();
        profile.power_max_kw = profile.power_min_kw;
        assert!(profile.validate().is_err());
    }

    #[test]
    fn zero_conveyors_rejected() {
        let mut config = ServerConfig::default();
        config.line.conveyor_count = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_service_name_rejected() {
        let mut config = ServerConfig::default();
        config.shared.service_name.clear();
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn load_file_not_found() {
        let result = ServerConfig::load(Path::new("/nonexistent/path/plant.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound)));
    }

    #[test]
    fn load_parse_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not valid toml {{{{").unwrap();

        let result = ServerConfig::load(file.path());
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn load_partial_file_fills_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[shared]
log_level = "debug"
service_name = "line-a"

[line]
conveyor_count = 4
"#
        )
        .unwrap();
        file.flush().unwrap();

        let config = ServerConfig::load(file.path()).unwrap();
        assert_eq!(config.shared.log_level, LogLevel::Debug);
        assert_eq!(config.shared.service_name, "line-a");
        assert_eq!(config.line.conveyor_count, 4);
        // Everything not in the file keeps its default.
        assert_eq!(config.line.update_interval_ms, 2000);
        assert!((config.filler.profile.power_max_kw - 8.0).abs() < f32::EPSILON);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn load_aggregator_overrides() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[poll]
interval_ms = 1000
counter_tolerance = 25
"#
        )
        .unwrap();
        file.flush().unwrap();

        let config = AggregatorConfig::load(file.path()).unwrap();
        assert_eq!(config.poll.interval_ms, 1000);
        assert_eq!(config.poll.counter_tolerance, 25);
        assert_eq!(config.poll.max_browse_depth, 4);
        assert_eq!(config.shared.service_name, "plant_aggregator");
    }
}
