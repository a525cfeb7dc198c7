//! Configuration loading traits and types.
//!
//! This module provides a standardized way to load the TOML configuration
//! used by the traversal binary and drivers.
//!
//! # Usage
//!
//! ```rust,no_run
//! use trav_common::config::{ConfigError, TraverseConfig};
//! use std::path::Path;
//!
//! fn main() -> Result<(), ConfigError> {
//!     let config = TraverseConfig::load_validated(Path::new("traverse.toml"))?;
//!     println!("Service: {}", config.shared.service_name);
//!     Ok(())
//! }
//! ```

use crate::consts::{ANGLE_TOLERANCE, DISTANCE_TOLERANCE};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
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
    /// Most verbose, includes every poll iteration.
    Trace,
    /// Per-tick decisions and state transitions.
    Debug,
    /// Setup, turns and course completion.
    #[default]
    Info,
    /// Potentially problematic situations.
    Warn,
    /// Serious problems.
    Error,
}

impl LogLevel {
    /// Directive string understood by `tracing_subscriber::EnvFilter`.
    pub const fn as_directive(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Common configuration fields.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// log_level = "debug"
/// service_name = "trav-sim-01"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SharedConfig {
    /// Logging verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Application instance identifier.
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

fn default_service_name() -> String {
    "traverse".to_string()
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            service_name: default_service_name(),
        }
    }
}

impl SharedConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if `service_name` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Traversal controller settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ControllerConfig {
    /// Upper bound [ms] for a single self-align or turn poll, and for each
    /// leg driven between two turns.
    ///
    /// `None` (the default) polls and drives forever, trusting the sensors
    /// unconditionally.
    pub poll_timeout_ms: Option<u64>,

    /// Emit a debug summary every N control ticks (0 disables).
    pub tick_log_interval: u64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            poll_timeout_ms: None,
            tick_log_interval: 10_000,
        }
    }
}

impl ControllerConfig {
    /// Poll budget as a `Duration`, if bounded.
    pub fn poll_timeout(&self) -> Option<Duration> {
        self.poll_timeout_ms.map(Duration::from_millis)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_timeout_ms == Some(0) {
            return Err(ConfigError::ValidationError(
                "controller.poll_timeout_ms must be greater than 0 (omit it to disable)"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

/// Simulated course and environment settings.
///
/// Distances are in the same units the controller sees; `*_tiles` fields
/// are multiples of `tile_distance`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Spacing between turn points.
    pub tile_distance: f64,
    /// Heading reported at start-up [degrees].
    pub initial_heading: f64,
    /// Lateral wall distance at start-up, in tiles.
    pub initial_lateral_tiles: f64,
    /// Forward wall distance at start-up, in tiles.
    pub initial_forward_tiles: f64,
    /// Forward-distance decrease per environment tick at fast speed.
    pub forward_step_fast: f64,
    /// Heading change per environment tick at fast rotation [degrees].
    pub rotation_step_fast: f64,
    /// Environment tick period [µs].
    pub tick_us: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tile_distance: 12.0,
            initial_heading: 0.1,
            initial_lateral_tiles: 0.5,
            initial_forward_tiles: 3.5,
            forward_step_fast: 0.05,
            rotation_step_fast: 0.05,
            tick_us: 50,
        }
    }
}

impl SimulationConfig {
    /// Environment tick period.
    pub fn tick(&self) -> Duration {
        Duration::from_micros(self.tick_us)
    }

    /// Sensor values at start-up.
    pub fn initial_reading(&self) -> crate::hal::types::SensorReading {
        crate::hal::types::SensorReading {
            heading: self.initial_heading,
            lateral: self.initial_lateral_tiles * self.tile_distance,
            forward: self.initial_forward_tiles * self.tile_distance,
        }
    }

    /// Validate the configuration.
    ///
    /// # Validation Rules
    /// 1. `tile_distance` > 0
    /// 2. `tick_us` > 0
    /// 3. 0 < `forward_step_fast` <= 2 * DISTANCE_TOLERANCE
    /// 4. 0 < `rotation_step_fast` <= 2 * ANGLE_TOLERANCE
    ///
    /// A step wider than the tolerance window can jump over it, and the
    /// controller would then never see its exit condition.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.tile_distance > 0.0) {
            return Err(ConfigError::ValidationError(format!(
                "simulation.tile_distance must be positive (got {})",
                self.tile_distance
            )));
        }
        if self.tick_us == 0 {
            return Err(ConfigError::ValidationError(
                "simulation.tick_us must be greater than 0".to_string(),
            ));
        }
        if !(self.forward_step_fast > 0.0 && self.forward_step_fast <= 2.0 * DISTANCE_TOLERANCE) {
            return Err(ConfigError::ValidationError(format!(
                "simulation.forward_step_fast must be in (0, {}] (got {})",
                2.0 * DISTANCE_TOLERANCE,
                self.forward_step_fast
            )));
        }
        if !(self.rotation_step_fast > 0.0 && self.rotation_step_fast <= 2.0 * ANGLE_TOLERANCE) {
            return Err(ConfigError::ValidationError(format!(
                "simulation.rotation_step_fast must be in (0, {}] (got {})",
                2.0 * ANGLE_TOLERANCE,
                self.rotation_step_fast
            )));
        }
        Ok(())
    }
}

/// Complete configuration loaded from `traverse.toml`.
///
/// Every section is optional and falls back to its defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TraverseConfig {
    /// Shared service settings.
    pub shared: SharedConfig,
    /// Controller settings.
    pub controller: ControllerConfig,
    /// Simulation settings (ignored by hardware drivers).
    pub simulation: SimulationConfig,
}

impl TraverseConfig {
    /// Validate all sections.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        self.controller.validate()?;
        self.simulation.validate()
    }

    /// Load from a TOML file and validate.
    pub fn load_validated(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::load(path)?;
        config.validate()?;
        Ok(config)
    }
}

/// Trait for loading configuration from TOML files.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
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

        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

// Blanket implementation: any deserializable struct can be loaded.
impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}
