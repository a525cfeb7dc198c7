//! Driver traits and error types.
//!
//! This module defines:
//! - `SensorSource` trait - Heading and distance readings
//! - `MotorActuator` trait - Left/right speed commands
//! - `RobotDriver` trait - Pluggable backend combining both (simulation, hardware)
//! - `HalError` enum - Error types for driver operations
//! - `DriverFactory` type alias - Factory function type

use crate::config::TraverseConfig;
use crate::hal::types::{MotorCommand, MotorPair, SensorReading};
use thiserror::Error;

/// Error types for driver operations.
#[derive(Debug, Clone, Error)]
pub enum HalError {
    /// Driver initialization failed
    #[error("Initialization failed: {0}")]
    InitFailed(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Driver not found
    #[error("Driver not found: {0}")]
    DriverNotFound(String),

    /// Operation requires an initialized driver
    #[error("Driver not initialized: {0}")]
    NotInitialized(&'static str),

    /// Background worker could not be spawned or joined
    #[error("Worker thread error: {0}")]
    ThreadError(String),
}

/// Factory function type for creating driver instances.
pub type DriverFactory = fn() -> Box<dyn RobotDriver>;

/// Read access to the robot's sensors.
///
/// Every call samples the source again; implementations must not cache.
pub trait SensorSource {
    /// Current heading [degrees]. Unbounded, not wrapped.
    fn read_heading(&self) -> f64;

    /// Distance to the lateral wall [tile units].
    fn read_lateral_distance(&self) -> f64;

    /// Distance to the wall ahead [tile units].
    fn read_forward_distance(&self) -> f64;

    /// Whether the robot is about to reach a drop.
    ///
    /// Extension point for a future drop sensor. Default: never.
    fn approaching_drop(&self) -> bool {
        false
    }

    /// Sample all three channels.
    fn read_all(&self) -> SensorReading {
        SensorReading {
            heading: self.read_heading(),
            lateral: self.read_lateral_distance(),
            forward: self.read_forward_distance(),
        }
    }
}

/// Write access to the two drive motors.
pub trait MotorActuator {
    /// Command both wheels at once.
    fn set_speeds(&mut self, left: MotorCommand, right: MotorCommand);

    /// Last pair passed to `set_speeds`, if the backend can report it.
    ///
    /// Default: `None` (write-only motors).
    fn last_command(&self) -> Option<MotorPair> {
        None
    }
}

/// Trait defining the interface for robot drivers.
///
/// The traversal controller drives the robot exclusively through this trait,
/// so a simulation backend and a hardware backend are interchangeable.
///
/// # Lifecycle
///
/// 1. `init()` - Called once before setup
/// 2. `start()` - Called when the control loop begins
/// 3. sensor reads / `set_speeds()` / `on_turn_completed()` - During the loop
/// 4. `shutdown()` - Called when the controller stops
pub trait RobotDriver: SensorSource + MotorActuator + Send {
    /// Returns the driver's unique identifier (e.g., "simulation").
    fn name(&self) -> &'static str;

    /// Returns the driver's semantic version.
    fn version(&self) -> &'static str;

    /// Initialize the driver with the traversal configuration.
    ///
    /// # Errors
    /// Return `HalError::InitFailed` or `HalError::ConfigError` if
    /// initialization cannot complete.
    fn init(&mut self, config: &TraverseConfig) -> Result<(), HalError>;

    /// Start any background activity the driver needs.
    ///
    /// Default: no-op (hardware is always "running").
    fn start(&mut self) -> Result<(), HalError> {
        Ok(())
    }

    /// Notification that the controller completed turn `turn_index` (0-based).
    ///
    /// Default: no-op. The simulation uses it to snap readings to the course layout.
    fn on_turn_completed(&mut self, _turn_index: u32) {}

    /// Stop background activity and release resources.
    fn shutdown(&mut self) -> Result<(), HalError>;
}
