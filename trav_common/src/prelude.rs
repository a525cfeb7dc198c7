//! Prelude module for common re-exports.
//!
//! ```rust
//! use trav_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{
    ConfigError, ConfigLoader, ControllerConfig, LogLevel, SharedConfig, SimulationConfig,
    TraverseConfig,
};

// ─── Course Constants ───────────────────────────────────────────────
pub use crate::consts::{
    ANGLE_TOLERANCE, DEGREES_PER_TURN, DISTANCE_TOLERANCE, TERMINAL_TURN_COUNT,
};

// ─── Drivers ────────────────────────────────────────────────────────
pub use crate::hal::driver::{DriverFactory, HalError, MotorActuator, RobotDriver, SensorSource};
pub use crate::hal::types::{MotorCommand, MotorPair, SensorReading};
