//! Hardware abstraction types and driver traits.
//!
//! - [`types`] - `MotorCommand`, `MotorPair`, `SensorReading`
//! - [`driver`] - `SensorSource`, `MotorActuator`, `RobotDriver`, `HalError`

pub mod driver;
pub mod types;
