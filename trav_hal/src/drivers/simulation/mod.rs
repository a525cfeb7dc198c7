//! Simulation driver module.
//!
//! Emulates the course walls and the robot's drive so the controller can be
//! exercised without hardware. A background thread plays the role of the
//! physical world; see [`SimulationDriver`].

mod driver;
mod environment;

pub use driver::{EnvironmentProbe, SimulationDriver};
pub use environment::{SimEnvironment, course_forward_tiles};

use trav_common::hal::driver::RobotDriver;

/// Registry name of the simulation driver.
pub const DRIVER_NAME: &str = "simulation";

/// Factory function to create a simulation driver instance.
pub fn create_driver() -> Box<dyn RobotDriver> {
    Box::new(SimulationDriver::new())
}
