//! Driver implementations.
//!
//! - [`simulation`] - Simulated course for development and testing
//!
//! # Adding New Drivers
//!
//! 1. Create a new submodule under `drivers/`
//! 2. Implement the `RobotDriver` trait from `trav_common::hal::driver`
//! 3. Register the driver in [`register_all_drivers`]

pub mod simulation;

use crate::driver_registry::DriverRegistry;

/// Register all built-in drivers.
pub fn register_all_drivers(registry: &mut DriverRegistry) {
    registry.register(simulation::DRIVER_NAME, simulation::create_driver);
}
