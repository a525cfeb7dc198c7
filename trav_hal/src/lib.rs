//! # Traversal HAL Library
//!
//! Driver layer for the traversal controller.
//!
//! Drivers implement the `RobotDriver` trait defined in
//! `trav_common::hal::driver`. The controller never knows which backend it
//! is talking to: the simulation and a hardware driver are interchangeable.
//!
//! # Module Structure
//!
//! - [`driver_registry`] - Driver factory registration
//! - [`drivers`] - Driver implementations (currently `simulation`)
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                     trav_hal                               │
//! │  ┌──────────────────┐        ┌──────────────────────────┐  │
//! │  │ DriverRegistry   │──────► │ SimulationDriver         │  │
//! │  │ name → factory   │        │  SensorSource/MotorAct.  │  │
//! │  └──────────────────┘        └───────────┬──────────────┘  │
//! │                                          │ Arc<Mutex<..>>  │
//! │                              ┌───────────▼──────────────┐  │
//! │                              │ SimEnvironment (thread)  │  │
//! │                              └──────────────────────────┘  │
//! └────────────────────────────────────────────────────────────┘
//! ```

#![deny(missing_docs)]

pub mod driver_registry;
pub mod drivers;

pub use crate::driver_registry::DriverRegistry;
pub use crate::drivers::register_all_drivers;
pub use crate::drivers::simulation::{EnvironmentProbe, SimEnvironment, SimulationDriver};
