//! Traversal Common Library
//!
//! This crate provides shared constants, sensor/motor types, the driver
//! traits and configuration loading for all traversal workspace crates.
//!
//! # Module Structure
//!
//! - [`consts`] - Course geometry and tolerance constants
//! - [`hal`] - Motor/sensor types and the driver traits
//! - [`config`] - Configuration loading traits and types
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use trav_common::prelude::*;
//!
//! assert_eq!(MotorCommand::ForwardFast.magnitude(), 2);
//! assert!(ANGLE_TOLERANCE < DISTANCE_TOLERANCE);
//! ```

pub mod config;
pub mod consts;
pub mod hal;
pub mod prelude;
