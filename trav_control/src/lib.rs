//! # Traversal Controller Library
//!
//! Navigation brain for the tile-grid traversal course. Each control tick
//! reads the heading and forward distance, then either keeps driving,
//! self-aligns, turns 90° clockwise, or stops for good after the tenth turn.
//!
//! ## Levels
//!
//! 1. **TraversalState**: Driving / SelfAligning / Turning / Stopped
//! 2. **CourseState**: heading zero, tile distance, turn counter
//! 3. **TraversalRunner**: start driver, tick until stopped, shut down
//!
//! Heading comparisons are modular: every difference is wrapped into
//! (-180°, 180°] before it is checked against `ANGLE_TOLERANCE`.

pub mod controller;
pub mod error;
pub mod report;
pub mod runner;
pub mod scorecard;
pub mod state;

pub use crate::controller::{TickOutcome, TraversalController};
pub use crate::error::{Maneuver, TraverseError};
pub use crate::report::{
    JsonLinesReporter, RecordingReporter, Reporter, TracingReporter, TraversalEvent,
};
pub use crate::runner::{RunStats, TraversalRunner};
pub use crate::scorecard::{Scorecard, verify_completion};
pub use crate::state::course::CourseState;
pub use crate::state::machine::TraversalState;
