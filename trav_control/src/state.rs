//! Controller state.
//!
//! - [`machine`] - `TraversalState` transitions (Driving / SelfAligning / Turning / Stopped)
//! - [`course`] - `CourseState`: heading zero, tile distance, turn counter and
//!   the modular heading arithmetic built on them

pub mod course;
pub mod machine;
