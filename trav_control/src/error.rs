//! Traversal error types.
//!
//! The decision logic itself never fails: sensor values are trusted as
//! reported. Errors come from the driver, from an interrupted run, or from
//! a poll loop exceeding its optional time budget.

use std::fmt;
use std::time::Duration;
use thiserror::Error;
use trav_common::hal::driver::HalError;

/// Phase bounded by `controller.poll_timeout_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Maneuver {
    /// Driving one leg towards the next turn point.
    Approach,
    /// Low-speed heading correction.
    SelfAlign,
    /// 90° clockwise turn.
    Turn,
}

impl fmt::Display for Maneuver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Approach => f.write_str("approach"),
            Self::SelfAlign => f.write_str("self-align"),
            Self::Turn => f.write_str("turn"),
        }
    }
}

/// Errors surfaced by the traversal controller and runner.
#[derive(Debug, Error)]
pub enum TraverseError {
    /// Driver failure.
    #[error("driver error: {0}")]
    Hal(#[from] HalError),

    /// A poll or a leg did not finish within `controller.poll_timeout_ms`.
    #[error("{maneuver} stalled: heading did not converge within {waited:?} ({samples} samples)")]
    StallTimeout {
        /// Maneuver that stalled.
        maneuver: Maneuver,
        /// Time spent polling.
        waited: Duration,
        /// Heading samples taken.
        samples: u64,
    },

    /// The running flag was cleared (e.g. Ctrl-C).
    #[error("traversal interrupted")]
    Interrupted,

    /// A maneuver was requested from a state that does not allow it.
    #[error("invalid transition: {0}")]
    InvalidTransition(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stall_timeout_display_names_maneuver() {
        let err = TraverseError::StallTimeout {
            maneuver: Maneuver::Turn,
            waited: Duration::from_millis(5),
            samples: 42,
        };
        let msg = err.to_string();
        assert!(msg.starts_with("turn stalled"));
        assert!(msg.contains("42 samples"));
    }

    #[test]
    fn approach_stall_display() {
        let err = TraverseError::StallTimeout {
            maneuver: Maneuver::Approach,
            waited: Duration::from_millis(5),
            samples: 7,
        };
        assert!(err.to_string().starts_with("approach stalled"));
    }

    #[test]
    fn hal_error_converts() {
        let err: TraverseError = HalError::DriverNotFound("lidar".to_string()).into();
        assert!(matches!(err, TraverseError::Hal(HalError::DriverNotFound(_))));
    }
}
