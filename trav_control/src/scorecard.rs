//! Pass/fail bookkeeping for end-of-run checks.
//!
//! A check is a label plus a closure returning `bool`. Sections group
//! checks under a common label prefix and may nest.

use crate::state::course::CourseState;
use tracing::{info, warn};
use trav_common::consts::{DISTANCE_TOLERANCE, TERMINAL_TURN_COUNT};
use trav_common::hal::types::{MotorPair, SensorReading};

/// Outcome of one check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    /// Full label including section prefixes.
    pub label: String,
    /// Whether the check held.
    pub passed: bool,
}

/// Aggregated check results.
#[derive(Debug, Default)]
pub struct Scorecard {
    prefix: Vec<String>,
    results: Vec<CheckResult>,
}

impl Scorecard {
    /// Create an empty scorecard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `check` and record its outcome under `label`.
    pub fn check(&mut self, label: &str, check: impl FnOnce() -> bool) -> bool {
        let passed = check();
        let label = self.qualified(label);
        if passed {
            info!("{}: SUCCESS", label);
        } else {
            warn!("{}: FAIL", label);
        }
        self.results.push(CheckResult { label, passed });
        passed
    }

    /// Run `body` with `label` prepended to every check it records.
    pub fn section(&mut self, label: &str, body: impl FnOnce(&mut Self)) {
        self.prefix.push(label.to_string());
        body(self);
        self.prefix.pop();
    }

    /// Number of passed checks.
    pub fn passed(&self) -> usize {
        self.results.iter().filter(|r| r.passed).count()
    }

    /// Number of failed checks.
    pub fn failed(&self) -> usize {
        self.results.len() - self.passed()
    }

    /// True if every recorded check passed.
    pub fn all_passed(&self) -> bool {
        self.failed() == 0
    }

    /// All results in recording order.
    pub fn results(&self) -> &[CheckResult] {
        &self.results
    }

    fn qualified(&self, label: &str) -> String {
        if self.prefix.is_empty() {
            label.to_string()
        } else {
            format!("{} / {}", self.prefix.join(" / "), label)
        }
    }
}

/// End-of-course checks: turn count, final position and, when the backend
/// exposes them, stopped motors.
///
/// The course ends two and a half tiles from both walls.
pub fn verify_completion(
    card: &mut Scorecard,
    course: &CourseState,
    reading: &SensorReading,
    motors: Option<MotorPair>,
) {
    let goal = course.tile_distance() * 2.5;
    card.section("course", |card| {
        card.check("turn count", || course.turn_count() == TERMINAL_TURN_COUNT);
        card.section("final position", |card| {
            card.check("forward distance", || {
                (reading.forward - goal).abs() <= DISTANCE_TOLERANCE
            });
            card.check("lateral distance", || {
                (reading.lateral - goal).abs() <= DISTANCE_TOLERANCE
            });
        });
        if let Some(motors) = motors {
            card.check("motors stopped", || motors.is_stopped());
        }
    });
}
