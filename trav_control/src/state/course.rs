//! Course progress and heading arithmetic.
//!
//! `CourseState` is the only memory carried from one control tick to the
//! next. Headings are free-running (the sensor never wraps), so every
//! comparison goes through [`wrap_degrees`].

use trav_common::consts::{DEGREES_PER_TURN, DISTANCE_TOLERANCE, TERMINAL_TURN_COUNT};

/// Wrap an angle into (-180, 180].
#[inline]
pub fn wrap_degrees(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(360.0);
    if wrapped > 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

/// Course progress captured at setup and advanced by the controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CourseState {
    /// Heading reading treated as logical 0°.
    heading_zero: f64,
    /// Spacing between turn points.
    tile_distance: f64,
    /// Completed turns (0..=TERMINAL_TURN_COUNT).
    turn_count: u32,
}

impl CourseState {
    /// Fresh course state at the start tile.
    pub const fn new(heading_zero: f64, tile_distance: f64) -> Self {
        Self {
            heading_zero,
            tile_distance,
            turn_count: 0,
        }
    }

    /// Course state resumed at a given turn count (clamped to the terminal count).
    pub fn at_turn(heading_zero: f64, tile_distance: f64, turn_count: u32) -> Self {
        Self {
            heading_zero,
            tile_distance,
            turn_count: turn_count.min(TERMINAL_TURN_COUNT),
        }
    }

    /// Derive the course from the first sensor sample.
    ///
    /// The robot starts centred in its tile, so the lateral wall is half a
    /// tile away.
    pub fn from_initial_reading(heading: f64, lateral: f64) -> Self {
        Self::new(heading, 2.0 * lateral)
    }

    #[inline]
    pub const fn heading_zero(&self) -> f64 {
        self.heading_zero
    }

    #[inline]
    pub const fn tile_distance(&self) -> f64 {
        self.tile_distance
    }

    #[inline]
    pub const fn turn_count(&self) -> u32 {
        self.turn_count
    }

    /// True once the final turn point has been reached.
    #[inline]
    pub const fn is_complete(&self) -> bool {
        self.turn_count >= TERMINAL_TURN_COUNT
    }

    /// Expected heading relative to heading zero: `(turn_count * 90) mod 360`.
    pub fn expected_heading_offset(&self) -> f64 {
        f64::from((self.turn_count * DEGREES_PER_TURN) % 360)
    }

    /// Heading offset a turn from the current count must reach.
    pub fn turn_target_offset(&self) -> f64 {
        self.expected_heading_offset() + f64::from(DEGREES_PER_TURN)
    }

    /// Signed deviation of `heading` from `heading_zero + offset`, in (-180, 180].
    ///
    /// Positive means the robot is clockwise of the target.
    pub fn heading_deviation(&self, heading: f64, offset: f64) -> f64 {
        wrap_degrees(heading - self.heading_zero - offset)
    }

    /// Absolute heading error against the expected heading for this turn count.
    pub fn heading_error(&self, heading: f64) -> f64 {
        self.heading_deviation(heading, self.expected_heading_offset())
            .abs()
    }

    /// Forward distance at which the next turn is due:
    /// `tile * floor((turn_count + 1) / 4) + tile / 2`.
    pub fn expected_forward(&self) -> f64 {
        let laps = (self.turn_count + 1) / 4;
        self.tile_distance * f64::from(laps) + self.tile_distance / 2.0
    }

    /// True when `forward` is within tolerance of the turn point.
    pub fn at_turn_point(&self, forward: f64) -> bool {
        (forward - self.expected_forward()).abs() <= DISTANCE_TOLERANCE
    }

    /// Count one completed turn.
    pub(crate) fn advance_turn(&mut self) {
        debug_assert!(self.turn_count < TERMINAL_TURN_COUNT);
        self.turn_count += 1;
    }
}
