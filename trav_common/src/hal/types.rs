//! Motor command and sensor reading types.
//!
//! This module defines the data exchanged with the drive hardware:
//! - `MotorCommand` - Per-wheel speed command from a fixed enumeration
//! - `MotorPair` - Left/right command pair, the controller's per-tick output
//! - `SensorReading` - Heading and the two distance readings

use serde::{Deserialize, Serialize};

/// Per-wheel speed command.
///
/// Discriminants are signed magnitudes: "Fast" is twice "Slow".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i8)]
pub enum MotorCommand {
    /// Full speed backwards.
    ReverseFast = -2,
    /// Half speed backwards.
    ReverseSlow = -1,
    /// Wheel stopped.
    Stop = 0,
    /// Half speed forwards.
    ForwardSlow = 1,
    /// Full speed forwards.
    ForwardFast = 2,
}

impl MotorCommand {
    /// Signed magnitude (-2..=2).
    #[inline]
    pub const fn magnitude(self) -> i8 {
        self as i8
    }

    /// True for `ForwardSlow` and `ForwardFast`.
    #[inline]
    pub const fn is_forward(self) -> bool {
        self.magnitude() > 0
    }
}

impl Default for MotorCommand {
    fn default() -> Self {
        Self::Stop
    }
}

/// Left/right motor command pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MotorPair {
    /// Left wheel command
    pub left: MotorCommand,
    /// Right wheel command
    pub right: MotorCommand,
}

impl MotorPair {
    /// Both wheels stopped.
    pub const STOPPED: Self = Self::new(MotorCommand::Stop, MotorCommand::Stop);

    /// Create a new command pair.
    pub const fn new(left: MotorCommand, right: MotorCommand) -> Self {
        Self { left, right }
    }

    /// True when both wheels are commanded to `Stop`.
    #[inline]
    pub fn is_stopped(&self) -> bool {
        *self == Self::STOPPED
    }

    /// Magnitude of straight forward drive, if both wheels run forward at the same speed.
    pub fn forward_magnitude(&self) -> Option<i8> {
        (self.left == self.right && self.left.is_forward()).then(|| self.left.magnitude())
    }

    /// Signed magnitude of an in-place rotation, if the wheels are opposed at equal speed.
    ///
    /// Positive is clockwise (left wheel forward, heading increases).
    pub fn rotation_magnitude(&self) -> Option<i8> {
        let (l, r) = (self.left.magnitude(), self.right.magnitude());
        (l != 0 && l == -r).then_some(l)
    }
}

/// One sample of the three sensor channels.
///
/// Values are free-running: heading is not wrapped to [0, 360) and distances
/// may go negative. All modular reasoning is the controller's job.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SensorReading {
    /// Heading angle [degrees], unbounded
    pub heading: f64,
    /// Distance to the lateral (left) wall [tile units]
    pub lateral: f64,
    /// Distance to the wall ahead [tile units]
    pub forward: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use MotorCommand::*;

    #[test]
    fn fast_is_twice_slow() {
        assert_eq!(ForwardFast.magnitude(), 2 * ForwardSlow.magnitude());
        assert_eq!(ReverseFast.magnitude(), 2 * ReverseSlow.magnitude());
    }

    #[test]
    fn forward_magnitude_requires_matching_wheels() {
        assert_eq!(MotorPair::new(ForwardFast, ForwardFast).forward_magnitude(), Some(2));
        assert_eq!(MotorPair::new(ForwardSlow, ForwardSlow).forward_magnitude(), Some(1));
        assert_eq!(MotorPair::new(ForwardFast, ForwardSlow).forward_magnitude(), None);
        assert_eq!(MotorPair::new(ReverseFast, ReverseFast).forward_magnitude(), None);
        assert_eq!(MotorPair::STOPPED.forward_magnitude(), None);
    }

    #[test]
    fn rotation_magnitude_sign_follows_left_wheel() {
        assert_eq!(MotorPair::new(ForwardFast, ReverseFast).rotation_magnitude(), Some(2));
        assert_eq!(MotorPair::new(ReverseSlow, ForwardSlow).rotation_magnitude(), Some(-1));
        assert_eq!(MotorPair::new(ForwardFast, ReverseSlow).rotation_magnitude(), None);
        assert_eq!(MotorPair::STOPPED.rotation_magnitude(), None);
    }

    #[test]
    fn default_pair_is_stopped() {
        assert!(MotorPair::default().is_stopped());
    }
}
