//! Simulated course environment.
//!
//! `SimEnvironment` holds the sensor values the physical course would
//! report and reacts to the last motor command pair:
//! - Straight forward drive shortens the forward distance
//! - Opposed wheels rotate the heading (clockwise when the left wheel leads)
//! - A completed turn snaps both distances to the next tile boundary
//!
//! Motion on a channel is held until the controller has sampled that
//! channel since the previous step, so two consecutive samples never differ
//! by more than one step however slowly the controller polls.

use trav_common::config::SimulationConfig;
use trav_common::consts::{LATERAL_STEP_TURNS, SNAP_DECIMALS};
use trav_common::hal::types::{MotorPair, SensorReading};
use tracing::{debug, trace};

/// Forward wall distance after turn `turn_index`, in tiles.
///
/// The course spirals inwards: the first lap runs along the outer wall,
/// each following lap is one tile shorter.
pub fn course_forward_tiles(turn_index: u32) -> f64 {
    match turn_index {
        0..=3 => 5.5,
        4..=7 => 4.5,
        _ => 3.5,
    }
}

/// Round to `decimals` decimal places.
fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

/// Sensor and motor state of the simulated course.
///
/// Shared between the controller-facing driver and the environment thread
/// behind a single mutex.
#[derive(Debug, Clone)]
pub struct SimEnvironment {
    /// Current sensor values
    reading: SensorReading,
    /// Last commanded wheel speeds
    motors: MotorPair,
    /// Spacing between turn points
    tile_distance: f64,
    /// Forward-distance change per tick at fast speed
    forward_step_fast: f64,
    /// Heading change per tick at fast rotation
    rotation_step_fast: f64,
    /// Environment ticks applied so far
    ticks: u64,
    /// Ticks that skipped motion because the last step was not yet sampled
    held_ticks: u64,
    /// Heading sampled since the last rotation step
    heading_observed: bool,
    /// Forward distance sampled since the last drive step
    forward_observed: bool,
}

impl SimEnvironment {
    /// Create a new environment at the configured start position.
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            reading: config.initial_reading(),
            motors: MotorPair::STOPPED,
            tile_distance: config.tile_distance,
            forward_step_fast: config.forward_step_fast,
            rotation_step_fast: config.rotation_step_fast,
            ticks: 0,
            held_ticks: 0,
            heading_observed: false,
            forward_observed: false,
        }
    }

    /// Current sensor values, without counting as a controller sample.
    #[inline]
    pub fn reading(&self) -> SensorReading {
        self.reading
    }

    /// Heading as sampled by the controller; releases the next rotation step.
    pub fn sample_heading(&mut self) -> f64 {
        self.heading_observed = true;
        self.reading.heading
    }

    /// Forward distance as sampled by the controller; releases the next drive step.
    pub fn sample_forward(&mut self) -> f64 {
        self.forward_observed = true;
        self.reading.forward
    }

    /// All channels as sampled by the controller.
    pub fn sample_all(&mut self) -> SensorReading {
        self.heading_observed = true;
        self.forward_observed = true;
        self.reading
    }

    /// Last commanded wheel speeds.
    #[inline]
    pub fn motors(&self) -> MotorPair {
        self.motors
    }

    /// Number of ticks applied.
    #[inline]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Ticks on which motion was held back for an unsampled reading.
    #[inline]
    pub fn held_ticks(&self) -> u64 {
        self.held_ticks
    }

    /// Record a new motor command pair.
    pub fn set_motors(&mut self, motors: MotorPair) {
        self.motors = motors;
    }

    /// Overwrite the heading (fault injection / scenario setup).
    pub fn set_heading(&mut self, heading: f64) {
        self.reading.heading = heading;
    }

    /// Advance the environment by one tick.
    ///
    /// Slow commands move half as far as fast ones. Distances are not
    /// clamped: driving past the wall yields negative readings. A channel
    /// whose previous step has not been sampled yet does not move.
    pub fn step(&mut self) {
        self.ticks += 1;

        if let Some(magnitude) = self.motors.forward_magnitude() {
            if !self.forward_observed {
                self.held_ticks += 1;
                return;
            }
            self.reading.forward -= self.forward_step_fast * f64::from(magnitude) / 2.0;
            self.forward_observed = false;
            trace!("forward -> {:.3}", self.reading.forward);
        } else if let Some(magnitude) = self.motors.rotation_magnitude() {
            if !self.heading_observed {
                self.held_ticks += 1;
                return;
            }
            self.reading.heading += self.rotation_step_fast * f64::from(magnitude) / 2.0;
            self.heading_observed = false;
            trace!("heading -> {:.3}", self.reading.heading);
        }
    }

    /// Snap both distances to the course layout after turn `turn_index` (0-based).
    pub fn snap_to_turn(&mut self, turn_index: u32) {
        if LATERAL_STEP_TURNS.contains(&turn_index) {
            self.reading.lateral += self.tile_distance;
        }
        self.reading.lateral = round_to(self.reading.lateral, SNAP_DECIMALS);
        self.reading.forward = round_to(
            course_forward_tiles(turn_index) * self.tile_distance,
            SNAP_DECIMALS,
        );

        debug!(
            "Turn {} snapped: lateral={:.2}, forward={:.2}",
            turn_index, self.reading.lateral, self.reading.forward
        );
    }
}
