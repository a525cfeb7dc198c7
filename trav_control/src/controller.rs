//! Traversal controller.
//!
//! One [`tick`](TraversalController::tick) is one control cycle:
//!
//! 1. Command forward drive (slow when a drop is ahead).
//! 2. Heading off by more than `ANGLE_TOLERANCE` → self-align, end of tick.
//! 3. Forward distance not within `DISTANCE_TOLERANCE` of the turn point → keep driving.
//! 4. At the turn point: stop if the course is complete, otherwise turn.
//!
//! Self-align and turn block while they busy-poll the heading sensor. The
//! loop re-samples on every iteration and only yields the CPU between
//! samples; progress depends entirely on the sensor source.
//!
//! With `poll_timeout_ms` set, the same budget also bounds each leg between
//! two turns: a forward distance that never enters the turn-point window
//! ends the run with `StallTimeout` instead of driving forever.

use crate::error::{Maneuver, TraverseError};
use crate::report::{Reporter, TraversalEvent};
use crate::state::course::CourseState;
use crate::state::machine::{PhaseEvent, StateMachine, TransitionResult, TraversalState};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace};
use trav_common::config::ControllerConfig;
use trav_common::consts::ANGLE_TOLERANCE;
use trav_common::hal::driver::RobotDriver;
use trav_common::hal::types::MotorCommand::{self, *};

/// Outcome of one control tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Still driving towards the turn point.
    Driving,
    /// Heading was corrected; forward distance not checked this tick.
    Aligned,
    /// Turn `turn_index` (0-based) completed.
    Turned {
        /// Index of the finished turn.
        turn_index: u32,
    },
    /// Course complete, motors stopped.
    Stopped,
}

/// Navigation state machine driving one robot.
pub struct TraversalController {
    /// Sensor/motor backend
    driver: Box<dyn RobotDriver>,
    /// Event sink
    reporter: Arc<dyn Reporter>,
    /// Driving / SelfAligning / Turning / Stopped
    machine: StateMachine,
    /// Heading zero, tile distance, turn count
    course: CourseState,
    /// Optional bound on a single heading poll or leg
    poll_timeout: Option<Duration>,
    /// Start of the current leg
    leg_started: Instant,
    /// Ticks spent in the current leg
    leg_ticks: u64,
    /// Cleared to abort poll loops and the run
    running: Arc<AtomicBool>,
}

impl TraversalController {
    /// Capture heading zero and tile distance from the driver's current readings.
    pub fn setup(
        driver: Box<dyn RobotDriver>,
        reporter: Arc<dyn Reporter>,
        config: &ControllerConfig,
    ) -> Self {
        let course = CourseState::from_initial_reading(
            driver.read_heading(),
            driver.read_lateral_distance(),
        );
        Self::with_course(driver, reporter, config, course)
    }

    /// Build a controller around an existing course state.
    pub fn with_course(
        driver: Box<dyn RobotDriver>,
        reporter: Arc<dyn Reporter>,
        config: &ControllerConfig,
        course: CourseState,
    ) -> Self {
        reporter.report(&TraversalEvent::SetupComplete {
            heading_zero: course.heading_zero(),
            tile_distance: course.tile_distance(),
        });
        info!(
            "Controller ready on '{}' v{}: heading_zero={:.3}, tile_distance={:.3}, turn_count={}",
            driver.name(),
            driver.version(),
            course.heading_zero(),
            course.tile_distance(),
            course.turn_count()
        );

        Self {
            driver,
            reporter,
            machine: StateMachine::new(),
            course,
            poll_timeout: config.poll_timeout(),
            leg_started: Instant::now(),
            leg_ticks: 0,
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Current controller state.
    #[inline]
    pub fn state(&self) -> TraversalState {
        self.machine.state()
    }

    /// Course progress.
    #[inline]
    pub fn course(&self) -> &CourseState {
        &self.course
    }

    /// The driver backend.
    pub fn driver(&self) -> &dyn RobotDriver {
        self.driver.as_ref()
    }

    /// The driver backend, mutably.
    pub fn driver_mut(&mut self) -> &mut dyn RobotDriver {
        self.driver.as_mut()
    }

    /// Flag that keeps the controller running; clear it to interrupt.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Run one control cycle.
    pub fn tick(&mut self) -> Result<TickOutcome, TraverseError> {
        if self.machine.is_stopped() {
            return Ok(TickOutcome::Stopped);
        }

        self.drive_forward();

        let heading = self.driver.read_heading();
        let heading_error = self.course.heading_error(heading);
        if heading_error > ANGLE_TOLERANCE {
            debug!(
                "Heading error {:.3} at {:.3} (turn_count={})",
                heading_error,
                heading,
                self.course.turn_count()
            );
            self.self_align()?;
            return Ok(TickOutcome::Aligned);
        }

        let forward = self.driver.read_forward_distance();
        if !self.course.at_turn_point(forward) {
            self.leg_ticks += 1;
            self.check_leg_budget()?;
            return Ok(TickOutcome::Driving);
        }

        if self.course.is_complete() {
            self.finish()?;
            return Ok(TickOutcome::Stopped);
        }

        let turn_index = self.course.turn_count();
        self.turn()?;
        Ok(TickOutcome::Turned { turn_index })
    }

    /// Rotate back onto the expected heading for the current turn count.
    ///
    /// Rotates towards the nearer side at low speed. Does not rotate at all
    /// when the heading is already within tolerance.
    pub fn self_align(&mut self) -> Result<(), TraverseError> {
        self.transition(PhaseEvent::HeadingDrift)?;

        let target = self.course.expected_heading_offset();
        let deviation = self
            .course
            .heading_deviation(self.driver.read_heading(), target);
        let rotated = deviation.abs() > ANGLE_TOLERANCE;

        let heading = if rotated {
            if deviation > 0.0 {
                // Clockwise of target: rotate counter-clockwise.
                self.driver.set_speeds(ReverseSlow, ForwardSlow);
            } else {
                self.driver.set_speeds(ForwardSlow, ReverseSlow);
            }
            self.poll_heading(Maneuver::SelfAlign, target)?
        } else {
            self.driver.read_heading()
        };

        self.stop_motors();
        self.drive_forward();
        self.transition(PhaseEvent::HeadingRestored)?;

        self.reporter.report(&TraversalEvent::SelfAligned {
            turn_count: self.course.turn_count(),
            heading,
            rotated,
        });
        Ok(())
    }

    /// Execute a 90° clockwise turn and count it.
    pub fn turn(&mut self) -> Result<(), TraverseError> {
        self.transition(PhaseEvent::TurnPointReached)?;
        let turn_index = self.course.turn_count();
        let target = self.course.turn_target_offset();

        self.stop_motors();
        self.driver.set_speeds(ForwardFast, ReverseFast);
        let heading = self.poll_heading(Maneuver::Turn, target)?;

        self.stop_motors();
        self.drive_forward();
        self.driver.on_turn_completed(turn_index);
        self.course.advance_turn();
        self.leg_started = Instant::now();
        self.leg_ticks = 0;
        self.transition(PhaseEvent::TurnComplete)?;

        let reading = self.driver.read_all();
        self.reporter.report(&TraversalEvent::TurnCompleted {
            turn_index,
            heading,
            reading,
        });
        Ok(())
    }

    /// Stop both motors without changing state (used when aborting a run).
    pub fn halt(&mut self) {
        self.stop_motors();
    }

    fn finish(&mut self) -> Result<(), TraverseError> {
        self.stop_motors();
        self.transition(PhaseEvent::CourseComplete)?;
        let reading = self.driver.read_all();
        self.reporter.report(&TraversalEvent::CourseComplete {
            turn_count: self.course.turn_count(),
            reading,
        });
        Ok(())
    }

    fn check_leg_budget(&mut self) -> Result<(), TraverseError> {
        let Some(budget) = self.poll_timeout else {
            return Ok(());
        };
        let waited = self.leg_started.elapsed();
        if waited > budget {
            self.stop_motors();
            return Err(TraverseError::StallTimeout {
                maneuver: Maneuver::Approach,
                waited,
                samples: self.leg_ticks,
            });
        }
        Ok(())
    }

    fn drive_forward(&mut self) {
        let speed: MotorCommand = if self.driver.approaching_drop() {
            ForwardSlow
        } else {
            ForwardFast
        };
        self.driver.set_speeds(speed, speed);
    }

    fn stop_motors(&mut self) {
        self.driver.set_speeds(Stop, Stop);
    }

    /// Busy-poll the heading until it is within tolerance of
    /// `heading_zero + target_offset`. Returns the satisfying sample.
    ///
    /// Motors are stopped before any error is returned.
    fn poll_heading(&mut self, maneuver: Maneuver, target_offset: f64) -> Result<f64, TraverseError> {
        let started = Instant::now();
        let mut samples: u64 = 0;

        loop {
            let heading = self.driver.read_heading();
            samples += 1;

            let error = self.course.heading_deviation(heading, target_offset).abs();
            if error <= ANGLE_TOLERANCE {
                trace!("{} converged at {:.3} after {} samples", maneuver, heading, samples);
                return Ok(heading);
            }

            if !self.running.load(Ordering::Relaxed) {
                self.stop_motors();
                return Err(TraverseError::Interrupted);
            }

            if let Some(budget) = self.poll_timeout {
                let waited = started.elapsed();
                if waited > budget {
                    self.stop_motors();
                    return Err(TraverseError::StallTimeout {
                        maneuver,
                        waited,
                        samples,
                    });
                }
            }

            thread::yield_now();
        }
    }

    fn transition(&mut self, event: PhaseEvent) -> Result<(), TraverseError> {
        let from = self.machine.state();
        match self.machine.handle_event(event) {
            TransitionResult::Ok(to) => {
                self.reporter.report(&TraversalEvent::StateChanged {
                    from,
                    to,
                    turn_count: self.course.turn_count(),
                });
                Ok(())
            }
            TransitionResult::Rejected(reason) => Err(TraverseError::InvalidTransition(reason)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::RecordingReporter;
    use parking_lot::Mutex;
    use std::cell::Cell;
    use trav_common::config::TraverseConfig;
    use trav_common::hal::driver::{HalError, MotorActuator, SensorSource};
    use trav_common::hal::types::MotorPair;

    /// Synchronous kinematic fake: every sensor read advances the robot by
    /// one step according to the last motor command.
    struct StepDriver {
        heading: Cell<f64>,
        lateral: f64,
        forward: Cell<f64>,
        motors: MotorPair,
        frozen: bool,
        drop_ahead: bool,
        log: Arc<Mutex<Vec<MotorPair>>>,
        turns: Arc<Mutex<Vec<u32>>>,
    }

    impl StepDriver {
        fn new(heading: f64, lateral: f64, forward: f64) -> Self {
            Self {
                heading: Cell::new(heading),
                lateral,
                forward: Cell::new(forward),
                motors: MotorPair::STOPPED,
                frozen: false,
                drop_ahead: false,
                log: Arc::new(Mutex::new(Vec::new())),
                turns: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    impl SensorSource for StepDriver {
        fn read_heading(&self) -> f64 {
            if !self.frozen {
                if let Some(m) = self.motors.rotation_magnitude() {
                    self.heading.set(self.heading.get() + 0.025 * f64::from(m));
                }
            }
            self.heading.get()
        }

        fn read_lateral_distance(&self) -> f64 {
            self.lateral
        }

        fn read_forward_distance(&self) -> f64 {
            if !self.frozen {
                if let Some(m) = self.motors.forward_magnitude() {
                    self.forward.set(self.forward.get() - 0.025 * f64::from(m));
                }
            }
            self.forward.get()
        }

        fn approaching_drop(&self) -> bool {
            self.drop_ahead
        }
    }

    impl MotorActuator for StepDriver {
        fn set_speeds(&mut self, left: MotorCommand, right: MotorCommand) {
            self.motors = MotorPair::new(left, right);
            self.log.lock().push(self.motors);
        }
    }

    impl RobotDriver for StepDriver {
        fn name(&self) -> &'static str {
            "step"
        }

        fn version(&self) -> &'static str {
            "0.0.0"
        }

        fn init(&mut self, _config: &TraverseConfig) -> Result<(), HalError> {
            Ok(())
        }

        fn on_turn_completed(&mut self, turn_index: u32) {
            self.turns.lock().push(turn_index);
        }

        fn shutdown(&mut self) -> Result<(), HalError> {
            Ok(())
        }
    }

    fn controller_for(
        driver: StepDriver,
        course: Option<CourseState>,
        config: &ControllerConfig,
    ) -> (TraversalController, Arc<RecordingReporter>) {
        let reporter = Arc::new(RecordingReporter::new());
        let controller = match course {
            Some(course) => {
                TraversalController::with_course(Box::new(driver), reporter.clone(), config, course)
            }
            None => TraversalController::setup(Box::new(driver), reporter.clone(), config),
        };
        (controller, reporter)
    }

    #[test]
    fn setup_derives_course_from_readings() {
        let driver = StepDriver::new(0.1, 6.0, 42.0);
        let (controller, reporter) = controller_for(driver, None, &ControllerConfig::default());
        assert_eq!(controller.course().heading_zero(), 0.1);
        assert_eq!(controller.course().tile_distance(), 12.0);
        assert_eq!(controller.course().turn_count(), 0);
        assert_eq!(controller.state(), TraversalState::Driving);
        assert_eq!(
            reporter.events()[0],
            TraversalEvent::SetupComplete {
                heading_zero: 0.1,
                tile_distance: 12.0
            }
        );
    }

    #[test]
    fn tick_drives_fast_until_turn_point() {
        let driver = StepDriver::new(0.1, 6.0, 42.0);
        let log = driver.log.clone();
        let (mut controller, _) = controller_for(driver, None, &ControllerConfig::default());

        assert_eq!(controller.tick().unwrap(), TickOutcome::Driving);
        assert_eq!(
            *log.lock(),
            vec![MotorPair::new(ForwardFast, ForwardFast)]
        );
    }

    #[test]
    fn tick_drives_slow_when_drop_ahead() {
        let mut driver = StepDriver::new(0.1, 6.0, 42.0);
        driver.drop_ahead = true;
        let log = driver.log.clone();
        let (mut controller, _) = controller_for(driver, None, &ControllerConfig::default());

        controller.tick().unwrap();
        assert_eq!(
            log.lock().last().copied(),
            Some(MotorPair::new(ForwardSlow, ForwardSlow))
        );
    }

    #[test]
    fn heading_drift_triggers_self_align_and_skips_distance_check() {
        // Already at the turn point, but the heading is off: alignment wins.
        let driver = StepDriver::new(1.0, 6.0, 6.0);
        let turns = driver.turns.clone();
        let course = CourseState::new(0.1, 12.0);
        let (mut controller, reporter) =
            controller_for(driver, Some(course), &ControllerConfig::default());

        assert_eq!(controller.tick().unwrap(), TickOutcome::Aligned);
        assert_eq!(controller.state(), TraversalState::Driving);
        assert_eq!(controller.course().turn_count(), 0);
        assert!(turns.lock().is_empty());

        let heading = controller.driver().read_heading();
        assert!(controller.course().heading_error(heading) <= ANGLE_TOLERANCE);
        assert_eq!(reporter.alignments(), 1);
    }

    #[test]
    fn self_align_rotates_towards_nearer_side() {
        // Counter-clockwise of target: expect the clockwise command (left forward).
        let driver = StepDriver::new(89.0, 6.0, 42.0);
        let log = driver.log.clone();
        let course = CourseState::at_turn(0.1, 12.0, 1);
        let (mut controller, _) = controller_for(driver, Some(course), &ControllerConfig::default());

        controller.self_align().unwrap();
        assert!(log.lock().contains(&MotorPair::new(ForwardSlow, ReverseSlow)));
        assert!(!log.lock().contains(&MotorPair::new(ReverseSlow, ForwardSlow)));

        let heading = controller.driver().read_heading();
        assert!((heading - 90.1).abs() <= ANGLE_TOLERANCE);
    }

    #[test]
    fn self_align_across_wraparound_takes_short_way() {
        // Expected 0.1 (turn 4), robot at 359.0: one degree counter-clockwise.
        let driver = StepDriver::new(359.0, 6.0, 42.0);
        let log = driver.log.clone();
        let course = CourseState::at_turn(0.1, 12.0, 4);
        let (mut controller, _) = controller_for(driver, Some(course), &ControllerConfig::default());

        controller.self_align().unwrap();
        assert!(log.lock().contains(&MotorPair::new(ForwardSlow, ReverseSlow)));
        let heading = controller.driver().read_heading();
        assert!((heading - 360.1).abs() <= ANGLE_TOLERANCE);
    }

    #[test]
    fn self_align_within_tolerance_does_not_rotate() {
        let driver = StepDriver::new(90.12, 6.0, 42.0);
        let log = driver.log.clone();
        let course = CourseState::at_turn(0.1, 12.0, 1);
        let (mut controller, reporter) =
            controller_for(driver, Some(course), &ControllerConfig::default());

        controller.self_align().unwrap();
        assert!(log.lock().iter().all(|m| m.rotation_magnitude().is_none()));
        assert_eq!(controller.driver().read_heading(), 90.12);
        assert!(matches!(
            reporter.events().last(),
            Some(TraversalEvent::SelfAligned { rotated: false, .. })
        ));
    }

    #[test]
    fn turn_advances_count_and_notifies_driver() {
        let driver = StepDriver::new(0.1, 6.0, 6.0);
        let turns = driver.turns.clone();
        let log = driver.log.clone();
        let (mut controller, reporter) = controller_for(driver, None, &ControllerConfig::default());

        assert_eq!(controller.tick().unwrap(), TickOutcome::Turned { turn_index: 0 });
        assert_eq!(controller.course().turn_count(), 1);
        assert_eq!(controller.state(), TraversalState::Driving);
        assert_eq!(*turns.lock(), vec![0]);
        assert!(log.lock().contains(&MotorPair::new(ForwardFast, ReverseFast)));
        assert_eq!(
            log.lock().last().copied(),
            Some(MotorPair::new(ForwardFast, ForwardFast))
        );

        let recorded = reporter.turns();
        assert_eq!(recorded.len(), 1);
        let (index, heading, _) = recorded[0];
        assert_eq!(index, 0);
        assert!((heading - 90.1).abs() <= ANGLE_TOLERANCE);
    }

    #[test]
    fn terminal_turn_point_stops_for_good() {
        let driver = StepDriver::new(180.1, 30.0, 30.0);
        let log = driver.log.clone();
        let course = CourseState::at_turn(0.1, 12.0, 10);
        let (mut controller, reporter) =
            controller_for(driver, Some(course), &ControllerConfig::default());

        assert_eq!(controller.tick().unwrap(), TickOutcome::Stopped);
        assert_eq!(controller.state(), TraversalState::Stopped);
        assert_eq!(log.lock().last().copied(), Some(MotorPair::STOPPED));

        let commands = log.lock().len();
        assert_eq!(controller.tick().unwrap(), TickOutcome::Stopped);
        assert_eq!(log.lock().len(), commands, "no commands after stop");
        assert!(matches!(
            reporter.events().last(),
            Some(TraversalEvent::CourseComplete { turn_count: 10, .. })
        ));
    }

    #[test]
    fn stalled_turn_times_out_with_motors_stopped() {
        let mut driver = StepDriver::new(0.1, 6.0, 6.0);
        driver.frozen = true;
        let log = driver.log.clone();
        let config = ControllerConfig {
            poll_timeout_ms: Some(20),
            ..Default::default()
        };
        let (mut controller, _) = controller_for(driver, None, &config);

        let err = controller.tick().unwrap_err();
        assert!(matches!(
            err,
            TraverseError::StallTimeout {
                maneuver: Maneuver::Turn,
                ..
            }
        ));
        assert_eq!(log.lock().last().copied(), Some(MotorPair::STOPPED));
        assert_eq!(controller.course().turn_count(), 0);
        assert_eq!(controller.state(), TraversalState::Turning);
    }

    #[test]
    fn leg_that_never_reaches_turn_point_times_out() {
        let mut driver = StepDriver::new(0.1, 6.0, 42.0);
        driver.frozen = true;
        let log = driver.log.clone();
        let config = ControllerConfig {
            poll_timeout_ms: Some(20),
            ..Default::default()
        };
        let (mut controller, _) = controller_for(driver, None, &config);

        let deadline = Instant::now() + Duration::from_secs(5);
        let err = loop {
            match controller.tick() {
                Ok(TickOutcome::Driving) => assert!(Instant::now() < deadline),
                Ok(other) => panic!("unexpected outcome {other:?}"),
                Err(e) => break e,
            }
        };
        match err {
            TraverseError::StallTimeout {
                maneuver, samples, ..
            } => {
                assert_eq!(maneuver, Maneuver::Approach);
                assert!(samples > 0);
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(log.lock().last().copied(), Some(MotorPair::STOPPED));
        assert_eq!(controller.state(), TraversalState::Driving);
    }

    #[test]
    fn leg_budget_restarts_after_each_turn() {
        // Each forward read moves 0.05: 6.37, 6.32, 6.27, then 6.22 is in the window.
        let driver = StepDriver::new(0.1, 6.0, 6.42);
        let config = ControllerConfig {
            poll_timeout_ms: Some(5_000),
            ..Default::default()
        };
        let (mut controller, _) = controller_for(driver, None, &config);

        for _ in 0..3 {
            assert_eq!(controller.tick().unwrap(), TickOutcome::Driving);
        }
        assert_eq!(controller.leg_ticks, 3);
        assert_eq!(controller.tick().unwrap(), TickOutcome::Turned { turn_index: 0 });
        assert_eq!(controller.leg_ticks, 0);
    }

    #[test]
    fn cleared_running_flag_interrupts_poll() {
        let mut driver = StepDriver::new(5.0, 6.0, 42.0);
        driver.frozen = true;
        let log = driver.log.clone();
        let course = CourseState::new(0.1, 12.0);
        let (mut controller, _) = controller_for(driver, Some(course), &ControllerConfig::default());

        controller.running_flag().store(false, Ordering::SeqCst);
        assert!(matches!(
            controller.self_align(),
            Err(TraverseError::Interrupted)
        ));
        assert_eq!(log.lock().last().copied(), Some(MotorPair::STOPPED));
    }

    #[test]
    fn maneuvers_rejected_once_stopped() {
        let driver = StepDriver::new(180.1, 30.0, 30.0);
        let course = CourseState::at_turn(0.1, 12.0, 10);
        let (mut controller, _) = controller_for(driver, Some(course), &ControllerConfig::default());
        controller.tick().unwrap();

        assert!(matches!(
            controller.turn(),
            Err(TraverseError::InvalidTransition(_))
        ));
        assert!(matches!(
            controller.self_align(),
            Err(TraverseError::InvalidTransition(_))
        ));
    }
}
