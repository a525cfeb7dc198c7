//! Run loop driving a [`TraversalController`] to completion.
//!
//! Starts the driver, ticks the controller until it reports
//! [`TickOutcome::Stopped`], then shuts the driver down. The driver is shut
//! down on every exit path, including errors and interrupts.

use crate::controller::{TickOutcome, TraversalController};
use crate::error::TraverseError;
use crate::report::Reporter;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use trav_common::config::TraverseConfig;
use trav_common::hal::driver::RobotDriver;

/// Statistics for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunStats {
    /// Control ticks executed.
    pub ticks: u64,
    /// Ticks that ended in a self-align.
    pub alignments: u64,
    /// Turns completed during this run.
    pub turns: u32,
    /// Longest single tick (turns dominate).
    pub max_tick: Duration,
    /// Wall time from start to stop.
    pub elapsed: Duration,
}

/// Owns a controller and runs it until the course is complete.
pub struct TraversalRunner {
    controller: TraversalController,
    tick_log_interval: u64,
    stats: RunStats,
}

impl TraversalRunner {
    /// Initialize `driver` from `config` and set up the controller on it.
    pub fn new(
        mut driver: Box<dyn RobotDriver>,
        reporter: Arc<dyn Reporter>,
        config: &TraverseConfig,
    ) -> Result<Self, TraverseError> {
        driver.init(config)?;
        info!("Driver '{}' v{} initialized", driver.name(), driver.version());

        let controller = TraversalController::setup(driver, reporter, &config.controller);
        Ok(Self::from_controller(
            controller,
            config.controller.tick_log_interval,
        ))
    }

    /// Wrap an already set up controller.
    pub fn from_controller(controller: TraversalController, tick_log_interval: u64) -> Self {
        Self {
            controller,
            tick_log_interval,
            stats: RunStats::default(),
        }
    }

    /// Flag that keeps the run going; clear it to interrupt.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        self.controller.running_flag()
    }

    /// The wrapped controller.
    pub fn controller(&self) -> &TraversalController {
        &self.controller
    }

    /// Statistics so far.
    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    /// Give back the controller.
    pub fn into_controller(self) -> TraversalController {
        self.controller
    }

    /// Start the driver and tick until the course is complete.
    ///
    /// On error the motors are stopped before the driver is shut down.
    pub fn run(&mut self) -> Result<RunStats, TraverseError> {
        self.controller.driver_mut().start()?;
        info!(
            "Traversal started (turn_count={})",
            self.controller.course().turn_count()
        );

        let started = Instant::now();
        let result = self.tick_until_stopped();
        self.stats.elapsed = started.elapsed();

        if result.is_err() {
            self.controller.halt();
        }

        let shutdown = self.controller.driver_mut().shutdown();
        match (result, shutdown) {
            (Ok(()), Ok(())) => {
                info!(
                    "Traversal finished: {} ticks, {} alignments, {} turns in {:?}",
                    self.stats.ticks, self.stats.alignments, self.stats.turns, self.stats.elapsed
                );
                Ok(self.stats)
            }
            (Ok(()), Err(e)) => Err(e.into()),
            (Err(e), shutdown) => {
                if let Err(shutdown_err) = shutdown {
                    warn!("Driver shutdown failed after error: {}", shutdown_err);
                }
                Err(e)
            }
        }
    }

    fn tick_until_stopped(&mut self) -> Result<(), TraverseError> {
        let running = self.controller.running_flag();

        loop {
            if !running.load(Ordering::SeqCst) {
                info!("Traversal interrupted after {} ticks", self.stats.ticks);
                return Err(TraverseError::Interrupted);
            }

            let tick_start = Instant::now();
            let outcome = self.controller.tick()?;
            let tick_time = tick_start.elapsed();

            self.stats.ticks += 1;
            if tick_time > self.stats.max_tick {
                self.stats.max_tick = tick_time;
            }
            match outcome {
                TickOutcome::Aligned => self.stats.alignments += 1,
                TickOutcome::Turned { .. } => self.stats.turns += 1,
                TickOutcome::Stopped => return Ok(()),
                TickOutcome::Driving => {}
            }

            if self.tick_log_interval > 0 && self.stats.ticks % self.tick_log_interval == 0 {
                debug!(
                    "Tick {}: state={}, turn_count={}, forward={:.2}",
                    self.stats.ticks,
                    self.controller.state(),
                    self.controller.course().turn_count(),
                    self.controller.driver().read_forward_distance()
                );
            }

            thread::yield_now();
        }
    }
}
