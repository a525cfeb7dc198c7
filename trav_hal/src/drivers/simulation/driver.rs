//! Simulation driver implementation.
//!
//! The `SimulationDriver` implements `RobotDriver` on top of a
//! [`SimEnvironment`] that a background thread advances on a fixed tick.
//! The controller's poll loops spin on the sensor accessors; the
//! environment must therefore live on its own thread, otherwise no poll
//! could ever observe its exit condition.
//!
//! All sensor and motor values live in one `parking_lot::Mutex`, so every
//! motor write is visible to the next environment tick and every
//! environment update is visible to the next sensor read. Heading and
//! forward reads also release the next step on that channel: the
//! environment never moves further than one step between two samples.

use super::environment::SimEnvironment;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use trav_common::config::{SimulationConfig, TraverseConfig};
use trav_common::hal::driver::{HalError, MotorActuator, RobotDriver, SensorSource};
use trav_common::hal::types::{MotorCommand, MotorPair, SensorReading};
use tracing::{debug, info, warn};

/// Simulation driver implementing the `RobotDriver` trait.
pub struct SimulationDriver {
    /// Driver name
    name: &'static str,
    /// Driver version
    version: &'static str,
    /// Initialized flag
    initialized: bool,
    /// Shared environment state
    env: Arc<Mutex<SimEnvironment>>,
    /// Environment thread keeps running while set
    running: Arc<AtomicBool>,
    /// Environment thread handle
    worker: Option<JoinHandle<()>>,
    /// Environment tick period
    tick: Duration,
}

impl SimulationDriver {
    /// Create a new, uninitialized simulation driver.
    pub fn new() -> Self {
        let defaults = SimulationConfig::default();
        Self {
            name: super::DRIVER_NAME,
            version: env!("CARGO_PKG_VERSION"),
            initialized: false,
            env: Arc::new(Mutex::new(SimEnvironment::new(&defaults))),
            running: Arc::new(AtomicBool::new(false)),
            worker: None,
            tick: defaults.tick(),
        }
    }

    /// Create and initialize a driver from a simulation config.
    pub fn with_config(config: &SimulationConfig) -> Result<Self, HalError> {
        let mut driver = Self::new();
        driver.configure(config)?;
        Ok(driver)
    }

    /// Handle for observing and manipulating the environment from outside
    /// the controller (tests, harnesses).
    pub fn probe(&self) -> EnvironmentProbe {
        EnvironmentProbe {
            env: Arc::clone(&self.env),
        }
    }

    /// True while the environment thread is alive.
    pub fn is_running(&self) -> bool {
        self.worker.is_some() && self.running.load(Ordering::SeqCst)
    }

    fn configure(&mut self, config: &SimulationConfig) -> Result<(), HalError> {
        config
            .validate()
            .map_err(|e| HalError::ConfigError(e.to_string()))?;

        if self.worker.is_some() {
            return Err(HalError::InitFailed(
                "cannot reconfigure while the environment is running".to_string(),
            ));
        }

        *self.env.lock() = SimEnvironment::new(config);
        self.tick = config.tick();
        self.initialized = true;

        info!(
            "Simulation driver initialized: tile={:.2}, heading={:.2}, tick={}us",
            config.tile_distance,
            config.initial_heading,
            config.tick_us
        );
        Ok(())
    }

    fn stop_worker(&mut self) -> Result<(), HalError> {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.worker.take() {
            handle
                .join()
                .map_err(|_| HalError::ThreadError("environment thread panicked".to_string()))?;
            debug!("Environment thread joined");
        }
        Ok(())
    }
}

impl Default for SimulationDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SimulationDriver {
    fn drop(&mut self) {
        if let Err(e) = self.stop_worker() {
            warn!("Simulation driver dropped with error: {}", e);
        }
    }
}

impl SensorSource for SimulationDriver {
    fn read_heading(&self) -> f64 {
        self.env.lock().sample_heading()
    }

    fn read_lateral_distance(&self) -> f64 {
        self.env.lock().reading().lateral
    }

    fn read_forward_distance(&self) -> f64 {
        self.env.lock().sample_forward()
    }

    fn read_all(&self) -> SensorReading {
        self.env.lock().sample_all()
    }
}

impl MotorActuator for SimulationDriver {
    fn set_speeds(&mut self, left: MotorCommand, right: MotorCommand) {
        self.env.lock().set_motors(MotorPair::new(left, right));
    }

    fn last_command(&self) -> Option<MotorPair> {
        Some(self.env.lock().motors())
    }
}

impl RobotDriver for SimulationDriver {
    fn name(&self) -> &'static str {
        self.name
    }

    fn version(&self) -> &'static str {
        self.version
    }

    fn init(&mut self, config: &TraverseConfig) -> Result<(), HalError> {
        self.configure(&config.simulation)
    }

    fn start(&mut self) -> Result<(), HalError> {
        if !self.initialized {
            return Err(HalError::NotInitialized(self.name));
        }
        if self.worker.is_some() {
            debug!("Environment thread already running");
            return Ok(());
        }

        self.running.store(true, Ordering::SeqCst);
        let env = Arc::clone(&self.env);
        let running = Arc::clone(&self.running);
        let tick = self.tick;

        let handle = thread::Builder::new()
            .name("trav-sim-env".to_string())
            .spawn(move || {
                while running.load(Ordering::SeqCst) {
                    env.lock().step();
                    thread::sleep(tick);
                }
                let state = env.lock();
                debug!(
                    "Environment thread exiting after {} ticks ({} held for unsampled readings)",
                    state.ticks(),
                    state.held_ticks()
                );
            })
            .map_err(|e| HalError::ThreadError(e.to_string()))?;

        self.worker = Some(handle);
        info!("Environment thread started (tick={:?})", tick);
        Ok(())
    }

    fn on_turn_completed(&mut self, turn_index: u32) {
        let reading = {
            let mut env = self.env.lock();
            env.snap_to_turn(turn_index);
            env.reading()
        };
        info!(
            "Simulated turn {} complete: lateral={:.2}, forward={:.2}",
            turn_index, reading.lateral, reading.forward
        );
    }

    fn shutdown(&mut self) -> Result<(), HalError> {
        info!("Shutting down simulation driver");
        self.stop_worker()
    }
}

/// Shared handle onto a simulation driver's environment.
///
/// Cloning is cheap; all clones see the same state.
#[derive(Clone)]
pub struct EnvironmentProbe {
    env: Arc<Mutex<SimEnvironment>>,
}

impl EnvironmentProbe {
    /// Current sensor values.
    pub fn reading(&self) -> SensorReading {
        self.env.lock().reading()
    }

    /// Last commanded wheel speeds.
    pub fn motors(&self) -> MotorPair {
        self.env.lock().motors()
    }

    /// Environment ticks applied so far.
    pub fn ticks(&self) -> u64 {
        self.env.lock().ticks()
    }

    /// Overwrite the heading.
    pub fn set_heading(&self, heading: f64) {
        self.env.lock().set_heading(heading);
    }

    /// Ticks on which motion waited for the controller to sample.
    pub fn held_ticks(&self) -> u64 {
        self.env.lock().held_ticks()
    }
}
