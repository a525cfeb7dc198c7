//! Event reporting.
//!
//! The controller emits a [`TraversalEvent`] for every state transition and
//! completed maneuver. What happens to them is up to the [`Reporter`]:
//! [`TracingReporter`] logs them, [`JsonLinesReporter`] writes one JSON
//! object per line for an external harness, [`RecordingReporter`] keeps
//! them for assertions.

use crate::state::machine::TraversalState;
use parking_lot::Mutex;
use serde::Serialize;
use std::io::Write;
use tracing::{debug, info, warn};
use trav_common::hal::types::SensorReading;

/// Discrete controller event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TraversalEvent {
    /// Heading zero and tile distance captured.
    SetupComplete {
        /// Heading treated as logical 0°.
        heading_zero: f64,
        /// Derived tile spacing.
        tile_distance: f64,
    },
    /// Controller changed state.
    StateChanged {
        /// Previous state.
        from: TraversalState,
        /// New state.
        to: TraversalState,
        /// Turn count at the time of the transition.
        turn_count: u32,
    },
    /// Self-align converged.
    SelfAligned {
        /// Turn count the heading was aligned for.
        turn_count: u32,
        /// Heading sample that satisfied the tolerance.
        heading: f64,
        /// False when the heading was already within tolerance.
        rotated: bool,
    },
    /// Turn finished and counted.
    TurnCompleted {
        /// 0-based index of the finished turn.
        turn_index: u32,
        /// Heading sample that satisfied the tolerance.
        heading: f64,
        /// Sensor values after the turn (post-snap in simulation).
        reading: SensorReading,
    },
    /// Final turn point reached, motors stopped.
    CourseComplete {
        /// Final turn count.
        turn_count: u32,
        /// Sensor values at the stop.
        reading: SensorReading,
    },
}

/// Sink for controller events.
pub trait Reporter: Send + Sync {
    /// Handle one event.
    fn report(&self, event: &TraversalEvent);
}

/// Logs every event through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, event: &TraversalEvent) {
        match event {
            TraversalEvent::SetupComplete {
                heading_zero,
                tile_distance,
            } => info!(
                "Setup complete: heading_zero={:.3}, tile_distance={:.3}",
                heading_zero, tile_distance
            ),
            TraversalEvent::StateChanged {
                from,
                to,
                turn_count,
            } => debug!("State {} -> {} (turn_count={})", from, to, turn_count),
            TraversalEvent::SelfAligned {
                turn_count,
                heading,
                rotated,
            } => debug!(
                "Self-aligned for turn_count={} at heading {:.3} (rotated={})",
                turn_count, heading, rotated
            ),
            TraversalEvent::TurnCompleted {
                turn_index,
                heading,
                reading,
            } => info!(
                "Turn {} complete: heading={:.3}, lateral={:.2}, forward={:.2}",
                turn_index, heading, reading.lateral, reading.forward
            ),
            TraversalEvent::CourseComplete {
                turn_count,
                reading,
            } => info!(
                "Course complete after {} turns: heading={:.3}, lateral={:.2}, forward={:.2}",
                turn_count, reading.heading, reading.lateral, reading.forward
            ),
        }
    }
}

/// Writes each event as a JSON line.
pub struct JsonLinesReporter<W: Write + Send> {
    out: Mutex<W>,
}

impl<W: Write + Send> JsonLinesReporter<W> {
    /// Wrap a writer.
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    /// Recover the writer.
    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }
}

impl<W: Write + Send> Reporter for JsonLinesReporter<W> {
    fn report(&self, event: &TraversalEvent) {
        let mut out = self.out.lock();
        let written = serde_json::to_writer(&mut *out, event)
            .map_err(std::io::Error::from)
            .and_then(|()| out.write_all(b"\n"))
            .and_then(|()| out.flush());
        if let Err(e) = written {
            warn!("Failed to write event: {}", e);
        }
    }
}

/// Stores every event in order.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<TraversalEvent>>,
}

impl RecordingReporter {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all events so far.
    pub fn events(&self) -> Vec<TraversalEvent> {
        self.events.lock().clone()
    }

    /// `(turn_index, heading, reading)` of every completed turn.
    pub fn turns(&self) -> Vec<(u32, f64, SensorReading)> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match *e {
                TraversalEvent::TurnCompleted {
                    turn_index,
                    heading,
                    reading,
                } => Some((turn_index, heading, reading)),
                _ => None,
            })
            .collect()
    }

    /// Number of recorded self-aligns.
    pub fn alignments(&self) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| matches!(e, TraversalEvent::SelfAligned { .. }))
            .count()
    }
}

impl Reporter for RecordingReporter {
    fn report(&self, event: &TraversalEvent) {
        self.events.lock().push(event.clone());
    }
}
