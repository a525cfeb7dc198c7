//! Traversal state transitions.
//!
//! Driving → SelfAligning → Driving, Driving → Turning → Driving,
//! Driving → Stopped (terminal).

use serde::Serialize;
use std::fmt;

/// Controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum TraversalState {
    /// Driving straight towards the next turn point.
    Driving = 0,
    /// Correcting heading drift at low speed.
    SelfAligning = 1,
    /// Executing a 90° clockwise turn.
    Turning = 2,
    /// Course complete, motors stopped. Terminal.
    Stopped = 3,
}

impl Default for TraversalState {
    fn default() -> Self {
        Self::Driving
    }
}

impl fmt::Display for TraversalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Result of a transition attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionResult {
    /// Transition succeeded; carries the new state.
    Ok(TraversalState),
    /// Transition rejected with a reason.
    Rejected(&'static str),
}

/// Event that can trigger a state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseEvent {
    /// Heading error exceeded the angle tolerance.
    HeadingDrift,
    /// Heading back within tolerance after self-align.
    HeadingRestored,
    /// Forward distance within tolerance of the turn point.
    TurnPointReached,
    /// Turn finished, turn counter advanced.
    TurnComplete,
    /// Final turn point reached.
    CourseComplete,
}

/// Holds the current `TraversalState`.
#[derive(Debug, Clone)]
pub struct StateMachine {
    state: TraversalState,
}

impl StateMachine {
    /// Create a new machine in `Driving`.
    pub const fn new() -> Self {
        Self {
            state: TraversalState::Driving,
        }
    }

    /// Current state.
    #[inline]
    pub const fn state(&self) -> TraversalState {
        self.state
    }

    /// True once the terminal state is reached.
    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.state == TraversalState::Stopped
    }

    /// Attempt a transition given an event.
    pub fn handle_event(&mut self, event: PhaseEvent) -> TransitionResult {
        use PhaseEvent::*;
        use TraversalState::*;

        let next = match (self.state, event) {
            (Driving, HeadingDrift) => SelfAligning,
            (SelfAligning, HeadingRestored) => Driving,
            (Driving, TurnPointReached) => Turning,
            (Turning, TurnComplete) => Driving,
            (Driving, CourseComplete) => Stopped,
            _ => return TransitionResult::Rejected(invalid_transition_reason(self.state)),
        };

        self.state = next;
        TransitionResult::Ok(next)
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

fn invalid_transition_reason(state: TraversalState) -> &'static str {
    match state {
        TraversalState::Driving => "Driving: only HeadingDrift, TurnPointReached or CourseComplete allowed",
        TraversalState::SelfAligning => "SelfAligning: only HeadingRestored allowed",
        TraversalState::Turning => "Turning: only TurnComplete allowed",
        TraversalState::Stopped => "Stopped: terminal state",
    }
}
