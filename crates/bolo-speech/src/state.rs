//! Capture state machine with validated transitions.
//!
//! - Idle -> Listening (start capture)
//! - Listening -> Idle (stop, or the recognition stream ended)

use std::fmt;
use std::sync::{Arc, Mutex};

use crate::error::SpeechError;

/// Observable capture state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaptureState {
    /// Not capturing. The last transcript is kept until reset.
    Idle,
    /// Continuous recognition is running.
    Listening,
}

impl fmt::Display for CaptureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureState::Idle => write!(f, "Idle"),
            CaptureState::Listening => write!(f, "Listening"),
        }
    }
}

impl CaptureState {
    /// Returns whether a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: &CaptureState) -> bool {
        matches!(
            (self, target),
            (CaptureState::Idle, CaptureState::Listening)
                | (CaptureState::Listening, CaptureState::Idle)
        )
    }
}

/// Shared capture state. Clones observe the same state.
#[derive(Debug, Clone)]
pub struct StateMachine {
    state: Arc<Mutex<CaptureState>>,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StateMachine {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(CaptureState::Idle)),
        }
    }

    pub fn current(&self) -> CaptureState {
        match self.state.lock() {
            Ok(state) => *state,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    /// Attempt to move to `target`, rejecting transitions not in the table.
    pub fn transition(&self, target: CaptureState) -> Result<(), SpeechError> {
        let mut state = match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        if state.can_transition_to(&target) {
            tracing::debug!("Capture state: {} -> {}", *state, target);
            *state = target;
            Ok(())
        } else {
            Err(SpeechError::InvalidTransition {
                from: *state,
                to: target,
            })
        }
    }

    /// Force the machine back to Idle (error recovery).
    pub fn reset(&self) {
        let mut state = match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        if *state != CaptureState::Idle {
            tracing::warn!("Capture state reset to Idle from {}", *state);
        }
        *state = CaptureState::Idle;
    }
}

// =============================================================================
// Tests
// =============================================================================
