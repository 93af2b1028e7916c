// src/engine/state.rs

//! Pure run state machine.
//!
//! No Tokio, no processes: just the legal orderings of a run, so the
//! coordinator can record where it is and tests can check the sequence.

use std::fmt;

/// Where a run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunState {
    Init,
    BootstrapStarted,
    BootstrapReady,
    ReplicatorStarted,
    Done,
    Failed,
    Cancelled,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Done | RunState::Failed | RunState::Cancelled)
    }

    /// Whether `self -> next` is a legal transition.
    pub fn can_advance_to(self, next: RunState) -> bool {
        use RunState::*;

        if self.is_terminal() {
            return false;
        }
        match next {
            Failed | Cancelled => true,
            BootstrapStarted => self == Init,
            BootstrapReady => self == BootstrapStarted,
            ReplicatorStarted => self == BootstrapReady,
            Done => self == ReplicatorStarted,
            Init => false,
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunState::Init => "init",
            RunState::BootstrapStarted => "bootstrap-started",
            RunState::BootstrapReady => "bootstrap-ready",
            RunState::ReplicatorStarted => "replicator-started",
            RunState::Done => "done",
            RunState::Failed => "failed",
            RunState::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid run state transition {from} -> {to}")]
pub struct InvalidTransition {
    pub from: RunState,
    pub to: RunState,
}

/// Current state plus every state visited, in order.
#[derive(Debug, Clone)]
pub struct RunStateMachine {
    history: Vec<RunState>,
}

impl Default for RunStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl RunStateMachine {
    pub fn new() -> Self {
        Self {
            history: vec![RunState::Init],
        }
    }

    pub fn state(&self) -> RunState {
        // `history` starts with `Init` and is never drained.
        self.history.last().copied().unwrap_or(RunState::Init)
    }

    pub fn history(&self) -> &[RunState] {
        &self.history
    }

    pub fn advance(&mut self, next: RunState) -> Result<(), InvalidTransition> {
        let from = self.state();
        if !from.can_advance_to(next) {
            return Err(InvalidTransition { from, to: next });
        }
        self.history.push(next);
        Ok(())
    }
}
