// src/engine/mod.rs

//! Orchestration engine.
//!
//! The pure run state machine lives in [`state`]; the async coordinator that
//! spawns the nodes, wires their watchers together and tears everything
//! down is implemented in [`coordinator`].

pub mod coordinator;
pub mod state;

pub use coordinator::{
    Coordinator, NodePlan, OrchestrationError, RunOutcome, RunPlan, RunReport,
};
pub use state::{InvalidTransition, RunState, RunStateMachine};
