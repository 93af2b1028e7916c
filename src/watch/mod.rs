// src/watch/mod.rs

//! Log watching.
//!
//! A [`Watcher`] consumes one node's decoded records, echoes them to a
//! [`RecordSink`], fails on `ERROR` records and fires its [`Completion`]
//! once every milestone in its [`MilestoneSet`] has been seen.

pub mod milestones;
pub mod signal;
pub mod sink;
pub mod watcher;

pub use milestones::{MilestoneSet, MilestoneTracker};
pub use signal::ReadinessSignal;
pub use sink::{RecordSink, StdoutSink};
pub use watcher::{Completion, WatchError, WatchOutcome, Watcher};
