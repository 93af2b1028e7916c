// src/process/mod.rs

//! Node process lifecycle.
//!
//! - [`command`] describes what to run ([`NodeCommand`]).
//! - [`launcher`] provides the [`ProcessLauncher`] seam and the production
//!   [`TokioLauncher`].
//! - [`handle`] owns a started process and guarantees it is asked to
//!   terminate on every exit path.

pub mod command;
pub mod handle;
pub mod launcher;

pub use command::NodeCommand;
pub use handle::{ProcessHandle, SpawnError};
pub use launcher::{LogStream, NodeProcess, ProcessLauncher, TokioLauncher};
