// src/process/handle.rs

//! Scoped ownership of one node process.

use std::fmt;
use std::io;
use std::path::PathBuf;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::command::NodeCommand;
use super::launcher::{LogStream, NodeProcess, ProcessLauncher};
use crate::types::NodeRole;

/// The node could not be started. Never retried.
#[derive(Debug, thiserror::Error)]
#[error("failed to spawn {role} node `{}`: {source}", .program.display())]
pub struct SpawnError {
    pub role: NodeRole,
    pub program: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Owns a running node and terminates it when released or dropped.
///
/// Termination is a request only: `release` never waits for the process to
/// exit, so it is safe to call from `Drop` and from cancelled futures.
pub struct ProcessHandle {
    role: NodeRole,
    process: Box<dyn NodeProcess>,
    stdout: Option<LogStream>,
    spawned_at: Instant,
    released: bool,
}

impl fmt::Debug for ProcessHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessHandle")
            .field("role", &self.role)
            .field("pid", &self.process.id())
            .field("released", &self.released)
            .finish_non_exhaustive()
    }
}

impl ProcessHandle {
    /// Spawn `command` and take ownership of it.
    ///
    /// Fails if the launcher cannot start the process or if the process was
    /// started without a stdout pipe (in which case it is killed again).
    pub fn acquire(
        launcher: &dyn ProcessLauncher,
        role: NodeRole,
        command: &NodeCommand,
    ) -> Result<Self, SpawnError> {
        let spawn_error = |source| SpawnError {
            role,
            program: command.program.clone(),
            source,
        };

        let mut process = launcher.launch(role, command).map_err(spawn_error)?;
        let spawned_at = Instant::now();

        let Some(stdout) = process.take_stdout() else {
            let _ = process.start_kill();
            return Err(spawn_error(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "stdout was not captured",
            )));
        };

        info!(%role, pid = ?process.id(), cmd = %command, "node process started");

        Ok(Self {
            role,
            process,
            stdout: Some(stdout),
            spawned_at,
            released: false,
        })
    }

    pub fn role(&self) -> NodeRole {
        self.role
    }

    pub fn id(&self) -> Option<u32> {
        self.process.id()
    }

    pub fn spawned_at(&self) -> Instant {
        self.spawned_at
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Take the stdout stream. Only the first call returns it.
    pub fn take_stdout(&mut self) -> Option<LogStream> {
        self.stdout.take()
    }

    /// Request termination. Idempotent.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        match self.process.start_kill() {
            Ok(()) => info!(role = %self.role, pid = ?self.process.id(), "terminating node process"),
            Err(e) if e.kind() == io::ErrorKind::InvalidInput => {
                debug!(role = %self.role, "node process already exited");
            }
            Err(e) => warn!(
                role = %self.role,
                pid = ?self.process.id(),
                error = %e,
                "failed to request node process termination"
            ),
        }
    }
}

impl Drop for ProcessHandle {
    fn drop(&mut self) {
        self.release();
    }
}
