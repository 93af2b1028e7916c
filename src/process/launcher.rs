// src/process/launcher.rs

//! Pluggable process launching.
//!
//! The coordinator never calls `tokio::process` directly; it goes through a
//! [`ProcessLauncher`]. Production code uses [`TokioLauncher`]; tests plug in
//! a launcher whose "processes" are scripted in-memory streams, which lets
//! them observe spawn order and termination without real binaries.

use std::fmt;
use std::io;
use std::pin::Pin;
use std::process::Stdio;

use tokio::io::AsyncRead;
use tokio::process::{Child, Command};

use super::command::NodeCommand;
use crate::types::NodeRole;

/// Stdout of a launched node.
pub type LogStream = Pin<Box<dyn AsyncRead + Send>>;

/// A running child as seen by a [`ProcessHandle`](super::ProcessHandle).
pub trait NodeProcess: Send {
    /// OS process id, if there is one.
    fn id(&self) -> Option<u32>;

    /// Hand out the stdout pipe. Returns `None` on the second call.
    fn take_stdout(&mut self) -> Option<LogStream>;

    /// Ask the process to terminate. Must not wait for it to exit.
    fn start_kill(&mut self) -> io::Result<()>;
}

/// Trait abstracting how node processes are started.
pub trait ProcessLauncher: Send + Sync {
    fn launch(&self, role: NodeRole, command: &NodeCommand) -> io::Result<Box<dyn NodeProcess>>;
}

/// Launcher backed by `tokio::process::Command`.
///
/// Stdout is piped, stderr and stdin are inherited from the harness.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioLauncher;

impl ProcessLauncher for TokioLauncher {
    fn launch(&self, _role: NodeRole, command: &NodeCommand) -> io::Result<Box<dyn NodeProcess>> {
        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .envs(&command.env)
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        if let Some(cwd) = &command.cwd {
            cmd.current_dir(cwd);
        }

        let child = cmd.spawn()?;
        Ok(Box::new(TokioProcess { child }))
    }
}

struct TokioProcess {
    child: Child,
}

impl fmt::Debug for TokioProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokioProcess")
            .field("pid", &self.child.id())
            .finish()
    }
}

impl NodeProcess for TokioProcess {
    fn id(&self) -> Option<u32> {
        self.child.id()
    }

    fn take_stdout(&mut self) -> Option<LogStream> {
        self.child
            .stdout
            .take()
            .map(|stdout| Box::pin(stdout) as LogStream)
    }

    fn start_kill(&mut self) -> io::Result<()> {
        self.child.start_kill()
    }
}
