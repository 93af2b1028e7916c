// src/engine/coordinator.rs

//! Async coordinator for one bootstrap/replicator run.
//!
//! The coordinator owns both process handles and both watchers. The
//! bootstrap watcher runs as its own Tokio task; the replicator watcher runs
//! inline once the bootstrap node has signalled readiness. All waits select
//! on a group cancellation token derived from the caller's token, and every
//! exit path cancels the group, joins the bootstrap watcher and releases
//! both processes before `run` returns.

use std::fmt;
use std::io;
use std::sync::Arc;

use tokio::task::{JoinError, JoinHandle};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::state::{InvalidTransition, RunState, RunStateMachine};
use crate::log::{DecodeError, LogDecoder, DEFAULT_CHUNK_CAPACITY};
use crate::process::{LogStream, NodeCommand, ProcessHandle, ProcessLauncher, SpawnError};
use crate::types::NodeRole;
use crate::watch::{
    Completion, MilestoneSet, ReadinessSignal, RecordSink, WatchError, WatchOutcome, Watcher,
};

/// Command and milestones for one node.
#[derive(Debug, Clone)]
pub struct NodePlan {
    pub command: NodeCommand,
    pub milestones: MilestoneSet,
}

/// Everything the coordinator needs to run one scenario.
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub bootstrap: NodePlan,
    pub replicator: NodePlan,
    /// Read size used by both log decoders.
    pub chunk_capacity: usize,
}

impl RunPlan {
    pub fn new(bootstrap: NodePlan, replicator: NodePlan) -> Self {
        Self {
            bootstrap,
            replicator,
            chunk_capacity: DEFAULT_CHUNK_CAPACITY,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OrchestrationError {
    #[error(transparent)]
    Spawn(#[from] SpawnError),

    /// A node logged a record with severity `ERROR`.
    #[error("{role} node logged an error: {message}")]
    Record { role: NodeRole, message: String },

    #[error("{role} node stopped logging before the run finished ({remaining} milestone(s) outstanding)")]
    StreamEnded { role: NodeRole, remaining: usize },

    #[error("{role} node log stream: {source}")]
    Decode {
        role: NodeRole,
        #[source]
        source: DecodeError,
    },

    #[error("{role} watcher task failed: {source}")]
    WatcherPanicked {
        role: NodeRole,
        #[source]
        source: JoinError,
    },

    /// The caller cancelled the run.
    #[error("run cancelled")]
    Cancelled,

    #[error(transparent)]
    State(#[from] InvalidTransition),
}

impl From<WatchError> for OrchestrationError {
    fn from(err: WatchError) -> Self {
        match err {
            WatchError::Record { role, message } => OrchestrationError::Record { role, message },
            WatchError::Decode { role, source } => OrchestrationError::Decode { role, source },
        }
    }
}

impl OrchestrationError {
    /// The node the failure originated from, if any.
    pub fn role(&self) -> Option<NodeRole> {
        match self {
            OrchestrationError::Spawn(e) => Some(e.role),
            OrchestrationError::Record { role, .. }
            | OrchestrationError::StreamEnded { role, .. }
            | OrchestrationError::Decode { role, .. }
            | OrchestrationError::WatcherPanicked { role, .. } => Some(*role),
            OrchestrationError::Cancelled | OrchestrationError::State(_) => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, OrchestrationError::Cancelled)
    }
}

/// Timing and state trail of a successful run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub bootstrap_spawned_at: Instant,
    pub bootstrap_ready_at: Instant,
    pub replicator_spawned_at: Instant,
    pub finished_at: Instant,
    pub states: Vec<RunState>,
}

/// Terminal classification of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    Failed {
        role: Option<NodeRole>,
        reason: String,
    },
    Cancelled,
}

impl RunOutcome {
    pub fn of(result: &Result<RunReport, OrchestrationError>) -> Self {
        match result {
            Ok(_) => RunOutcome::Completed,
            Err(e) if e.is_cancelled() => RunOutcome::Cancelled,
            Err(e) => RunOutcome::Failed {
                role: e.role(),
                reason: e.to_string(),
            },
        }
    }
}

type WatchResult = Result<WatchOutcome, WatchError>;

/// Runs the bootstrap node, waits for it to be ready, then runs the
/// replicator node until it has seen all of its milestones.
pub struct Coordinator {
    launcher: Arc<dyn ProcessLauncher>,
    sink: Arc<dyn RecordSink>,
    plan: RunPlan,
}

impl fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Coordinator")
            .field("plan", &self.plan)
            .finish_non_exhaustive()
    }
}

/// Resources that must be torn down however the run ends.
#[derive(Default)]
struct Supervised {
    bootstrap: Option<ProcessHandle>,
    replicator: Option<ProcessHandle>,
    bootstrap_watch: Option<JoinHandle<WatchResult>>,
}

/// Timestamps gathered while driving the run.
struct Timeline {
    bootstrap_spawned_at: Instant,
    bootstrap_ready_at: Instant,
    replicator_spawned_at: Instant,
}

impl Coordinator {
    pub fn new(
        launcher: Arc<dyn ProcessLauncher>,
        sink: Arc<dyn RecordSink>,
        plan: RunPlan,
    ) -> Self {
        Self {
            launcher,
            sink,
            plan,
        }
    }

    pub fn plan(&self) -> &RunPlan {
        &self.plan
    }

    /// Execute one run.
    ///
    /// Cancelling `cancel` aborts the run with [`OrchestrationError::Cancelled`].
    /// Both node processes have been asked to terminate by the time this
    /// returns, whatever the outcome.
    pub async fn run(&self, cancel: &CancellationToken) -> Result<RunReport, OrchestrationError> {
        let group = cancel.child_token();
        let _cancel_group_on_exit = group.clone().drop_guard();

        let mut machine = RunStateMachine::new();
        let mut supervised = Supervised::default();

        let result = self
            .drive(cancel, &group, &mut machine, &mut supervised)
            .await;

        group.cancel();
        self.teardown(&mut supervised).await;

        let terminal = match &result {
            Ok(_) => RunState::Done,
            Err(OrchestrationError::Cancelled) => RunState::Cancelled,
            Err(_) => RunState::Failed,
        };
        if let Err(e) = machine.advance(terminal) {
            warn!(error = %e, "could not record terminal run state");
        }

        match &result {
            Ok(_) => info!(state = %machine.state(), "run finished"),
            Err(e) if e.is_cancelled() => info!(state = %machine.state(), "run cancelled"),
            Err(e) => error!(state = %machine.state(), error = %e, "run failed"),
        }

        result.map(|timeline| RunReport {
            bootstrap_spawned_at: timeline.bootstrap_spawned_at,
            bootstrap_ready_at: timeline.bootstrap_ready_at,
            replicator_spawned_at: timeline.replicator_spawned_at,
            finished_at: Instant::now(),
            states: machine.history().to_vec(),
        })
    }

    async fn drive(
        &self,
        cancel: &CancellationToken,
        group: &CancellationToken,
        machine: &mut RunStateMachine,
        supervised: &mut Supervised,
    ) -> Result<Timeline, OrchestrationError> {
        // Init -> BootstrapStarted
        let mut bootstrap = ProcessHandle::acquire(
            self.launcher.as_ref(),
            NodeRole::Bootstrap,
            &self.plan.bootstrap.command,
        )?;
        let bootstrap_spawned_at = bootstrap.spawned_at();
        let stdout = take_stdout(&mut bootstrap)?;
        supervised.bootstrap = Some(bootstrap);
        enter(machine, RunState::BootstrapStarted)?;

        let ready = ReadinessSignal::new();
        supervised.bootstrap_watch = Some(self.spawn_bootstrap_watch(stdout, ready.clone(), group));

        // BootstrapStarted -> BootstrapReady. A watcher that already exited
        // wins over readiness: it may have set the signal and then failed
        // within the same poll, and the replicator must not start then.
        let bootstrap_ready_at = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(OrchestrationError::Cancelled),
            joined = join_watch(&mut supervised.bootstrap_watch) => {
                return Err(bootstrap_exit_error(joined));
            }
            at = ready.wait() => at,
        };
        enter(machine, RunState::BootstrapReady)?;

        // BootstrapReady -> ReplicatorStarted. The replicator dials the
        // bootstrap node, so it must not exist before this point.
        let mut replicator = ProcessHandle::acquire(
            self.launcher.as_ref(),
            NodeRole::Replicator,
            &self.plan.replicator.command,
        )?;
        let replicator_spawned_at = replicator.spawned_at();
        let stdout = take_stdout(&mut replicator)?;
        supervised.replicator = Some(replicator);
        enter(machine, RunState::ReplicatorStarted)?;

        let mut watcher = Watcher::new(
            NodeRole::Replicator,
            &self.plan.replicator.milestones,
            Completion::Finish,
            Arc::clone(&self.sink),
        );
        let mut decoder = LogDecoder::with_chunk_capacity(stdout, self.plan.chunk_capacity);

        // ReplicatorStarted -> Done
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(OrchestrationError::Cancelled),
            joined = join_watch(&mut supervised.bootstrap_watch) => {
                return Err(bootstrap_exit_error(joined));
            }
            res = watcher.watch(&mut decoder, group) => res?,
        };

        match outcome {
            WatchOutcome::Completed => Ok(Timeline {
                bootstrap_spawned_at,
                bootstrap_ready_at,
                replicator_spawned_at,
            }),
            WatchOutcome::StreamEnded { remaining } => Err(OrchestrationError::StreamEnded {
                role: NodeRole::Replicator,
                remaining,
            }),
            WatchOutcome::Cancelled => Err(OrchestrationError::Cancelled),
        }
    }

    fn spawn_bootstrap_watch(
        &self,
        stdout: LogStream,
        ready: ReadinessSignal,
        group: &CancellationToken,
    ) -> JoinHandle<WatchResult> {
        let mut watcher = Watcher::new(
            NodeRole::Bootstrap,
            &self.plan.bootstrap.milestones,
            Completion::SignalReady(ready),
            Arc::clone(&self.sink),
        );
        let mut decoder = LogDecoder::with_chunk_capacity(stdout, self.plan.chunk_capacity);
        let token = group.clone();

        tokio::spawn(async move {
            let res = watcher.watch(&mut decoder, &token).await;
            debug!(watcher = ?watcher, result = ?res, "bootstrap watcher finished");
            res
        })
    }

    async fn teardown(&self, supervised: &mut Supervised) {
        if let Some(task) = supervised.bootstrap_watch.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "bootstrap watcher task did not join cleanly");
            }
        }
        if let Some(mut handle) = supervised.replicator.take() {
            handle.release();
        }
        if let Some(mut handle) = supervised.bootstrap.take() {
            handle.release();
        }
    }
}

fn enter(machine: &mut RunStateMachine, next: RunState) -> Result<(), OrchestrationError> {
    machine.advance(next)?;
    info!(state = %next, "run state changed");
    Ok(())
}

fn take_stdout(handle: &mut ProcessHandle) -> Result<LogStream, OrchestrationError> {
    handle.take_stdout().ok_or_else(|| OrchestrationError::Decode {
        role: handle.role(),
        source: DecodeError::Io(io::Error::new(
            io::ErrorKind::BrokenPipe,
            "stdout already taken",
        )),
    })
}

/// Await the watcher task in `slot`, clearing the slot once it has joined.
/// Pends forever when the slot is empty.
async fn join_watch(slot: &mut Option<JoinHandle<WatchResult>>) -> Result<WatchResult, JoinError> {
    match slot.as_mut() {
        Some(handle) => {
            let joined = handle.await;
            *slot = None;
            joined
        }
        None => std::future::pending().await,
    }
}

/// Any exit of the bootstrap watcher before the run is done is a failure.
fn bootstrap_exit_error(joined: Result<WatchResult, JoinError>) -> OrchestrationError {
    let role = NodeRole::Bootstrap;
    match joined {
        Err(source) => OrchestrationError::WatcherPanicked { role, source },
        Ok(Err(e)) => e.into(),
        Ok(Ok(WatchOutcome::StreamEnded { remaining })) => {
            OrchestrationError::StreamEnded { role, remaining }
        }
        Ok(Ok(WatchOutcome::Completed)) => OrchestrationError::StreamEnded { role, remaining: 0 },
        Ok(Ok(WatchOutcome::Cancelled)) => OrchestrationError::Cancelled,
    }
}
