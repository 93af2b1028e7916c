// src/watch/watcher.rs

//! Per-node log watcher.

use std::fmt;
use std::sync::Arc;

use tokio::io::AsyncRead;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::milestones::{MilestoneSet, MilestoneTracker};
use super::signal::ReadinessSignal;
use super::sink::RecordSink;
use crate::log::{DecodeError, LogDecoder, LogRecord};
use crate::types::NodeRole;

/// What a watcher does once every milestone has been seen.
#[derive(Debug, Clone)]
pub enum Completion {
    /// Set the signal and keep following the stream, still echoing records
    /// and failing on `ERROR` ones, until cancelled or the stream ends.
    SignalReady(ReadinessSignal),
    /// Stop consuming and return [`WatchOutcome::Completed`].
    Finish,
}

/// How a watch ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchOutcome {
    /// Milestones were met and the completion action was [`Completion::Finish`].
    Completed,
    /// The cancellation token fired.
    Cancelled,
    /// The node's stdout closed. `remaining` milestones were never seen.
    StreamEnded { remaining: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    /// The node logged a record with severity `ERROR`.
    #[error("{role} node logged an error: {message}")]
    Record { role: NodeRole, message: String },

    #[error("{role} node log stream: {source}")]
    Decode {
        role: NodeRole,
        #[source]
        source: DecodeError,
    },
}

impl WatchError {
    pub fn role(&self) -> NodeRole {
        match self {
            WatchError::Record { role, .. } | WatchError::Decode { role, .. } => *role,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Continue,
    Finished,
}

/// Matches one node's records against its milestones.
pub struct Watcher {
    role: NodeRole,
    tracker: MilestoneTracker,
    completion: Completion,
    sink: Arc<dyn RecordSink>,
    completed: bool,
    consumed: usize,
}

impl fmt::Debug for Watcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Watcher")
            .field("role", &self.role)
            .field("remaining", &self.tracker.remaining())
            .field("completed", &self.completed)
            .field("consumed", &self.consumed)
            .finish_non_exhaustive()
    }
}

impl Watcher {
    pub fn new(
        role: NodeRole,
        milestones: &MilestoneSet,
        completion: Completion,
        sink: Arc<dyn RecordSink>,
    ) -> Self {
        Self {
            role,
            tracker: milestones.tracker(),
            completion,
            sink,
            completed: false,
            consumed: 0,
        }
    }

    pub fn role(&self) -> NodeRole {
        self.role
    }

    /// Milestones not yet seen.
    pub fn remaining(&self) -> usize {
        self.tracker.remaining()
    }

    /// Whether the completion action has fired.
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Number of records consumed so far.
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    /// Consume records from `decoder` until a terminal condition.
    ///
    /// Every wait on the stream also waits on `cancel`, so cancelling the
    /// token returns promptly with [`WatchOutcome::Cancelled`].
    pub async fn watch<R>(
        &mut self,
        decoder: &mut LogDecoder<R>,
        cancel: &CancellationToken,
    ) -> Result<WatchOutcome, WatchError>
    where
        R: AsyncRead + Unpin,
    {
        if self.tracker.is_complete() && self.complete() == Step::Finished {
            return Ok(WatchOutcome::Completed);
        }

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(role = %self.role, consumed = self.consumed, "watcher cancelled");
                    return Ok(WatchOutcome::Cancelled);
                }
                next = decoder.next_record() => next,
            };

            let record = next.map_err(|source| WatchError::Decode {
                role: self.role,
                source,
            })?;

            let Some(record) = record else {
                let remaining = self.tracker.remaining();
                debug!(role = %self.role, remaining, "log stream ended");
                return Ok(WatchOutcome::StreamEnded { remaining });
            };

            if self.observe(&record)? == Step::Finished {
                return Ok(WatchOutcome::Completed);
            }
        }
    }

    fn observe(&mut self, record: &LogRecord) -> Result<Step, WatchError> {
        self.consumed += 1;
        self.sink.emit(self.role, record);

        if record.is_error() {
            return Err(WatchError::Record {
                role: self.role,
                message: record.message.clone(),
            });
        }

        if self.tracker.observe(&record.message) {
            debug!(
                role = %self.role,
                remaining = self.tracker.remaining(),
                milestone = %record.message,
                "milestone reached"
            );
            if self.tracker.is_complete() {
                return Ok(self.complete());
            }
        }

        Ok(Step::Continue)
    }

    fn complete(&mut self) -> Step {
        if self.completed {
            return Step::Continue;
        }
        self.completed = true;

        match &self.completion {
            Completion::SignalReady(signal) => {
                if signal.set() {
                    info!(role = %self.role, "all milestones seen; signalled readiness");
                }
                Step::Continue
            }
            Completion::Finish => {
                info!(role = %self.role, "all milestones seen; watcher finished");
                Step::Finished
            }
        }
    }
}
