// src/watch/signal.rs

use std::sync::Arc;

use tokio::sync::watch;
use tokio::time::Instant;

/// Set-once "bootstrap is ready" flag.
///
/// Cloning shares the same signal. Setting it a second time is a no-op, and
/// waiting on an already-set signal returns immediately.
#[derive(Debug, Clone)]
pub struct ReadinessSignal {
    tx: Arc<watch::Sender<Option<Instant>>>,
}

impl Default for ReadinessSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadinessSignal {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// Set the signal. Returns true only for the call that actually set it.
    pub fn set(&self) -> bool {
        self.tx.send_if_modified(|at| {
            if at.is_some() {
                return false;
            }
            *at = Some(Instant::now());
            true
        })
    }

    pub fn is_set(&self) -> bool {
        self.tx.borrow().is_some()
    }

    /// When the signal was first set.
    pub fn set_at(&self) -> Option<Instant> {
        *self.tx.borrow()
    }

    /// Wait until the signal is set, returning the instant it was set.
    pub async fn wait(&self) -> Instant {
        let mut rx = self.tx.subscribe();
        loop {
            if let Some(at) = *rx.borrow_and_update() {
                return at;
            }
            // The sender lives in `self`, so the channel cannot close here.
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}
