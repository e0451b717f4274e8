//! Wall-clock budget for the inference stage.
//!
//! The guarded work runs on its own thread and reports back over a
//! channel; the caller waits with a deadline. On expiry the shared
//! [`CancelFlag`] is raised so the worker stops at its next check, and the
//! worker is left to wind down detached.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use tracing::{debug, instrument, warn};
use tsbench_models::{CancelFlag, ModelError};

use crate::error::BenchError;

/// How a guarded run ended.
#[derive(Debug)]
pub enum GuardOutcome<T> {
    /// The work finished within the budget.
    Completed(T),
    /// The budget expired first. The worker was cancelled.
    TimedOut,
    /// The work returned an error.
    Failed(ModelError),
    /// The worker panicked.
    Panicked,
}

impl<T> GuardOutcome<T> {
    /// True for every outcome except [`Completed`][Self::Completed].
    #[must_use]
    pub fn is_sentinel(&self) -> bool {
        !matches!(self, Self::Completed(_))
    }
}

/// Runs work on a worker thread under a wall-clock budget.
#[derive(Debug, Clone, Copy)]
pub struct TimeoutGuard {
    budget: Duration,
}

impl TimeoutGuard {
    /// Create a guard with the given budget.
    ///
    /// # Errors
    ///
    /// Returns [`BenchError::InvalidTimeout`] if `budget` is zero.
    pub fn new(budget: Duration) -> Result<Self, BenchError> {
        if budget.is_zero() {
            return Err(BenchError::InvalidTimeout);
        }
        Ok(Self { budget })
    }

    /// The wall-clock budget.
    #[must_use]
    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// Run `work` on a fresh thread and wait at most the budget for it.
    ///
    /// `work` receives the flag that is raised on expiry and should return
    /// [`ModelError::Cancelled`] soon after observing it.
    ///
    /// # Errors
    ///
    /// Returns [`BenchError::SpawnWorker`] if the thread cannot be started.
    /// Every outcome of the work itself is reported as a [`GuardOutcome`].
    #[instrument(skip_all, fields(budget_secs = self.budget.as_secs_f64()))]
    pub fn run<T, F>(&self, work: F) -> Result<GuardOutcome<T>, BenchError>
    where
        T: Send + 'static,
        F: FnOnce(&CancelFlag) -> Result<T, ModelError> + Send + 'static,
    {
        let cancel = CancelFlag::new();
        let worker_flag = cancel.clone();
        // Capacity 1: the worker never blocks on send, even once we stop listening.
        let (tx, rx) = mpsc::sync_channel(1);

        let handle = thread::Builder::new()
            .name("tsbench-infer".to_string())
            .spawn(move || {
                // The receiver is gone if the budget expired; nothing to report to.
                let _ = tx.send(work(&worker_flag));
            })
            .map_err(|e| BenchError::SpawnWorker { source: e })?;

        let outcome = match rx.recv_timeout(self.budget) {
            Ok(Ok(value)) => {
                let _ = handle.join();
                GuardOutcome::Completed(value)
            }
            Ok(Err(e)) => {
                warn!(error = %e, "inference failed");
                let _ = handle.join();
                GuardOutcome::Failed(e)
            }
            Err(RecvTimeoutError::Timeout) => {
                cancel.cancel();
                warn!("inference exceeded its budget, worker cancelled");
                GuardOutcome::TimedOut
            }
            Err(RecvTimeoutError::Disconnected) => {
                let _ = handle.join();
                warn!("inference worker panicked");
                GuardOutcome::Panicked
            }
        };
        debug!(sentinel = outcome.is_sentinel(), "guarded run finished");
        Ok(outcome)
    }
}
