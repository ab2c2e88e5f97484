//! Task supervision for one connection.
//!
//! Every long-running task is spawned through a [`Supervisor`]. The first task
//! to fail records its error and cancels the shared token; the rest observe
//! the cancellation and wind down. [`Supervisor::wait`] resolves once every
//! tracked task has exited.

use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, Instrument};

use crate::error::{ClientError, Result};

#[derive(Clone, Debug)]
pub(crate) struct Supervisor {
    token: CancellationToken,
    tracker: TaskTracker,
    failure: Arc<Mutex<Option<ClientError>>>,
}

impl Supervisor {
    pub(crate) fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            tracker: TaskTracker::new(),
            failure: Arc::new(Mutex::new(None)),
        }
    }

    pub(crate) fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// A token cancelled with the connection, but cancellable on its own.
    pub(crate) fn child_token(&self) -> CancellationToken {
        self.token.child_token()
    }

    /// Spawn a tracked task. An `Err` return tears the connection down.
    pub(crate) fn spawn<F>(&self, name: &'static str, task: F)
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        let this = self.clone();
        let span = tracing::debug_span!("task", task = name);
        self.tracker.spawn(
            async move {
                match task.await {
                    Ok(()) => debug!("task finished"),
                    Err(err) => this.fail(err),
                }
            }
            .instrument(span),
        );
    }

    /// Record a fatal error and cancel everything. Only the first error
    /// is kept, and errors after a graceful shutdown are ignored.
    pub(crate) fn fail(&self, err: ClientError) {
        if self.token.is_cancelled() {
            debug!(%err, "error after shutdown ignored");
            return;
        }
        let mut failure = self.failure.lock();
        if failure.is_none() {
            error!(%err, "connection failed");
            *failure = Some(err);
        }
        drop(failure);
        self.token.cancel();
    }

    pub(crate) fn shutdown(&self) {
        self.token.cancel();
    }

    pub(crate) fn is_shutdown(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Whether a task failed, as opposed to an orderly shutdown.
    pub(crate) fn has_failed(&self) -> bool {
        self.failure.lock().is_some()
    }

    /// Wait for every task to exit and return the first failure, if any.
    ///
    /// The failure is handed out once; later calls return `Ok(())`.
    pub(crate) async fn wait(&self) -> Result<()> {
        self.tracker.close();
        self.tracker.wait().await;
        match self.failure.lock().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_first_failure_wins() {
        let supervisor = Supervisor::new();
        supervisor.spawn("fails", async { Err(ClientError::Timeout) });
        let token = supervisor.token().clone();
        supervisor.spawn("waits", async move {
            token.cancelled().await;
            Err(ClientError::ConnectionClosed)
        });
        let err = supervisor.wait().await.unwrap_err();
        assert!(matches!(err, ClientError::Timeout));
        assert!(supervisor.wait().await.is_ok());
    }

    #[tokio::test]
    async fn test_graceful_shutdown() {
        let supervisor = Supervisor::new();
        let token = supervisor.token().clone();
        supervisor.spawn("loop", async move {
            token.cancelled().await;
            Err(ClientError::ConnectionClosed)
        });
        supervisor.shutdown();
        assert!(supervisor.wait().await.is_ok());
        assert!(supervisor.is_shutdown());
        assert!(!supervisor.has_failed());
    }

    #[tokio::test]
    async fn test_child_token_cancelled_with_parent() {
        let supervisor = Supervisor::new();
        let child = supervisor.child_token();
        child.cancel();
        assert!(!supervisor.is_shutdown());

        let child = supervisor.child_token();
        supervisor.shutdown();
        assert!(child.is_cancelled());
    }
}
