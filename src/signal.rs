//! One-shot, idempotent broadcast signal.
//!
//! Used for "ready" (ISUPPORT seen) and "channel started" (our JOIN echoed).
//! Once fired it stays fired; waiting on a fired signal returns immediately.

use std::sync::Arc;

use tokio::sync::watch;

#[derive(Clone, Debug)]
pub(crate) struct Signal {
    tx: Arc<watch::Sender<bool>>,
}

impl Signal {
    pub(crate) fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Fire the signal. Returns `true` only for the call that fired it.
    pub(crate) fn fire(&self) -> bool {
        !self.tx.send_replace(true)
    }

    pub(crate) fn is_fired(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolve once the signal has fired.
    pub(crate) async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            // The sender lives as long as `self`, so this only errors on teardown.
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fire_once() {
        let signal = Signal::new();
        assert!(!signal.is_fired());
        assert!(signal.fire());
        assert!(!signal.fire());
        assert!(signal.is_fired());
    }

    #[tokio::test]
    async fn test_wait_after_fire() {
        let signal = Signal::new();
        signal.fire();
        signal.wait().await;
    }

    #[tokio::test]
    async fn test_wait_wakes_all() {
        let signal = Signal::new();
        let a = tokio::spawn({
            let signal = signal.clone();
            async move { signal.wait().await }
        });
        let b = tokio::spawn({
            let signal = signal.clone();
            async move { signal.wait().await }
        });
        tokio::task::yield_now().await;
        signal.fire();
        a.await.unwrap();
        b.await.unwrap();
    }
}
