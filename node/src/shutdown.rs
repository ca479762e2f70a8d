//! Graceful shutdown for the node.
//!
//! [`ShutdownController`] listens for SIGINT/SIGTERM and broadcasts a
//! shutdown signal to all subsystems via a `tokio::sync::broadcast` channel.
//! [`ShutdownBarrier`] lets the main task wait until every subsystem has
//! finished its own shutdown.

use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::signal;
use tokio::sync::{broadcast, Notify};

/// Coordinates graceful shutdown across all node subsystems.
///
/// Subsystems call [`subscribe`](Self::subscribe) to get a receiver, then
/// `select!` on it alongside their main loop. When shutdown is triggered
/// (either by OS signal or programmatically), every receiver is notified.
pub struct ShutdownController {
    tx: broadcast::Sender<()>,
}

impl ShutdownController {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Get a receiver that will be notified on shutdown.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Trigger shutdown programmatically.
    pub fn shutdown(&self) {
        let _ = self.tx.send(());
    }

    /// Wait for SIGTERM or SIGINT, then trigger shutdown.
    pub async fn wait_for_signal(&self) {
        let ctrl_c = signal::ctrl_c();

        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    sigterm.recv().await;
                }
                Err(e) => {
                    tracing::warn!("failed to install SIGTERM handler: {e}");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => { tracing::info!("received SIGINT, shutting down"); }
            _ = terminate => { tracing::info!("received SIGTERM, shutting down"); }
        }

        self.shutdown();
    }
}

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}

/// Counting barrier: resolves once `n` subsystems have each signalled that
/// their shutdown is complete.
pub struct ShutdownBarrier {
    remaining: AtomicUsize,
    done: Notify,
}

impl ShutdownBarrier {
    pub fn new(subsystems: usize) -> Self {
        Self {
            remaining: AtomicUsize::new(subsystems),
            done: Notify::new(),
        }
    }

    /// Mark one subsystem as shut down. Signals past the expected count are
    /// ignored.
    pub fn signal(&self) {
        let previous = self
            .remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
        match previous {
            Ok(1) => self.done.notify_waiters(),
            Ok(_) => {}
            Err(_) => tracing::warn!("shutdown barrier signalled more times than expected"),
        }
    }

    pub fn remaining(&self) -> usize {
        self.remaining.load(Ordering::Acquire)
    }

    /// Wait until every subsystem has signalled.
    pub async fn wait(&self) {
        loop {
            let notified = self.done.notified();
            if self.remaining() == 0 {
                return;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn programmatic_shutdown_notifies_subscribers() {
        let controller = ShutdownController::new();
        let mut rx = controller.subscribe();
        controller.shutdown();
        assert!(rx.recv().await.is_ok());
    }

    #[tokio::test]
    async fn multiple_subscribers_all_notified() {
        let controller = ShutdownController::new();
        let mut rx1 = controller.subscribe();
        let mut rx2 = controller.subscribe();
        controller.shutdown();
        assert!(rx1.recv().await.is_ok());
        assert!(rx2.recv().await.is_ok());
    }

    #[tokio::test]
    async fn barrier_waits_for_every_subsystem() {
        let barrier = Arc::new(ShutdownBarrier::new(2));

        let waiter = {
            let barrier = barrier.clone();
            tokio::spawn(async move { barrier.wait().await })
        };

        barrier.signal();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());
        assert_eq!(barrier.remaining(), 1);

        barrier.signal();
        tokio::time::timeout(Duration::from_secs(5), waiter)
            .await
            .expect("barrier did not release")
            .unwrap();
    }

    #[tokio::test]
    async fn barrier_already_released_returns_immediately() {
        let barrier = ShutdownBarrier::new(1);
        barrier.signal();
        barrier.signal();
        assert_eq!(barrier.remaining(), 0);
        tokio::time::timeout(Duration::from_secs(1), barrier.wait())
            .await
            .expect("released barrier must not block");
    }
}
