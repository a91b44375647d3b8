use super::blocker::AdBlocker;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::info;

/// Detached periodic refresh job with its own start/stop lifecycle.
pub struct RefreshScheduler {
    refresh_tx: mpsc::Sender<()>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl RefreshScheduler {
    /// Refreshes every `every`; the first scheduled pass runs one full
    /// interval after start.
    pub fn start(blocker: Arc<AdBlocker>, every: Duration) -> Self {
        // Channel for forcing refresh
        let (refresh_tx, mut refresh_rx) = mpsc::channel::<()>(1);
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            // The first tick completes immediately
            interval.tick().await;

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        info!("Scheduled filter list update...");
                    }
                    Some(()) = refresh_rx.recv() => {
                        info!("Forced filter list update triggered...");
                        interval.reset(); // Reset timer to avoid double update
                    }
                    _ = &mut shutdown_rx => {
                        info!("Refresh scheduler stopping.");
                        break;
                    }
                }
                blocker.refresh_now().await;
            }
        });

        Self {
            refresh_tx,
            shutdown_tx: Some(shutdown_tx),
            handle,
        }
    }

    /// Requests an immediate pass. Returns `false` if one is already queued.
    pub fn trigger(&self) -> bool {
        self.refresh_tx.try_send(()).is_ok()
    }

    /// Stops the job, letting an in-flight pass run to completion.
    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        let _ = self.handle.await;
    }
}
