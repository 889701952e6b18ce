use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time;

use crate::service::ShortenerService;

/// Background task that periodically removes long-expired records
pub struct Sweeper {
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl Sweeper {
    pub fn spawn(service: Arc<ShortenerService>, interval: Duration, grace: Duration) -> Self {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let grace = chrono::Duration::from_std(grace).unwrap_or(chrono::Duration::MAX);

        let handle = tokio::spawn(async move {
            let mut ticker = time::interval(interval);
            // The first tick fires immediately
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let removed = service.sweep_expired(grace).await;
                        tracing::debug!(removed, "expiry sweep finished");
                    }
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            tracing::info!("Shutdown signal received, stopping expiry sweeper");
                            break;
                        }
                    }
                }
            }
        });

        Self {
            shutdown_tx,
            handle,
        }
    }

    /// Stop the task and wait for it to exit
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(err) = self.handle.await {
            tracing::warn!(error = %err, "expiry sweeper task ended abnormally");
        }
    }
}
