use std::sync::Arc;

use chrono::Utc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::services::cadence::seconds_until_next_cycle_available;
use crate::services::core::CoreServices;
use crate::services::prefetch::Prefetcher;

/// Delay before retrying after a failed prefetch cycle.
pub const RECOVERY_DELAY: Duration = Duration::from_secs(300);

/// Drives the prefetcher: one cold fill at startup, then a single timer
/// re-armed from the forecast cadence after each cycle returns. Cycles
/// never overlap; a new one starts only after the previous one finished.
pub struct RefreshScheduler {
    shutdown: watch::Sender<bool>,
    handle: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl RefreshScheduler {
    /// Spawn the background task and run the cold fill immediately.
    pub fn start(core: Arc<CoreServices>) -> Self {
        let (shutdown, mut shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            {
                let mut status = core.prefetch_status.write().await;
                status.running = true;
            }
            info!("Refresh scheduler started, running cold fill");

            let prefetcher = Prefetcher::new(core.clone());
            loop {
                let delay = match prefetcher.run_cycle().await {
                    Ok(()) => {
                        let mut status = core.prefetch_status.write().await;
                        status.last_error = None;
                        let secs = seconds_until_next_cycle_available(Utc::now());
                        Duration::from_secs(secs.max(0) as u64)
                    }
                    Err(e) => {
                        error!("Prefetch cycle failed: {}, retrying in {}s", e, RECOVERY_DELAY.as_secs());
                        let mut status = core.prefetch_status.write().await;
                        status.last_error = Some(e.to_string());
                        RECOVERY_DELAY
                    }
                };

                // A shutdown raised during the cycle is observed here, before
                // any new timer is armed.
                if *shutdown_rx.borrow() {
                    break;
                }

                info!("Next prefetch cycle in {}s", delay.as_secs());
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }

            {
                let mut status = core.prefetch_status.write().await;
                status.running = false;
            }
            info!("Refresh scheduler stopped");
        });

        Self {
            shutdown,
            handle: std::sync::Mutex::new(Some(handle)),
        }
    }

    /// Cancel the pending timer and wait for any in-flight cycle to finish.
    pub async fn shutdown(&self) {
        let _ = self.shutdown.send(true);
        let handle = {
            let mut guard = self.handle.lock().unwrap_or_else(|e| e.into_inner());
            guard.take()
        };
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!("Refresh scheduler task ended abnormally: {}", e);
            }
        }
    }
}
