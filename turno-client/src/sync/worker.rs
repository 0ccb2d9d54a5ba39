//! SyncWorker - background task that drains the queue on connectivity
//!
//! Listens for connectivity-regained events and manual retry requests,
//! triggers the engine, and refreshes the active shift after a drain that
//! confirmed entries so aggregates reflect the server's view.

use std::sync::Arc;

use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use super::engine::{SyncEngine, TriggerOutcome};
use crate::connectivity::Connectivity;
use crate::shifts::ShiftManager;

pub struct SyncWorker {
    engine: Arc<SyncEngine>,
    shifts: Arc<ShiftManager>,
    connectivity: Connectivity,
    /// Manual retry / opportunistic-sync nudge
    retry: Arc<Notify>,
    shutdown: CancellationToken,
}

impl SyncWorker {
    pub fn new(
        engine: Arc<SyncEngine>,
        shifts: Arc<ShiftManager>,
        connectivity: Connectivity,
        retry: Arc<Notify>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            engine,
            shifts,
            connectivity,
            retry,
            shutdown,
        }
    }

    /// Run the sync worker
    ///
    /// 1. Drain once on startup if online and the queue is non-empty
    /// 2. Drain on connectivity regained while the queue is non-empty
    /// 3. Drain on every manual retry / enqueue nudge
    /// 4. On shutdown, attempt one final drain while online
    pub async fn run(self) {
        tracing::info!("SyncWorker started");

        let mut conn_rx = self.connectivity.subscribe();

        if self.connectivity.is_online() && self.engine.queue_depth() > 0 {
            self.drain_and_refresh().await;
        }

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    tracing::info!("SyncWorker shutting down");
                    if self.connectivity.is_online() && self.engine.queue_depth() > 0 {
                        self.drain_and_refresh().await;
                    }
                    break;
                }

                _ = self.retry.notified() => {
                    if self.connectivity.is_online() {
                        self.drain_and_refresh().await;
                    }
                }

                changed = conn_rx.changed() => {
                    match changed {
                        Ok(()) => {
                            let online = *conn_rx.borrow_and_update();
                            if online && self.engine.queue_depth() > 0 {
                                tracing::info!(
                                    depth = self.engine.queue_depth(),
                                    "Connectivity regained, draining queue"
                                );
                                self.drain_and_refresh().await;
                            }
                        }
                        Err(_) => {
                            tracing::info!("Connectivity channel closed, SyncWorker stopping");
                            break;
                        }
                    }
                }
            }
        }

        tracing::info!("SyncWorker stopped");
    }

    async fn drain_and_refresh(&self) {
        match self.engine.trigger().await {
            Ok(TriggerOutcome::Drained(report)) => {
                if report.removed > 0
                    && let Err(e) = self.shifts.refresh().await
                {
                    tracing::warn!("Shift refresh after drain failed: {e}");
                }
            }
            Ok(TriggerOutcome::AlreadyDraining) => {
                // Deliberate no-op; the in-flight drain will finish and the
                // next signal re-triggers
            }
            Ok(TriggerOutcome::Idle | TriggerOutcome::TransportFailed) => {}
            Err(e) => {
                tracing::error!("Queue drain failed against local storage: {e}");
            }
        }
    }
}
