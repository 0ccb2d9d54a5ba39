//! Queue drain engine
//!
//! Drains the full submission queue against the remote batch-sync endpoint
//! and reconciles queue state from the per-item results.
//!
//! # Guarantees
//!
//! - At most one drain in flight; a concurrent trigger is a no-op
//! - Entries are submitted in FIFO enqueue order, as a single batch
//! - A transport failure of the batch call leaves the queue untouched
//! - An entry is removed only on server confirmation for its token

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use crate::queue::{QueueResult, SubmissionQueue};
use crate::remote::RemoteService;
use shared::sync::{SyncBatch, SyncItem, SyncItemStatus, SyncReport};
use shared::util::now_millis;

/// Outcome of one trigger call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// A drain ran to completion; per-item results were reconciled
    Drained(SyncReport),
    /// Queue was empty, nothing to do
    Idle,
    /// Another drain is in flight; this call was a no-op. Re-trigger after
    /// observing completion (the next connectivity signal will).
    AlreadyDraining,
    /// The batch call itself failed; queue unchanged, error state recorded
    TransportFailed,
}

struct TransientError {
    message: String,
    expires_at: i64,
}

/// Drains the durable queue against the remote service
pub struct SyncEngine {
    queue: SubmissionQueue,
    remote: Arc<dyn RemoteService>,
    device_id: String,
    /// Serializes drains; `try_lock` makes concurrent triggers no-ops
    drain_lock: tokio::sync::Mutex<()>,
    /// Last transport failure, kept visible for a short display window
    transport_error: Mutex<Option<TransientError>>,
    error_window: Duration,
}

/// Default display window for transient transport errors
const DEFAULT_ERROR_WINDOW: Duration = Duration::from_secs(8);

impl SyncEngine {
    pub fn new(
        queue: SubmissionQueue,
        remote: Arc<dyn RemoteService>,
        device_id: impl Into<String>,
    ) -> Self {
        Self {
            queue,
            remote,
            device_id: device_id.into(),
            drain_lock: tokio::sync::Mutex::new(()),
            transport_error: Mutex::new(None),
            error_window: DEFAULT_ERROR_WINDOW,
        }
    }

    /// Override the transient-error display window
    pub fn with_error_window(mut self, window: Duration) -> Self {
        self.error_window = window;
        self
    }

    /// Attempt to drain the full current queue contents
    ///
    /// No-op while another drain is in flight. There is no mid-drain
    /// cancellation: a triggered drain runs to completion (success or
    /// transport failure) before a new trigger is accepted.
    pub async fn trigger(&self) -> QueueResult<TriggerOutcome> {
        let Ok(_guard) = self.drain_lock.try_lock() else {
            return Ok(TriggerOutcome::AlreadyDraining);
        };

        let pending = self.queue.list_pending()?;
        if pending.is_empty() {
            return Ok(TriggerOutcome::Idle);
        }

        let batch = SyncBatch {
            device_id: self.device_id.clone(),
            items: pending
                .iter()
                .map(|entry| SyncItem {
                    client_uuid: entry.token.clone(),
                    trip: entry.trip.clone(),
                })
                .collect(),
            sent_at: now_millis(),
        };

        tracing::debug!(items = batch.items.len(), "Draining submission queue");

        let response = match self.remote.sync_batch(&batch).await {
            Ok(response) => {
                self.clear_transport_error();
                response
            }
            Err(e) => {
                tracing::warn!("Batch sync failed in transit, queue unchanged: {e}");
                self.record_transport_error(e.to_string());
                return Ok(TriggerOutcome::TransportFailed);
            }
        };

        let mut confirmed: HashSet<String> = HashSet::new();
        let mut failed = 0usize;

        for result in &response.results {
            match result.status {
                SyncItemStatus::Created | SyncItemStatus::Existing => {
                    if let Some(token) = &result.client_uuid {
                        confirmed.insert(token.clone());
                    } else {
                        tracing::warn!(
                            status = ?result.status,
                            server_id = result.server_id,
                            "Sync result without token echo, entry retained"
                        );
                    }
                }
                SyncItemStatus::CreatedNoUuid => {
                    // Legacy path: success for removal only when the server
                    // echoed which token it was. Without the echo we cannot
                    // know which entry it confirms, so nothing is removed.
                    if let Some(token) = &result.client_uuid {
                        confirmed.insert(token.clone());
                    } else {
                        tracing::warn!(
                            server_id = result.server_id,
                            "created_no_uuid without token echo, entry retained"
                        );
                    }
                }
                SyncItemStatus::Failed => {
                    if let Some(token) = &result.client_uuid {
                        let message = result.error.clone().unwrap_or_else(|| {
                            "Rejected by remote service".to_string()
                        });
                        if self.queue.mark_failed(token, message)? {
                            failed += 1;
                        }
                    }
                }
            }
        }

        let removed = self.queue.remove_by_tokens(&confirmed)?;
        let report = SyncReport {
            removed,
            failed,
            remaining: self.queue.depth(),
        };

        tracing::info!(
            removed = report.removed,
            failed = report.failed,
            remaining = report.remaining,
            "Queue drain complete"
        );

        Ok(TriggerOutcome::Drained(report))
    }

    /// Current queue depth (convenience for trigger decisions)
    pub fn queue_depth(&self) -> usize {
        self.queue.depth()
    }

    /// The transient transport error from the last failed drain, if it is
    /// still within its display window
    pub fn last_transport_error(&self) -> Option<String> {
        let guard = self.transport_error.lock().expect("transport error lock");
        guard
            .as_ref()
            .filter(|e| e.expires_at > now_millis())
            .map(|e| e.message.clone())
    }

    fn record_transport_error(&self, message: String) {
        let mut guard = self.transport_error.lock().expect("transport error lock");
        *guard = Some(TransientError {
            message,
            expires_at: now_millis() + self.error_window.as_millis() as i64,
        });
    }

    fn clear_transport_error(&self) {
        let mut guard = self.transport_error.lock().expect("transport error lock");
        *guard = None;
    }
}
