//! Trip submission pipeline
//!
//! One entry point for recording a trip, online or offline. The attempt
//! carries an idempotency token assigned once, before the first network
//! attempt, so retries and the queued fallback all present the same token
//! to the server.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Notify;

use crate::connectivity::Connectivity;
use crate::queue::{QueueEntryStatus, QueueError, SubmissionQueue};
use crate::remote::RemoteService;
use crate::shifts::{ShiftError, ShiftManager};
use crate::token;
use crate::validation::{self, ValidationError};
use shared::models::{TripCreate, TripRecord};

/// A trip submission with its idempotency token
///
/// Construct one per user action. Retrying a failed submission reuses the
/// same attempt; building a new attempt means a new token and, to the
/// server, a new trip.
#[derive(Debug, Clone)]
pub struct SubmissionAttempt {
    trip: TripCreate,
    token: String,
}

impl SubmissionAttempt {
    pub fn new(trip: TripCreate) -> Self {
        Self {
            trip,
            token: token::new_token(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn trip(&self) -> &TripCreate {
        &self.trip
    }
}

/// What happened to a submission
#[derive(Debug, Clone)]
pub enum SubmitOutcome {
    /// Confirmed by the server during this call
    Created(TripRecord),
    /// Persisted locally; the sync engine will deliver it
    Queued { token: String },
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Shift(#[from] ShiftError),

    #[error(transparent)]
    Queue(#[from] QueueError),
}

pub type SubmitResult<T> = Result<T, SubmitError>;

/// Online-first trip submission with a durable offline fallback
pub struct SubmissionService {
    shifts: Arc<ShiftManager>,
    queue: SubmissionQueue,
    remote: Arc<dyn RemoteService>,
    connectivity: Connectivity,
    /// Wakes the sync worker after an enqueue or a direct success
    sync_nudge: Arc<Notify>,
}

impl SubmissionService {
    pub fn new(
        shifts: Arc<ShiftManager>,
        queue: SubmissionQueue,
        remote: Arc<dyn RemoteService>,
        connectivity: Connectivity,
        sync_nudge: Arc<Notify>,
    ) -> Self {
        Self {
            shifts,
            queue,
            remote,
            connectivity,
            sync_nudge,
        }
    }

    /// Submit a trip record
    ///
    /// Gate order: open shift, then payload validation, then delivery. A
    /// trip that fails either gate is rejected synchronously and never
    /// enqueued. Delivery tries the direct endpoint while online; any
    /// failure there (transient or rejection) falls back to the queue so
    /// the entry is retried with the same token.
    pub async fn submit(&self, attempt: &SubmissionAttempt) -> SubmitResult<SubmitOutcome> {
        let shift = self.shifts.require_open().await?;

        let mut trip = attempt.trip.clone();
        trip.shift_id = shift.id;
        validation::validate_trip(&trip, &shift)?;

        if !self.connectivity.is_online() {
            return self.enqueue(trip, attempt.token(), QueueEntryStatus::Pending, None);
        }

        match self.remote.create_trip(&trip, attempt.token()).await {
            Ok(record) => {
                tracing::info!(trip_id = record.id, "Trip recorded online");
                // Opportunistic drain: a working connection is a good moment
                // to flush anything still queued
                if self.queue.depth() > 0 {
                    self.sync_nudge.notify_one();
                }
                Ok(SubmitOutcome::Created(record))
            }
            Err(e) if e.is_transient() => {
                tracing::warn!("Direct submission failed in transit, queuing: {e}");
                self.enqueue(trip, attempt.token(), QueueEntryStatus::Pending, None)
            }
            Err(e) => {
                // A rejection of the direct call still lands in the queue;
                // the operator can correct server-side state and retry
                tracing::warn!("Direct submission rejected, queuing: {e}");
                self.enqueue(
                    trip,
                    attempt.token(),
                    QueueEntryStatus::Failed,
                    Some(e.to_string()),
                )
            }
        }
    }

    fn enqueue(
        &self,
        trip: TripCreate,
        token: &str,
        status: QueueEntryStatus,
        last_error: Option<String>,
    ) -> SubmitResult<SubmitOutcome> {
        self.queue.enqueue(trip, token, status, last_error)?;
        tracing::info!(depth = self.queue.depth(), "Trip queued for sync");
        if self.connectivity.is_online() {
            self.sync_nudge.notify_one();
        }
        Ok(SubmitOutcome::Queued {
            token: token.to_string(),
        })
    }
}
