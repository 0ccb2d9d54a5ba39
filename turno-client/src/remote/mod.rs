//! Remote service boundary
//!
//! The remote service is the authoritative store. The client talks to it
//! through the [`RemoteService`] trait so tests can substitute an in-memory
//! implementation; [`HttpRemote`] is the production reqwest-based one.

pub mod http;

use async_trait::async_trait;
use thiserror::Error;

use shared::models::{Shift, ShiftClose, ShiftCreate, ShiftEdit, ShiftStatus, TripCreate, TripRecord};
use shared::sync::{SyncBatch, SyncBatchResponse};

pub use http::HttpRemote;

/// Remote service errors, classified transient vs permanent at the boundary
///
/// Only transient failures feed the retry queue; permanent rejections are
/// surfaced for manual intervention so validation bugs never hide behind
/// "pending sync forever".
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Network unreachable, connect failure, timeout, or a 5xx from the
    /// server - retriable, never escalated to data loss
    #[error("Transport failure: {0}")]
    Transport(String),

    /// The server explicitly rejected the request (4xx business rule)
    #[error("Rejected by remote service ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The server answered with something the client cannot interpret
    #[error("Unexpected response from remote service: {0}")]
    Protocol(String),
}

impl RemoteError {
    /// Whether retrying the same request later may succeed
    ///
    /// Transport and protocol failures are transient (retries are safe, the
    /// idempotency token dedups them); explicit rejections are not.
    pub fn is_transient(&self) -> bool {
        match self {
            RemoteError::Transport(_) | RemoteError::Protocol(_) => true,
            RemoteError::Rejected { .. } => false,
        }
    }
}

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Authoritative remote store: idempotent single create, batch sync and the
/// shift endpoints
#[async_trait]
pub trait RemoteService: Send + Sync {
    /// Idempotent single create: repeated identical tokens are the same
    /// logical creation
    async fn create_trip(&self, trip: &TripCreate, token: &str) -> RemoteResult<TripRecord>;

    /// Batch-sync endpoint: per pair, a tagged result
    async fn sync_batch(&self, batch: &SyncBatch) -> RemoteResult<SyncBatchResponse>;

    /// Currently open shift for the operator, if any
    async fn active_shift(&self, operator_id: i64) -> RemoteResult<Option<Shift>>;

    async fn get_shift(&self, id: i64) -> RemoteResult<Option<Shift>>;

    /// Create a shift; the server assigns the wall-clock start time
    async fn create_shift(&self, data: &ShiftCreate) -> RemoteResult<Shift>;

    async fn close_shift(&self, id: i64, data: &ShiftClose) -> RemoteResult<Shift>;

    /// Administrative correction of shift fields
    async fn update_shift(&self, id: i64, data: &ShiftEdit) -> RemoteResult<Shift>;

    /// Toggle the settled bookkeeping flag on a closed shift
    async fn set_settled(&self, id: i64, settled: bool) -> RemoteResult<Shift>;

    async fn list_shifts(&self, status: Option<ShiftStatus>) -> RemoteResult<Vec<Shift>>;

    /// Delete a shift, cascading to its trip records
    async fn delete_shift(&self, id: i64) -> RemoteResult<()>;
}
