//! Batch sync protocol types
//!
//! Used by the client to push queued trip records to the remote service,
//! and to interpret the per-item results that come back.

use serde::{Deserialize, Serialize};

use crate::models::TripCreate;

/// A batch of pending submissions, sent in queue (FIFO) order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncBatch {
    /// Identifies the submitting device
    pub device_id: String,
    /// Pending items in enqueue order
    pub items: Vec<SyncItem>,
    /// Timestamp when the batch was sent (Unix millis)
    pub sent_at: i64,
}

/// One payload + idempotency token pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncItem {
    /// Client-generated idempotency token
    pub client_uuid: String,
    /// The trip payload
    pub trip: TripCreate,
}

/// Per-item outcome tag
///
/// A closed enum so every variant is handled at compile time; the wire
/// strings match the remote service's status field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncItemStatus {
    /// The record was created by this submission
    #[serde(rename = "created")]
    Created,
    /// The server recognized the token from a prior attempt; resubmission
    /// was a no-op success
    #[serde(rename = "existing")]
    Existing,
    /// The server rejected this item (business rule violation etc.)
    #[serde(rename = "failed")]
    Failed,
    /// Legacy server path: the record was created but the server could not
    /// associate the token. Counts as created for queue removal, but cannot
    /// be relied on for future dedup.
    #[serde(rename = "created_no_uuid")]
    CreatedNoUuid,
}

/// Result for one submitted item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncItemResult {
    /// Echo of the client token; legacy paths may omit it
    pub client_uuid: Option<String>,
    /// Server-assigned ID when a record exists
    pub server_id: Option<i64>,
    pub status: SyncItemStatus,
    /// Error message for failed items
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Response from the remote service after processing a batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncBatchResponse {
    pub results: Vec<SyncItemResult>,
}

/// Summary of one queue drain, for logging and the UI
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    /// Entries confirmed by the server and removed from the queue
    pub removed: usize,
    /// Entries rejected per-item and retained with their error text
    pub failed: usize,
    /// Queue depth after reconciliation
    pub remaining: usize,
}
