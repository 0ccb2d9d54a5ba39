//! Local durable submission queue
//!
//! A persistent, append-only store of not-yet-confirmed submissions. Entries
//! are created on any submission failure (online or offline) and removed only
//! when the sync engine receives server confirmation for their token. The
//! queue holds no business logic; it guarantees FIFO order, durability across
//! restarts and that every exposed entry carries a valid idempotency token.

pub mod storage;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;
use tokio::sync::watch;

use crate::token;
use shared::models::TripCreate;
use shared::util::now_millis;

pub use storage::{QueueStorage, StorageError, StorageResult};

/// Queue entry status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueueEntryStatus {
    /// Awaiting its first (or next) drain
    #[serde(rename = "pending")]
    Pending,
    /// Rejected per-item by the server; retained with its error message and
    /// retried on the next trigger
    #[serde(rename = "failed")]
    Failed,
}

/// A persisted, not-yet-confirmed submission awaiting remote acknowledgment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueEntry {
    /// Idempotency token, stable for the life of the entry
    ///
    /// Defaults to empty on deserialization so legacy entries persisted
    /// without a token still load; the repair pass assigns them one before
    /// any caller sees the queue.
    #[serde(default)]
    pub token: String,
    pub trip: TripCreate,
    pub status: QueueEntryStatus,
    /// Error message from the last per-item rejection
    pub last_error: Option<String>,
    pub enqueued_at: i64,
}

/// Queue errors
#[derive(Debug, Error)]
pub enum QueueError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Invalid idempotency token: {0:?}")]
    InvalidToken(String),
}

pub type QueueResult<T> = Result<T, QueueError>;

/// Durable submission queue with an observable depth
///
/// Cloning shares the underlying store and depth channel.
#[derive(Clone)]
pub struct SubmissionQueue {
    storage: QueueStorage,
    depth_tx: watch::Sender<usize>,
}

impl SubmissionQueue {
    /// Open (or create) the queue at the given path
    ///
    /// Runs the load-time repair pass before returning: any persisted entry
    /// without a valid token is assigned a fresh one and written back, so
    /// callers never observe an untokenized entry. Repair never drops data.
    pub fn open(path: impl AsRef<Path>) -> QueueResult<Self> {
        Self::with_storage(QueueStorage::open(path)?)
    }

    /// Open an in-memory queue (tests)
    pub fn open_in_memory() -> QueueResult<Self> {
        Self::with_storage(QueueStorage::open_in_memory()?)
    }

    /// Wrap an already-open storage, running the repair pass
    pub fn with_storage(storage: QueueStorage) -> QueueResult<Self> {
        let repaired = Self::repair(&storage)?;
        if repaired > 0 {
            tracing::info!(repaired, "Assigned tokens to legacy queue entries");
        }

        let depth = storage.len()?;
        let (depth_tx, _) = watch::channel(depth);
        Ok(Self { storage, depth_tx })
    }

    /// Assign valid tokens to entries that lack one; returns how many were
    /// fixed. Idempotent: a second pass over a repaired queue changes nothing.
    fn repair(storage: &QueueStorage) -> QueueResult<usize> {
        let mut repaired = 0;
        for (seq, mut entry) in storage.load_all()? {
            if !token::is_valid_token(&entry.token) {
                entry.token = token::new_token();
                storage.overwrite(seq, &entry)?;
                repaired += 1;
            }
        }
        Ok(repaired)
    }

    /// Append a submission at the tail of the queue
    pub fn enqueue(
        &self,
        trip: TripCreate,
        token: &str,
        status: QueueEntryStatus,
        last_error: Option<String>,
    ) -> QueueResult<()> {
        if !token::is_valid_token(token) {
            return Err(QueueError::InvalidToken(token.to_string()));
        }

        let entry = QueueEntry {
            token: token.to_string(),
            trip,
            status,
            last_error,
            enqueued_at: now_millis(),
        };
        self.storage.append(&entry)?;
        self.publish_depth()?;
        Ok(())
    }

    /// All queued entries in enqueue (FIFO) order
    ///
    /// Failed entries are included: per-item rejections stay queued and are
    /// retried on the next drain.
    pub fn list_pending(&self) -> QueueResult<Vec<QueueEntry>> {
        Ok(self
            .storage
            .load_all()?
            .into_iter()
            .map(|(_, entry)| entry)
            .collect())
    }

    /// Remove every entry whose token the server confirmed
    pub fn remove_by_tokens(&self, tokens: &HashSet<String>) -> QueueResult<usize> {
        if tokens.is_empty() {
            return Ok(0);
        }

        let seqs: Vec<u64> = self
            .storage
            .load_all()?
            .into_iter()
            .filter(|(_, entry)| tokens.contains(&entry.token))
            .map(|(seq, _)| seq)
            .collect();

        let removed = self.storage.remove(&seqs)?;
        self.publish_depth()?;
        Ok(removed)
    }

    /// Attach a per-item rejection message to an entry, keeping it queued
    ///
    /// Returns false when no entry carries the token (already removed by an
    /// earlier drain, for instance).
    pub fn mark_failed(&self, token: &str, error: impl Into<String>) -> QueueResult<bool> {
        let error = error.into();
        for (seq, mut entry) in self.storage.load_all()? {
            if entry.token == token {
                entry.status = QueueEntryStatus::Failed;
                entry.last_error = Some(error);
                self.storage.overwrite(seq, &entry)?;
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Current queue depth
    pub fn depth(&self) -> usize {
        *self.depth_tx.borrow()
    }

    /// Subscribe to depth changes (UI badge counts)
    pub fn subscribe_depth(&self) -> watch::Receiver<usize> {
        self.depth_tx.subscribe()
    }

    fn publish_depth(&self) -> QueueResult<()> {
        let depth = self.storage.len()?;
        self.depth_tx.send_replace(depth);
        Ok(())
    }
}
