//! redb-based storage layer for the submission queue
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `queue_entries` | enqueue sequence (`u64`) | `QueueEntry` (JSON) | FIFO queue (append-only) |
//! | `meta` | `&str` | `u64` | Enqueue sequence counter |
//!
//! # Durability
//!
//! redb uses `Durability::Immediate` by default: commits are persistent as
//! soon as `commit()` returns, with copy-on-write and atomic pointer swap.
//! The queue must survive process restarts and sudden power loss on devices
//! in the field, so every mutation commits before returning.

use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use super::QueueEntry;

/// Queue entries: key = enqueue sequence, value = JSON-serialized QueueEntry
const QUEUE_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("queue_entries");

/// Metadata: key = "enqueue_seq", value = last assigned sequence
const META_TABLE: TableDefinition<&str, u64> = TableDefinition::new("meta");

const SEQ_KEY: &str = "enqueue_seq";

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Submission queue storage backed by redb
#[derive(Clone)]
pub struct QueueStorage {
    db: Arc<Database>,
}

impl QueueStorage {
    /// Open or create the database at the given path
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        Self::init(db)
    }

    /// Open an in-memory database (tests and throwaway stores)
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> StorageResult<Self> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(QUEUE_TABLE)?;
            let mut meta = write_txn.open_table(META_TABLE)?;
            if meta.get(SEQ_KEY)?.is_none() {
                meta.insert(SEQ_KEY, 0u64)?;
            }
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Append an entry at the tail of the queue, returning its sequence
    pub fn append(&self, entry: &QueueEntry) -> StorageResult<u64> {
        let txn = self.db.begin_write()?;
        let seq;
        {
            seq = self.next_sequence(&txn)?;
            let mut table = txn.open_table(QUEUE_TABLE)?;
            let value = serde_json::to_vec(entry)?;
            table.insert(seq, value.as_slice())?;
        }
        txn.commit()?;
        Ok(seq)
    }

    /// Increment and return the enqueue sequence (within transaction)
    fn next_sequence(&self, txn: &redb::WriteTransaction) -> StorageResult<u64> {
        let mut meta = txn.open_table(META_TABLE)?;
        let current = meta.get(SEQ_KEY)?.map(|g| g.value()).unwrap_or(0);
        let next = current + 1;
        meta.insert(SEQ_KEY, next)?;
        Ok(next)
    }

    /// Load all entries in enqueue (FIFO) order
    pub fn load_all(&self) -> StorageResult<Vec<(u64, QueueEntry)>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(QUEUE_TABLE)?;

        let mut entries = Vec::new();
        for result in table.iter()? {
            let (key, value) = result?;
            let entry: QueueEntry = serde_json::from_slice(value.value())?;
            entries.push((key.value(), entry));
        }
        // redb iterates u64 keys in ascending order already; keep the sort
        // as an explicit guarantee of FIFO-by-enqueue semantics
        entries.sort_by_key(|(seq, _)| *seq);
        Ok(entries)
    }

    /// Overwrite the entry at a given sequence
    pub fn overwrite(&self, seq: u64, entry: &QueueEntry) -> StorageResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(QUEUE_TABLE)?;
            let value = serde_json::to_vec(entry)?;
            table.insert(seq, value.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    /// Remove entries by sequence, returning how many existed
    pub fn remove(&self, seqs: &[u64]) -> StorageResult<usize> {
        let txn = self.db.begin_write()?;
        let mut removed = 0;
        {
            let mut table = txn.open_table(QUEUE_TABLE)?;
            for seq in seqs {
                if table.remove(*seq)?.is_some() {
                    removed += 1;
                }
            }
        }
        txn.commit()?;
        Ok(removed)
    }

    /// Number of entries currently queued
    pub fn len(&self) -> StorageResult<usize> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(QUEUE_TABLE)?;
        Ok(table.len()? as usize)
    }

    pub fn is_empty(&self) -> StorageResult<bool> {
        Ok(self.len()? == 0)
    }
}
