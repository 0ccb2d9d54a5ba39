//! Shared types for the Turno field data-collection client
//!
//! Common types used across the client core and any front end:
//! trip-record and shift models, the batch-sync wire protocol and
//! small time utilities.

pub mod models;
pub mod sync;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use models::{
    PaymentMethod, Shift, ShiftClose, ShiftCreate, ShiftEdit, ShiftStatus, TripCategory,
    TripCreate, TripRecord,
};
pub use sync::{SyncBatch, SyncBatchResponse, SyncItem, SyncItemResult, SyncItemStatus, SyncReport};
