//! Shift (turno) lifecycle
//!
//! An explicit state machine over open → closed → settled, with guarded
//! transition functions instead of free-form flag writes. The manager owns
//! all shift state transitions; aggregates stay authoritative on the remote
//! service and are refreshed by re-fetch, never recomputed locally.

pub mod error;
pub mod manager;
pub mod transitions;

pub use error::{ShiftError, ShiftResult};
pub use manager::ShiftManager;
