//! Queue drain and background sync
//!
//! The engine owns the drain algorithm (batch build, reconcile, remove);
//! the worker wires it to connectivity changes, manual retries and shutdown.

pub mod engine;
pub mod worker;

pub use engine::{SyncEngine, TriggerOutcome};
pub use worker::SyncWorker;
