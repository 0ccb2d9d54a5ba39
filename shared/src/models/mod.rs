//! Data models
//!
//! Shared between the client core and the front end (via API).
//! All server-assigned IDs are `i64`.

pub mod shift;
pub mod trip;

// Re-exports
pub use shift::*;
pub use trip::*;
