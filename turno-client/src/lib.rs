//! Turno Client - offline-first field data-collection core
//!
//! # Architecture overview
//!
//! The core of the client is the idempotent submission pipeline and the
//! shift lifecycle state machine that gates it:
//!
//! - **Token generator** (`token`): one unique idempotency token per
//!   submission attempt, stable across retries
//! - **Durable queue** (`queue`): embedded redb store of not-yet-confirmed
//!   submissions, survives process restarts
//! - **Sync engine** (`sync`): drains the queue against the remote batch
//!   endpoint and reconciles per-item outcomes
//! - **Shift manager** (`shifts`): guarded open → closed → settled
//!   transitions, gates trip-record creation
//! - **Submission service** (`submit`): online-or-enqueue pipeline tying
//!   the pieces together
//!
//! # Module structure
//!
//! ```text
//! turno-client/src/
//! ├── config.rs       # env-driven configuration
//! ├── logger.rs       # tracing setup
//! ├── token.rs        # idempotency tokens
//! ├── validation.rs   # trip payload validation
//! ├── connectivity.rs # reachability signal
//! ├── queue/          # durable submission queue (redb)
//! ├── remote/         # remote service boundary (trait + reqwest impl)
//! ├── sync/           # drain engine + background worker
//! ├── shifts/         # lifecycle transitions + manager
//! └── submit.rs       # submission pipeline
//! ```

pub mod config;
pub mod connectivity;
pub mod logger;
pub mod queue;
pub mod remote;
pub mod shifts;
pub mod submit;
pub mod sync;
pub mod token;
pub mod validation;

// Re-export public types
pub use config::Config;
pub use connectivity::Connectivity;
pub use queue::{QueueEntry, QueueEntryStatus, QueueError, SubmissionQueue};
pub use remote::{RemoteError, RemoteResult, RemoteService};
pub use shifts::{ShiftError, ShiftManager, ShiftResult};
pub use submit::{SubmissionAttempt, SubmissionService, SubmitError, SubmitOutcome};
pub use sync::{SyncEngine, SyncWorker, TriggerOutcome};
pub use validation::ValidationError;

// Re-export logger functions
pub use logger::{init_logger, init_logger_with_file};
