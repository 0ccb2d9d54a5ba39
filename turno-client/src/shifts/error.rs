//! Shift lifecycle errors

use shared::models::ShiftStatus;
use thiserror::Error;

use crate::remote::RemoteError;

/// Lifecycle-precondition and transition errors
///
/// All of these are rejected synchronously, before any queue interaction,
/// and are never retried automatically.
#[derive(Debug, Error)]
pub enum ShiftError {
    #[error("Operator {0} already has an open shift")]
    AlreadyOpen(i64),

    #[error("No open shift; start a shift before logging trips")]
    NoOpenShift,

    #[error("Cannot {action} a shift in state {from:?}")]
    InvalidTransition {
        from: ShiftStatus,
        action: &'static str,
    },

    #[error("End odometer {end} is less than start odometer {start}")]
    OdometerDecreasing { start: u32, end: u32 },

    #[error("Invalid time format: {0} (expected HH:MM)")]
    InvalidTime(String),

    #[error("Invalid date format: {0} (expected YYYY-MM-DD)")]
    InvalidDate(String),

    #[error("Shift has no server id yet")]
    MissingId,

    #[error("Shift {0} not found")]
    NotFound(i64),

    #[error("Shift deletion cascades to its trip records and requires explicit confirmation")]
    Unconfirmed,

    #[error(transparent)]
    Remote(#[from] RemoteError),
}

pub type ShiftResult<T> = Result<T, ShiftError>;
