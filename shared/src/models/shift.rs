//! Shift Model (turno)
//!
//! A bounded work session for one operator/vehicle pair, within which
//! trip records are logged.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Shift lifecycle status
///
/// A closed enum instead of a closed/settled flag pair: `Settled` implies
/// the shift was closed, so the invalid `settled && !closed` combination
/// cannot be represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShiftStatus {
    /// Accepting trip records
    #[serde(rename = "OPEN")]
    Open,
    /// Operator ended the shift; no further trip records accepted
    #[serde(rename = "CLOSED")]
    Closed,
    /// Administratively reconciled (bookkeeping flag on a closed shift)
    #[serde(rename = "SETTLED")]
    Settled,
}

impl Default for ShiftStatus {
    fn default() -> Self {
        Self::Open
    }
}

impl ShiftStatus {
    /// Whether new trip records may be logged against the shift
    pub fn accepts_trips(&self) -> bool {
        matches!(self, Self::Open)
    }

    /// Whether the shift has been closed (settled shifts are closed too)
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed | Self::Settled)
    }
}

/// Shift record - represents one operator's work session
///
/// Aggregates (`total_distance`, `corporate_total`, `private_total`,
/// `trip_count`) are authoritative on the remote service and refreshed by
/// re-fetch, never recomputed locally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shift {
    pub id: Option<i64>,
    pub operator_id: i64,
    /// Vehicle-of-record for the shift
    pub vehicle_id: i64,
    pub status: ShiftStatus,
    /// Shift start date (YYYY-MM-DD)
    pub start_date: String,
    /// Wall-clock start time, assigned by the remote service
    pub start_time: Option<String>,
    pub start_odometer: u32,
    /// End date (YYYY-MM-DD), null while open
    pub end_date: Option<String>,
    /// End time (HH:MM), null while open
    pub end_time: Option<String>,
    pub end_odometer: Option<u32>,
    /// Total distance across associated trips (km)
    #[serde(default)]
    pub total_distance: f64,
    /// Sum of corporate trip fares
    #[serde(default)]
    pub corporate_total: Decimal,
    /// Sum of private trip fares
    #[serde(default)]
    pub private_total: Decimal,
    #[serde(default)]
    pub trip_count: u32,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
}

/// Create shift payload (start a work session)
///
/// Carries no wall-clock start time: the remote service assigns it to
/// avoid clock skew across devices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShiftCreate {
    pub operator_id: i64,
    pub vehicle_id: i64,
    /// Shift start date (YYYY-MM-DD)
    pub start_date: String,
    pub start_odometer: u32,
}

/// Close shift payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShiftClose {
    /// End date (YYYY-MM-DD)
    pub end_date: String,
    /// End time (HH:MM or HH:MM:SS)
    pub end_time: String,
    pub end_odometer: u32,
}

/// Administrative correction payload
///
/// Back-office tool: may rewrite timestamps, odometers and the status
/// directly, without going through `close()`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShiftEdit {
    pub start_date: Option<String>,
    pub start_time: Option<String>,
    pub start_odometer: Option<u32>,
    pub end_date: Option<String>,
    pub end_time: Option<String>,
    pub end_odometer: Option<u32>,
    pub status: Option<ShiftStatus>,
}
