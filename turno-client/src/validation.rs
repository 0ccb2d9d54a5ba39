//! Trip payload validation
//!
//! Runs before any network attempt or queue interaction; an invalid trip is
//! rejected synchronously and never enqueued.

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use shared::models::{Shift, TripCategory, TripCreate};
use thiserror::Error;

// ── Text length limits ──────────────────────────────────────────────

/// Origin / destination free text
pub const MAX_PLACE_LEN: usize = 200;

/// Validation error taxonomy - caught before any network attempt,
/// reported to the user, never enqueued
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("{field} is too long ({len} chars, max {max})")]
    TooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("Invalid date format: {0} (expected YYYY-MM-DD)")]
    InvalidDate(String),

    #[error("Invalid time format: {0} (expected HH:MM)")]
    InvalidTime(String),

    #[error("Fare must be positive")]
    NonPositiveFare,

    #[error("Waiting fee cannot be negative")]
    NegativeWaitingFee,

    #[error("Distance cannot be negative")]
    NegativeDistance,

    #[error("Corporate trips require a company reference")]
    MissingCompany,

    #[error("Odometer start and end must be given together")]
    OdometerPairIncomplete,

    #[error("Odometer end {end} is less than start {start}")]
    OdometerDecreasing { start: u32, end: u32 },

    #[error("A trip on a different vehicle requires odometer start and end")]
    MissingVehicleOdometer,
}

pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validate a required string is non-empty and within the length limit
fn validate_required_text(
    value: &str,
    field: &'static str,
    max_len: usize,
) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Empty(field));
    }
    if value.len() > max_len {
        return Err(ValidationError::TooLong {
            field,
            len: value.len(),
            max: max_len,
        });
    }
    Ok(())
}

/// Parse a YYYY-MM-DD date
pub fn parse_date(date: &str) -> ValidationResult<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| ValidationError::InvalidDate(date.to_string()))
}

/// Parse a HH:MM or HH:MM:SS time
pub fn parse_time(time: &str) -> ValidationResult<NaiveTime> {
    NaiveTime::parse_from_str(time, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M"))
        .map_err(|_| ValidationError::InvalidTime(time.to_string()))
}

/// Validate a trip payload against the shift it will be logged under
///
/// Invariants checked:
/// - fare > 0, waiting fee >= 0, distance >= 0 when present
/// - corporate trips carry a company reference
/// - odometer fields come as a complete pair with end >= start
/// - a vehicle other than the shift's vehicle-of-record requires the
///   odometer pair for that vehicle
pub fn validate_trip(trip: &TripCreate, shift: &Shift) -> ValidationResult<()> {
    validate_required_text(&trip.origin, "origin", MAX_PLACE_LEN)?;
    validate_required_text(&trip.destination, "destination", MAX_PLACE_LEN)?;
    parse_date(&trip.date)?;
    parse_time(&trip.time)?;

    if trip.fare <= Decimal::ZERO {
        return Err(ValidationError::NonPositiveFare);
    }
    if trip.waiting_fee < Decimal::ZERO {
        return Err(ValidationError::NegativeWaitingFee);
    }
    if let Some(distance) = trip.distance_km
        && distance < 0.0
    {
        return Err(ValidationError::NegativeDistance);
    }

    if trip.category == TripCategory::Corporate && trip.company_id.is_none() {
        return Err(ValidationError::MissingCompany);
    }

    // Odometer pair: all-or-nothing, monotonic
    match (trip.odometer_start, trip.odometer_end) {
        (Some(start), Some(end)) if end < start => {
            return Err(ValidationError::OdometerDecreasing { start, end });
        }
        (Some(_), None) | (None, Some(_)) => {
            return Err(ValidationError::OdometerPairIncomplete);
        }
        _ => {}
    }

    // Vehicle-change rule: an override vehicle must carry its own odometer
    // readings. Using the shift's own vehicle is not an override.
    if let Some(vehicle_id) = trip.vehicle_id
        && vehicle_id != shift.vehicle_id
        && trip.odometer_start.is_none()
    {
        return Err(ValidationError::MissingVehicleOdometer);
    }

    Ok(())
}
