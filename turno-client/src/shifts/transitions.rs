//! Guarded shift state transitions
//!
//! Pure functions over the shift model: every transition validates its
//! preconditions and returns a typed error instead of mutating on bad input.
//! The manager applies these locally before asking the remote service to do
//! the same, so invalid operations never leave the device.

use chrono::{NaiveDate, NaiveTime};
use shared::models::{Shift, ShiftClose, ShiftEdit, ShiftStatus};

use super::error::{ShiftError, ShiftResult};

pub(crate) fn parse_date(date: &str) -> ShiftResult<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| ShiftError::InvalidDate(date.to_string()))
}

pub(crate) fn parse_time(time: &str) -> ShiftResult<NaiveTime> {
    NaiveTime::parse_from_str(time, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M"))
        .map_err(|_| ShiftError::InvalidTime(time.to_string()))
}

/// Close an open shift
///
/// Preconditions: the shift is open, the end odometer did not go backwards
/// and the end time is a recognized time format.
pub fn close(shift: &mut Shift, req: &ShiftClose) -> ShiftResult<()> {
    if shift.status != ShiftStatus::Open {
        return Err(ShiftError::InvalidTransition {
            from: shift.status,
            action: "close",
        });
    }

    parse_date(&req.end_date)?;
    parse_time(&req.end_time)?;

    if req.end_odometer < shift.start_odometer {
        return Err(ShiftError::OdometerDecreasing {
            start: shift.start_odometer,
            end: req.end_odometer,
        });
    }

    shift.end_date = Some(req.end_date.clone());
    shift.end_time = Some(req.end_time.clone());
    shift.end_odometer = Some(req.end_odometer);
    shift.status = ShiftStatus::Closed;
    Ok(())
}

/// Mark a closed shift as settled
///
/// Only meaningful once closed; settling never reopens anything.
pub fn settle(shift: &mut Shift) -> ShiftResult<()> {
    if shift.status != ShiftStatus::Closed {
        return Err(ShiftError::InvalidTransition {
            from: shift.status,
            action: "settle",
        });
    }
    shift.status = ShiftStatus::Settled;
    Ok(())
}

/// Revert a settlement (administrative mistake correction)
///
/// Returns the shift to closed; it does NOT reopen it for new trip records.
pub fn unsettle(shift: &mut Shift) -> ShiftResult<()> {
    if shift.status != ShiftStatus::Settled {
        return Err(ShiftError::InvalidTransition {
            from: shift.status,
            action: "unsettle",
        });
    }
    shift.status = ShiftStatus::Closed;
    Ok(())
}

/// Apply a back-office correction
///
/// May rewrite timestamps, odometer values and the status directly, without
/// going through `close`. Still refuses edits that leave the odometer pair
/// decreasing or timestamps unparseable.
pub fn apply_edit(shift: &mut Shift, edit: &ShiftEdit) -> ShiftResult<()> {
    if let Some(date) = &edit.start_date {
        parse_date(date)?;
    }
    if let Some(time) = &edit.start_time {
        parse_time(time)?;
    }
    if let Some(date) = &edit.end_date {
        parse_date(date)?;
    }
    if let Some(time) = &edit.end_time {
        parse_time(time)?;
    }

    // Validate the odometer pair as it would look after the edit
    let start = edit.start_odometer.unwrap_or(shift.start_odometer);
    let end = edit.end_odometer.or(shift.end_odometer);
    if let Some(end) = end
        && end < start
    {
        return Err(ShiftError::OdometerDecreasing { start, end });
    }

    if let Some(date) = &edit.start_date {
        shift.start_date = date.clone();
    }
    if let Some(time) = &edit.start_time {
        shift.start_time = Some(time.clone());
    }
    if let Some(odometer) = edit.start_odometer {
        shift.start_odometer = odometer;
    }
    if let Some(date) = &edit.end_date {
        shift.end_date = Some(date.clone());
    }
    if let Some(time) = &edit.end_time {
        shift.end_time = Some(time.clone());
    }
    if let Some(odometer) = edit.end_odometer {
        shift.end_odometer = Some(odometer);
    }
    if let Some(status) = edit.status {
        shift.status = status;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn open_shift(start_odometer: u32) -> Shift {
        Shift {
            id: Some(1),
            operator_id: 1,
            vehicle_id: 10,
            status: ShiftStatus::Open,
            start_date: "2026-03-14".to_string(),
            start_time: Some("06:00".to_string()),
            start_odometer,
            end_date: None,
            end_time: None,
            end_odometer: None,
            total_distance: 0.0,
            corporate_total: Decimal::ZERO,
            private_total: Decimal::ZERO,
            trip_count: 0,
            created_at: None,
            updated_at: None,
        }
    }

    fn close_req(end_odometer: u32) -> ShiftClose {
        ShiftClose {
            end_date: "2026-03-14".to_string(),
            end_time: "18:30".to_string(),
            end_odometer,
        }
    }

    #[test]
    fn test_close_rejects_decreasing_odometer() {
        let mut shift = open_shift(100);
        let err = close(&mut shift, &close_req(90)).unwrap_err();
        assert!(matches!(
            err,
            ShiftError::OdometerDecreasing { start: 100, end: 90 }
        ));
        // Rejected transition leaves the shift untouched
        assert_eq!(shift.status, ShiftStatus::Open);
        assert!(shift.end_odometer.is_none());
    }

    #[test]
    fn test_close_succeeds_with_increasing_odometer() {
        let mut shift = open_shift(100);
        close(&mut shift, &close_req(150)).unwrap();
        assert_eq!(shift.status, ShiftStatus::Closed);
        assert_eq!(shift.end_odometer, Some(150));
        assert_eq!(shift.end_time.as_deref(), Some("18:30"));
    }

    #[test]
    fn test_close_rejects_bad_time_format() {
        let mut shift = open_shift(100);
        let req = ShiftClose {
            end_date: "2026-03-14".to_string(),
            end_time: "6pm".to_string(),
            end_odometer: 150,
        };
        assert!(matches!(
            close(&mut shift, &req),
            Err(ShiftError::InvalidTime(_))
        ));
    }

    #[test]
    fn test_close_only_from_open() {
        let mut shift = open_shift(100);
        close(&mut shift, &close_req(150)).unwrap();
        let err = close(&mut shift, &close_req(160)).unwrap_err();
        assert!(matches!(
            err,
            ShiftError::InvalidTransition {
                from: ShiftStatus::Closed,
                action: "close"
            }
        ));
    }

    #[test]
    fn test_settle_unsettle_cycle() {
        let mut shift = open_shift(100);

        // Cannot settle while open
        assert!(matches!(
            settle(&mut shift),
            Err(ShiftError::InvalidTransition { .. })
        ));

        close(&mut shift, &close_req(150)).unwrap();
        settle(&mut shift).unwrap();
        assert_eq!(shift.status, ShiftStatus::Settled);

        // Settling twice is invalid
        assert!(matches!(
            settle(&mut shift),
            Err(ShiftError::InvalidTransition { .. })
        ));

        // Unsettle goes back to closed, not open
        unsettle(&mut shift).unwrap();
        assert_eq!(shift.status, ShiftStatus::Closed);
        assert!(!shift.status.accepts_trips());

        assert!(matches!(
            unsettle(&mut shift),
            Err(ShiftError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_edit_validates_resulting_odometer_pair() {
        let mut shift = open_shift(100);
        close(&mut shift, &close_req(150)).unwrap();

        // Raising the start above the recorded end must fail
        let edit = ShiftEdit {
            start_odometer: Some(200),
            ..Default::default()
        };
        assert!(matches!(
            apply_edit(&mut shift, &edit),
            Err(ShiftError::OdometerDecreasing { start: 200, end: 150 })
        ));
        assert_eq!(shift.start_odometer, 100);

        // A consistent pair is accepted, as is a direct status write
        let edit = ShiftEdit {
            start_odometer: Some(120),
            end_odometer: Some(180),
            status: Some(ShiftStatus::Settled),
            ..Default::default()
        };
        apply_edit(&mut shift, &edit).unwrap();
        assert_eq!(shift.start_odometer, 120);
        assert_eq!(shift.end_odometer, Some(180));
        assert_eq!(shift.status, ShiftStatus::Settled);
    }

    #[test]
    fn test_edit_rejects_bad_timestamp_formats() {
        let mut shift = open_shift(100);
        let edit = ShiftEdit {
            start_date: Some("14/03/2026".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            apply_edit(&mut shift, &edit),
            Err(ShiftError::InvalidDate(_))
        ));
    }
}
