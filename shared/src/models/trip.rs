//! Trip Record Model
//!
//! One completed fare-generating trip logged against an open shift.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Trip category - who the trip is billed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TripCategory {
    /// Billed to a company account (requires a company reference)
    #[serde(rename = "CORPORATE")]
    Corporate,
    /// Paid directly by the passenger
    #[serde(rename = "PRIVATE")]
    Private,
}

/// Payment method for a trip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[serde(rename = "CASH")]
    Cash,
    #[serde(rename = "CARD")]
    Card,
    #[serde(rename = "PIX")]
    Pix,
    /// Invoiced to the company at settlement (corporate trips)
    #[serde(rename = "INVOICED")]
    Invoiced,
}

/// Trip record as stored on the remote service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripRecord {
    pub id: i64,
    /// Owning shift
    pub shift_id: i64,
    /// Trip date (YYYY-MM-DD)
    pub date: String,
    /// Trip time (HH:MM)
    pub time: String,
    pub origin: String,
    pub destination: String,
    /// Fare amount, must be positive
    pub fare: Decimal,
    /// Waiting fee, zero when none was charged
    pub waiting_fee: Decimal,
    /// Distance driven in km
    pub distance_km: Option<f64>,
    pub category: TripCategory,
    /// Company reference, mandatory for corporate trips
    pub company_id: Option<i64>,
    pub payment: PaymentMethod,
    /// Vehicle used when it differs from the shift's vehicle-of-record
    pub vehicle_id: Option<i64>,
    /// Odometer pair for the overriding vehicle
    pub odometer_start: Option<u32>,
    pub odometer_end: Option<u32>,
    pub created_at: Option<i64>,
}

/// Create trip payload
///
/// `shift_id` is stamped by the submission pipeline from the active shift,
/// never supplied by the originating screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripCreate {
    /// Trip date (YYYY-MM-DD)
    pub date: String,
    /// Trip time (HH:MM)
    pub time: String,
    pub origin: String,
    pub destination: String,
    pub fare: Decimal,
    #[serde(default)]
    pub waiting_fee: Decimal,
    pub distance_km: Option<f64>,
    pub category: TripCategory,
    pub company_id: Option<i64>,
    pub payment: PaymentMethod,
    /// Owning shift, stamped by the pipeline
    pub shift_id: Option<i64>,
    /// Vehicle override - only when the trip used a different vehicle
    pub vehicle_id: Option<i64>,
    pub odometer_start: Option<u32>,
    pub odometer_end: Option<u32>,
}

impl TripCreate {
    /// Whether this trip was driven with a vehicle other than the
    /// shift's vehicle-of-record.
    pub fn has_vehicle_override(&self) -> bool {
        self.vehicle_id.is_some()
    }
}
