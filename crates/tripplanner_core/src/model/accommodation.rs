//! Lodging booked for a trip.

use super::trip::TripId;
use super::UNASSIGNED_ID;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub type AccommodationId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Accommodation {
    pub accommodation_id: AccommodationId,
    pub name: String,
    pub address: String,
    pub check_in: NaiveDateTime,
    pub check_out: NaiveDateTime,
    pub price: Decimal,
    pub contact: String,
    pub trip_id: TripId,
}

impl Accommodation {
    pub fn new(
        trip_id: TripId,
        name: impl Into<String>,
        address: impl Into<String>,
        check_in: NaiveDateTime,
        check_out: NaiveDateTime,
        price: Decimal,
    ) -> Self {
        Self {
            accommodation_id: UNASSIGNED_ID,
            name: name.into(),
            address: address.into(),
            check_in,
            check_out,
            price,
            contact: String::new(),
            trip_id,
        }
    }
}
