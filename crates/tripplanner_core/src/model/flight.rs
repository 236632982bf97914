//! Flight leg booked for a trip.

use super::trip::TripId;
use super::UNASSIGNED_ID;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub type FlightId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flight {
    pub flight_id: FlightId,
    pub airline: String,
    pub departure_time: NaiveDateTime,
    pub arrival_time: NaiveDateTime,
    pub price: Decimal,
    pub flight_number: String,
    pub seat_number: String,
    pub trip_id: TripId,
}

impl Flight {
    pub fn new(
        trip_id: TripId,
        airline: impl Into<String>,
        flight_number: impl Into<String>,
        departure_time: NaiveDateTime,
        arrival_time: NaiveDateTime,
        price: Decimal,
    ) -> Self {
        Self {
            flight_id: UNASSIGNED_ID,
            airline: airline.into(),
            departure_time,
            arrival_time,
            price,
            flight_number: flight_number.into(),
            seat_number: String::new(),
            trip_id,
        }
    }
}
