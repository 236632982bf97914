//! Car-sharing rental attached to a trip.

use super::trip::TripId;
use super::UNASSIGNED_ID;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub type CarShareId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarSharing {
    pub car_share_id: CarShareId,
    pub provider_name: String,
    /// Human-entered period, e.g. `"Mon-Wed"`; not parsed by the core.
    pub rental_period: String,
    pub vehicle_info: String,
    pub price: Decimal,
    pub website: String,
    pub trip_id: TripId,
}

impl CarSharing {
    pub fn new(
        trip_id: TripId,
        provider_name: impl Into<String>,
        rental_period: impl Into<String>,
        price: Decimal,
    ) -> Self {
        Self {
            car_share_id: UNASSIGNED_ID,
            provider_name: provider_name.into(),
            rental_period: rental_period.into(),
            vehicle_info: String::new(),
            price,
            website: String::new(),
            trip_id,
        }
    }
}
