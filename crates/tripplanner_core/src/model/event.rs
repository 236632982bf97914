//! Scheduled activity within a trip.

use super::trip::TripId;
use super::UNASSIGNED_ID;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

pub type EventId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub event_id: EventId,
    pub title: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    /// Free-form category chosen in the event form (e.g. `tour`, `dinner`).
    pub event_type: String,
    pub trip_id: TripId,
}

impl Event {
    pub fn new(
        trip_id: TripId,
        title: impl Into<String>,
        start_time: NaiveDateTime,
        end_time: NaiveDateTime,
        event_type: impl Into<String>,
    ) -> Self {
        Self {
            event_id: UNASSIGNED_ID,
            title: title.into(),
            start_time,
            end_time,
            event_type: event_type.into(),
            trip_id,
        }
    }
}
