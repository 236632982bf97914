//! Trip root aggregate record.
//!
//! # Invariants
//! - `stops` keeps insertion order and may contain duplicates.
//! - `start_date <= end_date` is checked by the editor workflow, not here.
//! - `archived` starts as `false`.

use super::user::UserId;
use super::UNASSIGNED_ID;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub type TripId = i64;

/// One planned journey.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trip {
    pub trip_id: TripId,
    pub name: String,
    pub departure_location: String,
    pub destination: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub description: String,
    pub participants: String,
    /// Ordered place names visited between departure and destination.
    pub stops: Vec<String>,
    pub user_id: Option<UserId>,
    pub archived: bool,
}

impl Trip {
    /// Creates an unsaved, active trip with empty optional fields.
    pub fn new(
        name: impl Into<String>,
        departure_location: impl Into<String>,
        destination: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Self {
        Self {
            trip_id: UNASSIGNED_ID,
            name: name.into(),
            departure_location: departure_location.into(),
            destination: destination.into(),
            start_date,
            end_date,
            description: String::new(),
            participants: String::new(),
            stops: Vec::new(),
            user_id: None,
            archived: false,
        }
    }

    /// Returns whether this trip has not been stored yet.
    pub fn is_new(&self) -> bool {
        self.trip_id == UNASSIGNED_ID
    }

    /// Returns whether the trip ended before `today`.
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        is_expired(self.end_date, today)
    }
}

/// A trip is expired once its end date lies strictly before `today`.
///
/// A trip ending today is still active.
pub fn is_expired(end_date: NaiveDate, today: NaiveDate) -> bool {
    end_date < today
}

#[cfg(test)]
mod tests {
    use super::{is_expired, Trip};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn expiry_is_strictly_before_today() {
        let today = date(2024, 6, 15);
        assert!(is_expired(date(2024, 6, 14), today));
        assert!(!is_expired(date(2024, 6, 15), today));
        assert!(!is_expired(date(2024, 6, 16), today));
    }

    #[test]
    fn new_trip_is_unsaved_and_active() {
        let trip = Trip::new("Alps", "Zurich", "Zermatt", date(2024, 1, 1), date(2024, 1, 10));
        assert!(trip.is_new());
        assert!(!trip.archived);
        assert!(trip.stops.is_empty());
        assert!(trip.is_expired(date(2024, 1, 11)));
    }
}
