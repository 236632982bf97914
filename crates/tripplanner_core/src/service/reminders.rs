//! Upcoming-activity reminders.
//!
//! # Invariants
//! - An item is due when it starts within `[now, now + REMINDER_WINDOW_HOURS]`.
//! - Reminders are ordered by start time; events before flights on ties.

use crate::model::event::Event;
use crate::model::flight::Flight;
use crate::model::trip::TripId;
use crate::repo::child_repo::SqliteChildRepository;
use crate::repo::{RepoError, RepoResult};
use crate::service::trip_service::TripService;
use chrono::{Duration, NaiveDateTime};

/// How far ahead reminders look.
pub const REMINDER_WINDOW_HOURS: i64 = 24;

/// Something starting soon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reminder {
    Event(Event),
    Flight(Flight),
}

impl Reminder {
    pub fn starts_at(&self) -> NaiveDateTime {
        match self {
            Self::Event(event) => event.start_time,
            Self::Flight(flight) => flight.departure_time,
        }
    }

    pub fn trip_id(&self) -> TripId {
        match self {
            Self::Event(event) => event.trip_id,
            Self::Flight(flight) => flight.trip_id,
        }
    }

    /// Short line suitable for a notification.
    pub fn title(&self) -> String {
        match self {
            Self::Event(event) => format!("{} at {}", event.title, event.start_time.format("%H:%M")),
            Self::Flight(flight) => format!(
                "Flight {} {} departs at {}",
                flight.airline,
                flight.flight_number,
                flight.departure_time.format("%H:%M")
            ),
        }
    }
}

impl TripService {
    /// Events and flights across all trips that start within the reminder
    /// window from `now`.
    pub async fn due_reminders(&self, now: NaiveDateTime) -> RepoResult<Vec<Reminder>> {
        let until = now + Duration::hours(REMINDER_WINDOW_HOURS);
        let (events, flights) = self
            .store()
            .read(|conn| {
                let repo = SqliteChildRepository::new(conn);
                let events = repo.list_starting_between::<Event>(now, until)?;
                let flights = repo.list_starting_between::<Flight>(now, until)?;
                Ok::<_, RepoError>((events, flights))
            })
            .await?;

        let mut reminders: Vec<Reminder> = events
            .into_iter()
            .map(Reminder::Event)
            .chain(flights.into_iter().map(Reminder::Flight))
            .collect();
        // Stable sort keeps events ahead of flights at the same instant.
        reminders.sort_by_key(Reminder::starts_at);
        Ok(reminders)
    }
}
