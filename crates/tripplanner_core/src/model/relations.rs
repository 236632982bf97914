//! Read-only trip aggregate.
//!
//! # Invariants
//! - Every child collection belongs to `trip.trip_id`.
//! - Built in one store read, so it never mixes two store states.

use super::accommodation::Accommodation;
use super::car_share::CarSharing;
use super::event::Event;
use super::flight::Flight;
use super::note::Note;
use super::trip::Trip;
use serde::{Deserialize, Serialize};

/// A trip joined with all of its child collections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripWithRelations {
    pub trip: Trip,
    pub events: Vec<Event>,
    pub accommodations: Vec<Accommodation>,
    pub flights: Vec<Flight>,
    pub car_shares: Vec<CarSharing>,
    /// Newest first.
    pub notes: Vec<Note>,
}

impl TripWithRelations {
    /// Total number of child rows across all collections.
    pub fn child_count(&self) -> usize {
        self.events.len()
            + self.accommodations.len()
            + self.flights.len()
            + self.car_shares.len()
            + self.notes.len()
    }
}
