//! Free-text trip note with an optional photo reference.

use super::trip::TripId;
use super::UNASSIGNED_ID;
use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

pub type NoteId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub note_id: NoteId,
    pub content: String,
    /// Platform URI of an attached photo; the core never dereferences it.
    pub photo_uri: Option<String>,
    pub created_at: NaiveDateTime,
    pub trip_id: TripId,
}

impl Note {
    /// Creates an unsaved note stamped with the current local time.
    pub fn new(trip_id: TripId, content: impl Into<String>) -> Self {
        Self::created_at(trip_id, content, Local::now().naive_local())
    }

    /// Creates an unsaved note with an explicit creation time.
    pub fn created_at(
        trip_id: TripId,
        content: impl Into<String>,
        created_at: NaiveDateTime,
    ) -> Self {
        Self {
            note_id: UNASSIGNED_ID,
            content: content.into(),
            photo_uri: None,
            created_at,
            trip_id,
        }
    }
}
