//! Trip editor workflow.
//!
//! # Responsibility
//! - Validate user input before anything reaches the repository.
//! - Save a trip and re-parent its pending children onto the saved id.
//!
//! # Invariants
//! - An invalid draft is never written; the first failing rule wins.
//! - Validation messages are user-facing and stable.

use crate::model::accommodation::Accommodation;
use crate::model::event::Event;
use crate::model::flight::Flight;
use crate::model::note::Note;
use crate::model::relations::TripWithRelations;
use crate::model::trip::{Trip, TripId};
use crate::model::user::{User, UserId};
use crate::model::UNASSIGNED_ID;
use crate::repo::child_repo::ChildRecord;
use crate::repo::RepoError;
use crate::service::trip_service::TripService;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

/// Rejected editor input. `Display` is the message shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    NameRequired,
    LocationsRequired,
    DatesRequired,
    EndBeforeStart,
    UserNameRequired,
    InvalidEmail,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let message = match self {
            Self::NameRequired => "Trip name required",
            Self::LocationsRequired => "Locations required",
            Self::DatesRequired => "Dates must be selected",
            Self::EndBeforeStart => "End date must be after start date",
            Self::UserNameRequired => "Name required",
            Self::InvalidEmail => "Valid email required",
        };
        f.write_str(message)
    }
}

impl Error for ValidationError {}

/// Editor save failure.
#[derive(Debug)]
pub enum EditorError {
    Validation(ValidationError),
    Repo(RepoError),
}

impl Display for EditorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for EditorError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<ValidationError> for EditorError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for EditorError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Editable trip state, including children not yet saved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TripDraft {
    /// `None` until the trip has been saved once.
    pub trip_id: Option<TripId>,
    pub name: String,
    pub departure: String,
    pub destination: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub description: String,
    pub participants: String,
    pub stops: Vec<String>,
    /// Owning account, carried through unchanged.
    pub user_id: Option<UserId>,
    pub archived: bool,
    pub events: Vec<Event>,
    pub flights: Vec<Flight>,
    pub accommodations: Vec<Accommodation>,
    pub notes: Vec<Note>,
}

impl TripDraft {
    /// Builds a draft from a stored aggregate.
    pub fn from_relations(relations: &TripWithRelations) -> Self {
        let trip = &relations.trip;
        Self {
            trip_id: Some(trip.trip_id),
            name: trip.name.clone(),
            departure: trip.departure_location.clone(),
            destination: trip.destination.clone(),
            start_date: Some(trip.start_date),
            end_date: Some(trip.end_date),
            description: trip.description.clone(),
            participants: trip.participants.clone(),
            stops: trip.stops.clone(),
            user_id: trip.user_id,
            archived: trip.archived,
            events: relations.events.clone(),
            flights: relations.flights.clone(),
            accommodations: relations.accommodations.clone(),
            notes: relations.notes.clone(),
        }
    }

    /// Validates the draft and converts it into a storable trip.
    pub fn to_trip(&self) -> Result<Trip, ValidationError> {
        let (start_date, end_date) = validate_trip_draft(self)?;
        let mut trip = Trip::new(
            self.name.clone(),
            self.departure.clone(),
            self.destination.clone(),
            start_date,
            end_date,
        );
        trip.trip_id = self.trip_id.unwrap_or(UNASSIGNED_ID);
        trip.description = self.description.clone();
        trip.participants = self.participants.clone();
        trip.stops = self.stops.clone();
        trip.user_id = self.user_id;
        trip.archived = self.archived;
        Ok(trip)
    }
}

/// Checks the editor rules in order and returns the selected dates.
pub fn validate_trip_draft(draft: &TripDraft) -> Result<(NaiveDate, NaiveDate), ValidationError> {
    if draft.name.trim().is_empty() {
        return Err(ValidationError::NameRequired);
    }
    if draft.departure.trim().is_empty() || draft.destination.trim().is_empty() {
        return Err(ValidationError::LocationsRequired);
    }
    let (Some(start), Some(end)) = (draft.start_date, draft.end_date) else {
        return Err(ValidationError::DatesRequired);
    };
    if end < start {
        return Err(ValidationError::EndBeforeStart);
    }
    Ok((start, end))
}

/// Checks account registration input.
pub fn validate_user(user: &User) -> Result<(), ValidationError> {
    if user.first_name.trim().is_empty() && user.last_name.trim().is_empty() {
        return Err(ValidationError::UserNameRequired);
    }
    if !EMAIL_RE.is_match(user.email.trim()) {
        return Err(ValidationError::InvalidEmail);
    }
    Ok(())
}

/// Save workflow on top of the repository facade.
pub struct TripEditor {
    service: TripService,
}

impl TripEditor {
    pub fn new(service: TripService) -> Self {
        Self { service }
    }

    /// Loads a stored trip with its children into a draft, or `None` when
    /// the trip does not exist.
    pub async fn load(&self, trip_id: TripId) -> Result<Option<TripDraft>, EditorError> {
        let relations = self.service.trip_relations(trip_id).first().await?;
        Ok(relations.as_ref().map(TripDraft::from_relations))
    }

    /// Validates and saves the draft, then saves its pending children
    /// under the resulting trip id.
    ///
    /// Children are written one by one; a failure leaves earlier writes in
    /// place and is returned unchanged.
    pub async fn save(&self, draft: &TripDraft) -> Result<TripId, EditorError> {
        let trip = draft.to_trip()?;
        let trip_id = self.service.upsert_trip(&trip).await?;

        self.save_children(trip_id, &draft.events).await?;
        self.save_children(trip_id, &draft.flights).await?;
        self.save_children(trip_id, &draft.accommodations).await?;
        self.save_children(trip_id, &draft.notes).await?;
        Ok(trip_id)
    }

    async fn save_children<C: ChildRecord + Clone>(
        &self,
        trip_id: TripId,
        children: &[C],
    ) -> Result<(), EditorError> {
        for child in children {
            let mut child = child.clone();
            child.set_trip_id(trip_id);
            self.service.upsert_child(&child).await?;
        }
        Ok(())
    }

    /// Validates and stores a user account.
    pub async fn save_user(&self, user: &User) -> Result<UserId, EditorError> {
        validate_user(user)?;
        Ok(self.service.upsert_user(user).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::{validate_trip_draft, validate_user, TripDraft, ValidationError};
    use crate::model::user::User;
    use chrono::NaiveDate;

    fn complete_draft() -> TripDraft {
        TripDraft {
            name: "Alps".to_string(),
            departure: "Zurich".to_string(),
            destination: "Zermatt".to_string(),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 10),
            ..TripDraft::default()
        }
    }

    #[test]
    fn complete_draft_is_valid() {
        assert!(validate_trip_draft(&complete_draft()).is_ok());
    }

    #[test]
    fn blank_name_is_rejected_first() {
        let draft = TripDraft {
            name: "   ".to_string(),
            destination: String::new(),
            ..complete_draft()
        };
        let err = validate_trip_draft(&draft).unwrap_err();
        assert_eq!(err, ValidationError::NameRequired);
        assert_eq!(err.to_string(), "Trip name required");
    }

    #[test]
    fn missing_location_or_dates_are_rejected() {
        let no_departure = TripDraft {
            departure: String::new(),
            ..complete_draft()
        };
        assert_eq!(
            validate_trip_draft(&no_departure),
            Err(ValidationError::LocationsRequired)
        );

        let no_end = TripDraft {
            end_date: None,
            ..complete_draft()
        };
        assert_eq!(
            validate_trip_draft(&no_end),
            Err(ValidationError::DatesRequired)
        );
    }

    #[test]
    fn end_before_start_is_rejected_but_same_day_is_allowed() {
        let reversed = TripDraft {
            end_date: NaiveDate::from_ymd_opt(2023, 12, 31),
            ..complete_draft()
        };
        assert_eq!(
            validate_trip_draft(&reversed),
            Err(ValidationError::EndBeforeStart)
        );

        let same_day = TripDraft {
            end_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            ..complete_draft()
        };
        assert!(validate_trip_draft(&same_day).is_ok());
    }

    #[test]
    fn draft_converts_to_unsaved_trip() {
        let trip = complete_draft().to_trip().unwrap();
        assert!(trip.is_new());
        assert_eq!(trip.departure_location, "Zurich");
    }

    #[test]
    fn user_email_must_be_well_formed() {
        let mut user = User::new("Ada", "Lovelace", "ada@example.org", "hash", "London");
        assert!(validate_user(&user).is_ok());
        user.email = "ada.example.org".to_string();
        assert_eq!(validate_user(&user), Err(ValidationError::InvalidEmail));
    }
}
