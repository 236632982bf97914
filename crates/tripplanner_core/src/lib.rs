//! Data core of the trip planner.
//! This crate is the single source of truth for trip data and its invariants.

pub mod config;
pub mod db;
pub mod jobs;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, CoreConfig};
pub use db::{open_db, open_db_in_memory, DbError, LiveQuery, Store, Table, TableSet};
pub use jobs::{
    ArchiveJob, CalendarExporter, CalendarSyncJob, Enqueue, JobError, JobOutcome, JobScheduler,
    NoopCalendarExporter, PeriodicJob, SchedulerError,
};
pub use logging::{default_log_level, init_from_config, init_logging, logging_status, LoggingError};
pub use model::accommodation::{Accommodation, AccommodationId};
pub use model::car_share::{CarShareId, CarSharing};
pub use model::event::{Event, EventId};
pub use model::flight::{Flight, FlightId};
pub use model::note::{Note, NoteId};
pub use model::relations::TripWithRelations;
pub use model::trip::{is_expired, Trip, TripId};
pub use model::user::{User, UserId};
pub use model::UNASSIGNED_ID;
pub use repo::trip_repo::TripListQuery;
pub use repo::{RepoError, RepoResult};
pub use service::archive::{local_today, ArchiveReport};
pub use service::editor::{
    validate_trip_draft, validate_user, EditorError, TripDraft, TripEditor, ValidationError,
};
pub use service::reminders::{Reminder, REMINDER_WINDOW_HOURS};
pub use service::trip_service::{Live, TripService};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
