//! Trip planner domain model.
//!
//! # Responsibility
//! - Define the plain records persisted by the store.
//! - Define the read-only trip aggregate assembled from them.
//!
//! # Invariants
//! - Identities are store-generated integers; `0` means "not yet stored".
//! - Every child record carries the `trip_id` of its owning trip.
//! - Records carry no behavior that touches storage.

pub mod accommodation;
pub mod car_share;
pub mod event;
pub mod flight;
pub mod note;
pub mod relations;
pub mod trip;
pub mod user;

/// Identity value of a record that has not been stored yet.
pub const UNASSIGNED_ID: i64 = 0;
