//! Trip repository facade.
//!
//! # Responsibility
//! - Be the only seam through which collaborators read or write trip data.
//! - Expose every read as a [`LiveQuery`] and every write as an awaited
//!   command that notifies those queries once committed.
//! - Host the archival policy entry points (see [`crate::service::archive`]).
//!
//! # Invariants
//! - No entity state is cached here; every read goes to the store.
//! - Repository errors are returned unchanged, including
//!   `RepoError::Integrity` for writes that reference a missing trip.
//! - "No such row" is `None`/empty, never an error.

use crate::db::{LiveQuery, Store, Table, TableSet};
use crate::model::accommodation::{Accommodation, AccommodationId};
use crate::model::car_share::{CarShareId, CarSharing};
use crate::model::event::{Event, EventId};
use crate::model::flight::{Flight, FlightId};
use crate::model::note::{Note, NoteId};
use crate::model::relations::TripWithRelations;
use crate::model::trip::{Trip, TripId};
use crate::model::user::{User, UserId};
use crate::repo::child_repo::{ChildRecord, SqliteChildRepository};
use crate::repo::relations_repo::{load_all_trip_relations, load_trip_relations};
use crate::repo::trip_repo::{SqliteTripRepository, TripListQuery, TripRepository};
use crate::repo::user_repo::{SqliteUserRepository, UserRepository};
use crate::repo::{RepoError, RepoResult};
use chrono::NaiveDate;
use log::{debug, warn};

/// Live view whose emissions are repository results.
pub type Live<T> = LiveQuery<T, RepoError>;

const TRIPS: TableSet = TableSet::of(&[Table::Trips]);

/// Repository facade over one shared [`Store`].
#[derive(Clone)]
pub struct TripService {
    store: Store,
}

impl TripService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    // ---- trips: queries ----

    /// All trips ordered by start date ascending.
    pub fn trips(&self) -> Live<Vec<Trip>> {
        self.watch_trips(TripListQuery::default())
    }

    pub fn trip(&self, trip_id: TripId) -> Live<Option<Trip>> {
        self.store.watch(TRIPS, move |conn| {
            SqliteTripRepository::new(conn).get_trip(trip_id)
        })
    }

    /// Trips whose name or destination contains `query`, ignoring case.
    /// A blank query returns every trip.
    pub fn search_trips(&self, query: impl Into<String>) -> Live<Vec<Trip>> {
        self.watch_trips(TripListQuery::search(query))
    }

    /// Trips with `start_date >= from AND end_date <= to`.
    pub fn filter_trips(&self, from: NaiveDate, to: NaiveDate) -> Live<Vec<Trip>> {
        self.watch_trips(TripListQuery::between(from, to))
    }

    pub fn trips_by_archived(&self, archived: bool) -> Live<Vec<Trip>> {
        self.watch_trips(TripListQuery::archived(archived))
    }

    /// Combined filter; every set field must match.
    pub fn query_trips(&self, query: TripListQuery) -> Live<Vec<Trip>> {
        self.watch_trips(query)
    }

    fn watch_trips(&self, query: TripListQuery) -> Live<Vec<Trip>> {
        self.store.watch(TRIPS, move |conn| {
            SqliteTripRepository::new(conn).list_trips(&query)
        })
    }

    /// One consistent aggregate of a trip and all of its children.
    ///
    /// Emits `None` once the trip no longer exists.
    pub fn trip_relations(&self, trip_id: TripId) -> Live<Option<TripWithRelations>> {
        self.store.watch(TableSet::TRIP_AGGREGATE, move |conn| {
            load_trip_relations(conn, trip_id)
        })
    }

    /// Aggregates for every trip, ordered by start date.
    pub fn all_trip_relations(&self) -> Live<Vec<TripWithRelations>> {
        self.store.watch(TableSet::TRIP_AGGREGATE, load_all_trip_relations)
    }

    // ---- trips: one-shot snapshots ----

    pub async fn trip_once(&self, trip_id: TripId) -> RepoResult<Option<Trip>> {
        self.store
            .read(|conn| SqliteTripRepository::new(conn).get_trip(trip_id))
            .await
    }

    pub async fn all_trips_once(&self) -> RepoResult<Vec<Trip>> {
        self.list_trips_once(&TripListQuery::default()).await
    }

    /// Trips with `archived = false`, as a snapshot.
    pub async fn active_trips_once(&self) -> RepoResult<Vec<Trip>> {
        self.list_trips_once(&TripListQuery::archived(false)).await
    }

    pub async fn list_trips_once(&self, query: &TripListQuery) -> RepoResult<Vec<Trip>> {
        self.store
            .read(|conn| SqliteTripRepository::new(conn).list_trips(query))
            .await
    }

    // ---- trips: commands ----

    /// Inserts a new trip or replaces the stored one. Returns the trip id.
    pub async fn upsert_trip(&self, trip: &Trip) -> RepoResult<TripId> {
        let result = self
            .store
            .write(TRIPS, |conn| SqliteTripRepository::new(conn).upsert_trip(trip))
            .await;
        log_write("trip_upsert", "trips", &result);
        result
    }

    /// Deletes the trip and every child row it owns.
    pub async fn delete_trip(&self, trip: &Trip) -> RepoResult<bool> {
        let trip_id = trip.trip_id;
        let result = self
            .store
            .write(TableSet::TRIP_AGGREGATE, |conn| {
                SqliteTripRepository::new(conn).delete_trip(trip_id)
            })
            .await;
        if let Ok(existed) = result {
            debug!("event=trip_delete module=service status=ok trip_id={trip_id} existed={existed}");
        }
        result
    }

    /// Sets the archived flag in either direction.
    pub async fn archive_trip(&self, trip_id: TripId, archived: bool) -> RepoResult<bool> {
        let result = self
            .store
            .write(TRIPS, |conn| {
                SqliteTripRepository::new(conn).set_archived(trip_id, archived)
            })
            .await;
        if let Ok(changed) = result {
            debug!(
                "event=trip_archive module=service status=ok trip_id={trip_id} archived={archived} changed={changed}"
            );
        }
        result
    }

    // ---- children ----

    /// Live list of one child kind for a trip.
    pub fn children_for_trip<C>(&self, trip_id: TripId) -> Live<Vec<C>>
    where
        C: ChildRecord + Send + 'static,
    {
        self.store.watch(C::STORE_TABLE.into(), move |conn| {
            SqliteChildRepository::new(conn).list_for_trip::<C>(trip_id)
        })
    }

    pub async fn children_for_trip_once<C: ChildRecord>(
        &self,
        trip_id: TripId,
    ) -> RepoResult<Vec<C>> {
        self.store
            .read(|conn| SqliteChildRepository::new(conn).list_for_trip::<C>(trip_id))
            .await
    }

    /// Inserts or replaces a child row. Returns its id.
    pub async fn upsert_child<C: ChildRecord>(&self, record: &C) -> RepoResult<i64> {
        let result = self
            .store
            .write(C::STORE_TABLE.into(), |conn| {
                SqliteChildRepository::new(conn).upsert(record)
            })
            .await;
        log_write("child_upsert", C::TABLE, &result);
        result
    }

    /// Deletes a child row by identity. Returns whether it existed.
    pub async fn delete_child<C: ChildRecord>(&self, record: &C) -> RepoResult<bool> {
        self.store
            .write(C::STORE_TABLE.into(), |conn| {
                SqliteChildRepository::new(conn).delete(record)
            })
            .await
    }

    pub fn events_for_trip(&self, trip_id: TripId) -> Live<Vec<Event>> {
        self.children_for_trip(trip_id)
    }

    pub async fn events_for_trip_once(&self, trip_id: TripId) -> RepoResult<Vec<Event>> {
        self.children_for_trip_once(trip_id).await
    }

    pub async fn upsert_event(&self, event: &Event) -> RepoResult<EventId> {
        self.upsert_child(event).await
    }

    pub async fn delete_event(&self, event: &Event) -> RepoResult<bool> {
        self.delete_child(event).await
    }

    pub fn accommodations_for_trip(&self, trip_id: TripId) -> Live<Vec<Accommodation>> {
        self.children_for_trip(trip_id)
    }

    pub async fn upsert_accommodation(
        &self,
        accommodation: &Accommodation,
    ) -> RepoResult<AccommodationId> {
        self.upsert_child(accommodation).await
    }

    pub async fn delete_accommodation(&self, accommodation: &Accommodation) -> RepoResult<bool> {
        self.delete_child(accommodation).await
    }

    pub fn flights_for_trip(&self, trip_id: TripId) -> Live<Vec<Flight>> {
        self.children_for_trip(trip_id)
    }

    pub async fn upsert_flight(&self, flight: &Flight) -> RepoResult<FlightId> {
        self.upsert_child(flight).await
    }

    pub async fn delete_flight(&self, flight: &Flight) -> RepoResult<bool> {
        self.delete_child(flight).await
    }

    pub fn car_shares_for_trip(&self, trip_id: TripId) -> Live<Vec<CarSharing>> {
        self.children_for_trip(trip_id)
    }

    pub async fn upsert_car_share(&self, car_share: &CarSharing) -> RepoResult<CarShareId> {
        self.upsert_child(car_share).await
    }

    pub async fn delete_car_share(&self, car_share: &CarSharing) -> RepoResult<bool> {
        self.delete_child(car_share).await
    }

    /// Notes for a trip, newest first.
    pub fn notes_for_trip(&self, trip_id: TripId) -> Live<Vec<Note>> {
        self.children_for_trip(trip_id)
    }

    pub async fn upsert_note(&self, note: &Note) -> RepoResult<NoteId> {
        self.upsert_child(note).await
    }

    pub async fn delete_note(&self, note: &Note) -> RepoResult<bool> {
        self.delete_child(note).await
    }

    // ---- users ----

    pub fn user(&self, id: UserId) -> Live<Option<User>> {
        self.store.watch(Table::Users.into(), move |conn| {
            SqliteUserRepository::new(conn).get_user(id)
        })
    }

    pub async fn upsert_user(&self, user: &User) -> RepoResult<UserId> {
        let result = self
            .store
            .write(Table::Users.into(), |conn| {
                SqliteUserRepository::new(conn).upsert_user(user)
            })
            .await;
        log_write("user_upsert", "users", &result);
        result
    }

    /// Deletes the user together with every trip it owns.
    pub async fn delete_user(&self, user: &User) -> RepoResult<bool> {
        let id = user.id;
        self.store
            .write(TableSet::ALL, |conn| {
                SqliteUserRepository::new(conn).delete_user(id)
            })
            .await
    }
}

fn log_write(event: &str, table: &str, result: &RepoResult<i64>) {
    match result {
        Ok(id) => debug!("event={event} module=service status=ok table={table} id={id}"),
        Err(err) if err.is_integrity() => warn!(
            "event={event} module=service status=error table={table} error_code=integrity error={err}"
        ),
        Err(err) => warn!("event={event} module=service status=error table={table} error={err}"),
    }
}
