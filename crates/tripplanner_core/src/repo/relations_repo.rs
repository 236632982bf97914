//! Trip aggregate loader.
//!
//! # Responsibility
//! - Join one trip with its five child collections into a
//!   [`TripWithRelations`].
//!
//! # Invariants
//! - Each aggregate is read inside one read transaction, so a bundle never
//!   mixes rows from two store states.
//! - A missing trip yields `None`, never a partial bundle.

use super::child_repo::SqliteChildRepository;
use super::trip_repo::{list_all_trips, SqliteTripRepository, TripRepository};
use super::RepoResult;
use crate::model::relations::TripWithRelations;
use crate::model::trip::{Trip, TripId};
use rusqlite::{Connection, Transaction, TransactionBehavior};

/// Loads one trip aggregate, or `None` when the trip does not exist.
pub fn load_trip_relations(
    conn: &Connection,
    trip_id: TripId,
) -> RepoResult<Option<TripWithRelations>> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Deferred)?;
    let relations = match SqliteTripRepository::new(&tx).get_trip(trip_id)? {
        Some(trip) => Some(assemble(&tx, trip)?),
        None => None,
    };
    tx.commit()?;
    Ok(relations)
}

/// Loads the aggregate of every trip, ordered by start date.
pub fn load_all_trip_relations(conn: &Connection) -> RepoResult<Vec<TripWithRelations>> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Deferred)?;
    let trips = list_all_trips(&tx)?;
    let mut bundles = Vec::with_capacity(trips.len());
    for trip in trips {
        bundles.push(assemble(&tx, trip)?);
    }
    tx.commit()?;
    Ok(bundles)
}

fn assemble(conn: &Connection, trip: Trip) -> RepoResult<TripWithRelations> {
    let children = SqliteChildRepository::new(conn);
    let trip_id = trip.trip_id;
    Ok(TripWithRelations {
        events: children.list_for_trip(trip_id)?,
        accommodations: children.list_for_trip(trip_id)?,
        flights: children.list_for_trip(trip_id)?,
        car_shares: children.list_for_trip(trip_id)?,
        notes: children.list_for_trip(trip_id)?,
        trip,
    })
}
