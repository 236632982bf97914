//! Trip repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist trips together with their ordered stop list.
//! - Provide list/search/date-range/archived queries.
//! - Own the explicit cascade that removes a trip and all of its children.
//!
//! # Invariants
//! - Trip lists are ordered by `start_date ASC, trip_id ASC`.
//! - `stops` round-trips in insertion order, duplicates included.
//! - Updating an existing trip leaves its children untouched.
//! - Deleting a trip removes every child row in the same transaction.

use super::codec::{bool_to_int, date_to_db, parse_bool, parse_date};
use super::{RepoError, RepoResult};
use crate::model::trip::{Trip, TripId};
use regex::RegexBuilder;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};

const TRIP_SELECT_SQL: &str = "SELECT
    trip_id,
    name,
    departure_location,
    destination,
    start_date,
    end_date,
    description,
    participants,
    user_id,
    archived
FROM trips";

/// Child tables removed before their parent trip, in this order.
pub(crate) const TRIP_CHILD_TABLES: &[&str] = &[
    "events",
    "accommodations",
    "flights",
    "car_shares",
    "notes",
    "trip_stops",
];

/// Filter options for listing trips. All set filters must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TripListQuery {
    /// Case-insensitive substring over `name` or `destination`.
    /// A blank value matches every trip.
    pub text: Option<String>,
    /// Inclusive window: `start_date >= from AND end_date <= to`.
    pub date_range: Option<(chrono::NaiveDate, chrono::NaiveDate)>,
    pub archived: Option<bool>,
}

impl TripListQuery {
    pub fn search(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn between(from: chrono::NaiveDate, to: chrono::NaiveDate) -> Self {
        Self {
            date_range: Some((from, to)),
            ..Self::default()
        }
    }

    pub fn archived(archived: bool) -> Self {
        Self {
            archived: Some(archived),
            ..Self::default()
        }
    }
}

/// Repository interface for trip rows.
pub trait TripRepository {
    /// Inserts when `trip_id` is unassigned or unknown, replaces otherwise.
    fn upsert_trip(&self, trip: &Trip) -> RepoResult<TripId>;
    fn get_trip(&self, trip_id: TripId) -> RepoResult<Option<Trip>>;
    fn list_trips(&self, query: &TripListQuery) -> RepoResult<Vec<Trip>>;
    /// Returns whether a trip row was changed.
    fn set_archived(&self, trip_id: TripId, archived: bool) -> RepoResult<bool>;
    /// Deletes the trip and its children. Returns whether the trip existed.
    fn delete_trip(&self, trip_id: TripId) -> RepoResult<bool>;
}

/// SQLite-backed trip repository.
pub struct SqliteTripRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTripRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl TripRepository for SqliteTripRepository<'_> {
    fn upsert_trip(&self, trip: &Trip) -> RepoResult<TripId> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let trip_id = upsert_trip_row(&tx, trip)?;
        replace_stops(&tx, trip_id, &trip.stops)?;
        tx.commit()?;
        Ok(trip_id)
    }

    fn get_trip(&self, trip_id: TripId) -> RepoResult<Option<Trip>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TRIP_SELECT_SQL} WHERE trip_id = ?1;"))?;
        let mut rows = stmt.query([trip_id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_trip_row(self.conn, row)?));
        }
        Ok(None)
    }

    fn list_trips(&self, query: &TripListQuery) -> RepoResult<Vec<Trip>> {
        let mut sql = format!("{TRIP_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(archived) = query.archived {
            sql.push_str(" AND archived = ?");
            bind_values.push(Value::Integer(bool_to_int(archived)));
        }

        if let Some((from, to)) = query.date_range {
            sql.push_str(" AND start_date >= ? AND end_date <= ?");
            bind_values.push(Value::Text(date_to_db(from)));
            bind_values.push(Value::Text(date_to_db(to)));
        }

        sql.push_str(" ORDER BY start_date ASC, trip_id ASC;");

        // SQLite LIKE only folds ASCII, so text matching happens here.
        let matcher = match query.text.as_deref().filter(|text| !text.trim().is_empty()) {
            Some(text) => Some(
                RegexBuilder::new(&regex::escape(text))
                    .case_insensitive(true)
                    .build()
                    .map_err(|err| RepoError::InvalidData(format!("search text: {err}")))?,
            ),
            None => None,
        };

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut trips = Vec::new();
        while let Some(row) = rows.next()? {
            let trip = parse_trip_row(self.conn, row)?;
            let matched = matcher.as_ref().map_or(true, |re| {
                re.is_match(&trip.name) || re.is_match(&trip.destination)
            });
            if matched {
                trips.push(trip);
            }
        }

        Ok(trips)
    }

    fn set_archived(&self, trip_id: TripId, archived: bool) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "UPDATE trips SET archived = ?2 WHERE trip_id = ?1;",
            params![trip_id, bool_to_int(archived)],
        )?;
        Ok(changed > 0)
    }

    fn delete_trip(&self, trip_id: TripId) -> RepoResult<bool> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let existed = delete_trip_in_tx(&tx, trip_id)?;
        tx.commit()?;
        Ok(existed)
    }
}

/// Deletes one trip and every child row inside an open transaction.
pub(crate) fn delete_trip_in_tx(tx: &Transaction<'_>, trip_id: TripId) -> RepoResult<bool> {
    for table in TRIP_CHILD_TABLES {
        tx.execute(&format!("DELETE FROM {table} WHERE trip_id = ?1;"), [trip_id])?;
    }
    let removed = tx.execute("DELETE FROM trips WHERE trip_id = ?1;", [trip_id])?;
    Ok(removed > 0)
}

fn upsert_trip_row(tx: &Transaction<'_>, trip: &Trip) -> RepoResult<TripId> {
    let start_date = date_to_db(trip.start_date);
    let end_date = date_to_db(trip.end_date);

    if trip.is_new() {
        tx.execute(
            "INSERT INTO trips (
                name,
                departure_location,
                destination,
                start_date,
                end_date,
                description,
                participants,
                user_id,
                archived
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
            params![
                trip.name.as_str(),
                trip.departure_location.as_str(),
                trip.destination.as_str(),
                start_date,
                end_date,
                trip.description.as_str(),
                trip.participants.as_str(),
                trip.user_id,
                bool_to_int(trip.archived),
            ],
        )?;
        return Ok(tx.last_insert_rowid());
    }

    tx.execute(
        "INSERT INTO trips (
            trip_id,
            name,
            departure_location,
            destination,
            start_date,
            end_date,
            description,
            participants,
            user_id,
            archived
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        ON CONFLICT(trip_id) DO UPDATE SET
            name = excluded.name,
            departure_location = excluded.departure_location,
            destination = excluded.destination,
            start_date = excluded.start_date,
            end_date = excluded.end_date,
            description = excluded.description,
            participants = excluded.participants,
            user_id = excluded.user_id,
            archived = excluded.archived;",
        params![
            trip.trip_id,
            trip.name.as_str(),
            trip.departure_location.as_str(),
            trip.destination.as_str(),
            start_date,
            end_date,
            trip.description.as_str(),
            trip.participants.as_str(),
            trip.user_id,
            bool_to_int(trip.archived),
        ],
    )?;
    Ok(trip.trip_id)
}

fn replace_stops(tx: &Transaction<'_>, trip_id: TripId, stops: &[String]) -> RepoResult<()> {
    tx.execute("DELETE FROM trip_stops WHERE trip_id = ?1;", [trip_id])?;
    let mut stmt =
        tx.prepare("INSERT INTO trip_stops (trip_id, position, name) VALUES (?1, ?2, ?3);")?;
    for (position, stop) in stops.iter().enumerate() {
        stmt.execute(params![trip_id, position as i64, stop.as_str()])?;
    }
    Ok(())
}

fn load_stops(conn: &Connection, trip_id: TripId) -> RepoResult<Vec<String>> {
    let mut stmt =
        conn.prepare("SELECT name FROM trip_stops WHERE trip_id = ?1 ORDER BY position ASC;")?;
    let mut rows = stmt.query([trip_id])?;
    let mut stops = Vec::new();
    while let Some(row) = rows.next()? {
        stops.push(row.get(0)?);
    }
    Ok(stops)
}

pub(crate) fn parse_trip_row(conn: &Connection, row: &Row<'_>) -> RepoResult<Trip> {
    let trip_id: TripId = row.get("trip_id")?;
    let start_date: String = row.get("start_date")?;
    let end_date: String = row.get("end_date")?;

    Ok(Trip {
        trip_id,
        name: row.get("name")?,
        departure_location: row.get("departure_location")?,
        destination: row.get("destination")?,
        start_date: parse_date(&start_date, "trips.start_date")?,
        end_date: parse_date(&end_date, "trips.end_date")?,
        description: row.get("description")?,
        participants: row.get("participants")?,
        stops: load_stops(conn, trip_id)?,
        user_id: row.get("user_id")?,
        archived: parse_bool(row.get("archived")?, "trips.archived")?,
    })
}

/// Selects every trip row, ordered like [`TripRepository::list_trips`].
pub(crate) fn list_all_trips(conn: &Connection) -> RepoResult<Vec<Trip>> {
    SqliteTripRepository::new(conn).list_trips(&TripListQuery::default())
}
