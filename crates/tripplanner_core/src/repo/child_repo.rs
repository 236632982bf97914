//! Repository for the records owned by a trip.
//!
//! # Responsibility
//! - Map events, accommodations, flights, car shares and notes to rows.
//! - Provide the shared fetch-by-trip / upsert / delete contract.
//!
//! # Invariants
//! - Every child row references an existing trip; SQLite rejects the write
//!   otherwise and the error surfaces as `RepoError::Integrity`.
//! - Notes list newest first; other children list in insertion order.

use super::codec::{datetime_to_db, decimal_to_db, parse_datetime, parse_decimal};
use super::RepoResult;
use crate::db::Table;
use crate::model::accommodation::Accommodation;
use crate::model::car_share::CarSharing;
use crate::model::event::Event;
use crate::model::flight::Flight;
use crate::model::note::Note;
use crate::model::trip::TripId;
use crate::model::UNASSIGNED_ID;
use chrono::NaiveDateTime;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row};
use rust_decimal::Decimal;

/// Storage mapping for one kind of trip-owned record.
pub trait ChildRecord: Sized {
    const TABLE: &'static str;
    const ID_COLUMN: &'static str;
    /// Data columns, excluding the id and in [`ChildRecord::values`] order.
    /// `trip_id` is always last.
    const COLUMNS: &'static [&'static str];
    const ORDER_BY: &'static str;
    /// Table tag used for change notification.
    const STORE_TABLE: Table;

    fn id(&self) -> i64;
    /// Re-parents the record onto `trip_id`.
    fn set_trip_id(&mut self, trip_id: TripId);
    fn values(&self) -> Vec<Value>;
    fn from_row(row: &Row<'_>) -> RepoResult<Self>;
}

/// SQLite-backed repository for every [`ChildRecord`] type.
pub struct SqliteChildRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteChildRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Inserts when the id is unassigned or unknown, replaces otherwise.
    pub fn upsert<C: ChildRecord>(&self, record: &C) -> RepoResult<i64> {
        let columns = C::COLUMNS.join(", ");
        let mut values = record.values();

        if record.id() == UNASSIGNED_ID {
            let placeholders = placeholders(C::COLUMNS.len());
            self.conn.execute(
                &format!(
                    "INSERT INTO {} ({columns}) VALUES ({placeholders});",
                    C::TABLE
                ),
                params_from_iter(values),
            )?;
            return Ok(self.conn.last_insert_rowid());
        }

        let assignments = C::COLUMNS
            .iter()
            .map(|column| format!("{column} = excluded.{column}"))
            .collect::<Vec<_>>()
            .join(", ");
        values.insert(0, Value::Integer(record.id()));
        self.conn.execute(
            &format!(
                "INSERT INTO {table} ({id}, {columns}) VALUES ({placeholders})
                 ON CONFLICT({id}) DO UPDATE SET {assignments};",
                table = C::TABLE,
                id = C::ID_COLUMN,
                placeholders = placeholders(C::COLUMNS.len() + 1),
            ),
            params_from_iter(values),
        )?;
        Ok(record.id())
    }

    /// Deletes by identity. Returns whether a row was removed.
    pub fn delete<C: ChildRecord>(&self, record: &C) -> RepoResult<bool> {
        let removed = self.conn.execute(
            &format!("DELETE FROM {} WHERE {} = ?1;", C::TABLE, C::ID_COLUMN),
            [record.id()],
        )?;
        Ok(removed > 0)
    }

    pub fn get<C: ChildRecord>(&self, id: i64) -> RepoResult<Option<C>> {
        let mut stmt = self.conn.prepare(&format!(
            "{} WHERE {} = ?1;",
            select_sql::<C>(),
            C::ID_COLUMN
        ))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(C::from_row(row)?));
        }
        Ok(None)
    }

    pub fn list_for_trip<C: ChildRecord>(&self, trip_id: TripId) -> RepoResult<Vec<C>> {
        let mut stmt = self.conn.prepare(&format!(
            "{} WHERE trip_id = ?1 ORDER BY {};",
            select_sql::<C>(),
            C::ORDER_BY
        ))?;
        let mut rows = stmt.query([trip_id])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(C::from_row(row)?);
        }
        Ok(records)
    }
}

/// Child records that start at a point in time.
pub trait Scheduled: ChildRecord {
    const START_COLUMN: &'static str;
}

impl Scheduled for Event {
    const START_COLUMN: &'static str = "start_time";
}

impl Scheduled for Flight {
    const START_COLUMN: &'static str = "departure_time";
}

impl SqliteChildRepository<'_> {
    /// Records of every trip starting within `[from, to]`, earliest first.
    pub fn list_starting_between<C: Scheduled>(
        &self,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> RepoResult<Vec<C>> {
        let mut stmt = self.conn.prepare(&format!(
            "{select} WHERE {start} >= ?1 AND {start} <= ?2 ORDER BY {start} ASC, {id} ASC;",
            select = select_sql::<C>(),
            start = C::START_COLUMN,
            id = C::ID_COLUMN,
        ))?;
        let mut rows = stmt.query([datetime_to_db(from), datetime_to_db(to)])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(C::from_row(row)?);
        }
        Ok(records)
    }
}

fn select_sql<C: ChildRecord>() -> String {
    format!(
        "SELECT {}, {} FROM {}",
        C::ID_COLUMN,
        C::COLUMNS.join(", "),
        C::TABLE
    )
}

fn placeholders(count: usize) -> String {
    (1..=count)
        .map(|index| format!("?{index}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn text(value: &str) -> Value {
    Value::Text(value.to_string())
}

fn timestamp(row: &Row<'_>, column: &'static str, qualified: &str) -> RepoResult<NaiveDateTime> {
    let raw: String = row.get(column)?;
    parse_datetime(&raw, qualified)
}

fn amount(row: &Row<'_>, column: &'static str, qualified: &str) -> RepoResult<Decimal> {
    let raw: String = row.get(column)?;
    parse_decimal(&raw, qualified)
}

impl ChildRecord for Event {
    const TABLE: &'static str = "events";
    const ID_COLUMN: &'static str = "event_id";
    const COLUMNS: &'static [&'static str] =
        &["title", "start_time", "end_time", "event_type", "trip_id"];
    const ORDER_BY: &'static str = "event_id ASC";
    const STORE_TABLE: Table = Table::Events;

    fn id(&self) -> i64 {
        self.event_id
    }

    fn set_trip_id(&mut self, trip_id: TripId) {
        self.trip_id = trip_id;
    }

    fn values(&self) -> Vec<Value> {
        vec![
            text(&self.title),
            Value::Text(datetime_to_db(self.start_time)),
            Value::Text(datetime_to_db(self.end_time)),
            text(&self.event_type),
            Value::Integer(self.trip_id),
        ]
    }

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        Ok(Self {
            event_id: row.get("event_id")?,
            title: row.get("title")?,
            start_time: timestamp(row, "start_time", "events.start_time")?,
            end_time: timestamp(row, "end_time", "events.end_time")?,
            event_type: row.get("event_type")?,
            trip_id: row.get("trip_id")?,
        })
    }
}

impl ChildRecord for Accommodation {
    const TABLE: &'static str = "accommodations";
    const ID_COLUMN: &'static str = "accommodation_id";
    const COLUMNS: &'static [&'static str] = &[
        "name",
        "address",
        "check_in",
        "check_out",
        "price",
        "contact",
        "trip_id",
    ];
    const ORDER_BY: &'static str = "accommodation_id ASC";
    const STORE_TABLE: Table = Table::Accommodations;

    fn id(&self) -> i64 {
        self.accommodation_id
    }

    fn set_trip_id(&mut self, trip_id: TripId) {
        self.trip_id = trip_id;
    }

    fn values(&self) -> Vec<Value> {
        vec![
            text(&self.name),
            text(&self.address),
            Value::Text(datetime_to_db(self.check_in)),
            Value::Text(datetime_to_db(self.check_out)),
            Value::Text(decimal_to_db(self.price)),
            text(&self.contact),
            Value::Integer(self.trip_id),
        ]
    }

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        Ok(Self {
            accommodation_id: row.get("accommodation_id")?,
            name: row.get("name")?,
            address: row.get("address")?,
            check_in: timestamp(row, "check_in", "accommodations.check_in")?,
            check_out: timestamp(row, "check_out", "accommodations.check_out")?,
            price: amount(row, "price", "accommodations.price")?,
            contact: row.get("contact")?,
            trip_id: row.get("trip_id")?,
        })
    }
}

impl ChildRecord for Flight {
    const TABLE: &'static str = "flights";
    const ID_COLUMN: &'static str = "flight_id";
    const COLUMNS: &'static [&'static str] = &[
        "airline",
        "departure_time",
        "arrival_time",
        "price",
        "flight_number",
        "seat_number",
        "trip_id",
    ];
    const ORDER_BY: &'static str = "flight_id ASC";
    const STORE_TABLE: Table = Table::Flights;

    fn id(&self) -> i64 {
        self.flight_id
    }

    fn set_trip_id(&mut self, trip_id: TripId) {
        self.trip_id = trip_id;
    }

    fn values(&self) -> Vec<Value> {
        vec![
            text(&self.airline),
            Value::Text(datetime_to_db(self.departure_time)),
            Value::Text(datetime_to_db(self.arrival_time)),
            Value::Text(decimal_to_db(self.price)),
            text(&self.flight_number),
            text(&self.seat_number),
            Value::Integer(self.trip_id),
        ]
    }

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        Ok(Self {
            flight_id: row.get("flight_id")?,
            airline: row.get("airline")?,
            departure_time: timestamp(row, "departure_time", "flights.departure_time")?,
            arrival_time: timestamp(row, "arrival_time", "flights.arrival_time")?,
            price: amount(row, "price", "flights.price")?,
            flight_number: row.get("flight_number")?,
            seat_number: row.get("seat_number")?,
            trip_id: row.get("trip_id")?,
        })
    }
}

impl ChildRecord for CarSharing {
    const TABLE: &'static str = "car_shares";
    const ID_COLUMN: &'static str = "car_share_id";
    const COLUMNS: &'static [&'static str] = &[
        "provider_name",
        "rental_period",
        "vehicle_info",
        "price",
        "website",
        "trip_id",
    ];
    const ORDER_BY: &'static str = "car_share_id ASC";
    const STORE_TABLE: Table = Table::CarShares;

    fn id(&self) -> i64 {
        self.car_share_id
    }

    fn set_trip_id(&mut self, trip_id: TripId) {
        self.trip_id = trip_id;
    }

    fn values(&self) -> Vec<Value> {
        vec![
            text(&self.provider_name),
            text(&self.rental_period),
            text(&self.vehicle_info),
            Value::Text(decimal_to_db(self.price)),
            text(&self.website),
            Value::Integer(self.trip_id),
        ]
    }

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        Ok(Self {
            car_share_id: row.get("car_share_id")?,
            provider_name: row.get("provider_name")?,
            rental_period: row.get("rental_period")?,
            vehicle_info: row.get("vehicle_info")?,
            price: amount(row, "price", "car_shares.price")?,
            website: row.get("website")?,
            trip_id: row.get("trip_id")?,
        })
    }
}

impl ChildRecord for Note {
    const TABLE: &'static str = "notes";
    const ID_COLUMN: &'static str = "note_id";
    const COLUMNS: &'static [&'static str] = &["content", "photo_uri", "created_at", "trip_id"];
    const ORDER_BY: &'static str = "created_at DESC, note_id DESC";
    const STORE_TABLE: Table = Table::Notes;

    fn id(&self) -> i64 {
        self.note_id
    }

    fn set_trip_id(&mut self, trip_id: TripId) {
        self.trip_id = trip_id;
    }

    fn values(&self) -> Vec<Value> {
        vec![
            text(&self.content),
            self.photo_uri.as_deref().map_or(Value::Null, text),
            Value::Text(datetime_to_db(self.created_at)),
            Value::Integer(self.trip_id),
        ]
    }

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        Ok(Self {
            note_id: row.get("note_id")?,
            content: row.get("content")?,
            photo_uri: row.get("photo_uri")?,
            created_at: timestamp(row, "created_at", "notes.created_at")?,
            trip_id: row.get("trip_id")?,
        })
    }
}
