//! Shared store handle.
//!
//! # Responsibility
//! - Own the single SQLite connection and serialize access to it.
//! - Broadcast the set of tables touched by every committed write.
//!
//! # Invariants
//! - A change is published only after its write closure returned `Ok`.
//! - Changes are published while the connection lock is held, so the
//!   broadcast order equals the commit order.

use super::live::LiveQuery;
use super::{open_db, open_db_in_memory, DbResult};
use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};

const CHANGE_CHANNEL_CAPACITY: usize = 256;

/// Logical tables that live queries can depend on.
///
/// `trip_stops` is folded into [`Table::Trips`]; stops are part of the trip row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Users,
    Trips,
    Events,
    Accommodations,
    Flights,
    CarShares,
    Notes,
}

impl Table {
    const fn bit(self) -> u8 {
        match self {
            Self::Users => 1 << 0,
            Self::Trips => 1 << 1,
            Self::Events => 1 << 2,
            Self::Accommodations => 1 << 3,
            Self::Flights => 1 << 4,
            Self::CarShares => 1 << 5,
            Self::Notes => 1 << 6,
        }
    }
}

/// Compact set of [`Table`] values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TableSet(u8);

impl TableSet {
    pub const EMPTY: Self = Self(0);

    /// A trip and everything that hangs off it.
    pub const TRIP_AGGREGATE: Self = Self::of(&[
        Table::Trips,
        Table::Events,
        Table::Accommodations,
        Table::Flights,
        Table::CarShares,
        Table::Notes,
    ]);

    pub const ALL: Self = Self::TRIP_AGGREGATE.with(Table::Users);

    pub const fn of(tables: &[Table]) -> Self {
        let mut bits = 0;
        let mut index = 0;
        while index < tables.len() {
            bits |= tables[index].bit();
            index += 1;
        }
        Self(bits)
    }

    pub const fn with(self, table: Table) -> Self {
        Self(self.0 | table.bit())
    }

    pub const fn contains(self, table: Table) -> bool {
        self.0 & table.bit() != 0
    }

    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl From<Table> for TableSet {
    fn from(value: Table) -> Self {
        Self(value.bit())
    }
}

/// Cloneable handle to the trip database.
///
/// Constructed once at process start and passed to every collaborator.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    conn: Mutex<Connection>,
    changes: broadcast::Sender<TableSet>,
}

impl Store {
    /// Wraps an already migrated connection.
    pub fn new(conn: Connection) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(StoreInner {
                conn: Mutex::new(conn),
                changes,
            }),
        }
    }

    /// Opens (and migrates) a database file.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        Ok(Self::new(open_db(path)?))
    }

    /// Opens (and migrates) a private in-memory database.
    pub fn open_in_memory() -> DbResult<Self> {
        Ok(Self::new(open_db_in_memory()?))
    }

    /// Runs a read-only closure against the connection.
    pub async fn read<T, E>(&self, f: impl FnOnce(&Connection) -> Result<T, E>) -> Result<T, E> {
        let conn = self.inner.conn.lock().await;
        f(&conn)
    }

    /// Runs a write closure and publishes `touched` once it succeeds.
    ///
    /// The closure is responsible for its own transaction when it issues
    /// more than one statement.
    pub async fn write<T, E>(
        &self,
        touched: TableSet,
        f: impl FnOnce(&mut Connection) -> Result<T, E>,
    ) -> Result<T, E> {
        let mut conn = self.inner.conn.lock().await;
        let value = f(&mut conn)?;
        if !touched.is_empty() {
            // No receivers simply means nobody is watching.
            let _ = self.inner.changes.send(touched);
        }
        Ok(value)
    }

    /// Creates a live view over `query` that re-runs whenever one of
    /// `tables` changes.
    pub fn watch<T, E, F>(&self, tables: TableSet, query: F) -> LiveQuery<T, E>
    where
        F: Fn(&Connection) -> Result<T, E> + Send + Sync + 'static,
    {
        LiveQuery::new(self.clone(), tables, Arc::new(query))
    }

    pub(crate) fn subscribe_changes(&self) -> broadcast::Receiver<TableSet> {
        self.inner.changes.subscribe()
    }

    /// Number of live queries and other listeners currently attached.
    pub fn subscriber_count(&self) -> usize {
        self.inner.changes.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::{Table, TableSet};

    #[test]
    fn table_set_membership() {
        let set = TableSet::of(&[Table::Trips, Table::Notes]);
        assert!(set.contains(Table::Trips));
        assert!(set.contains(Table::Notes));
        assert!(!set.contains(Table::Events));
        assert!(set.intersects(Table::Notes.into()));
        assert!(!set.intersects(TableSet::of(&[Table::Users, Table::Flights])));
    }

    #[test]
    fn aggregate_covers_every_trip_table_but_not_users() {
        for table in [
            Table::Trips,
            Table::Events,
            Table::Accommodations,
            Table::Flights,
            Table::CarShares,
            Table::Notes,
        ] {
            assert!(TableSet::TRIP_AGGREGATE.contains(table));
        }
        assert!(!TableSet::TRIP_AGGREGATE.contains(Table::Users));
        assert!(TableSet::ALL.contains(Table::Users));
    }
}
