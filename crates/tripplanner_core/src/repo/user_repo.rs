//! User repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Deleting a user removes the user's trips through the same explicit
//!   cascade as a direct trip delete.

use super::trip_repo::delete_trip_in_tx;
use super::RepoResult;
use crate::model::user::{User, UserId};
use crate::model::UNASSIGNED_ID;
use rusqlite::{params, Connection, Transaction, TransactionBehavior};

/// Repository interface for user rows.
pub trait UserRepository {
    fn upsert_user(&self, user: &User) -> RepoResult<UserId>;
    fn get_user(&self, id: UserId) -> RepoResult<Option<User>>;
    /// Deletes the user and every trip it owns. Returns whether the user existed.
    fn delete_user(&self, id: UserId) -> RepoResult<bool>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn upsert_user(&self, user: &User) -> RepoResult<UserId> {
        if user.id == UNASSIGNED_ID {
            self.conn.execute(
                "INSERT INTO users (first_name, last_name, email, password_hash, city)
                 VALUES (?1, ?2, ?3, ?4, ?5);",
                params![
                    user.first_name.as_str(),
                    user.last_name.as_str(),
                    user.email.as_str(),
                    user.password_hash.as_str(),
                    user.city.as_str(),
                ],
            )?;
            return Ok(self.conn.last_insert_rowid());
        }

        self.conn.execute(
            "INSERT INTO users (id, first_name, last_name, email, password_hash, city)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(id) DO UPDATE SET
                first_name = excluded.first_name,
                last_name = excluded.last_name,
                email = excluded.email,
                password_hash = excluded.password_hash,
                city = excluded.city;",
            params![
                user.id,
                user.first_name.as_str(),
                user.last_name.as_str(),
                user.email.as_str(),
                user.password_hash.as_str(),
                user.city.as_str(),
            ],
        )?;
        Ok(user.id)
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, first_name, last_name, email, password_hash, city
             FROM users
             WHERE id = ?1;",
        )?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(User {
                id: row.get("id")?,
                first_name: row.get("first_name")?,
                last_name: row.get("last_name")?,
                email: row.get("email")?,
                password_hash: row.get("password_hash")?,
                city: row.get("city")?,
            }));
        }
        Ok(None)
    }

    fn delete_user(&self, id: UserId) -> RepoResult<bool> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let trip_ids = {
            let mut stmt = tx.prepare("SELECT trip_id FROM trips WHERE user_id = ?1;")?;
            let ids = stmt.query_map([id], |row| row.get::<_, i64>(0))?;
            ids.collect::<Result<Vec<_>, _>>()?
        };
        for trip_id in trip_ids {
            delete_trip_in_tx(&tx, trip_id)?;
        }
        let removed = tx.execute("DELETE FROM users WHERE id = ?1;", [id])?;
        tx.commit()?;
        Ok(removed > 0)
    }
}
