//! Synchronous SQLite access per entity.
//!
//! # Responsibility
//! - Keep every SQL statement of the core inside this module.
//! - Map rows to domain records and domain records to rows.
//!
//! # Invariants
//! - Upserts never fail on an existing primary key; the row is replaced.
//! - Foreign key violations surface as [`RepoError::Integrity`] and are
//!   never retried or translated further up.
//! - Read paths reject malformed persisted values instead of masking them.

use crate::db::DbError;
use rusqlite::ErrorCode;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod child_repo;
mod codec;
pub mod relations_repo;
pub mod trip_repo;
pub mod user_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Error for every persistence and query operation of the core.
#[derive(Debug)]
pub enum RepoError {
    /// Transport or SQL failure.
    Db(DbError),
    /// Constraint violation, e.g. a child referencing a missing trip.
    Integrity(rusqlite::Error),
    /// Persisted value could not be decoded.
    InvalidData(String),
}

impl RepoError {
    pub fn is_integrity(&self) -> bool {
        matches!(self, Self::Integrity(_))
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Integrity(err) => write!(f, "integrity violation: {err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Integrity(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        match value.sqlite_error_code() {
            Some(ErrorCode::ConstraintViolation) => Self::Integrity(value),
            _ => Self::Db(DbError::Sqlite(value)),
        }
    }
}
