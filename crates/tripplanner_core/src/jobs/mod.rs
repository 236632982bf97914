//! Periodic background work.
//!
//! # Responsibility
//! - Define the contract every background job implements.
//! - Schedule jobs by name with keep-existing semantics.
//!
//! # Invariants
//! - At most one pending schedule exists per job name.
//! - Runs of one job never overlap.
//! - A job honours its cancellation token between units of work.

use crate::repo::RepoError;
use async_trait::async_trait;
use std::error::Error;
use std::fmt::{Display, Formatter};
use tokio_util::sync::CancellationToken;

pub mod archive_job;
pub mod calendar_sync;
pub mod scheduler;

pub use archive_job::ArchiveJob;
pub use calendar_sync::{
    CalendarExporter, CalendarSyncJob, ExportError, NoopCalendarExporter, SyncReport,
};
pub use scheduler::{Enqueue, JobScheduler};

/// A unit of background work that can be run repeatedly.
#[async_trait]
pub trait PeriodicJob: Send + Sync {
    /// Unique schedule key.
    fn name(&self) -> &'static str;

    /// Performs one run. Implementations stop early once `cancel` fires.
    async fn run(&self, cancel: &CancellationToken) -> Result<JobOutcome, JobError>;
}

/// Counters reported by one job run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JobOutcome {
    pub processed: usize,
    pub changed: usize,
    pub failed: usize,
    pub cancelled: bool,
}

/// Failure of a whole job run.
#[derive(Debug)]
pub enum JobError {
    Repo(RepoError),
}

impl Display for JobError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for JobError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<RepoError> for JobError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Rejected scheduling request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerError {
    ZeroInterval,
    ShutDown,
}

impl Display for SchedulerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroInterval => write!(f, "job interval must be greater than zero"),
            Self::ShutDown => write!(f, "scheduler has been shut down"),
        }
    }
}

impl Error for SchedulerError {}
