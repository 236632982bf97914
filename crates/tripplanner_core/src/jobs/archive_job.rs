//! Periodic archival of expired trips.

use super::{JobError, JobOutcome, PeriodicJob};
use crate::repo::RepoResult;
use crate::service::archive::{local_today, ArchiveReport};
use crate::service::trip_service::TripService;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

type Clock = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

/// Archives trips whose end date lies before the current local date.
pub struct ArchiveJob {
    service: TripService,
    today: Clock,
}

impl ArchiveJob {
    pub const NAME: &'static str = "trip_archive";

    pub fn new(service: TripService) -> Self {
        Self::with_clock(service, local_today)
    }

    /// Uses `today` instead of the local wall clock.
    pub fn with_clock(
        service: TripService,
        today: impl Fn() -> NaiveDate + Send + Sync + 'static,
    ) -> Self {
        Self {
            service,
            today: Arc::new(today),
        }
    }

    /// One archival pass with the full per-trip report.
    pub async fn archive(&self, cancel: &CancellationToken) -> RepoResult<ArchiveReport> {
        let today = self.today.as_ref()();
        self.service
            .archive_expired_trips_until_cancelled(today, cancel)
            .await
    }
}

impl From<&ArchiveReport> for JobOutcome {
    fn from(report: &ArchiveReport) -> Self {
        Self {
            processed: report.scanned,
            changed: report.archived.len(),
            failed: report.failed.len(),
            cancelled: report.cancelled,
        }
    }
}

#[async_trait]
impl PeriodicJob for ArchiveJob {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn run(&self, cancel: &CancellationToken) -> Result<JobOutcome, JobError> {
        let report = self.archive(cancel).await?;
        Ok(JobOutcome::from(&report))
    }
}
