//! Trip archival policy.
//!
//! # Responsibility
//! - Archive every active trip whose end date lies before "today".
//! - Run the policy before trip lists are shown.
//!
//! # Invariants
//! - The scan reads a one-shot snapshot of `archived = false` trips, so
//!   already archived trips are never touched and a second run is a no-op.
//! - Each trip is archived by its own write; one failure never aborts the
//!   rest of the scan.
//! - Cancellation is honoured between trips, never in the middle of one.

use crate::model::trip::{Trip, TripId};
use crate::repo::RepoResult;
use crate::service::trip_service::{Live, TripService};
use chrono::{Local, NaiveDate};
use log::{debug, info, warn};
use tokio_util::sync::CancellationToken;

/// Outcome of one archival scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveReport {
    /// Active trips inspected.
    pub scanned: usize,
    /// Trips flipped to archived, in scan order.
    pub archived: Vec<TripId>,
    /// Trips whose archive write failed, with the error text.
    pub failed: Vec<(TripId, String)>,
    /// Trips deleted between the snapshot and their archive write.
    pub skipped: Vec<TripId>,
    /// Whether the scan stopped early because of cancellation.
    pub cancelled: bool,
}

/// The caller's local calendar date.
pub fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

impl TripService {
    /// Archives every active trip that ended before `today`.
    ///
    /// Fails only when the active-trip snapshot cannot be loaded.
    pub async fn archive_expired_trips(&self, today: NaiveDate) -> RepoResult<ArchiveReport> {
        self.archive_expired_trips_until_cancelled(today, &CancellationToken::new())
            .await
    }

    /// Like [`TripService::archive_expired_trips`] but stops between trips
    /// once `cancel` fires.
    pub async fn archive_expired_trips_until_cancelled(
        &self,
        today: NaiveDate,
        cancel: &CancellationToken,
    ) -> RepoResult<ArchiveReport> {
        let active = self.active_trips_once().await?;
        let mut report = ArchiveReport {
            scanned: active.len(),
            ..ArchiveReport::default()
        };

        for trip in active.iter().filter(|trip| trip.is_expired(today)) {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }
            self.archive_one(trip, &mut report).await;
            tokio::task::yield_now().await;
        }

        info!(
            "event=archive_scan module=service status=ok today={today} scanned={} archived={} failed={} skipped={} cancelled={}",
            report.scanned,
            report.archived.len(),
            report.failed.len(),
            report.skipped.len(),
            report.cancelled
        );
        Ok(report)
    }

    async fn archive_one(&self, trip: &Trip, report: &mut ArchiveReport) {
        match self.archive_trip(trip.trip_id, true).await {
            Ok(true) => report.archived.push(trip.trip_id),
            Ok(false) => {
                debug!(
                    "event=archive_trip module=service status=skipped trip_id={} reason=missing",
                    trip.trip_id
                );
                report.skipped.push(trip.trip_id);
            }
            Err(err) => {
                warn!(
                    "event=archive_trip module=service status=error trip_id={} error={err}",
                    trip.trip_id
                );
                report.failed.push((trip.trip_id, err.to_string()));
            }
        }
    }

    /// Entry point for trip list screens: archives expired trips for the
    /// local date, then returns the live list of all trips.
    ///
    /// An archival failure is logged and does not prevent the list.
    pub async fn trip_list(&self) -> Live<Vec<Trip>> {
        if let Err(err) = self.archive_expired_trips(local_today()).await {
            warn!("event=archive_scan module=service status=error error={err}");
        }
        self.trips()
    }
}
