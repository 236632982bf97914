//! Read-only export of trips and their events to an external calendar.
//!
//! # Invariants
//! - The job never writes to the store.
//! - A failure for one trip is recorded and the next trip is attempted.
//! - Cancellation is honoured between trips.

use super::{JobError, JobOutcome, PeriodicJob};
use crate::model::event::Event;
use crate::model::trip::{Trip, TripId};
use crate::repo::RepoResult;
use crate::service::trip_service::TripService;
use async_trait::async_trait;
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Failure reported by a calendar backend for one trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportError {
    message: String,
}

impl ExportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Display for ExportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "calendar export failed: {}", self.message)
    }
}

impl Error for ExportError {}

/// Destination calendar for trip events.
#[async_trait]
pub trait CalendarExporter: Send + Sync {
    async fn export_trip(&self, trip: &Trip, events: &[Event]) -> Result<(), ExportError>;
}

/// Exporter used when no calendar is connected; only logs what it would send.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCalendarExporter;

#[async_trait]
impl CalendarExporter for NoopCalendarExporter {
    async fn export_trip(&self, trip: &Trip, events: &[Event]) -> Result<(), ExportError> {
        debug!(
            "event=calendar_export module=jobs status=skipped trip_id={} events={}",
            trip.trip_id,
            events.len()
        );
        Ok(())
    }
}

/// Outcome of one sync pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub trips: usize,
    pub exported: usize,
    pub events: usize,
    pub failed: Vec<(TripId, String)>,
    pub cancelled: bool,
}

pub struct CalendarSyncJob {
    service: TripService,
    exporter: Arc<dyn CalendarExporter>,
}

impl CalendarSyncJob {
    pub const NAME: &'static str = "calendar_sync";

    pub fn new(service: TripService) -> Self {
        Self::with_exporter(service, Arc::new(NoopCalendarExporter))
    }

    pub fn with_exporter(service: TripService, exporter: Arc<dyn CalendarExporter>) -> Self {
        Self { service, exporter }
    }

    /// Exports every trip with its events. Fails only when the trip list
    /// cannot be read.
    pub async fn sync(&self, cancel: &CancellationToken) -> RepoResult<SyncReport> {
        let trips = self.service.all_trips_once().await?;
        let mut report = SyncReport {
            trips: trips.len(),
            ..SyncReport::default()
        };

        for trip in &trips {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }
            match self.sync_trip(trip).await {
                Ok(events) => {
                    report.exported += 1;
                    report.events += events;
                }
                Err(message) => {
                    warn!(
                        "event=calendar_sync_trip module=jobs status=error trip_id={} error={message}",
                        trip.trip_id
                    );
                    report.failed.push((trip.trip_id, message));
                }
            }
        }

        info!(
            "event=calendar_sync module=jobs status=ok trips={} exported={} events={} failed={} cancelled={}",
            report.trips,
            report.exported,
            report.events,
            report.failed.len(),
            report.cancelled
        );
        Ok(report)
    }

    async fn sync_trip(&self, trip: &Trip) -> Result<usize, String> {
        let events = self
            .service
            .events_for_trip_once(trip.trip_id)
            .await
            .map_err(|err| err.to_string())?;
        self.exporter
            .export_trip(trip, &events)
            .await
            .map_err(|err| err.to_string())?;
        Ok(events.len())
    }
}

impl From<&SyncReport> for JobOutcome {
    fn from(report: &SyncReport) -> Self {
        Self {
            processed: report.trips,
            changed: report.exported,
            failed: report.failed.len(),
            cancelled: report.cancelled,
        }
    }
}

#[async_trait]
impl PeriodicJob for CalendarSyncJob {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn run(&self, cancel: &CancellationToken) -> Result<JobOutcome, JobError> {
        let report = self.sync(cancel).await?;
        Ok(JobOutcome::from(&report))
    }
}
