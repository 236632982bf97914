use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tripplanner_core::jobs::scheduler::run_job;
use tripplanner_core::{
    ArchiveJob, CalendarExporter, CalendarSyncJob, Enqueue, Event, JobOutcome, JobScheduler,
    PeriodicJob, Store, Trip, TripId, TripService,
};
use tripplanner_core::jobs::ExportError;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[derive(Default)]
struct RecordingExporter {
    exported: Mutex<Vec<(TripId, usize)>>,
    fail_for: Option<TripId>,
}

#[async_trait]
impl CalendarExporter for RecordingExporter {
    async fn export_trip(&self, trip: &Trip, events: &[Event]) -> Result<(), ExportError> {
        if self.fail_for == Some(trip.trip_id) {
            return Err(ExportError::new("calendar unavailable"));
        }
        self.exported
            .lock()
            .unwrap()
            .push((trip.trip_id, events.len()));
        Ok(())
    }
}

async fn seeded_service() -> (TripService, TripId, TripId) {
    let service = TripService::new(Store::open_in_memory().unwrap());
    let old = service
        .upsert_trip(&Trip::new("Old", "A", "B", date(2024, 1, 1), date(2024, 1, 5)))
        .await
        .unwrap();
    let future = service
        .upsert_trip(&Trip::new("Future", "A", "B", date(2024, 8, 1), date(2024, 8, 5)))
        .await
        .unwrap();
    let start = date(2024, 8, 2).and_hms_opt(10, 0, 0).unwrap();
    let end = date(2024, 8, 2).and_hms_opt(12, 0, 0).unwrap();
    service
        .upsert_event(&Event::new(future, "Museum", start, end, "tour"))
        .await
        .unwrap();
    (service, old, future)
}

#[tokio::test]
async fn archive_job_uses_its_clock() {
    let (service, old, future) = seeded_service().await;
    let job = ArchiveJob::with_clock(service.clone(), || date(2024, 6, 1));

    let outcome = run_job(&job, &CancellationToken::new()).await.unwrap();
    assert_eq!(
        outcome,
        JobOutcome {
            processed: 2,
            changed: 1,
            failed: 0,
            cancelled: false,
        }
    );
    assert!(service.trip_once(old).await.unwrap().unwrap().archived);
    assert!(!service.trip_once(future).await.unwrap().unwrap().archived);
}

#[tokio::test]
async fn calendar_sync_with_no_trips_succeeds() {
    let service = TripService::new(Store::open_in_memory().unwrap());
    let job = CalendarSyncJob::new(service);

    let report = job.sync(&CancellationToken::new()).await.unwrap();
    assert_eq!(report.trips, 0);
    assert_eq!(report.exported, 0);
    assert!(report.failed.is_empty());
}

#[tokio::test]
async fn calendar_sync_exports_every_trip_without_writing() {
    let (service, old, future) = seeded_service().await;
    let before = service.all_trip_relations().first().await.unwrap();
    let exporter = Arc::new(RecordingExporter::default());
    let job = CalendarSyncJob::with_exporter(service.clone(), exporter.clone());

    let mut watcher = service.all_trip_relations();
    watcher.next().await.unwrap().unwrap();

    let report = job.sync(&CancellationToken::new()).await.unwrap();
    assert_eq!(report.trips, 2);
    assert_eq!(report.exported, 2);
    assert_eq!(report.events, 1);
    assert_eq!(*exporter.exported.lock().unwrap(), vec![(old, 0), (future, 1)]);

    assert_eq!(service.all_trip_relations().first().await.unwrap(), before);
    assert!(
        tokio::time::timeout(Duration::from_millis(100), watcher.next())
            .await
            .is_err()
    );
}

#[tokio::test]
async fn calendar_sync_failure_for_one_trip_does_not_stop_the_rest() {
    let (service, old, future) = seeded_service().await;
    let exporter = Arc::new(RecordingExporter {
        fail_for: Some(old),
        ..RecordingExporter::default()
    });
    let job = CalendarSyncJob::with_exporter(service, exporter.clone());

    let outcome = job.run(&CancellationToken::new()).await.unwrap();
    assert_eq!(outcome.failed, 1);
    assert_eq!(outcome.changed, 1);
    assert_eq!(*exporter.exported.lock().unwrap(), vec![(future, 1)]);
}

#[tokio::test]
async fn scheduler_keeps_existing_job_and_shuts_down() {
    let (service, old, _) = seeded_service().await;
    let scheduler = JobScheduler::new();

    let job = Arc::new(ArchiveJob::with_clock(service.clone(), || date(2024, 6, 1)));
    let again = Arc::new(ArchiveJob::new(service.clone()));
    assert_eq!(
        scheduler.ensure_periodic(job, Duration::from_secs(3600)),
        Ok(Enqueue::Scheduled)
    );
    assert_eq!(
        scheduler.ensure_periodic(again, Duration::from_secs(60)),
        Ok(Enqueue::AlreadyPending)
    );
    assert!(scheduler.is_pending(ArchiveJob::NAME));

    let mut trip = service.trip(old);
    while !trip.next().await.unwrap().unwrap().unwrap().archived {}

    scheduler.shutdown().await;
    assert!(!scheduler.is_pending(ArchiveJob::NAME));
}
