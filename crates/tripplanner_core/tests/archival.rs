use chrono::{Duration, NaiveDate};
use tokio_util::sync::CancellationToken;
use tripplanner_core::{Store, TableSet, Trip, TripService};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
}

fn ending(name: &str, end: NaiveDate) -> Trip {
    Trip::new(name, "Home", "Away", end - Duration::days(3), end)
}

#[tokio::test]
async fn only_trips_that_ended_before_today_are_archived() {
    let service = TripService::new(Store::open_in_memory().unwrap());
    let yesterday = service
        .upsert_trip(&ending("Yesterday", today() - Duration::days(1)))
        .await
        .unwrap();
    let ends_today = service
        .upsert_trip(&ending("Today", today()))
        .await
        .unwrap();
    let next_week = service
        .upsert_trip(&ending("Next week", today() + Duration::days(7)))
        .await
        .unwrap();

    let report = service.archive_expired_trips(today()).await.unwrap();
    assert_eq!(report.scanned, 3);
    assert_eq!(report.archived, vec![yesterday]);
    assert!(report.failed.is_empty());
    assert!(!report.cancelled);

    assert!(service.trip_once(yesterday).await.unwrap().unwrap().archived);
    assert!(!service.trip_once(ends_today).await.unwrap().unwrap().archived);
    assert!(!service.trip_once(next_week).await.unwrap().unwrap().archived);
}

#[tokio::test]
async fn second_run_is_a_no_op() {
    let service = TripService::new(Store::open_in_memory().unwrap());
    service
        .upsert_trip(&ending("Old", today() - Duration::days(30)))
        .await
        .unwrap();

    let first = service.archive_expired_trips(today()).await.unwrap();
    assert_eq!(first.archived.len(), 1);

    let second = service.archive_expired_trips(today()).await.unwrap();
    assert_eq!(second.scanned, 0);
    assert!(second.archived.is_empty());
}

#[tokio::test]
async fn cancelled_scan_archives_nothing() {
    let service = TripService::new(Store::open_in_memory().unwrap());
    let old = service
        .upsert_trip(&ending("Old", today() - Duration::days(2)))
        .await
        .unwrap();

    let cancel = CancellationToken::new();
    cancel.cancel();
    let report = service
        .archive_expired_trips_until_cancelled(today(), &cancel)
        .await
        .unwrap();

    assert!(report.cancelled);
    assert!(report.archived.is_empty());
    assert!(!service.trip_once(old).await.unwrap().unwrap().archived);
}

#[tokio::test]
async fn manually_unarchived_trip_is_archived_again_on_next_scan() {
    let service = TripService::new(Store::open_in_memory().unwrap());
    let old = service
        .upsert_trip(&ending("Old", today() - Duration::days(2)))
        .await
        .unwrap();
    service.archive_expired_trips(today()).await.unwrap();

    assert!(service.archive_trip(old, false).await.unwrap());
    let report = service.archive_expired_trips(today()).await.unwrap();
    assert_eq!(report.archived, vec![old]);
}

#[tokio::test]
async fn failed_archive_write_does_not_stop_the_scan() {
    let service = TripService::new(Store::open_in_memory().unwrap());
    let locked = service
        .upsert_trip(&ending("Locked", today() - Duration::days(5)))
        .await
        .unwrap();
    let open = service
        .upsert_trip(&ending("Open", today() - Duration::days(4)))
        .await
        .unwrap();
    service
        .store()
        .write(TableSet::EMPTY, |conn| {
            conn.execute_batch(&format!(
                "CREATE TRIGGER refuse_archive BEFORE UPDATE OF archived ON trips
                 WHEN NEW.trip_id = {locked}
                 BEGIN SELECT RAISE(ABORT, 'locked'); END;"
            ))
        })
        .await
        .unwrap();

    let report = service.archive_expired_trips(today()).await.unwrap();
    assert_eq!(report.scanned, 2);
    assert_eq!(report.archived, vec![open]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, locked);
    assert!(report.failed[0].1.contains("locked"));

    assert!(!service.trip_once(locked).await.unwrap().unwrap().archived);
    assert!(service.trip_once(open).await.unwrap().unwrap().archived);
}

#[tokio::test]
async fn cancelling_mid_scan_stops_before_the_next_trip() {
    let service = TripService::new(Store::open_in_memory().unwrap());
    let mut ids = Vec::new();
    for days in [9, 8, 7] {
        let name = format!("Old {days}");
        ids.push(
            service
                .upsert_trip(&ending(&name, today() - Duration::days(days)))
                .await
                .unwrap(),
        );
    }

    let cancel = CancellationToken::new();
    let mut archived = service.trips_by_archived(true);
    let watcher = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            while let Some(Ok(trips)) = archived.next().await {
                if !trips.is_empty() {
                    cancel.cancel();
                    break;
                }
            }
        }
    });

    let report = service
        .archive_expired_trips_until_cancelled(today(), &cancel)
        .await
        .unwrap();
    watcher.await.unwrap();

    assert!(report.cancelled);
    assert_eq!(report.scanned, 3);
    assert_eq!(report.archived, vec![ids[0]]);
    for id in &ids[1..] {
        assert!(!service.trip_once(*id).await.unwrap().unwrap().archived);
    }
}
