use chrono::NaiveDate;
use futures::StreamExt;
use std::time::Duration;
use tokio::time::timeout;
use tripplanner_core::{Note, Store, Trip, TripService, User};

const WAIT: Duration = Duration::from_secs(5);
const QUIET: Duration = Duration::from_millis(100);

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn names(trips: &[Trip]) -> Vec<&str> {
    trips.iter().map(|trip| trip.name.as_str()).collect()
}

#[tokio::test]
async fn archived_views_move_trips_between_lists() {
    let service = TripService::new(Store::open_in_memory().unwrap());
    let a = service
        .upsert_trip(&Trip::new("A", "X", "Y", date(2024, 1, 1), date(2024, 1, 2)))
        .await
        .unwrap();
    service
        .upsert_trip(&Trip::new("B", "X", "Y", date(2024, 2, 1), date(2024, 2, 2)))
        .await
        .unwrap();

    let mut active = service.trips_by_archived(false);
    let mut archived = service.trips_by_archived(true);
    assert_eq!(names(&active.next().await.unwrap().unwrap()), vec!["A", "B"]);
    assert!(archived.next().await.unwrap().unwrap().is_empty());

    assert!(service.archive_trip(a, true).await.unwrap());

    let now_active = timeout(WAIT, active.next()).await.unwrap().unwrap().unwrap();
    let now_archived = timeout(WAIT, archived.next()).await.unwrap().unwrap().unwrap();
    assert_eq!(names(&now_active), vec!["B"]);
    assert_eq!(names(&now_archived), vec!["A"]);
}

#[tokio::test]
async fn burst_of_writes_is_coalesced_into_latest_state() {
    let service = TripService::new(Store::open_in_memory().unwrap());
    let mut trips = service.trips();
    assert!(trips.next().await.unwrap().unwrap().is_empty());

    for day in 1..=5 {
        service
            .upsert_trip(&Trip::new(format!("T{day}"), "X", "Y", date(2024, 1, day), date(2024, 1, day)))
            .await
            .unwrap();
    }

    let latest = timeout(WAIT, trips.next()).await.unwrap().unwrap().unwrap();
    assert_eq!(latest.len(), 5);
    assert!(timeout(QUIET, trips.next()).await.is_err());
}

#[tokio::test]
async fn unrelated_tables_do_not_trigger_a_rerun() {
    let service = TripService::new(Store::open_in_memory().unwrap());
    let trip_id = service
        .upsert_trip(&Trip::new("A", "X", "Y", date(2024, 1, 1), date(2024, 1, 2)))
        .await
        .unwrap();

    let mut notes = service.notes_for_trip(trip_id);
    assert!(notes.next().await.unwrap().unwrap().is_empty());

    service
        .upsert_user(&User::new("Ada", "L", "ada@example.org", "h", "London"))
        .await
        .unwrap();
    assert!(timeout(QUIET, notes.next()).await.is_err());

    service
        .upsert_note(&Note::new(trip_id, "hello"))
        .await
        .unwrap();
    let emitted = timeout(WAIT, notes.next()).await.unwrap().unwrap().unwrap();
    assert_eq!(emitted.len(), 1);
}

#[tokio::test]
async fn search_view_updates_as_trips_change() {
    let service = TripService::new(Store::open_in_memory().unwrap());
    let mut stream = Box::pin(service.search_trips("paris").into_stream());
    assert!(stream.next().await.unwrap().unwrap().is_empty());

    service
        .upsert_trip(&Trip::new("Weekend", "Home", "PARIS", date(2024, 3, 1), date(2024, 3, 3)))
        .await
        .unwrap();
    let hits = timeout(WAIT, stream.next()).await.unwrap().unwrap().unwrap();
    assert_eq!(names(&hits), vec!["Weekend"]);
}

#[tokio::test]
async fn dropping_a_view_detaches_it() {
    let service = TripService::new(Store::open_in_memory().unwrap());
    let baseline = service.store().subscriber_count();

    let first = service.trips();
    let second = service.trip_relations(1);
    assert_eq!(service.store().subscriber_count(), baseline + 2);

    drop(first);
    assert_eq!(service.store().subscriber_count(), baseline + 1);
    drop(second);
    assert_eq!(service.store().subscriber_count(), baseline);

    service
        .upsert_trip(&Trip::new("A", "X", "Y", date(2024, 1, 1), date(2024, 1, 2)))
        .await
        .unwrap();
}

#[tokio::test]
async fn view_outlives_the_service_that_created_it() {
    let service = TripService::new(Store::open_in_memory().unwrap());
    service
        .upsert_trip(&Trip::new("Kept", "X", "Y", date(2024, 1, 1), date(2024, 1, 2)))
        .await
        .unwrap();
    let mut live = service.trips();
    drop(service);

    let first = timeout(WAIT, live.next()).await.unwrap();
    assert_eq!(names(&first.unwrap().unwrap()), vec!["Kept"]);
    // No writer is left, so the view waits instead of ending.
    assert!(timeout(QUIET, live.next()).await.is_err());
}
