use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use tripplanner_core::{Event, Flight, Reminder, Store, Trip, TripService};

fn at(d: u32, h: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, d)
        .unwrap()
        .and_hms_opt(h, 0, 0)
        .unwrap()
}

#[tokio::test]
async fn reminders_cover_the_next_day_across_trips() {
    let service = TripService::new(Store::open_in_memory().unwrap());
    let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    let end = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
    let first = service
        .upsert_trip(&Trip::new("First", "A", "B", start, end))
        .await
        .unwrap();
    let second = service
        .upsert_trip(&Trip::new("Second", "A", "C", start, end))
        .await
        .unwrap();

    let now = at(2, 12);
    service
        .upsert_event(&Event::new(first, "Past", at(2, 11), at(2, 12), "tour"))
        .await
        .unwrap();
    service
        .upsert_event(&Event::new(first, "Dinner", at(2, 19), at(2, 21), "dinner"))
        .await
        .unwrap();
    service
        .upsert_event(&Event::new(second, "Edge", at(3, 12), at(3, 13), "tour"))
        .await
        .unwrap();
    service
        .upsert_event(&Event::new(second, "Too late", at(3, 13), at(3, 14), "tour"))
        .await
        .unwrap();
    service
        .upsert_flight(&Flight::new(second, "Swiss", "LX 1", at(3, 7), at(3, 9), Decimal::ONE))
        .await
        .unwrap();

    let due = service.due_reminders(now).await.unwrap();
    let starts: Vec<NaiveDateTime> = due.iter().map(Reminder::starts_at).collect();
    assert_eq!(starts, vec![at(2, 19), at(3, 7), at(3, 12)]);
    assert!(matches!(&due[1], Reminder::Flight(flight) if flight.trip_id == second));
    assert_eq!(due[0].title(), "Dinner at 19:00");
}
