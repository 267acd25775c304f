use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Days, NaiveTime, Utc, Weekday};
use uuid::Uuid;
use viaro_booking::{
    Booking, BookingStatus, BookingWorkflow, CreateBooking, Gender, MemoryBookingStore, Passenger,
    PaymentStatus, RefundStatus,
};
use viaro_catalog::Bus;
use viaro_core::providers::{ScheduleInfo, ScheduleProvider, SeatLayoutInfo, SeatLayoutProvider};
use viaro_inventory::{InventoryError, InventoryManager, MemoryTripStore};
use viaro_shared::Masked;

struct FixedProviders {
    schedules: HashMap<Uuid, ScheduleInfo>,
    layouts: HashMap<Uuid, SeatLayoutInfo>,
}

#[async_trait]
impl ScheduleProvider for FixedProviders {
    async fn schedule(
        &self,
        schedule_id: Uuid,
    ) -> Result<Option<ScheduleInfo>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.schedules.get(&schedule_id).cloned())
    }
}

#[async_trait]
impl SeatLayoutProvider for FixedProviders {
    async fn seat_layout(
        &self,
        bus_id: Uuid,
    ) -> Result<Option<SeatLayoutInfo>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.layouts.get(&bus_id).cloned())
    }
}

fn every_day() -> Vec<Weekday> {
    vec![
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ]
}

/// Inventory manager plus booking workflow over in-memory stores, with a
/// 40-seat bus on a three-stop corridor.
fn build_stack() -> (Arc<InventoryManager>, BookingWorkflow, Uuid) {
    let schedule_id = Uuid::new_v4();
    let bus_id = Uuid::new_v4();

    let schedule = ScheduleInfo {
        id: schedule_id,
        route_id: Uuid::new_v4(),
        bus_id,
        departure_time: NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
        operating_days: every_day(),
        base_price_amount: 4500,
        is_active: true,
        route_stops: vec![
            "Central Terminal".to_string(),
            "Airport Road".to_string(),
            "Hillside".to_string(),
            "Harbor Gate".to_string(),
        ],
    };
    let layout = SeatLayoutInfo {
        bus_id,
        seat_ids: Bus::grid_layout(10, 4).unwrap(),
    };

    let providers = Arc::new(FixedProviders {
        schedules: HashMap::from([(schedule_id, schedule)]),
        layouts: HashMap::from([(bus_id, layout)]),
    });

    let inventory = Arc::new(InventoryManager::new(
        Arc::new(MemoryTripStore::new()),
        providers.clone(),
        providers,
    ));
    let workflow = BookingWorkflow::new(inventory.clone(), Arc::new(MemoryBookingStore::new()));

    (inventory, workflow, schedule_id)
}

fn passenger(name: &str) -> Passenger {
    Passenger {
        name: name.to_string(),
        gender: Gender::Female,
        phone: Masked("0712000000".to_string()),
        email: None,
    }
}

fn seats(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn reservation_scenario_end_to_end() {
    let (inventory, _, schedule_id) = build_stack();
    let date = Utc::now().date_naive().checked_add_days(Days::new(1)).unwrap();

    let trip_id = inventory.materialize(schedule_id, date).await.unwrap();
    assert_eq!(inventory.availability(trip_id).await.unwrap().available_seats, 40);

    let snapshot = inventory.reserve_seats(trip_id, &seats(&["A1", "A2"])).await.unwrap();
    assert_eq!(snapshot.available_seats, 38);

    let err = inventory
        .reserve_seats(trip_id, &seats(&["A2", "A3"]))
        .await
        .unwrap_err();
    match err {
        InventoryError::SeatAlreadyBooked { seats } => assert_eq!(seats, vec!["A2".to_string()]),
        other => panic!("expected SeatAlreadyBooked, got {other}"),
    }
    // The losing request must not have touched state.
    let snapshot = inventory.availability(trip_id).await.unwrap();
    assert_eq!(snapshot.available_seats, 38);
    assert_eq!(snapshot.booked_seat_ids, vec!["A1".to_string(), "A2".to_string()]);

    let snapshot = inventory.release_seats(trip_id, &seats(&["A1"])).await.unwrap();
    assert_eq!(snapshot.available_seats, 39);
    assert_eq!(snapshot.booked_seat_ids, vec!["A2".to_string()]);

    // Materialization stays idempotent after traffic.
    assert_eq!(inventory.materialize(schedule_id, date).await.unwrap(), trip_id);
}

#[tokio::test]
async fn booking_lifecycle_confirm_then_cancel_opens_refund() {
    let (inventory, workflow, schedule_id) = build_stack();
    let date = Utc::now().date_naive().checked_add_days(Days::new(2)).unwrap();
    let trip_id = inventory.materialize(schedule_id, date).await.unwrap();
    let user_id = Uuid::new_v4();

    let booking: Booking = workflow
        .create(CreateBooking {
            trip_id,
            user_id,
            seat_ids: seats(&["B1", "B2"]),
            passengers: vec![passenger("Asha"), passenger("Nina")],
            boarding_point: "Central Terminal".to_string(),
            drop_point: "Harbor Gate".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(booking.status, BookingStatus::Pending);
    assert_eq!(booking.total_price_amount, 9000);
    // Pending bookings hold nothing.
    assert_eq!(inventory.availability(trip_id).await.unwrap().available_seats, 40);

    let booking = workflow.confirm(booking.id).await.unwrap();
    assert_eq!(booking.status, BookingStatus::Confirmed);
    assert_eq!(booking.payment_status, PaymentStatus::Paid);
    assert_eq!(inventory.availability(trip_id).await.unwrap().available_seats, 38);

    let (booking, refund) = workflow
        .cancel(booking.id, "Change of plans".to_string())
        .await
        .unwrap();
    assert_eq!(booking.status, BookingStatus::Cancelled);
    assert_eq!(booking.payment_status, PaymentStatus::Refunded);

    let refund = refund.expect("paid booking must open a refund");
    assert_eq!(refund.status, RefundStatus::Requested);
    assert_eq!(refund.amount, 9000);

    // Seats went back to the pool.
    let snapshot = inventory.availability(trip_id).await.unwrap();
    assert_eq!(snapshot.available_seats, 40);
    assert!(snapshot.booked_seat_ids.is_empty());
}

#[tokio::test]
async fn overlapping_confirms_let_exactly_one_booking_through() {
    let (inventory, workflow, schedule_id) = build_stack();
    let workflow = Arc::new(workflow);
    let date = Utc::now().date_naive().checked_add_days(Days::new(3)).unwrap();
    let trip_id = inventory.materialize(schedule_id, date).await.unwrap();

    let mut ids = Vec::new();
    for _ in 0..4 {
        let booking = workflow
            .create(CreateBooking {
                trip_id,
                user_id: Uuid::new_v4(),
                seat_ids: seats(&["C1"]),
                passengers: vec![passenger("Rider")],
                boarding_point: "Central Terminal".to_string(),
                drop_point: "Harbor Gate".to_string(),
            })
            .await
            .unwrap();
        ids.push(booking.id);
    }

    let mut handles = Vec::new();
    for id in ids {
        let workflow = workflow.clone();
        handles.push(tokio::spawn(async move { workflow.confirm(id).await }));
    }

    let mut confirmed = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            confirmed += 1;
        }
    }
    assert_eq!(confirmed, 1);

    let snapshot = inventory.availability(trip_id).await.unwrap();
    assert_eq!(snapshot.available_seats, 39);
    assert_eq!(snapshot.booked_seat_ids, vec!["C1".to_string()]);
}
