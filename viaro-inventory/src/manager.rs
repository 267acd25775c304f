use crate::error::InventoryError;
use crate::store::{StoreError, TripInsert, TripStore};
use crate::trip::{AvailabilitySnapshot, Trip, TripPhase};
use chrono::{NaiveDate, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;
use viaro_core::providers::{ScheduleProvider, SeatLayoutProvider};

const DEFAULT_MAX_RETRIES: u32 = 5;

/// Authoritative owner of per-trip seat state.
///
/// Reservations are serialized per trip through version-checked writes
/// against the store; requests for distinct trips never contend. A write
/// that keeps losing the version race is retried a bounded number of times
/// and then surfaced as a retryable conflict.
pub struct InventoryManager {
    store: Arc<dyn TripStore>,
    schedules: Arc<dyn ScheduleProvider>,
    layouts: Arc<dyn SeatLayoutProvider>,
    max_retries: u32,
}

impl InventoryManager {
    pub fn new(
        store: Arc<dyn TripStore>,
        schedules: Arc<dyn ScheduleProvider>,
        layouts: Arc<dyn SeatLayoutProvider>,
    ) -> Self {
        Self {
            store,
            schedules,
            layouts,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    /// Create the trip record for (schedule, date). Idempotent per pair:
    /// a second call returns the existing trip id and changes nothing.
    pub async fn materialize(
        &self,
        schedule_id: Uuid,
        date: NaiveDate,
    ) -> Result<Uuid, InventoryError> {
        if date < Utc::now().date_naive() {
            return Err(InventoryError::DateInPast(date));
        }

        let schedule = self
            .schedules
            .schedule(schedule_id)
            .await
            .map_err(|e| InventoryError::Provider(e.to_string()))?
            .ok_or(InventoryError::ScheduleNotFound(schedule_id))?;

        if !schedule.operates_on(date) {
            return Err(InventoryError::ScheduleInactive { schedule_id, date });
        }

        if let Some(existing) = self.store.find_by_schedule_date(schedule_id, date).await? {
            debug!(trip_id = %existing.id, %schedule_id, %date, "Trip already materialized");
            return Ok(existing.id);
        }

        let layout = self
            .layouts
            .seat_layout(schedule.bus_id)
            .await
            .map_err(|e| InventoryError::Provider(e.to_string()))?
            .ok_or(InventoryError::LayoutNotFound(schedule.bus_id))?;

        let trip = Trip::materialize(&schedule, date, &layout);
        match self.store.insert(&trip).await? {
            TripInsert::Created(id) => {
                info!(trip_id = %id, %schedule_id, %date, seats = trip.total_seats(), "Materialized trip");
                Ok(id)
            }
            // Lost a materialization race; the winner's trip is just as good.
            TripInsert::Exists(id) => Ok(id),
        }
    }

    /// Atomically add `seat_ids` to the trip's booked set.
    ///
    /// Either every requested seat is reserved or none are. When two
    /// requests race for overlapping seats, the first committer wins and
    /// the loser sees `SeatAlreadyBooked` on its retry read.
    pub async fn reserve_seats(
        &self,
        trip_id: Uuid,
        seat_ids: &[String],
    ) -> Result<AvailabilitySnapshot, InventoryError> {
        validate_request_shape(seat_ids)?;

        let today = Utc::now().date_naive();
        for attempt in 1..=self.max_retries {
            let mut trip = self
                .store
                .get(trip_id)
                .await?
                .ok_or(InventoryError::TripNotFound(trip_id))?;

            if trip.phase(today) == TripPhase::Closed {
                return Err(InventoryError::TripClosed(trip.service_date));
            }

            trip.apply_reserve(seat_ids)?;

            if self.store.compare_and_update(&trip).await? {
                debug!(%trip_id, seats = ?seat_ids, available = trip.available_seats(), "Reserved seats");
                return Ok(trip.availability());
            }

            warn!(%trip_id, attempt, "Reservation lost version race, retrying");
        }

        Err(InventoryError::ConflictRetriesExhausted {
            attempts: self.max_retries,
        })
    }

    /// Remove `seat_ids` from the booked set, restoring availability.
    /// Identifiers not currently booked are ignored so rollback paths can
    /// always run.
    pub async fn release_seats(
        &self,
        trip_id: Uuid,
        seat_ids: &[String],
    ) -> Result<AvailabilitySnapshot, InventoryError> {
        if seat_ids.is_empty() {
            return Err(InventoryError::EmptySeatSelection);
        }

        for attempt in 1..=self.max_retries {
            let mut trip = self
                .store
                .get(trip_id)
                .await?
                .ok_or(InventoryError::TripNotFound(trip_id))?;

            trip.apply_release(seat_ids);

            if self.store.compare_and_update(&trip).await? {
                debug!(%trip_id, seats = ?seat_ids, available = trip.available_seats(), "Released seats");
                return Ok(trip.availability());
            }

            warn!(%trip_id, attempt, "Release lost version race, retrying");
        }

        Err(InventoryError::ConflictRetriesExhausted {
            attempts: self.max_retries,
        })
    }

    /// Current seat state, reflecting every mutation committed before the
    /// read. This is the number shown to the next customer choosing seats.
    pub async fn availability(&self, trip_id: Uuid) -> Result<AvailabilitySnapshot, InventoryError> {
        Ok(self.trip(trip_id).await?.availability())
    }

    /// Full trip record (price, boarding points, seat state).
    pub async fn trip(&self, trip_id: Uuid) -> Result<Trip, InventoryError> {
        self.store
            .get(trip_id)
            .await?
            .ok_or(InventoryError::TripNotFound(trip_id))
    }
}

fn validate_request_shape(seat_ids: &[String]) -> Result<(), InventoryError> {
    if seat_ids.is_empty() {
        return Err(InventoryError::EmptySeatSelection);
    }
    let mut seen = HashSet::new();
    for seat in seat_ids {
        if !seen.insert(seat.as_str()) {
            return Err(InventoryError::DuplicateSeatInRequest(seat.clone()));
        }
    }
    Ok(())
}

impl From<StoreError> for InventoryError {
    fn from(e: StoreError) -> Self {
        InventoryError::Unavailable(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryTripStore;
    use async_trait::async_trait;
    use chrono::{Datelike, Duration, NaiveTime};
    use std::collections::HashMap;
    use viaro_core::providers::{ScheduleInfo, SeatLayoutInfo};

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

    fn forty_seat_layout(bus_id: Uuid) -> SeatLayoutInfo {
        SeatLayoutInfo {
            bus_id,
            seat_ids: (0..40u32)
                .map(|i| format!("{}{}", (b'A' + (i / 4) as u8) as char, i % 4 + 1))
                .collect(),
        }
    }

    fn setup() -> (InventoryManager, Uuid, NaiveDate) {
        let bus_id = Uuid::new_v4();
        let schedule_id = Uuid::new_v4();
        // Far enough out that every weekday check passes for "tomorrow".
        let date = (Utc::now() + Duration::days(7)).date_naive();

        let schedule = ScheduleInfo {
            id: schedule_id,
            route_id: Uuid::new_v4(),
            bus_id,
            departure_time: NaiveTime::from_hms_opt(6, 45, 0).unwrap(),
            operating_days: vec![date.weekday()],
            base_price_amount: 5200,
            is_active: true,
            route_stops: vec![
                "Chennai".to_string(),
                "Vellore".to_string(),
                "Krishnagiri".to_string(),
                "Bengaluru".to_string(),
            ],
        };

        let providers = Arc::new(FixedProviders {
            schedules: HashMap::from([(schedule_id, schedule)]),
            layouts: HashMap::from([(bus_id, forty_seat_layout(bus_id))]),
        });

        let manager = InventoryManager::new(
            Arc::new(MemoryTripStore::new()),
            providers.clone(),
            providers,
        );
        (manager, schedule_id, date)
    }

    fn seats(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_materialize_creates_empty_trip() {
        let (manager, schedule_id, date) = setup();
        let trip_id = manager.materialize(schedule_id, date).await.unwrap();

        let snapshot = manager.availability(trip_id).await.unwrap();
        assert_eq!(snapshot.total_seats, 40);
        assert_eq!(snapshot.available_seats, 40);
        assert!(snapshot.booked_seat_ids.is_empty());
    }

    #[tokio::test]
    async fn test_materialize_is_idempotent() {
        let (manager, schedule_id, date) = setup();
        let first = manager.materialize(schedule_id, date).await.unwrap();

        manager.reserve_seats(first, &seats(&["C1"])).await.unwrap();

        let second = manager.materialize(schedule_id, date).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(manager.availability(first).await.unwrap().available_seats, 39);
    }

    #[tokio::test]
    async fn test_materialize_rejects_off_day_and_unknown_schedule() {
        let (manager, schedule_id, date) = setup();

        let off_day = date + Duration::days(1);
        let err = manager.materialize(schedule_id, off_day).await.unwrap_err();
        assert!(matches!(err, InventoryError::ScheduleInactive { .. }));

        let err = manager.materialize(Uuid::new_v4(), date).await.unwrap_err();
        assert!(matches!(err, InventoryError::ScheduleNotFound(_)));
    }

    #[tokio::test]
    async fn test_materialize_rejects_past_dates() {
        let (manager, schedule_id, _) = setup();
        let yesterday = (Utc::now() - Duration::days(1)).date_naive();
        let err = manager.materialize(schedule_id, yesterday).await.unwrap_err();
        assert!(matches!(err, InventoryError::DateInPast(_)));
    }

    #[tokio::test]
    async fn test_reserve_then_overlapping_reserve_then_release() {
        let (manager, schedule_id, date) = setup();
        let trip_id = manager.materialize(schedule_id, date).await.unwrap();

        let snap = manager
            .reserve_seats(trip_id, &seats(&["A1", "A2"]))
            .await
            .unwrap();
        assert_eq!(snap.available_seats, 38);

        let err = manager
            .reserve_seats(trip_id, &seats(&["A2", "A3"]))
            .await
            .unwrap_err();
        assert!(matches!(err, InventoryError::SeatAlreadyBooked { ref seats } if seats == &vec!["A2".to_string()]));

        // State unchanged by the failed request.
        let snap = manager.availability(trip_id).await.unwrap();
        assert_eq!(snap.available_seats, 38);
        assert_eq!(snap.booked_seat_ids, vec!["A1".to_string(), "A2".to_string()]);

        let snap = manager.release_seats(trip_id, &seats(&["A1"])).await.unwrap();
        assert_eq!(snap.available_seats, 39);
        assert_eq!(snap.booked_seat_ids, vec!["A2".to_string()]);
    }

    #[tokio::test]
    async fn test_reserve_release_roundtrip_restores_state() {
        let (manager, schedule_id, date) = setup();
        let trip_id = manager.materialize(schedule_id, date).await.unwrap();

        let before = manager.availability(trip_id).await.unwrap();
        manager
            .reserve_seats(trip_id, &seats(&["D1", "D2", "D3"]))
            .await
            .unwrap();
        manager
            .release_seats(trip_id, &seats(&["D1", "D2", "D3"]))
            .await
            .unwrap();
        let after = manager.availability(trip_id).await.unwrap();

        assert_eq!(before.available_seats, after.available_seats);
        assert_eq!(before.booked_seat_ids, after.booked_seat_ids);
    }

    #[tokio::test]
    async fn test_request_shape_validation() {
        let (manager, schedule_id, date) = setup();
        let trip_id = manager.materialize(schedule_id, date).await.unwrap();

        let err = manager.reserve_seats(trip_id, &[]).await.unwrap_err();
        assert!(matches!(err, InventoryError::EmptySeatSelection));

        let err = manager
            .reserve_seats(trip_id, &seats(&["B1", "B1"]))
            .await
            .unwrap_err();
        assert!(matches!(err, InventoryError::DuplicateSeatInRequest(ref s) if s == "B1"));

        let err = manager
            .reserve_seats(trip_id, &seats(&["Z9"]))
            .await
            .unwrap_err();
        assert!(matches!(err, InventoryError::SeatNotInLayout { .. }));

        let err = manager
            .reserve_seats(Uuid::new_v4(), &seats(&["A1"]))
            .await
            .unwrap_err();
        assert!(matches!(err, InventoryError::TripNotFound(_)));
    }

    #[tokio::test]
    async fn test_past_trip_is_read_only() {
        let bus_id = Uuid::new_v4();
        let layout = forty_seat_layout(bus_id);
        let schedule = ScheduleInfo {
            id: Uuid::new_v4(),
            route_id: Uuid::new_v4(),
            bus_id,
            departure_time: NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
            operating_days: vec![],
            base_price_amount: 100,
            is_active: true,
            route_stops: vec!["X".to_string(), "Y".to_string()],
        };
        let yesterday = (Utc::now() - Duration::days(1)).date_naive();
        let trip = Trip::materialize(&schedule, yesterday, &layout);
        let trip_id = trip.id;

        let store = Arc::new(MemoryTripStore::new());
        store.insert(&trip).await.unwrap();
        let providers = Arc::new(FixedProviders {
            schedules: HashMap::new(),
            layouts: HashMap::new(),
        });
        let manager = InventoryManager::new(store, providers.clone(), providers);

        let err = manager
            .reserve_seats(trip_id, &seats(&["A1"]))
            .await
            .unwrap_err();
        assert!(matches!(err, InventoryError::TripClosed(_)));
    }

    #[tokio::test]
    async fn test_overlapping_concurrent_reservations_one_winner() {
        let (manager, schedule_id, date) = setup();
        let manager = Arc::new(manager);
        let trip_id = manager.materialize(schedule_id, date).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let manager = manager.clone();
            handles.push(tokio::spawn(async move {
                manager.reserve_seats(trip_id, &seats(&["F1", "F2"])).await
            }));
        }

        let mut successes = 0;
        let mut seat_conflicts = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => successes += 1,
                Err(InventoryError::SeatAlreadyBooked { .. }) => seat_conflicts += 1,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }

        assert_eq!(successes, 1);
        assert_eq!(seat_conflicts, 7);

        let snap = manager.availability(trip_id).await.unwrap();
        assert_eq!(snap.available_seats, 38);
    }

    #[tokio::test]
    async fn test_disjoint_concurrent_reservations_all_commit() {
        let (manager, schedule_id, date) = setup();
        let manager = Arc::new(manager.with_max_retries(64));
        let trip_id = manager.materialize(schedule_id, date).await.unwrap();

        let rows = ["A", "B", "C", "D", "E", "F", "G", "H"];
        let mut handles = Vec::new();
        for row in rows {
            let manager = manager.clone();
            let request = vec![format!("{row}1"), format!("{row}2")];
            handles.push(tokio::spawn(async move {
                manager.reserve_seats(trip_id, &request).await
            }));
        }

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let snap = manager.availability(trip_id).await.unwrap();
        assert_eq!(snap.available_seats, 40 - 16);
        assert_eq!(snap.booked_seat_ids.len(), 16);
    }
}
