use crate::trip::Trip;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Trip store unavailable: {0}")]
    Unavailable(String),
}

/// Outcome of an idempotent insert keyed on (schedule_id, service_date).
#[derive(Debug, PartialEq, Eq)]
pub enum TripInsert {
    Created(Uuid),
    /// A trip for that schedule and date already exists; its id is returned
    /// and nothing is written.
    Exists(Uuid),
}

/// Persistence seam for trip records.
///
/// `compare_and_update` is the mutual-exclusion boundary: the write only
/// lands if no other writer bumped the version since the trip was read.
#[async_trait]
pub trait TripStore: Send + Sync {
    async fn insert(&self, trip: &Trip) -> Result<TripInsert, StoreError>;

    async fn get(&self, trip_id: Uuid) -> Result<Option<Trip>, StoreError>;

    async fn find_by_schedule_date(
        &self,
        schedule_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<Trip>, StoreError>;

    /// Write `trip` back if the stored version still equals `trip.version`,
    /// bumping the stored version by one. Returns false when a concurrent
    /// writer interleaved and the caller must re-read and retry.
    async fn compare_and_update(&self, trip: &Trip) -> Result<bool, StoreError>;
}

/// Single-process store used by tests and local runs. The concurrency
/// semantics mirror the Postgres implementation: version-checked writes,
/// no partial application.
#[derive(Default)]
pub struct MemoryTripStore {
    inner: RwLock<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    trips: HashMap<Uuid, Trip>,
    by_schedule_date: HashMap<(Uuid, NaiveDate), Uuid>,
}

impl MemoryTripStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TripStore for MemoryTripStore {
    async fn insert(&self, trip: &Trip) -> Result<TripInsert, StoreError> {
        let mut inner = self.inner.write().await;
        let key = (trip.schedule_id, trip.service_date);
        if let Some(existing) = inner.by_schedule_date.get(&key) {
            return Ok(TripInsert::Exists(*existing));
        }
        inner.by_schedule_date.insert(key, trip.id);
        inner.trips.insert(trip.id, trip.clone());
        Ok(TripInsert::Created(trip.id))
    }

    async fn get(&self, trip_id: Uuid) -> Result<Option<Trip>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.trips.get(&trip_id).cloned())
    }

    async fn find_by_schedule_date(
        &self,
        schedule_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<Trip>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .by_schedule_date
            .get(&(schedule_id, date))
            .and_then(|id| inner.trips.get(id))
            .cloned())
    }

    async fn compare_and_update(&self, trip: &Trip) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        match inner.trips.get_mut(&trip.id) {
            Some(stored) if stored.version == trip.version => {
                let mut next = trip.clone();
                next.version += 1;
                *stored = next;
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;
    use viaro_core::providers::{ScheduleInfo, SeatLayoutInfo};

    fn sample_trip() -> Trip {
        let layout = SeatLayoutInfo {
            bus_id: Uuid::new_v4(),
            seat_ids: vec!["A1".to_string(), "A2".to_string()],
        };
        let schedule = ScheduleInfo {
            id: Uuid::new_v4(),
            route_id: Uuid::new_v4(),
            bus_id: layout.bus_id,
            departure_time: NaiveTime::from_hms_opt(7, 0, 0).unwrap(),
            operating_days: vec![],
            base_price_amount: 1000,
            is_active: true,
            route_stops: vec!["X".to_string(), "Y".to_string()],
        };
        Trip::materialize(&schedule, NaiveDate::from_ymd_opt(2027, 3, 1).unwrap(), &layout)
    }

    #[tokio::test]
    async fn test_insert_is_idempotent_per_schedule_and_date() {
        let store = MemoryTripStore::new();
        let trip = sample_trip();

        assert_eq!(store.insert(&trip).await.unwrap(), TripInsert::Created(trip.id));

        let mut duplicate = trip.clone();
        duplicate.id = Uuid::new_v4();
        assert_eq!(
            store.insert(&duplicate).await.unwrap(),
            TripInsert::Exists(trip.id)
        );
    }

    #[tokio::test]
    async fn test_stale_version_write_is_rejected() {
        let store = MemoryTripStore::new();
        let trip = sample_trip();
        store.insert(&trip).await.unwrap();

        let mut writer_a = store.get(trip.id).await.unwrap().unwrap();
        let mut writer_b = store.get(trip.id).await.unwrap().unwrap();

        writer_a.apply_reserve(&["A1".to_string()]).unwrap();
        assert!(store.compare_and_update(&writer_a).await.unwrap());

        // Writer B read version 0, which is now stale.
        writer_b.apply_reserve(&["A2".to_string()]).unwrap();
        assert!(!store.compare_and_update(&writer_b).await.unwrap());

        let current = store.get(trip.id).await.unwrap().unwrap();
        assert_eq!(current.version, 1);
        assert!(current.booked_seats.contains("A1"));
        assert!(!current.booked_seats.contains("A2"));
    }
}
