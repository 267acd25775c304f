use crate::error::InventoryError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;
use viaro_core::providers::{ScheduleInfo, SeatLayoutInfo};

/// One dated departure materialized from a schedule. The seat layout is
/// snapshotted at materialization time so booked-seat validation never
/// depends on later fleet edits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trip {
    pub id: Uuid,
    pub schedule_id: Uuid,
    pub route_id: Uuid,
    pub bus_id: Uuid,
    pub service_date: NaiveDate,
    pub price_amount: i32,
    pub pickup_points: Vec<String>,
    pub drop_points: Vec<String>,
    pub seat_ids: Vec<String>,
    pub booked_seats: BTreeSet<String>,
    /// Optimistic concurrency token. Bumped by the store on every
    /// successful compare-and-update.
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TripPhase {
    Open,
    Full,
    Closed,
}

/// Read-only availability view returned to callers choosing seats.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilitySnapshot {
    pub trip_id: Uuid,
    pub total_seats: u32,
    pub available_seats: u32,
    pub booked_seat_ids: Vec<String>,
}

impl Trip {
    /// Build a fresh trip from a schedule and the bus layout. Pickup points
    /// are the first half of the route's stop sequence, drop points the rest.
    pub fn materialize(schedule: &ScheduleInfo, date: NaiveDate, layout: &SeatLayoutInfo) -> Self {
        let (pickup_points, drop_points) = split_stops(&schedule.route_stops);
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            schedule_id: schedule.id,
            route_id: schedule.route_id,
            bus_id: schedule.bus_id,
            service_date: date,
            price_amount: schedule.base_price_amount,
            pickup_points,
            drop_points,
            seat_ids: layout.seat_ids.clone(),
            booked_seats: BTreeSet::new(),
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn total_seats(&self) -> u32 {
        self.seat_ids.len() as u32
    }

    pub fn available_seats(&self) -> u32 {
        self.total_seats() - self.booked_seats.len() as u32
    }

    pub fn phase(&self, today: NaiveDate) -> TripPhase {
        if self.service_date < today {
            TripPhase::Closed
        } else if self.available_seats() == 0 {
            TripPhase::Full
        } else {
            TripPhase::Open
        }
    }

    pub fn availability(&self) -> AvailabilitySnapshot {
        AvailabilitySnapshot {
            trip_id: self.id,
            total_seats: self.total_seats(),
            available_seats: self.available_seats(),
            booked_seat_ids: self.booked_seats.iter().cloned().collect(),
        }
    }

    /// Add the requested seats to the booked set, or change nothing at all.
    ///
    /// The caller is expected to have validated request shape (non-empty,
    /// no duplicates) already; this validates against trip state.
    pub fn apply_reserve(&mut self, seat_ids: &[String]) -> Result<(), InventoryError> {
        let unknown: Vec<String> = seat_ids
            .iter()
            .filter(|s| !self.seat_ids.contains(s))
            .cloned()
            .collect();
        if !unknown.is_empty() {
            return Err(InventoryError::SeatNotInLayout { seats: unknown });
        }

        let taken: Vec<String> = seat_ids
            .iter()
            .filter(|s| self.booked_seats.contains(s.as_str()))
            .cloned()
            .collect();
        if !taken.is_empty() {
            return Err(InventoryError::SeatAlreadyBooked { seats: taken });
        }

        // Can only trip if the layout snapshot is inconsistent.
        if seat_ids.len() as u32 > self.available_seats() {
            return Err(InventoryError::InsufficientAvailability {
                requested: seat_ids.len() as u32,
                available: self.available_seats(),
            });
        }

        for seat in seat_ids {
            self.booked_seats.insert(seat.clone());
        }
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Remove the given seats from the booked set. Absent identifiers are a
    /// no-op so cancellation rollback never fails halfway.
    pub fn apply_release(&mut self, seat_ids: &[String]) {
        for seat in seat_ids {
            self.booked_seats.remove(seat.as_str());
        }
        self.updated_at = Utc::now();
    }
}

/// Split an ordered stop sequence into boarding and drop-off halves. The
/// first stop always boards, the last always drops.
pub fn split_stops(stops: &[String]) -> (Vec<String>, Vec<String>) {
    let mid = stops.len().div_ceil(2);
    (stops[..mid].to_vec(), stops[mid..].to_vec())
}
