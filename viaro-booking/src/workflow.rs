use crate::models::{Booking, BookingStatus, Passenger, PaymentStatus};
use crate::refund::RefundRequest;
use crate::store::BookingStore;
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;
use viaro_inventory::{InventoryError, InventoryManager};

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("Booking not found: {0}")]
    NotFound(Uuid),

    #[error("Invalid booking transition from {from} to {to}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },

    #[error("Invalid booking request: {0}")]
    Validation(String),

    #[error(transparent)]
    Inventory(#[from] InventoryError),

    #[error("Booking store error: {0}")]
    Store(String),
}

#[derive(Debug, Deserialize)]
pub struct CreateBooking {
    pub trip_id: Uuid,
    pub user_id: Uuid,
    pub seat_ids: Vec<String>,
    pub passengers: Vec<Passenger>,
    pub boarding_point: String,
    pub drop_point: String,
}

/// Drives a booking through pending → confirmed / cancelled. Seats are only
/// ever held through the inventory manager, so a booking can never be
/// confirmed against seats it does not hold.
pub struct BookingWorkflow {
    inventory: Arc<InventoryManager>,
    store: Arc<dyn BookingStore>,
    booking_fee_amount: i32,
}

impl BookingWorkflow {
    pub fn new(inventory: Arc<InventoryManager>, store: Arc<dyn BookingStore>) -> Self {
        Self {
            inventory,
            store,
            booking_fee_amount: 0,
        }
    }

    /// Flat service fee added to every booking total. Refunds cover the
    /// full total, fee included.
    pub fn with_booking_fee(mut self, amount: i32) -> Self {
        self.booking_fee_amount = amount;
        self
    }

    /// Create a booking in `pending`. No seats are held yet; the request is
    /// validated against the trip so obviously-bad bookings die early.
    pub async fn create(&self, req: CreateBooking) -> Result<Booking, BookingError> {
        if req.seat_ids.is_empty() {
            return Err(BookingError::Validation(
                "seat selection must not be empty".to_string(),
            ));
        }
        if req.passengers.len() != req.seat_ids.len() {
            return Err(BookingError::Validation(format!(
                "{} passengers for {} seats",
                req.passengers.len(),
                req.seat_ids.len()
            )));
        }

        let trip = self.inventory.trip(req.trip_id).await?;

        if !trip.pickup_points.contains(&req.boarding_point) {
            return Err(BookingError::Validation(format!(
                "unknown boarding point: {}",
                req.boarding_point
            )));
        }
        if !trip.drop_points.contains(&req.drop_point) {
            return Err(BookingError::Validation(format!(
                "unknown drop point: {}",
                req.drop_point
            )));
        }
        if let Some(unknown) = req.seat_ids.iter().find(|s| !trip.seat_ids.contains(s)) {
            return Err(BookingError::Validation(format!(
                "seat not in layout: {unknown}"
            )));
        }

        let now = Utc::now();
        let booking = Booking {
            id: Uuid::new_v4(),
            trip_id: req.trip_id,
            user_id: req.user_id,
            total_price_amount: trip.price_amount * req.seat_ids.len() as i32
                + self.booking_fee_amount,
            seat_ids: req.seat_ids,
            passengers: req.passengers,
            status: BookingStatus::Pending,
            payment_status: PaymentStatus::Unpaid,
            boarding_point: req.boarding_point,
            drop_point: req.drop_point,
            booked_at: now,
            updated_at: now,
        };

        self.store
            .insert(&booking)
            .await
            .map_err(|e| BookingError::Store(e.to_string()))?;

        info!(booking_id = %booking.id, trip_id = %booking.trip_id, seats = booking.seat_count(), "Created pending booking");
        Ok(booking)
    }

    /// Reserve the booking's seats and mark it confirmed. On reservation
    /// failure the booking is cancelled and the inventory error propagates
    /// so the caller can re-prompt seat selection.
    pub async fn confirm(&self, booking_id: Uuid) -> Result<Booking, BookingError> {
        let booking = self.load(booking_id).await?;
        if booking.status != BookingStatus::Pending {
            return Err(BookingError::InvalidTransition {
                from: booking.status.as_str(),
                to: "CONFIRMED",
            });
        }

        match self
            .inventory
            .reserve_seats(booking.trip_id, &booking.seat_ids)
            .await
        {
            Ok(_) => {
                self.set_status(booking_id, BookingStatus::Confirmed, PaymentStatus::Paid)
                    .await?;
                info!(%booking_id, "Booking confirmed");
                self.load(booking_id).await
            }
            Err(e) => {
                // Nothing was reserved; cancel so the booking cannot be retried
                // into a half-known state.
                warn!(%booking_id, error = %e, "Reservation failed, cancelling booking");
                self.set_status(booking_id, BookingStatus::Cancelled, booking.payment_status)
                    .await?;
                Err(e.into())
            }
        }
    }

    /// Cancel a booking. Confirmed bookings release their seats; paid ones
    /// additionally open a refund request.
    pub async fn cancel(
        &self,
        booking_id: Uuid,
        reason: String,
    ) -> Result<(Booking, Option<RefundRequest>), BookingError> {
        let booking = self.load(booking_id).await?;

        match booking.status {
            BookingStatus::Cancelled => {
                return Err(BookingError::InvalidTransition {
                    from: "CANCELLED",
                    to: "CANCELLED",
                })
            }
            BookingStatus::Confirmed => {
                self.inventory
                    .release_seats(booking.trip_id, &booking.seat_ids)
                    .await?;
            }
            BookingStatus::Pending => {}
        }

        let refund = if booking.payment_status == PaymentStatus::Paid {
            Some(RefundRequest::open(
                booking.id,
                booking.total_price_amount,
                reason,
            ))
        } else {
            None
        };

        let payment_status = if refund.is_some() {
            PaymentStatus::Refunded
        } else {
            booking.payment_status
        };
        self.set_status(booking_id, BookingStatus::Cancelled, payment_status)
            .await?;

        info!(%booking_id, refund = refund.is_some(), "Booking cancelled");
        Ok((self.load(booking_id).await?, refund))
    }

    /// Rollback for a payment that failed after the seat hold was taken:
    /// release the seats and cancel, leaving no partially-applied state.
    pub async fn payment_failed(&self, booking_id: Uuid) -> Result<Booking, BookingError> {
        let booking = self.load(booking_id).await?;
        if booking.status != BookingStatus::Confirmed {
            return Err(BookingError::InvalidTransition {
                from: booking.status.as_str(),
                to: "CANCELLED",
            });
        }

        self.inventory
            .release_seats(booking.trip_id, &booking.seat_ids)
            .await?;
        self.set_status(booking_id, BookingStatus::Cancelled, PaymentStatus::Failed)
            .await?;

        warn!(%booking_id, "Payment failed after seat hold, seats released");
        self.load(booking_id).await
    }

    pub async fn get(&self, booking_id: Uuid) -> Result<Booking, BookingError> {
        self.load(booking_id).await
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Booking>, BookingError> {
        self.store
            .list_for_user(user_id)
            .await
            .map_err(|e| BookingError::Store(e.to_string()))
    }

    async fn load(&self, booking_id: Uuid) -> Result<Booking, BookingError> {
        self.store
            .get(booking_id)
            .await
            .map_err(|e| BookingError::Store(e.to_string()))?
            .ok_or(BookingError::NotFound(booking_id))
    }

    async fn set_status(
        &self,
        booking_id: Uuid,
        status: BookingStatus,
        payment_status: PaymentStatus,
    ) -> Result<(), BookingError> {
        self.store
            .update_status(booking_id, status, payment_status)
            .await
            .map_err(|e| BookingError::Store(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Gender;
    use crate::refund::RefundStatus;
    use crate::store::MemoryBookingStore;
    use async_trait::async_trait;
    use chrono::{Datelike, Duration, NaiveTime};
    use std::collections::HashMap;
    use viaro_core::providers::{
        ScheduleInfo, ScheduleProvider, SeatLayoutInfo, SeatLayoutProvider,
    };
    use viaro_inventory::MemoryTripStore;
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

    async fn setup() -> (BookingWorkflow, Arc<InventoryManager>, Uuid) {
        let bus_id = Uuid::new_v4();
        let schedule_id = Uuid::new_v4();
        let date = (Utc::now() + Duration::days(5)).date_naive();

        let layout = SeatLayoutInfo {
            bus_id,
            seat_ids: (1..=20).map(|n| format!("S{n}")).collect(),
        };
        let schedule = ScheduleInfo {
            id: schedule_id,
            route_id: Uuid::new_v4(),
            bus_id,
            departure_time: NaiveTime::from_hms_opt(23, 0, 0).unwrap(),
            operating_days: vec![date.weekday()],
            base_price_amount: 800,
            is_active: true,
            route_stops: vec![
                "Madurai".to_string(),
                "Dindigul".to_string(),
                "Salem".to_string(),
                "Chennai".to_string(),
            ],
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
        let trip_id = inventory.materialize(schedule_id, date).await.unwrap();
        (workflow, inventory, trip_id)
    }

    fn passenger(name: &str) -> Passenger {
        Passenger {
            name: name.to_string(),
            gender: Gender::Other,
            phone: Masked("+919800000000".to_string()),
            email: None,
        }
    }

    fn request(trip_id: Uuid, seat_ids: &[&str]) -> CreateBooking {
        CreateBooking {
            trip_id,
            user_id: Uuid::new_v4(),
            seat_ids: seat_ids.iter().map(|s| s.to_string()).collect(),
            passengers: seat_ids.iter().map(|s| passenger(s)).collect(),
            boarding_point: "Madurai".to_string(),
            drop_point: "Chennai".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_confirm_happy_path() {
        let (workflow, inventory, trip_id) = setup().await;

        let booking = workflow.create(request(trip_id, &["S1", "S2"])).await.unwrap();
        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.total_price_amount, 1600);

        let booking = workflow.confirm(booking.id).await.unwrap();
        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert_eq!(booking.payment_status, PaymentStatus::Paid);

        let snap = inventory.availability(trip_id).await.unwrap();
        assert_eq!(snap.available_seats, 18);
    }

    #[tokio::test]
    async fn test_confirm_fails_when_seats_taken() {
        let (workflow, inventory, trip_id) = setup().await;

        inventory
            .reserve_seats(trip_id, &["S1".to_string()])
            .await
            .unwrap();

        let booking = workflow.create(request(trip_id, &["S1", "S2"])).await.unwrap();
        let err = workflow.confirm(booking.id).await.unwrap_err();
        assert!(matches!(
            err,
            BookingError::Inventory(InventoryError::SeatAlreadyBooked { .. })
        ));

        // The losing booking was cancelled and held nothing.
        let booking = workflow.get(booking.id).await.unwrap();
        assert_eq!(booking.status, BookingStatus::Cancelled);
        assert_eq!(inventory.availability(trip_id).await.unwrap().available_seats, 19);
    }

    #[tokio::test]
    async fn test_cancel_confirmed_booking_releases_and_refunds() {
        let (workflow, inventory, trip_id) = setup().await;

        let booking = workflow.create(request(trip_id, &["S5", "S6"])).await.unwrap();
        workflow.confirm(booking.id).await.unwrap();

        let (cancelled, refund) = workflow
            .cancel(booking.id, "Plans changed".to_string())
            .await
            .unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);
        assert_eq!(cancelled.payment_status, PaymentStatus::Refunded);

        let refund = refund.expect("paid booking should open a refund");
        assert_eq!(refund.amount, 1600);
        assert_eq!(refund.status, RefundStatus::Requested);

        assert_eq!(inventory.availability(trip_id).await.unwrap().available_seats, 20);
    }

    #[tokio::test]
    async fn test_cancel_pending_booking_opens_no_refund() {
        let (workflow, inventory, trip_id) = setup().await;

        let booking = workflow.create(request(trip_id, &["S9"])).await.unwrap();
        let (cancelled, refund) = workflow
            .cancel(booking.id, "Never paid".to_string())
            .await
            .unwrap();

        assert_eq!(cancelled.status, BookingStatus::Cancelled);
        assert!(refund.is_none());
        assert_eq!(inventory.availability(trip_id).await.unwrap().available_seats, 20);
    }

    #[tokio::test]
    async fn test_payment_failure_rolls_back_seat_hold() {
        let (workflow, inventory, trip_id) = setup().await;

        let booking = workflow.create(request(trip_id, &["S3", "S4"])).await.unwrap();
        workflow.confirm(booking.id).await.unwrap();
        assert_eq!(inventory.availability(trip_id).await.unwrap().available_seats, 18);

        let booking = workflow.payment_failed(booking.id).await.unwrap();
        assert_eq!(booking.status, BookingStatus::Cancelled);
        assert_eq!(booking.payment_status, PaymentStatus::Failed);
        assert_eq!(inventory.availability(trip_id).await.unwrap().available_seats, 20);
    }

    #[tokio::test]
    async fn test_booking_fee_lands_in_total_and_refund() {
        let (_, inventory, trip_id) = setup().await;
        let workflow = BookingWorkflow::new(inventory, Arc::new(MemoryBookingStore::new()))
            .with_booking_fee(50);

        let booking = workflow.create(request(trip_id, &["S7", "S8"])).await.unwrap();
        assert_eq!(booking.total_price_amount, 1650);

        workflow.confirm(booking.id).await.unwrap();
        let (_, refund) = workflow
            .cancel(booking.id, "Fee must refund too".to_string())
            .await
            .unwrap();
        assert_eq!(refund.unwrap().amount, 1650);
    }

    #[tokio::test]
    async fn test_validation_rejections() {
        let (workflow, _, trip_id) = setup().await;

        let mut req = request(trip_id, &["S1"]);
        req.boarding_point = "Nowhere".to_string();
        assert!(matches!(
            workflow.create(req).await,
            Err(BookingError::Validation(_))
        ));

        let mut req = request(trip_id, &["S1"]);
        req.passengers.clear();
        assert!(matches!(
            workflow.create(req).await,
            Err(BookingError::Validation(_))
        ));

        let req = request(trip_id, &["S99"]);
        assert!(matches!(
            workflow.create(req).await,
            Err(BookingError::Validation(_))
        ));
    }
}
