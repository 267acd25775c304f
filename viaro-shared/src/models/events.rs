use uuid::Uuid;

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct SeatsReservedEvent {
    pub trip_id: Uuid,
    pub seat_ids: Vec<String>,
    pub available_seats: u32,
    pub reserved_at: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct SeatsReleasedEvent {
    pub trip_id: Uuid,
    pub seat_ids: Vec<String>,
    pub available_seats: u32,
    pub released_at: i64,
}

/// Fan-out payload for live seat streams. Both directions travel on one
/// channel so subscribers observe availability changes in commit order.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TripSeatEvent {
    Reserved(SeatsReservedEvent),
    Released(SeatsReleasedEvent),
}

impl TripSeatEvent {
    pub fn trip_id(&self) -> Uuid {
        match self {
            TripSeatEvent::Reserved(e) => e.trip_id,
            TripSeatEvent::Released(e) => e.trip_id,
        }
    }
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct TripMaterializedEvent {
    pub trip_id: Uuid,
    pub schedule_id: Uuid,
    pub service_date: chrono::NaiveDate,
    pub total_seats: u32,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct BookingConfirmedEvent {
    pub booking_id: Uuid,
    pub trip_id: Uuid,
    pub seat_ids: Vec<String>,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct BookingCancelledEvent {
    pub booking_id: Uuid,
    pub trip_id: Uuid,
    pub seat_ids: Vec<String>,
    pub refund_requested: bool,
    pub timestamp: i64,
}
