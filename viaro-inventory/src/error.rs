use chrono::NaiveDate;
use uuid::Uuid;

/// Broad error taxonomy used to map inventory failures onto transport-level
/// responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    InvalidRequest,
    Unavailable,
}

#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error("Trip not found: {0}")]
    TripNotFound(Uuid),

    #[error("Schedule not found: {0}")]
    ScheduleNotFound(Uuid),

    #[error("Schedule {schedule_id} is not active on {date}")]
    ScheduleInactive { schedule_id: Uuid, date: NaiveDate },

    #[error("Seat layout not found for bus: {0}")]
    LayoutNotFound(Uuid),

    #[error("Seat selection must not be empty")]
    EmptySeatSelection,

    #[error("Duplicate seat identifier in request: {0}")]
    DuplicateSeatInRequest(String),

    #[error("Seats not part of the bus layout: {}", seats.join(", "))]
    SeatNotInLayout { seats: Vec<String> },

    #[error("Seats already booked: {}", seats.join(", "))]
    SeatAlreadyBooked { seats: Vec<String> },

    #[error("Requested {requested} seats but only {available} available")]
    InsufficientAvailability { requested: u32, available: u32 },

    #[error("Trip departed on {0} and is read-only")]
    TripClosed(NaiveDate),

    #[error("Cannot materialize a trip for past date {0}")]
    DateInPast(NaiveDate),

    #[error("Concurrent writers kept interleaving; gave up after {attempts} attempts")]
    ConflictRetriesExhausted { attempts: u32 },

    #[error("Trip store unavailable: {0}")]
    Unavailable(String),

    #[error("Provider error: {0}")]
    Provider(String),
}

impl InventoryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            InventoryError::TripNotFound(_)
            | InventoryError::ScheduleNotFound(_)
            | InventoryError::LayoutNotFound(_) => ErrorKind::NotFound,

            InventoryError::SeatAlreadyBooked { .. }
            | InventoryError::ConflictRetriesExhausted { .. } => ErrorKind::Conflict,

            InventoryError::ScheduleInactive { .. }
            | InventoryError::EmptySeatSelection
            | InventoryError::DuplicateSeatInRequest(_)
            | InventoryError::SeatNotInLayout { .. }
            | InventoryError::InsufficientAvailability { .. }
            | InventoryError::TripClosed(_)
            | InventoryError::DateInPast(_) => ErrorKind::InvalidRequest,

            InventoryError::Unavailable(_) | InventoryError::Provider(_) => ErrorKind::Unavailable,
        }
    }

    /// Whether the caller can usefully retry the same request unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            InventoryError::ConflictRetriesExhausted { .. } | InventoryError::Unavailable(_)
        )
    }
}
