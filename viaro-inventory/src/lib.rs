pub mod error;
pub mod manager;
pub mod store;
pub mod trip;

pub use error::{ErrorKind, InventoryError};
pub use manager::InventoryManager;
pub use store::{MemoryTripStore, StoreError, TripInsert, TripStore};
pub use trip::{AvailabilitySnapshot, Trip, TripPhase};
