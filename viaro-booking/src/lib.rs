pub mod models;
pub mod refund;
pub mod store;
pub mod support;
pub mod workflow;

pub use models::{Booking, BookingStatus, Gender, Passenger, PaymentStatus};
pub use refund::{RefundError, RefundRequest, RefundStatus};
pub use store::{BookingStore, MemoryBookingStore};
pub use support::{SupportTicket, TicketStatus};
pub use workflow::{BookingError, BookingWorkflow, CreateBooking};
