pub mod bus;
pub mod route;
pub mod schedule;

pub use bus::{Bus, CatalogError};
pub use route::Route;
pub use schedule::{DayOfWeek, Schedule, ScheduleStatus};
