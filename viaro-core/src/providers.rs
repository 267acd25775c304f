use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use uuid::Uuid;

/// Schedule data the inventory manager needs to validate a materialization
/// request. The provider is the only party that knows schedule status.
#[derive(Debug, Clone)]
pub struct ScheduleInfo {
    pub id: Uuid,
    pub route_id: Uuid,
    pub bus_id: Uuid,
    pub departure_time: NaiveTime,
    pub operating_days: Vec<Weekday>,
    pub base_price_amount: i32,
    pub is_active: bool,
    /// Full stop sequence of the route, endpoints included, in travel order.
    pub route_stops: Vec<String>,
}

impl ScheduleInfo {
    /// A schedule operates on a date when it is active and the date falls on
    /// one of its operating weekdays.
    pub fn operates_on(&self, date: NaiveDate) -> bool {
        self.is_active && self.operating_days.contains(&date.weekday())
    }
}

/// Authoritative seat layout for a bus. Immutable for the lifetime of any
/// trip materialized against it.
#[derive(Debug, Clone)]
pub struct SeatLayoutInfo {
    pub bus_id: Uuid,
    pub seat_ids: Vec<String>,
}

impl SeatLayoutInfo {
    pub fn total_seats(&self) -> u32 {
        self.seat_ids.len() as u32
    }

    pub fn contains(&self, seat_id: &str) -> bool {
        self.seat_ids.iter().any(|s| s == seat_id)
    }
}

#[async_trait]
pub trait ScheduleProvider: Send + Sync {
    async fn schedule(
        &self,
        schedule_id: Uuid,
    ) -> Result<Option<ScheduleInfo>, Box<dyn std::error::Error + Send + Sync>>;
}

#[async_trait]
pub trait SeatLayoutProvider: Send + Sync {
    async fn seat_layout(
        &self,
        bus_id: Uuid,
    ) -> Result<Option<SeatLayoutInfo>, Box<dyn std::error::Error + Send + Sync>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_operates_only_on_listed_weekdays() {
        let schedule = ScheduleInfo {
            id: Uuid::new_v4(),
            route_id: Uuid::new_v4(),
            bus_id: Uuid::new_v4(),
            departure_time: NaiveTime::from_hms_opt(8, 30, 0).unwrap(),
            operating_days: vec![Weekday::Mon, Weekday::Fri],
            base_price_amount: 4500,
            is_active: true,
            route_stops: vec!["Pune".to_string(), "Mumbai".to_string()],
        };

        // 2026-08-31 is a Monday, 2026-09-01 a Tuesday.
        assert!(schedule.operates_on(NaiveDate::from_ymd_opt(2026, 8, 31).unwrap()));
        assert!(!schedule.operates_on(NaiveDate::from_ymd_opt(2026, 9, 1).unwrap()));
    }

    #[test]
    fn suspended_schedule_never_operates() {
        let schedule = ScheduleInfo {
            id: Uuid::new_v4(),
            route_id: Uuid::new_v4(),
            bus_id: Uuid::new_v4(),
            departure_time: NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
            operating_days: vec![
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
                Weekday::Sat,
                Weekday::Sun,
            ],
            base_price_amount: 1200,
            is_active: false,
            route_stops: vec!["Pune".to_string(), "Mumbai".to_string()],
        };

        assert!(!schedule.operates_on(NaiveDate::from_ymd_opt(2026, 8, 31).unwrap()));
    }
}
