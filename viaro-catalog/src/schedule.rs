use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScheduleStatus {
    Active,
    Suspended,
}

impl ScheduleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleStatus::Active => "ACTIVE",
            ScheduleStatus::Suspended => "SUSPENDED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ACTIVE" => Some(ScheduleStatus::Active),
            "SUSPENDED" => Some(ScheduleStatus::Suspended),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    pub fn to_weekday(self) -> Weekday {
        match self {
            DayOfWeek::Monday => Weekday::Mon,
            DayOfWeek::Tuesday => Weekday::Tue,
            DayOfWeek::Wednesday => Weekday::Wed,
            DayOfWeek::Thursday => Weekday::Thu,
            DayOfWeek::Friday => Weekday::Fri,
            DayOfWeek::Saturday => Weekday::Sat,
            DayOfWeek::Sunday => Weekday::Sun,
        }
    }

    pub fn from_weekday(w: Weekday) -> Self {
        match w {
            Weekday::Mon => DayOfWeek::Monday,
            Weekday::Tue => DayOfWeek::Tuesday,
            Weekday::Wed => DayOfWeek::Wednesday,
            Weekday::Thu => DayOfWeek::Thursday,
            Weekday::Fri => DayOfWeek::Friday,
            Weekday::Sat => DayOfWeek::Saturday,
            Weekday::Sun => DayOfWeek::Sunday,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DayOfWeek::Monday => "MONDAY",
            DayOfWeek::Tuesday => "TUESDAY",
            DayOfWeek::Wednesday => "WEDNESDAY",
            DayOfWeek::Thursday => "THURSDAY",
            DayOfWeek::Friday => "FRIDAY",
            DayOfWeek::Saturday => "SATURDAY",
            DayOfWeek::Sunday => "SUNDAY",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "MONDAY" => Some(DayOfWeek::Monday),
            "TUESDAY" => Some(DayOfWeek::Tuesday),
            "WEDNESDAY" => Some(DayOfWeek::Wednesday),
            "THURSDAY" => Some(DayOfWeek::Thursday),
            "FRIDAY" => Some(DayOfWeek::Friday),
            "SATURDAY" => Some(DayOfWeek::Saturday),
            "SUNDAY" => Some(DayOfWeek::Sunday),
            _ => None,
        }
    }
}

/// A recurring service definition from which trips are materialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    pub id: Uuid,
    pub bus_id: Uuid,
    pub route_id: Uuid,
    pub departure_time: NaiveTime,
    pub operating_days: Vec<DayOfWeek>,
    pub base_price_amount: i32,
    pub status: ScheduleStatus,
    pub created_at: DateTime<Utc>,
}

impl Schedule {
    pub fn operates_on(&self, date: NaiveDate) -> bool {
        self.status == ScheduleStatus::Active
            && self
                .operating_days
                .iter()
                .any(|d| d.to_weekday() == date.weekday())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn daily_schedule(status: ScheduleStatus) -> Schedule {
        Schedule {
            id: Uuid::new_v4(),
            bus_id: Uuid::new_v4(),
            route_id: Uuid::new_v4(),
            departure_time: NaiveTime::from_hms_opt(21, 30, 0).unwrap(),
            operating_days: vec![DayOfWeek::Friday, DayOfWeek::Sunday],
            base_price_amount: 7500,
            status,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_operating_day_match() {
        let schedule = daily_schedule(ScheduleStatus::Active);
        // 2026-09-04 is a Friday, 2026-09-05 a Saturday.
        assert!(schedule.operates_on(NaiveDate::from_ymd_opt(2026, 9, 4).unwrap()));
        assert!(!schedule.operates_on(NaiveDate::from_ymd_opt(2026, 9, 5).unwrap()));
    }

    #[test]
    fn test_suspended_schedule_does_not_operate() {
        let schedule = daily_schedule(ScheduleStatus::Suspended);
        assert!(!schedule.operates_on(NaiveDate::from_ymd_opt(2026, 9, 4).unwrap()));
    }

    #[test]
    fn test_day_of_week_roundtrip() {
        for day in [
            DayOfWeek::Monday,
            DayOfWeek::Tuesday,
            DayOfWeek::Wednesday,
            DayOfWeek::Thursday,
            DayOfWeek::Friday,
            DayOfWeek::Saturday,
            DayOfWeek::Sunday,
        ] {
            assert_eq!(DayOfWeek::parse(day.as_str()), Some(day));
            assert_eq!(DayOfWeek::from_weekday(day.to_weekday()), day);
        }
    }
}
