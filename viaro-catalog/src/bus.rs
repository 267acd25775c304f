use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// A vehicle in the fleet. The seat layout is fixed at creation time and is
/// treated as immutable for the lifetime of any trip materialized against it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bus {
    pub id: Uuid,
    pub registration_number: String,
    pub name: String,
    pub seat_ids: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Bus {
    pub fn new(
        registration_number: String,
        name: String,
        seat_ids: Vec<String>,
    ) -> Result<Self, CatalogError> {
        if registration_number.trim().is_empty() {
            return Err(CatalogError::InvalidField(
                "registration_number must not be empty".to_string(),
            ));
        }
        if seat_ids.is_empty() {
            return Err(CatalogError::EmptySeatLayout);
        }

        let mut seen = HashSet::new();
        for seat in &seat_ids {
            if !seen.insert(seat.as_str()) {
                return Err(CatalogError::DuplicateSeat(seat.clone()));
            }
        }

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            registration_number,
            name,
            seat_ids,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    /// Generate a coach-style layout: rows labelled A, B, C... each with
    /// `seats_per_row` numbered seats ("A1", "A2", ..). Row labels are single
    /// letters, so at most 26 rows.
    pub fn grid_layout(rows: u8, seats_per_row: u8) -> Result<Vec<String>, CatalogError> {
        if rows == 0 || rows > 26 {
            return Err(CatalogError::InvalidField(
                "rows must be between 1 and 26".to_string(),
            ));
        }
        if seats_per_row == 0 {
            return Err(CatalogError::InvalidField(
                "seats_per_row must be at least 1".to_string(),
            ));
        }

        let mut seats = Vec::with_capacity(rows as usize * seats_per_row as usize);
        for row in 0..rows {
            let letter = (b'A' + row) as char;
            for n in 1..=seats_per_row {
                seats.push(format!("{}{}", letter, n));
            }
        }
        Ok(seats)
    }

    pub fn total_seats(&self) -> u32 {
        self.seat_ids.len() as u32
    }

    pub fn has_seat(&self, seat_id: &str) -> bool {
        self.seat_ids.iter().any(|s| s == seat_id)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Seat layout must contain at least one seat")]
    EmptySeatLayout,

    #[error("Duplicate seat identifier in layout: {0}")]
    DuplicateSeat(String),

    #[error("Invalid field: {0}")]
    InvalidField(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_layout_shape() {
        let seats = Bus::grid_layout(10, 4).unwrap();
        assert_eq!(seats.len(), 40);
        assert_eq!(seats[0], "A1");
        assert_eq!(seats[4], "B1");
        assert_eq!(seats[39], "J4");
    }

    #[test]
    fn test_grid_layout_rejects_bad_dimensions() {
        assert!(matches!(
            Bus::grid_layout(27, 4),
            Err(CatalogError::InvalidField(_))
        ));
        assert!(matches!(
            Bus::grid_layout(0, 4),
            Err(CatalogError::InvalidField(_))
        ));
        assert!(matches!(
            Bus::grid_layout(10, 0),
            Err(CatalogError::InvalidField(_))
        ));
        // The full alphabet is fine.
        let seats = Bus::grid_layout(26, 2).unwrap();
        assert_eq!(seats.len(), 52);
        assert_eq!(seats[51], "Z2");
    }

    #[test]
    fn test_bus_rejects_duplicate_seats() {
        let result = Bus::new(
            "KA-01-F-9921".to_string(),
            "Night Liner".to_string(),
            vec!["A1".to_string(), "A2".to_string(), "A1".to_string()],
        );
        assert!(matches!(result, Err(CatalogError::DuplicateSeat(s)) if s == "A1"));
    }

    #[test]
    fn test_bus_rejects_empty_layout() {
        let result = Bus::new("KA-01-F-9921".to_string(), "Night Liner".to_string(), vec![]);
        assert!(matches!(result, Err(CatalogError::EmptySeatLayout)));
    }

    #[test]
    fn test_seat_lookup() {
        let bus = Bus::new(
            "KA-01-F-9921".to_string(),
            "Night Liner".to_string(),
            Bus::grid_layout(10, 4).unwrap(),
        )
        .unwrap();
        assert_eq!(bus.total_seats(), 40);
        assert!(bus.has_seat("A1"));
        assert!(!bus.has_seat("Z9"));
    }
}
