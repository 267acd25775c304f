use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A service corridor between two cities with an ordered list of
/// intermediate stops.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    pub id: Uuid,
    pub origin: String,
    pub destination: String,
    pub stops: Vec<String>,
    pub distance_km: i32,
    pub created_at: DateTime<Utc>,
}

impl Route {
    pub fn new(
        origin: String,
        destination: String,
        stops: Vec<String>,
        distance_km: i32,
    ) -> Result<Self, crate::CatalogError> {
        if origin.trim().is_empty() || destination.trim().is_empty() {
            return Err(crate::CatalogError::InvalidField(
                "origin and destination must not be empty".to_string(),
            ));
        }
        if origin == destination {
            return Err(crate::CatalogError::InvalidField(
                "origin and destination must differ".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            origin,
            destination,
            stops,
            distance_km,
            created_at: Utc::now(),
        })
    }

    /// Full stop sequence including endpoints, in travel order.
    pub fn all_stops(&self) -> Vec<String> {
        let mut all = Vec::with_capacity(self.stops.len() + 2);
        all.push(self.origin.clone());
        all.extend(self.stops.iter().cloned());
        all.push(self.destination.clone());
        all
    }

    /// Boarding points for a trip on this route: the first half of the stop
    /// sequence, origin included.
    pub fn pickup_points(&self) -> Vec<String> {
        let all = self.all_stops();
        let mid = all.len().div_ceil(2);
        all[..mid].to_vec()
    }

    /// Drop-off points: the second half of the stop sequence, destination
    /// included.
    pub fn drop_points(&self) -> Vec<String> {
        let all = self.all_stops();
        let mid = all.len().div_ceil(2);
        all[mid..].to_vec()
    }
}
