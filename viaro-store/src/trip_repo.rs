use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use std::collections::BTreeSet;
use uuid::Uuid;
use viaro_inventory::{StoreError, Trip, TripInsert, TripStore};

pub struct PostgresTripStore {
    pool: PgPool,
}

impl PostgresTripStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct TripRow {
    id: Uuid,
    schedule_id: Uuid,
    route_id: Uuid,
    bus_id: Uuid,
    service_date: NaiveDate,
    price_amount: i32,
    pickup_points: Vec<String>,
    drop_points: Vec<String>,
    seat_ids: Vec<String>,
    booked_seats: Vec<String>,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TripRow> for Trip {
    fn from(row: TripRow) -> Self {
        Trip {
            id: row.id,
            schedule_id: row.schedule_id,
            route_id: row.route_id,
            bus_id: row.bus_id,
            service_date: row.service_date,
            price_amount: row.price_amount,
            pickup_points: row.pickup_points,
            drop_points: row.drop_points,
            seat_ids: row.seat_ids,
            booked_seats: BTreeSet::from_iter(row.booked_seats),
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Summary row for trip search listings.
#[derive(Debug, serde::Serialize)]
pub struct TripSearchResult {
    pub trip_id: Uuid,
    pub route_id: Uuid,
    pub bus_id: Uuid,
    pub origin: String,
    pub destination: String,
    pub service_date: NaiveDate,
    pub price_amount: i32,
    pub total_seats: i32,
    pub available_seats: i32,
}

impl PostgresTripStore {
    /// Trips for a corridor on a date, with availability computed from the
    /// authoritative booked-seat array.
    pub async fn search(
        &self,
        origin: &str,
        destination: &str,
        date: NaiveDate,
    ) -> Result<Vec<TripSearchResult>, sqlx::Error> {
        let rows: Vec<(Uuid, Uuid, Uuid, String, String, NaiveDate, i32, i32, i32)> =
            sqlx::query_as(
                r#"
                SELECT
                    t.id, t.route_id, t.bus_id,
                    r.origin, r.destination,
                    t.service_date, t.price_amount,
                    cardinality(t.seat_ids) AS total_seats,
                    cardinality(t.seat_ids) - cardinality(t.booked_seats) AS available_seats
                FROM trips t
                JOIN routes r ON t.route_id = r.id
                WHERE r.origin = $1
                  AND r.destination = $2
                  AND t.service_date = $3
                ORDER BY t.service_date, t.price_amount
                "#,
            )
            .bind(origin)
            .bind(destination)
            .bind(date)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(
                |(
                    trip_id,
                    route_id,
                    bus_id,
                    origin,
                    destination,
                    service_date,
                    price_amount,
                    total_seats,
                    available_seats,
                )| TripSearchResult {
                    trip_id,
                    route_id,
                    bus_id,
                    origin,
                    destination,
                    service_date,
                    price_amount,
                    total_seats,
                    available_seats,
                },
            )
            .collect())
    }
}

#[async_trait]
impl TripStore for PostgresTripStore {
    async fn insert(&self, trip: &Trip) -> Result<TripInsert, StoreError> {
        let booked: Vec<String> = trip.booked_seats.iter().cloned().collect();
        let result = sqlx::query(
            r#"
            INSERT INTO trips (
                id, schedule_id, route_id, bus_id, service_date, price_amount,
                pickup_points, drop_points, seat_ids, booked_seats, version,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (schedule_id, service_date) DO NOTHING
            "#,
        )
        .bind(trip.id)
        .bind(trip.schedule_id)
        .bind(trip.route_id)
        .bind(trip.bus_id)
        .bind(trip.service_date)
        .bind(trip.price_amount)
        .bind(&trip.pickup_points)
        .bind(&trip.drop_points)
        .bind(&trip.seat_ids)
        .bind(&booked)
        .bind(trip.version)
        .bind(trip.created_at)
        .bind(trip.updated_at)
        .execute(&self.pool)
        .await
        .map_err(to_store_error)?;

        if result.rows_affected() == 1 {
            return Ok(TripInsert::Created(trip.id));
        }

        // Lost an insert race; surface the winner's id.
        let existing = self
            .find_by_schedule_date(trip.schedule_id, trip.service_date)
            .await?
            .ok_or_else(|| StoreError::Unavailable("conflicting trip vanished".to_string()))?;
        Ok(TripInsert::Exists(existing.id))
    }

    async fn get(&self, trip_id: Uuid) -> Result<Option<Trip>, StoreError> {
        let row: Option<TripRow> = sqlx::query_as("SELECT * FROM trips WHERE id = $1")
            .bind(trip_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(to_store_error)?;
        Ok(row.map(Trip::from))
    }

    async fn find_by_schedule_date(
        &self,
        schedule_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<Trip>, StoreError> {
        let row: Option<TripRow> =
            sqlx::query_as("SELECT * FROM trips WHERE schedule_id = $1 AND service_date = $2")
                .bind(schedule_id)
                .bind(date)
                .fetch_optional(&self.pool)
                .await
                .map_err(to_store_error)?;
        Ok(row.map(Trip::from))
    }

    async fn compare_and_update(&self, trip: &Trip) -> Result<bool, StoreError> {
        let booked: Vec<String> = trip.booked_seats.iter().cloned().collect();
        let result = sqlx::query(
            r#"
            UPDATE trips
            SET booked_seats = $1, updated_at = $2, version = version + 1
            WHERE id = $3 AND version = $4
            "#,
        )
        .bind(&booked)
        .bind(trip.updated_at)
        .bind(trip.id)
        .bind(trip.version)
        .execute(&self.pool)
        .await
        .map_err(to_store_error)?;

        Ok(result.rows_affected() == 1)
    }
}

fn to_store_error(e: sqlx::Error) -> StoreError {
    StoreError::Unavailable(e.to_string())
}
