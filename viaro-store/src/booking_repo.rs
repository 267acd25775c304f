use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;
use viaro_booking::{Booking, BookingStatus, BookingStore, Passenger, PaymentStatus};

pub struct PostgresBookingStore {
    pool: PgPool,
}

impl PostgresBookingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    trip_id: Uuid,
    user_id: Uuid,
    seat_ids: Vec<String>,
    passengers: serde_json::Value,
    total_price_amount: i32,
    status: String,
    payment_status: String,
    boarding_point: String,
    drop_point: String,
    booked_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = serde_json::Error;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        let passengers: Vec<Passenger> = serde_json::from_value(row.passengers)?;
        Ok(Booking {
            id: row.id,
            trip_id: row.trip_id,
            user_id: row.user_id,
            seat_ids: row.seat_ids,
            passengers,
            total_price_amount: row.total_price_amount,
            status: BookingStatus::parse(&row.status).unwrap_or(BookingStatus::Cancelled),
            payment_status: PaymentStatus::parse(&row.payment_status)
                .unwrap_or(PaymentStatus::Unpaid),
            boarding_point: row.boarding_point,
            drop_point: row.drop_point,
            booked_at: row.booked_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl BookingStore for PostgresBookingStore {
    async fn insert(
        &self,
        booking: &Booking,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let passengers = serde_json::to_value(&booking.passengers)?;
        sqlx::query(
            r#"
            INSERT INTO bookings (
                id, trip_id, user_id, seat_ids, passengers, total_price_amount,
                status, payment_status, boarding_point, drop_point, booked_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(booking.id)
        .bind(booking.trip_id)
        .bind(booking.user_id)
        .bind(&booking.seat_ids)
        .bind(passengers)
        .bind(booking.total_price_amount)
        .bind(booking.status.as_str())
        .bind(booking.payment_status.as_str())
        .bind(&booking.boarding_point)
        .bind(&booking.drop_point)
        .bind(booking.booked_at)
        .bind(booking.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(
        &self,
        booking_id: Uuid,
    ) -> Result<Option<Booking>, Box<dyn std::error::Error + Send + Sync>> {
        let row: Option<BookingRow> = sqlx::query_as("SELECT * FROM bookings WHERE id = $1")
            .bind(booking_id)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(r) => Ok(Some(Booking::try_from(r)?)),
            None => Ok(None),
        }
    }

    async fn update_status(
        &self,
        booking_id: Uuid,
        status: BookingStatus,
        payment_status: PaymentStatus,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        sqlx::query(
            "UPDATE bookings SET status = $1, payment_status = $2, updated_at = $3 WHERE id = $4",
        )
        .bind(status.as_str())
        .bind(payment_status.as_str())
        .bind(Utc::now())
        .bind(booking_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<Booking>, Box<dyn std::error::Error + Send + Sync>> {
        let rows: Vec<BookingRow> =
            sqlx::query_as("SELECT * FROM bookings WHERE user_id = $1 ORDER BY booked_at")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?;
        rows.into_iter()
            .map(|r| Booking::try_from(r).map_err(Into::into))
            .collect()
    }
}
