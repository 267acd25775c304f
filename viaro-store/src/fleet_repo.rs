use async_trait::async_trait;
use chrono::{DateTime, NaiveTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;
use viaro_catalog::{Bus, DayOfWeek, Route, Schedule, ScheduleStatus};
use viaro_core::providers::{ScheduleInfo, ScheduleProvider, SeatLayoutInfo, SeatLayoutProvider};

/// CRUD access to the fleet tables plus the provider contracts the
/// inventory manager consumes at materialization time.
#[derive(Clone)]
pub struct FleetRepository {
    pool: PgPool,
}

impl FleetRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct BusRow {
    id: Uuid,
    registration_number: String,
    name: String,
    seat_ids: Vec<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<BusRow> for Bus {
    fn from(r: BusRow) -> Self {
        Bus {
            id: r.id,
            registration_number: r.registration_number,
            name: r.name,
            seat_ids: r.seat_ids,
            is_active: r.is_active,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct RouteRow {
    id: Uuid,
    origin: String,
    destination: String,
    stops: Vec<String>,
    distance_km: i32,
    created_at: DateTime<Utc>,
}

impl From<RouteRow> for Route {
    fn from(r: RouteRow) -> Self {
        Route {
            id: r.id,
            origin: r.origin,
            destination: r.destination,
            stops: r.stops,
            distance_km: r.distance_km,
            created_at: r.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ScheduleRow {
    id: Uuid,
    bus_id: Uuid,
    route_id: Uuid,
    departure_time: NaiveTime,
    operating_days: Vec<String>,
    base_price_amount: i32,
    status: String,
    created_at: DateTime<Utc>,
}

impl From<ScheduleRow> for Schedule {
    fn from(r: ScheduleRow) -> Self {
        Schedule {
            id: r.id,
            bus_id: r.bus_id,
            route_id: r.route_id,
            departure_time: r.departure_time,
            operating_days: r
                .operating_days
                .iter()
                .filter_map(|d| DayOfWeek::parse(d))
                .collect(),
            base_price_amount: r.base_price_amount,
            status: ScheduleStatus::parse(&r.status).unwrap_or(ScheduleStatus::Suspended),
            created_at: r.created_at,
        }
    }
}

impl FleetRepository {
    pub async fn create_bus(&self, bus: &Bus) -> Result<Uuid, sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO buses (id, registration_number, name, seat_ids, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(bus.id)
        .bind(&bus.registration_number)
        .bind(&bus.name)
        .bind(&bus.seat_ids)
        .bind(bus.is_active)
        .bind(bus.created_at)
        .bind(bus.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(bus.id)
    }

    pub async fn get_bus(&self, id: Uuid) -> Result<Option<Bus>, sqlx::Error> {
        let row: Option<BusRow> = sqlx::query_as("SELECT * FROM buses WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Bus::from))
    }

    pub async fn list_buses(&self) -> Result<Vec<Bus>, sqlx::Error> {
        let rows: Vec<BusRow> = sqlx::query_as("SELECT * FROM buses ORDER BY created_at")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Bus::from).collect())
    }

    pub async fn set_bus_active(&self, id: Uuid, is_active: bool) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE buses SET is_active = $1, updated_at = $2 WHERE id = $3")
            .bind(is_active)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn create_route(&self, route: &Route) -> Result<Uuid, sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO routes (id, origin, destination, stops, distance_km, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(route.id)
        .bind(&route.origin)
        .bind(&route.destination)
        .bind(&route.stops)
        .bind(route.distance_km)
        .bind(route.created_at)
        .execute(&self.pool)
        .await?;
        Ok(route.id)
    }

    pub async fn get_route(&self, id: Uuid) -> Result<Option<Route>, sqlx::Error> {
        let row: Option<RouteRow> = sqlx::query_as("SELECT * FROM routes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Route::from))
    }

    pub async fn list_routes(&self) -> Result<Vec<Route>, sqlx::Error> {
        let rows: Vec<RouteRow> = sqlx::query_as("SELECT * FROM routes ORDER BY created_at")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Route::from).collect())
    }

    pub async fn create_schedule(&self, schedule: &Schedule) -> Result<Uuid, sqlx::Error> {
        let days: Vec<String> = schedule
            .operating_days
            .iter()
            .map(|d| d.as_str().to_string())
            .collect();
        sqlx::query(
            r#"
            INSERT INTO schedules (id, bus_id, route_id, departure_time, operating_days, base_price_amount, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(schedule.id)
        .bind(schedule.bus_id)
        .bind(schedule.route_id)
        .bind(schedule.departure_time)
        .bind(&days)
        .bind(schedule.base_price_amount)
        .bind(schedule.status.as_str())
        .bind(schedule.created_at)
        .execute(&self.pool)
        .await?;
        Ok(schedule.id)
    }

    pub async fn get_schedule(&self, id: Uuid) -> Result<Option<Schedule>, sqlx::Error> {
        let row: Option<ScheduleRow> = sqlx::query_as("SELECT * FROM schedules WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Schedule::from))
    }

    pub async fn list_schedules(&self) -> Result<Vec<Schedule>, sqlx::Error> {
        let rows: Vec<ScheduleRow> = sqlx::query_as("SELECT * FROM schedules ORDER BY created_at")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Schedule::from).collect())
    }

    pub async fn list_active_schedules(&self) -> Result<Vec<Schedule>, sqlx::Error> {
        let rows: Vec<ScheduleRow> = sqlx::query_as("SELECT * FROM schedules WHERE status = 'ACTIVE'")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Schedule::from).collect())
    }

    pub async fn set_schedule_status(
        &self,
        id: Uuid,
        status: ScheduleStatus,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE schedules SET status = $1 WHERE id = $2")
            .bind(status.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }
}

#[async_trait]
impl ScheduleProvider for FleetRepository {
    async fn schedule(
        &self,
        schedule_id: Uuid,
    ) -> Result<Option<ScheduleInfo>, Box<dyn std::error::Error + Send + Sync>> {
        let schedule = match self.get_schedule(schedule_id).await? {
            Some(s) => s,
            None => return Ok(None),
        };
        let route = self
            .get_route(schedule.route_id)
            .await?
            .ok_or("schedule references a missing route")?;

        Ok(Some(ScheduleInfo {
            id: schedule.id,
            route_id: schedule.route_id,
            bus_id: schedule.bus_id,
            departure_time: schedule.departure_time,
            operating_days: schedule
                .operating_days
                .iter()
                .map(|d| d.to_weekday())
                .collect(),
            base_price_amount: schedule.base_price_amount,
            is_active: schedule.status == ScheduleStatus::Active,
            route_stops: route.all_stops(),
        }))
    }
}

#[async_trait]
impl SeatLayoutProvider for FleetRepository {
    async fn seat_layout(
        &self,
        bus_id: Uuid,
    ) -> Result<Option<SeatLayoutInfo>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.get_bus(bus_id).await?.map(|bus| SeatLayoutInfo {
            bus_id: bus.id,
            seat_ids: bus.seat_ids,
        }))
    }
}
