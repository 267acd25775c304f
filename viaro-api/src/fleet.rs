use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use chrono::{NaiveDate, NaiveTime, Utc};
use serde::Deserialize;
use uuid::Uuid;
use viaro_catalog::{Bus, DayOfWeek, Route, Schedule, ScheduleStatus};
use viaro_shared::models::events::TripMaterializedEvent;
use viaro_store::events::TOPIC_TRIP_MATERIALIZED;

use crate::{error::AppError, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/buses", post(create_bus).get(list_buses))
        .route("/buses/{id}", get(get_bus))
        .route("/buses/{id}/active", patch(set_bus_active))
        .route("/routes", post(create_route).get(list_routes))
        .route("/routes/{id}", get(get_route))
        .route("/schedules", post(create_schedule).get(list_schedules))
        .route("/schedules/{id}", get(get_schedule))
        .route("/schedules/{id}/status", patch(set_schedule_status))
        .route("/trips/materialize", post(materialize_trip))
}

#[derive(Debug, Deserialize)]
struct CreateBusRequest {
    registration_number: String,
    name: String,
    /// Explicit identifiers win; otherwise a rows-by-width grid is generated.
    seat_ids: Option<Vec<String>>,
    rows: Option<u8>,
    seats_per_row: Option<u8>,
}

async fn create_bus(
    State(state): State<AppState>,
    Json(req): Json<CreateBusRequest>,
) -> Result<(StatusCode, Json<Bus>), AppError> {
    let seat_ids = match req.seat_ids {
        Some(ids) => ids,
        None => Bus::grid_layout(req.rows.unwrap_or(10), req.seats_per_row.unwrap_or(4))?,
    };
    let bus = Bus::new(req.registration_number, req.name, seat_ids)?;
    state.fleet.create_bus(&bus).await?;

    tracing::info!(bus_id = %bus.id, seats = bus.total_seats(), "Registered bus");
    Ok((StatusCode::CREATED, Json(bus)))
}

async fn get_bus(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Bus>, AppError> {
    state
        .fleet
        .get_bus(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFoundError(format!("Bus not found: {id}")))
}

async fn list_buses(State(state): State<AppState>) -> Result<Json<Vec<Bus>>, AppError> {
    Ok(Json(state.fleet.list_buses().await?))
}

#[derive(Debug, Deserialize)]
struct SetActiveRequest {
    is_active: bool,
}

async fn set_bus_active(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SetActiveRequest>,
) -> Result<StatusCode, AppError> {
    if state.fleet.set_bus_active(id, req.is_active).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFoundError(format!("Bus not found: {id}")))
    }
}

#[derive(Debug, Deserialize)]
struct CreateRouteRequest {
    origin: String,
    destination: String,
    #[serde(default)]
    stops: Vec<String>,
    #[serde(default)]
    distance_km: i32,
}

async fn create_route(
    State(state): State<AppState>,
    Json(req): Json<CreateRouteRequest>,
) -> Result<(StatusCode, Json<Route>), AppError> {
    let route = Route::new(req.origin, req.destination, req.stops, req.distance_km)?;
    state.fleet.create_route(&route).await?;
    Ok((StatusCode::CREATED, Json(route)))
}

async fn get_route(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Route>, AppError> {
    state
        .fleet
        .get_route(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFoundError(format!("Route not found: {id}")))
}

async fn list_routes(State(state): State<AppState>) -> Result<Json<Vec<Route>>, AppError> {
    Ok(Json(state.fleet.list_routes().await?))
}

#[derive(Debug, Deserialize)]
struct CreateScheduleRequest {
    bus_id: Uuid,
    route_id: Uuid,
    departure_time: NaiveTime,
    operating_days: Vec<DayOfWeek>,
    base_price_amount: i32,
}

async fn create_schedule(
    State(state): State<AppState>,
    Json(req): Json<CreateScheduleRequest>,
) -> Result<(StatusCode, Json<Schedule>), AppError> {
    if req.operating_days.is_empty() {
        return Err(AppError::ValidationError(
            "operating_days must not be empty".to_string(),
        ));
    }
    if req.base_price_amount <= 0 {
        return Err(AppError::ValidationError(
            "base_price_amount must be positive".to_string(),
        ));
    }

    let bus = state
        .fleet
        .get_bus(req.bus_id)
        .await?
        .ok_or_else(|| AppError::ValidationError(format!("Unknown bus: {}", req.bus_id)))?;
    if !bus.is_active {
        return Err(AppError::ValidationError(format!(
            "Bus {} is not in service",
            req.bus_id
        )));
    }
    state
        .fleet
        .get_route(req.route_id)
        .await?
        .ok_or_else(|| AppError::ValidationError(format!("Unknown route: {}", req.route_id)))?;

    let schedule = Schedule {
        id: Uuid::new_v4(),
        bus_id: req.bus_id,
        route_id: req.route_id,
        departure_time: req.departure_time,
        operating_days: req.operating_days,
        base_price_amount: req.base_price_amount,
        status: ScheduleStatus::Active,
        created_at: Utc::now(),
    };
    state.fleet.create_schedule(&schedule).await?;

    tracing::info!(schedule_id = %schedule.id, "Created schedule");
    Ok((StatusCode::CREATED, Json(schedule)))
}

async fn get_schedule(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Schedule>, AppError> {
    state
        .fleet
        .get_schedule(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFoundError(format!("Schedule not found: {id}")))
}

async fn list_schedules(State(state): State<AppState>) -> Result<Json<Vec<Schedule>>, AppError> {
    Ok(Json(state.fleet.list_schedules().await?))
}

#[derive(Debug, Deserialize)]
struct SetScheduleStatusRequest {
    status: ScheduleStatus,
}

async fn set_schedule_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SetScheduleStatusRequest>,
) -> Result<StatusCode, AppError> {
    if state.fleet.set_schedule_status(id, req.status).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFoundError(format!("Schedule not found: {id}")))
    }
}

#[derive(Debug, Deserialize)]
struct MaterializeRequest {
    schedule_id: Uuid,
    service_date: NaiveDate,
}

#[derive(Debug, serde::Serialize)]
struct MaterializeResponse {
    trip_id: Uuid,
}

/// Manual materialization for one (schedule, date). Idempotent, same as
/// the background sweep; a repeat returns the existing trip id.
async fn materialize_trip(
    State(state): State<AppState>,
    Json(req): Json<MaterializeRequest>,
) -> Result<(StatusCode, Json<MaterializeResponse>), AppError> {
    let trip_id = state
        .inventory
        .materialize(req.schedule_id, req.service_date)
        .await?;

    let trip = state.inventory.trip(trip_id).await?;
    let event = TripMaterializedEvent {
        trip_id,
        schedule_id: req.schedule_id,
        service_date: req.service_date,
        total_seats: trip.total_seats(),
    };
    let _ = state
        .kafka
        .publish_event(TOPIC_TRIP_MATERIALIZED, &trip_id.to_string(), &event)
        .await;

    Ok((StatusCode::CREATED, Json(MaterializeResponse { trip_id })))
}
