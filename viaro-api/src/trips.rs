use std::convert::Infallible;

use axum::{
    extract::{Path, Query, State},
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post},
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use futures_util::{Stream, StreamExt};
use serde::Deserialize;
use tokio_stream::wrappers::BroadcastStream;
use uuid::Uuid;
use viaro_inventory::{AvailabilitySnapshot, Trip};
use viaro_shared::models::events::{SeatsReleasedEvent, SeatsReservedEvent, TripSeatEvent};
use viaro_store::events::TOPIC_SEATS_RESERVED;
use viaro_store::trip_repo::TripSearchResult;

use crate::{error::AppError, state::AppState};

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/v1/trips", get(search))
        .route("/v1/trips/{id}", get(get_trip))
        .route("/v1/trips/{id}/availability", get(availability))
        .route("/v1/trips/{id}/stream", get(stream))
}

pub fn customer_routes() -> Router<AppState> {
    Router::new()
        .route("/v1/trips/{id}/reserve", post(reserve))
        .route("/v1/trips/{id}/release", post(release))
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    origin: String,
    destination: String,
    date: NaiveDate,
}

async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<TripSearchResult>>, AppError> {
    let mut results = state
        .trips
        .search(&params.origin, &params.destination, params.date)
        .await?;

    // Listing counts prefer the cache the availability worker maintains; a
    // miss falls back to the store value and seeds the key for next time.
    // Cache trouble never fails a search.
    for r in &mut results {
        let key = r.trip_id.to_string();
        let cached = state.redis.get_trip_availability(&key).await.unwrap_or(None);
        if cached.is_none() {
            let _ = state.redis.set_trip_availability(&key, r.available_seats).await;
        }
        r.available_seats = listed_availability(r.available_seats, cached);
    }

    Ok(Json(results))
}

/// Cached counters can dip below zero under racing decrements; clamp them,
/// and fall back to the authoritative store count on a miss.
fn listed_availability(store_count: i32, cached: Option<i32>) -> i32 {
    match cached {
        Some(count) => count.max(0),
        None => store_count,
    }
}

async fn get_trip(
    State(state): State<AppState>,
    Path(trip_id): Path<Uuid>,
) -> Result<Json<Trip>, AppError> {
    Ok(Json(state.inventory.trip(trip_id).await?))
}

async fn availability(
    State(state): State<AppState>,
    Path(trip_id): Path<Uuid>,
) -> Result<Json<AvailabilitySnapshot>, AppError> {
    Ok(Json(state.inventory.availability(trip_id).await?))
}

#[derive(Debug, Deserialize)]
struct SeatSelection {
    seat_ids: Vec<String>,
}

async fn reserve(
    State(state): State<AppState>,
    Path(trip_id): Path<Uuid>,
    Json(req): Json<SeatSelection>,
) -> Result<Json<AvailabilitySnapshot>, AppError> {
    let snapshot = state.inventory.reserve_seats(trip_id, &req.seat_ids).await?;

    let event = SeatsReservedEvent {
        trip_id,
        seat_ids: req.seat_ids,
        available_seats: snapshot.available_seats,
        reserved_at: Utc::now().timestamp(),
    };
    let _ = state
        .kafka
        .publish_event(TOPIC_SEATS_RESERVED, &trip_id.to_string(), &event)
        .await;
    let _ = state
        .redis
        .set_trip_availability(&trip_id.to_string(), snapshot.available_seats as i32)
        .await;
    let _ = state.sse_tx.send(TripSeatEvent::Reserved(event));

    Ok(Json(snapshot))
}

async fn release(
    State(state): State<AppState>,
    Path(trip_id): Path<Uuid>,
    Json(req): Json<SeatSelection>,
) -> Result<Json<AvailabilitySnapshot>, AppError> {
    let snapshot = state.inventory.release_seats(trip_id, &req.seat_ids).await?;

    let event = SeatsReleasedEvent {
        trip_id,
        seat_ids: req.seat_ids,
        available_seats: snapshot.available_seats,
        released_at: Utc::now().timestamp(),
    };
    let _ = state
        .redis
        .set_trip_availability(&trip_id.to_string(), snapshot.available_seats as i32)
        .await;
    let _ = state.sse_tx.send(TripSeatEvent::Released(event));

    Ok(Json(snapshot))
}

/// Live seat updates for one trip, filtered out of the shared broadcast.
async fn stream(
    State(state): State<AppState>,
    Path(trip_id): Path<Uuid>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.sse_tx.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(move |result| async move {
        match result {
            Ok(event) if event.trip_id() == trip_id => {
                let name = match &event {
                    TripSeatEvent::Reserved(_) => "seats_reserved",
                    TripSeatEvent::Released(_) => "seats_released",
                };
                let sse_event = Event::default().event(name).json_data(&event).ok()?;
                Some(Ok(sse_event))
            }
            // Lagging subscribers and other trips' events are dropped.
            _ => None,
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
