use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;
use viaro_booking::{Booking, CreateBooking, Passenger, RefundRequest};
use viaro_shared::models::events::{
    BookingCancelledEvent, BookingConfirmedEvent, SeatsReleasedEvent, SeatsReservedEvent,
    TripSeatEvent,
};
use viaro_store::events::{TOPIC_BOOKING_CANCELLED, TOPIC_BOOKING_CONFIRMED};

use crate::{error::AppError, middleware::auth::Claims, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/bookings", post(create).get(list_own))
        .route("/v1/bookings/{id}", get(get_booking))
        .route("/v1/bookings/{id}/commit", post(commit))
        .route("/v1/bookings/{id}/cancel", post(cancel))
        .route("/v1/bookings/{id}/payment-failed", post(payment_failed))
}

#[derive(Debug, Deserialize)]
struct CreateBookingRequest {
    trip_id: Uuid,
    seat_ids: Vec<String>,
    passengers: Vec<Passenger>,
    boarding_point: String,
    drop_point: String,
}

#[derive(Debug, Deserialize)]
struct CancelRequest {
    #[serde(default)]
    reason: Option<String>,
}

fn subject_user_id(claims: &Claims) -> Result<Uuid, AppError> {
    Uuid::parse_str(&claims.sub).map_err(|_| {
        AppError::AuthorizationError("Guest sessions cannot manage bookings".to_string())
    })
}

async fn create(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let user_id = subject_user_id(&claims)?;
    let booking = state
        .workflow
        .create(CreateBooking {
            trip_id: req.trip_id,
            user_id,
            seat_ids: req.seat_ids,
            passengers: req.passengers,
            boarding_point: req.boarding_point,
            drop_point: req.drop_point,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(booking)))
}

async fn get_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    let user_id = subject_user_id(&claims)?;
    let booking = state.workflow.get(booking_id).await?;
    if booking.user_id != user_id {
        return Err(AppError::NotFoundError(format!(
            "Booking not found: {booking_id}"
        )));
    }
    Ok(Json(booking))
}

async fn list_own(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<Booking>>, AppError> {
    let user_id = subject_user_id(&claims)?;
    Ok(Json(state.workflow.list_for_user(user_id).await?))
}

async fn commit(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    let user_id = subject_user_id(&claims)?;
    let existing = state.workflow.get(booking_id).await?;
    if existing.user_id != user_id {
        return Err(AppError::NotFoundError(format!(
            "Booking not found: {booking_id}"
        )));
    }

    let booking = state.workflow.confirm(booking_id).await?;

    let event = BookingConfirmedEvent {
        booking_id: booking.id,
        trip_id: booking.trip_id,
        seat_ids: booking.seat_ids.clone(),
        timestamp: Utc::now().timestamp(),
    };
    let _ = state
        .kafka
        .publish_event(TOPIC_BOOKING_CONFIRMED, &booking.id.to_string(), &event)
        .await;

    if let Ok(snapshot) = state.inventory.availability(booking.trip_id).await {
        let _ = state.sse_tx.send(TripSeatEvent::Reserved(SeatsReservedEvent {
            trip_id: booking.trip_id,
            seat_ids: booking.seat_ids.clone(),
            available_seats: snapshot.available_seats,
            reserved_at: Utc::now().timestamp(),
        }));
    }

    Ok(Json(booking))
}

async fn cancel(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
    Json(req): Json<CancelRequest>,
) -> Result<Json<Booking>, AppError> {
    let user_id = subject_user_id(&claims)?;
    let existing = state.workflow.get(booking_id).await?;
    if existing.user_id != user_id {
        return Err(AppError::NotFoundError(format!(
            "Booking not found: {booking_id}"
        )));
    }

    let reason = req
        .reason
        .unwrap_or_else(|| "Cancelled by customer".to_string());
    let (booking, refund) = state.workflow.cancel(booking_id, reason).await?;

    if let Some(ref refund) = refund {
        persist_refund(&state, refund).await?;
    }
    publish_cancellation(&state, &booking, refund.is_some()).await;

    Ok(Json(booking))
}

/// Payment-gateway failure callback for a booking whose seats are already
/// held. Seats go back to the pool and the booking is closed out.
async fn payment_failed(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    let user_id = subject_user_id(&claims)?;
    let existing = state.workflow.get(booking_id).await?;
    if existing.user_id != user_id {
        return Err(AppError::NotFoundError(format!(
            "Booking not found: {booking_id}"
        )));
    }

    let booking = state.workflow.payment_failed(booking_id).await?;
    publish_cancellation(&state, &booking, false).await;
    Ok(Json(booking))
}

async fn persist_refund(state: &AppState, refund: &RefundRequest) -> Result<(), AppError> {
    state.support.create_refund(refund).await?;
    tracing::info!(refund_id = %refund.id, booking_id = %refund.booking_id, "Opened refund request");
    Ok(())
}

async fn publish_cancellation(state: &AppState, booking: &Booking, refund_requested: bool) {
    let event = BookingCancelledEvent {
        booking_id: booking.id,
        trip_id: booking.trip_id,
        seat_ids: booking.seat_ids.clone(),
        refund_requested,
        timestamp: Utc::now().timestamp(),
    };
    let _ = state
        .kafka
        .publish_event(TOPIC_BOOKING_CANCELLED, &booking.id.to_string(), &event)
        .await;

    if let Ok(snapshot) = state.inventory.availability(booking.trip_id).await {
        let _ = state.sse_tx.send(TripSeatEvent::Released(SeatsReleasedEvent {
            trip_id: booking.trip_id,
            seat_ids: booking.seat_ids.clone(),
            available_seats: snapshot.available_seats,
            released_at: Utc::now().timestamp(),
        }));
    }
}
