use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;
use viaro_booking::{SupportTicket, TicketStatus};

use crate::{error::AppError, middleware::auth::Claims, state::AppState};

pub fn customer_routes() -> Router<AppState> {
    Router::new()
        .route("/v1/support/tickets", post(open_ticket))
        .route("/v1/support/tickets/{id}", get(get_own_ticket))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/tickets", get(list_tickets))
        .route("/tickets/{id}", get(get_ticket))
        .route("/tickets/{id}/status", patch(set_ticket_status))
}

#[derive(Debug, Deserialize)]
struct OpenTicketRequest {
    booking_id: Option<Uuid>,
    subject: String,
    body: String,
}

async fn open_ticket(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<OpenTicketRequest>,
) -> Result<(StatusCode, Json<SupportTicket>), AppError> {
    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| {
        AppError::AuthorizationError("Guest sessions cannot open tickets".to_string())
    })?;
    if req.subject.trim().is_empty() {
        return Err(AppError::ValidationError(
            "subject must not be empty".to_string(),
        ));
    }

    // Customers can only attach their own bookings.
    if let Some(booking_id) = req.booking_id {
        let booking = state.workflow.get(booking_id).await?;
        if booking.user_id != user_id {
            return Err(AppError::NotFoundError(format!(
                "Booking not found: {booking_id}"
            )));
        }
    }

    let ticket = SupportTicket::open(user_id, req.booking_id, req.subject, req.body);
    state.support.create_ticket(&ticket).await?;

    tracing::info!(ticket_id = %ticket.id, "Opened support ticket");
    Ok((StatusCode::CREATED, Json(ticket)))
}

async fn get_own_ticket(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<SupportTicket>, AppError> {
    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| AppError::AuthorizationError("Guest sessions have no tickets".to_string()))?;
    let ticket = load(&state, id).await?;
    if ticket.user_id != user_id {
        return Err(AppError::NotFoundError(format!("Ticket not found: {id}")));
    }
    Ok(Json(ticket))
}

#[derive(Debug, Deserialize)]
struct ListParams {
    status: Option<String>,
}

async fn list_tickets(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<SupportTicket>>, AppError> {
    let status = match params.status.as_deref() {
        Some(s) => Some(
            TicketStatus::parse(s)
                .ok_or_else(|| AppError::ValidationError(format!("Unknown ticket status: {s}")))?,
        ),
        None => None,
    };
    Ok(Json(state.support.list_tickets(status).await?))
}

async fn get_ticket(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SupportTicket>, AppError> {
    load(&state, id).await.map(Json)
}

#[derive(Debug, Deserialize)]
struct SetStatusRequest {
    status: TicketStatus,
}

async fn set_ticket_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SetStatusRequest>,
) -> Result<Json<SupportTicket>, AppError> {
    let mut ticket = load(&state, id).await?;
    if !ticket.set_status(req.status) {
        return Err(AppError::conflict("Closed tickets cannot be reopened"));
    }
    state.support.update_ticket(&ticket).await?;
    Ok(Json(ticket))
}

async fn load(state: &AppState, id: Uuid) -> Result<SupportTicket, AppError> {
    state
        .support
        .get_ticket(id)
        .await?
        .ok_or_else(|| AppError::NotFoundError(format!("Ticket not found: {id}")))
}
