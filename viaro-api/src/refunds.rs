use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;
use viaro_booking::{RefundRequest, RefundStatus};

use crate::{error::AppError, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/refunds", get(list_refunds))
        .route("/refunds/{id}", get(get_refund))
        .route("/refunds/{id}/approve", post(approve))
        .route("/refunds/{id}/reject", post(reject))
        .route("/refunds/{id}/process", post(process))
}

#[derive(Debug, Deserialize)]
struct ListParams {
    status: Option<String>,
}

async fn list_refunds(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<RefundRequest>>, AppError> {
    let status = match params.status.as_deref() {
        Some(s) => Some(
            RefundStatus::parse(s)
                .ok_or_else(|| AppError::ValidationError(format!("Unknown refund status: {s}")))?,
        ),
        None => None,
    };
    Ok(Json(state.support.list_refunds(status).await?))
}

async fn get_refund(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RefundRequest>, AppError> {
    load(&state, id).await.map(Json)
}

async fn approve(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RefundRequest>, AppError> {
    transition(&state, id, |r| r.approve()).await
}

async fn reject(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RefundRequest>, AppError> {
    transition(&state, id, |r| r.reject()).await
}

/// Terminal step, recorded only after the money has actually moved.
async fn process(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RefundRequest>, AppError> {
    transition(&state, id, |r| r.process()).await
}

async fn load(state: &AppState, id: Uuid) -> Result<RefundRequest, AppError> {
    state
        .support
        .get_refund(id)
        .await?
        .ok_or_else(|| AppError::NotFoundError(format!("Refund request not found: {id}")))
}

async fn transition<F>(
    state: &AppState,
    id: Uuid,
    apply: F,
) -> Result<Json<RefundRequest>, AppError>
where
    F: FnOnce(&mut RefundRequest) -> Result<(), viaro_booking::RefundError>,
{
    let mut refund = load(state, id).await?;
    apply(&mut refund)?;
    state.support.update_refund(&refund).await?;

    tracing::info!(refund_id = %refund.id, status = refund.status.as_str(), "Refund transitioned");
    Ok(Json(refund))
}
