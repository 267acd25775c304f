use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use viaro_booking::{BookingError, RefundError};
use viaro_catalog::CatalogError;
use viaro_core::CoreError;
use viaro_inventory::{ErrorKind, InventoryError};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    AuthenticationError(String),
    #[error("{0}")]
    AuthorizationError(String),
    #[error("{0}")]
    ValidationError(String),
    #[error("{0}")]
    NotFoundError(String),
    #[error("{message}")]
    ConflictError { message: String, seats: Vec<String> },
    #[error("{0}")]
    UnavailableError(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn conflict(message: impl Into<String>) -> Self {
        AppError::ConflictError {
            message: message.into(),
            seats: Vec::new(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::AuthenticationError(msg) => {
                (StatusCode::UNAUTHORIZED, json!({ "error": msg }))
            }
            AppError::AuthorizationError(msg) => (StatusCode::FORBIDDEN, json!({ "error": msg })),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            AppError::ConflictError { message, seats } => {
                let body = if seats.is_empty() {
                    json!({ "error": message })
                } else {
                    json!({ "error": message, "seats": seats })
                };
                (StatusCode::CONFLICT, body)
            }
            AppError::UnavailableError(msg) => {
                tracing::error!("Service unavailable: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    json!({ "error": "Service temporarily unavailable" }),
                )
            }
            AppError::Internal(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal Server Error" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<InventoryError> for AppError {
    fn from(e: InventoryError) -> Self {
        let message = e.to_string();
        match e.kind() {
            ErrorKind::NotFound => AppError::NotFoundError(message),
            ErrorKind::InvalidRequest => AppError::ValidationError(message),
            ErrorKind::Unavailable => AppError::UnavailableError(message),
            ErrorKind::Conflict => {
                // Losing bidders get told exactly which seats to re-pick.
                let seats = match e {
                    InventoryError::SeatAlreadyBooked { seats } => seats,
                    _ => Vec::new(),
                };
                AppError::ConflictError { message, seats }
            }
        }
    }
}

impl From<BookingError> for AppError {
    fn from(e: BookingError) -> Self {
        match e {
            BookingError::NotFound(_) => AppError::NotFoundError(e.to_string()),
            BookingError::InvalidTransition { .. } => AppError::conflict(e.to_string()),
            BookingError::Validation(_) => AppError::ValidationError(e.to_string()),
            BookingError::Inventory(inner) => inner.into(),
            BookingError::Store(_) => AppError::UnavailableError(e.to_string()),
        }
    }
}

impl From<RefundError> for AppError {
    fn from(e: RefundError) -> Self {
        AppError::conflict(e.to_string())
    }
}

impl From<CatalogError> for AppError {
    fn from(e: CatalogError) -> Self {
        AppError::ValidationError(e.to_string())
    }
}

impl From<CoreError> for AppError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::ValidationError(msg) => AppError::ValidationError(msg),
            other => AppError::Internal(anyhow::anyhow!(other)),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Internal(e.into())
    }
}

impl From<Box<dyn std::error::Error + Send + Sync>> for AppError {
    fn from(e: Box<dyn std::error::Error + Send + Sync>) -> Self {
        AppError::Internal(anyhow::anyhow!(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn seat_conflict_maps_to_409_with_seats() {
        let err: AppError = InventoryError::SeatAlreadyBooked {
            seats: vec!["A1".to_string(), "A2".to_string()],
        }
        .into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["seats"], json!(["A1", "A2"]));
    }

    #[test]
    fn missing_trip_maps_to_404() {
        let err: AppError = InventoryError::TripNotFound(Uuid::new_v4()).into();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn booking_inventory_errors_keep_their_kind() {
        let err: AppError = BookingError::Inventory(InventoryError::EmptySeatSelection).into();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
