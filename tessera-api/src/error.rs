use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tessera_core::error::{BookingError, StoreError};

#[derive(Debug)]
pub enum AppError {
    AuthenticationError(String),
    AuthorizationError(String),
    ValidationError(String),
    NotFoundError(String),
    ConflictError(String),
    UnavailableError(String),
    InternalServerError(String),
    Anyhow(anyhow::Error),
}

impl AppError {
    /// Booking-service failures onto user-facing statuses. Both inventory
    /// exhaustion and lifecycle violations come back as 409.
    pub fn from_booking(err: BookingError) -> Self {
        match err {
            BookingError::EventNotFound(_) | BookingError::BookingNotFound(_) => {
                AppError::NotFoundError(err.to_string())
            }
            BookingError::InvalidState(_) | BookingError::InsufficientInventory { .. } => {
                AppError::ConflictError(err.to_string())
            }
            BookingError::InvalidQuantity(_) => AppError::ValidationError(err.to_string()),
            BookingError::Forbidden(_) => AppError::AuthorizationError(err.to_string()),
            BookingError::Unauthenticated(_) => AppError::AuthenticationError(err.to_string()),
            BookingError::Unavailable(_) => AppError::UnavailableError(err.to_string()),
        }
    }

    pub fn from_store(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(reason) => AppError::UnavailableError(reason),
            StoreError::Internal(reason) => AppError::InternalServerError(reason),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::AuthenticationError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::AuthorizationError(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::ConflictError(msg) => (StatusCode::CONFLICT, msg),
            AppError::UnavailableError(msg) => {
                tracing::warn!("Service unavailable: {}", msg);
                (StatusCode::SERVICE_UNAVAILABLE, "Service temporarily unavailable".to_string())
            }
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
            AppError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::Anyhow(err.into())
    }
}
