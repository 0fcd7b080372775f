use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tessera_core::booking::{Booking, BookingStatus, BookingWithEvent};
use tessera_core::identity::Actor;

use crate::error::AppError;
use crate::middleware::auth::auth_middleware;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct CreateBookingRequest {
    event_id: Uuid,
    quantity: i32,
}

#[derive(Debug, Serialize)]
struct BookingResponse {
    id: Uuid,
    event_id: Uuid,
    quantity: i32,
    unit_price_minor: i64,
    total_price_minor: i64,
    currency: String,
    status: BookingStatus,
    booked_at: DateTime<Utc>,
    cancelled_at: Option<DateTime<Utc>>,
}

impl From<Booking> for BookingResponse {
    fn from(booking: Booking) -> Self {
        Self {
            id: booking.id,
            event_id: booking.event_id,
            quantity: booking.quantity,
            unit_price_minor: booking.unit_price_minor,
            total_price_minor: booking.total_price_minor,
            currency: booking.currency,
            status: booking.status,
            booked_at: booking.booked_at,
            cancelled_at: booking.cancelled_at,
        }
    }
}

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/v1/bookings", get(list_bookings).post(create_booking))
        .route("/v1/bookings/{id}", delete(cancel_booking))
        .route_layer(axum::middleware::from_fn_with_state(state, auth_middleware))
}

async fn create_booking(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<BookingResponse>), AppError> {
    if req.quantity > state.rules.max_tickets_per_booking {
        return Err(AppError::ValidationError(format!(
            "at most {} tickets per booking",
            state.rules.max_tickets_per_booking
        )));
    }

    let booking = state
        .booking
        .create_booking(actor.id, req.event_id, req.quantity)
        .await
        .map_err(AppError::from_booking)?;

    state.metrics.bookings_created.inc();
    state.metrics.tickets_sold.inc_by(booking.quantity as u64);

    Ok((StatusCode::CREATED, Json(booking.into())))
}

async fn cancel_booking(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<BookingResponse>, AppError> {
    let cancelled = state
        .booking
        .cancel_booking(actor, booking_id)
        .await
        .map_err(AppError::from_booking)?;

    state.metrics.bookings_cancelled.inc();

    Ok(Json(cancelled.into()))
}

async fn list_bookings(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Vec<BookingWithEvent>>, AppError> {
    let bookings = state
        .booking
        .bookings_for_user(actor.id)
        .await
        .map_err(AppError::from_booking)?;

    Ok(Json(bookings))
}
