use axum::{
    extract::{Path, Query, State},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use tessera_core::event::EventStatus;

use crate::error::AppError;
use crate::events::EventResponse;
use crate::middleware::auth::admin_auth_middleware;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ListEventsQuery {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePriceRequest {
    pub price_minor: i64,
}

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/v1/admin/events", get(list_events))
        .route("/v1/admin/events/{id}/approve", post(approve_event))
        .route("/v1/admin/events/{id}/decline", post(decline_event))
        .route("/v1/admin/events/{id}/price", put(update_price))
        .route_layer(axum::middleware::from_fn_with_state(state, admin_auth_middleware))
}

/// Review queue; defaults to pending submissions.
async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<ListEventsQuery>,
) -> Result<Json<Vec<EventResponse>>, AppError> {
    let status = match query.status.as_deref() {
        Some(raw) => raw
            .parse::<EventStatus>()
            .map_err(AppError::ValidationError)?,
        None => EventStatus::Pending,
    };

    let events = state
        .events
        .list_by_status(status)
        .await
        .map_err(AppError::from_store)?;

    Ok(Json(events.into_iter().map(EventResponse::from).collect()))
}

async fn approve_event(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> Result<Json<EventResponse>, AppError> {
    rule_on_event(&state, event_id, EventStatus::Approved).await
}

async fn decline_event(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> Result<Json<EventResponse>, AppError> {
    rule_on_event(&state, event_id, EventStatus::Declined).await
}

/// Approval happens exactly once: the store transition is a compare-and-set
/// from PENDING, so a repeated or racing ruling loses and reports conflict.
async fn rule_on_event(
    state: &AppState,
    event_id: Uuid,
    verdict: EventStatus,
) -> Result<Json<EventResponse>, AppError> {
    let updated = state
        .events
        .set_status(event_id, EventStatus::Pending, verdict)
        .await
        .map_err(AppError::from_store)?;

    match updated {
        Some(event) => {
            tracing::info!(event_id = %event.id, status = event.status.as_str(), "event ruled on");
            Ok(Json(event.into()))
        }
        None => {
            let existing = state
                .events
                .get(event_id)
                .await
                .map_err(AppError::from_store)?;
            match existing {
                Some(_) => Err(AppError::ConflictError("event is not pending review".to_string())),
                None => Err(AppError::NotFoundError(format!("event not found: {}", event_id))),
            }
        }
    }
}

/// Price changes apply to future bookings only; existing bookings keep the
/// snapshot taken when they were created.
async fn update_price(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    Json(req): Json<UpdatePriceRequest>,
) -> Result<Json<EventResponse>, AppError> {
    if req.price_minor < 0 {
        return Err(AppError::ValidationError("price_minor must not be negative".to_string()));
    }

    let updated = state
        .events
        .set_price(event_id, req.price_minor)
        .await
        .map_err(AppError::from_store)?
        .ok_or_else(|| AppError::NotFoundError(format!("event not found: {}", event_id)))?;

    Ok(Json(updated.into()))
}
