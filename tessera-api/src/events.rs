use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tessera_core::event::{Event, EventStatus};
use tessera_core::identity::can_create_events;

use crate::error::AppError;
use crate::middleware::auth::authenticate;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    pub title: String,
    pub description: Option<String>,
    pub venue: String,
    pub starts_at: DateTime<Utc>,
    pub price_minor: i64,
    pub currency: String,
    pub total_tickets: i32,
}

#[derive(Debug, Serialize)]
pub struct EventResponse {
    pub id: Uuid,
    pub organizer_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub venue: String,
    pub starts_at: DateTime<Utc>,
    pub price_minor: i64,
    pub currency: String,
    pub total_tickets: i32,
    pub remaining_tickets: i32,
    pub status: EventStatus,
}

impl From<Event> for EventResponse {
    fn from(event: Event) -> Self {
        Self {
            id: event.id,
            organizer_id: event.organizer_id,
            title: event.title,
            description: event.description,
            venue: event.venue,
            starts_at: event.starts_at,
            price_minor: event.price_minor,
            currency: event.currency,
            total_tickets: event.total_tickets,
            remaining_tickets: event.remaining_tickets,
            status: event.status,
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/events", get(list_events).post(create_event))
        .route("/v1/events/{id}", get(get_event))
}

/// Public catalogue: approved events only.
async fn list_events(State(state): State<AppState>) -> Result<Json<Vec<EventResponse>>, AppError> {
    let events = state
        .events
        .list_by_status(EventStatus::Approved)
        .await
        .map_err(AppError::from_store)?;

    Ok(Json(events.into_iter().map(EventResponse::from).collect()))
}

async fn get_event(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> Result<Json<EventResponse>, AppError> {
    let event = state
        .events
        .get(event_id)
        .await
        .map_err(AppError::from_store)?
        .filter(|e| e.status == EventStatus::Approved)
        .ok_or_else(|| AppError::NotFoundError(format!("event not found: {}", event_id)))?;

    Ok(Json(event.into()))
}

/// Organizers submit events; they start out pending until an admin rules on
/// them.
async fn create_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<EventResponse>), AppError> {
    let (_claims, actor) = authenticate(&state.auth.secret, &headers)?;
    if !can_create_events(&actor) {
        return Err(AppError::AuthorizationError("organizer role required".to_string()));
    }

    if req.title.trim().is_empty() {
        return Err(AppError::ValidationError("title must not be empty".to_string()));
    }
    if req.total_tickets < 0 {
        return Err(AppError::ValidationError("total_tickets must not be negative".to_string()));
    }
    if req.price_minor < 0 {
        return Err(AppError::ValidationError("price_minor must not be negative".to_string()));
    }

    let event = Event::new(
        actor.id,
        req.title,
        req.description,
        req.venue,
        req.starts_at,
        req.price_minor,
        req.currency,
        req.total_tickets,
    );
    state.events.create(&event).await.map_err(AppError::from_store)?;

    tracing::info!(event_id = %event.id, organizer_id = %actor.id, "event submitted");

    Ok((StatusCode::CREATED, Json(event.into())))
}
