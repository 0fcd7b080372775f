use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use tower::util::ServiceExt;
use uuid::Uuid;

use tessera_api::metrics::Metrics;
use tessera_api::middleware::auth::Claims;
use tessera_api::state::{AppState, AuthConfig};
use tessera_api::app;
use tessera_core::memory::MemoryStore;
use tessera_core::repository::{BookingStore, EventStore, NoopNotifier};
use tessera_core::service::{BookingService, RetryPolicy};
use tessera_store::app_config::BookingRules;

const SECRET: &str = "test-secret";

fn test_app() -> Router {
    let store = Arc::new(MemoryStore::new());
    let events: Arc<dyn EventStore> = store.clone();
    let bookings: Arc<dyn BookingStore> = store;
    let booking = Arc::new(BookingService::new(
        events.clone(),
        bookings,
        Arc::new(NoopNotifier),
        RetryPolicy::default(),
    ));

    app(AppState {
        booking,
        events,
        redis: None,
        auth: AuthConfig {
            secret: SECRET.to_string(),
            expiration: 3600,
        },
        rules: BookingRules {
            max_tickets_per_booking: 5,
            store_retry_attempts: 3,
            store_retry_backoff_ms: 1,
        },
        metrics: Arc::new(Metrics::new()),
    })
}

fn token(sub: Uuid, role: &str) -> String {
    let claims = Claims {
        sub: sub.to_string(),
        email: None,
        role: role.to_string(),
        exp: (Utc::now() + chrono::Duration::hours(1)).timestamp() as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    bearer: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(bearer) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", bearer));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

fn event_request() -> Value {
    json!({
        "title": "Harbor Festival",
        "description": "Two stages, one pier",
        "venue": "North Pier",
        "starts_at": "2026-10-01T19:00:00Z",
        "price_minor": 2000,
        "currency": "USD",
        "total_tickets": 10
    })
}

async fn submit_and_approve_event(app: &Router, organizer: &str, admin: &str) -> String {
    let (status, created) = send(
        app,
        Method::POST,
        "/v1/events",
        Some(organizer),
        Some(event_request()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let event_id = created["id"].as_str().unwrap().to_string();

    let (status, approved) = send(
        app,
        Method::POST,
        &format!("/v1/admin/events/{}/approve", event_id),
        Some(admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(approved["status"], "APPROVED");

    event_id
}

#[tokio::test]
async fn test_booking_flow_end_to_end() {
    let app = test_app();
    let organizer = token(Uuid::new_v4(), "ORGANIZER");
    let admin = token(Uuid::new_v4(), "ADMIN");
    let user_id = Uuid::new_v4();
    let user = token(user_id, "USER");

    let event_id = submit_and_approve_event(&app, &organizer, &admin).await;

    // Book 3 of 10 at 2000 minor units each.
    let (status, booking) = send(
        &app,
        Method::POST,
        "/v1/bookings",
        Some(&user),
        Some(json!({ "event_id": event_id, "quantity": 3 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(booking["total_price_minor"], 6000);
    assert_eq!(booking["status"], "ACTIVE");
    let booking_id = booking["id"].as_str().unwrap().to_string();

    // Public view reflects the decrement.
    let (status, listed) = send(&app, Method::GET, "/v1/events", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed[0]["remaining_tickets"], 7);

    // More than remain -> conflict, inventory untouched.
    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/bookings",
        Some(&user),
        Some(json!({ "event_id": event_id, "quantity": 5 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("insufficient inventory"));

    // Listing joins the event snapshot.
    let (status, bookings) = send(&app, Method::GET, "/v1/bookings", Some(&user), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bookings.as_array().unwrap().len(), 1);
    assert_eq!(bookings[0]["event"]["title"], "Harbor Festival");

    // Cancel restores the inventory.
    let (status, cancelled) = send(
        &app,
        Method::DELETE,
        &format!("/v1/bookings/{}", booking_id),
        Some(&user),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["status"], "CANCELLED");

    let (_, listed) = send(&app, Method::GET, "/v1/events", None, None).await;
    assert_eq!(listed[0]["remaining_tickets"], 10);

    // Second cancel is rejected.
    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/v1/bookings/{}", booking_id),
        Some(&user),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_booking_requires_approved_event() {
    let app = test_app();
    let organizer = token(Uuid::new_v4(), "ORGANIZER");
    let user = token(Uuid::new_v4(), "USER");

    let (status, created) = send(
        &app,
        Method::POST,
        "/v1/events",
        Some(&organizer),
        Some(event_request()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let event_id = created["id"].as_str().unwrap();

    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/bookings",
        Some(&user),
        Some(json!({ "event_id": event_id, "quantity": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("not open for booking"));

    // Pending events are invisible publicly.
    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/v1/events/{}", event_id),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cancel_is_owner_or_admin_only() {
    let app = test_app();
    let organizer = token(Uuid::new_v4(), "ORGANIZER");
    let admin = token(Uuid::new_v4(), "ADMIN");
    let owner = token(Uuid::new_v4(), "USER");
    let stranger = token(Uuid::new_v4(), "USER");

    let event_id = submit_and_approve_event(&app, &organizer, &admin).await;

    let (_, booking) = send(
        &app,
        Method::POST,
        "/v1/bookings",
        Some(&owner),
        Some(json!({ "event_id": event_id, "quantity": 2 })),
    )
    .await;
    let booking_id = booking["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/v1/bookings/{}", booking_id),
        Some(&stranger),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // An admin may cancel on the user's behalf.
    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/v1/bookings/{}", booking_id),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_authentication_gates() {
    let app = test_app();
    let user = token(Uuid::new_v4(), "USER");

    let (status, _) = send(&app, Method::GET, "/v1/bookings", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, Method::GET, "/v1/bookings", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Users can neither submit events nor reach the admin surface.
    let (status, _) = send(
        &app,
        Method::POST,
        "/v1/events",
        Some(&user),
        Some(event_request()),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/v1/admin/events/{}/approve", Uuid::new_v4()),
        Some(&user),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Guest tokens are full USER principals.
    let (status, body) = send(&app, Method::POST, "/v1/auth/guest", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let guest = body["token"].as_str().unwrap().to_string();

    let (status, bookings) = send(&app, Method::GET, "/v1/bookings", Some(&guest), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bookings, json!([]));
}

#[tokio::test]
async fn test_approval_happens_exactly_once() {
    let app = test_app();
    let organizer = token(Uuid::new_v4(), "ORGANIZER");
    let admin = token(Uuid::new_v4(), "ADMIN");

    let event_id = submit_and_approve_event(&app, &organizer, &admin).await;

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/v1/admin/events/{}/decline", event_id),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("not pending"));

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/v1/admin/events/{}/approve", Uuid::new_v4()),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_booking_validation() {
    let app = test_app();
    let organizer = token(Uuid::new_v4(), "ORGANIZER");
    let admin = token(Uuid::new_v4(), "ADMIN");
    let user = token(Uuid::new_v4(), "USER");

    let event_id = submit_and_approve_event(&app, &organizer, &admin).await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/v1/bookings",
        Some(&user),
        Some(json!({ "event_id": event_id, "quantity": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Above the per-booking cap from config.
    let (status, _) = send(
        &app,
        Method::POST,
        "/v1/bookings",
        Some(&user),
        Some(json!({ "event_id": event_id, "quantity": 6 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::POST,
        "/v1/bookings",
        Some(&user),
        Some(json!({ "event_id": Uuid::new_v4(), "quantity": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_price_change_leaves_existing_bookings_alone() {
    let app = test_app();
    let organizer = token(Uuid::new_v4(), "ORGANIZER");
    let admin = token(Uuid::new_v4(), "ADMIN");
    let user = token(Uuid::new_v4(), "USER");

    let event_id = submit_and_approve_event(&app, &organizer, &admin).await;

    let (_, booking) = send(
        &app,
        Method::POST,
        "/v1/bookings",
        Some(&user),
        Some(json!({ "event_id": event_id, "quantity": 2 })),
    )
    .await;
    assert_eq!(booking["total_price_minor"], 4000);

    let (status, updated) = send(
        &app,
        Method::PUT,
        &format!("/v1/admin/events/{}/price", event_id),
        Some(&admin),
        Some(json!({ "price_minor": 9900 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["price_minor"], 9900);

    let (_, bookings) = send(&app, Method::GET, "/v1/bookings", Some(&user), None).await;
    assert_eq!(bookings[0]["booking"]["total_price_minor"], 4000);
    assert_eq!(bookings[0]["event"]["price_minor"], 9900);
}

#[tokio::test]
async fn test_metrics_and_health() {
    let app = test_app();
    let organizer = token(Uuid::new_v4(), "ORGANIZER");
    let admin = token(Uuid::new_v4(), "ADMIN");
    let user = token(Uuid::new_v4(), "USER");

    let (status, body) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let event_id = submit_and_approve_event(&app, &organizer, &admin).await;
    send(
        &app,
        Method::POST,
        "/v1/bookings",
        Some(&user),
        Some(json!({ "event_id": event_id, "quantity": 2 })),
    )
    .await;

    let request = Request::builder()
        .method(Method::GET)
        .uri("/metrics")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("bookings_created_total 1"));
    assert!(text.contains("tickets_sold_total 2"));
}
