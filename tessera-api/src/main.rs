use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tessera_api::metrics::Metrics;
use tessera_api::{app, state::{AppState, AuthConfig}};
use tessera_core::repository::{BookingStore, EventStore};
use tessera_core::service::{BookingService, RetryPolicy};
use tessera_store::{DbClient, KafkaNotifier, PgBookingStore, PgEventStore, RedisClient};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tessera_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = tessera_store::app_config::Config::load().expect("Failed to load config");
    tracing::info!("Starting Tessera API on port {}", config.server.port);

    // Postgres
    let db = DbClient::new(&config.database.url)
        .await
        .expect("Failed to connect to Postgres");
    db.migrate().await.expect("Failed to run migrations");

    // Redis Connection
    let redis_client = RedisClient::new(&config.redis.url)
        .await
        .expect("Failed to connect to Redis");

    // Kafka Connection
    let notifier = KafkaNotifier::new(&config.kafka.brokers)
        .expect("Failed to create Kafka producer");

    let events: Arc<dyn EventStore> = Arc::new(PgEventStore::new(db.pool.clone()));
    let bookings: Arc<dyn BookingStore> = Arc::new(PgBookingStore::new(db.pool.clone()));
    let retry = RetryPolicy {
        max_attempts: config.booking.store_retry_attempts,
        backoff: Duration::from_millis(config.booking.store_retry_backoff_ms),
    };
    let booking = Arc::new(BookingService::new(
        events.clone(),
        bookings,
        Arc::new(notifier),
        retry,
    ));

    let app_state = AppState {
        booking,
        events,
        redis: Some(Arc::new(redis_client)),
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            expiration: config.auth.jwt_expiration_seconds,
        },
        rules: config.booking.clone(),
        metrics: Arc::new(Metrics::new()),
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .unwrap();
}
