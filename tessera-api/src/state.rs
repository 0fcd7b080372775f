use std::sync::Arc;

use tessera_core::repository::EventStore;
use tessera_core::service::BookingService;
use tessera_store::app_config::BookingRules;
use tessera_store::RedisClient;

use crate::metrics::Metrics;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub booking: Arc<BookingService>,
    pub events: Arc<dyn EventStore>,
    pub redis: Option<Arc<RedisClient>>,
    pub auth: AuthConfig,
    pub rules: BookingRules,
    pub metrics: Arc<Metrics>,
}
