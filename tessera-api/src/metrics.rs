use axum::extract::State;
use prometheus::{Encoder, IntCounter, Registry, TextEncoder};

use crate::error::AppError;
use crate::state::AppState;

pub struct Metrics {
    pub registry: Registry,
    pub bookings_created: IntCounter,
    pub bookings_cancelled: IntCounter,
    pub tickets_sold: IntCounter,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();
        let bookings_created =
            IntCounter::new("bookings_created_total", "Bookings successfully created")
                .expect("counter definition");
        let bookings_cancelled =
            IntCounter::new("bookings_cancelled_total", "Bookings cancelled")
                .expect("counter definition");
        let tickets_sold = IntCounter::new("tickets_sold_total", "Tickets taken out of inventory")
            .expect("counter definition");

        registry
            .register(Box::new(bookings_created.clone()))
            .expect("register counter");
        registry
            .register(Box::new(bookings_cancelled.clone()))
            .expect("register counter");
        registry
            .register(Box::new(tickets_sold.clone()))
            .expect("register counter");

        Self {
            registry,
            bookings_created,
            bookings_cancelled,
            tickets_sold,
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

pub async fn metrics_handler(State(state): State<AppState>) -> Result<String, AppError> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&state.metrics.registry.gather(), &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}
