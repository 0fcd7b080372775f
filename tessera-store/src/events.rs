use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use std::time::Duration;
use tracing::{error, info};

use tessera_core::booking::Booking;
use tessera_core::repository::BookingNotifier;
use tessera_shared::events::{BookingCancelledEvent, BookingConfirmedEvent};

const TOPIC_BOOKING_CREATED: &str = "bookings.created";
const TOPIC_BOOKING_CANCELLED: &str = "bookings.cancelled";

/// Publishes booking lifecycle events to Kafka. Delivery failures are
/// logged and dropped; the booking itself has already committed.
#[derive(Clone)]
pub struct KafkaNotifier {
    producer: FutureProducer,
}

impl KafkaNotifier {
    pub fn new(brokers: &str) -> Result<Self, rdkafka::error::KafkaError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .create()?;

        Ok(Self { producer })
    }

    async fn publish(&self, topic: &str, key: &str, payload: &str) {
        let record = FutureRecord::to(topic).key(key).payload(payload);

        match self.producer.send(record, Timeout::After(Duration::from_secs(0))).await {
            Ok(delivery) => {
                info!(
                    "Sent message to {}/{}: partition {} offset {}",
                    topic, key, delivery.partition, delivery.offset
                );
            }
            Err((e, _msg)) => {
                error!("Failed to send message to {}: {}", topic, e);
            }
        }
    }
}

#[async_trait]
impl BookingNotifier for KafkaNotifier {
    async fn booking_created(&self, booking: &Booking) {
        let event = BookingConfirmedEvent {
            booking_id: booking.id,
            event_id: booking.event_id,
            user_id: booking.user_id,
            quantity: booking.quantity,
            total_price_minor: booking.total_price_minor,
            currency: booking.currency.clone(),
            booked_at: booking.booked_at.timestamp(),
        };
        match serde_json::to_string(&event) {
            Ok(payload) => {
                self.publish(TOPIC_BOOKING_CREATED, &booking.id.to_string(), &payload)
                    .await
            }
            Err(e) => error!("Failed to serialize booking event: {}", e),
        }
    }

    async fn booking_cancelled(&self, booking: &Booking) {
        let event = BookingCancelledEvent {
            booking_id: booking.id,
            event_id: booking.event_id,
            user_id: booking.user_id,
            quantity: booking.quantity,
            cancelled_at: booking.cancelled_at.map(|t| t.timestamp()).unwrap_or_default(),
        };
        match serde_json::to_string(&event) {
            Ok(payload) => {
                self.publish(TOPIC_BOOKING_CANCELLED, &booking.id.to_string(), &payload)
                    .await
            }
            Err(e) => error!("Failed to serialize booking event: {}", e),
        }
    }
}
