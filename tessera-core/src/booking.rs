use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::event::{Event, EventSummary};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Active,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Active => "ACTIVE",
            BookingStatus::Cancelled => "CANCELLED",
        }
    }
}

impl std::str::FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(BookingStatus::Active),
            "CANCELLED" => Ok(BookingStatus::Cancelled),
            other => Err(format!("unknown booking status: {}", other)),
        }
    }
}

/// A user's reservation of `quantity` tickets for one event.
///
/// The price fields are a snapshot taken when the booking was created; later
/// price changes on the event never touch them. Bookings are never deleted,
/// a cancelled booking stays around as the audit record of the reservation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub quantity: i32,
    pub unit_price_minor: i64,
    pub total_price_minor: i64,
    pub currency: String,
    pub status: BookingStatus,
    pub booked_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl Booking {
    /// Price is captured from the event at construction time.
    pub fn new(user_id: Uuid, event: &Event, quantity: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            event_id: event.id,
            quantity,
            unit_price_minor: event.price_minor,
            total_price_minor: event.price_minor * quantity as i64,
            currency: event.currency.clone(),
            status: BookingStatus::Active,
            booked_at: Utc::now(),
            cancelled_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == BookingStatus::Active
    }
}

/// Booking joined with the display snapshot of its event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingWithEvent {
    pub booking: Booking,
    pub event: Option<EventSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approved_event(price_minor: i64) -> Event {
        let mut event = Event::new(
            Uuid::new_v4(),
            "Opera Night".to_string(),
            None,
            "Grand Theatre".to_string(),
            Utc::now(),
            price_minor,
            "EUR".to_string(),
            40,
        );
        event.status = crate::event::EventStatus::Approved;
        event
    }

    #[test]
    fn test_price_snapshot_at_creation() {
        let mut event = approved_event(2500);
        let booking = Booking::new(Uuid::new_v4(), &event, 4);

        assert_eq!(booking.unit_price_minor, 2500);
        assert_eq!(booking.total_price_minor, 10_000);
        assert_eq!(booking.currency, "EUR");
        assert!(booking.is_active());
        assert!(booking.cancelled_at.is_none());

        // A later price change must not leak into the snapshot.
        event.price_minor = 9900;
        assert_eq!(booking.total_price_minor, 10_000);
    }
}
