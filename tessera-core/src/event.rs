use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Approval status of an event. Only approved events accept bookings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventStatus {
    Pending,
    Approved,
    Declined,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Pending => "PENDING",
            EventStatus::Approved => "APPROVED",
            EventStatus::Declined => "DECLINED",
        }
    }
}

impl std::str::FromStr for EventStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(EventStatus::Pending),
            "APPROVED" => Ok(EventStatus::Approved),
            "DECLINED" => Ok(EventStatus::Declined),
            other => Err(format!("unknown event status: {}", other)),
        }
    }
}

/// A bookable occasion with finite ticket inventory.
///
/// Invariant: `remaining_tickets` always equals `total_tickets` minus the sum
/// of `quantity` over all active bookings for this event. Only the booking
/// service's reservation protocol mutates `remaining_tickets`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
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
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    pub fn new(
        organizer_id: Uuid,
        title: String,
        description: Option<String>,
        venue: String,
        starts_at: DateTime<Utc>,
        price_minor: i64,
        currency: String,
        total_tickets: i32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            organizer_id,
            title,
            description,
            venue,
            starts_at,
            price_minor,
            currency,
            total_tickets,
            remaining_tickets: total_tickets,
            status: EventStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_open_for_booking(&self) -> bool {
        self.status == EventStatus::Approved
    }

    /// Snapshot of the display fields joined onto booking listings.
    pub fn summary(&self) -> EventSummary {
        EventSummary {
            id: self.id,
            title: self.title.clone(),
            venue: self.venue.clone(),
            starts_at: self.starts_at,
            price_minor: self.price_minor,
            currency: self.currency.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventSummary {
    pub id: Uuid,
    pub title: String,
    pub venue: String,
    pub starts_at: DateTime<Utc>,
    pub price_minor: i64,
    pub currency: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_event_starts_pending_with_full_inventory() {
        let event = Event::new(
            Uuid::new_v4(),
            "Rust Meetup".to_string(),
            None,
            "Main Hall".to_string(),
            Utc::now(),
            2000,
            "USD".to_string(),
            150,
        );

        assert_eq!(event.status, EventStatus::Pending);
        assert_eq!(event.remaining_tickets, 150);
        assert_eq!(event.total_tickets, 150);
        assert!(!event.is_open_for_booking());
    }

    #[test]
    fn test_status_round_trip() {
        for status in [EventStatus::Pending, EventStatus::Approved, EventStatus::Declined] {
            assert_eq!(status.as_str().parse::<EventStatus>().unwrap(), status);
        }
        assert!("SOLD_OUT".parse::<EventStatus>().is_err());
    }
}
