use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::booking::{Booking, BookingStatus};
use crate::error::StoreError;
use crate::event::{Event, EventStatus};
use crate::repository::{BookingStore, EventStore};

#[derive(Default)]
struct Inner {
    events: HashMap<Uuid, Event>,
    bookings: HashMap<Uuid, Booking>,
}

/// In-memory store used by tests and local development.
///
/// A single mutex guards both maps, so every store operation is atomic with
/// respect to every other one. Nothing awaits while the lock is held.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // Lock poisoning only happens if a holder panicked mid-mutation;
        // tests want the panic surfaced, not masked as Unavailable.
        self.inner.lock().expect("memory store lock poisoned")
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn create(&self, event: &Event) -> Result<(), StoreError> {
        self.lock().events.insert(event.id, event.clone());
        Ok(())
    }

    async fn get(&self, event_id: Uuid) -> Result<Option<Event>, StoreError> {
        Ok(self.lock().events.get(&event_id).cloned())
    }

    async fn list_by_status(&self, status: EventStatus) -> Result<Vec<Event>, StoreError> {
        let mut events: Vec<Event> = self
            .lock()
            .events
            .values()
            .filter(|e| e.status == status)
            .cloned()
            .collect();
        events.sort_by_key(|e| e.starts_at);
        Ok(events)
    }

    async fn set_status(
        &self,
        event_id: Uuid,
        expected: EventStatus,
        new: EventStatus,
    ) -> Result<Option<Event>, StoreError> {
        let mut inner = self.lock();
        match inner.events.get_mut(&event_id) {
            Some(event) if event.status == expected => {
                event.status = new;
                event.updated_at = Utc::now();
                Ok(Some(event.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn set_price(&self, event_id: Uuid, price_minor: i64) -> Result<Option<Event>, StoreError> {
        let mut inner = self.lock();
        match inner.events.get_mut(&event_id) {
            Some(event) => {
                event.price_minor = price_minor;
                event.updated_at = Utc::now();
                Ok(Some(event.clone()))
            }
            None => Ok(None),
        }
    }

    async fn conditional_decrement(&self, event_id: Uuid, quantity: i32) -> Result<bool, StoreError> {
        let mut inner = self.lock();
        match inner.events.get_mut(&event_id) {
            Some(event)
                if event.status == EventStatus::Approved && event.remaining_tickets >= quantity =>
            {
                event.remaining_tickets -= quantity;
                event.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn increment_capped(&self, event_id: Uuid, quantity: i32) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if let Some(event) = inner.events.get_mut(&event_id) {
            event.remaining_tickets =
                (event.remaining_tickets + quantity).min(event.total_tickets);
            event.updated_at = Utc::now();
        }
        Ok(())
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn create(&self, booking: &Booking) -> Result<(), StoreError> {
        self.lock().bookings.insert(booking.id, booking.clone());
        Ok(())
    }

    async fn get(&self, booking_id: Uuid) -> Result<Option<Booking>, StoreError> {
        Ok(self.lock().bookings.get(&booking_id).cloned())
    }

    async fn update_status(
        &self,
        booking_id: Uuid,
        expected: BookingStatus,
        new: BookingStatus,
        cancelled_at: Option<DateTime<Utc>>,
    ) -> Result<Option<Booking>, StoreError> {
        let mut inner = self.lock();
        match inner.bookings.get_mut(&booking_id) {
            Some(booking) if booking.status == expected => {
                booking.status = new;
                booking.cancelled_at = cancelled_at;
                Ok(Some(booking.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Booking>, StoreError> {
        let mut bookings: Vec<Booking> = self
            .lock()
            .bookings
            .values()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        bookings.sort_by_key(|b| b.booked_at);
        Ok(bookings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded_event(total: i32, status: EventStatus) -> Event {
        let mut event = Event::new(
            Uuid::new_v4(),
            "Indie Night".to_string(),
            None,
            "Warehouse 9".to_string(),
            Utc::now(),
            1200,
            "USD".to_string(),
            total,
        );
        event.status = status;
        event
    }

    #[tokio::test]
    async fn test_conditional_decrement_guards() {
        let store = MemoryStore::new();
        let event = seeded_event(5, EventStatus::Approved);
        EventStore::create(&store, &event).await.unwrap();

        assert!(store.conditional_decrement(event.id, 3).await.unwrap());
        assert!(!store.conditional_decrement(event.id, 3).await.unwrap());
        assert!(store.conditional_decrement(event.id, 2).await.unwrap());

        let stored = EventStore::get(&store, event.id).await.unwrap().unwrap();
        assert_eq!(stored.remaining_tickets, 0);
    }

    #[tokio::test]
    async fn test_decrement_refuses_unapproved_and_missing() {
        let store = MemoryStore::new();
        let pending = seeded_event(5, EventStatus::Pending);
        EventStore::create(&store, &pending).await.unwrap();

        assert!(!store.conditional_decrement(pending.id, 1).await.unwrap());
        assert!(!store.conditional_decrement(Uuid::new_v4(), 1).await.unwrap());
    }

    #[tokio::test]
    async fn test_increment_is_capped_at_total() {
        let store = MemoryStore::new();
        let event = seeded_event(10, EventStatus::Approved);
        EventStore::create(&store, &event).await.unwrap();

        store.conditional_decrement(event.id, 4).await.unwrap();
        store.increment_capped(event.id, 100).await.unwrap();

        let stored = EventStore::get(&store, event.id).await.unwrap().unwrap();
        assert_eq!(stored.remaining_tickets, 10);
    }

    #[tokio::test]
    async fn test_booking_status_cas() {
        let store = MemoryStore::new();
        let event = seeded_event(5, EventStatus::Approved);
        let booking = Booking::new(Uuid::new_v4(), &event, 1);
        BookingStore::create(&store, &booking).await.unwrap();

        let now = Utc::now();
        let updated = store
            .update_status(booking.id, BookingStatus::Active, BookingStatus::Cancelled, Some(now))
            .await
            .unwrap();
        assert!(updated.is_some());

        // Guard no longer matches.
        let second = store
            .update_status(booking.id, BookingStatus::Active, BookingStatus::Cancelled, Some(now))
            .await
            .unwrap();
        assert!(second.is_none());
    }
}
