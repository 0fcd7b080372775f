use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::booking::{Booking, BookingStatus};
use crate::error::StoreError;
use crate::event::{Event, EventStatus};

/// Event inventory access. `conditional_decrement` is the only path that
/// takes tickets out of inventory and must apply its guard (event approved,
/// enough tickets remaining) and the write as one indivisible operation.
#[async_trait]
pub trait EventStore: Send + Sync {
    async fn create(&self, event: &Event) -> Result<(), StoreError>;

    async fn get(&self, event_id: Uuid) -> Result<Option<Event>, StoreError>;

    async fn list_by_status(&self, status: EventStatus) -> Result<Vec<Event>, StoreError>;

    /// Compare-and-set on the approval status. Returns the updated event if
    /// the current status matched `expected`, `None` otherwise.
    async fn set_status(
        &self,
        event_id: Uuid,
        expected: EventStatus,
        new: EventStatus,
    ) -> Result<Option<Event>, StoreError>;

    /// Admin price change. Existing bookings keep their snapshot.
    async fn set_price(&self, event_id: Uuid, price_minor: i64) -> Result<Option<Event>, StoreError>;

    /// Decrement `remaining_tickets` by `quantity` only if the event is
    /// approved and `remaining_tickets >= quantity`, in one round trip.
    /// Returns whether the decrement was applied.
    async fn conditional_decrement(&self, event_id: Uuid, quantity: i32) -> Result<bool, StoreError>;

    /// Increment `remaining_tickets` by `quantity`, clamped so it never
    /// exceeds `total_tickets`.
    async fn increment_capped(&self, event_id: Uuid, quantity: i32) -> Result<(), StoreError>;
}

/// Booking records. `update_status` is a compare-and-set on the lifecycle
/// status and doubles as the duplicate-cancellation guard.
#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn create(&self, booking: &Booking) -> Result<(), StoreError>;

    async fn get(&self, booking_id: Uuid) -> Result<Option<Booking>, StoreError>;

    /// Returns the updated booking if its status matched `expected`,
    /// `None` otherwise.
    async fn update_status(
        &self,
        booking_id: Uuid,
        expected: BookingStatus,
        new: BookingStatus,
        cancelled_at: Option<DateTime<Utc>>,
    ) -> Result<Option<Booking>, StoreError>;

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Booking>, StoreError>;
}

/// Post-commit notifications. Implementations log delivery failures instead
/// of propagating them; a lost notification never rolls back a booking.
#[async_trait]
pub trait BookingNotifier: Send + Sync {
    async fn booking_created(&self, booking: &Booking);

    async fn booking_cancelled(&self, booking: &Booking);
}

/// Notifier used by tests and deployments without a message bus.
pub struct NoopNotifier;

#[async_trait]
impl BookingNotifier for NoopNotifier {
    async fn booking_created(&self, _booking: &Booking) {}

    async fn booking_cancelled(&self, _booking: &Booking) {}
}
