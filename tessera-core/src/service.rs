use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::booking::{Booking, BookingStatus, BookingWithEvent};
use crate::error::{BookingError, StoreError};
use crate::identity::{can_cancel_booking, Actor};
use crate::repository::{BookingNotifier, BookingStore, EventStore};

/// Bounded retry for transient store failures. Only `StoreError::Unavailable`
/// is retried; every other error surfaces immediately.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_millis(50),
        }
    }
}

/// The sole authority for mutating `remaining_tickets` and the booking
/// lifecycle. All inventory movement funnels through the store's guarded
/// decrement / capped increment, so two service instances over the same
/// store stay consistent.
pub struct BookingService {
    events: Arc<dyn EventStore>,
    bookings: Arc<dyn BookingStore>,
    notifier: Arc<dyn BookingNotifier>,
    retry: RetryPolicy,
}

impl BookingService {
    pub fn new(
        events: Arc<dyn EventStore>,
        bookings: Arc<dyn BookingStore>,
        notifier: Arc<dyn BookingNotifier>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            events,
            bookings,
            notifier,
            retry,
        }
    }

    /// Reserve `quantity` tickets on an approved event.
    ///
    /// The availability check and the decrement are one guarded store
    /// operation; the pre-read below only exists to report the precise
    /// failure. If the booking insert fails after the decrement committed,
    /// the tickets are re-credited before the error surfaces.
    pub async fn create_booking(
        &self,
        user_id: Uuid,
        event_id: Uuid,
        quantity: i32,
    ) -> Result<Booking, BookingError> {
        if quantity <= 0 {
            return Err(BookingError::InvalidQuantity(quantity));
        }

        let event = self
            .with_retry(|| self.events.get(event_id))
            .await?
            .ok_or(BookingError::EventNotFound(event_id))?;

        if !event.is_open_for_booking() {
            return Err(BookingError::InvalidState(
                "event not open for booking".to_string(),
            ));
        }
        if quantity > event.remaining_tickets {
            return Err(BookingError::InsufficientInventory {
                requested: quantity,
                available: event.remaining_tickets,
            });
        }

        let applied = self
            .with_retry(|| self.events.conditional_decrement(event_id, quantity))
            .await?;
        if !applied {
            // The guard lost a race; re-read to classify the failure.
            return Err(self.classify_failed_decrement(event_id, quantity).await);
        }

        let booking = Booking::new(user_id, &event, quantity);
        if let Err(err) = self.with_retry(|| self.bookings.create(&booking)).await {
            warn!(
                booking_id = %booking.id,
                event_id = %event_id,
                "booking insert failed after decrement, re-crediting inventory"
            );
            if let Err(comp) = self
                .with_retry(|| self.events.increment_capped(event_id, quantity))
                .await
            {
                error!(
                    event_id = %event_id,
                    quantity,
                    error = %comp,
                    "failed to re-credit inventory after aborted booking"
                );
            }
            return Err(err.into());
        }

        info!(
            booking_id = %booking.id,
            event_id = %event_id,
            user_id = %user_id,
            quantity,
            "booking created"
        );
        self.notifier.booking_created(&booking).await;

        Ok(booking)
    }

    /// Cancel a booking on behalf of its owner or an admin.
    ///
    /// The status compare-and-set is the duplicate-cancellation guard: of
    /// two racing cancels exactly one flips `ACTIVE -> CANCELLED`, and only
    /// that one credits inventory back. If the credit fails, the flip is
    /// reverted so the pair never half-applies.
    pub async fn cancel_booking(
        &self,
        actor: Actor,
        booking_id: Uuid,
    ) -> Result<Booking, BookingError> {
        let booking = self
            .with_retry(|| self.bookings.get(booking_id))
            .await?
            .ok_or(BookingError::BookingNotFound(booking_id))?;

        if !can_cancel_booking(&actor, &booking) {
            return Err(BookingError::Forbidden(
                "only the booking owner or an admin may cancel".to_string(),
            ));
        }
        if !booking.is_active() {
            return Err(BookingError::InvalidState("booking already cancelled".to_string()));
        }

        let cancelled_at = Utc::now();
        let cancelled = self
            .with_retry(|| {
                self.bookings.update_status(
                    booking_id,
                    BookingStatus::Active,
                    BookingStatus::Cancelled,
                    Some(cancelled_at),
                )
            })
            .await?
            .ok_or_else(|| BookingError::InvalidState("booking already cancelled".to_string()))?;

        if let Err(err) = self
            .with_retry(|| self.events.increment_capped(booking.event_id, booking.quantity))
            .await
        {
            warn!(
                booking_id = %booking_id,
                event_id = %booking.event_id,
                "inventory credit failed after cancel, reverting booking status"
            );
            if let Err(comp) = self
                .with_retry(|| {
                    self.bookings.update_status(
                        booking_id,
                        BookingStatus::Cancelled,
                        BookingStatus::Active,
                        None,
                    )
                })
                .await
            {
                error!(
                    booking_id = %booking_id,
                    error = %comp,
                    "failed to revert booking after aborted cancellation"
                );
            }
            return Err(err.into());
        }

        info!(booking_id = %booking_id, event_id = %booking.event_id, "booking cancelled");
        self.notifier.booking_cancelled(&cancelled).await;

        Ok(cancelled)
    }

    /// All bookings owned by `user_id`, newest last, each joined with the
    /// display snapshot of its event.
    pub async fn bookings_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<BookingWithEvent>, BookingError> {
        let bookings = self.with_retry(|| self.bookings.list_by_user(user_id)).await?;

        let mut out = Vec::with_capacity(bookings.len());
        for booking in bookings {
            let event = self
                .with_retry(|| self.events.get(booking.event_id))
                .await?
                .map(|e| e.summary());
            out.push(BookingWithEvent { booking, event });
        }
        Ok(out)
    }

    async fn classify_failed_decrement(&self, event_id: Uuid, quantity: i32) -> BookingError {
        match self.with_retry(|| self.events.get(event_id)).await {
            Ok(Some(event)) if !event.is_open_for_booking() => {
                BookingError::InvalidState("event not open for booking".to_string())
            }
            Ok(Some(event)) => BookingError::InsufficientInventory {
                requested: quantity,
                available: event.remaining_tickets,
            },
            Ok(None) => BookingError::EventNotFound(event_id),
            Err(err) => err.into(),
        }
    }

    async fn with_retry<T, Fut>(&self, mut op: impl FnMut() -> Fut) -> Result<T, StoreError>
    where
        Fut: Future<Output = Result<T, StoreError>>,
    {
        let mut attempt = 0u32;
        loop {
            match op().await {
                Err(StoreError::Unavailable(reason)) if attempt + 1 < self.retry.max_attempts => {
                    attempt += 1;
                    warn!(attempt, %reason, "store unavailable, retrying");
                    tokio::time::sleep(self.retry.backoff * attempt).await;
                }
                other => return other,
            }
        }
    }
}
