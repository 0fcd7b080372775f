use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use tessera_core::booking::{Booking, BookingStatus};
use tessera_core::error::StoreError;
use tessera_core::repository::BookingStore;

use crate::database::map_sqlx_err;

pub struct PgBookingStore {
    pool: PgPool,
}

impl PgBookingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    user_id: Uuid,
    event_id: Uuid,
    quantity: i32,
    unit_price_minor: i64,
    total_price_minor: i64,
    currency: String,
    status: String,
    booked_at: DateTime<Utc>,
    cancelled_at: Option<DateTime<Utc>>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = StoreError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        let status: BookingStatus = row
            .status
            .parse()
            .map_err(StoreError::Internal)?;
        Ok(Booking {
            id: row.id,
            user_id: row.user_id,
            event_id: row.event_id,
            quantity: row.quantity,
            unit_price_minor: row.unit_price_minor,
            total_price_minor: row.total_price_minor,
            currency: row.currency,
            status,
            booked_at: row.booked_at,
            cancelled_at: row.cancelled_at,
        })
    }
}

const BOOKING_COLUMNS: &str = "id, user_id, event_id, quantity, unit_price_minor, total_price_minor, currency, status, booked_at, cancelled_at";

#[async_trait]
impl BookingStore for PgBookingStore {
    async fn create(&self, booking: &Booking) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO bookings (id, user_id, event_id, quantity, unit_price_minor, total_price_minor, currency, status, booked_at, cancelled_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(booking.id)
        .bind(booking.user_id)
        .bind(booking.event_id)
        .bind(booking.quantity)
        .bind(booking.unit_price_minor)
        .bind(booking.total_price_minor)
        .bind(&booking.currency)
        .bind(booking.status.as_str())
        .bind(booking.booked_at)
        .bind(booking.cancelled_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        Ok(())
    }

    async fn get(&self, booking_id: Uuid) -> Result<Option<Booking>, StoreError> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {} FROM bookings WHERE id = $1",
            BOOKING_COLUMNS
        ))
        .bind(booking_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        row.map(Booking::try_from).transpose()
    }

    async fn update_status(
        &self,
        booking_id: Uuid,
        expected: BookingStatus,
        new: BookingStatus,
        cancelled_at: Option<DateTime<Utc>>,
    ) -> Result<Option<Booking>, StoreError> {
        // Compare-and-set: the WHERE clause is the duplicate-transition
        // guard, so only one of two racing updates matches the row.
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "UPDATE bookings SET status = $3, cancelled_at = $4 WHERE id = $1 AND status = $2 RETURNING {}",
            BOOKING_COLUMNS
        ))
        .bind(booking_id)
        .bind(expected.as_str())
        .bind(new.as_str())
        .bind(cancelled_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        row.map(Booking::try_from).transpose()
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Booking>, StoreError> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {} FROM bookings WHERE user_id = $1 ORDER BY booked_at",
            BOOKING_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        rows.into_iter().map(Booking::try_from).collect()
    }
}
