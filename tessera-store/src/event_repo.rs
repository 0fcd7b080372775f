use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use tessera_core::error::StoreError;
use tessera_core::event::{Event, EventStatus};
use tessera_core::repository::EventStore;

use crate::database::map_sqlx_err;

pub struct PgEventStore {
    pool: PgPool,
}

impl PgEventStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct EventRow {
    id: Uuid,
    organizer_id: Uuid,
    title: String,
    description: Option<String>,
    venue: String,
    starts_at: chrono::DateTime<chrono::Utc>,
    price_minor: i64,
    currency: String,
    total_tickets: i32,
    remaining_tickets: i32,
    status: String,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl TryFrom<EventRow> for Event {
    type Error = StoreError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        let status: EventStatus = row
            .status
            .parse()
            .map_err(StoreError::Internal)?;
        Ok(Event {
            id: row.id,
            organizer_id: row.organizer_id,
            title: row.title,
            description: row.description,
            venue: row.venue,
            starts_at: row.starts_at,
            price_minor: row.price_minor,
            currency: row.currency,
            total_tickets: row.total_tickets,
            remaining_tickets: row.remaining_tickets,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const EVENT_COLUMNS: &str = "id, organizer_id, title, description, venue, starts_at, price_minor, currency, total_tickets, remaining_tickets, status, created_at, updated_at";

#[async_trait]
impl EventStore for PgEventStore {
    async fn create(&self, event: &Event) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO events (id, organizer_id, title, description, venue, starts_at, price_minor, currency, total_tickets, remaining_tickets, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(event.id)
        .bind(event.organizer_id)
        .bind(&event.title)
        .bind(&event.description)
        .bind(&event.venue)
        .bind(event.starts_at)
        .bind(event.price_minor)
        .bind(&event.currency)
        .bind(event.total_tickets)
        .bind(event.remaining_tickets)
        .bind(event.status.as_str())
        .bind(event.created_at)
        .bind(event.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        Ok(())
    }

    async fn get(&self, event_id: Uuid) -> Result<Option<Event>, StoreError> {
        let row = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {} FROM events WHERE id = $1",
            EVENT_COLUMNS
        ))
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        row.map(Event::try_from).transpose()
    }

    async fn list_by_status(&self, status: EventStatus) -> Result<Vec<Event>, StoreError> {
        let rows = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {} FROM events WHERE status = $1 ORDER BY starts_at",
            EVENT_COLUMNS
        ))
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        rows.into_iter().map(Event::try_from).collect()
    }

    async fn set_status(
        &self,
        event_id: Uuid,
        expected: EventStatus,
        new: EventStatus,
    ) -> Result<Option<Event>, StoreError> {
        let row = sqlx::query_as::<_, EventRow>(&format!(
            "UPDATE events SET status = $3, updated_at = NOW() WHERE id = $1 AND status = $2 RETURNING {}",
            EVENT_COLUMNS
        ))
        .bind(event_id)
        .bind(expected.as_str())
        .bind(new.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        row.map(Event::try_from).transpose()
    }

    async fn set_price(&self, event_id: Uuid, price_minor: i64) -> Result<Option<Event>, StoreError> {
        let row = sqlx::query_as::<_, EventRow>(&format!(
            "UPDATE events SET price_minor = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            EVENT_COLUMNS
        ))
        .bind(event_id)
        .bind(price_minor)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        row.map(Event::try_from).transpose()
    }

    async fn conditional_decrement(&self, event_id: Uuid, quantity: i32) -> Result<bool, StoreError> {
        // Guard and write in one statement; the row either moves atomically
        // or not at all. A plain read-then-write here would oversell under
        // concurrent callers.
        let result = sqlx::query(
            r#"
            UPDATE events
            SET remaining_tickets = remaining_tickets - $2, updated_at = NOW()
            WHERE id = $1 AND status = 'APPROVED' AND remaining_tickets >= $2
            "#,
        )
        .bind(event_id)
        .bind(quantity)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(result.rows_affected() == 1)
    }

    async fn increment_capped(&self, event_id: Uuid, quantity: i32) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE events
            SET remaining_tickets = LEAST(remaining_tickets + $2, total_tickets), updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(event_id)
        .bind(quantity)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        Ok(())
    }
}
