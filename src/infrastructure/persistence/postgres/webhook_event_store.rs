//! # PostgreSQL Webhook Event Log
//!
//! PostgreSQL implementation of [`WebhookEventRepository`] using sqlx.
//!
//! Rows are insert-only; JSONB columns hold the parsed payload, headers,
//! ack outcome and dispatch outcome.

use crate::domain::entities::{AckRecord, WebhookEvent};
use crate::domain::value_objects::timestamp::Timestamp;
use crate::infrastructure::persistence::traits::{
    RepositoryError, RepositoryResult, WebhookEventRepository,
};
use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::BTreeMap;
use uuid::Uuid;

/// PostgreSQL implementation of [`WebhookEventRepository`].
///
/// # Examples
///
/// ```ignore
/// use sqlx::PgPool;
/// use matching_service::infrastructure::persistence::postgres::PostgresWebhookEventStore;
///
/// let pool = PgPool::connect("postgres://...").await?;
/// let store = PostgresWebhookEventStore::new(pool);
/// ```
#[derive(Debug, Clone)]
pub struct PostgresWebhookEventStore {
    pool: PgPool,
}

impl PostgresWebhookEventStore {
    /// Creates a new store on the given pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const SELECT_COLUMNS: &str = "SELECT id, topic, event_name, message_id, subscription_id, \
     raw_body, payload, headers, ack, dispatch, received_at FROM webhook_events";

#[async_trait]
impl WebhookEventRepository for PostgresWebhookEventStore {
    async fn append(&self, event: &WebhookEvent) -> RepositoryResult<()> {
        let headers = serde_json::to_value(&event.headers)
            .map_err(|e| RepositoryError::serialization(e.to_string()))?;
        let ack = event
            .ack
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| RepositoryError::serialization(e.to_string()))?;

        let result = sqlx::query(
            r#"
            INSERT INTO webhook_events (
                id, topic, event_name, message_id, subscription_id,
                raw_body, payload, headers, ack, dispatch, received_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(event.id)
        .bind(&event.topic)
        .bind(&event.event_name)
        .bind(&event.message_id)
        .bind(&event.subscription_id)
        .bind(&event.raw_body)
        .bind(&event.payload)
        .bind(&headers)
        .bind(&ack)
        .bind(&event.dispatch)
        .bind(event.received_at.timestamp_millis())
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::duplicate("WebhookEvent", event.id.to_string()));
        }
        Ok(())
    }

    async fn get(&self, id: Uuid) -> RepositoryResult<Option<WebhookEvent>> {
        let row: Option<WebhookEventRow> = sqlx::query_as(&format!("{SELECT_COLUMNS} WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepositoryError::query(e.to_string()))?;

        row.map(WebhookEventRow::try_into_event).transpose()
    }

    async fn recent(&self, limit: usize) -> RepositoryResult<Vec<WebhookEvent>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows: Vec<WebhookEventRow> = sqlx::query_as(&format!(
            "{SELECT_COLUMNS} ORDER BY received_at DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::query(e.to_string()))?;

        rows.into_iter()
            .map(WebhookEventRow::try_into_event)
            .collect()
    }
}

/// Row type for webhook event queries.
#[derive(Debug, sqlx::FromRow)]
struct WebhookEventRow {
    id: Uuid,
    topic: Option<String>,
    event_name: Option<String>,
    message_id: Option<String>,
    subscription_id: Option<String>,
    raw_body: String,
    payload: serde_json::Value,
    headers: serde_json::Value,
    ack: Option<serde_json::Value>,
    dispatch: Option<serde_json::Value>,
    received_at: i64,
}

impl WebhookEventRow {
    fn try_into_event(self) -> RepositoryResult<WebhookEvent> {
        let headers: BTreeMap<String, String> = serde_json::from_value(self.headers)
            .map_err(|e| RepositoryError::serialization(e.to_string()))?;
        let ack: Option<AckRecord> = self
            .ack
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| RepositoryError::serialization(e.to_string()))?;
        let received_at = Timestamp::from_millis(self.received_at)
            .ok_or_else(|| RepositoryError::serialization("invalid received_at"))?;

        Ok(WebhookEvent {
            id: self.id,
            topic: self.topic,
            event_name: self.event_name,
            message_id: self.message_id,
            subscription_id: self.subscription_id,
            raw_body: self.raw_body,
            payload: self.payload,
            headers,
            ack,
            dispatch: self.dispatch,
            received_at,
        })
    }
}
