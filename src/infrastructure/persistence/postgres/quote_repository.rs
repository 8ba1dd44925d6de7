//! # PostgreSQL Quote Repository
//!
//! Quote upsert backed by the `(request_id, provider_id)` unique index, so
//! concurrent submissions for the same pair collapse into one row.

use crate::domain::entities::Quote;
use crate::domain::value_objects::{ProviderId, QuoteAmount, QuoteId, RequestId};
use crate::infrastructure::persistence::traits::{
    QuoteRepository, RepositoryError, RepositoryResult, UpsertOutcome,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

/// PostgreSQL implementation of [`QuoteRepository`].
#[derive(Debug, Clone)]
pub struct PostgresQuoteRepository {
    pool: PgPool,
}

impl PostgresQuoteRepository {
    /// Creates a new repository on the given pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QuoteRepository for PostgresQuoteRepository {
    async fn upsert(
        &self,
        request_id: RequestId,
        provider_id: ProviderId,
        amount: QuoteAmount,
        round: u32,
    ) -> RepositoryResult<(Quote, UpsertOutcome)> {
        // xmax = 0 only for freshly inserted tuples.
        let row: UpsertRow = sqlx::query_as(
            r#"
            INSERT INTO quotes (request_id, provider_id, amount, round, created_at, updated_at)
            VALUES ($1, $2, $3, $4, now(), now())
            ON CONFLICT (request_id, provider_id) DO UPDATE
                SET amount = EXCLUDED.amount,
                    round = EXCLUDED.round,
                    updated_at = now()
            RETURNING id, request_id, provider_id, amount, round, created_at, updated_at,
                      (xmax = 0) AS inserted
            "#,
        )
        .bind(request_id.get())
        .bind(provider_id.get())
        .bind(amount.get())
        .bind(i32::try_from(round).unwrap_or(i32::MAX))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepositoryError::query(e.to_string()))?;

        let outcome = if row.inserted {
            UpsertOutcome::Created
        } else {
            UpsertOutcome::Updated
        };
        Ok((row.quote.try_into_quote()?, outcome))
    }

    async fn find(
        &self,
        request_id: RequestId,
        provider_id: ProviderId,
    ) -> RepositoryResult<Option<Quote>> {
        let row: Option<QuoteRow> = sqlx::query_as(
            r#"
            SELECT id, request_id, provider_id, amount, round, created_at, updated_at
            FROM quotes
            WHERE request_id = $1 AND provider_id = $2
            "#,
        )
        .bind(request_id.get())
        .bind(provider_id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::query(e.to_string()))?;

        row.map(QuoteRow::try_into_quote).transpose()
    }

    async fn find_by_request(&self, request_id: RequestId) -> RepositoryResult<Vec<Quote>> {
        let rows: Vec<QuoteRow> = sqlx::query_as(
            r#"
            SELECT id, request_id, provider_id, amount, round, created_at, updated_at
            FROM quotes
            WHERE request_id = $1
            ORDER BY provider_id ASC
            "#,
        )
        .bind(request_id.get())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::query(e.to_string()))?;

        rows.into_iter().map(QuoteRow::try_into_quote).collect()
    }
}

#[derive(Debug, sqlx::FromRow)]
struct QuoteRow {
    id: i64,
    request_id: i64,
    provider_id: i64,
    amount: Decimal,
    round: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct UpsertRow {
    #[sqlx(flatten)]
    quote: QuoteRow,
    inserted: bool,
}

impl QuoteRow {
    fn try_into_quote(self) -> RepositoryResult<Quote> {
        let amount = QuoteAmount::new(self.amount)
            .map_err(|e| RepositoryError::serialization(e.to_string()))?;
        Ok(Quote::from_parts(
            QuoteId::new(self.id),
            RequestId::new(self.request_id),
            ProviderId::new(self.provider_id),
            amount,
            u32::try_from(self.round).unwrap_or(1),
            self.created_at.into(),
            self.updated_at.into(),
        ))
    }
}
