//! # PostgreSQL Invitation Repository
//!
//! Append-only invitation rows guarded by the
//! `(request_id, provider_id, round)` unique index.

use crate::domain::entities::Invitation;
use crate::domain::value_objects::{ProviderId, RequestId, Timestamp};
use crate::infrastructure::persistence::traits::{
    InvitationRepository, RepositoryError, RepositoryResult,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

/// PostgreSQL implementation of [`InvitationRepository`].
#[derive(Debug, Clone)]
pub struct PostgresInvitationRepository {
    pool: PgPool,
}

impl PostgresInvitationRepository {
    /// Creates a new repository on the given pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InvitationRepository for PostgresInvitationRepository {
    async fn insert_if_absent(&self, invitation: &Invitation) -> RepositoryResult<bool> {
        let sent_at: DateTime<Utc> = invitation.sent_at.into();
        let result = sqlx::query(
            r#"
            INSERT INTO request_invitations (request_id, provider_id, round, sent_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (request_id, provider_id, round) DO NOTHING
            "#,
        )
        .bind(invitation.request_id.get())
        .bind(invitation.provider_id.get())
        .bind(i32::try_from(invitation.round).unwrap_or(i32::MAX))
        .bind(sent_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::query(e.to_string()))?;

        Ok(result.rows_affected() == 1)
    }

    async fn find_by_request_and_round(
        &self,
        request_id: RequestId,
        round: u32,
    ) -> RepositoryResult<Vec<Invitation>> {
        let rows: Vec<(i64, i64, i32, DateTime<Utc>)> = sqlx::query_as(
            r#"
            SELECT request_id, provider_id, round, sent_at
            FROM request_invitations
            WHERE request_id = $1 AND round = $2
            ORDER BY provider_id ASC
            "#,
        )
        .bind(request_id.get())
        .bind(i32::try_from(round).unwrap_or(i32::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::query(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|(request, provider, round, sent_at)| Invitation {
                request_id: RequestId::new(request),
                provider_id: ProviderId::new(provider),
                round: u32::try_from(round).unwrap_or(1),
                sent_at: Timestamp::from(sent_at),
            })
            .collect())
    }
}
