//! # In-Memory Quote Repository
//!
//! In-memory implementation of [`QuoteRepository`].
//!
//! Quotes are keyed by (request, provider) so an upsert can never create a
//! second row for the same pair. The check and the write happen under one
//! write lock.

use crate::domain::entities::Quote;
use crate::domain::value_objects::{ProviderId, QuoteAmount, QuoteId, RequestId};
use crate::infrastructure::persistence::traits::{
    QuoteRepository, RepositoryResult, UpsertOutcome,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;

/// In-memory implementation of [`QuoteRepository`].
#[derive(Debug, Clone)]
pub struct InMemoryQuoteRepository {
    storage: Arc<RwLock<HashMap<(RequestId, ProviderId), Quote>>>,
    next_id: Arc<AtomicI64>,
}

impl InMemoryQuoteRepository {
    /// Creates a new empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self {
            storage: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(AtomicI64::new(1)),
        }
    }

    /// Returns the number of stored quotes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.storage
            .try_read()
            .map(|guard| guard.len())
            .unwrap_or(0)
    }

    /// Returns true if no quote is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryQuoteRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QuoteRepository for InMemoryQuoteRepository {
    async fn upsert(
        &self,
        request_id: RequestId,
        provider_id: ProviderId,
        amount: QuoteAmount,
        round: u32,
    ) -> RepositoryResult<(Quote, UpsertOutcome)> {
        let mut storage = self.storage.write().await;
        if let Some(existing) = storage.get_mut(&(request_id, provider_id)) {
            existing.revise(amount, round);
            return Ok((existing.clone(), UpsertOutcome::Updated));
        }

        let id = QuoteId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        let quote = Quote::new(id, request_id, provider_id, amount, round);
        storage.insert((request_id, provider_id), quote.clone());
        Ok((quote, UpsertOutcome::Created))
    }

    async fn find(
        &self,
        request_id: RequestId,
        provider_id: ProviderId,
    ) -> RepositoryResult<Option<Quote>> {
        let storage = self.storage.read().await;
        Ok(storage.get(&(request_id, provider_id)).cloned())
    }

    async fn find_by_request(&self, request_id: RequestId) -> RepositoryResult<Vec<Quote>> {
        let storage = self.storage.read().await;
        let mut quotes: Vec<Quote> = storage
            .values()
            .filter(|q| q.request_id() == request_id)
            .cloned()
            .collect();
        quotes.sort_by_key(|q| q.provider_id());
        Ok(quotes)
    }
}
