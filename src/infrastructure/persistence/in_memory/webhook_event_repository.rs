//! # In-Memory Webhook Event Log
//!
//! Append-only in-memory implementation of [`WebhookEventRepository`].

use crate::domain::entities::WebhookEvent;
use crate::infrastructure::persistence::traits::{
    RepositoryError, RepositoryResult, WebhookEventRepository,
};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory implementation of [`WebhookEventRepository`].
///
/// Events are kept in arrival order and never modified.
#[derive(Debug, Clone)]
pub struct InMemoryWebhookEventRepository {
    events: Arc<RwLock<Vec<WebhookEvent>>>,
}

impl InMemoryWebhookEventRepository {
    /// Creates a new empty log.
    #[must_use]
    pub fn new() -> Self {
        Self {
            events: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Returns the number of stored events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events
            .try_read()
            .map(|guard| guard.len())
            .unwrap_or(0)
    }

    /// Returns true if the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryWebhookEventRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WebhookEventRepository for InMemoryWebhookEventRepository {
    async fn append(&self, event: &WebhookEvent) -> RepositoryResult<()> {
        let mut events = self.events.write().await;
        if events.iter().any(|e| e.id == event.id) {
            return Err(RepositoryError::duplicate("WebhookEvent", event.id.to_string()));
        }
        events.push(event.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> RepositoryResult<Option<WebhookEvent>> {
        let events = self.events.read().await;
        Ok(events.iter().find(|e| e.id == id).cloned())
    }

    async fn recent(&self, limit: usize) -> RepositoryResult<Vec<WebhookEvent>> {
        let events = self.events.read().await;
        Ok(events.iter().rev().take(limit).cloned().collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn append_is_write_once() {
        let repo = InMemoryWebhookEventRepository::new();
        let event = WebhookEvent::received("{}", json!({}));

        repo.append(&event).await.unwrap();
        let err = repo.append(&event).await.unwrap_err();
        assert!(err.is_duplicate());
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn recent_is_newest_first() {
        let repo = InMemoryWebhookEventRepository::new();
        let first = WebhookEvent::received("1", json!({"n": 1}));
        let second = WebhookEvent::received("2", json!({"n": 2}));
        repo.append(&first).await.unwrap();
        repo.append(&second).await.unwrap();

        let recent = repo.recent(10).await.unwrap();
        assert_eq!(recent[0].id, second.id);
        assert_eq!(repo.recent(1).await.unwrap().len(), 1);
        assert!(repo.get(first.id).await.unwrap().is_some());
    }
}
