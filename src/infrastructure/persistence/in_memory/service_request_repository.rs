//! # In-Memory Service Request Repository
//!
//! In-memory implementation of [`ServiceRequestRepository`].

use crate::domain::entities::ServiceRequest;
use crate::domain::value_objects::{RequestId, RequestStatus};
use crate::infrastructure::persistence::traits::{RepositoryResult, ServiceRequestRepository};
use async_trait::async_trait;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory implementation of [`ServiceRequestRepository`].
#[derive(Debug, Clone)]
pub struct InMemoryServiceRequestRepository {
    storage: Arc<RwLock<HashMap<RequestId, ServiceRequest>>>,
}

impl InMemoryServiceRequestRepository {
    /// Creates a new empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self {
            storage: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Returns the number of requests in the repository.
    #[must_use]
    pub fn len(&self) -> usize {
        self.storage
            .try_read()
            .map(|guard| guard.len())
            .unwrap_or(0)
    }

    /// Returns true if the repository is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryServiceRequestRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ServiceRequestRepository for InMemoryServiceRequestRepository {
    async fn save(&self, request: &ServiceRequest) -> RepositoryResult<()> {
        let mut storage = self.storage.write().await;
        storage.insert(request.id(), request.clone());
        Ok(())
    }

    async fn insert_if_absent(&self, request: &ServiceRequest) -> RepositoryResult<bool> {
        let mut storage = self.storage.write().await;
        match storage.entry(request.id()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(request.clone());
                Ok(true)
            }
        }
    }

    async fn get(&self, id: RequestId) -> RepositoryResult<Option<ServiceRequest>> {
        let storage = self.storage.read().await;
        Ok(storage.get(&id).cloned())
    }

    async fn find_by_status(
        &self,
        status: RequestStatus,
    ) -> RepositoryResult<Vec<ServiceRequest>> {
        let storage = self.storage.read().await;
        let mut found: Vec<ServiceRequest> = storage
            .values()
            .filter(|r| r.status() == status)
            .cloned()
            .collect();
        found.sort_by_key(|r| r.id());
        Ok(found)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn insert_if_absent_keeps_first_version() {
        let repo = InMemoryServiceRequestRepository::new();
        let first = ServiceRequest::new(RequestId::new(1), "first");
        let second = ServiceRequest::new(RequestId::new(1), "second");

        assert!(repo.insert_if_absent(&first).await.unwrap());
        assert!(!repo.insert_if_absent(&second).await.unwrap());

        let stored = repo.get(RequestId::new(1)).await.unwrap().unwrap();
        assert_eq!(stored.description(), "first");
    }

    #[tokio::test]
    async fn find_by_status_filters_and_orders() {
        let repo = InMemoryServiceRequestRepository::new();
        let mut quoting = ServiceRequest::new(RequestId::new(2), "b");
        quoting.start_quoting().unwrap();
        repo.save(&ServiceRequest::new(RequestId::new(3), "c"))
            .await
            .unwrap();
        repo.save(&quoting).await.unwrap();
        repo.save(&ServiceRequest::new(RequestId::new(1), "a"))
            .await
            .unwrap();

        let created = repo.find_by_status(RequestStatus::Created).await.unwrap();
        let ids: Vec<i64> = created.iter().map(|r| r.id().get()).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(repo.len(), 3);
    }
}
