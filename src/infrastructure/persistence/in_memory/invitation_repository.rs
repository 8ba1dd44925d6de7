//! # In-Memory Invitation Repository
//!
//! Append-only in-memory implementation of [`InvitationRepository`].

use crate::domain::entities::{Invitation, InvitationKey};
use crate::domain::value_objects::RequestId;
use crate::infrastructure::persistence::traits::{InvitationRepository, RepositoryResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory implementation of [`InvitationRepository`].
#[derive(Debug, Clone)]
pub struct InMemoryInvitationRepository {
    storage: Arc<RwLock<HashMap<InvitationKey, Invitation>>>,
}

impl InMemoryInvitationRepository {
    /// Creates a new empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self {
            storage: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Returns the number of invitation rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.storage
            .try_read()
            .map(|guard| guard.len())
            .unwrap_or(0)
    }

    /// Returns true if no invitation is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryInvitationRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InvitationRepository for InMemoryInvitationRepository {
    async fn insert_if_absent(&self, invitation: &Invitation) -> RepositoryResult<bool> {
        let mut storage = self.storage.write().await;
        match storage.entry(invitation.key()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(*invitation);
                Ok(true)
            }
        }
    }

    async fn find_by_request_and_round(
        &self,
        request_id: RequestId,
        round: u32,
    ) -> RepositoryResult<Vec<Invitation>> {
        let storage = self.storage.read().await;
        let mut found: Vec<Invitation> = storage
            .values()
            .filter(|i| i.request_id == request_id && i.round == round)
            .copied()
            .collect();
        found.sort_by_key(|i| i.provider_id);
        Ok(found)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::value_objects::ProviderId;

    #[tokio::test]
    async fn duplicate_key_is_not_inserted() {
        let repo = InMemoryInvitationRepository::new();
        let inv = Invitation::new(RequestId::new(1), ProviderId::new(7), 1);

        assert!(repo.insert_if_absent(&inv).await.unwrap());
        assert!(!repo.insert_if_absent(&inv).await.unwrap());
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn same_provider_in_new_round_is_a_new_row() {
        let repo = InMemoryInvitationRepository::new();
        repo.insert_if_absent(&Invitation::new(RequestId::new(1), ProviderId::new(7), 1))
            .await
            .unwrap();
        repo.insert_if_absent(&Invitation::new(RequestId::new(1), ProviderId::new(7), 2))
            .await
            .unwrap();

        assert_eq!(
            repo.find_by_request_and_round(RequestId::new(1), 1)
                .await
                .unwrap()
                .len(),
            1
        );
        assert_eq!(repo.len(), 2);
    }
}
