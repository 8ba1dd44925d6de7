//! # In-Memory Provider Repository
//!
//! In-memory implementation of [`ProviderRepository`] for tests and local
//! runs without a database.

use crate::domain::entities::Provider;
use crate::domain::value_objects::{ProviderId, SkillId};
use crate::infrastructure::persistence::traits::{ProviderRepository, RepositoryResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory implementation of [`ProviderRepository`].
#[derive(Debug, Clone)]
pub struct InMemoryProviderRepository {
    storage: Arc<RwLock<HashMap<ProviderId, Provider>>>,
}

impl InMemoryProviderRepository {
    /// Creates a new empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self {
            storage: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Returns the number of providers in the repository.
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

    /// Clears all providers.
    pub async fn clear(&self) {
        let mut storage = self.storage.write().await;
        storage.clear();
    }
}

impl Default for InMemoryProviderRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProviderRepository for InMemoryProviderRepository {
    async fn save(&self, provider: &Provider) -> RepositoryResult<()> {
        let mut storage = self.storage.write().await;
        storage.insert(provider.id(), provider.clone());
        Ok(())
    }

    async fn get(&self, id: ProviderId) -> RepositoryResult<Option<Provider>> {
        let storage = self.storage.read().await;
        Ok(storage.get(&id).cloned())
    }

    async fn find_by_any_skill(&self, skills: &[SkillId]) -> RepositoryResult<Vec<Provider>> {
        let storage = self.storage.read().await;
        let mut matches: Vec<Provider> = storage
            .values()
            .filter(|p| skills.iter().any(|s| p.has_skill(*s)))
            .cloned()
            .collect();
        matches.sort_by_key(|p| p.id());
        Ok(matches)
    }

    async fn count(&self) -> RepositoryResult<u64> {
        let storage = self.storage.read().await;
        Ok(storage.len() as u64)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn provider(id: i64, skills: &[i64]) -> Provider {
        Provider::new(ProviderId::new(id), "Name", "Surname")
            .with_status("ACTIVO")
            .with_skills(skills.iter().map(|s| SkillId::new(*s)).collect())
    }

    #[tokio::test]
    async fn new_repository_is_empty() {
        let repo = InMemoryProviderRepository::new();
        assert!(repo.is_empty());
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn save_replaces_existing() {
        let repo = InMemoryProviderRepository::new();
        repo.save(&provider(1, &[1])).await.unwrap();
        repo.save(&provider(1, &[2])).await.unwrap();

        assert_eq!(repo.len(), 1);
        let stored = repo.get(ProviderId::new(1)).await.unwrap().unwrap();
        assert_eq!(stored.skills(), &[SkillId::new(2)]);
    }

    #[tokio::test]
    async fn find_by_any_skill_returns_each_provider_once() {
        let repo = InMemoryProviderRepository::new();
        repo.save(&provider(1, &[1, 2])).await.unwrap();
        repo.save(&provider(2, &[2])).await.unwrap();
        repo.save(&provider(3, &[9])).await.unwrap();

        let found = repo
            .find_by_any_skill(&[SkillId::new(1), SkillId::new(2)])
            .await
            .unwrap();
        let ids: Vec<i64> = found.iter().map(|p| p.id().get()).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[tokio::test]
    async fn clear_removes_everything() {
        let repo = InMemoryProviderRepository::new();
        repo.save(&provider(1, &[1])).await.unwrap();
        repo.clear().await;
        assert!(repo.is_empty());
    }
}
