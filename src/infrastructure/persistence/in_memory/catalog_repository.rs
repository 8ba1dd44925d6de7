//! # In-Memory Catalog Repository
//!
//! In-memory implementation of [`CatalogRepository`].

use crate::domain::entities::{Category, Skill, Zone};
use crate::domain::value_objects::{CategoryId, SkillId, ZoneId};
use crate::infrastructure::persistence::traits::{CatalogRepository, RepositoryResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Catalog {
    categories: HashMap<CategoryId, Category>,
    skills: HashMap<SkillId, Skill>,
    zones: HashMap<ZoneId, Zone>,
}

/// In-memory implementation of [`CatalogRepository`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalogRepository {
    storage: Arc<RwLock<Catalog>>,
}

impl InMemoryCatalogRepository {
    /// Creates a new empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CatalogRepository for InMemoryCatalogRepository {
    async fn save_category(&self, category: &Category) -> RepositoryResult<()> {
        let mut storage = self.storage.write().await;
        storage.categories.insert(category.id, category.clone());
        Ok(())
    }

    async fn get_category(&self, id: CategoryId) -> RepositoryResult<Option<Category>> {
        let storage = self.storage.read().await;
        Ok(storage.categories.get(&id).cloned())
    }

    async fn save_skill(&self, skill: &Skill) -> RepositoryResult<()> {
        let mut storage = self.storage.write().await;
        storage.skills.insert(skill.id, skill.clone());
        Ok(())
    }

    async fn get_skill(&self, id: SkillId) -> RepositoryResult<Option<Skill>> {
        let storage = self.storage.read().await;
        Ok(storage.skills.get(&id).cloned())
    }

    async fn find_skill_by_name(
        &self,
        name: &str,
        category_id: CategoryId,
    ) -> RepositoryResult<Option<Skill>> {
        let storage = self.storage.read().await;
        Ok(storage
            .skills
            .values()
            .find(|s| s.category_id == category_id && s.is_named(name))
            .cloned())
    }

    async fn create_skill(&self, name: &str, category_id: CategoryId) -> RepositoryResult<Skill> {
        let mut storage = self.storage.write().await;
        let next = storage
            .skills
            .keys()
            .map(|id| id.get())
            .max()
            .unwrap_or(0)
            .saturating_add(1);
        let skill = Skill::new(SkillId::new(next), name.trim(), category_id);
        storage.skills.insert(skill.id, skill.clone());
        Ok(skill)
    }

    async fn skills_in_category(&self, category_id: CategoryId) -> RepositoryResult<Vec<Skill>> {
        let storage = self.storage.read().await;
        let mut skills: Vec<Skill> = storage
            .skills
            .values()
            .filter(|s| s.category_id == category_id)
            .cloned()
            .collect();
        skills.sort_by_key(|s| s.id);
        Ok(skills)
    }

    async fn save_zone(&self, zone: &Zone) -> RepositoryResult<()> {
        let mut storage = self.storage.write().await;
        storage.zones.insert(zone.id, zone.clone());
        Ok(())
    }

    async fn get_zone(&self, id: ZoneId) -> RepositoryResult<Option<Zone>> {
        let storage = self.storage.read().await;
        Ok(storage.zones.get(&id).cloned())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_skill_assigns_next_id() {
        let repo = InMemoryCatalogRepository::new();
        repo.save_skill(&Skill::new(SkillId::new(4), "Plumbing", CategoryId::new(1)))
            .await
            .unwrap();

        let created = repo.create_skill(" Tiling ", CategoryId::new(1)).await.unwrap();
        assert_eq!(created.id, SkillId::new(5));
        assert_eq!(created.name, "Tiling");
    }

    #[tokio::test]
    async fn find_skill_by_name_is_scoped_to_category() {
        let repo = InMemoryCatalogRepository::new();
        repo.save_skill(&Skill::new(SkillId::new(1), "Wiring", CategoryId::new(2)))
            .await
            .unwrap();

        assert!(
            repo.find_skill_by_name("wiring", CategoryId::new(2))
                .await
                .unwrap()
                .is_some()
        );
        assert!(
            repo.find_skill_by_name("wiring", CategoryId::new(3))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn skills_in_category_lists_only_members() {
        let repo = InMemoryCatalogRepository::new();
        repo.save_category(&Category::new(CategoryId::new(1), "Plumbing"))
            .await
            .unwrap();
        repo.save_skill(&Skill::new(SkillId::new(1), "Taps", CategoryId::new(1)))
            .await
            .unwrap();
        repo.save_skill(&Skill::new(SkillId::new(2), "Sockets", CategoryId::new(2)))
            .await
            .unwrap();

        let skills = repo.skills_in_category(CategoryId::new(1)).await.unwrap();
        assert_eq!(skills.len(), 1);
        assert!(repo.get_category(CategoryId::new(1)).await.unwrap().is_some());
    }
}
