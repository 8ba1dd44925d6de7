//! # Catalog Sync
//!
//! Mirrors categories, skills and zones announced by the catalogue module.
//!
//! An `alta` event creates the row or renames it when the id is already
//! known. A `modificacion` event only renames existing rows and fails with
//! `NotFound` otherwise. Names are trimmed and must not be blank.

use crate::application::error::{ApplicationError, ApplicationResult};
use crate::domain::entities::{Category, Skill, Zone};
use crate::domain::value_objects::{CategoryId, SkillId, ZoneId};
use crate::infrastructure::persistence::CatalogRepository;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Category or zone as announced by the catalogue module.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamedEntry {
    /// External id.
    pub id: Option<i64>,
    /// Display name.
    pub nombre: Option<String>,
}

/// Skill as announced by the catalogue module.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillEntry {
    /// External id.
    pub id: Option<SkillId>,
    /// Display name.
    pub nombre: Option<String>,
    /// Owning category.
    pub id_rubro: Option<CategoryId>,
}

/// Whether an event may create missing rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Create or rename.
    Upsert,
    /// Rename only.
    Modify,
}

/// Catalog sync service.
#[derive(Debug, Clone)]
pub struct CatalogSyncService {
    catalog: Arc<dyn CatalogRepository>,
}

impl CatalogSyncService {
    /// Creates the service.
    #[must_use]
    pub fn new(catalog: Arc<dyn CatalogRepository>) -> Self {
        Self { catalog }
    }

    /// Applies a category event.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a missing id or name, and `NotFound`
    /// when a modification targets an unknown category.
    pub async fn sync_category(&self, entry: &NamedEntry, mode: SyncMode) -> ApplicationResult<Category> {
        let (id, name) = required_parts(entry.id, entry.nombre.as_deref(), "category")?;
        let id = CategoryId::new(id);
        let existing = self.catalog.get_category(id).await?;
        if existing.is_none() && mode == SyncMode::Modify {
            return Err(ApplicationError::not_found("Rubro", id));
        }

        let category = Category::new(id, name);
        self.catalog.save_category(&category).await?;
        tracing::info!(category_id = %id, name, created = existing.is_none(), "category synced");
        Ok(category)
    }

    /// Applies a zone event.
    ///
    /// # Errors
    ///
    /// Same rules as [`Self::sync_category`].
    pub async fn sync_zone(&self, entry: &NamedEntry, mode: SyncMode) -> ApplicationResult<Zone> {
        let (id, name) = required_parts(entry.id, entry.nombre.as_deref(), "zone")?;
        let id = ZoneId::new(id);
        let existing = self.catalog.get_zone(id).await?;
        if existing.is_none() && mode == SyncMode::Modify {
            return Err(ApplicationError::not_found("Zona", id));
        }

        let zone = Zone::new(id, name);
        self.catalog.save_zone(&zone).await?;
        tracing::info!(zone_id = %id, name, created = existing.is_none(), "zone synced");
        Ok(zone)
    }

    /// Applies a skill event. The owning category must already exist.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a missing id, name or category and for
    /// an unknown category, and `NotFound` when a modification targets an
    /// unknown skill.
    pub async fn sync_skill(&self, entry: &SkillEntry, mode: SyncMode) -> ApplicationResult<Skill> {
        let (id, name) = required_parts(entry.id.map(|id| id.get()), entry.nombre.as_deref(), "skill")?;
        let id = SkillId::new(id);
        let category_id = entry
            .id_rubro
            .ok_or_else(|| ApplicationError::validation("id_rubro is required for a skill"))?;

        let existing = self.catalog.get_skill(id).await?;
        if existing.is_none() && mode == SyncMode::Modify {
            return Err(ApplicationError::not_found("Habilidad", id));
        }
        if self.catalog.get_category(category_id).await?.is_none() {
            return Err(ApplicationError::validation(format!(
                "category {category_id} does not exist"
            )));
        }

        let skill = Skill::new(id, name, category_id);
        self.catalog.save_skill(&skill).await?;
        tracing::info!(
            skill_id = %id,
            name,
            category_id = %category_id,
            created = existing.is_none(),
            "skill synced"
        );
        Ok(skill)
    }
}

fn required_parts<'a>(
    id: Option<i64>,
    name: Option<&'a str>,
    kind: &str,
) -> ApplicationResult<(i64, &'a str)> {
    let id = id.ok_or_else(|| ApplicationError::validation(format!("{kind} id is required")))?;
    let name = name
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ApplicationError::validation(format!("{kind} name is required")))?;
    Ok((id, name))
}
