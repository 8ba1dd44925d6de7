//! # Catalog
//!
//! Categories ("rubros"), the skills ("habilidades") that belong to them and
//! the zones providers work in.

use crate::domain::value_objects::{CategoryId, SkillId, ZoneId};
use serde::{Deserialize, Serialize};

/// A service category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Category id.
    pub id: CategoryId,
    /// Display name.
    pub name: String,
}

impl Category {
    /// Creates a category.
    #[must_use]
    pub fn new(id: CategoryId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// A skill within one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    /// Skill id.
    pub id: SkillId,
    /// Display name.
    pub name: String,
    /// Owning category.
    pub category_id: CategoryId,
}

impl Skill {
    /// Creates a skill.
    #[must_use]
    pub fn new(id: SkillId, name: impl Into<String>, category_id: CategoryId) -> Self {
        Self {
            id,
            name: name.into(),
            category_id,
        }
    }

    /// Returns true if the name matches, ignoring case and padding.
    #[must_use]
    pub fn is_named(&self, name: &str) -> bool {
        self.name.trim().eq_ignore_ascii_case(name.trim())
    }
}

/// A service zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    /// Zone id.
    pub id: ZoneId,
    /// Display name.
    pub name: String,
}

impl Zone {
    /// Creates a zone.
    #[must_use]
    pub fn new(id: ZoneId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}
