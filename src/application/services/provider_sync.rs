//! # Provider Sync
//!
//! Mirrors providers pushed by the providers module.
//!
//! A sync replaces the local provider wholesale: contact fields, status,
//! price, zone, ratings, completed jobs and skills. Skills are resolved
//! against the local catalog by id, then by (name, category); unknown
//! skills are created when their category exists.
//!
//! User events from the identity module only touch the profile. A provider
//! created or updated that way keeps its ratings, jobs, skills, price and
//! zone, and a deactivated user turns the provider `INACTIVO`.

use crate::application::error::{ApplicationError, ApplicationResult};
use crate::application::services::batch::BatchReport;
use crate::domain::entities::{ACTIVE_STATUS, ContactInfo, Provider, Skill};
use crate::domain::value_objects::{CategoryId, ProviderId, RatingScore, SkillId, ZoneId};
use crate::infrastructure::persistence::{CatalogRepository, ProviderRepository};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// Category reference inside a skill.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
    /// Category id.
    #[serde(default)]
    pub id: Option<CategoryId>,
    /// Category name.
    #[serde(default)]
    pub nombre: Option<String>,
}

/// Skill reference inside a provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillRef {
    /// Skill id, when known upstream.
    #[serde(default)]
    pub id: Option<SkillId>,
    /// Skill name.
    #[serde(default)]
    pub nombre: Option<String>,
    /// Owning category.
    #[serde(default)]
    pub rubro: Option<CategoryRef>,
}

/// Provider as pushed by the providers module.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderSyncRequest {
    /// Provider id.
    pub id: Option<ProviderId>,
    /// First name.
    pub nombre: Option<String>,
    /// Surname.
    pub apellido: Option<String>,
    /// Email.
    pub email: Option<String>,
    /// Phone.
    pub telefono: Option<String>,
    /// Street address.
    pub direccion: Option<String>,
    /// Status text.
    pub estado: Option<String>,
    /// Hourly price.
    pub precio_hora: Option<Decimal>,
    /// Zone.
    pub zona_id: Option<ZoneId>,
    /// Offered skills.
    pub habilidades: Option<Vec<SkillRef>>,
    /// Full rating list.
    pub calificacion: Option<Vec<i64>>,
    /// Completed jobs; 0 when missing.
    pub trabajos_finalizados: Option<u32>,
}

/// Status given to providers whose user was deactivated.
pub const INACTIVE_STATUS: &str = "INACTIVO";

const PROVIDER_ROLE: &str = "PRESTADOR";

/// User profile carried by identity module events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    /// User id, which is also the provider id.
    pub user_id: Option<ProviderId>,
    /// Alternative id field.
    pub id: Option<ProviderId>,
    /// Role name.
    #[serde(alias = "rol")]
    pub role: Option<String>,
    /// First name.
    pub first_name: Option<String>,
    /// Surname.
    pub last_name: Option<String>,
    /// Email.
    pub email: Option<String>,
    /// Phone.
    #[serde(alias = "telefono")]
    pub phone_number: Option<String>,
}

impl UserProfile {
    /// The provider id, from `userId` or `id`.
    #[must_use]
    pub fn provider_id(&self) -> Option<ProviderId> {
        self.user_id.or(self.id)
    }

    /// Returns true if the user has the provider role.
    #[must_use]
    pub fn is_provider(&self) -> bool {
        self.role
            .as_deref()
            .is_some_and(|r| r.trim().eq_ignore_ascii_case(PROVIDER_ROLE))
    }
}

/// Provider sync service.
#[derive(Debug, Clone)]
pub struct ProviderSyncService {
    providers: Arc<dyn ProviderRepository>,
    catalog: Arc<dyn CatalogRepository>,
}

impl ProviderSyncService {
    /// Creates the service.
    #[must_use]
    pub fn new(providers: Arc<dyn ProviderRepository>, catalog: Arc<dyn CatalogRepository>) -> Self {
        Self { providers, catalog }
    }

    /// Creates or replaces one provider.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a missing id, an invalid rating, more
    /// ratings than completed jobs or an unresolvable skill.
    pub async fn upsert(&self, request: &ProviderSyncRequest) -> ApplicationResult<Provider> {
        let id = request
            .id
            .ok_or_else(|| ApplicationError::validation("provider id is required"))?;
        let ratings = request
            .calificacion
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|score| RatingScore::new(*score))
            .collect::<Result<Vec<_>, _>>()?;
        let completed_jobs = request.trabajos_finalizados.unwrap_or(0);
        if ratings.len() > completed_jobs as usize {
            return Err(ApplicationError::validation(format!(
                "provider {id} has {} ratings but only {completed_jobs} completed jobs",
                ratings.len()
            )));
        }
        let skills = self
            .resolve_skills(request.habilidades.as_deref().unwrap_or_default())
            .await?;

        let provider = Provider::new(
            id,
            request.nombre.clone().unwrap_or_default(),
            request.apellido.clone().unwrap_or_default(),
        )
        .with_contact(ContactInfo {
            email: request.email.clone(),
            phone: request.telefono.clone(),
            address: request.direccion.clone(),
        })
        .with_status(request.estado.clone().unwrap_or_default())
        .with_hourly_price(request.precio_hora)
        .with_zone(request.zona_id)
        .with_ratings(ratings)
        .with_completed_jobs(completed_jobs)
        .with_skills(skills);

        let existed = self.providers.get(id).await?.is_some();
        self.providers.save(&provider).await?;
        tracing::info!(
            provider_id = %id,
            created = !existed,
            skills = provider.skills().len(),
            "provider synced"
        );
        Ok(provider)
    }

    /// Creates or refreshes a provider from a user profile and marks it active.
    ///
    /// # Errors
    ///
    /// Returns a validation error when the profile has no id.
    pub async fn upsert_profile(&self, profile: &UserProfile) -> ApplicationResult<Provider> {
        let id = profile
            .provider_id()
            .ok_or_else(|| ApplicationError::validation("user id is required"))?;
        let existing = self.providers.get(id).await?;

        let mut provider = Provider::new(
            id,
            profile.first_name.clone().unwrap_or_default(),
            profile.last_name.clone().unwrap_or_default(),
        )
        .with_status(ACTIVE_STATUS);
        let mut contact = ContactInfo {
            email: profile.email.clone(),
            phone: profile.phone_number.clone(),
            address: None,
        };
        if let Some(current) = &existing {
            contact.address = current.contact().address.clone();
            provider = provider
                .with_hourly_price(current.hourly_price())
                .with_zone(current.zone())
                .with_completed_jobs(current.completed_jobs())
                .with_ratings(current.ratings().to_vec())
                .with_skills(current.skills().to_vec());
        }
        let provider = provider.with_contact(contact);

        self.providers.save(&provider).await?;
        tracing::info!(
            provider_id = %id,
            created = existing.is_none(),
            "provider profile synced"
        );
        Ok(provider)
    }

    /// Marks a provider inactive.
    ///
    /// Returns `false` when the provider is unknown or already inactive.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository fails.
    pub async fn deactivate(&self, id: ProviderId) -> ApplicationResult<bool> {
        let Some(provider) = self.providers.get(id).await? else {
            tracing::warn!(provider_id = %id, "deactivation for unknown provider ignored");
            return Ok(false);
        };
        if provider.status().eq_ignore_ascii_case(INACTIVE_STATUS) {
            return Ok(false);
        }
        self.providers.save(&provider.with_status(INACTIVE_STATUS)).await?;
        tracing::info!(provider_id = %id, "provider deactivated");
        Ok(true)
    }

    /// Syncs every provider of a batch, isolating failures per item.
    pub async fn upsert_batch(&self, requests: &[ProviderSyncRequest]) -> BatchReport {
        let mut report = BatchReport::new(requests.len());
        for (index, request) in requests.iter().enumerate() {
            match self.upsert(request).await {
                Ok(_) => report.record_success(),
                Err(e) => {
                    if e.status_code() >= 500 {
                        tracing::error!(index, provider_id = ?request.id, error = %e, "provider sync failed");
                    } else {
                        tracing::warn!(index, provider_id = ?request.id, error = %e, "provider sync rejected");
                    }
                    report.record_failure(index, &e);
                }
            }
        }
        tracing::info!(
            total = report.total,
            succeeded = report.succeeded,
            failed = report.failed(),
            "provider batch processed"
        );
        report
    }

    async fn resolve_skills(&self, incoming: &[SkillRef]) -> ApplicationResult<Vec<SkillId>> {
        let mut seen = HashSet::new();
        let mut resolved = Vec::with_capacity(incoming.len());
        for skill_ref in incoming {
            let skill = self.resolve_skill(skill_ref).await?;
            if seen.insert(skill.id) {
                resolved.push(skill.id);
            }
        }
        Ok(resolved)
    }

    async fn resolve_skill(&self, skill_ref: &SkillRef) -> ApplicationResult<Skill> {
        if let Some(id) = skill_ref.id {
            if let Some(skill) = self.catalog.get_skill(id).await? {
                return Ok(skill);
            }
        }

        let name = skill_ref
            .nombre
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| ApplicationError::validation("skill name is required"))?;
        let category_id = skill_ref
            .rubro
            .as_ref()
            .and_then(|r| r.id)
            .ok_or_else(|| ApplicationError::validation("skill category id is required"))?;

        if let Some(skill) = self.catalog.find_skill_by_name(name, category_id).await? {
            return Ok(skill);
        }
        if self.catalog.get_category(category_id).await?.is_none() {
            return Err(ApplicationError::validation(format!(
                "category {category_id} does not exist"
            )));
        }

        let skill = self.catalog.create_skill(name, category_id).await?;
        tracing::info!(skill_id = %skill.id, name, category_id = %category_id, "skill created");
        Ok(skill)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::domain::entities::Category;
    use crate::infrastructure::persistence::in_memory::{
        InMemoryCatalogRepository, InMemoryProviderRepository,
    };

    async fn service() -> (
        Arc<InMemoryProviderRepository>,
        Arc<InMemoryCatalogRepository>,
        ProviderSyncService,
    ) {
        let providers = Arc::new(InMemoryProviderRepository::new());
        let catalog = Arc::new(InMemoryCatalogRepository::new());
        catalog.save_category(&Category::new(CategoryId::new(1), "Gas")).await.unwrap();
        catalog
            .save_skill(&Skill::new(SkillId::new(10), "Estufas", CategoryId::new(1)))
            .await
            .unwrap();
        let service = ProviderSyncService::new(providers.clone(), catalog.clone());
        (providers, catalog, service)
    }

    fn skill(id: Option<i64>, name: Option<&str>, category: Option<i64>) -> SkillRef {
        SkillRef {
            id: id.map(SkillId::new),
            nombre: name.map(str::to_string),
            rubro: category.map(|c| CategoryRef {
                id: Some(CategoryId::new(c)),
                nombre: None,
            }),
        }
    }

    #[tokio::test]
    async fn sync_replaces_everything() {
        let (providers, _, service) = service().await;
        let old = Provider::new(ProviderId::new(5), "Old", "Name")
            .with_completed_jobs(9)
            .with_ratings(vec![RatingScore::new(1).unwrap()]);
        providers.save(&old).await.unwrap();

        let request: ProviderSyncRequest = serde_json::from_value(serde_json::json!({
            "id": 5,
            "nombre": "Rosa",
            "apellido": "Lopez",
            "email": "rosa@example.com",
            "estado": "ACTIVO",
            "precioHora": 1200.5,
            "calificacion": [5, 4],
            "trabajosFinalizados": 4,
            "habilidades": [{"id": 10}]
        }))
        .unwrap();
        service.upsert(&request).await.unwrap();

        let stored = providers.get(ProviderId::new(5)).await.unwrap().unwrap();
        assert_eq!(stored.display_name(), "Rosa Lopez");
        assert_eq!(stored.contact().email.as_deref(), Some("rosa@example.com"));
        assert!(stored.is_active());
        assert_eq!(stored.completed_jobs(), 4);
        assert_eq!(stored.ratings().len(), 2);
        assert_eq!(stored.skills(), &[SkillId::new(10)]);
        assert_eq!(stored.hourly_price(), Some(Decimal::new(12005, 1)));
    }

    #[tokio::test]
    async fn ratings_beyond_completed_jobs_are_rejected() {
        let (providers, _, service) = service().await;
        let request: ProviderSyncRequest = serde_json::from_value(serde_json::json!({
            "id": 77,
            "estado": "ACTIVO",
            "calificacion": [5, 4, 3]
        }))
        .unwrap();

        let err = service.upsert(&request).await.unwrap_err();
        assert!(err.is_validation());
        assert!(providers.get(ProviderId::new(77)).await.unwrap().is_none());

        let capped = ProviderSyncRequest {
            trabajos_finalizados: Some(3),
            ..request
        };
        let provider = service.upsert(&capped).await.unwrap();
        assert_eq!(provider.ratings().len(), 3);
        assert_eq!(provider.completed_jobs(), 3);
    }

    #[tokio::test]
    async fn skills_resolve_by_name_or_get_created() {
        let (_, catalog, service) = service().await;
        let request = ProviderSyncRequest {
            id: Some(ProviderId::new(6)),
            habilidades: Some(vec![
                skill(Some(999), Some(" estufas "), Some(1)),
                skill(None, Some("Calefones"), Some(1)),
                skill(Some(10), None, None),
            ]),
            ..ProviderSyncRequest::default()
        };

        let provider = service.upsert(&request).await.unwrap();
        assert_eq!(provider.skills().len(), 2);
        assert_eq!(provider.skills()[0], SkillId::new(10));

        let created = catalog
            .find_skill_by_name("calefones", CategoryId::new(1))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(provider.skills()[1], created.id);
    }

    #[tokio::test]
    async fn unknown_category_is_rejected() {
        let (providers, _, service) = service().await;
        let request = ProviderSyncRequest {
            id: Some(ProviderId::new(7)),
            habilidades: Some(vec![skill(None, Some("Nueva"), Some(99))]),
            ..ProviderSyncRequest::default()
        };

        let err = service.upsert(&request).await.unwrap_err();
        assert!(err.is_validation());
        assert!(providers.get(ProviderId::new(7)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn profile_update_keeps_reputation() {
        let (providers, _, service) = service().await;
        let existing = Provider::new(ProviderId::new(8), "Viejo", "Nombre")
            .with_status(INACTIVE_STATUS)
            .with_completed_jobs(2)
            .with_ratings(vec![RatingScore::new(4).unwrap()])
            .with_skills(vec![SkillId::new(10)]);
        providers.save(&existing).await.unwrap();

        let profile: UserProfile = serde_json::from_value(serde_json::json!({
            "userId": 8,
            "rol": "prestador",
            "firstName": "Luis",
            "lastName": "Perez",
            "telefono": "1155550000"
        }))
        .unwrap();
        assert!(profile.is_provider());
        service.upsert_profile(&profile).await.unwrap();

        let stored = providers.get(ProviderId::new(8)).await.unwrap().unwrap();
        assert_eq!(stored.display_name(), "Luis Perez");
        assert!(stored.is_active());
        assert_eq!(stored.contact().phone.as_deref(), Some("1155550000"));
        assert_eq!(stored.completed_jobs(), 2);
        assert_eq!(stored.ratings().len(), 1);
        assert_eq!(stored.skills(), &[SkillId::new(10)]);
    }

    #[tokio::test]
    async fn deactivation_marks_provider_inactive_once() {
        let (providers, _, service) = service().await;
        providers
            .save(&Provider::new(ProviderId::new(9), "Ana", "Ruiz").with_status(ACTIVE_STATUS))
            .await
            .unwrap();

        assert!(service.deactivate(ProviderId::new(9)).await.unwrap());
        assert!(!service.deactivate(ProviderId::new(9)).await.unwrap());
        assert!(!service.deactivate(ProviderId::new(404)).await.unwrap());

        let stored = providers.get(ProviderId::new(9)).await.unwrap().unwrap();
        assert!(!stored.is_active());
    }

    #[tokio::test]
    async fn batch_counts_failures() {
        let (providers, _, service) = service().await;
        let requests = vec![
            ProviderSyncRequest {
                id: Some(ProviderId::new(1)),
                ..ProviderSyncRequest::default()
            },
            ProviderSyncRequest::default(),
            ProviderSyncRequest {
                id: Some(ProviderId::new(2)),
                calificacion: Some(vec![7]),
                ..ProviderSyncRequest::default()
            },
        ];

        let report = service.upsert_batch(&requests).await;
        assert_eq!(report.succeeded, 1);
        assert_eq!(report.failed(), 2);
        assert_eq!(providers.len(), 1);
    }
}
