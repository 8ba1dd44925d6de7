//! # Repository Traits
//!
//! Port definitions for persistence abstraction.
//!
//! Associations are resolved through explicit query methods (for example
//! providers by skill, quotes by request) instead of lazily loaded graphs.
//! Uniqueness rules the workflows rely on live here as well: one quote per
//! (provider, request) and one invitation per (request, provider, round).
//!
//! # Available Repositories
//!
//! - [`ProviderRepository`]: providers with ratings and skills
//! - [`ServiceRequestRepository`]: service requests
//! - [`QuoteRepository`]: quotes, upserted per (provider, request)
//! - [`InvitationRepository`]: append-only invitation rows
//! - [`WebhookEventRepository`]: append-only webhook log
//! - [`CatalogRepository`]: categories and skills
//!
//! # Examples
//!
//! ```ignore
//! use matching_service::infrastructure::persistence::traits::ServiceRequestRepository;
//! use matching_service::domain::value_objects::RequestStatus;
//!
//! async fn pending(repo: &impl ServiceRequestRepository) {
//!     let created = repo.find_by_status(RequestStatus::Created).await.unwrap();
//!     println!("{} requests waiting for invitations", created.len());
//! }
//! ```

use crate::domain::entities::{
    Category, Invitation, Provider, Quote, ServiceRequest, Skill, WebhookEvent, Zone,
};
use crate::domain::value_objects::{
    CategoryId, ProviderId, QuoteAmount, RequestId, RequestStatus, SkillId, ZoneId,
};
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Error type for repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Entity not found.
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound {
        /// Type of entity.
        entity_type: &'static str,
        /// Entity identifier.
        id: String,
    },

    /// Duplicate entity.
    #[error("Duplicate entity: {entity_type} with id {id} already exists")]
    Duplicate {
        /// Type of entity.
        entity_type: &'static str,
        /// Entity identifier.
        id: String,
    },

    /// Connection error.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query error.
    #[error("Query error: {0}")]
    Query(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl RepositoryError {
    /// Creates a not found error.
    #[must_use]
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates a duplicate error.
    #[must_use]
    pub fn duplicate(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::Duplicate {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates a connection error.
    #[must_use]
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a query error.
    #[must_use]
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Creates a serialization error.
    #[must_use]
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    /// Returns true if this is a not found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns true if this is a duplicate error.
    #[must_use]
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate { .. })
    }
}

/// Result type for repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Whether an upsert inserted a new row or updated an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// A new row was inserted.
    Created,
    /// An existing row was updated in place.
    Updated,
}

impl UpsertOutcome {
    /// Returns true for [`UpsertOutcome::Created`].
    #[must_use]
    pub fn is_created(self) -> bool {
        matches!(self, Self::Created)
    }
}

/// Repository for providers.
#[async_trait]
pub trait ProviderRepository: Send + Sync + fmt::Debug {
    /// Inserts or replaces a provider.
    async fn save(&self, provider: &Provider) -> RepositoryResult<()>;

    /// Gets a provider by id.
    async fn get(&self, id: ProviderId) -> RepositoryResult<Option<Provider>>;

    /// Returns providers offering at least one of the given skills.
    ///
    /// Each provider appears once regardless of how many skills match.
    async fn find_by_any_skill(&self, skills: &[SkillId]) -> RepositoryResult<Vec<Provider>>;

    /// Counts all providers.
    async fn count(&self) -> RepositoryResult<u64>;
}

/// Repository for service requests.
#[async_trait]
pub trait ServiceRequestRepository: Send + Sync + fmt::Debug {
    /// Inserts or replaces a request.
    async fn save(&self, request: &ServiceRequest) -> RepositoryResult<()>;

    /// Inserts the request only if its id is unknown.
    ///
    /// Returns `true` if it was inserted.
    async fn insert_if_absent(&self, request: &ServiceRequest) -> RepositoryResult<bool>;

    /// Gets a request by id.
    async fn get(&self, id: RequestId) -> RepositoryResult<Option<ServiceRequest>>;

    /// Returns all requests in the given status, ordered by id.
    async fn find_by_status(&self, status: RequestStatus)
    -> RepositoryResult<Vec<ServiceRequest>>;
}

/// Repository for quotes.
#[async_trait]
pub trait QuoteRepository: Send + Sync + fmt::Debug {
    /// Creates or updates the quote for (provider, request).
    ///
    /// Never produces a second row for the same pair.
    async fn upsert(
        &self,
        request_id: RequestId,
        provider_id: ProviderId,
        amount: QuoteAmount,
        round: u32,
    ) -> RepositoryResult<(Quote, UpsertOutcome)>;

    /// Gets the quote for (provider, request).
    async fn find(
        &self,
        request_id: RequestId,
        provider_id: ProviderId,
    ) -> RepositoryResult<Option<Quote>>;

    /// Returns all quotes of a request, ordered by provider id.
    async fn find_by_request(&self, request_id: RequestId) -> RepositoryResult<Vec<Quote>>;
}

/// Repository for invitation rows.
#[async_trait]
pub trait InvitationRepository: Send + Sync + fmt::Debug {
    /// Appends the invitation unless (request, provider, round) exists.
    ///
    /// Returns `true` if it was inserted.
    async fn insert_if_absent(&self, invitation: &Invitation) -> RepositoryResult<bool>;

    /// Returns the invitations of a request in one round.
    async fn find_by_request_and_round(
        &self,
        request_id: RequestId,
        round: u32,
    ) -> RepositoryResult<Vec<Invitation>>;
}

/// Append-only store of webhook messages.
#[async_trait]
pub trait WebhookEventRepository: Send + Sync + fmt::Debug {
    /// Appends an event.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Duplicate` if the event id already exists.
    async fn append(&self, event: &WebhookEvent) -> RepositoryResult<()>;

    /// Gets an event by id.
    async fn get(&self, id: Uuid) -> RepositoryResult<Option<WebhookEvent>>;

    /// Returns the most recent events, newest first.
    async fn recent(&self, limit: usize) -> RepositoryResult<Vec<WebhookEvent>>;
}

/// Repository for categories and skills.
#[async_trait]
pub trait CatalogRepository: Send + Sync + fmt::Debug {
    /// Inserts or replaces a category.
    async fn save_category(&self, category: &Category) -> RepositoryResult<()>;

    /// Gets a category by id.
    async fn get_category(&self, id: CategoryId) -> RepositoryResult<Option<Category>>;

    /// Inserts or replaces a skill.
    async fn save_skill(&self, skill: &Skill) -> RepositoryResult<()>;

    /// Gets a skill by id.
    async fn get_skill(&self, id: SkillId) -> RepositoryResult<Option<Skill>>;

    /// Finds a skill of a category by name, ignoring case.
    async fn find_skill_by_name(
        &self,
        name: &str,
        category_id: CategoryId,
    ) -> RepositoryResult<Option<Skill>>;

    /// Creates a skill with a fresh id.
    async fn create_skill(&self, name: &str, category_id: CategoryId) -> RepositoryResult<Skill>;

    /// Returns the skills of a category.
    async fn skills_in_category(&self, category_id: CategoryId) -> RepositoryResult<Vec<Skill>>;

    /// Inserts or replaces a zone.
    async fn save_zone(&self, zone: &Zone) -> RepositoryResult<()>;

    /// Gets a zone by id.
    async fn get_zone(&self, id: ZoneId) -> RepositoryResult<Option<Zone>>;
}
