//! # Persistence Layer
//!
//! ## Repository Traits (Ports)
//!
//! - [`ProviderRepository`], [`ServiceRequestRepository`], [`CatalogRepository`]
//! - [`QuoteRepository`]: one quote per (provider, request)
//! - [`InvitationRepository`]: one row per (request, provider, round)
//! - [`WebhookEventRepository`]: append-only webhook log
//!
//! ## Implementations
//!
//! - `in_memory`: in-process maps, used by tests and local runs
//! - `postgres`: sqlx adapters for quotes, invitations and the webhook log

pub mod in_memory;
pub mod postgres;
pub mod traits;

pub use traits::{
    CatalogRepository, InvitationRepository, ProviderRepository, QuoteRepository,
    RepositoryError, RepositoryResult, ServiceRequestRepository, UpsertOutcome,
    WebhookEventRepository,
};
