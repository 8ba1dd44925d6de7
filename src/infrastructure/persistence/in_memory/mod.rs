//! # In-Memory Repositories
//!
//! In-memory implementations used by tests and by local runs without a
//! database.
//!
//! ## Available Repositories
//!
//! - [`InMemoryProviderRepository`]
//! - [`InMemoryServiceRequestRepository`]
//! - [`InMemoryQuoteRepository`]
//! - [`InMemoryInvitationRepository`]
//! - [`InMemoryWebhookEventRepository`]
//! - [`InMemoryCatalogRepository`]
//!
//! ## Thread Safety
//!
//! All implementations use `Arc<RwLock<..>>` for thread-safe access, and
//! uniqueness checks happen under a single write lock.

pub mod catalog_repository;
pub mod invitation_repository;
pub mod provider_repository;
pub mod quote_repository;
pub mod service_request_repository;
pub mod webhook_event_repository;

pub use catalog_repository::InMemoryCatalogRepository;
pub use invitation_repository::InMemoryInvitationRepository;
pub use provider_repository::InMemoryProviderRepository;
pub use quote_repository::InMemoryQuoteRepository;
pub use service_request_repository::InMemoryServiceRequestRepository;
pub use webhook_event_repository::InMemoryWebhookEventRepository;
