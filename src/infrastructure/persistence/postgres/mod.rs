//! # PostgreSQL Adapters
//!
//! sqlx-backed repositories for the tables whose uniqueness rules matter
//! under concurrent submissions. Schema lives in `migrations/`.

pub mod invitation_repository;
pub mod quote_repository;
pub mod webhook_event_store;

pub use invitation_repository::PostgresInvitationRepository;
pub use quote_repository::PostgresQuoteRepository;
pub use webhook_event_store::PostgresWebhookEventStore;
