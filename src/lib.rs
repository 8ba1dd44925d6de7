//! # Matching Service
//!
//! Backend of the marketplace matching module. It connects service requests
//! with the providers that can fulfil them.
//!
//! - Ranks providers per request and invites the Top-N, with a higher
//!   quota for critical requests and additional invitation rounds.
//! - Accepts one quote per (provider, request), updating it on resubmission,
//!   and fans it out to the core quotes module, the requests module and the
//!   search indexer.
//! - Integrates with the Matching message broker: reconciles subscriptions
//!   at startup, receives pushed messages on a webhook, acknowledges them,
//!   stores them and turns request events into invitations or cancellations.
//! - Syncs providers and rating batches from upstream modules.
//!
//! ## Layers
//!
//! - [`domain`]: entities and value objects with no I/O
//! - [`application`]: services implementing the workflows
//! - [`infrastructure`]: repositories and outbound HTTP clients
//! - [`api`]: axum REST surface
//! - [`bootstrap`]: wiring from [`config::Settings`]

pub mod api;
pub mod application;
pub mod bootstrap;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod telemetry;

pub use bootstrap::{Application, Integrations, Repositories};
pub use config::Settings;
