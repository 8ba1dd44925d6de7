//! # Domain Entities
//!
//! ## Aggregates
//!
//! - [`ServiceRequest`]: service request with its lifecycle state machine
//! - [`Provider`]: tradesperson with ratings and skills
//!
//! ## Entities and Records
//!
//! - [`Quote`]: one quote per (provider, request)
//! - [`Invitation`]: append-only, one per (request, provider, round)
//! - [`WebhookEvent`]: write-once log of broker messages
//! - [`Category`], [`Skill`], [`Zone`]: catalog rows

pub mod catalog;
pub mod invitation;
pub mod provider;
pub mod quote;
pub mod service_request;
pub mod webhook_event;

pub use catalog::{Category, Skill, Zone};
pub use invitation::{Invitation, InvitationKey};
pub use provider::{ContactInfo, Provider, ACTIVE_STATUS};
pub use quote::Quote;
pub use service_request::ServiceRequest;
pub use webhook_event::{AckRecord, WebhookEvent};
