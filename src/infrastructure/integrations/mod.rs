//! # Integrations
//!
//! Outbound HTTP collaborators.
//!
//! - [`matching_client`]: Matching broker (subscriptions, acks, publishing)
//! - [`downstream`]: invitations, core quotes, requests module, search indexer
//! - [`stubs`]: logging stand-ins for the downstream modules

pub mod downstream;
pub mod error;
pub mod http_client;
pub mod matching_client;
pub mod payloads;
pub mod stubs;
pub mod traits;

pub use downstream::HttpDownstreamClient;
pub use error::{IntegrationError, IntegrationResult};
pub use http_client::{HttpClient, RemoteResponse};
pub use matching_client::HttpMatchingClient;
pub use stubs::LoggingStub;
pub use traits::{
    CoreQuotesClient, InvitationSender, MatchingApi, RequestsModuleClient, SearchIndexClient,
};
