//! # Integration Ports
//!
//! Traits for every outbound collaborator so services can be wired with
//! HTTP clients in production and logging stubs or test doubles elsewhere.

use crate::infrastructure::integrations::error::IntegrationResult;
use crate::infrastructure::integrations::http_client::RemoteResponse;
use crate::infrastructure::integrations::payloads::{
    AckRequest, BrokerMessage, CoreQuote, InvitationRecord, RequestQuotes, SubscribeRequest,
    SubscriptionDetails,
};
use async_trait::async_trait;
use std::fmt;

/// Client for the Matching broker.
#[async_trait]
pub trait MatchingApi: Send + Sync + fmt::Debug {
    /// Creates a subscription.
    async fn subscribe(&self, request: &SubscribeRequest) -> IntegrationResult<RemoteResponse>;

    /// Lists the subscriptions visible to our API key.
    async fn list_subscriptions(&self) -> IntegrationResult<Vec<SubscriptionDetails>>;

    /// Deletes a subscription.
    async fn unsubscribe(&self, subscription_id: &str) -> IntegrationResult<RemoteResponse>;

    /// Acknowledges a pushed message.
    async fn acknowledge(&self, ack: &AckRequest) -> IntegrationResult<RemoteResponse>;

    /// Publishes a message.
    async fn publish(&self, message: &BrokerMessage) -> IntegrationResult<RemoteResponse>;
}

/// Sends invitations to quote.
#[async_trait]
pub trait InvitationSender: Send + Sync + fmt::Debug {
    /// Delivers one invitation.
    async fn send_invitation(&self, record: &InvitationRecord) -> IntegrationResult<()>;
}

/// Core quotes endpoint.
#[async_trait]
pub trait CoreQuotesClient: Send + Sync + fmt::Debug {
    /// Forwards a single quote.
    async fn submit_quote(&self, quote: &CoreQuote) -> IntegrationResult<()>;
}

/// Requests module.
#[async_trait]
pub trait RequestsModuleClient: Send + Sync + fmt::Debug {
    /// Replaces the quote list of a request.
    async fn put_quotes(&self, quotes: &RequestQuotes) -> IntegrationResult<()>;
}

/// Search indexer.
#[async_trait]
pub trait SearchIndexClient: Send + Sync + fmt::Debug {
    /// Indexes the quote list of a request.
    async fn index_quotes(&self, quotes: &RequestQuotes) -> IntegrationResult<()>;
}
