//! Recording test doubles for the integration ports.

#![allow(clippy::unwrap_used)]

use crate::domain::value_objects::ProviderId;
use crate::infrastructure::integrations::error::{IntegrationError, IntegrationResult};
use crate::infrastructure::integrations::http_client::RemoteResponse;
use crate::infrastructure::integrations::payloads::{
    AckRequest, BrokerMessage, CoreQuote, InvitationRecord, RequestQuotes, SubscribeRequest,
    SubscriptionDetails,
};
use crate::infrastructure::integrations::traits::{
    CoreQuotesClient, InvitationSender, MatchingApi, RequestsModuleClient, SearchIndexClient,
};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;

fn ok(status: u16) -> RemoteResponse {
    RemoteResponse {
        status,
        body: String::new(),
    }
}

/// Matching broker double that records every call.
#[derive(Debug, Default)]
pub struct RecordingMatching {
    existing: Vec<SubscriptionDetails>,
    list_error: Option<IntegrationError>,
    subscribe_errors: Mutex<Vec<IntegrationError>>,
    ack_error: Option<IntegrationError>,
    publish_error: Option<IntegrationError>,
    subscribed: Mutex<Vec<SubscribeRequest>>,
    unsubscribed: Mutex<Vec<String>>,
    acks: Mutex<Vec<AckRequest>>,
    published: Mutex<Vec<BrokerMessage>>,
}

impl RecordingMatching {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_existing(mut self, existing: Vec<SubscriptionDetails>) -> Self {
        self.existing = existing;
        self
    }

    pub fn with_list_error(mut self, error: IntegrationError) -> Self {
        self.list_error = Some(error);
        self
    }

    /// Queues errors returned by successive subscribe calls.
    pub fn with_subscribe_errors(self, errors: Vec<IntegrationError>) -> Self {
        *self.subscribe_errors.lock().unwrap() = errors;
        self
    }

    pub fn with_ack_error(mut self, error: IntegrationError) -> Self {
        self.ack_error = Some(error);
        self
    }

    pub fn with_publish_error(mut self, error: IntegrationError) -> Self {
        self.publish_error = Some(error);
        self
    }

    pub fn subscribed(&self) -> Vec<SubscribeRequest> {
        self.subscribed.lock().unwrap().clone()
    }

    pub fn unsubscribed(&self) -> Vec<String> {
        self.unsubscribed.lock().unwrap().clone()
    }

    pub fn acks(&self) -> Vec<AckRequest> {
        self.acks.lock().unwrap().clone()
    }

    pub fn published(&self) -> Vec<BrokerMessage> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl MatchingApi for RecordingMatching {
    async fn subscribe(&self, request: &SubscribeRequest) -> IntegrationResult<RemoteResponse> {
        self.subscribed.lock().unwrap().push(request.clone());
        let mut errors = self.subscribe_errors.lock().unwrap();
        if errors.is_empty() {
            Ok(ok(201))
        } else {
            Err(errors.remove(0))
        }
    }

    async fn list_subscriptions(&self) -> IntegrationResult<Vec<SubscriptionDetails>> {
        match &self.list_error {
            Some(e) => Err(e.clone()),
            None => Ok(self.existing.clone()),
        }
    }

    async fn unsubscribe(&self, subscription_id: &str) -> IntegrationResult<RemoteResponse> {
        self.unsubscribed
            .lock()
            .unwrap()
            .push(subscription_id.to_string());
        Ok(ok(204))
    }

    async fn acknowledge(&self, ack: &AckRequest) -> IntegrationResult<RemoteResponse> {
        self.acks.lock().unwrap().push(ack.clone());
        match &self.ack_error {
            Some(e) => Err(e.clone()),
            None => Ok(ok(200)),
        }
    }

    async fn publish(&self, message: &BrokerMessage) -> IntegrationResult<RemoteResponse> {
        self.published.lock().unwrap().push(message.clone());
        match &self.publish_error {
            Some(e) => Err(e.clone()),
            None => Ok(ok(202)),
        }
    }
}

/// Downstream double that records every call.
#[derive(Debug, Default)]
pub struct RecordingDownstream {
    unreachable_providers: HashSet<ProviderId>,
    core_down: bool,
    invitations: Mutex<Vec<InvitationRecord>>,
    core_quotes: Mutex<Vec<CoreQuote>>,
    request_quotes: Mutex<Vec<RequestQuotes>>,
    indexed: Mutex<Vec<RequestQuotes>>,
}

impl RecordingDownstream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invitations to this provider fail.
    pub fn with_unreachable(mut self, provider: ProviderId) -> Self {
        self.unreachable_providers.insert(provider);
        self
    }

    /// Every core quotes call fails.
    pub fn with_core_down(mut self) -> Self {
        self.core_down = true;
        self
    }

    pub fn invitations(&self) -> Vec<InvitationRecord> {
        self.invitations.lock().unwrap().clone()
    }

    pub fn core_quotes(&self) -> Vec<CoreQuote> {
        self.core_quotes.lock().unwrap().clone()
    }

    pub fn request_quotes(&self) -> Vec<RequestQuotes> {
        self.request_quotes.lock().unwrap().clone()
    }

    pub fn indexed(&self) -> Vec<RequestQuotes> {
        self.indexed.lock().unwrap().clone()
    }
}

#[async_trait]
impl InvitationSender for RecordingDownstream {
    async fn send_invitation(&self, record: &InvitationRecord) -> IntegrationResult<()> {
        self.invitations.lock().unwrap().push(record.clone());
        if self.unreachable_providers.contains(&record.provider_id) {
            return Err(IntegrationError::connection("provider unreachable"));
        }
        Ok(())
    }
}

#[async_trait]
impl CoreQuotesClient for RecordingDownstream {
    async fn submit_quote(&self, quote: &CoreQuote) -> IntegrationResult<()> {
        self.core_quotes.lock().unwrap().push(quote.clone());
        if self.core_down {
            return Err(IntegrationError::http(500, "core down"));
        }
        Ok(())
    }
}

#[async_trait]
impl RequestsModuleClient for RecordingDownstream {
    async fn put_quotes(&self, quotes: &RequestQuotes) -> IntegrationResult<()> {
        self.request_quotes.lock().unwrap().push(quotes.clone());
        Ok(())
    }
}

#[async_trait]
impl SearchIndexClient for RecordingDownstream {
    async fn index_quotes(&self, quotes: &RequestQuotes) -> IntegrationResult<()> {
        self.indexed.lock().unwrap().push(quotes.clone());
        Ok(())
    }
}
