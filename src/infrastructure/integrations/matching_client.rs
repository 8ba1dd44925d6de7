//! # Matching Broker Client
//!
//! HTTP implementation of [`MatchingApi`].
//!
//! Every request carries `X-API-KEY` when a key is configured. Without a
//! key the client still works (the broker decides) and logs one warning
//! when it is built.
//!
//! # Examples
//!
//! ```ignore
//! use matching_service::infrastructure::integrations::matching_client::HttpMatchingClient;
//!
//! let client = HttpMatchingClient::from_settings(&settings.integrations.matching)?;
//! let subscriptions = client.list_subscriptions().await?;
//! ```

use crate::config::MatchingSettings;
use crate::infrastructure::integrations::error::{IntegrationError, IntegrationResult};
use crate::infrastructure::integrations::http_client::{HttpClient, RemoteResponse};
use crate::infrastructure::integrations::payloads::{
    AckRequest, BrokerMessage, SubscribeRequest, SubscriptionDetails,
};
use crate::infrastructure::integrations::traits::MatchingApi;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};

/// Header carrying the broker API key.
pub const API_KEY_HEADER: &str = "X-API-KEY";

/// Matching broker client over HTTP.
#[derive(Debug, Clone)]
pub struct HttpMatchingClient {
    http: HttpClient,
    base_url: String,
    subscribe_path: String,
    ack_path: String,
    publish_path: String,
}

impl HttpMatchingClient {
    /// Builds the client from validated broker settings.
    ///
    /// # Errors
    ///
    /// Returns `IntegrationError::Configuration` if the API key is not a
    /// valid header value or the HTTP client cannot be created.
    pub fn from_settings(settings: &MatchingSettings) -> IntegrationResult<Self> {
        let mut headers = HeaderMap::new();
        match settings.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
            Some(key) => {
                let value = HeaderValue::from_str(key).map_err(|e| {
                    IntegrationError::configuration(format!("invalid API key header: {}", e))
                })?;
                headers.insert(API_KEY_HEADER, value);
                tracing::info!(
                    base_url = %settings.base_url,
                    api_key = %settings.masked_api_key(),
                    "Matching client configured"
                );
            }
            None => {
                tracing::warn!(
                    base_url = %settings.base_url,
                    "Matching API key not configured; requests are sent without {}",
                    API_KEY_HEADER
                );
            }
        }

        Ok(Self {
            http: HttpClient::with_headers(settings.timeout_ms, headers)?,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            subscribe_path: settings.subscribe_path.clone(),
            ack_path: settings.ack_path.clone(),
            publish_path: settings.publish_path.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn ack_url(&self, msg_id: &str) -> String {
        self.url(&self.ack_path.replace(crate::config::MSG_ID_PLACEHOLDER, msg_id))
    }
}

#[async_trait]
impl MatchingApi for HttpMatchingClient {
    async fn subscribe(&self, request: &SubscribeRequest) -> IntegrationResult<RemoteResponse> {
        let body = SubscribeRequest {
            webhook_url: request.webhook_url.trim().to_string(),
            squad_name: request.squad_name.trim().to_string(),
            topic: request.topic.trim().to_string(),
            event_name: request.event_name.trim().to_string(),
        };
        tracing::debug!(topic = %body.topic, event_name = %body.event_name, "subscribing");
        self.http.post(&self.url(&self.subscribe_path), &body).await
    }

    async fn list_subscriptions(&self) -> IntegrationResult<Vec<SubscriptionDetails>> {
        self.http.get(&self.url(&self.subscribe_path)).await
    }

    async fn unsubscribe(&self, subscription_id: &str) -> IntegrationResult<RemoteResponse> {
        let url = self.url(&format!("{}/{}", self.subscribe_path, subscription_id.trim()));
        self.http.delete(&url).await
    }

    async fn acknowledge(&self, ack: &AckRequest) -> IntegrationResult<RemoteResponse> {
        self.http.post(&self.ack_url(&ack.msg_id), ack).await
    }

    async fn publish(&self, message: &BrokerMessage) -> IntegrationResult<RemoteResponse> {
        self.http.post(&self.url(&self.publish_path), message).await
    }
}
