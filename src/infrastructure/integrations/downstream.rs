//! # Downstream Module Clients
//!
//! HTTP implementations of the invitation, core quotes, requests module
//! and search indexer ports. One client serves all four endpoints.

use crate::config::DownstreamSettings;
use crate::infrastructure::integrations::error::IntegrationResult;
use crate::infrastructure::integrations::http_client::HttpClient;
use crate::infrastructure::integrations::payloads::{CoreQuote, InvitationRecord, RequestQuotes};
use crate::infrastructure::integrations::traits::{
    CoreQuotesClient, InvitationSender, RequestsModuleClient, SearchIndexClient,
};
use async_trait::async_trait;

/// HTTP client for the downstream marketplace modules.
#[derive(Debug, Clone)]
pub struct HttpDownstreamClient {
    http: HttpClient,
    invitations_url: String,
    core_quotes_url: String,
    requests_url: String,
    search_url: String,
}

impl HttpDownstreamClient {
    /// Builds the client from downstream settings.
    ///
    /// # Errors
    ///
    /// Returns `IntegrationError::Configuration` if the HTTP client cannot
    /// be created.
    pub fn from_settings(settings: &DownstreamSettings) -> IntegrationResult<Self> {
        Ok(Self {
            http: HttpClient::new(settings.timeout_ms)?,
            invitations_url: trimmed(&settings.invitations_url),
            core_quotes_url: trimmed(&settings.core_quotes_url),
            requests_url: trimmed(&settings.requests_url),
            search_url: trimmed(&settings.search_url),
        })
    }

    /// URL of the quote list of one request in the requests module.
    fn request_quotes_url(&self, quotes: &RequestQuotes) -> String {
        format!("{}/{}/cotizaciones", self.requests_url, quotes.request_id)
    }
}

fn trimmed(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

#[async_trait]
impl InvitationSender for HttpDownstreamClient {
    async fn send_invitation(&self, record: &InvitationRecord) -> IntegrationResult<()> {
        self.http.post(&self.invitations_url, record).await?;
        Ok(())
    }
}

#[async_trait]
impl CoreQuotesClient for HttpDownstreamClient {
    async fn submit_quote(&self, quote: &CoreQuote) -> IntegrationResult<()> {
        self.http.post(&self.core_quotes_url, quote).await?;
        Ok(())
    }
}

#[async_trait]
impl RequestsModuleClient for HttpDownstreamClient {
    async fn put_quotes(&self, quotes: &RequestQuotes) -> IntegrationResult<()> {
        self.http.put(&self.request_quotes_url(quotes), quotes).await?;
        Ok(())
    }
}

#[async_trait]
impl SearchIndexClient for HttpDownstreamClient {
    async fn index_quotes(&self, quotes: &RequestQuotes) -> IntegrationResult<()> {
        self.http.post(&self.search_url, quotes).await?;
        Ok(())
    }
}
