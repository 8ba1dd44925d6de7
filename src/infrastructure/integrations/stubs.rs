//! # Logging Stubs
//!
//! Stand-ins for the downstream modules used when
//! `integrations.downstream.mode = "stub"`. Each call is logged with its
//! JSON body and reported as delivered.

use crate::infrastructure::integrations::error::IntegrationResult;
use crate::infrastructure::integrations::payloads::{CoreQuote, InvitationRecord, RequestQuotes};
use crate::infrastructure::integrations::traits::{
    CoreQuotesClient, InvitationSender, RequestsModuleClient, SearchIndexClient,
};
use async_trait::async_trait;
use serde::Serialize;

/// Downstream stub that only logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingStub;

impl LoggingStub {
    /// Creates a new stub.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn log_call<T: Serialize>(target: &str, body: &T) {
    let json = serde_json::to_string(body).unwrap_or_else(|e| format!("<unserializable: {e}>"));
    tracing::info!(target_endpoint = target, body = %json, "stubbed downstream call");
}

#[async_trait]
impl InvitationSender for LoggingStub {
    async fn send_invitation(&self, record: &InvitationRecord) -> IntegrationResult<()> {
        log_call("invitations", record);
        Ok(())
    }
}

#[async_trait]
impl CoreQuotesClient for LoggingStub {
    async fn submit_quote(&self, quote: &CoreQuote) -> IntegrationResult<()> {
        log_call("core/cotizaciones", quote);
        Ok(())
    }
}

#[async_trait]
impl RequestsModuleClient for LoggingStub {
    async fn put_quotes(&self, quotes: &RequestQuotes) -> IntegrationResult<()> {
        log_call("solicitudes/cotizaciones", quotes);
        Ok(())
    }
}

#[async_trait]
impl SearchIndexClient for LoggingStub {
    async fn index_quotes(&self, quotes: &RequestQuotes) -> IntegrationResult<()> {
        log_call("index/solicitudes", quotes);
        Ok(())
    }
}
