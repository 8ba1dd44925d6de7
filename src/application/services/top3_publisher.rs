//! # Top-3 Publisher
//!
//! Publishes invitation results and quote summaries to the Matching broker.
//!
//! Publication is best effort: a disabled publisher or an empty input is
//! reported as skipped, and broker failures are logged and returned in the
//! [`PublishResult`] instead of being raised.

use crate::application::services::invitation_workflow::Top3Result;
use crate::config::MatchingSettings;
use crate::domain::entities::{Quote, ServiceRequest};
use crate::domain::value_objects::{ProviderId, QuoteId, RequestId, RequestStatus, Timestamp};
use crate::infrastructure::integrations::payloads::{BrokerMessage, Destination};
use crate::infrastructure::integrations::traits::MatchingApi;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Status reported for skipped publications.
pub const SKIPPED_STATUS: u16 = 202;

/// Outcome of one publication attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishResult {
    /// Id of the published message; `None` when skipped.
    pub message_id: Option<Uuid>,
    /// Whether the broker accepted the message.
    pub success: bool,
    /// Broker status, or 202 when skipped.
    pub status: u16,
    /// Skip reason or error detail.
    pub error: Option<String>,
}

impl PublishResult {
    fn published(message_id: Uuid, status: u16) -> Self {
        Self {
            message_id: Some(message_id),
            success: true,
            status,
            error: None,
        }
    }

    fn failed(message_id: Uuid, status: u16, error: impl Into<String>) -> Self {
        Self {
            message_id: Some(message_id),
            success: false,
            status,
            error: Some(error.into()),
        }
    }

    fn skipped(reason: impl Into<String>) -> Self {
        Self {
            message_id: None,
            success: false,
            status: SKIPPED_STATUS,
            error: Some(reason.into()),
        }
    }

    /// Returns true if nothing was sent.
    #[must_use]
    pub fn is_skipped(&self) -> bool {
        self.message_id.is_none()
    }
}

impl fmt::Display for PublishResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.message_id {
            None => write!(f, "skipped: {}", self.error.as_deref().unwrap_or("")),
            Some(id) if self.success => write!(f, "published {} ({})", id, self.status),
            Some(id) => write!(
                f,
                "failed {} ({}): {}",
                id,
                self.status,
                self.error.as_deref().unwrap_or("")
            ),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Top3Payload<'a> {
    generated_at: Timestamp,
    solicitudes: &'a [Top3Result],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QuoteLine {
    cotizacion_id: QuoteId,
    prestador_id: ProviderId,
    monto: Decimal,
    round: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummary {
    solicitud_id: RequestId,
    estado: RequestStatus,
    es_critica: bool,
    prestador_asignado_id: Option<ProviderId>,
    objetivo_cotizaciones: usize,
    total_cotizaciones: usize,
    round: u32,
    cotizaciones: Vec<QuoteLine>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryPayload {
    generated_at: Timestamp,
    solicitud: QuoteSummary,
}

/// Publisher for invitation results and quote summaries.
#[derive(Debug, Clone)]
pub struct Top3Publisher {
    matching: Arc<dyn MatchingApi>,
    enabled: bool,
    source: String,
    top3: Destination,
    quotes: Destination,
}

impl Top3Publisher {
    /// Creates a publisher from the broker settings.
    #[must_use]
    pub fn new(matching: Arc<dyn MatchingApi>, settings: &MatchingSettings) -> Self {
        Self {
            matching,
            enabled: settings.publish_enabled,
            source: settings.publish_source.clone(),
            top3: Destination {
                channel: settings.publish_top3_channel.clone(),
                event_name: settings.publish_top3_event_name.clone(),
            },
            quotes: Destination {
                channel: settings.publish_quotes_channel.clone(),
                event_name: settings.publish_quotes_event_name.clone(),
            },
        }
    }

    /// Returns true if publishing is enabled.
    #[inline]
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Publishes the results of an invitation batch.
    pub async fn publish_top3(&self, results: &[Top3Result]) -> PublishResult {
        if !self.enabled {
            tracing::info!("publishing disabled, skipping top3 publication");
            return PublishResult::skipped("publishing disabled by configuration");
        }
        if results.is_empty() {
            tracing::info!("no processed requests, skipping top3 publication");
            return PublishResult::skipped("no requests to publish");
        }

        let payload = Top3Payload {
            generated_at: Timestamp::now(),
            solicitudes: results,
        };
        self.send("top3", self.top3.clone(), &payload).await
    }

    /// Publishes the quote summary of one request.
    ///
    /// `target` is the number of quotes the request was invited for.
    pub async fn publish_quotes(
        &self,
        request: &ServiceRequest,
        quotes: &[Quote],
        target: usize,
    ) -> PublishResult {
        if !self.enabled {
            tracing::debug!("publishing disabled, skipping quote summary");
            return PublishResult::skipped("publishing disabled by configuration");
        }
        if quotes.is_empty() {
            tracing::debug!(request_id = %request.id(), "no quotes to publish");
            return PublishResult::skipped("no quotes to publish");
        }

        let payload = QuoteSummaryPayload {
            generated_at: Timestamp::now(),
            solicitud: QuoteSummary {
                solicitud_id: request.id(),
                estado: request.status(),
                es_critica: request.is_critical(),
                prestador_asignado_id: request.assigned_provider_id(),
                objetivo_cotizaciones: target,
                total_cotizaciones: quotes.len(),
                round: request.round(),
                cotizaciones: quotes
                    .iter()
                    .map(|q| QuoteLine {
                        cotizacion_id: q.id(),
                        prestador_id: q.provider_id(),
                        monto: q.amount().get(),
                        round: q.round(),
                    })
                    .collect(),
            },
        };
        self.send("quote summary", self.quotes.clone(), &payload).await
    }

    async fn send<T: Serialize>(
        &self,
        kind: &'static str,
        destination: Destination,
        payload: &T,
    ) -> PublishResult {
        let payload: Value = match serde_json::to_value(payload) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!(kind, error = %e, "failed to serialize publication payload");
                return PublishResult::skipped(format!("unserializable payload: {e}"));
            }
        };
        let message = BrokerMessage::new(self.source.clone(), destination, payload);

        match self.matching.publish(&message).await {
            Ok(response) => {
                tracing::info!(
                    kind,
                    message_id = %message.message_id,
                    status = response.status,
                    channel = %message.destination.channel,
                    event_name = %message.destination.event_name,
                    "published to matching"
                );
                PublishResult::published(message.message_id, response.status)
            }
            Err(e) => {
                tracing::error!(
                    kind,
                    message_id = %message.message_id,
                    status = e.response_status(),
                    error = %e,
                    "matching publication failed"
                );
                PublishResult::failed(message.message_id, e.response_status(), e.detail())
            }
        }
    }
}
