//! # Wire Payloads
//!
//! JSON bodies exchanged with the Matching broker and the downstream
//! marketplace modules. Field names follow the remote contracts exactly,
//! which is why some are Spanish and some are all lower-case.

use crate::domain::value_objects::{CategoryId, ProviderId, QuoteId, RequestId, SkillId, Timestamp};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Body of `POST {subscribePath}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeRequest {
    /// Where the broker pushes messages.
    pub webhook_url: String,
    /// Subscribing team.
    pub squad_name: String,
    /// `team.domain.action`.
    pub topic: String,
    /// Event name within the topic.
    pub event_name: String,
}

/// One subscription as listed by the broker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubscriptionDetails {
    /// Broker-assigned id.
    pub subscription_id: Option<String>,
    /// Registered webhook URL.
    pub webhook_url: Option<String>,
    /// Subscribing team.
    pub squad_name: Option<String>,
    /// Subscribed topic.
    pub topic: Option<String>,
    /// Subscribed event name.
    pub event_name: Option<String>,
    /// Broker-side status.
    pub status: Option<String>,
    /// Creation time as reported by the broker.
    pub created_at: Option<String>,
}

impl SubscriptionDetails {
    /// Returns true if the subscription pushes to `webhook_url`.
    ///
    /// Comparison trims both sides and ignores case.
    #[must_use]
    pub fn targets_webhook(&self, webhook_url: &str) -> bool {
        self.webhook_url
            .as_deref()
            .is_some_and(|url| url.trim().eq_ignore_ascii_case(webhook_url.trim()))
    }
}

/// Body of `POST {ackPath}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AckRequest {
    /// Acknowledged message id.
    pub msg_id: String,
    /// Subscription the message arrived through.
    pub subscription_id: String,
}

/// Routing part of a published message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Destination {
    /// Broker channel.
    pub channel: String,
    /// Event name.
    pub event_name: String,
}

/// Message published through `POST {publishPath}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrokerMessage {
    /// Fresh v4 id.
    pub message_id: Uuid,
    /// Publication time.
    pub timestamp: Timestamp,
    /// Publishing module.
    pub source: String,
    /// Channel and event name.
    pub destination: Destination,
    /// Event body.
    pub payload: Value,
}

impl BrokerMessage {
    /// Creates a message with a fresh id stamped now.
    #[must_use]
    pub fn new(source: impl Into<String>, destination: Destination, payload: Value) -> Self {
        Self {
            message_id: Uuid::new_v4(),
            timestamp: Timestamp::now(),
            source: source.into(),
            destination,
            payload,
        }
    }
}

/// Invitation to quote, sent to a provider and returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvitationRecord {
    /// Request the provider is invited to.
    #[serde(rename = "solicitudId")]
    pub request_id: RequestId,
    /// Resolved category of the request.
    #[serde(rename = "rubroId")]
    pub category_id: Option<CategoryId>,
    /// Skill asked for by the request.
    #[serde(rename = "habilidadId")]
    pub skill_id: Option<SkillId>,
    /// Invited provider.
    #[serde(rename = "prestadorId")]
    pub provider_id: ProviderId,
    /// Quote already linked to the invitation, if any.
    #[serde(rename = "cotizacionId")]
    pub quote_id: Option<QuoteId>,
    /// Provider first and last name.
    #[serde(rename = "prestadorNombre")]
    pub provider_name: String,
    /// Text shown to the provider.
    #[serde(rename = "mensaje")]
    pub message: String,
    /// Whether the invitation call succeeded.
    #[serde(rename = "enviado")]
    pub sent: bool,
    /// When the invitation was issued.
    pub timestamp: Timestamp,
}

/// Body sent to the core quotes endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreQuote {
    /// Quoted request.
    #[serde(rename = "idsolicitud")]
    pub request_id: RequestId,
    /// Quoting provider.
    #[serde(rename = "idprestador")]
    pub provider_id: ProviderId,
    /// Quoted amount.
    #[serde(rename = "monto")]
    pub amount: Decimal,
}

/// One quote inside [`RequestQuotes`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestQuoteItem {
    /// Quoting provider.
    #[serde(rename = "idprestador")]
    pub provider_id: ProviderId,
    /// Quoted amount.
    #[serde(rename = "monto")]
    pub amount: Decimal,
}

/// All quotes of a request, sent to the requests module and the indexer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestQuotes {
    /// Quoted request.
    #[serde(rename = "idsolicitud")]
    pub request_id: RequestId,
    /// Every quote of the request.
    #[serde(rename = "cotizaciones")]
    pub quotes: Vec<RequestQuoteItem>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn subscribe_request_uses_camel_case() {
        let body = SubscribeRequest {
            webhook_url: "https://hook".to_string(),
            squad_name: "matching".to_string(),
            topic: "a.b.c".to_string(),
            event_name: "c".to_string(),
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(
            value,
            json!({"webhookUrl": "https://hook", "squadName": "matching", "topic": "a.b.c", "eventName": "c"})
        );
    }

    #[test]
    fn subscription_details_tolerate_missing_fields() {
        let details: SubscriptionDetails =
            serde_json::from_value(json!({"topic": "a.b.c", "webhookUrl": " HTTPS://Hook "}))
                .unwrap();
        assert!(details.subscription_id.is_none());
        assert!(details.targets_webhook("https://hook"));
        assert!(!details.targets_webhook("https://other"));
    }

    #[test]
    fn core_quote_wire_names() {
        let quote = CoreQuote {
            request_id: RequestId::new(10),
            provider_id: ProviderId::new(1),
            amount: Decimal::new(150_000, 2),
        };
        let value = serde_json::to_value(&quote).unwrap();
        assert_eq!(value["idsolicitud"], 10);
        assert_eq!(value["idprestador"], 1);
        assert_eq!(value["monto"], "1500.00");
    }

    #[test]
    fn ack_request_wire_names() {
        let ack = AckRequest {
            msg_id: "m-1".to_string(),
            subscription_id: "s-1".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&ack).unwrap(),
            json!({"msgId": "m-1", "subscriptionId": "s-1"})
        );
    }
}
