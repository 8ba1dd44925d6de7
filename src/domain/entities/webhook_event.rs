//! # Webhook Event
//!
//! Write-once log entry for every message pushed by the Matching broker.
//!
//! The event is assembled completely (ack outcome and dispatch outcome
//! included) before it is appended; stored events are never mutated.

use crate::domain::value_objects::timestamp::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Outcome of an acknowledgement call sent back to the broker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AckRecord {
    /// HTTP status returned by the broker (502 on connectivity failure).
    pub status: u16,
    /// Whether the broker accepted the ack.
    pub success: bool,
    /// Error body or message, on failure.
    pub error: Option<String>,
}

/// An inbound webhook message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookEvent {
    /// Local event id.
    pub id: Uuid,
    /// Topic carried by the message.
    pub topic: Option<String>,
    /// Event name carried by the message.
    pub event_name: Option<String>,
    /// Broker message id.
    pub message_id: Option<String>,
    /// Broker subscription id.
    pub subscription_id: Option<String>,
    /// Body exactly as received.
    pub raw_body: String,
    /// Parsed JSON object (empty object when the body was not JSON).
    pub payload: Value,
    /// Request headers, lower-cased names.
    pub headers: BTreeMap<String, String>,
    /// Ack outcome, when an ack was attempted.
    pub ack: Option<AckRecord>,
    /// Result of routing the event to a local handler, if any.
    pub dispatch: Option<Value>,
    /// When the message arrived.
    pub received_at: Timestamp,
}

impl WebhookEvent {
    /// Creates an event for a freshly received body.
    #[must_use]
    pub fn received(raw_body: impl Into<String>, payload: Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            topic: None,
            event_name: None,
            message_id: None,
            subscription_id: None,
            raw_body: raw_body.into(),
            payload,
            headers: BTreeMap::new(),
            ack: None,
            dispatch: None,
            received_at: Timestamp::now(),
        }
    }

    /// Returns true if the broker acknowledged the message.
    #[must_use]
    pub fn was_acknowledged(&self) -> bool {
        self.ack.as_ref().is_some_and(|a| a.success)
    }
}
