//! # Webhook Intake
//!
//! Receives messages pushed by the Matching broker, acknowledges them and
//! routes the ones this module understands.
//!
//! Intake never fails towards the broker. Whatever happens (malformed body,
//! failed ack, failed dispatch, failed log write) the caller answers 200 so
//! the broker does not start retrying aggressively; the details end up in
//! the logs and in the stored [`WebhookEvent`].
//!
//! # Identifiers
//!
//! | field           | body                     | header fallback                             |
//! |-----------------|--------------------------|---------------------------------------------|
//! | message id      | `msgId`, `messageId`     | `x-message-id`, `x_msg_id`, `message-id`    |
//! | subscription id | `subscriptionId`         | `x-subscription-id`, `subscription-id`      |
//!
//! The ack is sent only when both are known.
//!
//! # Routing
//!
//! Events carrying a `payload` (or `cuerpo`) object are routed by event
//! name, and for most domains by the topic domain too. The domain is the
//! middle segment of a three-part topic (`catalogue.rubro.alta` gives
//! `rubro`) or the whole topic when it has one segment.
//!
//! | domain               | events                                  | handler                     |
//! |----------------------|-----------------------------------------|-----------------------------|
//! | any                  | `creada`, `cancelada` and variants      | [`InvitationWorkflow`]      |
//! | `pedido`, `pedidos`  | `cotizacion_enviada`                    | [`QuoteSubmissionService`]  |
//! | `user`, `users`      | `created`, `updated`, `deactivated`     | [`ProviderSyncService`]     |
//! | `rubro`, `habilidad`, `zona` | `alta`, `modificacion`          | [`CatalogSyncService`]      |

use crate::application::error::{ApplicationError, ApplicationResult};
use crate::application::services::catalog_sync::{
    CatalogSyncService, NamedEntry, SkillEntry, SyncMode,
};
use crate::application::services::invitation_workflow::{InvitationWorkflow, RequestCreatedEvent};
use crate::application::services::provider_sync::{ProviderSyncService, UserProfile};
use crate::application::services::quote_submission::{QuoteSubmission, QuoteSubmissionService};
use crate::domain::entities::{AckRecord, WebhookEvent};
use crate::domain::value_objects::{ProviderId, RequestId};
use crate::infrastructure::integrations::payloads::AckRequest;
use crate::infrastructure::integrations::traits::MatchingApi;
use crate::infrastructure::persistence::WebhookEventRepository;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Events listed by default.
pub const DEFAULT_RECENT_LIMIT: usize = 100;

const MESSAGE_ID_HEADERS: [&str; 3] = ["x-message-id", "x_msg_id", "message-id"];
const SUBSCRIPTION_ID_HEADERS: [&str; 2] = ["x-subscription-id", "subscription-id"];
const CREATED_EVENTS: [&str; 2] = ["creada", "solicitud.creada"];
const CANCELLED_EVENTS: [&str; 4] = [
    "cancelada",
    "solicitud.cancelada",
    "solicitud_cancelada",
    "cancelada_solicitud",
];

/// Where a routed event goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    RequestCreated,
    RequestCancelled,
    QuoteSent,
    UserUpserted,
    UserDeactivated,
    Category(SyncMode),
    Skill(SyncMode),
    Zone(SyncMode),
}

/// A quote sent through the orders channel.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct QuoteSentEvent {
    id: Option<i64>,
    id_pedido: Option<RequestId>,
    id_prestador: Option<ProviderId>,
    tarifa: Option<Decimal>,
}

/// Services that routed events are handed to.
#[derive(Debug, Clone)]
pub struct EventHandlers {
    /// Request creation and cancellation.
    pub workflow: InvitationWorkflow,
    /// Quotes sent through the orders channel.
    pub quotes: QuoteSubmissionService,
    /// User events for providers.
    pub providers: ProviderSyncService,
    /// Category, skill and zone events.
    pub catalog: CatalogSyncService,
}

/// What the webhook endpoint answers.
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookReceipt {
    /// Id of the stored event.
    pub event_id: Uuid,
    /// Ack outcome, when one was attempted.
    pub ack: Option<AckRecord>,
    /// Received payload plus `storedEventId` and the ack fields.
    pub payload: Map<String, Value>,
}

/// Webhook intake service.
#[derive(Debug, Clone)]
pub struct WebhookIntake {
    matching: Arc<dyn MatchingApi>,
    events: Arc<dyn WebhookEventRepository>,
    handlers: EventHandlers,
}

impl WebhookIntake {
    /// Creates the service.
    #[must_use]
    pub fn new(
        matching: Arc<dyn MatchingApi>,
        events: Arc<dyn WebhookEventRepository>,
        handlers: EventHandlers,
    ) -> Self {
        Self {
            matching,
            events,
            handlers,
        }
    }

    /// Handles one pushed message.
    pub async fn receive(&self, raw_body: &[u8], headers: BTreeMap<String, String>) -> WebhookReceipt {
        let raw = String::from_utf8_lossy(raw_body).into_owned();
        let payload = parse_payload(&raw);
        let headers: BTreeMap<String, String> = headers
            .into_iter()
            .map(|(k, v)| (k.to_ascii_lowercase(), v))
            .collect();

        let message_id = string_field(&payload, "msgId")
            .or_else(|| string_field(&payload, "messageId"))
            .or_else(|| header(&headers, &MESSAGE_ID_HEADERS));
        let subscription_id = string_field(&payload, "subscriptionId")
            .or_else(|| header(&headers, &SUBSCRIPTION_ID_HEADERS));
        let topic = string_field(&payload, "topic")
            .or_else(|| string_field(&payload, "topico"))
            .or_else(|| nested_string(&payload, "destination", "topic"))
            .or_else(|| nested_string(&payload, "destination", "channel"));
        let event_name = string_field(&payload, "eventName")
            .or_else(|| string_field(&payload, "evento"))
            .or_else(|| nested_string(&payload, "destination", "eventName"));

        tracing::info!(
            topic = ?topic,
            event_name = ?event_name,
            message_id = ?message_id,
            subscription_id = ?subscription_id,
            bytes = raw_body.len(),
            "webhook received"
        );

        let ack = match (&message_id, &subscription_id) {
            (Some(msg_id), Some(sub_id)) => Some(self.acknowledge(msg_id, sub_id).await),
            _ => {
                tracing::info!(
                    message_id = ?message_id,
                    subscription_id = ?subscription_id,
                    "ack skipped, message or subscription id missing"
                );
                None
            }
        };

        let dispatch = self
            .dispatch(topic.as_deref(), event_name.as_deref(), &payload)
            .await;

        let mut event = WebhookEvent::received(raw, Value::Object(payload.clone()));
        event.topic = topic;
        event.event_name = event_name;
        event.message_id = message_id;
        event.subscription_id = subscription_id;
        event.headers = headers;
        event.ack = ack.clone();
        event.dispatch = dispatch;
        if let Err(e) = self.events.append(&event).await {
            tracing::error!(event_id = %event.id, error = %e, "failed to store webhook event");
        }

        let mut response = payload;
        response.insert("storedEventId".to_string(), json!(event.id));
        if let Some(ack) = &ack {
            response.insert("ackStatus".to_string(), json!(ack.status));
            response.insert("ackSuccess".to_string(), json!(ack.success));
            if let Some(error) = ack.error.as_ref().filter(|_| !ack.success) {
                response.insert("ackError".to_string(), json!(error));
            }
        }

        WebhookReceipt {
            event_id: event.id,
            ack,
            payload: response,
        }
    }

    /// Most recent stored events, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the event log cannot be read.
    pub async fn recent(&self, limit: usize) -> ApplicationResult<Vec<WebhookEvent>> {
        Ok(self.events.recent(limit).await?)
    }

    /// One stored event.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id.
    pub async fn get(&self, id: Uuid) -> ApplicationResult<WebhookEvent> {
        self.events
            .get(id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("WebhookEvent", id))
    }

    async fn acknowledge(&self, msg_id: &str, subscription_id: &str) -> AckRecord {
        let ack = AckRequest {
            msg_id: msg_id.to_string(),
            subscription_id: subscription_id.to_string(),
        };
        match self.matching.acknowledge(&ack).await {
            Ok(response) => {
                tracing::info!(msg_id, subscription_id, status = response.status, "ack sent");
                AckRecord {
                    status: response.status,
                    success: true,
                    error: None,
                }
            }
            Err(e) => {
                tracing::error!(msg_id, subscription_id, error = %e, "ack failed");
                AckRecord {
                    status: e.response_status(),
                    success: false,
                    error: Some(e.detail().to_string()),
                }
            }
        }
    }

    async fn dispatch(
        &self,
        topic: Option<&str>,
        event_name: Option<&str>,
        payload: &Map<String, Value>,
    ) -> Option<Value> {
        let route = route(topic, event_name?)?;
        let section = payload
            .get("payload")
            .or_else(|| payload.get("cuerpo"))
            .and_then(Value::as_object)?;
        tracing::debug!(?route, "dispatching webhook event");

        let outcome = match route {
            Route::RequestCreated => self.dispatch_created(section).await,
            Route::RequestCancelled => self.dispatch_cancelled(section).await,
            Route::QuoteSent => self.dispatch_quote(section).await,
            Route::UserUpserted => self.dispatch_user(section).await,
            Route::UserDeactivated => self.dispatch_deactivation(section).await,
            Route::Category(mode) => {
                let action = catalog_action("rubro", mode);
                match mapped::<NamedEntry>(section, action) {
                    Ok(entry) => match self.handlers.catalog.sync_category(&entry, mode).await {
                        Ok(category) => json!({"action": action, "rubroId": category.id}),
                        Err(e) => failure(action, &e),
                    },
                    Err(value) => value,
                }
            }
            Route::Skill(mode) => {
                let action = catalog_action("habilidad", mode);
                match mapped::<SkillEntry>(section, action) {
                    Ok(entry) => match self.handlers.catalog.sync_skill(&entry, mode).await {
                        Ok(skill) => json!({"action": action, "habilidadId": skill.id}),
                        Err(e) => failure(action, &e),
                    },
                    Err(value) => value,
                }
            }
            Route::Zone(mode) => {
                let action = catalog_action("zona", mode);
                match mapped::<NamedEntry>(section, action) {
                    Ok(entry) => match self.handlers.catalog.sync_zone(&entry, mode).await {
                        Ok(zone) => json!({"action": action, "zonaId": zone.id}),
                        Err(e) => failure(action, &e),
                    },
                    Err(value) => value,
                }
            }
        };
        Some(outcome)
    }

    async fn dispatch_quote(&self, section: &Map<String, Value>) -> Value {
        const ACTION: &str = "cotizacionRecibida";
        let event = match mapped::<QuoteSentEvent>(section, ACTION) {
            Ok(event) => event,
            Err(value) => return value,
        };
        let (Some(request_id), Some(provider_id), Some(amount)) =
            (event.id_pedido, event.id_prestador, event.tarifa)
        else {
            tracing::warn!(external_id = ?event.id, "quote event without id_pedido, id_prestador or tarifa");
            return failure(ACTION, &"id_pedido, id_prestador and tarifa are required");
        };

        let submission = QuoteSubmission {
            request_id,
            provider_id,
            amount,
        };
        match self.handlers.quotes.submit(&submission).await {
            Ok(receipt) => json!({
                "action": ACTION,
                "cotizacionIdExterna": event.id,
                "solicitudId": request_id,
                "prestadorId": provider_id,
                "creada": receipt.outcome.is_created(),
            }),
            Err(e) => {
                tracing::warn!(request_id = %request_id, provider_id = %provider_id, error = %e, "quote from webhook rejected");
                failure(ACTION, &e)
            }
        }
    }

    async fn dispatch_user(&self, section: &Map<String, Value>) -> Value {
        const ACTION: &str = "prestadorUpsert";
        let profile = match mapped::<UserProfile>(section, ACTION) {
            Ok(profile) => profile,
            Err(value) => return value,
        };
        if !profile.is_provider() {
            tracing::info!(role = ?profile.role, "user event ignored for role");
            return json!({"action": ACTION, "ignored": true});
        }
        match self.handlers.providers.upsert_profile(&profile).await {
            Ok(provider) => json!({"action": ACTION, "prestadorId": provider.id()}),
            Err(e) => {
                tracing::warn!(error = %e, "provider upsert from user event failed");
                failure(ACTION, &e)
            }
        }
    }

    async fn dispatch_deactivation(&self, section: &Map<String, Value>) -> Value {
        const ACTION: &str = "prestadorDesactivado";
        let Some(id) = integer_field(section, "userId").or_else(|| integer_field(section, "id")) else {
            tracing::warn!("user deactivation without userId or id");
            return failure(ACTION, &"userId missing");
        };
        let provider_id = ProviderId::new(id);
        match self.handlers.providers.deactivate(provider_id).await {
            Ok(changed) => json!({"action": ACTION, "prestadorId": provider_id, "changed": changed}),
            Err(e) => {
                tracing::error!(provider_id = %provider_id, error = %e, "provider deactivation failed");
                failure(ACTION, &e)
            }
        }
    }

    async fn dispatch_created(&self, section: &Map<String, Value>) -> Value {
        let event: RequestCreatedEvent = match serde_json::from_value(Value::Object(section.clone())) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(error = %e, "request created event could not be mapped");
                return json!({"action": "solicitudCreada", "error": e.to_string()});
            }
        };
        let request_id = event.solicitud_id;
        match self.handlers.workflow.create_from_events(vec![event]).await {
            Ok(stored) => json!({
                "action": "solicitudCreada",
                "solicitudId": request_id,
                "estado": stored.first().map(|r| r.status()),
            }),
            Err(e) => {
                tracing::error!(request_id = %request_id, error = %e, "request creation from webhook failed");
                json!({"action": "solicitudCreada", "solicitudId": request_id, "error": e.to_string()})
            }
        }
    }

    async fn dispatch_cancelled(&self, section: &Map<String, Value>) -> Value {
        let Some(id) = integer_field(section, "solicitud_id") else {
            tracing::warn!("cancellation event without solicitud_id");
            return json!({"action": "solicitudCancelada", "error": "solicitud_id missing"});
        };
        let request_id = RequestId::new(id);
        match self.handlers.workflow.cancel(request_id).await {
            Ok(changed) => json!({
                "action": "solicitudCancelada",
                "solicitudId": request_id,
                "changed": changed,
            }),
            Err(e) => {
                tracing::warn!(request_id = %request_id, error = %e, "cancellation from webhook failed");
                json!({"action": "solicitudCancelada", "solicitudId": request_id, "error": e.to_string()})
            }
        }
    }
}

fn route(topic: Option<&str>, event_name: &str) -> Option<Route> {
    let name = event_name.trim().to_lowercase();
    if CREATED_EVENTS.contains(&name.as_str()) {
        return Some(Route::RequestCreated);
    }
    if CANCELLED_EVENTS.contains(&name.as_str()) {
        return Some(Route::RequestCancelled);
    }

    let domain = topic_domain(topic?)?;
    let is = |candidates: &[&str]| event_matches(&name, &domain, candidates);
    match domain.as_str() {
        "pedido" | "pedidos" if is(&["cotizacion_enviada"]) => Some(Route::QuoteSent),
        "user" | "users" if is(&["deactivated"]) => Some(Route::UserDeactivated),
        "user" | "users" if is(&["created", "updated"]) => Some(Route::UserUpserted),
        "rubro" | "habilidad" | "zona" => {
            let mode = if is(&["modificacion"]) {
                SyncMode::Modify
            } else if is(&["alta"]) {
                SyncMode::Upsert
            } else {
                return None;
            };
            Some(match domain.as_str() {
                "rubro" => Route::Category(mode),
                "habilidad" => Route::Skill(mode),
                _ => Route::Zone(mode),
            })
        }
        _ => None,
    }
}

fn topic_domain(topic: &str) -> Option<String> {
    let parts: Vec<&str> = topic.trim().split('.').filter(|p| !p.is_empty()).collect();
    let domain = match parts.as_slice() {
        [] => return None,
        [only] => only,
        [.., middle, _] if parts.len() >= 3 => middle,
        [.., last] => last,
    };
    Some(domain.to_lowercase())
}

fn event_matches(name: &str, domain: &str, candidates: &[&str]) -> bool {
    let tail = name.rsplit(['/', '.']).next().unwrap_or(name);
    let head = tail.split('_').next().unwrap_or(tail);
    candidates.iter().any(|candidate| {
        name == *candidate
            || head == *candidate
            || name == format!("{candidate}_{domain}")
            || name == format!("{domain}.{candidate}")
            || name == format!("{domain}_{candidate}")
            || name.split(['_', '.']).any(|part| part == *candidate)
    })
}

fn catalog_action(kind: &str, mode: SyncMode) -> &'static str {
    match (kind, mode) {
        ("rubro", SyncMode::Upsert) => "rubroAlta",
        ("rubro", SyncMode::Modify) => "rubroModificacion",
        ("habilidad", SyncMode::Upsert) => "habilidadAlta",
        ("habilidad", SyncMode::Modify) => "habilidadModificacion",
        (_, SyncMode::Upsert) => "zonaAlta",
        (_, SyncMode::Modify) => "zonaModificacion",
    }
}

fn mapped<T: DeserializeOwned>(section: &Map<String, Value>, action: &str) -> Result<T, Value> {
    serde_json::from_value(Value::Object(section.clone())).map_err(|e| {
        tracing::warn!(action, error = %e, "webhook payload could not be mapped");
        failure(action, &e)
    })
}

fn failure(action: &str, error: &dyn fmt::Display) -> Value {
    json!({"action": action, "error": error.to_string()})
}

fn looks_like_json(raw: &str) -> bool {
    let trimmed = raw.trim();
    (trimmed.starts_with('{') && trimmed.ends_with('}'))
        || (trimmed.starts_with('[') && trimmed.ends_with(']'))
}

fn parse_payload(raw: &str) -> Map<String, Value> {
    if !looks_like_json(raw) {
        return Map::new();
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => map,
        Ok(_) => Map::new(),
        Err(e) => {
            tracing::warn!(error = %e, "webhook body looked like JSON but did not parse");
            Map::new()
        }
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn string_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key).and_then(scalar_text)
}

fn nested_string(map: &Map<String, Value>, key: &str, nested: &str) -> Option<String> {
    map.get(key)
        .and_then(Value::as_object)
        .and_then(|inner| string_field(inner, nested))
}

fn integer_field(map: &Map<String, Value>, key: &str) -> Option<i64> {
    match map.get(key)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn header(headers: &BTreeMap<String, String>, names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| headers.get(*name))
        .map(|v| v.trim())
        .find(|v| !v.is_empty())
        .map(str::to_string)
}
