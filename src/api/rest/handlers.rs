//! # REST Handlers
//!
//! Thin adapters from HTTP to the application services. Handlers parse the
//! request, call one service and wrap the result in a [`ModuleResponse`].
//! Errors are [`ApplicationError`]s and render through its `IntoResponse`;
//! bodies are read with [`ApiJson`] so malformed JSON gets the same shape.

use crate::api::rest::extract::ApiJson;
use crate::api::rest::response::{ModuleResponse, ResponseFactory, status_from};
use crate::application::error::ApplicationError;
use crate::application::services::webhook_intake::DEFAULT_RECENT_LIMIT;
use crate::application::services::{
    InvitationWorkflow, ProviderSyncRequest, ProviderSyncService, QuoteSubmission,
    QuoteSubmissionService, RatingBatchItem, RatingBatchService, RequestCreatedEvent,
    SubscriptionCommand, SubscriptionListing, SubscriptionResult, SubscriptionService,
    Top3Result, WebhookIntake,
};
use crate::domain::entities::{ServiceRequest, WebhookEvent};
use crate::domain::value_objects::{ProviderId, RequestId};
use crate::infrastructure::integrations::payloads::InvitationRecord;
use axum::Json;
use axum::body::{Body, Bytes, to_bytes};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

/// Largest webhook body read. Anything longer is stored as an empty body.
pub const WEBHOOK_MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

/// Upper bound for `GET /api/webhook?limit=`.
pub const MAX_EVENT_LIST_LIMIT: usize = 500;

/// Application state shared across handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Envelope builder.
    pub responses: ResponseFactory,
    /// Invitation workflow.
    pub workflow: Arc<InvitationWorkflow>,
    /// Quote submission.
    pub quotes: Arc<QuoteSubmissionService>,
    /// Rating batches.
    pub ratings: Arc<RatingBatchService>,
    /// Provider sync.
    pub provider_sync: Arc<ProviderSyncService>,
    /// Manual subscriptions.
    pub subscriptions: Arc<SubscriptionService>,
    /// Webhook intake.
    pub webhooks: Arc<WebhookIntake>,
}

type Envelope<T> = Json<ModuleResponse<T>>;
type HandlerResult<T> = Result<Envelope<T>, ApplicationError>;

/// Body of `PATCH /api/solicitudes/{id}/cancelar`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelResponse {
    /// Cancelled request.
    pub solicitud_id: RequestId,
    /// Always `cancelled`.
    pub status: &'static str,
}

/// Body of `POST /api/solicitudes/recibirCotizacion`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuoteReceivedResponse {
    /// Quoted request.
    #[serde(rename = "solicitudID")]
    pub request_id: RequestId,
    /// Quoting provider.
    #[serde(rename = "prestadorID")]
    pub provider_id: ProviderId,
    /// Stored amount.
    pub monto: Decimal,
    /// False when an existing quote was updated.
    pub creada: bool,
}

/// Body of `DELETE /api/matching/subscriptions/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionRemoved {
    /// Broker outcome.
    #[serde(flatten)]
    pub result: SubscriptionResult,
    /// Id as given in the path.
    pub subscription_id: String,
}

/// Query of `GET /api/webhook`.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct EventListParams {
    /// Maximum events returned.
    pub limit: Option<usize>,
}

/// GET /health
pub async fn health() -> &'static str {
    "OK"
}

/// POST /api/solicitudes/invitar-top3
pub async fn invite_top3(State(state): State<AppState>) -> HandlerResult<Vec<Top3Result>> {
    let results = state.workflow.invite_top3_for_created().await?;
    tracing::info!(requests = results.len(), "top-3 invitation run finished");
    Ok(Json(state.responses.build(
        "solicitudes",
        "solicitudesTop3Invitadas",
        results,
    )))
}

/// POST /api/solicitudes/crear
pub async fn create_requests(
    State(state): State<AppState>,
    ApiJson(events): ApiJson<Vec<RequestCreatedEvent>>,
) -> HandlerResult<Vec<ServiceRequest>> {
    let stored = state.workflow.create_from_events(events).await?;
    Ok(Json(state.responses.build("solicitudes", "solicitudesCreadas", stored)))
}

/// PATCH /api/solicitudes/{id}/cancelar
pub async fn cancel_request(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HandlerResult<CancelResponse> {
    let request_id = RequestId::new(id);
    state.workflow.cancel(request_id).await?;
    Ok(Json(state.responses.build(
        "solicitudes",
        "solicitudCancelada",
        CancelResponse {
            solicitud_id: request_id,
            status: "cancelled",
        },
    )))
}

/// POST /api/solicitudes/{id}/invitar-adicional
pub async fn invite_additional(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HandlerResult<Option<InvitationRecord>> {
    let invitation = state.workflow.invite_additional(RequestId::new(id)).await?;
    Ok(Json(state.responses.build(
        "solicitudes",
        "invitacionAdicional",
        invitation,
    )))
}

/// PATCH /api/solicitudes/{id}/recotizar
pub async fn requote_request(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HandlerResult<Top3Result> {
    let result = state.workflow.requote(RequestId::new(id)).await?;
    Ok(Json(state.responses.build(
        "solicitudes",
        "solicitudRecotizada",
        result,
    )))
}

/// POST /api/solicitudes/recibirCotizacion
pub async fn receive_quote(
    State(state): State<AppState>,
    ApiJson(submission): ApiJson<QuoteSubmission>,
) -> Result<(StatusCode, Envelope<QuoteReceivedResponse>), ApplicationError> {
    let receipt = state.quotes.submit(&submission).await?;
    let body = QuoteReceivedResponse {
        request_id: receipt.quote.request_id(),
        provider_id: receipt.quote.provider_id(),
        monto: receipt.quote.amount().get(),
        creada: receipt.outcome.is_created(),
    };
    Ok((
        StatusCode::CREATED,
        Json(state.responses.build("cotizaciones", "cotizacionRecibida", body)),
    ))
}

/// POST /api/prestadores/calificaciones
pub async fn ratings_batch(
    State(state): State<AppState>,
    ApiJson(items): ApiJson<Vec<RatingBatchItem>>,
) -> Envelope<&'static str> {
    state.ratings.append_batch(&items).await;
    Json(state.responses.build(
        "calificaciones",
        "calificacionesBatchProcesadas",
        "ok",
    ))
}

/// POST /api/prestadores-sync
pub async fn sync_provider(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ProviderSyncRequest>,
) -> HandlerResult<&'static str> {
    state.provider_sync.upsert(&request).await?;
    Ok(Json(state.responses.build("prestadores", "prestadorActualizado", "ok")))
}

/// POST /api/prestadores-sync/batch
pub async fn sync_provider_batch(
    State(state): State<AppState>,
    ApiJson(requests): ApiJson<Vec<ProviderSyncRequest>>,
) -> Envelope<&'static str> {
    state.provider_sync.upsert_batch(&requests).await;
    Json(state.responses.build(
        "prestadores",
        "prestadoresBatchProcesados",
        "ok",
    ))
}

/// POST /api/matching/subscriptions
pub async fn create_subscription(
    State(state): State<AppState>,
    ApiJson(command): ApiJson<SubscriptionCommand>,
) -> Result<(StatusCode, Envelope<SubscriptionResult>), ApplicationError> {
    let result = state.subscriptions.create(&command).await?;
    Ok((
        status_from(result.status),
        Json(state.responses.build("matching", "subscriptionAttempt", result)),
    ))
}

/// GET /api/matching/subscriptions
pub async fn list_subscriptions(
    State(state): State<AppState>,
) -> (StatusCode, Envelope<SubscriptionListing>) {
    let listing = state.subscriptions.list().await;
    (
        status_from(listing.status),
        Json(state.responses.build("matching", "subscriptionsListed", listing)),
    )
}

/// DELETE /api/matching/subscriptions/{id}
pub async fn delete_subscription(
    State(state): State<AppState>,
    Path(subscription_id): Path<String>,
) -> Result<(StatusCode, Envelope<SubscriptionRemoved>), ApplicationError> {
    let result = state.subscriptions.delete(&subscription_id).await?;
    let status = status_from(result.status);
    Ok((
        status,
        Json(state.responses.build(
            "matching",
            "subscriptionRemoved",
            SubscriptionRemoved {
                result,
                subscription_id,
            },
        )),
    ))
}

/// POST /api/webhook
///
/// Always answers 200, even for bodies it cannot read.
pub async fn receive_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Body,
) -> Envelope<Map<String, Value>> {
    let body = match to_bytes(body, WEBHOOK_MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(error = %e, limit = WEBHOOK_MAX_BODY_BYTES, "webhook body unreadable");
            Bytes::new()
        }
    };
    let headers: BTreeMap<String, String> = headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();
    let receipt = state.webhooks.receive(&body, headers).await;
    Json(state.responses.build("webhooks", "messageReceived", receipt.payload))
}

/// GET /api/webhook
pub async fn list_webhook_events(
    State(state): State<AppState>,
    Query(params): Query<EventListParams>,
) -> HandlerResult<Vec<WebhookEvent>> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_RECENT_LIMIT)
        .min(MAX_EVENT_LIST_LIMIT);
    let events = state.webhooks.recent(limit).await?;
    Ok(Json(state.responses.build("webhooks", "storedEventsListed", events)))
}

/// GET /api/webhook/{id}
pub async fn get_webhook_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> HandlerResult<WebhookEvent> {
    let event = state.webhooks.get(id).await?;
    Ok(Json(state.responses.build("webhooks", "storedEventDetail", event)))
}
