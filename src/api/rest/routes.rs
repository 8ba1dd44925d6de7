//! # REST Routes
//!
//! Router construction and the common middleware stack.
//!
//! `/api/webhook` sits outside the body limit: the broker must always get a
//! 200, so its handler bounds the read itself.

use crate::api::rest::handlers::{
    AppState, cancel_request, create_requests, create_subscription, delete_subscription,
    get_webhook_event, health, invite_additional, invite_top3, list_subscriptions,
    list_webhook_events, ratings_batch, receive_quote, receive_webhook, requote_request,
    sync_provider, sync_provider_batch,
};
use axum::Router;
use axum::http::Request;
use axum::routing::{delete, get, patch, post};
use tower::ServiceBuilder;
use tower_http::LatencyUnit;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;

/// Maximum accepted request body outside `/api/webhook`.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Creates the API router. State is applied by the caller.
pub fn create_router() -> Router<AppState> {
    let trace = TraceLayer::new_for_http()
        .make_span_with(|req: &Request<_>| {
            let req_id = req
                .headers()
                .get("x-request-id")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("-");
            tracing::info_span!(
                "http_request",
                method = %req.method(),
                uri = %req.uri(),
                req_id
            )
        })
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(
            DefaultOnResponse::new()
                .level(Level::INFO)
                .latency_unit(LatencyUnit::Millis),
        );
    let req_id = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id());

    let webhook = Router::new()
        .route("/api/webhook", post(receive_webhook).get(list_webhook_events))
        .route("/api/webhook/{id}", get(get_webhook_event));

    Router::new()
        .route("/health", get(health))
        .route(
            "/api/matching/subscriptions",
            post(create_subscription).get(list_subscriptions),
        )
        .route("/api/matching/subscriptions/{id}", delete(delete_subscription))
        .route("/api/solicitudes/invitar-top3", post(invite_top3))
        .route("/api/solicitudes/crear", post(create_requests))
        .route("/api/solicitudes/{id}/cancelar", patch(cancel_request))
        .route("/api/solicitudes/{id}/recotizar", patch(requote_request))
        .route("/api/solicitudes/{id}/invitar-adicional", post(invite_additional))
        .route("/api/solicitudes/recibirCotizacion", post(receive_quote))
        .route("/api/prestadores/calificaciones", post(ratings_batch))
        .route("/api/prestadores-sync", post(sync_provider))
        .route("/api/prestadores-sync/batch", post(sync_provider_batch))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .merge(webhook)
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(trace)
        .layer(req_id)
}
