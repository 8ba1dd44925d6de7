//! # REST API
//!
//! REST endpoints using axum.
//!
//! # Endpoints
//!
//! ## Requests
//! - `POST /api/solicitudes/invitar-top3` - Invite the Top-N for every `CREADA` request
//! - `POST /api/solicitudes/crear` - Create requests from upstream events
//! - `PATCH /api/solicitudes/{id}/cancelar` - Cancel a request
//! - `PATCH /api/solicitudes/{id}/recotizar` - Reopen a cancelled request for a new round
//! - `POST /api/solicitudes/{id}/invitar-adicional` - Invite one more provider
//! - `POST /api/solicitudes/recibirCotizacion` - Submit a quote
//!
//! ## Providers
//! - `POST /api/prestadores/calificaciones` - Rating batch
//! - `POST /api/prestadores-sync` - Sync one provider
//! - `POST /api/prestadores-sync/batch` - Sync a batch of providers
//!
//! ## Matching broker
//! - `POST /api/matching/subscriptions` - Subscribe
//! - `GET /api/matching/subscriptions` - List subscriptions
//! - `DELETE /api/matching/subscriptions/{id}` - Unsubscribe
//! - `POST /api/webhook` - Receive a pushed message (always 200)
//! - `GET /api/webhook` - Recent stored messages
//! - `GET /api/webhook/{id}` - One stored message
//!
//! ## Health
//! - `GET /health`
//!
//! # Usage
//!
//! ```ignore
//! use matching_service::api::rest::create_router;
//!
//! let app = create_router().with_state(state);
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, app).await?;
//! ```

pub mod extract;
pub mod handlers;
pub mod response;
pub mod routes;

pub use extract::{ApiJson, JsonBodyError};
pub use handlers::{AppState, CancelResponse, EventListParams, QuoteReceivedResponse};
pub use response::{ErrorResponse, ModuleResponse, ResponseFactory};
pub use routes::create_router;
