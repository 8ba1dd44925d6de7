//! # Response Envelopes
//!
//! Every successful response is wrapped in a [`ModuleResponse`] carrying
//! this module's identity plus a topic and event name describing what
//! happened. Failures use [`ErrorResponse`].

use crate::application::error::ApplicationError;
use crate::config::ModuleResponseSettings;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Success envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleResponse<T> {
    /// Our webhook URL.
    pub webhook_url: String,
    /// Our squad name.
    pub squad_name: String,
    /// Topic of the response.
    pub topic: String,
    /// Event name of the response.
    pub event_name: String,
    /// Body.
    pub message: T,
}

/// Builds [`ModuleResponse`] envelopes with the configured identity.
#[derive(Debug, Clone)]
pub struct ResponseFactory {
    webhook_url: String,
    squad_name: String,
}

impl ResponseFactory {
    /// Creates a factory from the module identity settings.
    #[must_use]
    pub fn new(settings: &ModuleResponseSettings) -> Self {
        Self {
            webhook_url: settings.webhook_url.clone(),
            squad_name: settings.squad_name.clone(),
        }
    }

    /// Wraps `message` in an envelope.
    #[must_use]
    pub fn build<T>(&self, topic: &str, event_name: &str, message: T) -> ModuleResponse<T> {
        ModuleResponse {
            webhook_url: self.webhook_url.clone(),
            squad_name: self.squad_name.clone(),
            topic: topic.to_string(),
            event_name: event_name.to_string(),
            message,
        }
    }
}

/// Error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorResponse {
    /// Machine-readable error code.
    pub error: String,
    /// Human-readable message.
    pub message: String,
    /// Unix timestamp in seconds.
    pub timestamp: i64,
}

impl ErrorResponse {
    /// Creates an error body stamped now.
    #[must_use]
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

/// Converts a numeric status, falling back to 500.
#[must_use]
pub fn status_from(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

impl IntoResponse for ApplicationError {
    fn into_response(self) -> Response {
        let status = status_from(self.status_code());
        if status.is_server_error() {
            tracing::error!(
                status = status.as_u16(),
                retryable = self.is_retryable(),
                error = %self,
                "request failed"
            );
        } else {
            tracing::warn!(status = status.as_u16(), error = %self, "request rejected");
        }
        let body = ErrorResponse::new(self.error_code(), self.to_string());
        (status, Json(body)).into_response()
    }
}
