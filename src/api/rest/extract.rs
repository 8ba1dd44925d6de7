//! # Extractors
//!
//! [`ApiJson`] is `axum::Json` with rejections rendered as [`ErrorResponse`]
//! bodies, so malformed input gets the same envelope as service errors.

use crate::api::rest::response::ErrorResponse;
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::de::DeserializeOwned;

/// JSON body extractor.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = JsonBodyError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

/// A request body that could not be read as JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonBodyError {
    status: StatusCode,
    message: String,
}

impl JsonBodyError {
    /// Status the rejection is answered with.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    fn error_code(&self) -> &'static str {
        match self.status {
            StatusCode::PAYLOAD_TOO_LARGE => "PAYLOAD_TOO_LARGE",
            StatusCode::UNSUPPORTED_MEDIA_TYPE => "UNSUPPORTED_MEDIA_TYPE",
            _ => "VALIDATION_ERROR",
        }
    }
}

impl From<JsonRejection> for JsonBodyError {
    fn from(rejection: JsonRejection) -> Self {
        Self {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for JsonBodyError {
    fn into_response(self) -> Response {
        tracing::warn!(status = self.status.as_u16(), error = %self.message, "body rejected");
        let body = ErrorResponse::new(self.error_code(), self.message);
        (self.status, Json(body)).into_response()
    }
}
