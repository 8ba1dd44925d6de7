//! # HTTP Client Utilities
//!
//! Shared HTTP client used by the Matching broker client and the
//! downstream module clients.
//!
//! This module provides a reusable HTTP client wrapper with:
//! - Configurable timeouts
//! - Optional default headers (API key)
//! - JSON request bodies
//! - Status-to-error mapping that keeps the remote body
//!
//! # Examples
//!
//! ```ignore
//! use matching_service::infrastructure::integrations::http_client::HttpClient;
//!
//! let client = HttpClient::new(5000)?;
//! let response = client.post("https://broker.example.com/publish", &body).await?;
//! assert!(response.is_success());
//! ```

use crate::infrastructure::integrations::error::{IntegrationError, IntegrationResult};
use reqwest::header::HeaderMap;
use reqwest::{Client, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// A successful (2xx) remote answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body.
    pub body: String,
}

/// HTTP client wrapper for outbound integrations.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    timeout_ms: u64,
}

impl HttpClient {
    /// Creates a new HTTP client with the specified timeout.
    ///
    /// # Errors
    ///
    /// Returns `IntegrationError::Configuration` if the client cannot be created.
    pub fn new(timeout_ms: u64) -> IntegrationResult<Self> {
        Self::with_headers(timeout_ms, HeaderMap::new())
    }

    /// Creates a new HTTP client sending `default_headers` on every request.
    ///
    /// # Errors
    ///
    /// Returns `IntegrationError::Configuration` if the client cannot be created.
    pub fn with_headers(timeout_ms: u64, default_headers: HeaderMap) -> IntegrationResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .default_headers(default_headers)
            .build()
            .map_err(|e| {
                IntegrationError::configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { client, timeout_ms })
    }

    /// Makes a GET request and deserializes the JSON response.
    ///
    /// # Errors
    ///
    /// Returns `IntegrationError::Http` on a non-2xx answer,
    /// `IntegrationError::Timeout`/`Connection` if the request fails and
    /// `IntegrationError::Protocol` if the body cannot be parsed.
    pub async fn get<T: DeserializeOwned>(&self, url: &str) -> IntegrationResult<T> {
        let response = self.send(self.client.get(url)).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| IntegrationError::protocol(format!("Failed to parse response: {}", e)))
    }

    /// Makes a POST request with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns `IntegrationError::Http` on a non-2xx answer and
    /// `IntegrationError::Timeout`/`Connection` if the request fails.
    pub async fn post<B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
    ) -> IntegrationResult<RemoteResponse> {
        let response = self.send(self.client.post(url).json(body)).await?;
        Self::read_body(response).await
    }

    /// Makes a PUT request with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns `IntegrationError::Http` on a non-2xx answer and
    /// `IntegrationError::Timeout`/`Connection` if the request fails.
    pub async fn put<B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
    ) -> IntegrationResult<RemoteResponse> {
        let response = self.send(self.client.put(url).json(body)).await?;
        Self::read_body(response).await
    }

    /// Makes a DELETE request.
    ///
    /// # Errors
    ///
    /// Returns `IntegrationError::Http` on a non-2xx answer and
    /// `IntegrationError::Timeout`/`Connection` if the request fails.
    pub async fn delete(&self, url: &str) -> IntegrationResult<RemoteResponse> {
        let response = self.send(self.client.delete(url)).await?;
        Self::read_body(response).await
    }

    /// Sends the request and turns non-2xx answers into errors.
    async fn send(&self, request: RequestBuilder) -> IntegrationResult<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| self.map_reqwest_error(e))?;

        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let error_body = response.text().await.unwrap_or_default();
            Err(IntegrationError::http(status.as_u16(), error_body))
        }
    }

    async fn read_body(response: Response) -> IntegrationResult<RemoteResponse> {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| IntegrationError::protocol(format!("Failed to read response: {}", e)))?;
        Ok(RemoteResponse { status, body })
    }

    /// Maps a reqwest error to an `IntegrationError`.
    fn map_reqwest_error(&self, error: reqwest::Error) -> IntegrationError {
        if error.is_timeout() {
            IntegrationError::timeout(format!("Request timed out after {}ms", self.timeout_ms))
        } else if error.is_connect() {
            IntegrationError::connection(format!("Connection failed: {}", error))
        } else {
            IntegrationError::connection(format!("HTTP request failed: {}", error))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn new_client() {
        let client = HttpClient::new(5000);
        assert!(client.is_ok());
    }

    #[test]
    fn with_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("X-API-KEY", "value".parse().unwrap());
        let client = HttpClient::with_headers(3000, headers);
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn unreachable_host_is_connectivity_error() {
        let client = HttpClient::new(500).unwrap();
        let err = client
            .delete("http://127.0.0.1:9/subscribe/x")
            .await
            .unwrap_err();
        assert!(err.is_connectivity());
        assert_eq!(err.response_status(), 502);
    }
}
