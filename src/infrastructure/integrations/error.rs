//! # Integration Errors
//!
//! Error types for outbound HTTP integrations (Matching broker and
//! downstream marketplace modules).
//!
//! # Examples
//!
//! ```
//! use matching_service::infrastructure::integrations::error::IntegrationError;
//!
//! let error = IntegrationError::timeout("Request timed out after 5000ms");
//! assert!(error.is_retryable());
//! assert_eq!(error.response_status(), 502);
//!
//! let error = IntegrationError::http(409, "La suscripción ya existe");
//! assert!(error.is_client_error());
//! assert_eq!(error.response_status(), 409);
//! ```

use thiserror::Error;

/// Status reported when the remote side could not be reached.
pub const BAD_GATEWAY: u16 = 502;

/// Error type for outbound integration calls.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegrationError {
    /// The remote answered with a non-2xx status.
    #[error("remote returned HTTP {status}: {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// Request timed out.
    #[error("integration timeout: {message}")]
    Timeout {
        /// Error message.
        message: String,
    },

    /// Network or connection error.
    #[error("integration connection error: {message}")]
    Connection {
        /// Error message.
        message: String,
    },

    /// Response could not be decoded.
    #[error("integration protocol error: {message}")]
    Protocol {
        /// Error message.
        message: String,
    },

    /// Client misconfiguration.
    #[error("integration configuration error: {message}")]
    Configuration {
        /// Error message.
        message: String,
    },
}

impl IntegrationError {
    /// Creates an HTTP status error.
    #[must_use]
    pub fn http(status: u16, body: impl Into<String>) -> Self {
        Self::Http {
            status,
            body: body.into(),
        }
    }

    /// Creates a timeout error.
    #[must_use]
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }

    /// Creates a connection error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a protocol error.
    #[must_use]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Returns true if this error is transient.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Connection { .. } => true,
            Self::Http { status, .. } => *status == 429 || *status >= 500,
            Self::Protocol { .. } | Self::Configuration { .. } => false,
        }
    }

    /// Returns true for a 4xx answer from the remote.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Http { status, .. } if (400..500).contains(status))
    }

    /// Returns true if the remote could not be reached at all.
    #[must_use]
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Connection { .. })
    }

    /// Returns the remote HTTP status, if the remote answered.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Status to report to our own callers.
    ///
    /// Remote statuses pass through; anything that never produced a remote
    /// answer becomes 502, except configuration errors which are ours (500).
    #[must_use]
    pub fn response_status(&self) -> u16 {
        match self {
            Self::Http { status, .. } => *status,
            Self::Timeout { .. } | Self::Connection { .. } | Self::Protocol { .. } => BAD_GATEWAY,
            Self::Configuration { .. } => 500,
        }
    }

    /// Returns the remote body, or the error message when there is none.
    #[must_use]
    pub fn detail(&self) -> &str {
        match self {
            Self::Http { body, .. } => body,
            Self::Timeout { message }
            | Self::Connection { message }
            | Self::Protocol { message }
            | Self::Configuration { message } => message,
        }
    }
}

/// Result type for integration calls.
pub type IntegrationResult<T> = Result<T, IntegrationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_is_retryable_connectivity() {
        let error = IntegrationError::timeout("slow");
        assert!(error.is_retryable());
        assert!(error.is_connectivity());
        assert_eq!(error.status(), None);
        assert_eq!(error.response_status(), 502);
    }

    #[test]
    fn conflict_is_client_error() {
        let error = IntegrationError::http(409, "ya existe");
        assert!(error.is_client_error());
        assert!(!error.is_retryable());
        assert_eq!(error.status(), Some(409));
        assert_eq!(error.detail(), "ya existe");
    }

    #[test]
    fn server_errors_and_throttling_are_retryable() {
        assert!(IntegrationError::http(503, "").is_retryable());
        assert!(IntegrationError::http(429, "").is_retryable());
        assert!(!IntegrationError::http(503, "").is_client_error());
    }

    #[test]
    fn configuration_maps_to_internal() {
        let error = IntegrationError::configuration("bad header");
        assert_eq!(error.response_status(), 500);
        assert!(!error.is_retryable());
    }

    #[test]
    fn display_format() {
        let error = IntegrationError::http(400, "bad");
        let display = error.to_string();
        assert!(display.contains("400"));
        assert!(display.contains("bad"));
    }
}
