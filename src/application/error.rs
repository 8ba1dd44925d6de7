//! # Application Errors
//!
//! Error types for the application layer.
//!
//! These errors represent failures that can occur during use case execution,
//! including validation failures, business rule violations, and infrastructure errors.
//!
//! # Error Hierarchy
//!
//! ```text
//! ApplicationError
//! ├── Domain(DomainError)                 - Business rule violations
//! ├── Infrastructure(InfrastructureError) - Storage failures
//! ├── Integration(IntegrationError)       - Outbound HTTP failures
//! ├── Validation(String)                  - Input validation failures
//! ├── NotFound                            - Resource not found
//! ├── InvalidState(String)                - Operation not allowed in current state
//! └── Internal(String)                    - Anything else
//! ```
//!
//! Every variant maps to one HTTP status through [`ApplicationError::status_code`].
//!
//! # Examples
//!
//! ```
//! use matching_service::application::error::ApplicationError;
//! use matching_service::infrastructure::persistence::RepositoryError;
//!
//! let err = ApplicationError::validation("monto must be positive");
//! assert_eq!(err.status_code(), 400);
//!
//! let err = ApplicationError::not_found("Solicitud", "10");
//! assert_eq!(err.status_code(), 404);
//!
//! let app_err: ApplicationError = RepositoryError::connection("pool timed out").into();
//! assert_eq!(app_err.status_code(), 500);
//! assert!(app_err.is_retryable());
//! ```

use crate::domain::errors::DomainError;
use crate::infrastructure::integrations::IntegrationError;
use crate::infrastructure::persistence::RepositoryError;
use thiserror::Error;

/// Infrastructure layer error.
///
/// Represents failures of the storage backends.
#[derive(Debug, Error)]
pub enum InfrastructureError {
    /// Repository error.
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl InfrastructureError {
    /// Returns true if the backend was unreachable rather than the query wrong.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Repository(RepositoryError::Connection(_)))
    }
}

/// Application layer error.
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// Domain error from business logic.
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),

    /// Infrastructure error from storage.
    #[error("infrastructure error: {0}")]
    Infrastructure(#[from] InfrastructureError),

    /// Outbound integration error.
    #[error("integration error: {0}")]
    Integration(#[from] IntegrationError),

    /// Request validation failed.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("not found: {resource_type} with id {id}")]
    NotFound {
        /// Type of resource.
        resource_type: String,
        /// Resource identifier.
        id: String,
    },

    /// Invalid state for operation.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<RepositoryError> for ApplicationError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::NotFound { entity_type, id } => Self::NotFound {
                resource_type: entity_type.to_string(),
                id,
            },
            other => Self::Infrastructure(InfrastructureError::Repository(other)),
        }
    }
}

impl ApplicationError {
    /// Creates a validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Creates a not found error.
    #[must_use]
    pub fn not_found(resource_type: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            resource_type: resource_type.into(),
            id: id.to_string(),
        }
    }

    /// Creates an invalid state error.
    #[must_use]
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Infrastructure(e) => e.is_retryable(),
            Self::Integration(e) => e.is_retryable(),
            _ => false,
        }
    }

    /// Returns true if this is a not found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// HTTP status reported to callers.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Domain(e) if e.is_state_transition() => 409,
            Self::Domain(_) | Self::Validation(_) => 400,
            Self::NotFound { .. } => 404,
            Self::InvalidState(_) => 409,
            Self::Integration(e) => e.response_status(),
            Self::Infrastructure(_) | Self::Internal(_) => 500,
        }
    }

    /// Stable machine-readable error code.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Domain(e) if e.is_state_transition() => "INVALID_STATE",
            Self::Domain(_) | Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::InvalidState(_) => "INVALID_STATE",
            Self::Integration(e) if e.is_connectivity() => "UPSTREAM_UNAVAILABLE",
            Self::Integration(_) => "UPSTREAM_ERROR",
            Self::Infrastructure(_) => "STORAGE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

/// Result type for application operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::RequestStatus;

    #[test]
    fn query_failures_are_not_retryable() {
        let err = InfrastructureError::from(RepositoryError::query("syntax error"));
        assert!(err.to_string().contains("syntax error"));
        assert!(!err.is_retryable());
    }

    #[test]
    fn repository_not_found_becomes_not_found() {
        let err: ApplicationError = RepositoryError::not_found("Prestador", "7").into();
        assert!(err.is_not_found());
        assert_eq!(err.status_code(), 404);
        assert!(err.to_string().contains('7'));
    }

    #[test]
    fn other_repository_errors_are_infrastructure() {
        let err: ApplicationError = RepositoryError::connection("pool closed").into();
        assert_eq!(err.status_code(), 500);
        assert!(err.is_retryable());
        assert_eq!(err.error_code(), "STORAGE_ERROR");
    }

    #[test]
    fn validation_and_domain_are_bad_request() {
        assert_eq!(ApplicationError::validation("x").status_code(), 400);
        let err: ApplicationError = DomainError::InvalidAmount("negative".to_string()).into();
        assert_eq!(err.status_code(), 400);
        assert!(err.to_string().contains("negative"));
    }

    #[test]
    fn state_transition_is_conflict() {
        let err: ApplicationError = DomainError::InvalidStateTransition {
            from: RequestStatus::Completed,
            to: RequestStatus::Cancelled,
        }
        .into();
        assert_eq!(err.status_code(), 409);
        assert_eq!(err.error_code(), "INVALID_STATE");
        assert_eq!(ApplicationError::invalid_state("x").status_code(), 409);
    }

    #[test]
    fn integration_status_passes_through() {
        let err: ApplicationError = IntegrationError::http(422, "bad topic").into();
        assert_eq!(err.status_code(), 422);
        assert_eq!(err.error_code(), "UPSTREAM_ERROR");

        let err: ApplicationError = IntegrationError::connection("refused").into();
        assert_eq!(err.status_code(), 502);
        assert!(err.is_retryable());
        assert_eq!(err.error_code(), "UPSTREAM_UNAVAILABLE");
    }

    #[test]
    fn not_retryable() {
        assert!(!ApplicationError::validation("invalid input").is_retryable());
        assert!(!ApplicationError::internal("boom").is_retryable());
    }
}
