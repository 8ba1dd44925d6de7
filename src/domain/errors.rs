//! # Domain Errors
//!
//! Business rule violations raised by entities and value objects.
//!
//! # Examples
//!
//! ```
//! use matching_service::domain::errors::DomainError;
//!
//! let err = DomainError::InvalidAmount("amount must be positive".to_string());
//! assert!(err.to_string().contains("positive"));
//! ```

use crate::domain::value_objects::RequestStatus;
use thiserror::Error;

/// Error raised when a domain invariant would be broken.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// Generic validation failure.
    #[error("validation error: {0}")]
    ValidationError(String),

    /// Quote amount outside the accepted range or precision.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// Rating score outside 1..=5.
    #[error("invalid rating: {0}")]
    InvalidRating(String),

    /// Adding ratings would exceed the completed job count.
    #[error("rating limit exceeded: {current} existing + {incoming} new > {completed_jobs} completed jobs")]
    RatingLimitExceeded {
        /// Ratings already stored.
        current: usize,
        /// Ratings in the batch item.
        incoming: usize,
        /// Completed jobs of the provider.
        completed_jobs: u32,
    },

    /// Request status cannot move to the target.
    #[error("invalid state transition from {from} to {to}")]
    InvalidStateTransition {
        /// Current status.
        from: RequestStatus,
        /// Requested status.
        to: RequestStatus,
    },
}

impl DomainError {
    /// Creates a validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }

    /// Returns true if the error came from an illegal status change.
    #[must_use]
    pub fn is_state_transition(&self) -> bool {
        matches!(self, Self::InvalidStateTransition { .. })
    }
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_limit_message_names_all_counts() {
        let err = DomainError::RatingLimitExceeded {
            current: 4,
            incoming: 2,
            completed_jobs: 5,
        };
        let msg = err.to_string();
        assert!(msg.contains('4'));
        assert!(msg.contains('2'));
        assert!(msg.contains('5'));
    }

    #[test]
    fn state_transition_is_flagged() {
        let err = DomainError::InvalidStateTransition {
            from: RequestStatus::Completed,
            to: RequestStatus::Cancelled,
        };
        assert!(err.is_state_transition());
        assert!(!DomainError::validation("x").is_state_transition());
    }
}
