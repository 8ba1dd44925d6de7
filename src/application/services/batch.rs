//! # Batch Reports
//!
//! Outcome of batch endpoints that process every item independently.

use crate::application::error::ApplicationError;
use serde::Serialize;

/// One failed batch item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchItemError {
    /// Zero-based position in the batch.
    pub index: usize,
    /// HTTP status the item would have produced on its own.
    pub status: u16,
    /// Error message.
    pub message: String,
}

/// Aggregate outcome of a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    /// Items received.
    pub total: usize,
    /// Items committed.
    pub succeeded: usize,
    /// Items rejected.
    pub errors: Vec<BatchItemError>,
}

impl BatchReport {
    /// Creates an empty report for `total` items.
    #[must_use]
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    /// Records a committed item.
    pub fn record_success(&mut self) {
        self.succeeded += 1;
    }

    /// Records a rejected item.
    pub fn record_failure(&mut self, index: usize, error: &ApplicationError) {
        self.errors.push(BatchItemError {
            index,
            status: error.status_code(),
            message: error.to_string(),
        });
    }

    /// Number of rejected items.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.errors.len()
    }

    /// Returns true if every item was committed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_successes_and_failures() {
        let mut report = BatchReport::new(3);
        report.record_success();
        report.record_failure(1, &ApplicationError::validation("bad"));
        report.record_failure(2, &ApplicationError::not_found("Prestador", 9));

        assert_eq!(report.succeeded, 1);
        assert_eq!(report.failed(), 2);
        assert!(!report.is_clean());
        assert_eq!(report.errors[1].status, 404);
    }
}
