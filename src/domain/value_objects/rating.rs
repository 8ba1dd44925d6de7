//! # Rating Score
//!
//! A single 1 to 5 star rating.

use crate::domain::errors::{DomainError, DomainResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lowest accepted score.
pub const MIN_SCORE: u8 = 1;

/// Highest accepted score.
pub const MAX_SCORE: u8 = 5;

/// A rating score in `1..=5`.
///
/// # Examples
///
/// ```
/// use matching_service::domain::value_objects::rating::RatingScore;
///
/// assert_eq!(RatingScore::new(4).unwrap().get(), 4);
/// assert!(RatingScore::new(0).is_err());
/// assert!(RatingScore::new(6).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct RatingScore(u8);

impl RatingScore {
    /// Validates a raw score.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidRating` if the value is outside `1..=5`.
    pub fn new(value: i64) -> DomainResult<Self> {
        u8::try_from(value)
            .ok()
            .filter(|v| (MIN_SCORE..=MAX_SCORE).contains(v))
            .map(Self)
            .ok_or_else(|| {
                DomainError::InvalidRating(format!(
                    "score {} outside {}..={}",
                    value, MIN_SCORE, MAX_SCORE
                ))
            })
    }

    /// Returns the raw score.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for RatingScore {
    type Error = DomainError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RatingScore> for u8 {
    fn from(score: RatingScore) -> Self {
        score.0
    }
}

impl fmt::Display for RatingScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_are_inclusive() {
        assert!(RatingScore::new(1).is_ok());
        assert!(RatingScore::new(5).is_ok());
        assert!(RatingScore::new(-3).is_err());
        assert!(RatingScore::new(300).is_err());
    }

    #[test]
    fn deserialize_rejects_out_of_range() {
        assert!(serde_json::from_str::<RatingScore>("3").is_ok());
        assert!(serde_json::from_str::<RatingScore>("9").is_err());
    }
}
