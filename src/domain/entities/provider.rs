//! # Provider
//!
//! A tradesperson ("prestador") who can be invited to quote.
//!
//! The provider id is the external id assigned by the providers module and
//! doubles as the primary key here. Ratings are kept as an ordered list of
//! 1 to 5 star scores; their count may never exceed the number of
//! completed jobs.
//!
//! # Examples
//!
//! ```
//! use matching_service::domain::entities::provider::Provider;
//! use matching_service::domain::value_objects::{ProviderId, RatingScore};
//!
//! let mut provider = Provider::new(ProviderId::new(1), "Ana", "Gomez")
//!     .with_status("activo")
//!     .with_completed_jobs(2);
//!
//! assert!(provider.is_active());
//! provider.append_ratings(&[RatingScore::new(5).unwrap()]).unwrap();
//! assert_eq!(provider.average_rating(), Some(5.0));
//! ```

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::{ProviderId, RatingScore, SkillId, ZoneId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Status value that makes a provider eligible for invitations.
pub const ACTIVE_STATUS: &str = "ACTIVO";

/// Contact details of a provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    /// Email address.
    pub email: Option<String>,
    /// Phone number.
    pub phone: Option<String>,
    /// Street address.
    pub address: Option<String>,
}

/// A service provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    id: ProviderId,
    first_name: String,
    last_name: String,
    contact: ContactInfo,
    status: String,
    hourly_price: Option<Decimal>,
    completed_jobs: u32,
    ratings: Vec<RatingScore>,
    skills: Vec<SkillId>,
    zone: Option<ZoneId>,
}

impl Provider {
    /// Creates a provider with no ratings, jobs or skills.
    #[must_use]
    pub fn new(id: ProviderId, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            id,
            first_name: first_name.into(),
            last_name: last_name.into(),
            contact: ContactInfo::default(),
            status: String::new(),
            hourly_price: None,
            completed_jobs: 0,
            ratings: Vec::new(),
            skills: Vec::new(),
            zone: None,
        }
    }

    /// Sets the free-text status.
    #[must_use]
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    /// Sets the contact details.
    #[must_use]
    pub fn with_contact(mut self, contact: ContactInfo) -> Self {
        self.contact = contact;
        self
    }

    /// Sets the hourly price.
    #[must_use]
    pub fn with_hourly_price(mut self, price: Option<Decimal>) -> Self {
        self.hourly_price = price;
        self
    }

    /// Sets the completed job count.
    #[must_use]
    pub fn with_completed_jobs(mut self, jobs: u32) -> Self {
        self.completed_jobs = jobs;
        self
    }

    /// Replaces the rating list without checking it against completed jobs.
    ///
    /// Used when the providers module pushes its authoritative state.
    #[must_use]
    pub fn with_ratings(mut self, ratings: Vec<RatingScore>) -> Self {
        self.ratings = ratings;
        self
    }

    /// Replaces the skill associations.
    #[must_use]
    pub fn with_skills(mut self, skills: Vec<SkillId>) -> Self {
        self.skills = skills;
        self
    }

    /// Sets the zone.
    #[must_use]
    pub fn with_zone(mut self, zone: Option<ZoneId>) -> Self {
        self.zone = zone;
        self
    }

    /// Returns the provider id.
    #[inline]
    #[must_use]
    pub fn id(&self) -> ProviderId {
        self.id
    }

    /// Returns the first name.
    #[inline]
    #[must_use]
    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    /// Returns the surname.
    #[inline]
    #[must_use]
    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    /// Returns `"first last"`, trimmed.
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// Returns the contact details.
    #[inline]
    #[must_use]
    pub fn contact(&self) -> &ContactInfo {
        &self.contact
    }

    /// Returns the raw status text.
    #[inline]
    #[must_use]
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Returns true if the status is `ACTIVO`, ignoring case and padding.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status.trim().eq_ignore_ascii_case(ACTIVE_STATUS)
    }

    /// Returns the hourly price, if known.
    #[inline]
    #[must_use]
    pub fn hourly_price(&self) -> Option<Decimal> {
        self.hourly_price
    }

    /// Returns the completed job count.
    #[inline]
    #[must_use]
    pub fn completed_jobs(&self) -> u32 {
        self.completed_jobs
    }

    /// Returns the ratings in the order they were received.
    #[inline]
    #[must_use]
    pub fn ratings(&self) -> &[RatingScore] {
        &self.ratings
    }

    /// Returns the mean rating, or `None` when unrated.
    #[must_use]
    pub fn average_rating(&self) -> Option<f64> {
        if self.ratings.is_empty() {
            return None;
        }
        let total: u32 = self.ratings.iter().map(|r| u32::from(r.get())).sum();
        Some(f64::from(total) / self.ratings.len() as f64)
    }

    /// Returns the skill ids.
    #[inline]
    #[must_use]
    pub fn skills(&self) -> &[SkillId] {
        &self.skills
    }

    /// Returns true if the provider offers the skill.
    #[must_use]
    pub fn has_skill(&self, skill: SkillId) -> bool {
        self.skills.contains(&skill)
    }

    /// Returns the zone, if any.
    #[inline]
    #[must_use]
    pub fn zone(&self) -> Option<ZoneId> {
        self.zone
    }

    /// Appends new ratings.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ValidationError` if `scores` is empty, or
    /// `DomainError::RatingLimitExceeded` if the total would exceed the
    /// completed job count. The provider is left untouched on error.
    pub fn append_ratings(&mut self, scores: &[RatingScore]) -> DomainResult<()> {
        if scores.is_empty() {
            return Err(DomainError::validation("at least one score is required"));
        }
        let current = self.ratings.len();
        let allowed = self.completed_jobs as usize;
        if current.saturating_add(scores.len()) > allowed {
            return Err(DomainError::RatingLimitExceeded {
                current,
                incoming: scores.len(),
                completed_jobs: self.completed_jobs,
            });
        }
        self.ratings.extend_from_slice(scores);
        Ok(())
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Provider({} {})", self.id, self.display_name())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn scores(values: &[i64]) -> Vec<RatingScore> {
        values.iter().map(|v| RatingScore::new(*v).unwrap()).collect()
    }

    #[test]
    fn status_check_ignores_case_and_padding() {
        let p = Provider::new(ProviderId::new(1), "A", "B").with_status("  Activo ");
        assert!(p.is_active());
        let p = Provider::new(ProviderId::new(1), "A", "B").with_status("INACTIVO");
        assert!(!p.is_active());
    }

    #[test]
    fn average_of_ratings() {
        let p = Provider::new(ProviderId::new(1), "A", "B").with_ratings(scores(&[4, 5, 3]));
        assert!((p.average_rating().unwrap() - 4.0).abs() < f64::EPSILON);
        assert!(Provider::new(ProviderId::new(2), "A", "B").average_rating().is_none());
    }

    #[test]
    fn append_ratings_respects_completed_jobs() {
        let mut p = Provider::new(ProviderId::new(1), "A", "B")
            .with_completed_jobs(3)
            .with_ratings(scores(&[5, 4]));

        let err = p.append_ratings(&scores(&[3, 3])).unwrap_err();
        assert!(matches!(err, DomainError::RatingLimitExceeded { .. }));
        assert_eq!(p.ratings().len(), 2);

        p.append_ratings(&scores(&[3])).unwrap();
        assert_eq!(p.ratings().len(), 3);
    }

    #[test]
    fn append_empty_is_rejected() {
        let mut p = Provider::new(ProviderId::new(1), "A", "B").with_completed_jobs(3);
        assert!(p.append_ratings(&[]).is_err());
    }

    #[test]
    fn display_name_trims_missing_surname() {
        let p = Provider::new(ProviderId::new(1), "Ana", "");
        assert_eq!(p.display_name(), "Ana");
    }
}
