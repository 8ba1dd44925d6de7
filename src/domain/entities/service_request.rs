//! # Service Request Aggregate
//!
//! A request ("solicitud") raised by an end user for some category of work.
//!
//! # State Machine
//!
//! ```text
//! Created → Quoting → Assigned → InProgress → Completed
//!    ↓         ↓          ↓           ↓
//!    └─────────┴──────────┴───────────┴──→ Cancelled
//! ```
//!
//! Only `Created` requests are picked up by the invitation workflow. Moving
//! to `Quoting` flags the request as quoted and stamps the start of the
//! current invitation round.
//!
//! # Examples
//!
//! ```
//! use matching_service::domain::entities::service_request::ServiceRequest;
//! use matching_service::domain::value_objects::{CategoryId, RequestId, RequestStatus};
//!
//! let mut request = ServiceRequest::new(RequestId::new(10), "Leaking kitchen tap")
//!     .with_category(Some(CategoryId::new(3)));
//!
//! request.start_quoting().unwrap();
//! assert_eq!(request.status(), RequestStatus::Quoting);
//! assert!(request.was_quoted());
//! assert_eq!(request.round(), 1);
//! ```

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::timestamp::Timestamp;
use crate::domain::value_objects::{
    CategoryId, ProviderId, QuoteId, RequestId, RequestStatus, SkillId, UserId,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A service request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRequest {
    id: RequestId,
    requester_id: Option<UserId>,
    category_id: Option<CategoryId>,
    skill_id: Option<SkillId>,
    title: Option<String>,
    description: String,
    status: RequestStatus,
    assigned_provider_id: Option<ProviderId>,
    assigned_quote_id: Option<QuoteId>,
    critical: bool,
    quoted: bool,
    round: u32,
    round_started_at: Option<Timestamp>,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl ServiceRequest {
    /// Creates a request in `Created` status, round 1.
    #[must_use]
    pub fn new(id: RequestId, description: impl Into<String>) -> Self {
        let now = Timestamp::now();
        Self {
            id,
            requester_id: None,
            category_id: None,
            skill_id: None,
            title: None,
            description: description.into(),
            status: RequestStatus::Created,
            assigned_provider_id: None,
            assigned_quote_id: None,
            critical: false,
            quoted: false,
            round: 1,
            round_started_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the requester.
    #[must_use]
    pub fn with_requester(mut self, requester: Option<UserId>) -> Self {
        self.requester_id = requester;
        self
    }

    /// Sets the category.
    #[must_use]
    pub fn with_category(mut self, category: Option<CategoryId>) -> Self {
        self.category_id = category;
        self
    }

    /// Sets the requested skill.
    #[must_use]
    pub fn with_skill(mut self, skill: Option<SkillId>) -> Self {
        self.skill_id = skill;
        self
    }

    /// Sets the title.
    #[must_use]
    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = title;
        self
    }

    /// Sets a provider chosen directly by the requester.
    #[must_use]
    pub fn with_assigned_provider(mut self, provider: Option<ProviderId>) -> Self {
        self.assigned_provider_id = provider;
        self
    }

    /// Marks the request as critical (urgent).
    #[must_use]
    pub fn with_critical(mut self, critical: bool) -> Self {
        self.critical = critical;
        self
    }

    /// Sets the already-quoted flag as received from upstream.
    #[must_use]
    pub fn with_quoted(mut self, quoted: bool) -> Self {
        self.quoted = quoted;
        self
    }

    /// Sets the status as received from upstream.
    ///
    /// Intended for construction only; lifecycle changes go through the
    /// transition methods.
    #[must_use]
    pub fn with_status(mut self, status: RequestStatus) -> Self {
        self.status = status;
        self
    }

    fn transition_to(&mut self, target: RequestStatus) -> DomainResult<()> {
        if !self.status.can_transition_to(target) {
            return Err(DomainError::InvalidStateTransition {
                from: self.status,
                to: target,
            });
        }
        self.status = target;
        self.updated_at = Timestamp::now();
        Ok(())
    }

    // ========== Accessors ==========

    /// Returns the request id.
    #[inline]
    #[must_use]
    pub fn id(&self) -> RequestId {
        self.id
    }

    /// Returns the requester id.
    #[inline]
    #[must_use]
    pub fn requester_id(&self) -> Option<UserId> {
        self.requester_id
    }

    /// Returns the category id.
    #[inline]
    #[must_use]
    pub fn category_id(&self) -> Option<CategoryId> {
        self.category_id
    }

    /// Returns the requested skill id.
    #[inline]
    #[must_use]
    pub fn skill_id(&self) -> Option<SkillId> {
        self.skill_id
    }

    /// Returns the title.
    #[inline]
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Returns the description.
    #[inline]
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the status.
    #[inline]
    #[must_use]
    pub fn status(&self) -> RequestStatus {
        self.status
    }

    /// Returns the directly assigned provider.
    #[inline]
    #[must_use]
    pub fn assigned_provider_id(&self) -> Option<ProviderId> {
        self.assigned_provider_id
    }

    /// Returns the accepted quote, if one was assigned upstream.
    #[inline]
    #[must_use]
    pub fn assigned_quote_id(&self) -> Option<QuoteId> {
        self.assigned_quote_id
    }

    /// Returns true if the request is critical.
    #[inline]
    #[must_use]
    pub fn is_critical(&self) -> bool {
        self.critical
    }

    /// Returns true once the request has entered quoting.
    #[inline]
    #[must_use]
    pub fn was_quoted(&self) -> bool {
        self.quoted
    }

    /// Returns the current invitation round (starts at 1).
    #[inline]
    #[must_use]
    pub fn round(&self) -> u32 {
        self.round
    }

    /// Returns when the current round started.
    #[inline]
    #[must_use]
    pub fn round_started_at(&self) -> Option<Timestamp> {
        self.round_started_at
    }

    /// Returns the creation timestamp.
    #[inline]
    #[must_use]
    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Returns the last update timestamp.
    #[inline]
    #[must_use]
    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    /// Returns true if the request may enter the invitation workflow.
    #[must_use]
    pub fn is_awaiting_invitations(&self) -> bool {
        self.status == RequestStatus::Created
    }

    // ========== Transitions ==========

    /// Moves the request to `Quoting` and opens the current round.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidStateTransition` unless in `Created`.
    pub fn start_quoting(&mut self) -> DomainResult<()> {
        self.transition_to(RequestStatus::Quoting)?;
        self.quoted = true;
        if self.round_started_at.is_none() {
            self.round_started_at = Some(self.updated_at);
        }
        Ok(())
    }

    /// Records the quote accepted upstream and moves to `Assigned`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidStateTransition` if the request is
    /// already assigned or further along.
    pub fn assign(&mut self, provider: ProviderId, quote: Option<QuoteId>) -> DomainResult<()> {
        self.transition_to(RequestStatus::Assigned)?;
        self.assigned_provider_id = Some(provider);
        self.assigned_quote_id = quote;
        Ok(())
    }

    /// Cancels the request.
    ///
    /// Returns `Ok(false)` if it was already cancelled.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidStateTransition` if the request is
    /// completed.
    pub fn cancel(&mut self) -> DomainResult<bool> {
        if self.status == RequestStatus::Cancelled {
            return Ok(false);
        }
        self.transition_to(RequestStatus::Cancelled)?;
        Ok(true)
    }

    /// Reopens a cancelled request for a new quoting round.
    ///
    /// This is the only way out of `Cancelled`: the round number goes up by
    /// one and its clock starts now.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidStateTransition` unless in `Cancelled`.
    pub fn reopen_for_requote(&mut self) -> DomainResult<()> {
        if self.status != RequestStatus::Cancelled {
            return Err(DomainError::InvalidStateTransition {
                from: self.status,
                to: RequestStatus::Quoting,
            });
        }
        let now = Timestamp::now();
        self.status = RequestStatus::Quoting;
        self.round = self.round.saturating_add(1);
        self.round_started_at = Some(now);
        self.quoted = true;
        self.updated_at = now;
        Ok(())
    }

    /// Restarts the clock of the current round after an extra invitation.
    pub fn restart_round_clock(&mut self) {
        let now = Timestamp::now();
        self.round_started_at = Some(now);
        self.updated_at = now;
    }
}

impl fmt::Display for ServiceRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ServiceRequest({} status={} round={})",
            self.id, self.status, self.round
        )
    }
}
