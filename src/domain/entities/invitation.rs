//! # Invitation
//!
//! Append-only record that a provider was invited to quote a request in a
//! given round. Unique per (request, provider, round).

use crate::domain::value_objects::timestamp::Timestamp;
use crate::domain::value_objects::{ProviderId, RequestId};
use serde::{Deserialize, Serialize};

/// Uniqueness key of an invitation row.
pub type InvitationKey = (RequestId, ProviderId, u32);

/// A provider invited to quote in one round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invitation {
    /// The request.
    pub request_id: RequestId,
    /// The invited provider.
    pub provider_id: ProviderId,
    /// Invitation round.
    pub round: u32,
    /// When the invitation was recorded.
    pub sent_at: Timestamp,
}

impl Invitation {
    /// Creates an invitation stamped now.
    #[must_use]
    pub fn new(request_id: RequestId, provider_id: ProviderId, round: u32) -> Self {
        Self {
            request_id,
            provider_id,
            round,
            sent_at: Timestamp::now(),
        }
    }

    /// Returns the uniqueness key.
    #[inline]
    #[must_use]
    pub fn key(&self) -> InvitationKey {
        (self.request_id, self.provider_id, self.round)
    }
}
