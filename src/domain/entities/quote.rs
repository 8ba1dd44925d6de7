//! # Quote Entity
//!
//! A provider's price ("cotización") for a service request.
//!
//! There is at most one quote per (provider, request) pair. Submitting again
//! updates the amount in place instead of creating a second row.

use crate::domain::value_objects::timestamp::Timestamp;
use crate::domain::value_objects::{ProviderId, QuoteAmount, QuoteId, RequestId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A provider's quote for a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    id: QuoteId,
    request_id: RequestId,
    provider_id: ProviderId,
    amount: QuoteAmount,
    round: u32,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl Quote {
    /// Creates a new quote.
    #[must_use]
    pub fn new(
        id: QuoteId,
        request_id: RequestId,
        provider_id: ProviderId,
        amount: QuoteAmount,
        round: u32,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            id,
            request_id,
            provider_id,
            amount,
            round,
            created_at: now,
            updated_at: now,
        }
    }

    /// Reconstructs a quote from storage.
    #[must_use]
    pub fn from_parts(
        id: QuoteId,
        request_id: RequestId,
        provider_id: ProviderId,
        amount: QuoteAmount,
        round: u32,
        created_at: Timestamp,
        updated_at: Timestamp,
    ) -> Self {
        Self {
            id,
            request_id,
            provider_id,
            amount,
            round,
            created_at,
            updated_at,
        }
    }

    /// Returns the quote id.
    #[inline]
    #[must_use]
    pub fn id(&self) -> QuoteId {
        self.id
    }

    /// Returns the request id.
    #[inline]
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the provider id.
    #[inline]
    #[must_use]
    pub fn provider_id(&self) -> ProviderId {
        self.provider_id
    }

    /// Returns the quoted amount.
    #[inline]
    #[must_use]
    pub fn amount(&self) -> QuoteAmount {
        self.amount
    }

    /// Returns the round the quote was last submitted in.
    #[inline]
    #[must_use]
    pub fn round(&self) -> u32 {
        self.round
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

    /// Replaces the amount in place.
    pub fn revise(&mut self, amount: QuoteAmount, round: u32) {
        self.amount = amount;
        self.round = round;
        self.updated_at = Timestamp::now();
    }
}

impl fmt::Display for Quote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Quote({} request={} provider={} amount={})",
            self.id, self.request_id, self.provider_id, self.amount
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn revise_keeps_identity() {
        let mut quote = Quote::new(
            QuoteId::new(1),
            RequestId::new(10),
            ProviderId::new(1),
            QuoteAmount::new(Decimal::from(1500)).unwrap(),
            1,
        );
        let created = quote.created_at();

        quote.revise(QuoteAmount::new(Decimal::from(2000)).unwrap(), 1);

        assert_eq!(quote.id(), QuoteId::new(1));
        assert_eq!(quote.amount().get(), Decimal::from(2000));
        assert_eq!(quote.created_at(), created);
        assert!(!quote.updated_at().is_before(&created));
    }
}
