//! # Quote Submission
//!
//! Stores a provider's quote and fans it out to the downstream modules.
//!
//! A quote is unique per (provider, request): a second submission updates
//! the amount in place. Once stored, the quote is forwarded in order to
//!
//! 1. the core quotes endpoint, as `{idsolicitud, idprestador, monto}`
//! 2. the requests module, with every quote of the request
//! 3. the search indexer, with the same list
//! 4. the Matching broker, as a quote summary (when publishing is enabled)
//!
//! Each step is best effort. Failures are logged and reported in the
//! [`FanOutReport`]; they never undo the stored quote.

use crate::application::error::{ApplicationError, ApplicationResult};
use crate::application::services::top3_publisher::Top3Publisher;
use crate::config::InvitationSettings;
use crate::domain::entities::{Quote, ServiceRequest};
use crate::domain::value_objects::{ProviderId, QuoteAmount, RequestId};
use crate::infrastructure::integrations::payloads::{CoreQuote, RequestQuoteItem, RequestQuotes};
use crate::infrastructure::integrations::traits::{
    CoreQuotesClient, RequestsModuleClient, SearchIndexClient,
};
use crate::infrastructure::persistence::{
    ProviderRepository, QuoteRepository, ServiceRequestRepository, UpsertOutcome,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A quote as submitted by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteSubmission {
    /// Quoted request.
    #[serde(rename = "solicitudId")]
    pub request_id: RequestId,
    /// Quoting provider.
    #[serde(rename = "prestadorId")]
    pub provider_id: ProviderId,
    /// Quoted amount.
    #[serde(rename = "monto")]
    pub amount: Decimal,
}

/// Which downstream deliveries succeeded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanOutReport {
    /// Core quotes endpoint.
    pub core: bool,
    /// Requests module.
    pub requests_module: bool,
    /// Search indexer.
    pub search: bool,
    /// Quote summary on the Matching broker.
    pub published: bool,
}

/// Result of a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteReceipt {
    /// The stored quote.
    pub quote: Quote,
    /// Whether the quote was created or updated.
    pub outcome: UpsertOutcome,
    /// Downstream delivery report.
    pub fan_out: FanOutReport,
}

/// Quote submission service.
#[derive(Debug, Clone)]
pub struct QuoteSubmissionService {
    requests: Arc<dyn ServiceRequestRepository>,
    providers: Arc<dyn ProviderRepository>,
    quotes: Arc<dyn QuoteRepository>,
    core: Arc<dyn CoreQuotesClient>,
    requests_module: Arc<dyn RequestsModuleClient>,
    search: Arc<dyn SearchIndexClient>,
    publisher: Top3Publisher,
    limits: InvitationSettings,
}

impl QuoteSubmissionService {
    /// Creates the service.
    #[must_use]
    pub fn new(
        requests: Arc<dyn ServiceRequestRepository>,
        providers: Arc<dyn ProviderRepository>,
        quotes: Arc<dyn QuoteRepository>,
        core: Arc<dyn CoreQuotesClient>,
        requests_module: Arc<dyn RequestsModuleClient>,
        search: Arc<dyn SearchIndexClient>,
        publisher: Top3Publisher,
    ) -> Self {
        Self {
            requests,
            providers,
            quotes,
            core,
            requests_module,
            search,
            publisher,
            limits: InvitationSettings::default(),
        }
    }

    /// Sets the invitation limits used as the quote target in summaries.
    #[must_use]
    pub fn with_limits(mut self, limits: InvitationSettings) -> Self {
        self.limits = limits;
        self
    }

    /// Validates, stores and fans out a quote.
    ///
    /// # Errors
    ///
    /// Returns a domain error for an invalid amount and `NotFound` for an
    /// unknown provider or request. Downstream failures are not errors.
    pub async fn submit(&self, submission: &QuoteSubmission) -> ApplicationResult<QuoteReceipt> {
        let amount = QuoteAmount::new(submission.amount)?;

        if self.providers.get(submission.provider_id).await?.is_none() {
            return Err(ApplicationError::not_found(
                "Prestador",
                submission.provider_id,
            ));
        }
        let request = self
            .requests
            .get(submission.request_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Solicitud", submission.request_id))?;

        let (quote, outcome) = self
            .quotes
            .upsert(request.id(), submission.provider_id, amount, request.round())
            .await?;
        tracing::info!(
            request_id = %request.id(),
            provider_id = %submission.provider_id,
            quote_id = %quote.id(),
            amount = %amount,
            created = outcome.is_created(),
            "quote stored"
        );

        let fan_out = self.fan_out(&request, &quote).await;
        Ok(QuoteReceipt {
            quote,
            outcome,
            fan_out,
        })
    }

    async fn fan_out(&self, request: &ServiceRequest, quote: &Quote) -> FanOutReport {
        let mut report = FanOutReport::default();

        let core_quote = CoreQuote {
            request_id: request.id(),
            provider_id: quote.provider_id(),
            amount: quote.amount().get(),
        };
        match self.core.submit_quote(&core_quote).await {
            Ok(()) => report.core = true,
            Err(e) => tracing::warn!(
                request_id = %request.id(),
                provider_id = %quote.provider_id(),
                error = %e,
                "core quote delivery failed"
            ),
        }

        let all = match self.quotes.find_by_request(request.id()).await {
            Ok(all) => all,
            Err(e) => {
                tracing::error!(
                    request_id = %request.id(),
                    error = %e,
                    "failed to load request quotes, skipping remaining fan-out"
                );
                return report;
            }
        };
        let payload = RequestQuotes {
            request_id: request.id(),
            quotes: all
                .iter()
                .map(|q| RequestQuoteItem {
                    provider_id: q.provider_id(),
                    amount: q.amount().get(),
                })
                .collect(),
        };

        match self.requests_module.put_quotes(&payload).await {
            Ok(()) => report.requests_module = true,
            Err(e) => tracing::warn!(
                request_id = %request.id(),
                error = %e,
                "requests module update failed"
            ),
        }

        match self.search.index_quotes(&payload).await {
            Ok(()) => report.search = true,
            Err(e) => tracing::warn!(
                request_id = %request.id(),
                error = %e,
                "search indexing failed"
            ),
        }

        let target = self.limits.initial_for(request.is_critical());
        report.published = self
            .publisher
            .publish_quotes(request, &all, target)
            .await
            .success;

        tracing::debug!(request_id = %request.id(), total = all.len(), ?report, "quote fan-out done");
        report
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::application::services::testing::{RecordingDownstream, RecordingMatching};
    use crate::config::MatchingSettings;
    use crate::domain::entities::Provider;
    use crate::infrastructure::persistence::in_memory::{
        InMemoryProviderRepository, InMemoryQuoteRepository, InMemoryServiceRequestRepository,
    };
    use std::str::FromStr;

    struct Harness {
        quotes: Arc<InMemoryQuoteRepository>,
        downstream: Arc<RecordingDownstream>,
        matching: Arc<RecordingMatching>,
        service: QuoteSubmissionService,
    }

    async fn harness_with(downstream: RecordingDownstream) -> Harness {
        let requests = Arc::new(InMemoryServiceRequestRepository::new());
        let providers = Arc::new(InMemoryProviderRepository::new());
        let quotes = Arc::new(InMemoryQuoteRepository::new());
        let downstream = Arc::new(downstream);
        let matching = Arc::new(RecordingMatching::new());

        requests
            .save(&ServiceRequest::new(RequestId::new(10), "Pintura"))
            .await
            .unwrap();
        for id in [1, 2] {
            providers
                .save(&Provider::new(ProviderId::new(id), "P", "Q").with_status("ACTIVO"))
                .await
                .unwrap();
        }

        let publisher = Top3Publisher::new(
            matching.clone(),
            &MatchingSettings {
                publish_enabled: true,
                ..MatchingSettings::default()
            },
        );
        let service = QuoteSubmissionService::new(
            requests,
            providers,
            quotes.clone(),
            downstream.clone(),
            downstream.clone(),
            downstream.clone(),
            publisher,
        );
        Harness {
            quotes,
            downstream,
            matching,
            service,
        }
    }

    fn submission(provider: i64, amount: &str) -> QuoteSubmission {
        QuoteSubmission {
            request_id: RequestId::new(10),
            provider_id: ProviderId::new(provider),
            amount: Decimal::from_str(amount).unwrap(),
        }
    }

    #[tokio::test]
    async fn submit_then_resubmit_updates_in_place() {
        let h = harness_with(RecordingDownstream::new()).await;

        let first = h.service.submit(&submission(1, "1500.00")).await.unwrap();
        assert_eq!(first.outcome, UpsertOutcome::Created);

        let second = h.service.submit(&submission(1, "2000.00")).await.unwrap();
        assert_eq!(second.outcome, UpsertOutcome::Updated);
        assert_eq!(second.quote.id(), first.quote.id());
        assert_eq!(second.quote.amount().get(), Decimal::from(2000));

        let stored = h.quotes.find_by_request(RequestId::new(10)).await.unwrap();
        assert_eq!(stored.len(), 1);
    }

    #[tokio::test]
    async fn fan_out_carries_every_quote() {
        let h = harness_with(RecordingDownstream::new()).await;
        h.service.submit(&submission(1, "100")).await.unwrap();
        let receipt = h.service.submit(&submission(2, "150.50")).await.unwrap();

        assert_eq!(
            receipt.fan_out,
            FanOutReport {
                core: true,
                requests_module: true,
                search: true,
                published: true,
            }
        );

        let core = h.downstream.core_quotes();
        assert_eq!(core.len(), 2);
        assert_eq!(core[1].provider_id, ProviderId::new(2));

        let puts = h.downstream.request_quotes();
        assert_eq!(puts.last().unwrap().quotes.len(), 2);
        assert_eq!(h.downstream.indexed().len(), 2);
        assert_eq!(h.matching.published().len(), 2);
    }

    #[tokio::test]
    async fn downstream_failure_keeps_quote() {
        let h = harness_with(RecordingDownstream::new().with_core_down()).await;

        let receipt = h.service.submit(&submission(1, "99.99")).await.unwrap();
        assert!(!receipt.fan_out.core);
        assert!(receipt.fan_out.requests_module);
        assert!(receipt.fan_out.search);
        assert!(h.quotes.find(RequestId::new(10), ProviderId::new(1)).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn invalid_amounts_are_rejected() {
        let h = harness_with(RecordingDownstream::new()).await;
        for amount in ["0", "-5", "10.005"] {
            let err = h.service.submit(&submission(1, amount)).await.unwrap_err();
            assert_eq!(err.status_code(), 400, "amount {amount}");
        }
        assert!(h.quotes.is_empty());
        assert!(h.downstream.core_quotes().is_empty());
    }

    #[tokio::test]
    async fn unknown_parties_are_not_found() {
        let h = harness_with(RecordingDownstream::new()).await;

        let err = h.service.submit(&submission(9, "10")).await.unwrap_err();
        assert!(err.is_not_found());

        let mut unknown_request = submission(1, "10");
        unknown_request.request_id = RequestId::new(77);
        let err = h.service.submit(&unknown_request).await.unwrap_err();
        assert_eq!(err.status_code(), 404);
    }

    #[test]
    fn submission_wire_names() {
        let parsed: QuoteSubmission = serde_json::from_value(serde_json::json!({
            "solicitudId": 10,
            "prestadorId": 1,
            "monto": "1500.00"
        }))
        .unwrap();
        assert_eq!(parsed.amount, Decimal::new(150_000, 2));
    }
}
