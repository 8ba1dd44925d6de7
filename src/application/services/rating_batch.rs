//! # Rating Batch
//!
//! Appends star ratings to providers.
//!
//! Each batch item is validated completely before anything is written, and
//! is committed on its own: one bad item never blocks the others. A
//! provider can never hold more ratings than completed jobs.

use crate::application::error::{ApplicationError, ApplicationResult};
use crate::application::services::batch::BatchReport;
use crate::domain::entities::Provider;
use crate::domain::value_objects::{ProviderId, RatingScore};
use crate::infrastructure::persistence::ProviderRepository;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One provider's new ratings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingBatchItem {
    /// Provider id.
    #[serde(default)]
    pub id: Option<ProviderId>,
    /// Scores to append; each must be 1 to 5.
    #[serde(default)]
    pub puntuaciones: Option<Vec<Option<i64>>>,
}

impl RatingBatchItem {
    /// Creates an item.
    #[must_use]
    pub fn new(id: ProviderId, scores: &[i64]) -> Self {
        Self {
            id: Some(id),
            puntuaciones: Some(scores.iter().copied().map(Some).collect()),
        }
    }

    fn validated_scores(&self) -> ApplicationResult<Vec<RatingScore>> {
        let raw = match self.puntuaciones.as_deref() {
            Some(raw) if !raw.is_empty() => raw,
            _ => return Err(ApplicationError::validation("invalid item: empty scores")),
        };
        raw.iter()
            .map(|score| {
                let value = score
                    .ok_or_else(|| ApplicationError::validation("null score not allowed"))?;
                Ok(RatingScore::new(value)?)
            })
            .collect()
    }
}

/// Rating batch service.
#[derive(Debug, Clone)]
pub struct RatingBatchService {
    providers: Arc<dyn ProviderRepository>,
}

impl RatingBatchService {
    /// Creates the service.
    #[must_use]
    pub fn new(providers: Arc<dyn ProviderRepository>) -> Self {
        Self { providers }
    }

    /// Appends the ratings of one item.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a missing id, empty or null scores,
    /// or a score outside 1..=5; `NotFound` for an unknown provider; and
    /// a domain error when the rating count would exceed completed jobs.
    pub async fn append(&self, item: &RatingBatchItem) -> ApplicationResult<Provider> {
        let id = item
            .id
            .ok_or_else(|| ApplicationError::validation("invalid item: missing id"))?;
        let scores = item.validated_scores()?;

        let mut provider = self
            .providers
            .get(id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Prestador", id))?;
        provider.append_ratings(&scores)?;
        self.providers.save(&provider).await?;

        tracing::info!(
            provider_id = %id,
            added = scores.len(),
            total = provider.ratings().len(),
            "ratings appended"
        );
        Ok(provider)
    }

    /// Appends every item of a batch, isolating failures per item.
    pub async fn append_batch(&self, items: &[RatingBatchItem]) -> BatchReport {
        let mut report = BatchReport::new(items.len());
        for (index, item) in items.iter().enumerate() {
            match self.append(item).await {
                Ok(_) => report.record_success(),
                Err(e) => {
                    tracing::warn!(index, provider_id = ?item.id, error = %e, "rating item rejected");
                    report.record_failure(index, &e);
                }
            }
        }
        tracing::info!(
            total = report.total,
            succeeded = report.succeeded,
            failed = report.failed(),
            "rating batch processed"
        );
        report
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::infrastructure::persistence::in_memory::InMemoryProviderRepository;

    async fn service() -> (Arc<InMemoryProviderRepository>, RatingBatchService) {
        let providers = Arc::new(InMemoryProviderRepository::new());
        let provider = Provider::new(ProviderId::new(1), "Ana", "Paz")
            .with_completed_jobs(3)
            .with_ratings(vec![RatingScore::new(4).unwrap()]);
        providers.save(&provider).await.unwrap();
        (providers.clone(), RatingBatchService::new(providers))
    }

    #[tokio::test]
    async fn appends_within_job_limit() {
        let (providers, service) = service().await;
        let updated = service
            .append(&RatingBatchItem::new(ProviderId::new(1), &[5, 3]))
            .await
            .unwrap();
        assert_eq!(updated.ratings().len(), 3);

        let stored = providers.get(ProviderId::new(1)).await.unwrap().unwrap();
        let values: Vec<u8> = stored.ratings().iter().map(|r| r.get()).collect();
        assert_eq!(values, vec![4, 5, 3]);
    }

    #[tokio::test]
    async fn over_limit_is_rejected_without_writing() {
        let (providers, service) = service().await;
        let err = service
            .append(&RatingBatchItem::new(ProviderId::new(1), &[5, 5, 5]))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);

        let stored = providers.get(ProviderId::new(1)).await.unwrap().unwrap();
        assert_eq!(stored.ratings().len(), 1);
    }

    #[tokio::test]
    async fn invalid_items_are_validation_errors() {
        let (_, service) = service().await;

        let empty = RatingBatchItem::new(ProviderId::new(1), &[]);
        let out_of_range = RatingBatchItem::new(ProviderId::new(1), &[6]);
        let with_null = RatingBatchItem {
            id: Some(ProviderId::new(1)),
            puntuaciones: Some(vec![Some(3), None]),
        };
        let missing_id = RatingBatchItem {
            id: None,
            puntuaciones: Some(vec![Some(3)]),
        };

        for item in [empty, out_of_range, with_null, missing_id] {
            let err = service.append(&item).await.unwrap_err();
            assert_eq!(err.status_code(), 400, "{item:?}");
        }
    }

    #[tokio::test]
    async fn unknown_provider_is_not_found() {
        let (_, service) = service().await;
        let err = service
            .append(&RatingBatchItem::new(ProviderId::new(42), &[5]))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn batch_isolates_failures() {
        let (providers, service) = service().await;
        let items = vec![
            RatingBatchItem::new(ProviderId::new(42), &[5]),
            RatingBatchItem::new(ProviderId::new(1), &[2]),
            RatingBatchItem::new(ProviderId::new(1), &[9]),
        ];

        let report = service.append_batch(&items).await;
        assert_eq!(report.total, 3);
        assert_eq!(report.succeeded, 1);
        assert_eq!(report.errors[0].index, 0);
        assert_eq!(report.errors[0].status, 404);
        assert_eq!(report.errors[1].index, 2);

        let stored = providers.get(ProviderId::new(1)).await.unwrap().unwrap();
        assert_eq!(stored.ratings().len(), 2);
    }

    #[test]
    fn item_accepts_null_scores_on_the_wire() {
        let item: RatingBatchItem =
            serde_json::from_str(r#"{"id": 1, "puntuaciones": [5, null]}"#).unwrap();
        assert_eq!(item.puntuaciones, Some(vec![Some(5), None]));
    }
}
