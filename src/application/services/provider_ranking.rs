//! # Provider Ranking
//!
//! Scores and orders providers for invitation.
//!
//! The default [`ReputationStrategy`] scores each provider as
//!
//! ```text
//! score = avg(ratings) / 5 + 0.2 * ln(1 + completed_jobs)
//! ```
//!
//! with 0 for the rating term when there are no ratings. Ties are broken
//! by completed jobs (more first), hourly price (cheaper first, unknown
//! last), surname, first name and finally provider id, so the order is
//! total and the ranking deterministic.
//!
//! [`ProviderRanker`] adds candidate selection on top: eligibility, quote
//! exclusion and the skill-then-category fill used by the invitation
//! workflow.
//!
//! # Examples
//!
//! ```
//! use matching_service::application::services::provider_ranking::{
//!     ProviderRankingStrategy, ReputationStrategy,
//! };
//! use matching_service::domain::entities::Provider;
//! use matching_service::domain::value_objects::{ProviderId, RatingScore};
//!
//! let rookie = Provider::new(ProviderId::new(1), "Ana", "Sosa").with_status("ACTIVO");
//! let veteran = Provider::new(ProviderId::new(2), "Luis", "Paz")
//!     .with_status("ACTIVO")
//!     .with_completed_jobs(5)
//!     .with_ratings(vec![RatingScore::new(1).unwrap()]);
//!
//! let ranked = ReputationStrategy::new().rank(&[rookie, veteran]);
//! assert_eq!(ranked[0].provider.id(), ProviderId::new(2));
//! assert_eq!(ranked[0].rank, 1);
//! ```

use crate::application::error::ApplicationResult;
use crate::domain::entities::{Provider, ServiceRequest};
use crate::domain::value_objects::{CategoryId, ProviderId, RequestId};
use crate::infrastructure::persistence::{CatalogRepository, ProviderRepository, QuoteRepository};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Weight of the experience term.
pub const EXPERIENCE_WEIGHT: f64 = 0.2;

/// Highest rating score, used to normalise the average.
const MAX_RATING: f64 = 5.0;

/// A provider with its ranking information.
#[derive(Debug, Clone, Serialize)]
pub struct RankedProvider {
    /// The ranked provider.
    pub provider: Provider,
    /// The rank (1 = best).
    pub rank: usize,
    /// The score used for ranking (higher = better).
    pub score: f64,
}

impl RankedProvider {
    /// Creates a new ranked provider.
    #[must_use]
    pub fn new(provider: Provider, rank: usize, score: f64) -> Self {
        Self {
            provider,
            rank,
            score,
        }
    }

    /// Returns true if this provider is the best (rank 1).
    #[must_use]
    pub fn is_best(&self) -> bool {
        self.rank == 1
    }
}

impl fmt::Display for RankedProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RankedProvider(#{} score={:.4} provider={})",
            self.rank,
            self.score,
            self.provider.id()
        )
    }
}

/// Trait for provider ranking strategies.
pub trait ProviderRankingStrategy: Send + Sync + fmt::Debug {
    /// Ranks the eligible providers, best first.
    ///
    /// Ineligible providers are dropped; ranks start at 1.
    fn rank(&self, providers: &[Provider]) -> Vec<RankedProvider>;

    /// Returns the name of this ranking strategy.
    fn name(&self) -> &'static str;
}

/// Computes the reputation score of a provider.
#[must_use]
pub fn reputation_score(provider: &Provider) -> f64 {
    let rating_term = provider.average_rating().unwrap_or(0.0) / MAX_RATING;
    let experience_term = EXPERIENCE_WEIGHT * f64::from(provider.completed_jobs()).ln_1p();
    rating_term + experience_term
}

/// Total order between two scored providers, best first.
fn compare(a: &(f64, &Provider), b: &(f64, &Provider)) -> Ordering {
    let (score_a, pa) = *a;
    let (score_b, pb) = *b;
    score_b
        .total_cmp(&score_a)
        .then_with(|| pb.completed_jobs().cmp(&pa.completed_jobs()))
        .then_with(|| match (pa.hourly_price(), pb.hourly_price()) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| pa.last_name().cmp(pb.last_name()))
        .then_with(|| pa.first_name().cmp(pb.first_name()))
        .then_with(|| pa.id().cmp(&pb.id()))
}

/// Reputation ranking strategy.
///
/// Only providers whose status is `ACTIVO` (any case) are eligible.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReputationStrategy;

impl ReputationStrategy {
    /// Creates a new reputation strategy.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ProviderRankingStrategy for ReputationStrategy {
    fn rank(&self, providers: &[Provider]) -> Vec<RankedProvider> {
        let mut scored: Vec<(f64, &Provider)> = providers
            .iter()
            .filter(|p| p.is_active())
            .map(|p| (reputation_score(p), p))
            .collect();

        scored.sort_by(compare);

        scored
            .into_iter()
            .enumerate()
            .map(|(i, (score, p))| RankedProvider::new(p.clone(), i + 1, score))
            .collect()
    }

    fn name(&self) -> &'static str {
        "Reputation"
    }
}

/// Candidate selection over the provider, quote and catalog stores.
#[derive(Debug, Clone)]
pub struct ProviderRanker {
    providers: Arc<dyn ProviderRepository>,
    quotes: Arc<dyn QuoteRepository>,
    catalog: Arc<dyn CatalogRepository>,
    strategy: Arc<dyn ProviderRankingStrategy>,
}

impl ProviderRanker {
    /// Creates a ranker using [`ReputationStrategy`].
    #[must_use]
    pub fn new(
        providers: Arc<dyn ProviderRepository>,
        quotes: Arc<dyn QuoteRepository>,
        catalog: Arc<dyn CatalogRepository>,
    ) -> Self {
        Self {
            providers,
            quotes,
            catalog,
            strategy: Arc::new(ReputationStrategy::new()),
        }
    }

    /// Ranks the eligible providers of a category.
    ///
    /// Providers that already quoted `exclude_quoted_for` are skipped. The
    /// result holds at most `limit` entries, ranked from 1.
    ///
    /// # Errors
    ///
    /// Returns an error if a repository lookup fails.
    pub async fn top_for_category(
        &self,
        category_id: CategoryId,
        exclude_quoted_for: Option<RequestId>,
        limit: usize,
    ) -> ApplicationResult<Vec<RankedProvider>> {
        let excluded = self.quoted_providers(exclude_quoted_for).await?;
        let pool = self.category_pool(category_id).await?;
        Ok(self.rank_pool(&pool, &excluded, limit))
    }

    /// Selects up to `limit` candidates for a request.
    ///
    /// Providers offering the request's skill come first; remaining slots
    /// are filled from the category, skipping providers already chosen.
    /// When `exclude_quoted` is set, providers that already quoted the
    /// request are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if a repository lookup fails.
    pub async fn select_candidates(
        &self,
        request: &ServiceRequest,
        category_id: Option<CategoryId>,
        limit: usize,
        exclude_quoted: bool,
    ) -> ApplicationResult<Vec<RankedProvider>> {
        self.select_candidates_excluding(request, category_id, limit, exclude_quoted, &HashSet::new())
            .await
    }

    /// Same as [`Self::select_candidates`], also skipping `skip`.
    ///
    /// Skipped providers are removed before ranking, so they never take one
    /// of the `limit` slots.
    ///
    /// # Errors
    ///
    /// Returns an error if a repository lookup fails.
    pub async fn select_candidates_excluding(
        &self,
        request: &ServiceRequest,
        category_id: Option<CategoryId>,
        limit: usize,
        exclude_quoted: bool,
        skip: &HashSet<ProviderId>,
    ) -> ApplicationResult<Vec<RankedProvider>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let mut excluded = self
            .quoted_providers(exclude_quoted.then_some(request.id()))
            .await?;
        excluded.extend(skip.iter().copied());
        tracing::debug!(
            request_id = %request.id(),
            strategy = self.strategy.name(),
            excluded = excluded.len(),
            limit,
            "selecting candidates"
        );

        let mut selection: Vec<Provider> = Vec::with_capacity(limit);
        if let Some(skill) = request.skill_id() {
            let pool = self.providers.find_by_any_skill(&[skill]).await?;
            for ranked in self.rank_pool(&pool, &excluded, limit) {
                excluded.insert(ranked.provider.id());
                selection.push(ranked.provider);
            }
        }

        if selection.len() < limit {
            if let Some(category) = category_id {
                let pool = self.category_pool(category).await?;
                let remaining = limit - selection.len();
                for ranked in self.rank_pool(&pool, &excluded, remaining) {
                    excluded.insert(ranked.provider.id());
                    selection.push(ranked.provider);
                }
            }
        }

        Ok(selection
            .into_iter()
            .enumerate()
            .map(|(i, provider)| {
                let score = reputation_score(&provider);
                RankedProvider::new(provider, i + 1, score)
            })
            .collect())
    }

    async fn category_pool(&self, category_id: CategoryId) -> ApplicationResult<Vec<Provider>> {
        let skills: Vec<_> = self
            .catalog
            .skills_in_category(category_id)
            .await?
            .into_iter()
            .map(|s| s.id)
            .collect();
        if skills.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.providers.find_by_any_skill(&skills).await?)
    }

    async fn quoted_providers(
        &self,
        request_id: Option<RequestId>,
    ) -> ApplicationResult<HashSet<ProviderId>> {
        let Some(request_id) = request_id else {
            return Ok(HashSet::new());
        };
        Ok(self
            .quotes
            .find_by_request(request_id)
            .await?
            .iter()
            .map(|q| q.provider_id())
            .collect())
    }

    fn rank_pool(
        &self,
        pool: &[Provider],
        excluded: &HashSet<ProviderId>,
        limit: usize,
    ) -> Vec<RankedProvider> {
        let eligible: Vec<Provider> = pool
            .iter()
            .filter(|p| !excluded.contains(&p.id()))
            .cloned()
            .collect();
        self.strategy
            .rank(&eligible)
            .into_iter()
            .take(limit)
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::domain::entities::{Category, Skill};
    use crate::domain::value_objects::{QuoteAmount, RatingScore, SkillId};
    use crate::infrastructure::persistence::in_memory::{
        InMemoryCatalogRepository, InMemoryProviderRepository, InMemoryQuoteRepository,
    };
    use proptest::prelude::*;
    use rust_decimal::Decimal;

    fn provider(id: i64, last: &str, jobs: u32, ratings: &[i64]) -> Provider {
        Provider::new(ProviderId::new(id), "Nombre", last)
            .with_status("ACTIVO")
            .with_completed_jobs(jobs)
            .with_ratings(ratings.iter().map(|r| RatingScore::new(*r).unwrap()).collect())
    }

    fn ids(ranked: &[RankedProvider]) -> Vec<i64> {
        ranked.iter().map(|r| r.provider.id().get()).collect()
    }

    #[test]
    fn experience_beats_nothing() {
        let p1 = provider(1, "A", 0, &[]);
        let p2 = provider(2, "B", 5, &[1]);
        assert_eq!(reputation_score(&p1), 0.0);
        let expected = 0.2 + 0.2 * 6.0_f64.ln();
        assert!((reputation_score(&p2) - expected).abs() < 1e-9);

        let ranked = ReputationStrategy::new().rank(&[p1, p2]);
        assert_eq!(ids(&ranked), vec![2, 1]);
        assert!(ranked[0].is_best());
        assert_eq!(ranked[1].rank, 2);
    }

    #[test]
    fn inactive_providers_are_dropped() {
        let active = provider(1, "A", 1, &[5]).with_status(" activo ");
        let inactive = provider(2, "B", 10, &[5]).with_status("SUSPENDIDO");
        let ranked = ReputationStrategy::new().rank(&[active, inactive]);
        assert_eq!(ids(&ranked), vec![1]);
    }

    #[test]
    fn ties_break_on_price_then_names_then_id() {
        let cheap = provider(3, "Zeta", 2, &[4]).with_hourly_price(Some(Decimal::from(10)));
        let pricey = provider(4, "Alfa", 2, &[4]).with_hourly_price(Some(Decimal::from(20)));
        let unknown = provider(5, "Alfa", 2, &[4]);
        let twin_a = provider(7, "Alfa", 2, &[4]).with_hourly_price(Some(Decimal::from(20)));

        let ranked =
            ReputationStrategy::new().rank(&[unknown, twin_a, pricey, cheap]);
        assert_eq!(ids(&ranked), vec![3, 4, 7, 5]);
    }

    #[test]
    fn identical_profiles_order_by_id() {
        let a = provider(9, "Same", 3, &[3]);
        let b = provider(8, "Same", 3, &[3]);
        let ranked = ReputationStrategy::new().rank(&[a, b]);
        assert_eq!(ids(&ranked), vec![8, 9]);
    }

    #[test]
    fn empty_pool_is_empty() {
        assert!(ReputationStrategy::new().rank(&[]).is_empty());
        assert_eq!(ReputationStrategy::new().name(), "Reputation");
    }

    proptest! {
        #[test]
        fn ranking_is_deterministic(
            specs in proptest::collection::vec((0u32..50, proptest::collection::vec(1i64..=5, 0..5)), 0..12)
        ) {
            let pool: Vec<Provider> = specs
                .iter()
                .enumerate()
                .map(|(i, (jobs, ratings))| provider(i as i64 + 1, "X", *jobs, ratings))
                .collect();
            let mut reversed = pool.clone();
            reversed.reverse();

            let strategy = ReputationStrategy::new();
            let first = ids(&strategy.rank(&pool));
            prop_assert_eq!(&first, &ids(&strategy.rank(&pool)));
            prop_assert_eq!(&first, &ids(&strategy.rank(&reversed)));

            let ranked = strategy.rank(&pool);
            for pair in ranked.windows(2) {
                prop_assert!(pair[0].score >= pair[1].score);
            }
        }
    }

    struct Fixture {
        providers: Arc<InMemoryProviderRepository>,
        quotes: Arc<InMemoryQuoteRepository>,
        ranker: ProviderRanker,
    }

    async fn fixture() -> Fixture {
        let providers = Arc::new(InMemoryProviderRepository::new());
        let quotes = Arc::new(InMemoryQuoteRepository::new());
        let catalog = Arc::new(InMemoryCatalogRepository::new());

        catalog.save_category(&Category::new(CategoryId::new(1), "Plomería")).await.unwrap();
        catalog
            .save_skill(&Skill::new(SkillId::new(10), "Cañerías", CategoryId::new(1)))
            .await
            .unwrap();
        catalog
            .save_skill(&Skill::new(SkillId::new(11), "Termotanques", CategoryId::new(1)))
            .await
            .unwrap();

        let ranker = ProviderRanker::new(providers.clone(), quotes.clone(), catalog);
        Fixture {
            providers,
            quotes,
            ranker,
        }
    }

    #[tokio::test]
    async fn top_for_category_excludes_quoted_and_limits() {
        let f = fixture().await;
        for (id, jobs) in [(1, 10), (2, 8), (3, 6), (4, 4)] {
            let p = provider(id, "P", jobs, &[5]).with_skills(vec![SkillId::new(11)]);
            f.providers.save(&p).await.unwrap();
        }
        f.quotes
            .upsert(
                RequestId::new(50),
                ProviderId::new(1),
                QuoteAmount::new(Decimal::from(100)).unwrap(),
                1,
            )
            .await
            .unwrap();

        let top = f
            .ranker
            .top_for_category(CategoryId::new(1), Some(RequestId::new(50)), 2)
            .await
            .unwrap();
        assert_eq!(ids(&top), vec![2, 3]);
        assert_eq!(top[0].rank, 1);

        let unfiltered = f
            .ranker
            .top_for_category(CategoryId::new(1), None, 3)
            .await
            .unwrap();
        assert_eq!(ids(&unfiltered), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn unknown_category_is_empty() {
        let f = fixture().await;
        let top = f
            .ranker
            .top_for_category(CategoryId::new(99), None, 3)
            .await
            .unwrap();
        assert!(top.is_empty());
    }

    #[tokio::test]
    async fn skill_matches_come_before_category_fill() {
        let f = fixture().await;
        // Strong provider only in the category, weaker one with the exact skill.
        let strong = provider(1, "Fuerte", 40, &[5]).with_skills(vec![SkillId::new(11)]);
        let exact = provider(2, "Exacto", 1, &[3]).with_skills(vec![SkillId::new(10)]);
        f.providers.save(&strong).await.unwrap();
        f.providers.save(&exact).await.unwrap();

        let request = ServiceRequest::new(RequestId::new(5), "Pérdida")
            .with_skill(Some(SkillId::new(10)));
        let selected = f
            .ranker
            .select_candidates(&request, Some(CategoryId::new(1)), 3, false)
            .await
            .unwrap();
        assert_eq!(ids(&selected), vec![2, 1]);
        assert_eq!(selected[1].rank, 2);
    }

    #[tokio::test]
    async fn category_fill_skips_duplicates() {
        let f = fixture().await;
        let both = provider(1, "Ambos", 5, &[4])
            .with_skills(vec![SkillId::new(10), SkillId::new(11)]);
        f.providers.save(&both).await.unwrap();

        let request = ServiceRequest::new(RequestId::new(5), "Pérdida")
            .with_skill(Some(SkillId::new(10)));
        let selected = f
            .ranker
            .select_candidates(&request, Some(CategoryId::new(1)), 3, false)
            .await
            .unwrap();
        assert_eq!(ids(&selected), vec![1]);
    }

    #[tokio::test]
    async fn skipped_providers_do_not_take_slots() {
        let f = fixture().await;
        for (id, jobs) in [(1, 10), (2, 8), (3, 6), (4, 4)] {
            let p = provider(id, "P", jobs, &[5]).with_skills(vec![SkillId::new(11)]);
            f.providers.save(&p).await.unwrap();
        }

        let request = ServiceRequest::new(RequestId::new(6), "Termotanque");
        let skip = HashSet::from([ProviderId::new(1), ProviderId::new(2)]);
        let selected = f
            .ranker
            .select_candidates_excluding(&request, Some(CategoryId::new(1)), 2, false, &skip)
            .await
            .unwrap();
        assert_eq!(ids(&selected), vec![3, 4]);
        assert_eq!(selected[0].rank, 1);
    }
}
