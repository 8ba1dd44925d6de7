//! # Bootstrap
//!
//! Wires repositories, integrations and services into an [`AppState`].
//!
//! ```ignore
//! let settings = Settings::load()?;
//! let app = Application::build(&settings, Repositories::in_memory())?;
//! tokio::spawn(async move { app.reconciler.reconcile().await });
//! axum::serve(listener, app.router()).await?;
//! ```

use crate::api::rest::{AppState, ResponseFactory, create_router};
use crate::application::services::{
    CatalogSyncService, EventHandlers, InvitationWorkflow, ProviderRanker, ProviderSyncService,
    QuoteSubmissionService, RatingBatchService, SubscriptionReconciler, SubscriptionService,
    Top3Publisher, WebhookIntake,
};
use crate::config::{DownstreamMode, Settings};
use crate::infrastructure::integrations::{
    CoreQuotesClient, HttpDownstreamClient, HttpMatchingClient, IntegrationResult,
    InvitationSender, LoggingStub, MatchingApi, RequestsModuleClient, SearchIndexClient,
};
use crate::infrastructure::persistence::in_memory::{
    InMemoryCatalogRepository, InMemoryInvitationRepository, InMemoryProviderRepository,
    InMemoryQuoteRepository, InMemoryServiceRequestRepository, InMemoryWebhookEventRepository,
};
use crate::infrastructure::persistence::postgres::{
    PostgresInvitationRepository, PostgresQuoteRepository, PostgresWebhookEventStore,
};
use crate::infrastructure::persistence::{
    CatalogRepository, InvitationRepository, ProviderRepository, QuoteRepository,
    ServiceRequestRepository, WebhookEventRepository,
};
use axum::Router;
use sqlx::PgPool;
use std::sync::Arc;

/// The repository set used by the services.
#[derive(Debug, Clone)]
pub struct Repositories {
    /// Providers.
    pub providers: Arc<dyn ProviderRepository>,
    /// Service requests.
    pub requests: Arc<dyn ServiceRequestRepository>,
    /// Quotes.
    pub quotes: Arc<dyn QuoteRepository>,
    /// Invitations.
    pub invitations: Arc<dyn InvitationRepository>,
    /// Webhook log.
    pub events: Arc<dyn WebhookEventRepository>,
    /// Categories and skills.
    pub catalog: Arc<dyn CatalogRepository>,
}

impl Repositories {
    /// All repositories in memory.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            providers: Arc::new(InMemoryProviderRepository::new()),
            requests: Arc::new(InMemoryServiceRequestRepository::new()),
            quotes: Arc::new(InMemoryQuoteRepository::new()),
            invitations: Arc::new(InMemoryInvitationRepository::new()),
            events: Arc::new(InMemoryWebhookEventRepository::new()),
            catalog: Arc::new(InMemoryCatalogRepository::new()),
        }
    }

    /// Quotes, invitations and the webhook log in PostgreSQL; the rest in
    /// memory.
    #[must_use]
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            quotes: Arc::new(PostgresQuoteRepository::new(pool.clone())),
            invitations: Arc::new(PostgresInvitationRepository::new(pool.clone())),
            events: Arc::new(PostgresWebhookEventStore::new(pool)),
            ..Self::in_memory()
        }
    }
}

/// Outbound collaborators.
#[derive(Debug, Clone)]
pub struct Integrations {
    /// Matching broker.
    pub matching: Arc<dyn MatchingApi>,
    /// Invitation notifications.
    pub invitations: Arc<dyn InvitationSender>,
    /// Core quotes module.
    pub core_quotes: Arc<dyn CoreQuotesClient>,
    /// Requests module.
    pub requests_module: Arc<dyn RequestsModuleClient>,
    /// Search indexer.
    pub search: Arc<dyn SearchIndexClient>,
}

impl Integrations {
    /// Builds the HTTP broker client and the downstream clients for the
    /// configured mode.
    ///
    /// # Errors
    ///
    /// Returns an `IntegrationError` if an HTTP client cannot be built.
    pub fn from_settings(settings: &Settings) -> IntegrationResult<Self> {
        let matching: Arc<dyn MatchingApi> = Arc::new(HttpMatchingClient::from_settings(
            &settings.integrations.matching,
        )?);
        let downstream = &settings.integrations.downstream;
        match downstream.mode {
            DownstreamMode::Stub => Ok(Self::with_downstream(matching, Arc::new(LoggingStub::new()))),
            DownstreamMode::Http => Ok(Self::with_downstream(
                matching,
                Arc::new(HttpDownstreamClient::from_settings(downstream)?),
            )),
        }
    }

    /// Uses one object for all four downstream ports.
    pub fn with_downstream<D>(matching: Arc<dyn MatchingApi>, downstream: Arc<D>) -> Self
    where
        D: InvitationSender + CoreQuotesClient + RequestsModuleClient + SearchIndexClient + 'static,
    {
        Self {
            matching,
            invitations: downstream.clone(),
            core_quotes: downstream.clone(),
            requests_module: downstream.clone(),
            search: downstream,
        }
    }
}

/// A wired application.
#[derive(Debug, Clone)]
pub struct Application {
    /// Handler state.
    pub state: AppState,
    /// Startup subscription reconciliation.
    pub reconciler: Arc<SubscriptionReconciler>,
}

impl Application {
    /// Wires the services from settings and the given repositories.
    ///
    /// # Errors
    ///
    /// Returns an `IntegrationError` if an HTTP client cannot be built.
    pub fn build(settings: &Settings, repos: Repositories) -> IntegrationResult<Self> {
        let integrations = Integrations::from_settings(settings)?;
        Ok(Self::with_integrations(settings, repos, integrations))
    }

    /// Wires the services with explicit integrations.
    #[must_use]
    pub fn with_integrations(
        settings: &Settings,
        repos: Repositories,
        integrations: Integrations,
    ) -> Self {
        let matching_settings = &settings.integrations.matching;
        let publisher = Top3Publisher::new(integrations.matching.clone(), matching_settings);
        let ranker = ProviderRanker::new(
            repos.providers.clone(),
            repos.quotes.clone(),
            repos.catalog.clone(),
        );

        let workflow = InvitationWorkflow::new(
            repos.requests.clone(),
            repos.providers.clone(),
            repos.invitations.clone(),
            repos.catalog.clone(),
            ranker,
            integrations.invitations.clone(),
            publisher.clone(),
        )
        .with_limits(settings.invitations);

        let quotes = QuoteSubmissionService::new(
            repos.requests.clone(),
            repos.providers.clone(),
            repos.quotes.clone(),
            integrations.core_quotes.clone(),
            integrations.requests_module.clone(),
            integrations.search.clone(),
            publisher,
        )
        .with_limits(settings.invitations);

        let subscriptions =
            SubscriptionService::new(integrations.matching.clone(), &settings.module_response);
        let reconciler = SubscriptionReconciler::new(
            integrations.matching.clone(),
            subscriptions.clone(),
            matching_settings,
        );
        let provider_sync = ProviderSyncService::new(repos.providers.clone(), repos.catalog.clone());
        let webhooks = WebhookIntake::new(
            integrations.matching.clone(),
            repos.events.clone(),
            EventHandlers {
                workflow: workflow.clone(),
                quotes: quotes.clone(),
                providers: provider_sync.clone(),
                catalog: CatalogSyncService::new(repos.catalog.clone()),
            },
        );

        let state = AppState {
            responses: ResponseFactory::new(&settings.module_response),
            workflow: Arc::new(workflow),
            quotes: Arc::new(quotes),
            ratings: Arc::new(RatingBatchService::new(repos.providers.clone())),
            provider_sync: Arc::new(provider_sync),
            subscriptions: Arc::new(subscriptions),
            webhooks: Arc::new(webhooks),
        };

        tracing::info!(
            broker = %matching_settings.base_url,
            api_key = %matching_settings.masked_api_key(),
            downstream = ?settings.integrations.downstream.mode,
            publish = matching_settings.publish_enabled,
            "application wired"
        );

        Self {
            state,
            reconciler: Arc::new(reconciler),
        }
    }

    /// Router with state applied.
    #[must_use]
    pub fn router(&self) -> Router {
        create_router().with_state(self.state.clone())
    }
}
