//! # Subscription Reconciliation
//!
//! Makes sure every configured topic is subscribed for our webhook, once,
//! at startup.
//!
//! ```text
//! list remote ──► topics already pointing at our webhook
//!      │
//!      └── for each target:  present? skip
//!                            subscribe ──► ok: remember topic
//!                                      └─► 4xx "ya existe": absorbed
//!                                      └─► anything else: logged, next
//! ```
//!
//! Nothing here is fatal. A failed listing is treated as "nothing
//! subscribed yet"; a failed subscription is reported and the loop goes on.

use crate::application::services::subscriptions::SubscriptionService;
use crate::config::{MatchingSettings, SubscriptionTarget};
use crate::infrastructure::integrations::traits::MatchingApi;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Why reconciliation did not run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileSkip {
    /// Auto-subscribe is disabled.
    Disabled,
    /// No API key is configured.
    MissingApiKey,
    /// The webhook URL is blank.
    MissingWebhookUrl,
    /// No targets are configured.
    NoTargets,
}

impl fmt::Display for ReconcileSkip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => write!(f, "auto-subscribe disabled"),
            Self::MissingApiKey => write!(f, "API key missing"),
            Self::MissingWebhookUrl => write!(f, "webhook URL missing"),
            Self::NoTargets => write!(f, "no targets configured"),
        }
    }
}

/// Outcome of a reconciliation pass, by topic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Set when the pass did not run at all.
    pub skipped: Option<ReconcileSkip>,
    /// Newly subscribed.
    pub subscribed: Vec<String>,
    /// Already subscribed for our webhook.
    pub already_present: Vec<String>,
    /// Rejected by the broker as already existing.
    pub absorbed: Vec<String>,
    /// Failed for any other reason.
    pub failed: Vec<String>,
}

impl ReconcileReport {
    fn skipped(reason: ReconcileSkip) -> Self {
        Self {
            skipped: Some(reason),
            ..Self::default()
        }
    }

    /// Returns true if the pass ran and nothing failed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.skipped.is_none() && self.failed.is_empty()
    }
}

/// Startup subscription reconciler.
#[derive(Debug, Clone)]
pub struct SubscriptionReconciler {
    matching: Arc<dyn MatchingApi>,
    subscriptions: SubscriptionService,
    enabled: bool,
    has_api_key: bool,
    targets: Vec<SubscriptionTarget>,
}

impl SubscriptionReconciler {
    /// Creates a reconciler for the configured targets.
    #[must_use]
    pub fn new(
        matching: Arc<dyn MatchingApi>,
        subscriptions: SubscriptionService,
        settings: &MatchingSettings,
    ) -> Self {
        Self {
            matching,
            subscriptions,
            enabled: settings.auto_subscribe_enabled,
            has_api_key: settings.has_api_key(),
            targets: settings.auto_subscriptions.clone(),
        }
    }

    fn skip_reason(&self) -> Option<ReconcileSkip> {
        if !self.enabled {
            Some(ReconcileSkip::Disabled)
        } else if !self.has_api_key {
            Some(ReconcileSkip::MissingApiKey)
        } else if self.subscriptions.webhook_url().is_empty() {
            Some(ReconcileSkip::MissingWebhookUrl)
        } else if self.targets.is_empty() {
            Some(ReconcileSkip::NoTargets)
        } else {
            None
        }
    }

    /// Runs one reconciliation pass.
    pub async fn reconcile(&self) -> ReconcileReport {
        if let Some(reason) = self.skip_reason() {
            match reason {
                ReconcileSkip::Disabled => {
                    tracing::info!(reason = %reason, "skipping startup subscription");
                }
                _ => tracing::warn!(reason = %reason, "skipping startup subscription"),
            }
            return ReconcileReport::skipped(reason);
        }

        let webhook_url = self.subscriptions.webhook_url();
        let mut existing = self.existing_topics(webhook_url).await;
        let mut report = ReconcileReport::default();

        for target in &self.targets {
            let topic = target.topic();
            let key = topic.to_lowercase();
            if existing.contains(&key) {
                tracing::info!(topic = %topic, webhook_url, "subscription already present");
                report.already_present.push(topic);
                continue;
            }

            let result = self
                .subscriptions
                .subscribe(&topic, &target.resolved_event_name())
                .await;
            if result.success {
                tracing::info!(topic = %topic, event_name = ?result.event_name, "subscription ensured");
                existing.insert(key);
                report.subscribed.push(topic);
            } else if result.is_already_exists() {
                tracing::info!(topic = %topic, status = result.status, "broker reports subscription already exists");
                existing.insert(key);
                report.absorbed.push(topic);
            } else {
                tracing::error!(
                    topic = %topic,
                    status = result.status,
                    error = ?result.error,
                    "failed to ensure subscription"
                );
                report.failed.push(topic);
            }
        }

        tracing::info!(
            subscribed = report.subscribed.len(),
            already_present = report.already_present.len(),
            absorbed = report.absorbed.len(),
            failed = report.failed.len(),
            "subscription reconciliation finished"
        );
        report
    }

    async fn existing_topics(&self, webhook_url: &str) -> HashSet<String> {
        match self.matching.list_subscriptions().await {
            Ok(subscriptions) => subscriptions
                .iter()
                .filter(|s| s.targets_webhook(webhook_url))
                .filter_map(|s| s.topic.as_deref())
                .map(|t| t.trim().to_lowercase())
                .collect(),
            Err(e) => {
                tracing::warn!(
                    status = e.response_status(),
                    error = %e,
                    "could not list existing subscriptions, subscribing anyway"
                );
                HashSet::new()
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::application::services::testing::RecordingMatching;
    use crate::config::ModuleResponseSettings;
    use crate::infrastructure::integrations::IntegrationError;
    use crate::infrastructure::integrations::payloads::SubscriptionDetails;

    const WEBHOOK: &str = "https://matching.example.com/api/webhook";

    fn settings(targets: Vec<SubscriptionTarget>) -> MatchingSettings {
        MatchingSettings {
            base_url: "http://broker".to_string(),
            api_key: Some("key-123456".to_string()),
            auto_subscribe_enabled: true,
            auto_subscriptions: targets,
            ..MatchingSettings::default()
        }
    }

    fn reconciler(
        matching: RecordingMatching,
        settings: &MatchingSettings,
        webhook_url: &str,
    ) -> (Arc<RecordingMatching>, SubscriptionReconciler) {
        let matching = Arc::new(matching);
        let module = ModuleResponseSettings {
            webhook_url: webhook_url.to_string(),
            ..ModuleResponseSettings::default()
        };
        let service = SubscriptionService::new(matching.clone(), &module);
        (
            matching.clone(),
            SubscriptionReconciler::new(matching, service, settings),
        )
    }

    fn remote(topic: &str, webhook_url: &str) -> SubscriptionDetails {
        SubscriptionDetails {
            subscription_id: Some(format!("sub-{topic}")),
            webhook_url: Some(webhook_url.to_string()),
            topic: Some(topic.to_string()),
            ..SubscriptionDetails::default()
        }
    }

    fn targets() -> Vec<SubscriptionTarget> {
        vec![
            SubscriptionTarget::new("search", "solicitud", "creada"),
            SubscriptionTarget::new("search", "solicitud", "cancelada"),
        ]
    }

    #[tokio::test]
    async fn existing_topic_for_our_webhook_is_not_resubscribed() {
        let existing = vec![
            remote("SEARCH.solicitud.creada", " HTTPS://matching.example.com/api/webhook "),
            remote("search.solicitud.cancelada", "https://someone-else.example.com"),
        ];
        let (matching, reconciler) =
            reconciler(RecordingMatching::new().with_existing(existing), &settings(targets()), WEBHOOK);

        let report = reconciler.reconcile().await;
        assert_eq!(report.already_present, vec!["search.solicitud.creada"]);
        assert_eq!(report.subscribed, vec!["search.solicitud.cancelada"]);

        let sent = matching.subscribed();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].event_name, "cancelada");
        assert!(report.is_complete());
    }

    #[tokio::test]
    async fn already_exists_is_absorbed_and_other_failures_continue() {
        let matching = RecordingMatching::new()
            .with_list_error(IntegrationError::timeout("slow broker"))
            .with_subscribe_errors(vec![
                IntegrationError::http(400, "La suscripción ya existe"),
                IntegrationError::http(500, "boom"),
            ]);
        let mut all = targets();
        all.push(SubscriptionTarget::new("catalogo", "prestador", "alta"));
        let (matching, reconciler) = reconciler(matching, &settings(all), WEBHOOK);

        let report = reconciler.reconcile().await;
        assert_eq!(report.absorbed, vec!["search.solicitud.creada"]);
        assert_eq!(report.failed, vec!["search.solicitud.cancelada"]);
        assert_eq!(report.subscribed, vec!["catalogo.prestador.alta"]);
        assert_eq!(matching.subscribed().len(), 3);
        assert!(!report.is_complete());
    }

    #[tokio::test]
    async fn duplicate_targets_subscribe_once() {
        let mut dup = targets();
        dup.push(SubscriptionTarget::new("search", "solicitud", "creada"));
        let (matching, reconciler) = reconciler(RecordingMatching::new(), &settings(dup), WEBHOOK);

        let report = reconciler.reconcile().await;
        assert_eq!(report.subscribed.len(), 2);
        assert_eq!(report.already_present, vec!["search.solicitud.creada"]);
        assert_eq!(matching.subscribed().len(), 2);
    }

    #[tokio::test]
    async fn skip_conditions() {
        let mut disabled = settings(targets());
        disabled.auto_subscribe_enabled = false;
        let (matching, r) = reconciler(RecordingMatching::new(), &disabled, WEBHOOK);
        assert_eq!(r.reconcile().await.skipped, Some(ReconcileSkip::Disabled));
        assert!(matching.subscribed().is_empty());

        let mut keyless = settings(targets());
        keyless.api_key = Some("  ".to_string());
        let (_, r) = reconciler(RecordingMatching::new(), &keyless, WEBHOOK);
        assert_eq!(r.reconcile().await.skipped, Some(ReconcileSkip::MissingApiKey));

        let (_, r) = reconciler(RecordingMatching::new(), &settings(targets()), "   ");
        assert_eq!(r.reconcile().await.skipped, Some(ReconcileSkip::MissingWebhookUrl));

        let (_, r) = reconciler(RecordingMatching::new(), &settings(Vec::new()), WEBHOOK);
        assert_eq!(r.reconcile().await.skipped, Some(ReconcileSkip::NoTargets));
    }
}
