//! # Subscription Management
//!
//! Manual create, list and delete of Matching broker subscriptions.
//!
//! Broker failures are not errors here: every call produces a
//! [`SubscriptionResult`] carrying the remote status and body, which the
//! REST layer echoes with the same status. Only malformed commands are
//! rejected with an [`ApplicationError`].

use crate::application::error::{ApplicationError, ApplicationResult};
use crate::config::ModuleResponseSettings;
use crate::infrastructure::integrations::IntegrationError;
use crate::infrastructure::integrations::payloads::{SubscribeRequest, SubscriptionDetails};
use crate::infrastructure::integrations::traits::MatchingApi;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Normalized outcome of a subscribe or unsubscribe call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionResult {
    /// Whether the broker answered 2xx.
    pub success: bool,
    /// Topic involved, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    /// Event name involved, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_name: Option<String>,
    /// Broker status, or 502 when the broker was unreachable.
    #[serde(rename = "statusCode")]
    pub status: u16,
    /// Raw error body or client error message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SubscriptionResult {
    fn accepted(topic: Option<String>, event_name: Option<String>, status: u16) -> Self {
        Self {
            success: true,
            topic,
            event_name,
            status,
            error: None,
        }
    }

    fn rejected(topic: Option<String>, event_name: Option<String>, error: &IntegrationError) -> Self {
        Self {
            success: false,
            topic,
            event_name,
            status: error.response_status(),
            error: Some(error.detail().to_string()),
        }
    }

    /// Returns true for a 4xx answer whose body says the subscription
    /// already exists.
    #[must_use]
    pub fn is_already_exists(&self) -> bool {
        !self.success
            && (400..500).contains(&self.status)
            && self
                .error
                .as_deref()
                .is_some_and(|e| e.to_lowercase().contains("ya existe"))
    }
}

/// Outcome of listing subscriptions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionListing {
    /// Broker status, or 502 when the broker was unreachable.
    #[serde(rename = "statusCode")]
    pub status: u16,
    /// Number of subscriptions returned.
    pub count: usize,
    /// Subscriptions (empty on failure).
    pub subscriptions: Vec<SubscriptionDetails>,
    /// Raw error body on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SubscriptionListing {
    /// Returns true if the broker answered.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Body of a manual subscription request.
///
/// Either `topic` or all of `targetTeamName`, `domain` and `action`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubscriptionCommand {
    /// Full `team.domain.action` topic.
    pub topic: Option<String>,
    /// Optional event name.
    pub event_name: Option<String>,
    /// Publishing team.
    pub target_team_name: Option<String>,
    /// Domain within the team.
    pub domain: Option<String>,
    /// Action within the domain.
    pub action: Option<String>,
}

impl SubscriptionCommand {
    /// Resolves the command into `(topic, event name)`.
    ///
    /// # Errors
    ///
    /// Returns a validation error unless exactly one of the two forms is
    /// complete.
    pub fn resolve(&self) -> ApplicationResult<(String, String)> {
        let topic = non_blank(self.topic.as_deref());
        let parts = match (
            non_blank(self.target_team_name.as_deref()),
            non_blank(self.domain.as_deref()),
            non_blank(self.action.as_deref()),
        ) {
            (Some(team), Some(domain), Some(action)) => Some((team, domain, action)),
            _ => None,
        };

        match (topic, parts) {
            (Some(topic), None) => {
                let event_name = self.explicit_event_name().unwrap_or_else(|| last_segment(topic));
                Ok((topic.to_string(), event_name.to_string()))
            }
            (None, Some((team, domain, action))) => {
                let event_name = self.explicit_event_name().unwrap_or(action);
                Ok((format!("{team}.{domain}.{action}"), event_name.to_string()))
            }
            (Some(_), Some(_)) => Err(ApplicationError::validation(
                "provide either topic/eventName or targetTeamName/domain/action, not both",
            )),
            (None, None) => Err(ApplicationError::validation(
                "provide either topic/eventName or targetTeamName/domain/action",
            )),
        }
    }

    fn explicit_event_name(&self) -> Option<&str> {
        non_blank(self.event_name.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn last_segment(topic: &str) -> &str {
    match topic.rsplit_once('.') {
        Some((_, last)) if !last.is_empty() => last,
        _ => topic,
    }
}

/// Subscription management service.
#[derive(Debug, Clone)]
pub struct SubscriptionService {
    matching: Arc<dyn MatchingApi>,
    webhook_url: String,
    team_name: String,
}

impl SubscriptionService {
    /// Creates the service.
    #[must_use]
    pub fn new(matching: Arc<dyn MatchingApi>, module: &ModuleResponseSettings) -> Self {
        Self {
            matching,
            webhook_url: module.webhook_url.trim().to_string(),
            team_name: module.team_name.trim().to_string(),
        }
    }

    /// Webhook URL registered with the broker.
    #[inline]
    #[must_use]
    pub fn webhook_url(&self) -> &str {
        &self.webhook_url
    }

    /// Subscribes to a topic and event name.
    pub async fn subscribe(&self, topic: &str, event_name: &str) -> SubscriptionResult {
        let request = SubscribeRequest {
            webhook_url: self.webhook_url.clone(),
            squad_name: self.team_name.clone(),
            topic: topic.trim().to_string(),
            event_name: event_name.trim().to_string(),
        };
        let topic = Some(request.topic.clone());
        let event_name = Some(request.event_name.clone());

        match self.matching.subscribe(&request).await {
            Ok(response) => {
                tracing::info!(
                    topic = %request.topic,
                    event_name = %request.event_name,
                    status = response.status,
                    "subscription request sent"
                );
                SubscriptionResult::accepted(topic, event_name, response.status)
            }
            Err(e) => {
                tracing::error!(
                    topic = %request.topic,
                    event_name = %request.event_name,
                    status = e.response_status(),
                    error = %e,
                    "subscription request failed"
                );
                SubscriptionResult::rejected(topic, event_name, &e)
            }
        }
    }

    /// Validates a manual command and subscribes.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the command names neither or both
    /// forms.
    pub async fn create(&self, command: &SubscriptionCommand) -> ApplicationResult<SubscriptionResult> {
        let (topic, event_name) = command.resolve()?;
        let result = self.subscribe(&topic, &event_name).await;
        tracing::info!(
            topic = %topic,
            event_name = %event_name,
            status = result.status,
            success = result.success,
            "manual subscription attempt"
        );
        Ok(result)
    }

    /// Lists the broker's subscriptions.
    pub async fn list(&self) -> SubscriptionListing {
        match self.matching.list_subscriptions().await {
            Ok(subscriptions) => SubscriptionListing {
                status: 200,
                count: subscriptions.len(),
                subscriptions,
                error: None,
            },
            Err(e) => {
                tracing::error!(status = e.response_status(), error = %e, "failed to list subscriptions");
                SubscriptionListing {
                    status: e.response_status(),
                    count: 0,
                    subscriptions: Vec::new(),
                    error: Some(e.detail().to_string()),
                }
            }
        }
    }

    /// Deletes a subscription.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank id.
    pub async fn delete(&self, subscription_id: &str) -> ApplicationResult<SubscriptionResult> {
        let id = non_blank(Some(subscription_id))
            .ok_or_else(|| ApplicationError::validation("subscriptionId must not be empty"))?;

        match self.matching.unsubscribe(id).await {
            Ok(response) => {
                tracing::info!(subscription_id = id, status = response.status, "subscription removed");
                Ok(SubscriptionResult::accepted(None, None, response.status))
            }
            Err(e) => {
                tracing::error!(subscription_id = id, error = %e, "failed to remove subscription");
                Ok(SubscriptionResult::rejected(None, None, &e))
            }
        }
    }
}
