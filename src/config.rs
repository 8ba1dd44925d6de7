//! # Configuration
//!
//! Layered settings loaded with the `config` crate.
//!
//! Sources, later ones overriding earlier ones:
//!
//! 1. `.env` (via `dotenvy`, if present)
//! 2. `config/default.toml` (optional)
//! 3. `config/{APP_ENV}.toml` (optional)
//! 4. Environment variables prefixed with `APP`, nested with `__`
//!    (for example `APP__INTEGRATIONS__MATCHING__API_KEY`)
//!
//! After loading, [`Settings::validate`] normalizes paths and subscription
//! targets and rejects configurations that can never work.
//!
//! # Examples
//!
//! ```
//! use matching_service::config::{MatchingSettings, SubscriptionTarget};
//!
//! let mut matching = MatchingSettings {
//!     base_url: "https://broker.example.com".to_string(),
//!     ack_path: "messages/{msgId}/ack".to_string(),
//!     ..MatchingSettings::default()
//! };
//! matching.validate().unwrap();
//! assert_eq!(matching.ack_path, "/messages/{msgId}/ack");
//! ```

use config::{Config, Environment, File};
use serde::Deserialize;
use std::fmt;
use thiserror::Error;

/// Placeholder replaced by the message id in the ack path.
pub const MSG_ID_PLACEHOLDER: &str = "{msgId}";

/// Error raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A source could not be read or deserialized.
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// A value is missing or inconsistent.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }
}

/// Root settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// HTTP listener.
    pub server: ServerSettings,
    /// Log output.
    pub logging: LoggingSettings,
    /// Identity used in response envelopes and subscriptions.
    pub module_response: ModuleResponseSettings,
    /// Outbound integrations.
    pub integrations: IntegrationSettings,
    /// Invitation limits.
    pub invitations: InvitationSettings,
    /// Optional PostgreSQL connection.
    pub database: DatabaseSettings,
}

impl Settings {
    /// Loads settings from `.env`, config files and the environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Load` if a source is malformed and
    /// `ConfigError::Invalid` if validation fails.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let settings: Settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        settings.validated()
    }

    /// Validates and normalizes the settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` describing the first problem found.
    pub fn validated(mut self) -> Result<Self, ConfigError> {
        self.integrations.matching.validate()?;
        self.integrations.downstream.validate()?;
        self.invitations.validate()?;
        Ok(self)
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl ServerSettings {
    /// Returns `host:port`.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable, one line per event.
    #[default]
    Pretty,
    /// Structured JSON lines.
    Json,
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter when `RUST_LOG` is unset.
    pub level: String,
    /// Output format.
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Identity of this module towards callers and the broker.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModuleResponseSettings {
    /// Webhook URL registered with the broker and echoed in envelopes.
    pub webhook_url: String,
    /// Squad name echoed in envelopes.
    pub squad_name: String,
    /// Team name sent as `squadName` when subscribing.
    pub team_name: String,
}

impl Default for ModuleResponseSettings {
    fn default() -> Self {
        Self {
            webhook_url: "https://matching-squad.com/webhook".to_string(),
            squad_name: "matching-squad".to_string(),
            team_name: "matching".to_string(),
        }
    }
}

/// Outbound integrations.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IntegrationSettings {
    /// Matching broker.
    pub matching: MatchingSettings,
    /// Downstream marketplace modules.
    pub downstream: DownstreamSettings,
}

/// A topic to subscribe to at startup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SubscriptionTarget {
    /// Publishing team.
    pub team: String,
    /// Domain within the team.
    pub domain: String,
    /// Action within the domain.
    pub action: String,
    /// Event name override (defaults to `action`).
    #[serde(default)]
    pub event_name: Option<String>,
}

impl SubscriptionTarget {
    /// Creates a target.
    #[must_use]
    pub fn new(team: impl Into<String>, domain: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            team: team.into(),
            domain: domain.into(),
            action: action.into(),
            event_name: None,
        }
    }

    /// Returns `team.domain.action`.
    #[must_use]
    pub fn topic(&self) -> String {
        format!("{}.{}.{}", self.team, self.domain, self.action)
    }

    /// Returns the event name, falling back to the action.
    #[must_use]
    pub fn resolved_event_name(&self) -> String {
        self.event_name
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .unwrap_or(&self.action)
            .to_string()
    }

    fn normalize(&mut self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("team", &mut self.team),
            ("domain", &mut self.domain),
            ("action", &mut self.action),
        ] {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                return Err(ConfigError::invalid(format!(
                    "auto subscription {name} must not be empty"
                )));
            }
            *value = trimmed.to_lowercase();
        }
        Ok(())
    }
}

/// Matching broker settings.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct MatchingSettings {
    /// Broker base URL (required).
    pub base_url: String,
    /// API key sent as `X-API-KEY`.
    pub api_key: Option<String>,
    /// Subscription collection path.
    pub subscribe_path: String,
    /// Ack path; must contain `{msgId}`.
    pub ack_path: String,
    /// Reconcile subscriptions at startup.
    pub auto_subscribe_enabled: bool,
    /// Topics reconciled at startup.
    pub auto_subscriptions: Vec<SubscriptionTarget>,
    /// Publish Top-3 results and quote summaries.
    pub publish_enabled: bool,
    /// Publish path.
    pub publish_path: String,
    /// `source` field of published messages.
    pub publish_source: String,
    /// Channel for Top-3 results.
    pub publish_top3_channel: String,
    /// Event name for Top-3 results.
    pub publish_top3_event_name: String,
    /// Channel for quote summaries.
    pub publish_quotes_channel: String,
    /// Event name for quote summaries.
    pub publish_quotes_event_name: String,
    /// HTTP timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: None,
            subscribe_path: "/subscribe".to_string(),
            ack_path: "/messages/{msgId}/ack".to_string(),
            auto_subscribe_enabled: false,
            auto_subscriptions: Vec::new(),
            publish_enabled: false,
            publish_path: "/publish".to_string(),
            publish_source: "matching".to_string(),
            publish_top3_channel: "matching.solicitudes.top3".to_string(),
            publish_top3_event_name: "top3_generado".to_string(),
            publish_quotes_channel: "matching.cotizaciones.resumen".to_string(),
            publish_quotes_event_name: "cotizaciones_actualizadas".to_string(),
            timeout_ms: 5_000,
        }
    }
}

impl fmt::Debug for MatchingSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatchingSettings")
            .field("base_url", &self.base_url)
            .field("api_key", &self.masked_api_key())
            .field("subscribe_path", &self.subscribe_path)
            .field("ack_path", &self.ack_path)
            .field("auto_subscribe_enabled", &self.auto_subscribe_enabled)
            .field("auto_subscriptions", &self.auto_subscriptions)
            .field("publish_enabled", &self.publish_enabled)
            .field("publish_path", &self.publish_path)
            .finish_non_exhaustive()
    }
}

impl MatchingSettings {
    /// Returns true if a non-blank API key is configured.
    #[must_use]
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }

    /// Returns the API key for logs: first 4 and last 2 characters.
    #[must_use]
    pub fn masked_api_key(&self) -> String {
        mask_api_key(self.api_key.as_deref())
    }

    /// Returns the ack path for a message id.
    #[must_use]
    pub fn ack_path_for(&self, msg_id: &str) -> String {
        self.ack_path.replace(MSG_ID_PLACEHOLDER, msg_id)
    }

    /// Validates and normalizes the broker settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the base URL is blank, the ack
    /// path lacks `{msgId}`, auto-subscribe has no targets, a target has a
    /// blank part, or publishing is enabled without channel and event names.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::invalid(
                "integrations.matching.base_url must not be empty",
            ));
        }
        self.base_url = self.base_url.trim().trim_end_matches('/').to_string();
        self.subscribe_path = normalize_path(&self.subscribe_path, "/subscribe");
        self.ack_path = normalize_path(&self.ack_path, "/messages/{msgId}/ack");
        self.publish_path = normalize_path(&self.publish_path, "/publish");

        if !self.ack_path.contains(MSG_ID_PLACEHOLDER) {
            return Err(ConfigError::invalid(format!(
                "integrations.matching.ack_path must contain {MSG_ID_PLACEHOLDER}"
            )));
        }
        if self.auto_subscribe_enabled && self.auto_subscriptions.is_empty() {
            return Err(ConfigError::invalid(
                "at least one auto subscription is required when auto_subscribe_enabled=true",
            ));
        }
        for target in &mut self.auto_subscriptions {
            target.normalize()?;
        }
        if self.publish_enabled
            && (self.publish_top3_channel.trim().is_empty()
                || self.publish_top3_event_name.trim().is_empty())
        {
            return Err(ConfigError::invalid(
                "publish_top3_channel and publish_top3_event_name are required when publishing",
            ));
        }
        Ok(())
    }
}

/// How downstream collaborators are reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownstreamMode {
    /// Log the call and report success.
    #[default]
    Stub,
    /// Real HTTP calls.
    Http,
}

/// Downstream module endpoints.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DownstreamSettings {
    /// Stub or HTTP.
    pub mode: DownstreamMode,
    /// Invitation notification endpoint.
    pub invitations_url: String,
    /// Core quotes endpoint.
    pub core_quotes_url: String,
    /// Requests module quotes endpoint (PUT).
    pub requests_url: String,
    /// Search indexing endpoint.
    pub search_url: String,
    /// HTTP timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for DownstreamSettings {
    fn default() -> Self {
        Self {
            mode: DownstreamMode::Stub,
            invitations_url: String::new(),
            core_quotes_url: String::new(),
            requests_url: String::new(),
            search_url: String::new(),
            timeout_ms: 5_000,
        }
    }
}

impl DownstreamSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.mode != DownstreamMode::Http {
            return Ok(());
        }
        for (name, url) in [
            ("invitations_url", &self.invitations_url),
            ("core_quotes_url", &self.core_quotes_url),
            ("requests_url", &self.requests_url),
            ("search_url", &self.search_url),
        ] {
            if url.trim().is_empty() {
                return Err(ConfigError::invalid(format!(
                    "integrations.downstream.{name} is required in http mode"
                )));
            }
        }
        Ok(())
    }
}

/// Invitation limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct InvitationSettings {
    /// Providers invited when a normal request enters quoting.
    pub initial_limit: usize,
    /// Providers invited when a critical request enters quoting.
    pub critical_initial_limit: usize,
    /// Maximum invitations per round for a normal request.
    pub max_per_round: usize,
    /// Maximum invitations per round for a critical request.
    pub critical_max_per_round: usize,
}

impl Default for InvitationSettings {
    fn default() -> Self {
        Self {
            initial_limit: 3,
            critical_initial_limit: 10,
            max_per_round: 6,
            critical_max_per_round: 12,
        }
    }
}

impl InvitationSettings {
    /// Initial invitation count for a request.
    #[must_use]
    pub fn initial_for(&self, critical: bool) -> usize {
        if critical {
            self.critical_initial_limit
        } else {
            self.initial_limit
        }
    }

    /// Per-round cap for a request.
    #[must_use]
    pub fn max_for(&self, critical: bool) -> usize {
        if critical {
            self.critical_max_per_round
        } else {
            self.max_per_round
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_limit == 0 || self.critical_initial_limit == 0 {
            return Err(ConfigError::invalid("invitation limits must be positive"));
        }
        if self.max_per_round < self.initial_limit
            || self.critical_max_per_round < self.critical_initial_limit
        {
            return Err(ConfigError::invalid(
                "per-round maximum must not be below the initial invitation limit",
            ));
        }
        Ok(())
    }
}

/// Database settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// PostgreSQL URL; in-memory storage is used when unset.
    pub url: Option<String>,
    /// Pool size.
    pub max_connections: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 5,
        }
    }
}

/// Masks an API key for logging.
///
/// ```
/// use matching_service::config::mask_api_key;
///
/// assert_eq!(mask_api_key(Some("abcd1234xy")), "abcd****xy");
/// assert_eq!(mask_api_key(Some("abc")), "a****");
/// assert_eq!(mask_api_key(None), "<empty>");
/// ```
#[must_use]
pub fn mask_api_key(key: Option<&str>) -> String {
    let Some(key) = key.map(str::trim).filter(|k| !k.is_empty()) else {
        return "<empty>".to_string();
    };
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 6 {
        let first: String = chars.iter().take(1).collect();
        return format!("{first}****");
    }
    let head: String = chars.iter().take(4).collect();
    let tail: String = chars.iter().skip(chars.len() - 2).collect();
    format!("{head}****{tail}")
}

fn normalize_path(path: &str, default: &str) -> String {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        default.to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn matching() -> MatchingSettings {
        MatchingSettings {
            base_url: "http://broker.local/".to_string(),
            ..MatchingSettings::default()
        }
    }

    #[test]
    fn blank_base_url_is_rejected() {
        let mut settings = MatchingSettings::default();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn paths_gain_leading_slash_and_defaults() {
        let mut settings = MatchingSettings {
            subscribe_path: "  ".to_string(),
            ack_path: "ack/{msgId}".to_string(),
            ..matching()
        };
        settings.validate().unwrap();
        assert_eq!(settings.subscribe_path, "/subscribe");
        assert_eq!(settings.ack_path, "/ack/{msgId}");
        assert_eq!(settings.base_url, "http://broker.local");
    }

    #[test]
    fn ack_path_requires_placeholder() {
        let mut settings = MatchingSettings {
            ack_path: "/messages/ack".to_string(),
            ..matching()
        };
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("{msgId}"));
    }

    #[test]
    fn auto_subscribe_without_targets_is_rejected() {
        let mut settings = MatchingSettings {
            auto_subscribe_enabled: true,
            ..matching()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn targets_are_trimmed_and_lowercased() {
        let mut settings = MatchingSettings {
            auto_subscribe_enabled: true,
            auto_subscriptions: vec![SubscriptionTarget::new(" TeamA ", "DomainB", "ActionC")],
            ..matching()
        };
        settings.validate().unwrap();
        assert_eq!(settings.auto_subscriptions[0].topic(), "teama.domainb.actionc");
    }

    #[test]
    fn blank_target_part_is_rejected() {
        let mut settings = MatchingSettings {
            auto_subscriptions: vec![SubscriptionTarget::new("team", " ", "action")],
            ..matching()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn publishing_requires_channel() {
        let mut settings = MatchingSettings {
            publish_enabled: true,
            publish_top3_channel: String::new(),
            ..matching()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn event_name_falls_back_to_action() {
        let mut target = SubscriptionTarget::new("a", "b", "c");
        assert_eq!(target.resolved_event_name(), "c");
        target.event_name = Some(" custom ".to_string());
        assert_eq!(target.resolved_event_name(), "custom");
    }

    #[test]
    fn ack_path_substitution() {
        let settings = matching();
        assert_eq!(settings.ack_path_for("m-1"), "/messages/m-1/ack");
    }

    #[test]
    fn debug_output_masks_key() {
        let settings = MatchingSettings {
            api_key: Some("supersecretkey".to_string()),
            ..matching()
        };
        let debug = format!("{settings:?}");
        assert!(!debug.contains("supersecretkey"));
        assert!(debug.contains("supe****ey"));
    }

    #[test]
    fn http_mode_requires_urls() {
        let downstream = DownstreamSettings {
            mode: DownstreamMode::Http,
            ..DownstreamSettings::default()
        };
        assert!(downstream.validate().is_err());
        assert!(DownstreamSettings::default().validate().is_ok());
    }

    #[test]
    fn invitation_limits_follow_criticality() {
        let limits = InvitationSettings::default();
        assert_eq!(limits.initial_for(false), 3);
        assert_eq!(limits.initial_for(true), 10);
        assert_eq!(limits.max_for(true), 12);
    }

    #[test]
    fn settings_validated_checks_every_section() {
        let settings = Settings::default();
        assert!(settings.validated().is_err());

        let mut settings = Settings::default();
        settings.integrations.matching.base_url = "http://x".to_string();
        assert!(settings.validated().is_ok());
    }
}
