//! Client configuration
//!
//! A `ClientConfig` can be built in code, loaded from YAML, and overlaid with
//! `WECOM_*` environment variables. It is immutable once a client is built.

use crate::auth::ClientIdentity;
use crate::error::{Error, Result};
use crate::http::RateLimiterConfig;
use crate::types::{BackoffType, OptionStringExt};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Production API host
pub const DEFAULT_BASE_URL: &str = "https://qyapi.weixin.qq.com";

/// Sends per call before giving up on a rejected token
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Environment variable holding the enterprise id
pub const ENV_CORP_ID: &str = "WECOM_CORP_ID";

/// Environment variable holding the application secret
pub const ENV_CORP_SECRET: &str = "WECOM_CORP_SECRET";

/// Environment variable overriding the base URL
pub const ENV_BASE_URL: &str = "WECOM_BASE_URL";

// ============================================================================
// Client Config
// ============================================================================

/// Everything a client needs, supplied at construction
#[derive(Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// API host all paths are resolved against
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Enterprise id (`corpid`)
    #[serde(default)]
    pub enterprise_id: String,

    /// Application secret (`corpsecret`)
    #[serde(default)]
    pub agent_secret: String,

    /// Maximum sends per call while the token keeps being rejected
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// User agent string
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Delay between a token rejection and the next send
    #[serde(default)]
    pub backoff: BackoffConfig,

    /// Client-side throttling
    #[serde(default)]
    pub rate_limit: Option<RateLimiterConfig>,

    /// Refresh tokens this many seconds before their declared expiry
    #[serde(default)]
    pub refresh_ahead_secs: Option<u64>,

    /// Log request and response bodies at debug level
    #[serde(default)]
    pub print_payload: bool,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("wecom-client/{}", crate::VERSION)
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            enterprise_id: String::new(),
            agent_secret: String::new(),
            max_attempts: default_max_attempts(),
            timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
            backoff: BackoffConfig::default(),
            rate_limit: None,
            refresh_ahead_secs: None,
            print_payload: false,
        }
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("enterprise_id", &self.enterprise_id)
            .field("agent_secret", &"<redacted>")
            .field("max_attempts", &self.max_attempts)
            .field("timeout_secs", &self.timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("backoff", &self.backoff)
            .field("rate_limit", &self.rate_limit)
            .field("refresh_ahead_secs", &self.refresh_ahead_secs)
            .field("print_payload", &self.print_payload)
            .finish()
    }
}

impl ClientConfig {
    /// Create a config for the given identity with defaults elsewhere
    pub fn new(enterprise_id: impl Into<String>, agent_secret: impl Into<String>) -> Self {
        Self {
            enterprise_id: enterprise_id.into(),
            agent_secret: agent_secret.into(),
            ..Self::default()
        }
    }

    /// Create a new config builder
    pub fn builder(
        enterprise_id: impl Into<String>,
        agent_secret: impl Into<String>,
    ) -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: Self::new(enterprise_id, agent_secret),
        }
    }

    /// Parse a YAML document
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load a YAML config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read config file {}: {e}", path.display()))
        })?;
        Self::from_yaml_str(&contents)
    }

    /// Overlay `WECOM_CORP_ID`, `WECOM_CORP_SECRET` and `WECOM_BASE_URL`
    #[must_use]
    pub fn with_env(self) -> Self {
        self.with_vars(|key| std::env::var(key).ok())
    }

    /// Overlay values looked up by `lookup`; empty values are ignored
    #[must_use]
    pub fn with_vars<F: Fn(&str) -> Option<String>>(mut self, lookup: F) -> Self {
        if let Some(v) = lookup(ENV_CORP_ID).none_if_empty() {
            self.enterprise_id = v;
        }
        if let Some(v) = lookup(ENV_CORP_SECRET).none_if_empty() {
            self.agent_secret = v;
        }
        if let Some(v) = lookup(ENV_BASE_URL).none_if_empty() {
            self.base_url = v;
        }
        self
    }

    /// Check that the config can build a client
    pub fn validate(&self) -> Result<()> {
        if self.enterprise_id.is_empty() {
            return Err(Error::missing_field("enterprise_id"));
        }
        if self.agent_secret.is_empty() {
            return Err(Error::missing_field("agent_secret"));
        }
        if self.max_attempts == 0 {
            return Err(Error::config("max_attempts must be at least 1"));
        }
        let url = self.parsed_base_url()?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::config(format!(
                "base_url must be http or https, got {}",
                url.scheme()
            )));
        }
        Ok(())
    }

    /// Parsed base URL
    pub fn parsed_base_url(&self) -> Result<Url> {
        Ok(Url::parse(&self.base_url)?)
    }

    /// Secrets used for the token exchange
    pub fn identity(&self) -> ClientIdentity {
        ClientIdentity::new(&self.enterprise_id, &self.agent_secret)
    }

    /// Request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Refresh window before declared expiry, if enabled
    pub fn refresh_ahead(&self) -> Option<Duration> {
        self.refresh_ahead_secs.map(Duration::from_secs)
    }
}

// ============================================================================
// Backoff
// ============================================================================

/// Backoff between a rejected token and the next attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackoffConfig {
    /// Backoff type
    #[serde(default, rename = "type")]
    pub backoff_type: BackoffType,

    /// Initial delay in milliseconds
    #[serde(default)]
    pub initial_ms: u64,

    /// Maximum delay in milliseconds
    #[serde(default = "default_max_ms")]
    pub max_ms: u64,
}

fn default_max_ms() -> u64 {
    5_000
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            backoff_type: BackoffType::Constant,
            initial_ms: 0,
            max_ms: default_max_ms(),
        }
    }
}

impl BackoffConfig {
    /// Delay before retry number `attempt` (zero-based)
    pub fn delay(&self, attempt: u32) -> Duration {
        let initial = Duration::from_millis(self.initial_ms);
        let delay = match self.backoff_type {
            BackoffType::Constant => initial,
            BackoffType::Linear => initial.saturating_mul(attempt.saturating_add(1)),
            BackoffType::Exponential => {
                let factor = 2u32.saturating_pow(attempt);
                initial.saturating_mul(factor)
            }
        };

        std::cmp::min(delay, Duration::from_millis(self.max_ms))
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for `ClientConfig`
#[derive(Debug, Clone)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Set the base URL
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    /// Set max attempts per call
    #[must_use]
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.config.max_attempts = attempts;
        self
    }

    /// Set the request timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout_secs = timeout.as_secs();
        self
    }

    /// Set backoff configuration
    #[must_use]
    pub fn backoff(mut self, backoff_type: BackoffType, initial: Duration, max: Duration) -> Self {
        self.config.backoff = BackoffConfig {
            backoff_type,
            initial_ms: initial.as_millis() as u64,
            max_ms: max.as_millis() as u64,
        };
        self
    }

    /// Set rate limiter
    #[must_use]
    pub fn rate_limit(mut self, config: RateLimiterConfig) -> Self {
        self.config.rate_limit = Some(config);
        self
    }

    /// Refresh tokens ahead of their declared expiry
    #[must_use]
    pub fn refresh_ahead(mut self, window: Duration) -> Self {
        self.config.refresh_ahead_secs = Some(window.as_secs());
        self
    }

    /// Log request and response bodies
    #[must_use]
    pub fn print_payload(mut self, enabled: bool) -> Self {
        self.config.print_payload = enabled;
        self
    }

    /// Set user agent
    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the config
    pub fn build(self) -> ClientConfig {
        self.config
    }
}
