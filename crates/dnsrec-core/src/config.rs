//! Configuration types for dnsrec
//!
//! This module defines all configuration structures used throughout the crate.
//! Every option is optional; absent values fall back to the defaults below or,
//! for credentials and region, to whatever the client capability does by
//! default (e.g. an ambient credential chain).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Environment variable prefix used by [`AdapterConfig::from_env`]
pub const ENV_PREFIX: &str = "DNSREC_";

/// Main adapter configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdapterConfig {
    /// DNS provider configuration
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Retry policy for change submissions
    #[serde(default)]
    pub retry: RetryConfig,

    /// Propagation wait after change submissions
    #[serde(default)]
    pub propagation: PropagationConfig,
}

impl AdapterConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.provider.validate()?;
        self.retry.validate()?;
        self.propagation.validate()?;
        Ok(())
    }

    /// Load a Route 53 configuration from `DNSREC_*` environment variables
    ///
    /// Recognized variables:
    ///
    /// - `DNSREC_REGION`, `DNSREC_PROFILE`
    /// - `DNSREC_ACCESS_KEY_ID`, `DNSREC_SECRET_ACCESS_KEY`, `DNSREC_SESSION_TOKEN`
    /// - `DNSREC_PRIVATE_ZONE` (`true`/`false`)
    /// - `DNSREC_MAX_RETRIES`
    /// - `DNSREC_WAIT_FOR_PROPAGATION` (`true`/`false`)
    /// - `DNSREC_MAX_WAIT_SECS`, `DNSREC_POLL_INTERVAL_MS`
    pub fn from_env() -> Result<Self, crate::Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`AdapterConfig::from_env`], reading values through `lookup`
    ///
    /// `lookup` receives the full variable name (including the prefix).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, crate::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |suffix: &str| {
            lookup(&format!("{ENV_PREFIX}{suffix}"))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let settings = Route53Settings {
            region: get("REGION"),
            profile: get("PROFILE"),
            access_key_id: get("ACCESS_KEY_ID"),
            secret_access_key: get("SECRET_ACCESS_KEY"),
            session_token: get("SESSION_TOKEN"),
            private_zone: get("PRIVATE_ZONE")
                .map(|v| parse_bool("PRIVATE_ZONE", &v))
                .transpose()?,
        };

        let mut config = Self {
            provider: ProviderConfig::Route53(settings),
            ..Self::default()
        };

        if let Some(v) = get("MAX_RETRIES") {
            config.retry.max_attempts = parse_number("MAX_RETRIES", &v)?;
        }
        if let Some(v) = get("WAIT_FOR_PROPAGATION") {
            config.propagation.enabled = parse_bool("WAIT_FOR_PROPAGATION", &v)?;
        }
        if let Some(v) = get("MAX_WAIT_SECS") {
            config.propagation.max_wait_secs = parse_number("MAX_WAIT_SECS", &v)?;
        }
        if let Some(v) = get("POLL_INTERVAL_MS") {
            config.propagation.poll_interval_ms = parse_number("POLL_INTERVAL_MS", &v)?;
        }

        config.validate()?;
        Ok(config)
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, crate::Error> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(crate::Error::config(format!(
            "{ENV_PREFIX}{key} must be a boolean. Got: {value}"
        ))),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, crate::Error> {
    value.parse().map_err(|_| {
        crate::Error::config(format!(
            "{ENV_PREFIX}{key} must be a non-negative integer. Got: {value}"
        ))
    })
}

/// DNS provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// Route 53 provider
    Route53(Route53Settings),

    /// Custom provider
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl ProviderConfig {
    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            ProviderConfig::Route53(settings) => settings.validate(),
            ProviderConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config(
                        "Custom provider factory cannot be empty",
                    ));
                }
                if config.is_null() {
                    return Err(crate::Error::config(
                        "Custom provider config cannot be null",
                    ));
                }
                Ok(())
            }
        }
    }

    /// Get the provider type name
    pub fn type_name(&self) -> &str {
        match self {
            ProviderConfig::Route53(_) => "route53",
            ProviderConfig::Custom { factory, .. } => factory,
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig::Route53(Route53Settings::default())
    }
}

/// Route 53 connection settings
///
/// These are handed to the connector that builds the client capability; the
/// adapter itself only reads `private_zone`.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct Route53Settings {
    /// AWS region
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    /// Named credential profile
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,

    /// Explicit access key ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_key_id: Option<String>,

    /// Explicit secret access key
    /// ⚠️ NEVER log this value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_access_key: Option<String>,

    /// Session token for temporary credentials
    /// ⚠️ NEVER log this value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_token: Option<String>,

    /// Restrict zone resolution to private (`true`) or public (`false`) zones
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_zone: Option<bool>,
}

// Custom Debug implementation that hides the secret key and session token
impl fmt::Debug for Route53Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "<REDACTED>");
        f.debug_struct("Route53Settings")
            .field("region", &self.region)
            .field("profile", &self.profile)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &redact(&self.secret_access_key))
            .field("session_token", &redact(&self.session_token))
            .field("private_zone", &self.private_zone)
            .finish()
    }
}

impl Route53Settings {
    /// Validate the credential combination
    pub fn validate(&self) -> Result<(), crate::Error> {
        match (&self.access_key_id, &self.secret_access_key) {
            (Some(_), None) => Err(crate::Error::config(
                "Route 53 access key ID requires a secret access key",
            )),
            (None, Some(_)) => Err(crate::Error::config(
                "Route 53 secret access key requires an access key ID",
            )),
            (None, None) if self.session_token.is_some() => Err(crate::Error::config(
                "Route 53 session token requires an explicit credential pair",
            )),
            _ => Ok(()),
        }
    }

    /// Whether an explicit credential pair is configured
    pub fn has_static_credentials(&self) -> bool {
        self.access_key_id.is_some() && self.secret_access_key.is_some()
    }
}

/// Retry configuration for change submissions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per submission, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry (in milliseconds)
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Upper bound for the exponential backoff (in milliseconds)
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

impl RetryConfig {
    /// Validate the retry configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.max_attempts == 0 {
            return Err(crate::Error::config("max_attempts must be at least 1"));
        }
        if self.max_backoff_ms < self.initial_backoff_ms {
            return Err(crate::Error::config(format!(
                "max_backoff_ms ({}) must not be below initial_backoff_ms ({})",
                self.max_backoff_ms, self.initial_backoff_ms
            )));
        }
        Ok(())
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

/// Propagation wait configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropagationConfig {
    /// Wait for submitted changes to reach INSYNC
    #[serde(default)]
    pub enabled: bool,

    /// Give up waiting after this many seconds (the change still succeeds)
    #[serde(default = "default_max_wait_secs")]
    pub max_wait_secs: u64,

    /// Interval between status polls (in milliseconds)
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl PropagationConfig {
    /// Enabled propagation wait with the given bounds
    ///
    /// Both bounds round up to the unit they are stored in, so a non-zero
    /// duration never becomes zero.
    pub fn waiting(max_wait: Duration, poll_interval: Duration) -> Self {
        Self {
            enabled: true,
            max_wait_secs: round_up(max_wait.as_millis(), 1_000),
            poll_interval_ms: round_up(poll_interval.as_micros(), 1_000),
        }
    }

    /// Validate the propagation configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.enabled && self.poll_interval_ms == 0 {
            return Err(crate::Error::config(
                "poll_interval_ms must be > 0 when waiting for propagation",
            ));
        }
        Ok(())
    }

    /// Maximum propagation wait
    pub fn max_wait(&self) -> Duration {
        Duration::from_secs(self.max_wait_secs)
    }

    /// Interval between status polls
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for PropagationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_wait_secs: default_max_wait_secs(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

fn round_up(value: u128, unit: u128) -> u64 {
    u64::try_from(value.div_ceil(unit)).unwrap_or(u64::MAX)
}

fn default_max_attempts() -> u32 {
    5
}

fn default_initial_backoff_ms() -> u64 {
    200
}

fn default_max_backoff_ms() -> u64 {
    5_000
}

fn default_max_wait_secs() -> u64 {
    60
}

fn default_poll_interval_ms() -> u64 {
    2_000
}
