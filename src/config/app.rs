//! Application configuration structures.

use std::collections::HashSet;
use std::net::IpAddr;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::domain::Domain;
use super::validation::{ConfigError, parse_duration};

// =============================================================================
// Constants
// =============================================================================

/// Default configuration file location.
pub const DEFAULT_CONFIG_FILE: &str = "/etc/rdap-exporter/config.yaml";

/// Default interval between collection rounds (60 seconds).
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(60);

/// Minimum allowed interval between rounds (1 second).
pub const MIN_CHECK_INTERVAL: Duration = Duration::from_secs(1);

/// Default per-lookup timeout (30 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default number of concurrent RDAP lookups.
pub const DEFAULT_MAX_CONCURRENCY: usize = 16;

/// Default listen port.
pub const DEFAULT_PORT: u16 = 9099;

/// IANA bootstrap registry for DNS (RFC 9224).
pub const DEFAULT_BOOTSTRAP_URL: &str = "https://data.iana.org/rdap/dns.json";

fn default_check_interval() -> Duration {
    DEFAULT_CHECK_INTERVAL
}

fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

fn default_max_concurrency() -> usize {
    DEFAULT_MAX_CONCURRENCY
}

fn default_bootstrap_url() -> String {
    DEFAULT_BOOTSTRAP_URL.to_string()
}

/// Durations given either as integer seconds (`60`) or humantime (`1m`).
mod seconds_or_humantime {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer, de};

    use super::parse_duration;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Seconds(u64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        humantime_serde::serialize(value, serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        match Raw::deserialize(deserializer)? {
            Raw::Seconds(secs) => Ok(Duration::from_secs(secs)),
            Raw::Text(text) => parse_duration(&text).map_err(de::Error::custom),
        }
    }
}

// =============================================================================
// Server Configuration
// =============================================================================

/// Web server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server bind address (default: "0.0.0.0").
    pub bind: String,

    /// Server port (default: 9099).
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
        }
    }
}

// =============================================================================
// Collection Configuration
// =============================================================================

/// What to do when a tick fires while the previous round is still running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlapPolicy {
    /// Skip the tick; at most one round is in flight.
    #[default]
    Skip,
    /// Start another round alongside the running one.
    Allow,
}

/// What happens to series that vanish from a later RDAP response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StalePolicy {
    /// Keep reporting the last observed value.
    #[default]
    Keep,
    /// Drop status/event series missing from the latest successful lookup.
    Expire,
}

/// RDAP polling configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RdapConfig {
    /// Interval between collection rounds (default: 60s).
    #[serde(default = "default_check_interval", with = "seconds_or_humantime")]
    pub check_interval: Duration,

    /// Timeout for a single domain lookup, bootstrap included (default: 30s).
    #[serde(default = "default_timeout", with = "seconds_or_humantime")]
    pub timeout: Duration,

    /// Maximum number of lookups in flight at once (default: 16).
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Round overlap handling (default: skip).
    #[serde(default)]
    pub overlap: OverlapPolicy,

    /// Stale series handling (default: keep).
    #[serde(default)]
    pub stale_series: StalePolicy,

    /// Bootstrap registry used when a domain has no server override.
    #[serde(default = "default_bootstrap_url")]
    pub bootstrap_url: String,
}

impl Default for RdapConfig {
    fn default() -> Self {
        Self {
            check_interval: DEFAULT_CHECK_INTERVAL,
            timeout: DEFAULT_TIMEOUT,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            overlap: OverlapPolicy::default(),
            stale_series: StalePolicy::default(),
            bootstrap_url: default_bootstrap_url(),
        }
    }
}

// =============================================================================
// Application Configuration
// =============================================================================

/// Top-level application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Web server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// RDAP polling configuration.
    #[serde(default)]
    pub rdap: RdapConfig,

    /// Domains to monitor, in configuration order.
    #[serde(default)]
    pub domains: Vec<Domain>,
}

impl AppConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    /// Returns `ConfigError` if the file cannot be read, parsed, or validated.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Per-domain `rdap_server_url` values are parsed at lookup time instead.
    ///
    /// # Errors
    /// Returns `ConfigError::ValidationError` if any field is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.bind.parse::<IpAddr>().map_err(|_| {
            ConfigError::ValidationError(format!(
                "invalid server bind address: '{}'",
                self.server.bind
            ))
        })?;

        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "server port must be non-zero".to_string(),
            ));
        }

        if self.rdap.check_interval < MIN_CHECK_INTERVAL {
            return Err(ConfigError::ValidationError(format!(
                "rdap check_interval must be at least {:?}",
                MIN_CHECK_INTERVAL
            )));
        }

        if self.rdap.timeout.is_zero() {
            return Err(ConfigError::ValidationError(
                "rdap timeout must be positive".to_string(),
            ));
        }

        if self.rdap.max_concurrency == 0 {
            return Err(ConfigError::ValidationError(
                "rdap max_concurrency must be positive".to_string(),
            ));
        }

        url::Url::parse(&self.rdap.bootstrap_url).map_err(|e| {
            ConfigError::ValidationError(format!(
                "invalid rdap bootstrap_url '{}': {}",
                self.rdap.bootstrap_url, e
            ))
        })?;

        let mut seen_names = HashSet::new();
        for domain in &self.domains {
            if domain.name.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "domain name cannot be empty".to_string(),
                ));
            }
            if !seen_names.insert(domain.name.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate domain: '{}'",
                    domain.name
                )));
            }
        }

        Ok(())
    }
}
