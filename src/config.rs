//! Configuration module for the RDAP exporter.
//!
//! Provides YAML-based configuration loading and validation for:
//! - Server settings (port, bind address)
//! - Polling settings (interval, timeout, concurrency, overlap and stale policies)
//! - The list of monitored domains

mod app;
mod domain;
mod validation;

pub use app::{AppConfig, OverlapPolicy, RdapConfig, ServerConfig, StalePolicy};
pub use domain::Domain;
pub use validation::{ConfigError, parse_duration};

// Re-export constants
pub use app::{
    DEFAULT_BOOTSTRAP_URL, DEFAULT_CHECK_INTERVAL, DEFAULT_CONFIG_FILE, DEFAULT_MAX_CONCURRENCY,
    DEFAULT_PORT, DEFAULT_TIMEOUT, MIN_CHECK_INTERVAL,
};
