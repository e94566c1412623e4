//! RDAP Exporter - Domain Registration Metrics
//!
//! This crate polls RDAP servers for a configured list of domains and exposes
//! the results as Prometheus metrics. It can be used as a library by other
//! Rust projects, or run as a standalone binary with the `rdap-exporter`
//! executable.
//!
//! # Architecture
//!
//! - **Collector**: Interval scheduler and bounded-concurrency domain lookups
//! - **RDAP**: HTTP transport with IANA bootstrap discovery
//! - **Storage**: In-memory metric families and text exposition
//! - **Server**: Scrape endpoint and health probe
//!
//! # Metrics
//!
//! | Name | Type | Labels |
//! |------|------|--------|
//! | `rdap_domain_status` | gauge | `domain`, `status` |
//! | `rdap_domain_event` | gauge (unix seconds) | `domain`, `event` |
//! | `rdap_domain_error` | counter | `domain`, `error` |
//!
//! # Example
//!
//! ```rust,no_run
//! use prometheus::Registry;
//! use rdap_exporter::{AppConfig, MetricStore, Scheduler};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::load("config.yaml")?;
//! let registry = Registry::new();
//! let store = MetricStore::new()?;
//! store.register(&registry)?;
//!
//! let scheduler = Scheduler::from_config(&config.rdap, config.domains, store)?;
//! let cancel = CancellationToken::new();
//! scheduler.run(cancel).await;
//! # Ok(())
//! # }
//! ```

pub mod collector;
pub mod config;
pub mod rdap;
pub mod server;
pub mod storage;

pub use collector::{DomainFetcher, ErrorKind, RoundDispatcher, Scheduler};
pub use config::{AppConfig, Domain, RdapConfig};
pub use rdap::{HttpTransport, RdapTransport};
pub use storage::MetricStore;
