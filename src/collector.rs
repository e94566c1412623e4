//! Collector Layer
//!
//! Periodic RDAP polling engine that writes domain metrics into the
//! [`MetricStore`](crate::storage::MetricStore). Collection runs on its own
//! schedule; scrapes only read the store.
//!
//! # Architecture
//!
//! - [`Scheduler`]: Fires one round immediately, then one per interval
//! - [`RoundDispatcher`]: Fans a round out over all domains with bounded concurrency
//! - [`DomainFetcher`]: Looks up one domain and commits the result
//! - [`apply_result`]: Turns a lookup result into status/event series
//!
//! # Example
//!
//! ```rust,no_run
//! use rdap_exporter::collector::Scheduler;
//! use rdap_exporter::config::{Domain, RdapConfig};
//! use rdap_exporter::storage::MetricStore;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let store = MetricStore::new()?;
//! let scheduler = Scheduler::from_config(
//!     &RdapConfig::default(),
//!     vec![Domain::new("example.com")],
//!     store.clone(),
//! )?;
//! let cancel = CancellationToken::new();
//! tokio::spawn(scheduler.run(cancel.clone()));
//! # Ok(())
//! # }
//! ```

mod dispatcher;
mod error;
mod fetcher;
mod normalize;
mod scheduler;

#[cfg(test)]
mod fake;

pub use dispatcher::{RoundDispatcher, RoundOutcome};
pub use error::{CollectorError, ErrorKind, FetchError};
pub use fetcher::{ApplySummary, DomainFetcher, RdapLookupResult, apply_result, parse_event_date};
pub use normalize::normalize_label;
pub use scheduler::{DEFAULT_SHUTDOWN_TIMEOUT, Scheduler};
