//! Interval scheduler driving collection rounds.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::{JoinError, JoinSet};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::dispatcher::{RoundDispatcher, RoundOutcome};
use super::error::CollectorError;
use super::fetcher::DomainFetcher;
use crate::config::{Domain, MIN_CHECK_INTERVAL, OverlapPolicy, RdapConfig};
use crate::rdap::{HttpTransport, RdapTransport};
use crate::storage::MetricStore;

/// Default timeout for draining in-flight rounds on shutdown (5 seconds).
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Drives collection rounds on a fixed interval, independent of scrapes.
#[derive(Debug)]
pub struct Scheduler {
    dispatcher: RoundDispatcher,
    interval: Duration,
    overlap: OverlapPolicy,
}

impl Scheduler {
    /// Create a scheduler.
    ///
    /// Interval is clamped to a minimum of 1 second.
    pub fn new(dispatcher: RoundDispatcher, interval: Duration, overlap: OverlapPolicy) -> Self {
        let interval = if interval < MIN_CHECK_INTERVAL {
            tracing::warn!(min_interval = ?MIN_CHECK_INTERVAL,
                "Interval duration is less than minimum allowed. Using minimum duration."
            );
            MIN_CHECK_INTERVAL
        } else {
            interval
        };

        Self {
            dispatcher,
            interval,
            overlap,
        }
    }

    /// Build the full engine from configuration with a custom transport.
    pub fn with_transport(
        config: &RdapConfig,
        domains: Vec<Domain>,
        transport: Arc<dyn RdapTransport>,
        store: MetricStore,
    ) -> Self {
        let fetcher = DomainFetcher::new(transport, config.timeout);
        let dispatcher = RoundDispatcher::new(
            fetcher,
            store,
            domains,
            config.max_concurrency,
            config.stale_series,
        );
        Self::new(dispatcher, config.check_interval, config.overlap)
    }

    /// Build the full engine from configuration using the HTTP transport.
    ///
    /// # Errors
    /// Returns `CollectorError::Transport` if the HTTP client cannot be built.
    pub fn from_config(
        config: &RdapConfig,
        domains: Vec<Domain>,
        store: MetricStore,
    ) -> Result<Self, CollectorError> {
        let transport = HttpTransport::new(&config.bootstrap_url)?;
        Ok(Self::with_transport(config, domains, Arc::new(transport), store))
    }

    /// Round dispatcher driven by this scheduler.
    pub fn dispatcher(&self) -> &RoundDispatcher {
        &self.dispatcher
    }

    /// Effective interval between rounds.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run until `cancel` fires.
    ///
    /// The first round starts immediately. With [`OverlapPolicy::Skip`] a
    /// tick is skipped while a round is still in flight. Cancellation is
    /// shared with every in-flight fetch; after it fires the remaining
    /// rounds are drained (bounded by [`DEFAULT_SHUTDOWN_TIMEOUT`]) and
    /// partial writes are kept.
    pub async fn run(self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut rounds: JoinSet<RoundOutcome> = JoinSet::new();

        tracing::info!(
            interval = ?self.interval,
            domains = self.dispatcher.domains().len(),
            overlap = ?self.overlap,
            "Collection scheduler started"
        );

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                Some(joined) = rounds.join_next(), if !rounds.is_empty() => log_round(joined),
                _ = ticker.tick() => self.on_tick(&mut rounds, &cancel),
            }
        }

        let in_flight = rounds.len();
        let drained = tokio::time::timeout(DEFAULT_SHUTDOWN_TIMEOUT, async {
            while let Some(joined) = rounds.join_next().await {
                log_round(joined);
            }
        })
        .await;

        if drained.is_err() {
            tracing::warn!(in_flight, "Collection scheduler shutdown timed out");
            rounds.abort_all();
        } else {
            tracing::info!(in_flight, "Collection scheduler shutdown complete");
        }
    }

    fn on_tick(&self, rounds: &mut JoinSet<RoundOutcome>, cancel: &CancellationToken) {
        if self.overlap == OverlapPolicy::Skip && !rounds.is_empty() {
            tracing::warn!(
                in_flight = rounds.len(),
                "Previous round still running, skipping tick"
            );
            return;
        }
        let generation = self.dispatcher.dispatch(rounds, cancel);
        tracing::debug!(generation, in_flight = rounds.len(), "Round dispatched");
    }
}

fn log_round(joined: Result<RoundOutcome, JoinError>) {
    match joined {
        Ok(outcome) => tracing::info!(
            generation = outcome.generation,
            succeeded = outcome.succeeded,
            failed = outcome.failed.len(),
            cancelled = outcome.cancelled,
            panicked = outcome.panicked,
            duration_ms = outcome.elapsed.as_millis(),
            "Round completed"
        ),
        Err(e) if e.is_cancelled() => tracing::debug!("Round aborted"),
        Err(e) => tracing::error!(error = %e, "Round task failed"),
    }
}
