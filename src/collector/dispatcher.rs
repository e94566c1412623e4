//! Round dispatcher: fans one collection round out over all domains.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use super::error::{ErrorKind, FetchError};
use super::fetcher::DomainFetcher;
use crate::config::{Domain, StalePolicy};
use crate::storage::MetricStore;

/// Result of one completed round.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoundOutcome {
    /// Round generation.
    pub generation: u64,
    /// Domains whose lookup was applied.
    pub succeeded: usize,
    /// Failed domains and their error kind.
    pub failed: Vec<(String, ErrorKind)>,
    /// Domains abandoned because of cancellation.
    pub cancelled: usize,
    /// Tasks that panicked.
    pub panicked: usize,
    /// Wall-clock duration of the round.
    pub elapsed: Duration,
}

/// Runs rounds of per-domain fetch tasks.
///
/// Every round gets a fresh generation number and owns a [`JoinSet`] of its
/// tasks. Lookups across all rounds share one semaphore, so at most
/// `max_concurrency` requests are in flight at any time; the rest wait.
#[derive(Clone)]
pub struct RoundDispatcher {
    fetcher: DomainFetcher,
    store: MetricStore,
    domains: Arc<[Domain]>,
    permits: Arc<Semaphore>,
    stale: StalePolicy,
    generation: Arc<AtomicU64>,
}

impl RoundDispatcher {
    /// Create a dispatcher for `domains`.
    ///
    /// `max_concurrency` is clamped to at least one.
    pub fn new(
        fetcher: DomainFetcher,
        store: MetricStore,
        domains: impl Into<Arc<[Domain]>>,
        max_concurrency: usize,
        stale: StalePolicy,
    ) -> Self {
        Self {
            fetcher,
            store,
            domains: domains.into(),
            permits: Arc::new(Semaphore::new(max_concurrency.max(1))),
            stale,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Configured domains.
    pub fn domains(&self) -> &[Domain] {
        &self.domains
    }

    /// Shared metric store.
    pub fn store(&self) -> &MetricStore {
        &self.store
    }

    /// Start a round inside `rounds` and return its generation immediately.
    pub fn dispatch(&self, rounds: &mut JoinSet<RoundOutcome>, cancel: &CancellationToken) -> u64 {
        let generation = self.next_generation();
        let dispatcher = self.clone();
        let cancel = cancel.clone();
        rounds.spawn(async move { dispatcher.run_round(cancel, generation).await });
        generation
    }

    /// Allocate a generation and run one round to completion.
    pub async fn run_once(&self, cancel: CancellationToken) -> RoundOutcome {
        let generation = self.next_generation();
        self.run_round(cancel, generation).await
    }

    /// Run one round: one task per domain, awaited as a group.
    ///
    /// A failing or slow domain never affects its siblings. Dropping the
    /// returned future aborts every task of the round.
    pub async fn run_round(&self, cancel: CancellationToken, generation: u64) -> RoundOutcome {
        let start = Instant::now();
        let mut tasks = JoinSet::new();

        tracing::debug!(generation, domains = self.domains.len(), "Round started");

        for domain in self.domains.iter().cloned() {
            let fetcher = self.fetcher.clone();
            let store = self.store.clone();
            let permits = Arc::clone(&self.permits);
            let cancel = cancel.clone();
            let stale = self.stale;

            tasks.spawn(async move {
                let _permit = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return (domain.name, Err(FetchError::Cancelled)),
                    permit = permits.acquire_owned() => match permit {
                        Ok(permit) => permit,
                        Err(_) => return (domain.name, Err(FetchError::Cancelled)),
                    },
                };
                let result = fetcher
                    .collect(&cancel, &store, &domain, generation, stale)
                    .await;
                (domain.name, result)
            });
        }

        let mut outcome = RoundOutcome {
            generation,
            ..Default::default()
        };

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(_))) => outcome.succeeded += 1,
                Ok((name, Err(e))) => match e.kind() {
                    Some(kind) => outcome.failed.push((name, kind)),
                    None => outcome.cancelled += 1,
                },
                Err(e) => {
                    tracing::error!(generation, error = %e, "Domain task panicked");
                    outcome.panicked += 1;
                }
            }
        }

        outcome.elapsed = start.elapsed();
        outcome
    }

    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }
}

impl std::fmt::Debug for RoundDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoundDispatcher")
            .field("domains", &self.domains.len())
            .field("available_permits", &self.permits.available_permits())
            .field("stale", &self.stale)
            .field("generation", &self.generation.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}
