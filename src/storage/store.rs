//! Concurrent metric store.
//!
//! Three families back the exported series:
//!
//! | Family | Labels | Value |
//! |---|---|---|
//! | `rdap_domain_status` | `domain`, `status` | `1` while the status is present |
//! | `rdap_domain_event` | `domain`, `event` | unix timestamp of the event |
//! | `rdap_domain_error` | `domain`, `error` | monotonic error count |
//!
//! Each family is guarded by its own mutex. Gauge writes carry the round
//! generation that produced them; a write older than the last one applied to
//! the same series is dropped, so overlapping rounds converge on the newest
//! data regardless of completion order.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use prometheus::core::{Collector, Desc};
use prometheus::proto::MetricFamily;
use prometheus::{GaugeVec, IntCounterVec, Opts, Registry};

use super::error::StorageError;
use super::types::{Sample, SeriesKey, StoreSnapshot};
use crate::collector::ErrorKind;

/// Metric namespace shared by all families.
pub const NAMESPACE: &str = "rdap";

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone, Copy)]
struct Stamp {
    generation: u64,
    live: bool,
}

/// Gauge family with per-series generation stamps.
///
/// Expired series keep a tombstone stamp so a late write from an older
/// round cannot resurrect them.
struct GaugeFamily {
    vec: GaugeVec,
    stamps: Mutex<HashMap<SeriesKey, Stamp>>,
}

impl GaugeFamily {
    fn new(name: &str, help: &str, label: &str) -> Result<Self, StorageError> {
        let vec = GaugeVec::new(Opts::new(name, help).namespace(NAMESPACE), &["domain", label])?;
        Ok(Self {
            vec,
            stamps: Mutex::new(HashMap::new()),
        })
    }

    fn set(&self, domain: &str, label: &str, value: f64, generation: u64) -> bool {
        let mut stamps = lock(&self.stamps);
        let key = SeriesKey::new(domain, label);
        if stamps
            .get(&key)
            .is_some_and(|stamp| stamp.generation > generation)
        {
            return false;
        }
        self.vec.with_label_values(&[domain, label]).set(value);
        stamps.insert(
            key,
            Stamp {
                generation,
                live: true,
            },
        );
        true
    }

    fn get(&self, domain: &str, label: &str) -> Option<f64> {
        let stamps = lock(&self.stamps);
        stamps
            .get(&SeriesKey::new(domain, label))
            .filter(|stamp| stamp.live)
            .map(|_| self.vec.with_label_values(&[domain, label]).get())
    }

    /// Remove live series of `domain` whose label is not in `keep`.
    fn retain(&self, domain: &str, keep: &HashSet<String>, generation: u64) -> usize {
        let mut stamps = lock(&self.stamps);
        let mut removed = 0;
        for (key, stamp) in stamps.iter_mut() {
            if key.domain != domain
                || !stamp.live
                || stamp.generation > generation
                || keep.contains(&key.label)
            {
                continue;
            }
            let labels = [key.domain.as_str(), key.label.as_str()];
            if let Err(e) = self.vec.remove_label_values(&labels) {
                tracing::warn!(domain = %key.domain, label = %key.label, error = %e, "Failed to remove series");
            }
            *stamp = Stamp {
                generation,
                live: false,
            };
            removed += 1;
        }
        removed
    }

    fn samples(&self) -> Vec<Sample> {
        let stamps = lock(&self.stamps);
        let mut samples: Vec<Sample> = stamps
            .iter()
            .filter(|(_, stamp)| stamp.live)
            .map(|(key, _)| Sample {
                domain: key.domain.clone(),
                label: key.label.clone(),
                value: self
                    .vec
                    .with_label_values(&[key.domain.as_str(), key.label.as_str()])
                    .get(),
            })
            .collect();
        samples.sort_by(|a, b| (&a.domain, &a.label).cmp(&(&b.domain, &b.label)));
        samples
    }
}

/// Counter family; series are never removed.
struct CounterFamily {
    vec: IntCounterVec,
    seen: Mutex<HashSet<SeriesKey>>,
}

impl CounterFamily {
    fn new(name: &str, help: &str, label: &str) -> Result<Self, StorageError> {
        let vec =
            IntCounterVec::new(Opts::new(name, help).namespace(NAMESPACE), &["domain", label])?;
        Ok(Self {
            vec,
            seen: Mutex::new(HashSet::new()),
        })
    }

    fn inc(&self, domain: &str, label: &str) {
        let mut seen = lock(&self.seen);
        self.vec.with_label_values(&[domain, label]).inc();
        seen.insert(SeriesKey::new(domain, label));
    }

    fn get(&self, domain: &str, label: &str) -> u64 {
        let seen = lock(&self.seen);
        if seen.contains(&SeriesKey::new(domain, label)) {
            self.vec.with_label_values(&[domain, label]).get()
        } else {
            0
        }
    }

    fn samples(&self) -> Vec<Sample> {
        let seen = lock(&self.seen);
        let mut samples: Vec<Sample> = seen
            .iter()
            .map(|key| Sample {
                domain: key.domain.clone(),
                label: key.label.clone(),
                value: self
                    .vec
                    .with_label_values(&[key.domain.as_str(), key.label.as_str()])
                    .get() as f64,
            })
            .collect();
        samples.sort_by(|a, b| (&a.domain, &a.label).cmp(&(&b.domain, &b.label)));
        samples
    }
}

struct Inner {
    statuses: GaugeFamily,
    events: GaugeFamily,
    errors: CounterFamily,
}

/// Process-lifetime metric state shared by every fetch task and the scrape
/// endpoint.
///
/// Cloning is cheap and yields a handle to the same state. The store is never
/// registered globally: callers hand it to a [`Registry`] explicitly via
/// [`MetricStore::register`].
#[derive(Clone)]
pub struct MetricStore {
    inner: Arc<Inner>,
}

impl MetricStore {
    /// Create an empty store with the three metric families.
    ///
    /// # Errors
    /// Returns `StorageError::Metrics` if a metric descriptor is invalid.
    pub fn new() -> Result<Self, StorageError> {
        Ok(Self {
            inner: Arc::new(Inner {
                statuses: GaugeFamily::new("domain_status", "Domain status codes.", "status")?,
                events: GaugeFamily::new(
                    "domain_event",
                    "Dates pertaining to the domain as a unix timestamp.",
                    "event",
                )?,
                errors: CounterFamily::new(
                    "domain_error",
                    "Count of errors encountered per domain and error type.",
                    "error",
                )?,
            }),
        })
    }

    /// Register this store with a scrape registry.
    pub fn register(&self, registry: &Registry) -> Result<(), StorageError> {
        registry.register(Box::new(self.clone()))?;
        Ok(())
    }

    /// Mark `status` as present for `domain`.
    ///
    /// Returns `false` if a newer round already wrote this series.
    pub fn set_status(&self, domain: &str, status: &str, generation: u64) -> bool {
        self.inner.statuses.set(domain, status, 1.0, generation)
    }

    /// Record the unix timestamp of `event` for `domain`.
    ///
    /// Returns `false` if a newer round already wrote this series.
    pub fn set_event(&self, domain: &str, event: &str, timestamp: i64, generation: u64) -> bool {
        self.inner
            .events
            .set(domain, event, timestamp as f64, generation)
    }

    /// Count one error of `kind` for `domain`.
    pub fn inc_error(&self, domain: &str, kind: ErrorKind) {
        self.inner.errors.inc(domain, kind.as_str());
    }

    /// Drop status and event series of `domain` absent from the latest
    /// successful lookup. Series written by a newer round are left alone.
    ///
    /// Returns the number of series removed.
    pub fn expire_stale(
        &self,
        domain: &str,
        statuses: &HashSet<String>,
        events: &HashSet<String>,
        generation: u64,
    ) -> usize {
        self.inner.statuses.retain(domain, statuses, generation)
            + self.inner.events.retain(domain, events, generation)
    }

    /// Current value of a status series, if present.
    pub fn status(&self, domain: &str, status: &str) -> Option<f64> {
        self.inner.statuses.get(domain, status)
    }

    /// Current value of an event series, if present.
    pub fn event(&self, domain: &str, event: &str) -> Option<f64> {
        self.inner.events.get(domain, event)
    }

    /// Current error count; zero if never incremented.
    pub fn error_count(&self, domain: &str, kind: ErrorKind) -> u64 {
        self.inner.errors.get(domain, kind.as_str())
    }

    /// Copy every live series.
    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            statuses: self.inner.statuses.samples(),
            events: self.inner.events.samples(),
            errors: self.inner.errors.samples(),
        }
    }

    /// Metric descriptors of the three families.
    pub fn describe(&self) -> Vec<&Desc> {
        Collector::desc(self)
    }
}

impl std::fmt::Debug for MetricStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricStore")
            .field("series", &self.snapshot().series_count())
            .finish()
    }
}

impl Collector for MetricStore {
    fn desc(&self) -> Vec<&Desc> {
        let inner = &*self.inner;
        inner
            .statuses
            .vec
            .desc()
            .into_iter()
            .chain(inner.events.vec.desc())
            .chain(inner.errors.vec.desc())
            .collect()
    }

    fn collect(&self) -> Vec<MetricFamily> {
        let inner = &*self.inner;
        let mut families = Collector::collect(&inner.statuses.vec);
        families.extend(Collector::collect(&inner.events.vec));
        families.extend(Collector::collect(&inner.errors.vec));
        families
    }
}
