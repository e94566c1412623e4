//! Per-domain RDAP fetch and metric update.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::DateTime;
use tokio_util::sync::CancellationToken;
use url::Url;

use super::error::{ErrorKind, FetchError};
use super::normalize::normalize_label;
use crate::config::{Domain, StalePolicy};
use crate::rdap::{DomainRecord, LookupRequest, RdapEvent, RdapObject, RdapTransport};
use crate::storage::MetricStore;

/// Raw facts of one successful domain lookup, exactly as received.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RdapLookupResult {
    pub statuses: Vec<String>,
    pub events: Vec<RdapEvent>,
}

impl From<DomainRecord> for RdapLookupResult {
    fn from(record: DomainRecord) -> Self {
        Self {
            statuses: record.status,
            events: record.events,
        }
    }
}

/// What a lookup result changed in the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplySummary {
    /// Status series written.
    pub statuses: usize,
    /// Event series written.
    pub events: usize,
    /// Events skipped because of an unparsable date.
    pub skipped_events: usize,
    /// Series removed by stale expiry.
    pub expired: usize,
}

/// Performs RDAP domain lookups with a bounded timeout.
#[derive(Clone)]
pub struct DomainFetcher {
    transport: Arc<dyn RdapTransport>,
    timeout: Duration,
}

impl DomainFetcher {
    /// Create a fetcher whose lookups are bounded by `timeout`.
    pub fn new(transport: Arc<dyn RdapTransport>, timeout: Duration) -> Self {
        Self { transport, timeout }
    }

    /// Per-lookup timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Look up one domain.
    ///
    /// An unparsable server override fails before any network call. The
    /// lookup is abandoned as soon as `cancel` fires.
    pub async fn fetch(
        &self,
        cancel: &CancellationToken,
        domain: &Domain,
    ) -> Result<RdapLookupResult, FetchError> {
        let mut request = LookupRequest::domain(&domain.name, self.timeout);
        if let Some(raw) = &domain.rdap_server_url {
            let server = Url::parse(raw).map_err(|source| FetchError::ServerUrlParse {
                url: raw.clone(),
                source,
            })?;
            request = request.with_server(server);
        }

        let object = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(FetchError::Cancelled),
            result = self.transport.lookup(&request) => result?,
        };

        match object {
            RdapObject::Domain(record) => Ok(record.into()),
            other => Err(FetchError::NotDomain {
                class: other.class_name().to_string(),
            }),
        }
    }

    /// Fetch one domain and commit the outcome to `store`.
    ///
    /// Failures are logged and counted under the domain; they never
    /// propagate beyond the returned value.
    pub async fn collect(
        &self,
        cancel: &CancellationToken,
        store: &MetricStore,
        domain: &Domain,
        generation: u64,
        stale: StalePolicy,
    ) -> Result<ApplySummary, FetchError> {
        match self.fetch(cancel, domain).await {
            Ok(result) => {
                let summary = apply_result(store, &domain.name, &result, generation, stale);
                tracing::debug!(
                    domain = %domain.name,
                    generation,
                    statuses = summary.statuses,
                    events = summary.events,
                    skipped_events = summary.skipped_events,
                    expired = summary.expired,
                    "RDAP lookup applied"
                );
                Ok(summary)
            }
            Err(e) => {
                match e.kind() {
                    Some(kind) => {
                        store.inc_error(&domain.name, kind);
                        tracing::warn!(
                            domain = %domain.name,
                            rdap_server_url = domain.rdap_server_url.as_deref().unwrap_or_default(),
                            error = %e,
                            kind = %kind,
                            "RDAP lookup failed"
                        );
                    }
                    None => tracing::debug!(domain = %domain.name, "RDAP lookup cancelled"),
                }
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for DomainFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DomainFetcher")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Parse an event date (RFC 3339) into a unix timestamp.
pub fn parse_event_date(event: &RdapEvent) -> Result<i64, FetchError> {
    DateTime::parse_from_rfc3339(&event.date)
        .map(|date| date.timestamp())
        .map_err(|source| FetchError::WrongDateFormat {
            action: event.action.clone(),
            date: event.date.clone(),
            source,
        })
}

/// Write a lookup result into the store under `domain`.
///
/// An event with a malformed date is counted and skipped; every other status
/// and event is still written. With [`StalePolicy::Expire`], series of this
/// domain missing from `result` are removed afterwards. An event whose date
/// failed to parse still counts as present.
pub fn apply_result(
    store: &MetricStore,
    domain: &str,
    result: &RdapLookupResult,
    generation: u64,
    stale: StalePolicy,
) -> ApplySummary {
    let mut summary = ApplySummary::default();
    let mut seen_statuses = HashSet::new();
    let mut seen_events = HashSet::new();

    for raw in &result.statuses {
        let status = normalize_label(raw);
        if store.set_status(domain, &status, generation) {
            summary.statuses += 1;
        }
        seen_statuses.insert(status);
    }

    for event in &result.events {
        let action = normalize_label(&event.action);
        match parse_event_date(event) {
            Ok(timestamp) => {
                if store.set_event(domain, &action, timestamp, generation) {
                    summary.events += 1;
                }
            }
            Err(e) => {
                store.inc_error(domain, ErrorKind::WrongDateFormat);
                tracing::warn!(domain = %domain, event = %event.action, error = %e, "Wrong date format");
                summary.skipped_events += 1;
            }
        }
        seen_events.insert(action);
    }

    if stale == StalePolicy::Expire {
        summary.expired = store.expire_stale(domain, &seen_statuses, &seen_events, generation);
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::fake::{FakeResponse, FakeTransport};
    use crate::rdap::DomainRecord;

    const EXPIRATION_2025: i64 = 1_735_689_600;

    fn record(statuses: &[&str], events: &[(&str, &str)]) -> DomainRecord {
        DomainRecord {
            ldh_name: None,
            status: statuses.iter().map(|s| s.to_string()).collect(),
            events: events.iter().map(|(a, d)| RdapEvent::new(*a, *d)).collect(),
        }
    }

    fn fetcher(transport: &Arc<FakeTransport>) -> DomainFetcher {
        DomainFetcher::new(transport.clone(), Duration::from_secs(5))
    }

    #[test]
    fn test_parse_event_date() {
        let event = RdapEvent::new("expiration", "2025-01-01T00:00:00Z");
        assert_eq!(parse_event_date(&event).unwrap(), EXPIRATION_2025);

        let event = RdapEvent::new("expiration", "2025-01-01T02:00:00+02:00");
        assert_eq!(parse_event_date(&event).unwrap(), EXPIRATION_2025);

        let err = parse_event_date(&RdapEvent::new("expiration", "2025-01-01")).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::WrongDateFormat));
    }

    #[tokio::test]
    async fn test_unparsable_server_url_skips_network() {
        let transport = Arc::new(FakeTransport::new().with_response(
            "example.com",
            FakeResponse::Domain(record(&["active"], &[])),
        ));
        let store = MetricStore::new().unwrap();
        let domain = Domain::new("example.com").with_rdap_server_url("not a url");

        let result = fetcher(&transport)
            .collect(&CancellationToken::new(), &store, &domain, 1, StalePolicy::Keep)
            .await;

        assert!(matches!(result, Err(FetchError::ServerUrlParse { .. })));
        assert_eq!(transport.calls(), 0);
        assert_eq!(store.error_count("example.com", ErrorKind::ServerUrlParse), 1);
        let snapshot = store.snapshot();
        assert!(snapshot.statuses.is_empty());
        assert!(snapshot.events.is_empty());
    }

    #[tokio::test]
    async fn test_server_override_is_forwarded() {
        let transport = Arc::new(FakeTransport::new().with_response(
            "example.com",
            FakeResponse::Domain(record(&[], &[])),
        ));
        let domain =
            Domain::new("example.com").with_rdap_server_url("https://example.rdap.server/v1");

        fetcher(&transport)
            .fetch(&CancellationToken::new(), &domain)
            .await
            .unwrap();

        let servers = transport.servers();
        assert_eq!(servers.len(), 1);
        assert_eq!(
            servers[0].as_ref().map(Url::as_str),
            Some("https://example.rdap.server/v1")
        );
    }

    #[tokio::test]
    async fn test_successful_lookup_is_normalized_into_store() {
        let transport = Arc::new(FakeTransport::new().with_response(
            "example.com",
            FakeResponse::Domain(record(
                &["client delete prohibited"],
                &[("expiration", "2025-01-01T00:00:00Z")],
            )),
        ));
        let store = MetricStore::new().unwrap();

        let summary = fetcher(&transport)
            .collect(
                &CancellationToken::new(),
                &store,
                &Domain::new("example.com"),
                1,
                StalePolicy::Keep,
            )
            .await
            .unwrap();

        assert_eq!(summary.statuses, 1);
        assert_eq!(summary.events, 1);
        assert_eq!(
            store.status("example.com", "client_delete_prohibited"),
            Some(1.0)
        );
        assert_eq!(
            store.event("example.com", "expiration"),
            Some(EXPIRATION_2025 as f64)
        );
    }

    #[tokio::test]
    async fn test_fetch_returns_raw_tokens() {
        let transport = Arc::new(FakeTransport::new().with_response(
            "example.com",
            FakeResponse::Domain(record(
                &["Client Delete Prohibited"],
                &[("Last Update Of RDAP Database", "bogus")],
            )),
        ));

        let result = fetcher(&transport)
            .fetch(&CancellationToken::new(), &Domain::new("example.com"))
            .await
            .unwrap();
        assert_eq!(result.statuses, vec!["Client Delete Prohibited"]);
        assert_eq!(result.events[0].action, "Last Update Of RDAP Database");
        assert_eq!(result.events[0].date, "bogus");
    }

    #[tokio::test]
    async fn test_malformed_event_date_is_skipped() {
        let transport = Arc::new(FakeTransport::new().with_response(
            "example.com",
            FakeResponse::Domain(record(
                &["active"],
                &[
                    ("registration", "yesterday"),
                    ("expiration", "2025-01-01T00:00:00Z"),
                ],
            )),
        ));
        let store = MetricStore::new().unwrap();

        let summary = fetcher(&transport)
            .collect(
                &CancellationToken::new(),
                &store,
                &Domain::new("example.com"),
                1,
                StalePolicy::Keep,
            )
            .await
            .unwrap();

        assert_eq!(summary.skipped_events, 1);
        assert_eq!(store.event("example.com", "registration"), None);
        assert_eq!(
            store.event("example.com", "expiration"),
            Some(EXPIRATION_2025 as f64)
        );
        assert_eq!(store.status("example.com", "active"), Some(1.0));
        assert_eq!(store.error_count("example.com", ErrorKind::WrongDateFormat), 1);
    }

    #[tokio::test]
    async fn test_non_domain_response() {
        let transport = Arc::new(
            FakeTransport::new().with_response("example.net", FakeResponse::Object(RdapObject::Entity)),
        );
        let store = MetricStore::new().unwrap();

        let result = fetcher(&transport)
            .collect(
                &CancellationToken::new(),
                &store,
                &Domain::new("example.net"),
                1,
                StalePolicy::Keep,
            )
            .await;

        assert!(matches!(result, Err(FetchError::NotDomain { ref class }) if class == "entity"));
        assert_eq!(store.error_count("example.net", ErrorKind::NotDomain), 1);
    }

    #[tokio::test]
    async fn test_transport_failure_counts_no_info() {
        let transport = Arc::new(FakeTransport::new());
        let store = MetricStore::new().unwrap();

        let result = fetcher(&transport)
            .collect(
                &CancellationToken::new(),
                &store,
                &Domain::new("unknown.example"),
                1,
                StalePolicy::Keep,
            )
            .await;

        assert!(matches!(result, Err(FetchError::NoInfo(_))));
        assert_eq!(store.error_count("unknown.example", ErrorKind::NoInfo), 1);
    }

    #[tokio::test]
    async fn test_cancelled_lookup_is_not_counted() {
        let transport = Arc::new(
            FakeTransport::new()
                .with_response("example.com", FakeResponse::Domain(record(&["active"], &[])))
                .with_fixed_latency(Duration::from_secs(60)),
        );
        let store = MetricStore::new().unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = fetcher(&transport)
            .collect(&cancel, &store, &Domain::new("example.com"), 1, StalePolicy::Keep)
            .await;

        assert!(matches!(result, Err(FetchError::Cancelled)));
        assert_eq!(store.snapshot().series_count(), 0);
    }

    #[test]
    fn test_apply_result_expires_missing_series() {
        let store = MetricStore::new().unwrap();
        let first = RdapLookupResult {
            statuses: vec!["active".into(), "client hold".into()],
            events: vec![
                RdapEvent::new("expiration", "2025-01-01T00:00:00Z"),
                RdapEvent::new("registration", "2020-01-01T00:00:00Z"),
            ],
        };
        apply_result(&store, "example.com", &first, 1, StalePolicy::Expire);

        let second = RdapLookupResult {
            statuses: vec!["active".into()],
            events: vec![
                RdapEvent::new("expiration", "2026-01-01T00:00:00Z"),
                RdapEvent::new("registration", "garbage"),
            ],
        };
        let summary = apply_result(&store, "example.com", &second, 2, StalePolicy::Expire);

        assert_eq!(summary.expired, 1);
        assert_eq!(store.status("example.com", "client_hold"), None);
        assert_eq!(store.status("example.com", "active"), Some(1.0));
        // Present but unparsable: previous value survives.
        assert!(store.event("example.com", "registration").is_some());
    }

    #[test]
    fn test_apply_result_keeps_stale_series_by_default() {
        let store = MetricStore::new().unwrap();
        let first = RdapLookupResult {
            statuses: vec!["client hold".into()],
            events: vec![],
        };
        apply_result(&store, "example.com", &first, 1, StalePolicy::Keep);
        apply_result(&store, "example.com", &RdapLookupResult::default(), 2, StalePolicy::Keep);

        assert_eq!(store.status("example.com", "client_hold"), Some(1.0));
    }
}
