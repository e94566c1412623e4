//! In-memory transport for engine tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use rand::Rng;
use url::Url;

use crate::rdap::{DomainRecord, LookupRequest, RdapObject, RdapTransport, TransportError};

pub(crate) enum FakeResponse {
    Domain(DomainRecord),
    Object(RdapObject),
}

enum Latency {
    None,
    Fixed(Duration),
    Random(Duration),
}

/// Answers lookups from a fixed table and records how it was called.
///
/// Unknown queries fail with a 404 status error.
pub(crate) struct FakeTransport {
    responses: HashMap<String, FakeResponse>,
    scripted: Mutex<HashMap<String, VecDeque<(Duration, FakeResponse)>>>,
    latency: Latency,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    servers: Mutex<Vec<Option<Url>>>,
}

impl FakeTransport {
    pub(crate) fn new() -> Self {
        Self {
            responses: HashMap::new(),
            scripted: Mutex::new(HashMap::new()),
            latency: Latency::None,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            servers: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_response(mut self, query: &str, response: FakeResponse) -> Self {
        self.responses.insert(query.to_string(), response);
        self
    }

    /// Queue a one-shot answer for `query`, delayed by `latency`.
    ///
    /// Queued answers are served in order before the fixed table.
    pub(crate) fn with_scripted_response(
        self,
        query: &str,
        latency: Duration,
        response: FakeResponse,
    ) -> Self {
        self.scripted
            .lock()
            .unwrap()
            .entry(query.to_string())
            .or_default()
            .push_back((latency, response));
        self
    }

    pub(crate) fn with_fixed_latency(mut self, latency: Duration) -> Self {
        self.latency = Latency::Fixed(latency);
        self
    }

    pub(crate) fn with_random_latency(mut self, max: Duration) -> Self {
        self.latency = Latency::Random(max);
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub(crate) fn servers(&self) -> Vec<Option<Url>> {
        self.servers.lock().unwrap().clone()
    }

    fn delay(&self) -> Duration {
        match self.latency {
            Latency::None => Duration::ZERO,
            Latency::Fixed(d) => d,
            Latency::Random(max) => {
                let millis = max.as_millis().max(1) as u64;
                Duration::from_millis(rand::thread_rng().gen_range(0..millis))
            }
        }
    }
}

#[async_trait::async_trait]
impl RdapTransport for FakeTransport {
    async fn lookup(&self, request: &LookupRequest) -> Result<RdapObject, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.servers.lock().unwrap().push(request.server.clone());

        let scripted = self
            .scripted
            .lock()
            .unwrap()
            .get_mut(&request.query)
            .and_then(VecDeque::pop_front);

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let delay = match &scripted {
            Some((latency, _)) => *latency,
            None => self.delay(),
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if let Some((_, response)) = scripted {
            return match response {
                FakeResponse::Domain(record) => Ok(RdapObject::Domain(record)),
                FakeResponse::Object(object) => Ok(object),
            };
        }

        match self.responses.get(&request.query) {
            Some(FakeResponse::Domain(record)) => Ok(RdapObject::Domain(record.clone())),
            Some(FakeResponse::Object(object)) => Ok(object.clone()),
            None => Err(TransportError::Status {
                url: format!("fake://{}", request.query),
                status: 404,
            }),
        }
    }
}
