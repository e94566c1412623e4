//! RDAP transport over HTTP.

use reqwest::Client;
use reqwest::header::ACCEPT;
use tokio::time::timeout;
use url::Url;

use super::bootstrap::BootstrapRegistry;
use super::error::TransportError;
use super::types::{LookupRequest, RdapObject};

/// Media type registered for RDAP responses.
const RDAP_MEDIA_TYPE: &str = "application/rdap+json, application/json;q=0.9";

/// Capability to resolve a domain lookup into an RDAP object.
///
/// The collection engine only depends on this trait; the HTTP wire protocol
/// lives in [`HttpTransport`].
#[async_trait::async_trait]
pub trait RdapTransport: Send + Sync + 'static {
    /// Perform one lookup, bounded by `request.timeout`.
    async fn lookup(&self, request: &LookupRequest) -> Result<RdapObject, TransportError>;
}

/// RDAP client backed by `reqwest`.
///
/// Requests without a server override are routed through the bootstrap
/// registry at `bootstrap_url`.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    bootstrap_url: Url,
}

impl HttpTransport {
    /// Create a transport resolving authorities through `bootstrap_url`.
    ///
    /// # Errors
    /// Returns `TransportError` if the URL is invalid or the HTTP client
    /// cannot be built.
    pub fn new(bootstrap_url: &str) -> Result<Self, TransportError> {
        let bootstrap_url = Url::parse(bootstrap_url)?;
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            bootstrap_url,
        })
    }

    async fn lookup_inner(&self, request: &LookupRequest) -> Result<RdapObject, TransportError> {
        let server = match &request.server {
            Some(server) => server.clone(),
            None => self.discover(&request.query).await?,
        };
        let url = domain_url(&server, &request.query)?;

        tracing::debug!(domain = %request.query, url = %url, "RDAP domain lookup");
        let value: serde_json::Value = self.get_json(url).await?;
        Ok(RdapObject::from_json(value)?)
    }

    async fn discover(&self, query: &str) -> Result<Url, TransportError> {
        let registry: BootstrapRegistry = serde_json::from_value(
            self.get_json(self.bootstrap_url.clone()).await?,
        )?;
        registry
            .resolve(query)
            .ok_or_else(|| TransportError::NoBootstrapMatch(query.to_string()))
    }

    async fn get_json(&self, url: Url) -> Result<serde_json::Value, TransportError> {
        let response = self
            .client
            .get(url.clone())
            .header(ACCEPT, RDAP_MEDIA_TYPE)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("bootstrap_url", &self.bootstrap_url.as_str())
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl RdapTransport for HttpTransport {
    async fn lookup(&self, request: &LookupRequest) -> Result<RdapObject, TransportError> {
        match timeout(request.timeout, self.lookup_inner(request)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout(request.timeout)),
        }
    }
}

/// Build `{base}/domain/{query}`, keeping any path prefix of `base`.
fn domain_url(base: &Url, query: &str) -> Result<Url, TransportError> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    Ok(base.join(&format!("domain/{query}"))?)
}
