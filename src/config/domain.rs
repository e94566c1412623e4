//! Monitored domain definitions.

use serde::{Deserialize, Serialize};

/// A domain whose RDAP record is polled every round.
///
/// `name` is both the RDAP query key and the `domain` label of every series
/// written for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
    /// Domain name to look up (e.g., `example.com`).
    pub name: String,

    /// Absolute RDAP base URL overriding bootstrap discovery for this domain.
    ///
    /// Kept as the raw configured string: an unparsable value is reported as
    /// a per-domain collection error rather than failing the whole config.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rdap_server_url: Option<String>,
}

impl Domain {
    /// Create a domain that uses bootstrap discovery.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rdap_server_url: None,
        }
    }

    /// Pin the RDAP server used for this domain.
    pub fn with_rdap_server_url(mut self, url: impl Into<String>) -> Self {
        self.rdap_server_url = Some(url.into());
        self
    }
}
