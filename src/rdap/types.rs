//! RDAP request and response types.

use std::time::Duration;

use serde::Deserialize;
use url::Url;

/// A single domain lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupRequest {
    /// Domain name to query.
    pub query: String,
    /// Server override; `None` means bootstrap discovery.
    pub server: Option<Url>,
    /// Upper bound for the whole network round-trip.
    pub timeout: Duration,
}

impl LookupRequest {
    /// Create a domain lookup using bootstrap discovery.
    pub fn domain(query: impl Into<String>, timeout: Duration) -> Self {
        Self {
            query: query.into(),
            server: None,
            timeout,
        }
    }

    /// Send the lookup to a specific RDAP server.
    pub fn with_server(mut self, server: Url) -> Self {
        self.server = Some(server);
        self
    }
}

/// Lifecycle event attached to an RDAP object (RFC 9083 section 4.5).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RdapEvent {
    /// Event action, e.g. `expiration` or `last update of RDAP database`.
    #[serde(rename = "eventAction")]
    pub action: String,
    /// Event date as sent by the server; expected to be RFC 3339.
    #[serde(rename = "eventDate", default)]
    pub date: String,
}

impl RdapEvent {
    /// Create an event from its action and date.
    pub fn new(action: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            date: date.into(),
        }
    }
}

/// Domain object class (RFC 9083 section 5.3), reduced to what is exported.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DomainRecord {
    /// LDH form of the domain name.
    #[serde(rename = "ldhName", default)]
    pub ldh_name: Option<String>,
    /// Raw status tokens.
    #[serde(default)]
    pub status: Vec<String>,
    /// Raw lifecycle events.
    #[serde(default)]
    pub events: Vec<RdapEvent>,
}

/// Any RDAP response object, keyed by its `objectClassName`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RdapObject {
    Domain(DomainRecord),
    Entity,
    Nameserver,
    IpNetwork,
    Autnum,
    /// Unknown or missing object class.
    Other(String),
}

impl RdapObject {
    /// Decode a response document by dispatching on `objectClassName`.
    ///
    /// # Errors
    /// Returns an error if the document claims to be a domain but does not
    /// match the domain object shape.
    pub fn from_json(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        let class = value
            .get("objectClassName")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default()
            .to_ascii_lowercase();

        Ok(match class.as_str() {
            "domain" => Self::Domain(serde_json::from_value(value)?),
            "entity" => Self::Entity,
            "nameserver" => Self::Nameserver,
            "ip network" => Self::IpNetwork,
            "autnum" => Self::Autnum,
            _ => Self::Other(class),
        })
    }

    /// Object class name, as used in log output.
    pub fn class_name(&self) -> &str {
        match self {
            Self::Domain(_) => "domain",
            Self::Entity => "entity",
            Self::Nameserver => "nameserver",
            Self::IpNetwork => "ip network",
            Self::Autnum => "autnum",
            Self::Other(name) if name.is_empty() => "unknown",
            Self::Other(name) => name,
        }
    }

    /// Consume the object, keeping only a domain record.
    pub fn into_domain(self) -> Option<DomainRecord> {
        match self {
            Self::Domain(record) => Some(record),
            _ => None,
        }
    }
}
