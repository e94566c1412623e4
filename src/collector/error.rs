//! Collection error taxonomy.

use thiserror::Error;

use crate::rdap::TransportError;

/// Closed set of per-domain failure kinds.
///
/// The label values are consumed by dashboards and alerts: adding a kind is
/// compatible, renaming one is not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorKind {
    /// The per-domain server override is not an absolute URL.
    ServerUrlParse,
    /// The lookup failed (network, timeout, protocol, payload).
    NoInfo,
    /// The response object is not a domain record.
    NotDomain,
    /// An event date is not RFC 3339.
    WrongDateFormat,
}

impl ErrorKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 4] = [
        Self::ServerUrlParse,
        Self::NoInfo,
        Self::NotDomain,
        Self::WrongDateFormat,
    ];

    /// Stable `error` label value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ServerUrlParse => "rdap_server_url_parse_error",
            Self::NoInfo => "rdap_no_info",
            Self::NotDomain => "rdap_response_not_domain",
            Self::WrongDateFormat => "rdap_wrong_date_format",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of one domain lookup or of one event inside it.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Server override could not be parsed; no request was made.
    #[error("could not parse rdap_server_url '{url}': {source}")]
    ServerUrlParse {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// Lookup request failed.
    #[error("could not get RDAP info: {0}")]
    NoInfo(#[from] TransportError),

    /// Response was some other RDAP object class.
    #[error("RDAP response is not a domain object (got {class})")]
    NotDomain { class: String },

    /// Event date is not RFC 3339.
    #[error("wrong date format for event '{action}': '{date}': {source}")]
    WrongDateFormat {
        action: String,
        date: String,
        #[source]
        source: chrono::ParseError,
    },

    /// Shutdown was requested before the lookup finished.
    #[error("lookup cancelled")]
    Cancelled,
}

impl FetchError {
    /// Taxonomy kind; `None` for cancellation, which is not counted.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::ServerUrlParse { .. } => Some(ErrorKind::ServerUrlParse),
            Self::NoInfo(_) => Some(ErrorKind::NoInfo),
            Self::NotDomain { .. } => Some(ErrorKind::NotDomain),
            Self::WrongDateFormat { .. } => Some(ErrorKind::WrongDateFormat),
            Self::Cancelled => None,
        }
    }
}

/// Errors that prevent the collection engine from being built.
#[derive(Debug, Error)]
pub enum CollectorError {
    /// Transport could not be constructed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}
