//! RDAP Transport
//!
//! Domain lookups against RDAP servers (RFC 9082/9083):
//!
//! - [`RdapTransport`]: lookup capability consumed by the collector
//! - [`HttpTransport`]: `reqwest` implementation with bootstrap discovery
//! - [`RdapObject`] / [`DomainRecord`]: decoded response objects

mod bootstrap;
mod client;
mod error;
mod types;

pub use bootstrap::BootstrapRegistry;
pub use client::{HttpTransport, RdapTransport};
pub use error::TransportError;
pub use types::{DomainRecord, LookupRequest, RdapEvent, RdapObject};
