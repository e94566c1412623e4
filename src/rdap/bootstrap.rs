//! DNS bootstrap registry (RFC 9224).
//!
//! Maps a domain to the RDAP base URL of its registry by longest matching
//! label suffix. The registry document is fetched per lookup; nothing here
//! caches it.

use serde::Deserialize;
use url::Url;

/// Parsed bootstrap registry document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BootstrapRegistry {
    /// `[[entries], [service urls]]` pairs.
    #[serde(default)]
    pub services: Vec<(Vec<String>, Vec<String>)>,
}

impl BootstrapRegistry {
    /// Find the RDAP base URL responsible for `domain`.
    ///
    /// Tries every label suffix from the longest to the shortest, so
    /// `foo.example.co.uk` prefers a `co.uk` entry over `uk`. Among the
    /// service URLs of the matching entry an `https` one wins.
    pub fn resolve(&self, domain: &str) -> Option<Url> {
        let domain = domain.trim_end_matches('.').to_ascii_lowercase();
        let labels: Vec<&str> = domain.split('.').filter(|l| !l.is_empty()).collect();

        (0..labels.len()).find_map(|start| {
            let suffix = labels[start..].join(".");
            self.services
                .iter()
                .find(|(entries, _)| entries.iter().any(|e| e.eq_ignore_ascii_case(&suffix)))
                .and_then(|(_, urls)| preferred_url(urls))
        })
    }
}

fn preferred_url(urls: &[String]) -> Option<Url> {
    let parsed: Vec<Url> = urls.iter().filter_map(|u| Url::parse(u).ok()).collect();
    parsed
        .iter()
        .find(|u| u.scheme() == "https")
        .or_else(|| parsed.first())
        .cloned()
}
