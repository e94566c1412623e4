//! Prometheus text exposition of a registry.

use prometheus::{Encoder, Registry, TextEncoder};

use super::error::StorageError;

/// Content type of the text exposition format.
pub fn text_content_type() -> String {
    TextEncoder::new().format_type().to_string()
}

/// Gather every registered collector and encode it in the text format.
///
/// # Errors
/// Returns `StorageError` if encoding fails.
pub fn encode_text(registry: &Registry) -> Result<String, StorageError> {
    let families = registry.gather();
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::ErrorKind;
    use crate::storage::MetricStore;

    #[test]
    fn test_encode_store_series() {
        let registry = Registry::new();
        let store = MetricStore::new().unwrap();
        store.register(&registry).unwrap();

        store.set_status("example.com", "client_delete_prohibited", 1);
        store.set_event("example.com", "expiration", 1_735_689_600, 1);
        store.inc_error("example.net", ErrorKind::NotDomain);

        let text = encode_text(&registry).unwrap();
        assert!(text.contains("# TYPE rdap_domain_status gauge"));
        assert!(text.contains(
            "rdap_domain_status{domain=\"example.com\",status=\"client_delete_prohibited\"} 1"
        ));
        assert!(
            text.contains("rdap_domain_event{domain=\"example.com\",event=\"expiration\"} 1735689600")
        );
        assert!(text.contains("# TYPE rdap_domain_error counter"));
        assert!(text.contains(
            "rdap_domain_error{domain=\"example.net\",error=\"rdap_response_not_domain\"} 1"
        ));
    }

    #[test]
    fn test_content_type() {
        assert!(text_content_type().starts_with("text/plain"));
    }
}
