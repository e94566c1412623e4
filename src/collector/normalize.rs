//! Label value normalization.

/// Turn a free-text RDAP token into a metric label value.
///
/// Lower-cases the input and replaces every space with an underscore:
/// `"client transfer prohibited"` becomes `"client_transfer_prohibited"`.
/// No allow-listing is applied; label cardinality is bounded only by what
/// the RDAP servers send.
pub fn normalize_label(token: &str) -> String {
    token.replace(' ', "_").to_lowercase()
}
