//! Target address resolution
//!
//! An address supplied by the caller may carry a scheme or not; the wire URL
//! always gets its scheme from the request's SSL flag. Any scheme already
//! present is stripped first, so the flag is authoritative.

use std::collections::HashMap;

use url::Url;

use crate::error::Error;

/// Resolve a caller-supplied address into a parsed wire URL.
///
/// Query parameters are appended percent-encoded; pairs already present in
/// the address survive. Parameter ordering on the wire is unspecified.
pub(crate) fn resolve(
    address: &str,
    use_ssl: bool,
    query: &HashMap<String, String>,
) -> Result<Url, Error> {
    let scheme = if use_ssl { "https" } else { "http" };
    let mut url = Url::parse(&format!("{}://{}", scheme, strip_scheme(address)))?;

    if !query.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in query {
            pairs.append_pair(key, value);
        }
    }

    Ok(url)
}

/// Strip a leading `http://` or `https://` case-insensitively, if present.
pub(crate) fn strip_scheme(address: &str) -> &str {
    for prefix in ["http://", "https://"] {
        if address.len() >= prefix.len() && address[..prefix.len()].eq_ignore_ascii_case(prefix) {
            return &address[prefix.len()..];
        }
    }
    address
}
