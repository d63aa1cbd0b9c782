//! Service URL validation.

use reqwest::Url;

use crate::error::{AggregatorError, Result};

/// Parse `raw` into an absolute URL with a scheme and a host.
///
/// Runs before any network call for a service; a failure here aborts the
/// run with [`AggregatorError::InvalidUrl`].
pub fn validate_url(raw: &str) -> Result<Url> {
    let parsed = Url::parse(raw).map_err(|e| AggregatorError::invalid_url(raw, e.to_string()))?;

    if parsed.scheme().is_empty() {
        return Err(AggregatorError::invalid_url(raw, "scheme is empty"));
    }

    match parsed.host_str() {
        Some(host) if !host.is_empty() => Ok(parsed),
        _ => Err(AggregatorError::invalid_url(raw, "host is empty")),
    }
}
