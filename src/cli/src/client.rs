//! HTTP client for communicating with the healthagg server.

use anyhow::{Context, Result};
use healthagg_core::error::ErrorResponse;
use healthagg_core::health::AggregatedReport;
use reqwest::Client;

/// HTTP client for the healthagg API.
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new API client pointing at the given base URL.
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Return the configured base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Run one aggregation on the server.
    ///
    /// A failed run comes back as a 5xx with an error body; its code and
    /// message are surfaced in the returned error.
    pub async fn aggregate(&self) -> Result<AggregatedReport> {
        let url = format!("{}/health/aggregate", self.base_url);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("GET {} failed", url))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            match serde_json::from_str::<ErrorResponse>(&body) {
                Ok(err) => anyhow::bail!(
                    "Aggregation failed ({}): {} {}",
                    status,
                    err.error.code,
                    err.error.message
                ),
                Err(_) => anyhow::bail!("API error ({}): {}", status, body),
            }
        }

        resp.json()
            .await
            .with_context(|| format!("Failed to parse response from {}", url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use healthagg_core::health::OverallStatus;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_aggregate_parses_report() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health/aggregate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "degraded",
                "timestamp": "2026-01-01T00:00:00Z",
                "services": [
                    {"name": "a", "status": "healthy", "response_time_ms": 3.5},
                    {"name": "b", "status": "down", "error": "HTTP 500"}
                ]
            })))
            .mount(&server)
            .await;

        let client = ApiClient::new(&format!("{}/", server.uri())).unwrap();
        let report = client.aggregate().await.unwrap();

        assert_eq!(report.status, OverallStatus::Degraded);
        assert_eq!(report.services.len(), 2);
        assert_eq!(report.services[1].error.as_deref(), Some("HTTP 500"));
    }

    #[tokio::test]
    async fn test_aggregate_surfaces_error_code() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health/aggregate"))
            .respond_with(ResponseTemplate::new(502).set_body_json(json!({
                "error": {"code": "TRANSPORT_ERROR", "message": "connection refused"}
            })))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri()).unwrap();
        let err = client.aggregate().await.unwrap_err().to_string();

        assert!(err.contains("TRANSPORT_ERROR"));
        assert!(err.contains("connection refused"));
    }

    #[test]
    fn test_base_url_trims_trailing_slash() {
        let client = ApiClient::new("http://localhost:8000///").unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000");
    }
}
