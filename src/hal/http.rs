//! reqwest-backed transport for the real upstream API.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use tracing::debug;

use crate::config::UpstreamConfig;
use crate::error::TransportError;
use crate::traits::{HttpResponse, Transport, JSON_MEDIA_TYPE};

/// HTTP transport using a shared `reqwest::Client`.
///
/// Sends `Accept` and `Content-Type: application/json` on every request and
/// applies the configured request timeout. Never retries.
///
/// # Example
///
/// ```rust,no_run
/// use rs_departures::hal::ReqwestTransport;
/// use rs_departures::UpstreamConfig;
///
/// let transport = ReqwestTransport::new(&UpstreamConfig::default()).unwrap();
/// ```
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Builds the underlying client.
    pub fn new(config: &UpstreamConfig) -> Result<Self, TransportError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(JSON_MEDIA_TYPE));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_MEDIA_TYPE));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| TransportError::new(e.to_string()))?;

        Ok(Self { client })
    }

    /// Wraps an existing client. Headers are still set per request.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Transport for ReqwestTransport {
    async fn get_json(&self, url: &str) -> Result<HttpResponse, TransportError> {
        let response = self
            .client
            .get(url)
            .header(ACCEPT, JSON_MEDIA_TYPE)
            .header(CONTENT_TYPE, JSON_MEDIA_TYPE)
            .send()
            .await
            .map_err(|e| TransportError::new(e.to_string()))?;

        let status = response.status();
        debug!(url, status = status.as_u16(), "upstream responded");

        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::new(e.to_string()))?;

        Ok(HttpResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
            body: body.to_vec(),
        })
    }
}
