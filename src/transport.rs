//! The HTTP seam between accounts and the network.
//!
//! Delivery goes through the [`HttpTransport`] trait so tests can substitute
//! fakes; [`ReqwestTransport`] is the production implementation.

use async_trait::async_trait;
use reqwest::Url;
use serde_json::Value;

/// One outbound webhook request: the account's endpoint plus the JSON body
/// for a single delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonRequest {
    pub url: Url,
    pub body: Value,
}

/// The raw outcome of a completed HTTP exchange, whatever the status code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponseData {
    pub status: u16,
    pub body: String,
}

/// Executes one webhook request. Implementations must be safe to share
/// across concurrent sends.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Performs the exchange. An `Err` means no complete response was
    /// obtained (connection failure, timeout, failure reading the body);
    /// an HTTP error status is still an `Ok` response.
    async fn execute(&self, request: &JsonRequest) -> anyhow::Result<HttpResponseData>;
}

/// `reqwest`-backed transport.
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: &JsonRequest) -> anyhow::Result<HttpResponseData> {
        let response = self
            .client
            .post(request.url.clone())
            .json(&request.body)
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(HttpResponseData { status, body })
    }
}
