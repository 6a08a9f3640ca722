// # HTTP IP Source
//
// This crate provides the public IP source for zoneddns.
//
// ## Architecture
//
// Fetches the caller's public address from an external echo service
// (e.g. ifconfig.me, icanhazip.com) that returns it as a plaintext body.
// Every call to `current()` is a fresh request: there is no cache and no
// internal retry. The engine's next tick is the retry.

use zoneddns_core::traits::{IpSource, PublicIp};
use zoneddns_core::{Error, Result};

use std::time::Duration;

/// Default discovery endpoint
pub const DEFAULT_IP_SOURCE_URL: &str = "https://ifconfig.me/ip";

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// HTTP-based public IP source
#[derive(Debug, Clone)]
pub struct HttpIpSource {
    /// URL to fetch the IP from
    url: String,

    /// Bound on the whole request
    timeout: Duration,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpIpSource {
    /// Create a new HTTP IP source with the default timeout
    ///
    /// # Parameters
    ///
    /// - `url`: URL returning the address as plaintext (e.g. "https://ifconfig.me/ip")
    pub fn new(url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(url, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create with a custom request timeout
    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url: url.into(),
            timeout,
            client,
        })
    }

    /// The discovery URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The request timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Fetch the current IP from the HTTP service
    async fn fetch_ip(&self) -> Result<PublicIp> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| {
                Error::network(format!("Request to {} failed: {}", self.url, e.without_url()))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::network(format!(
                "IP service {} returned HTTP {}",
                self.url, status
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::network(format!("Failed to read response: {}", e)))?;

        let ip = PublicIp::new(body);
        if ip.is_empty() {
            return Err(Error::invalid_input(format!(
                "IP service {} returned an empty body",
                self.url
            )));
        }

        tracing::debug!("Discovered public IP {} via {}", ip, self.url);
        Ok(ip)
    }
}

#[async_trait::async_trait]
impl IpSource for HttpIpSource {
    async fn current(&self) -> Result<PublicIp> {
        self.fetch_ip().await
    }

    fn source_name(&self) -> &'static str {
        "http"
    }
}
