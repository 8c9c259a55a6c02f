// # HTTP Address Source
//
// This crate provides the HTTP-based `AddressSource` for dnsync.
//
// ## Behavior
//
// Queries plain-text "what is my IP" services in order and returns the first
// answer that parses as an IPv4 address. A service that is down, slow,
// answers with an error status or returns something other than an IPv4
// address is skipped. Only when every service fails does the lookup fail,
// and the error then lists each service's failure.
//
// No caching: every pass asks again.

use dnsync_core::config::AddressSourceConfig;
use dnsync_core::traits::AddressSource;
use dnsync_core::{Address, Error, Result};

use std::time::Duration;

/// Default per-request timeout
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP-based public address source with failover
#[derive(Debug, Clone)]
pub struct HttpAddressSource {
    /// Services queried in order
    urls: Vec<String>,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpAddressSource {
    /// Create a new HTTP address source with the default timeout
    ///
    /// # Parameters
    ///
    /// - `urls`: Services returning the caller's address as plain text
    ///   (e.g., "https://api.ipify.org"), tried in order
    pub fn new(urls: Vec<String>) -> Result<Self> {
        Self::with_timeout(urls, DEFAULT_HTTP_TIMEOUT)
    }

    /// Create with a custom per-request timeout
    pub fn with_timeout(urls: Vec<String>, timeout: Duration) -> Result<Self> {
        if urls.is_empty() {
            return Err(Error::config(
                "At least one address lookup service is required",
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("dnsync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { urls, client })
    }

    /// Create from configuration
    pub fn from_config(config: &AddressSourceConfig) -> Result<Self> {
        Self::with_timeout(
            config.urls.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// Fetch the address from one service
    async fn fetch(&self, url: &str) -> std::result::Result<Address, String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| format!("request failed: {}", e))?;

        if !response.status().is_success() {
            return Err(format!("HTTP error: {}", response.status()));
        }

        let text = response
            .text()
            .await
            .map_err(|e| format!("failed to read response: {}", e))?;

        text.parse::<Address>()
            .map_err(|_| format!("not an IPv4 address: {:?}", truncate(text.trim())))
    }
}

#[async_trait::async_trait]
impl AddressSource for HttpAddressSource {
    async fn current(&self) -> Result<Address> {
        let mut failures = Vec::with_capacity(self.urls.len());

        for url in &self.urls {
            match self.fetch(url).await {
                Ok(address) => {
                    tracing::debug!(service = %url, "Address lookup answered: {}", address);
                    return Ok(address);
                }
                Err(reason) => {
                    tracing::warn!(service = %url, "Address lookup failed: {}", reason);
                    failures.push(format!("{}: {}", url, reason));
                }
            }
        }

        Err(Error::address_lookup(format!(
            "all {} lookup service(s) failed: {}",
            failures.len(),
            failures.join("; ")
        )))
    }

    fn source_name(&self) -> &'static str {
        "http"
    }
}

fn truncate(text: &str) -> &str {
    match text.char_indices().nth(64) {
        Some((cut, _)) => &text[..cut],
        None => text,
    }
}
