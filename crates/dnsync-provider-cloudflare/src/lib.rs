// # Cloudflare DNS Provider
//
// This crate provides the Cloudflare implementation of `ProviderClient` for
// dnsync.
//
// ## Behavior
//
// - One HTTP request per trait call; no retries, no caching, no background tasks
// - Every non-2xx status is mapped to a `ProviderError` kind (401/403, 429, other)
// - `success: false` in a 2xx envelope is still an API error
// - Dry-run mode performs the lookups and logs the PUT it would have sent
//
// ## Security Requirements
//
// - API token NEVER appears in logs, errors or Debug output
// - Provider fails fast if the token is empty
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/
// - List Zones: GET `/zones?name=...`
// - List DNS Records: GET `/zones/:zone_id/dns_records?type=A&name=...`
// - Update DNS Record: PUT `/zones/:zone_id/dns_records/:record_id`

use async_trait::async_trait;
use dnsync_core::config::{ProviderConfig, RecordType};
use dnsync_core::error::ProviderError;
use dnsync_core::traits::{ProviderClient, RecordMatch, Zone};
use dnsync_core::{Address, Error, Result};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Cloudflare API base URL
pub const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// TTL value Cloudflare treats as "automatic"
const AUTOMATIC_TTL: u32 = 1;

/// Longest slice of an unparsable error body carried into an error message
const MAX_ERROR_BODY: usize = 200;

const PROVIDER: &str = "cloudflare";

/// Cloudflare DNS provider
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, the provider will:
/// - Perform all GET requests (zone lookup, record lookup)
/// - Log the intended PUT payload
/// - **NOT** actually modify DNS records
///
/// # Security
///
/// The Debug implementation does NOT expose the API token.
pub struct CloudflareProvider {
    /// Cloudflare API token
    /// ⚠️ NEVER log this value
    api_token: String,

    /// API root, overridable for tests and proxies
    base_url: String,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Dry-run mode: if true, perform GET requests but skip PUT updates
    dry_run: bool,
}

impl std::fmt::Debug for CloudflareProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareProvider")
            .field("api_token", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl CloudflareProvider {
    /// Create a new Cloudflare provider with the default timeout
    ///
    /// # Parameters
    ///
    /// - `api_token`: Cloudflare API token with Zone:DNS:Edit permissions
    /// - `dry_run`: If true, perform GET requests but skip PUT updates
    ///
    /// # Errors
    ///
    /// `Error::Config` if the token is empty or the HTTP client cannot be built.
    pub fn new(api_token: impl Into<String>, dry_run: bool) -> Result<Self> {
        Self::with_timeout(api_token, dry_run, DEFAULT_HTTP_TIMEOUT)
    }

    /// Create a new Cloudflare provider with an explicit per-request timeout
    pub fn with_timeout(
        api_token: impl Into<String>,
        dry_run: bool,
        timeout: Duration,
    ) -> Result<Self> {
        let api_token = api_token.into();
        if api_token.trim().is_empty() {
            return Err(Error::config("Cloudflare API token cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("dnsync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_token,
            base_url: CLOUDFLARE_API_BASE.to_string(),
            client,
            dry_run,
        })
    }

    /// Create a provider from configuration
    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        match config {
            ProviderConfig::Cloudflare {
                api_token,
                dry_run,
                timeout_secs,
            } => {
                if *dry_run {
                    tracing::warn!(
                        "Cloudflare provider running in DRY-RUN mode - no changes will be made"
                    );
                }
                Self::with_timeout(api_token.clone(), *dry_run, Duration::from_secs(*timeout_secs))
            }
        }
    }

    /// Point the provider at a different API root
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request and unwrap the v4 envelope
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> std::result::Result<T, ProviderError> {
        let response = request
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(|e| ProviderError::transport(PROVIDER, format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::transport(PROVIDER, format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(status_error(status, &body));
        }

        let envelope: ApiResponse<T> = serde_json::from_str(&body)
            .map_err(|e| ProviderError::malformed(PROVIDER, format!("Failed to parse response: {}", e)))?;

        if !envelope.success {
            return Err(ProviderError::api(
                PROVIDER,
                status.as_u16(),
                envelope.error_summary(),
            ));
        }

        envelope
            .result
            .ok_or_else(|| ProviderError::malformed(PROVIDER, "response has no result"))
    }
}

#[async_trait]
impl ProviderClient for CloudflareProvider {
    /// Look up the zone for a domain
    ///
    /// ```http
    /// GET /zones?name=example.com
    /// Authorization: Bearer <token>
    /// ```
    async fn find_zone(&self, domain: &str) -> std::result::Result<Option<Zone>, ProviderError> {
        tracing::debug!("Looking up zone ID for domain: {}", domain);

        let request = self.client.get(self.url("/zones")).query(&[("name", domain)]);
        let zones: Vec<ZoneResult> = self.send(request).await?;

        // Cloudflare matches the name exactly; the first zone is the one
        Ok(zones.into_iter().next().map(|zone| {
            tracing::debug!("Found zone ID: {}", zone.id);
            Zone {
                id: zone.id,
                name: zone.name,
            }
        }))
    }

    /// List the A records named `record_name`
    ///
    /// ```http
    /// GET /zones/:zone_id/dns_records?type=A&name=home.example.com
    /// Authorization: Bearer <token>
    /// ```
    async fn find_address_records(
        &self,
        zone: &Zone,
        record_name: &str,
    ) -> std::result::Result<Vec<RecordMatch>, ProviderError> {
        tracing::debug!(
            "Looking up records: {} (type: {}) in zone {}",
            record_name,
            RecordType::A.as_str(),
            zone.name
        );

        let request = self
            .client
            .get(self.url(&format!("/zones/{}/dns_records", zone.id)))
            .query(&[("type", RecordType::A.as_str()), ("name", record_name)]);
        let records: Vec<RecordResult> = self.send(request).await?;

        Ok(records
            .into_iter()
            .map(|record| RecordMatch {
                id: record.id,
                name: record.name,
                content: record.content,
                ttl: record.ttl,
                proxied: record.proxied,
            })
            .collect())
    }

    /// Point one record at `new_content`
    ///
    /// TTL and proxy status are carried over from the existing record.
    ///
    /// ```http
    /// PUT /zones/:zone_id/dns_records/:record_id
    /// { "type": "A", "name": "...", "content": "1.2.3.4", "ttl": 1, "proxied": false }
    /// ```
    async fn update_address_record(
        &self,
        zone: &Zone,
        record: &RecordMatch,
        new_content: &Address,
    ) -> std::result::Result<(), ProviderError> {
        let url = self.url(&format!("/zones/{}/dns_records/{}", zone.id, record.id));
        let payload = UpdateRecordRequest {
            record_type: RecordType::A.as_str(),
            name: &record.name,
            content: new_content.to_string(),
            ttl: record.ttl.unwrap_or(AUTOMATIC_TTL),
            proxied: record.proxied.unwrap_or(false),
        };

        if self.dry_run {
            let body = serde_json::to_string(&payload).unwrap_or_default();
            tracing::info!("[DRY-RUN] Would send PUT request to {} with payload: {}", url, body);
            return Ok(());
        }

        let _: serde_json::Value = self.send(self.client.put(&url).json(&payload)).await?;
        tracing::debug!("DNS record updated: {} -> {}", record.name, new_content);
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}

/// Map a non-2xx response to an error kind
fn status_error(status: StatusCode, body: &str) -> ProviderError {
    let detail = match serde_json::from_str::<ApiResponse<serde_json::Value>>(body) {
        Ok(envelope) if !envelope.errors.is_empty() => envelope.error_summary(),
        _ => truncate(body),
    };

    match status.as_u16() {
        401 | 403 => ProviderError::auth(
            PROVIDER,
            format!(
                "Invalid API token or insufficient permissions (status {}): {}",
                status.as_u16(),
                detail
            ),
        ),
        429 => ProviderError::rate_limited(PROVIDER, detail),
        code => ProviderError::api(PROVIDER, code, detail),
    }
}

fn truncate(body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        return "empty response body".to_string();
    }
    match body.char_indices().nth(MAX_ERROR_BODY) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}

/// Cloudflare v4 response envelope
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    result: Option<T>,
}

impl<T> ApiResponse<T> {
    fn error_summary(&self) -> String {
        if self.errors.is_empty() {
            return "request was not successful".to_string();
        }
        self.errors
            .iter()
            .map(|e| format!("[{}] {}", e.code, e.message))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct ZoneResult {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct RecordResult {
    id: String,
    name: String,
    content: String,
    #[serde(default)]
    ttl: Option<u32>,
    #[serde(default)]
    proxied: Option<bool>,
}

#[derive(Debug, Serialize)]
struct UpdateRecordRequest<'a> {
    #[serde(rename = "type")]
    record_type: &'static str,
    name: &'a str,
    content: String,
    ttl: u32,
    proxied: bool,
}
