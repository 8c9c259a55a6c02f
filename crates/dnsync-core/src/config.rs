//! Configuration types for dnsync
//!
//! This module defines all configuration structures used throughout the crate.
//! Configuration is validated once, before any network call; a pass never runs
//! with a partially valid domain list.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Host label that designates the zone apex
pub const APEX_HOST: &str = "@";

/// Main dnsync configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DdnsConfig {
    /// DNS provider configuration
    pub provider: ProviderConfig,

    /// Domains to reconcile, in order
    pub domains: Vec<DomainSpec>,

    /// Public address discovery
    #[serde(default)]
    pub address_source: AddressSourceConfig,

    /// Where the last committed address is kept
    #[serde(default)]
    pub state_store: StateStoreConfig,

    /// Optional engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl DdnsConfig {
    /// Create a configuration for the given provider and domains, defaults elsewhere
    pub fn new(provider: ProviderConfig, domains: Vec<DomainSpec>) -> Self {
        Self {
            provider,
            domains,
            address_source: AddressSourceConfig::default(),
            state_store: StateStoreConfig::default(),
            engine: EngineConfig::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.domains.is_empty() {
            return Err(crate::Error::config("No domains configured"));
        }

        let mut seen = HashSet::new();
        for spec in &self.domains {
            spec.validate()?;
            if !seen.insert(spec.record_name().to_ascii_lowercase()) {
                return Err(crate::Error::config(format!(
                    "Record {} is configured more than once",
                    spec.record_name()
                )));
            }
        }

        self.provider.validate()?;
        self.address_source.validate()?;
        self.state_store.validate()?;
        self.engine.validate()?;

        Ok(())
    }
}

/// DNS provider configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// Cloudflare provider
    Cloudflare {
        /// Cloudflare API token with Zone:DNS:Edit permissions
        api_token: String,
        /// Perform lookups but skip record writes
        #[serde(default)]
        dry_run: bool,
        /// Per-request HTTP timeout in seconds
        #[serde(default = "default_provider_timeout_secs")]
        timeout_secs: u64,
    },
}

impl ProviderConfig {
    /// Cloudflare provider in live mode with the default timeout
    pub fn cloudflare(api_token: impl Into<String>) -> Self {
        ProviderConfig::Cloudflare {
            api_token: api_token.into(),
            dry_run: false,
            timeout_secs: default_provider_timeout_secs(),
        }
    }

    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            ProviderConfig::Cloudflare {
                api_token,
                timeout_secs,
                ..
            } => {
                if api_token.trim().is_empty() {
                    return Err(crate::Error::config("Cloudflare API token cannot be empty"));
                }
                validate_timeout("provider", *timeout_secs)
            }
        }
    }
}

// The token must never reach a log line.
impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderConfig::Cloudflare {
                dry_run,
                timeout_secs,
                ..
            } => f
                .debug_struct("Cloudflare")
                .field("api_token", &"<REDACTED>")
                .field("dry_run", dry_run)
                .field("timeout_secs", timeout_secs)
                .finish(),
        }
    }
}

/// Public address discovery configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressSourceConfig {
    /// Services queried in order until one answers with an IPv4 address
    #[serde(default = "default_address_services")]
    pub urls: Vec<String>,

    /// Per-request HTTP timeout in seconds
    #[serde(default = "default_address_timeout_secs")]
    pub timeout_secs: u64,
}

impl AddressSourceConfig {
    /// Validate the address source configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.urls.is_empty() {
            return Err(crate::Error::config(
                "At least one address lookup service is required",
            ));
        }

        for url in &self.urls {
            if !url.starts_with("https://") && !url.starts_with("http://") {
                return Err(crate::Error::config(format!(
                    "Address lookup service must use HTTP or HTTPS scheme. Got: {}",
                    url
                )));
            }
        }

        validate_timeout("address source", self.timeout_secs)
    }
}

impl Default for AddressSourceConfig {
    fn default() -> Self {
        Self {
            urls: default_address_services(),
            timeout_secs: default_address_timeout_secs(),
        }
    }
}

/// State store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StateStoreConfig {
    /// File-based state store
    File {
        /// Path to the state file
        path: String,
    },

    /// In-memory state store (not persistent)
    Memory,
}

impl StateStoreConfig {
    /// Validate the state store configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            StateStoreConfig::File { path } if path.trim().is_empty() => {
                Err(crate::Error::config("State file path cannot be empty"))
            }
            _ => Ok(()),
        }
    }
}

impl Default for StateStoreConfig {
    fn default() -> Self {
        StateStoreConfig::File {
            path: default_state_path(),
        }
    }
}

/// One configured reconciliation target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainSpec {
    /// Registered domain name, used for the zone lookup (e.g. "example.com")
    pub domain: String,

    /// Record host label (e.g. "home"); "@" selects the zone apex
    #[serde(default = "default_host")]
    pub host: String,

    /// Record type; address records only
    #[serde(default)]
    pub record_type: RecordType,
}

impl DomainSpec {
    /// Create a new domain spec
    pub fn new(domain: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            host: host.into(),
            record_type: RecordType::A,
        }
    }

    /// Target the zone apex of `domain`
    pub fn apex(domain: impl Into<String>) -> Self {
        Self::new(domain, APEX_HOST)
    }

    /// Fully-qualified name of the records to match
    ///
    /// A host that already ends with the domain is taken as fully qualified.
    pub fn record_name(&self) -> String {
        let host = self.host.trim().trim_end_matches('.');
        let domain = self.domain.trim().trim_end_matches('.');

        if host.is_empty() || host == APEX_HOST || host.eq_ignore_ascii_case(domain) {
            return domain.to_string();
        }

        let suffix = format!(".{}", domain.to_ascii_lowercase());
        if host.to_ascii_lowercase().ends_with(&suffix) {
            host.to_string()
        } else {
            format!("{}.{}", host, domain)
        }
    }

    /// Validate the domain and host label
    pub fn validate(&self) -> Result<(), crate::Error> {
        validate_domain_name(&self.domain)?;

        let host = self.host.trim();
        if !host.is_empty() && host != APEX_HOST {
            validate_domain_name(&self.record_name())?;
        }

        Ok(())
    }
}

impl fmt::Display for DomainSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.record_name())
    }
}

/// DNS record type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RecordType {
    /// Address record (IPv4)
    #[default]
    A,
}

impl RecordType {
    /// Record type as used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
        }
    }
}

/// Whether domains absent at the provider block committing the new address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AbsencePolicy {
    /// NoZoneFound and NoRecordsFound are informational only
    #[default]
    Lenient,
    /// NoZoneFound and NoRecordsFound block the commit like a failure
    Strict,
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// How absent zones/records affect the commit decision
    #[serde(default)]
    pub absence_policy: AbsencePolicy,

    /// Capacity of the engine event channel
    ///
    /// A pass emits one event per domain plus a handful of pass-level events;
    /// events that do not fit are dropped with a warning.
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl EngineConfig {
    /// Validate the engine configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            absence_policy: AbsencePolicy::default(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

/// Validate that a string is a valid domain name
///
/// Basic RFC 1035 checks: total length, label length, characters, hyphens.
pub fn validate_domain_name(domain: &str) -> Result<(), crate::Error> {
    let domain = domain.trim_end_matches('.');

    if domain.is_empty() {
        return Err(crate::Error::config("Domain name cannot be empty"));
    }

    if domain.len() > 253 {
        return Err(crate::Error::config(format!(
            "Domain name too long: {} chars (max 253). Got: {}",
            domain.len(),
            domain
        )));
    }

    for label in domain.split('.') {
        if label.is_empty() {
            return Err(crate::Error::config(format!(
                "Domain name has empty label: '{}'",
                domain
            )));
        }

        if label.len() > 63 {
            return Err(crate::Error::config(format!(
                "Domain label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            )));
        }

        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
            return Err(crate::Error::config(format!(
                "Domain label contains invalid characters. Label: '{}'",
                label
            )));
        }

        if label.starts_with('-') || label.ends_with('-') {
            return Err(crate::Error::config(format!(
                "Domain label cannot start or end with hyphen. Label: '{}'",
                label
            )));
        }
    }

    Ok(())
}

fn validate_timeout(what: &str, secs: u64) -> Result<(), crate::Error> {
    if !(1..=300).contains(&secs) {
        return Err(crate::Error::config(format!(
            "{} timeout must be between 1 and 300 seconds. Got: {}",
            what, secs
        )));
    }
    Ok(())
}

fn default_host() -> String {
    APEX_HOST.to_string()
}

fn default_provider_timeout_secs() -> u64 {
    30
}

fn default_address_timeout_secs() -> u64 {
    10
}

fn default_address_services() -> Vec<String> {
    vec![
        "https://api.ipify.org".to_string(),
        "https://ifconfig.me/ip".to_string(),
        "https://ipv4.icanhazip.com".to_string(),
    ]
}

fn default_state_path() -> String {
    "dnsync-state.json".to_string()
}

fn default_event_channel_capacity() -> usize {
    256
}
