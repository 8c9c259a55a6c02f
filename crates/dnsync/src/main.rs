// # dnsync - one-shot dynamic DNS updater
//
// This binary is a THIN integration layer: it reads configuration from the
// environment, wires the Cloudflare provider, the HTTP address source and the
// state store into a `DdnsEngine`, runs exactly one pass and maps the outcome
// to an exit code. All reconciliation logic lives in dnsync-core.
//
// Schedule it with cron or a systemd timer.
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// ### Provider
// - `DDNS_PROVIDER_API_TOKEN`: Cloudflare API token (required)
// - `DDNS_MODE`: `dry-run` to perform lookups but skip record writes
//
// ### Domains
// - `DDNS_DOMAINS`: Comma-separated `domain[:host]` list (required)
// - `DDNS_RECORD_NAME`: Host label for entries without `:host` (default `@`)
//
// ### Address Source
// - `DDNS_IP_SOURCE_URLS`: Comma-separated lookup services, tried in order
// - `DDNS_HTTP_TIMEOUT_SECS`: Per-request HTTP timeout (1-300)
//
// ### State Store
// - `DDNS_STATE_STORE_TYPE`: Type of state store (file, memory)
// - `DDNS_STATE_STORE_PATH`: Path to state file (for file store)
//
// ### Engine
// - `DDNS_ABSENCE_POLICY`: `lenient` (default) or `strict`; strict withholds
//   the commit when a zone or record is missing
//
// ### Logging
// - `DDNS_LOG_LEVEL`: trace, debug, info, warn, error (default info)
// - `DDNS_LOG_FILE`: Append logs to this file instead of stdout
//
// ## Example
//
// ```bash
// export DDNS_PROVIDER_API_TOKEN=your_token
// export DDNS_DOMAINS=example.com,example.org:home
// export DDNS_STATE_STORE_PATH=/var/lib/dnsync/state.json
//
// dnsync
// ```

use anyhow::{Context, Result};
use dnsync_core::config::{
    AbsencePolicy, AddressSourceConfig, DdnsConfig, DomainSpec, EngineConfig, ProviderConfig,
    StateStoreConfig,
};
use dnsync_core::{DdnsEngine, Error, PassReport};
use dnsync_ip_http::HttpAddressSource;
use dnsync_provider_cloudflare::CloudflareProvider;
use std::env;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use tracing::{Level, error, info, trace, warn};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for the possible pass outcomes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DnsyncExitCode {
    /// All domains synchronized, or no update needed
    Synchronized = 0,
    /// Configuration error
    ConfigError = 1,
    /// The public address could not be determined
    AddressLookupFailed = 2,
    /// Some domains failed; the new address was not committed
    CommitSkipped = 3,
    /// The state store could not be read or written
    StateStoreError = 4,
    /// Runtime initialization failure
    RuntimeError = 5,
}

impl From<DnsyncExitCode> for ExitCode {
    fn from(code: DnsyncExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
struct Config {
    provider_api_token: String,
    domains: String,
    record_name: String,
    state_store_type: String,
    state_store_path: Option<String>,
    ip_source_urls: Option<Vec<String>>,
    http_timeout_secs: Option<u64>,
    absence_policy: String,
    mode: String,
    log_level: String,
    log_file: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Ok(Self {
            provider_api_token: env::var("DDNS_PROVIDER_API_TOKEN").context(
                "DDNS_PROVIDER_API_TOKEN is required. \
                Set it via: export DDNS_PROVIDER_API_TOKEN=your_token",
            )?,
            domains: env::var("DDNS_DOMAINS").unwrap_or_default(),
            record_name: env::var("DDNS_RECORD_NAME").unwrap_or_else(|_| "@".to_string()),
            state_store_type: env::var("DDNS_STATE_STORE_TYPE")
                .unwrap_or_else(|_| "file".to_string()),
            state_store_path: env::var("DDNS_STATE_STORE_PATH").ok(),
            ip_source_urls: env::var("DDNS_IP_SOURCE_URLS").ok().map(|s| split_list(&s)),
            http_timeout_secs: env::var("DDNS_HTTP_TIMEOUT_SECS")
                .ok()
                .map(|s| {
                    s.trim()
                        .parse()
                        .with_context(|| format!("DDNS_HTTP_TIMEOUT_SECS is not a number: {}", s))
                })
                .transpose()?,
            absence_policy: env::var("DDNS_ABSENCE_POLICY")
                .unwrap_or_else(|_| "lenient".to_string()),
            mode: env::var("DDNS_MODE").unwrap_or_default(),
            log_level: env::var("DDNS_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            log_file: env::var("DDNS_LOG_FILE").ok().filter(|s| !s.trim().is_empty()),
        })
    }

    /// Validate the environment-level settings
    ///
    /// Domain names, URLs and the remaining structural checks are done by
    /// `DdnsConfig::validate()` once the core configuration is built.
    fn validate(&self) -> Result<()> {
        if self.provider_api_token.trim().is_empty() {
            anyhow::bail!(
                "DDNS_PROVIDER_API_TOKEN is required. \
                Set it via: export DDNS_PROVIDER_API_TOKEN=your_token"
            );
        }

        // Check for obvious placeholder tokens (common mistake)
        let token_lower = self.provider_api_token.to_lowercase();
        if token_lower.contains("your_token") || token_lower.contains("replace_me") {
            anyhow::bail!(
                "DDNS_PROVIDER_API_TOKEN appears to be a placeholder. \
                Use an actual API token from Cloudflare."
            );
        }

        if split_list(&self.domains).is_empty() {
            anyhow::bail!(
                "DDNS_DOMAINS must contain at least one domain. \
                Set it via: export DDNS_DOMAINS=example.com,example.org:home"
            );
        }

        match self.state_store_type.as_str() {
            "file" | "memory" => {}
            _ => anyhow::bail!(
                "DDNS_STATE_STORE_TYPE '{}' is not supported. \
                Supported types: file, memory",
                self.state_store_type
            ),
        }

        if self.state_store_type == "file"
            && let Some(ref path) = self.state_store_path
            && path.trim().is_empty()
        {
            anyhow::bail!("DDNS_STATE_STORE_PATH cannot be empty when DDNS_STATE_STORE_TYPE=file");
        }

        if let Some(ref urls) = self.ip_source_urls
            && urls.is_empty()
        {
            anyhow::bail!("DDNS_IP_SOURCE_URLS is set but lists no services");
        }

        if let Some(timeout) = self.http_timeout_secs
            && !(1..=300).contains(&timeout)
        {
            anyhow::bail!(
                "DDNS_HTTP_TIMEOUT_SECS must be between 1 and 300 seconds. Got: {}",
                timeout
            );
        }

        self.absence_policy()?;
        self.dry_run()?;
        self.log_level()?;

        Ok(())
    }

    fn absence_policy(&self) -> Result<AbsencePolicy> {
        match self.absence_policy.trim().to_lowercase().as_str() {
            "lenient" => Ok(AbsencePolicy::Lenient),
            "strict" => Ok(AbsencePolicy::Strict),
            _ => anyhow::bail!(
                "DDNS_ABSENCE_POLICY '{}' is not valid. Valid policies: lenient, strict",
                self.absence_policy
            ),
        }
    }

    fn dry_run(&self) -> Result<bool> {
        match self.mode.trim().to_lowercase().as_str() {
            "" | "live" => Ok(false),
            "dry-run" => Ok(true),
            _ => anyhow::bail!(
                "DDNS_MODE '{}' is not valid. Valid modes: live, dry-run",
                self.mode
            ),
        }
    }

    fn log_level(&self) -> Result<Level> {
        match self.log_level.trim().to_lowercase().as_str() {
            "trace" => Ok(Level::TRACE),
            "debug" => Ok(Level::DEBUG),
            "info" => Ok(Level::INFO),
            "warn" => Ok(Level::WARN),
            "error" => Ok(Level::ERROR),
            _ => anyhow::bail!(
                "DDNS_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }
    }

    /// Build the core configuration
    fn to_ddns_config(&self) -> Result<DdnsConfig> {
        let mut provider = ProviderConfig::cloudflare(self.provider_api_token.trim());
        let ProviderConfig::Cloudflare {
            dry_run,
            timeout_secs,
            ..
        } = &mut provider;
        *dry_run = self.dry_run()?;
        if let Some(timeout) = self.http_timeout_secs {
            *timeout_secs = timeout;
        }

        let mut address_source = AddressSourceConfig::default();
        if let Some(ref urls) = self.ip_source_urls {
            address_source.urls = urls.clone();
        }
        if let Some(timeout) = self.http_timeout_secs {
            address_source.timeout_secs = timeout;
        }

        let state_store = match self.state_store_type.as_str() {
            "memory" => StateStoreConfig::Memory,
            _ => match self.state_store_path {
                Some(ref path) => StateStoreConfig::File { path: path.clone() },
                None => StateStoreConfig::default(),
            },
        };

        let config = DdnsConfig {
            provider,
            domains: parse_domains(&self.domains, &self.record_name)?,
            address_source,
            state_store,
            engine: EngineConfig {
                absence_policy: self.absence_policy()?,
                ..EngineConfig::default()
            },
        };

        config.validate()?;
        Ok(config)
    }
}

/// Split a comma-separated list, dropping blanks
fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Parse `domain[:host]` entries; entries without a host use `default_host`
fn parse_domains(raw: &str, default_host: &str) -> Result<Vec<DomainSpec>> {
    split_list(raw)
        .into_iter()
        .map(|entry| match entry.split_once(':') {
            Some((domain, host)) => {
                let (domain, host) = (domain.trim(), host.trim());
                if domain.is_empty() || host.is_empty() {
                    anyhow::bail!("DDNS_DOMAINS entry '{}' must be domain or domain:host", entry);
                }
                Ok(DomainSpec::new(domain, host))
            }
            None => Ok(DomainSpec::new(entry, default_host.trim())),
        })
        .collect()
}

/// Install the global tracing subscriber
fn init_tracing(level: Level, log_file: Option<&str>) -> Result<()> {
    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open DDNS_LOG_FILE {}", path))?;

            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        None => {
            let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return DnsyncExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return DnsyncExitCode::ConfigError.into();
    }

    let ddns_config = match config.to_ddns_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration validation error: {:#}", e);
            return DnsyncExitCode::ConfigError.into();
        }
    };

    // Initialize tracing
    let log_level = config.log_level().unwrap_or(Level::INFO);
    if let Err(e) = init_tracing(log_level, config.log_file.as_deref()) {
        eprintln!("Failed to set up logging: {:#}", e);
        return DnsyncExitCode::ConfigError.into();
    }

    info!("Starting dnsync v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration loaded: {} domain(s), provider {:?}",
        ddns_config.domains.len(),
        ddns_config.provider
    );

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DnsyncExitCode::RuntimeError.into();
        }
    };

    rt.block_on(run(ddns_config)).into()
}

/// Wire the components and run one pass
async fn run(config: DdnsConfig) -> DnsyncExitCode {
    let provider = match CloudflareProvider::from_config(&config.provider) {
        Ok(provider) => provider,
        Err(e) => {
            error!("Failed to create provider: {}", e);
            return DnsyncExitCode::ConfigError;
        }
    };

    let address_source = match HttpAddressSource::from_config(&config.address_source) {
        Ok(source) => source,
        Err(e) => {
            error!("Failed to create address source: {}", e);
            return DnsyncExitCode::ConfigError;
        }
    };

    let state_store = match dnsync_core::state::from_config(&config.state_store).await {
        Ok(store) => store,
        Err(e) => {
            error!("Failed to open state store: {}", e);
            return DnsyncExitCode::StateStoreError;
        }
    };

    for spec in &config.domains {
        info!("Managing record: {}", spec);
    }

    let (engine, mut events) = match DdnsEngine::new(
        Box::new(address_source),
        Arc::new(provider),
        state_store,
        config,
    ) {
        Ok(pair) => pair,
        Err(e) => {
            error!("Failed to create engine: {}", e);
            return DnsyncExitCode::ConfigError;
        }
    };

    let drain = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            trace!(?event, "Engine event");
        }
    });

    let result = engine.run_once().await;
    drop(engine);
    if let Err(e) = drain.await {
        warn!("Event drain task failed: {}", e);
    }

    if let Err(ref e) = result {
        error!("Pass aborted: {}", e);
    }
    exit_code_for(&result)
}

/// Map a pass result to the process exit code
fn exit_code_for(result: &dnsync_core::Result<PassReport>) -> DnsyncExitCode {
    match result {
        Ok(report) if report.result.no_update_needed || report.result.should_commit => {
            DnsyncExitCode::Synchronized
        }
        Ok(_) => DnsyncExitCode::CommitSkipped,
        Err(Error::AddressLookup(_)) => DnsyncExitCode::AddressLookupFailed,
        Err(Error::StateStore(_) | Error::Io(_) | Error::Json(_)) => {
            DnsyncExitCode::StateStoreError
        }
        Err(Error::Config(_) | Error::InvalidInput(_)) => DnsyncExitCode::ConfigError,
    }
}
