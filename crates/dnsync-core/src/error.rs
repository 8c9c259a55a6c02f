//! Error types for dnsync
//!
//! Two layers of errors live here:
//!
//! - [`Error`]: pass-level errors. Address lookup, configuration and state
//!   store failures abort a reconciliation pass and surface to the caller.
//! - [`ProviderError`]: failures talking to the DNS provider. These stay local
//!   to one domain and are downgraded to a `Failed` outcome by the reconciler.

use thiserror::Error;

/// Result type alias for dnsync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Pass-level error type
#[derive(Error, Debug)]
pub enum Error {
    /// The current public address could not be determined
    #[error("Address lookup error: {0}")]
    AddressLookup(String),

    /// Missing or invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// State store-related errors
    #[error("State store error: {0}")]
    StateStore(String),

    /// Invalid input (e.g. an unparsable address)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create an address lookup error
    pub fn address_lookup(msg: impl Into<String>) -> Self {
        Self::AddressLookup(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a state store error
    pub fn state_store(msg: impl Into<String>) -> Self {
        Self::StateStore(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}

/// Failure of a single provider call
///
/// The reconciler never branches on the kind (there is no retry), but the
/// kind and message are kept so an operator can tell an expired token from a
/// rate limit or a network outage.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// Token rejected or lacking permissions
    #[error("{provider}: authentication failed: {message}")]
    Authentication {
        provider: &'static str,
        message: String,
    },

    /// Provider-side rate limit hit
    #[error("{provider}: rate limited: {message}")]
    RateLimited {
        provider: &'static str,
        message: String,
    },

    /// Connection, TLS or timeout failure
    #[error("{provider}: transport error: {message}")]
    Transport {
        provider: &'static str,
        message: String,
    },

    /// Response body could not be understood
    #[error("{provider}: malformed response: {message}")]
    MalformedResponse {
        provider: &'static str,
        message: String,
    },

    /// Any other API-level rejection
    #[error("{provider}: API error (status {status}): {message}")]
    Api {
        provider: &'static str,
        status: u16,
        message: String,
    },
}

impl ProviderError {
    /// Create an authentication error
    pub fn auth(provider: &'static str, message: impl Into<String>) -> Self {
        Self::Authentication {
            provider,
            message: message.into(),
        }
    }

    /// Create a rate limit error
    pub fn rate_limited(provider: &'static str, message: impl Into<String>) -> Self {
        Self::RateLimited {
            provider,
            message: message.into(),
        }
    }

    /// Create a transport error
    pub fn transport(provider: &'static str, message: impl Into<String>) -> Self {
        Self::Transport {
            provider,
            message: message.into(),
        }
    }

    /// Create a malformed-response error
    pub fn malformed(provider: &'static str, message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            provider,
            message: message.into(),
        }
    }

    /// Create a generic API error
    pub fn api(provider: &'static str, status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            provider,
            status,
            message: message.into(),
        }
    }

    /// Short machine-friendly name of the failure kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Authentication { .. } => "authentication",
            Self::RateLimited { .. } => "rate_limited",
            Self::Transport { .. } => "transport",
            Self::MalformedResponse { .. } => "malformed_response",
            Self::Api { .. } => "api",
        }
    }
}
