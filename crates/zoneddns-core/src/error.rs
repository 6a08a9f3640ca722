//! Error types for the zoneddns system
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for zoneddns operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the zoneddns system
#[derive(Error, Debug)]
pub enum Error {
    /// IP discovery or provider API unreachable, timed out, or returned a
    /// transient server error
    #[error("Network error: {0}")]
    Network(String),

    /// Provider rejected the credential
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// A subdomain references a domain with no zone configured
    #[error("No zone configured for domain: {domain}")]
    ConfigGap {
        /// The unknown domain key
        domain: String,
    },

    /// Persisted-state write failure
    #[error("State store error: {0}")]
    StateStore(String),

    /// Unexpected response shape or API-level rejection
    #[error("Provider API error ({provider}): {message}")]
    ProviderApi {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// Provider throttled the request
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a configuration-gap error
    pub fn config_gap(domain: impl Into<String>) -> Self {
        Self::ConfigGap {
            domain: domain.into(),
        }
    }

    /// Create a state store error
    pub fn state_store(msg: impl Into<String>) -> Self {
        Self::StateStore(msg.into())
    }

    /// Create a provider API error
    pub fn provider_api(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ProviderApi {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a rate limit error
    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Self::RateLimited(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Whether retrying on a later tick could plausibly succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_) | Self::RateLimited(_) | Self::Io(_))
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
