// # IP Source Trait
//
// Defines the interface for discovering the caller's public IP address.
//
// ## Implementations
//
// - HTTP-based: `zoneddns-ip-http` crate (ifconfig.me and friends)
//
// ## Usage
//
// ```rust,ignore
// use zoneddns_core::IpSource;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let source = /* IpSource implementation */;
//
//     let ip = source.current().await?;
//     println!("public IP: {}", ip);
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::fmt;

/// The caller's externally visible address
///
/// The value is kept textual: nothing beyond exact equality is ever
/// inspected. Surrounding whitespace is trimmed on construction, so every
/// comparison and every persisted value sees the same normalized form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct PublicIp(String);

impl PublicIp {
    /// Create a normalized public IP
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_string())
    }

    /// Borrow the normalized textual address
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `true` if nothing but whitespace was provided
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for PublicIp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PublicIp {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for PublicIp {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl AsRef<str> for PublicIp {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Trait for IP source implementations
///
/// # Trust Level: Semi-Trusted
///
/// IP sources are observers. They may perform outbound I/O to discover the
/// address, but nothing else.
///
/// ## Forbidden Capabilities
/// - ❌ Retry internally (the next scheduler tick is the retry)
/// - ❌ Cache the address between calls (the engine compares against the `StateStore`)
/// - ❌ Access the state store or DNS providers
/// - ❌ Spawn background tasks or polling loops (the `DdnsEngine` owns the timer)
///
/// Implementations must bound every call with a timeout so a stalled
/// service cannot stall the scheduler.
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Fetch the current public IP
    ///
    /// # Returns
    ///
    /// - `Ok(PublicIp)`: The trimmed, non-empty address
    /// - `Err(Error::Network)`: Timeout, DNS failure, or non-2xx response
    async fn current(&self) -> Result<PublicIp, crate::Error>;

    /// Name of the source (for logging)
    fn source_name(&self) -> &'static str;
}
