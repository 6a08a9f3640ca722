//! Configuration types for the zoneddns system
//!
//! This module defines all configuration structures used throughout the crate.
//! Configuration is loaded once at startup and treated as immutable.
//!
//! ## File Format
//!
//! ```json
//! {
//!   "domains": {
//!     "example.com": { "zone_id": "023e105f4ecef8ad9ca31a8372d0c353", "api_token": "..." }
//!   },
//!   "subdomains": {
//!     "home": { "subdomain": "home", "domain": "example.com", "enabled": true }
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use crate::traits::AUTOMATIC_TTL;

/// Main zoneddns configuration
///
/// Maps are ordered by key so reconciliation runs in a deterministic order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DdnsConfig {
    /// Domain name -> zone and credential
    pub domains: BTreeMap<String, DomainConfig>,

    /// Subdomain key -> desired record
    pub subdomains: BTreeMap<String, SubdomainConfig>,

    /// Optional engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl DdnsConfig {
    /// Create an empty configuration with default engine settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON configuration document
    pub fn from_json_str(json: &str) -> Result<Self, crate::Error> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a JSON configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, crate::Error> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            crate::Error::config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json_str(&content)
    }

    /// Add a domain (builder style)
    pub fn with_domain(mut self, domain: impl Into<String>, config: DomainConfig) -> Self {
        self.domains.insert(domain.into(), config);
        self
    }

    /// Add a subdomain (builder style)
    pub fn with_subdomain(mut self, key: impl Into<String>, config: SubdomainConfig) -> Self {
        self.subdomains.insert(key.into(), config);
        self
    }

    /// Validate the configuration
    ///
    /// Subdomains referencing unknown domains are NOT an error here; they
    /// are skipped with a warning at reconciliation time. Use
    /// [`DdnsConfig::unknown_domains`] to report them early.
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.subdomains.is_empty() {
            return Err(crate::Error::config("No subdomains configured"));
        }

        for (domain, config) in &self.domains {
            validate_domain_name(domain)?;
            config.validate(domain)?;
        }

        for (key, subdomain) in &self.subdomains {
            if subdomain.subdomain.is_empty() {
                return Err(crate::Error::config(format!(
                    "Subdomain '{}' has an empty label",
                    key
                )));
            }
            validate_domain_name(&subdomain.subdomain).map_err(|e| {
                crate::Error::config(format!("Subdomain '{}': {}", key, e))
            })?;
        }

        self.engine.validate()
    }

    /// Domain keys referenced by enabled subdomains but missing from `domains`
    pub fn unknown_domains(&self) -> Vec<&str> {
        let mut missing: Vec<&str> = self
            .subdomains
            .values()
            .filter(|s| s.enabled && !self.domains.contains_key(&s.domain))
            .map(|s| s.domain.as_str())
            .collect();
        missing.sort_unstable();
        missing.dedup();
        missing
    }

    /// Number of enabled subdomains
    pub fn enabled_count(&self) -> usize {
        self.subdomains.values().filter(|s| s.enabled).count()
    }
}

/// Zone and credential for one domain
#[derive(Clone, Serialize, Deserialize)]
pub struct DomainConfig {
    /// Opaque provider-assigned zone identifier
    pub zone_id: String,

    /// Bearer credential scoped to this zone
    /// ⚠️ NEVER log this value
    pub api_token: String,
}

impl DomainConfig {
    /// Create a domain configuration
    pub fn new(zone_id: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            zone_id: zone_id.into(),
            api_token: api_token.into(),
        }
    }

    fn validate(&self, domain: &str) -> Result<(), crate::Error> {
        if self.zone_id.trim().is_empty() {
            return Err(crate::Error::config(format!(
                "Domain '{}' has an empty zone_id",
                domain
            )));
        }
        if self.api_token.trim().is_empty() {
            return Err(crate::Error::config(format!(
                "Domain '{}' has an empty api_token",
                domain
            )));
        }
        Ok(())
    }
}

// Custom Debug implementation that hides the API token
impl fmt::Debug for DomainConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomainConfig")
            .field("zone_id", &self.zone_id)
            .field("api_token", &"<REDACTED>")
            .finish()
    }
}

/// One desired address record: `subdomain.domain`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubdomainConfig {
    /// Leftmost label(s), e.g. `home`
    pub subdomain: String,

    /// Domain key into [`DdnsConfig::domains`]
    pub domain: String,

    /// Disabled entries are never queried nor reconciled
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl SubdomainConfig {
    /// Create an enabled subdomain configuration
    pub fn new(subdomain: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            subdomain: subdomain.into(),
            domain: domain.into(),
            enabled: true,
        }
    }

    /// Enable or disable the subdomain
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Fully-qualified record name
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.subdomain, self.domain)
    }
}

fn default_enabled() -> bool {
    true
}

/// When the newly discovered IP is persisted relative to reconciliation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PersistPolicy {
    /// Persist first, then reconcile
    ///
    /// A failed reconciliation is not retried for the same IP: the next
    /// tick sees an unchanged value. Convergence resumes on the next real
    /// IP change.
    #[default]
    BeforeReconcile,

    /// Reconcile first, persist only if no subdomain failed
    ///
    /// Failures are retried every tick until they succeed.
    AfterSuccess,
}

impl std::str::FromStr for PersistPolicy {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "before-reconcile" => Ok(Self::BeforeReconcile),
            "after-success" => Ok(Self::AfterSuccess),
            other => Err(crate::Error::config(format!(
                "Unknown persist policy '{}'. Valid: before-reconcile, after-success",
                other
            ))),
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Seconds between ticks
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// TTL written on create/edit (1 = provider-automatic)
    #[serde(default = "default_record_ttl")]
    pub record_ttl: u32,

    /// Proxy flag written on create/edit
    #[serde(default)]
    pub proxied: bool,

    /// Persist-before or persist-after reconciliation
    #[serde(default)]
    pub persist_policy: PersistPolicy,

    /// Capacity of the engine event channel
    ///
    /// When full, new events are dropped (with a warning log).
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl EngineConfig {
    /// Validate the engine settings
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.interval_secs == 0 {
            return Err(crate::Error::config("Engine interval must be > 0"));
        }
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config(
                "Engine event channel capacity must be > 0",
            ));
        }
        Ok(())
    }

    /// Tick interval as a `Duration`
    pub fn interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.interval_secs)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            record_ttl: default_record_ttl(),
            proxied: false,
            persist_policy: PersistPolicy::default(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_interval_secs() -> u64 {
    60
}

fn default_record_ttl() -> u32 {
    AUTOMATIC_TTL
}

fn default_event_channel_capacity() -> usize {
    1000
}

/// Validate that a string is a plausible domain name (RFC 1035 labels)
pub fn validate_domain_name(domain: &str) -> Result<(), crate::Error> {
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

        // `*` and `_` show up in wildcard and service labels
        if !label
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '*')
        {
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
