//! Per-domain zone registry
//!
//! The registry maps a logical domain name to the provider client scoped to
//! that domain's credential and to the domain's zone identifier. It is built
//! once at startup and is immutable afterwards; the engine owns it.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use zoneddns_core::registry::ZoneRegistry;
//!
//! // Build one client per configured domain
//! let registry = ZoneRegistry::from_domains(&config.domains, &CloudflareFactory::new(false))?;
//!
//! if let Some(zone) = registry.zone("example.com") {
//!     let records = zone.provider.list_records(zone.zone_id).await?;
//! }
//! ```
//!
//! Absence of a domain is a configuration gap, not a defect: callers skip
//! the affected subdomain with a warning.

use crate::config::DomainConfig;
use crate::error::{Error, Result};
use crate::traits::{DnsProvider, DnsProviderFactory};
use std::collections::{BTreeMap, HashMap};

/// A configured zone: provider client plus zone identifier
struct ZoneEntry {
    zone_id: String,
    provider: Box<dyn DnsProvider>,
}

/// Borrowed view of one configured zone
#[derive(Clone, Copy)]
pub struct ZoneHandle<'a> {
    /// Domain key
    pub domain: &'a str,
    /// Zone identifier at the provider
    pub zone_id: &'a str,
    /// Client scoped to the domain's credential
    pub provider: &'a dyn DnsProvider,
}

impl std::fmt::Debug for ZoneHandle<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZoneHandle")
            .field("domain", &self.domain)
            .field("zone_id", &self.zone_id)
            .field("provider", &self.provider.provider_name())
            .finish()
    }
}

/// Registry of per-domain provider clients
#[derive(Default)]
pub struct ZoneRegistry {
    zones: HashMap<String, ZoneEntry>,
}

impl ZoneRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry with one provider per configured domain
    ///
    /// # Returns
    ///
    /// - `Ok(ZoneRegistry)`: Every domain has a client
    /// - `Err(Error::Config)`: The factory rejected some domain's configuration
    pub fn from_domains(
        domains: &BTreeMap<String, DomainConfig>,
        factory: &dyn DnsProviderFactory,
    ) -> Result<Self> {
        let mut registry = Self::new();

        for (domain, config) in domains {
            let provider = factory.create(domain, config).map_err(|e| {
                Error::config(format!("Failed to create provider for {}: {}", domain, e))
            })?;
            tracing::debug!(
                "Registered {} zone for domain {}",
                provider.provider_name(),
                domain
            );
            registry = registry.register(domain.clone(), config.zone_id.clone(), provider);
        }

        Ok(registry)
    }

    /// Register a zone (builder style)
    ///
    /// Replaces any earlier registration for the same domain.
    pub fn register(
        mut self,
        domain: impl Into<String>,
        zone_id: impl Into<String>,
        provider: Box<dyn DnsProvider>,
    ) -> Self {
        self.zones.insert(
            domain.into(),
            ZoneEntry {
                zone_id: zone_id.into(),
                provider,
            },
        );
        self
    }

    /// Provider client for `domain`
    pub fn client_for(&self, domain: &str) -> Option<&dyn DnsProvider> {
        self.zones.get(domain).map(|entry| entry.provider.as_ref())
    }

    /// Zone identifier for `domain`
    pub fn zone_id_for(&self, domain: &str) -> Option<&str> {
        self.zones.get(domain).map(|entry| entry.zone_id.as_str())
    }

    /// Both halves of a zone at once
    pub fn zone<'a>(&'a self, domain: &str) -> Option<ZoneHandle<'a>> {
        self.zones
            .get_key_value(domain)
            .map(|(domain, entry)| ZoneHandle {
                domain: domain.as_str(),
                zone_id: entry.zone_id.as_str(),
                provider: entry.provider.as_ref(),
            })
    }

    /// Number of registered zones
    pub fn len(&self) -> usize {
        self.zones.len()
    }

    /// `true` if no zone is registered
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// Registered domain names, sorted
    pub fn domains(&self) -> Vec<&str> {
        let mut domains: Vec<&str> = self.zones.keys().map(String::as_str).collect();
        domains.sort_unstable();
        domains
    }
}

impl std::fmt::Debug for ZoneRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZoneRegistry")
            .field("domains", &self.domains())
            .finish()
    }
}
