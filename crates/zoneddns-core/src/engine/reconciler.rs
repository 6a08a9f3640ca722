//! Record reconciliation
//!
//! Makes remote DNS match `{subdomain.domain -> current IP}` for every
//! enabled subdomain:
//!
//! 1. Resolve the subdomain's zone via the [`ZoneRegistry`] (skip with a
//!    warning if the domain is not configured)
//! 2. List the zone's records (fresh, one list call per subdomain)
//! 3. First record with matching name and type `A` wins
//! 4. Edit it if found, create one otherwise
//!
//! Each subdomain is independent: a failure is logged and recorded, and
//! the remaining subdomains are still processed.

use std::collections::BTreeMap;

use tracing::{debug, error, info, warn};

use crate::config::{DdnsConfig, SubdomainConfig};
use crate::error::{Error, Result};
use crate::registry::{ZoneHandle, ZoneRegistry};
use crate::traits::{PublicIp, RecordPayload, AUTOMATIC_TTL};

/// Why a subdomain was not reconciled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The subdomain's domain has no zone in the registry
    MissingDomain {
        /// The unknown domain key
        domain: String,
    },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::MissingDomain { domain } => {
                write!(f, "no domain configuration found for {}", domain)
            }
        }
    }
}

impl From<SkipReason> for Error {
    fn from(reason: SkipReason) -> Self {
        match reason {
            SkipReason::MissingDomain { domain } => Error::config_gap(domain),
        }
    }
}

/// Result of reconciling one subdomain
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubdomainOutcome {
    /// No matching record existed; one was created
    Created {
        /// Identifier of the new record
        record_id: String,
    },
    /// A matching record existed and was edited
    Updated {
        /// Identifier of the edited record
        record_id: String,
    },
    /// Not processed (neither success nor hard failure)
    Skipped {
        /// Why
        reason: SkipReason,
    },
    /// A provider call failed
    Failed {
        /// Error message
        error: String,
        /// Whether a later attempt could plausibly succeed
        transient: bool,
    },
}

/// Per-subdomain line of a [`ReconcileReport`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubdomainReport {
    /// Subdomain key from configuration
    pub key: String,
    /// Fully-qualified record name
    pub full_name: String,
    /// What happened
    pub outcome: SubdomainOutcome,
}

/// Outcome of one reconciliation pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// One entry per enabled subdomain, in key order
    pub entries: Vec<SubdomainReport>,
}

impl ReconcileReport {
    /// Number of records created
    pub fn created(&self) -> usize {
        self.count(|o| matches!(o, SubdomainOutcome::Created { .. }))
    }

    /// Number of records edited
    pub fn updated(&self) -> usize {
        self.count(|o| matches!(o, SubdomainOutcome::Updated { .. }))
    }

    /// Number of subdomains skipped
    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, SubdomainOutcome::Skipped { .. }))
    }

    /// Number of subdomains that failed
    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, SubdomainOutcome::Failed { .. }))
    }

    /// `true` if any subdomain failed
    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    fn count(&self, pred: impl Fn(&SubdomainOutcome) -> bool) -> usize {
        self.entries.iter().filter(|e| pred(&e.outcome)).count()
    }
}

/// Reconciles the configured subdomains against their provider zones
pub struct RecordReconciler {
    registry: ZoneRegistry,
    subdomains: BTreeMap<String, SubdomainConfig>,
    ttl: u32,
    proxied: bool,
}

impl RecordReconciler {
    /// Create a reconciler with automatic TTL and proxying disabled
    pub fn new(registry: ZoneRegistry, subdomains: BTreeMap<String, SubdomainConfig>) -> Self {
        Self {
            registry,
            subdomains,
            ttl: AUTOMATIC_TTL,
            proxied: false,
        }
    }

    /// Create a reconciler from the full configuration
    pub fn from_config(registry: ZoneRegistry, config: &DdnsConfig) -> Self {
        Self::new(registry, config.subdomains.clone())
            .with_ttl(config.engine.record_ttl)
            .with_proxied(config.engine.proxied)
    }

    /// Override the TTL written on create/edit
    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = ttl;
        self
    }

    /// Override the proxy flag written on create/edit
    pub fn with_proxied(mut self, proxied: bool) -> Self {
        self.proxied = proxied;
        self
    }

    /// The zone registry in use
    pub fn registry(&self) -> &ZoneRegistry {
        &self.registry
    }

    /// Number of subdomains that will be processed
    pub fn enabled_count(&self) -> usize {
        self.subdomains.values().filter(|s| s.enabled).count()
    }

    /// Reconcile every enabled subdomain to `ip`
    ///
    /// Never fails as a whole: per-subdomain errors are logged and reported.
    pub async fn reconcile(&self, ip: &PublicIp) -> ReconcileReport {
        let mut report = ReconcileReport::default();

        for (key, subdomain) in &self.subdomains {
            if !subdomain.enabled {
                debug!("Subdomain {} is disabled, skipping", key);
                continue;
            }

            let full_name = subdomain.full_name();

            let Some(zone) = self.registry.zone(&subdomain.domain) else {
                let reason = SkipReason::MissingDomain {
                    domain: subdomain.domain.clone(),
                };
                warn!(
                    "{}, skipping subdomain {}",
                    Error::from(reason.clone()),
                    full_name
                );
                report.entries.push(SubdomainReport {
                    key: key.clone(),
                    full_name,
                    outcome: SubdomainOutcome::Skipped { reason },
                });
                continue;
            };

            let outcome = match self.reconcile_one(zone, &full_name, ip).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!("Failed to update DNS record for {}: {}", full_name, e);
                    SubdomainOutcome::Failed {
                        error: e.to_string(),
                        transient: e.is_transient(),
                    }
                }
            };

            report.entries.push(SubdomainReport {
                key: key.clone(),
                full_name,
                outcome,
            });
        }

        report
    }

    /// Create-or-edit the address record for one subdomain
    async fn reconcile_one(
        &self,
        zone: ZoneHandle<'_>,
        full_name: &str,
        ip: &PublicIp,
    ) -> Result<SubdomainOutcome> {
        let records = zone.provider.list_records(zone.zone_id).await?;

        let mut matches = records.iter().filter(|r| r.is_address_for(full_name));
        let existing = matches.next();
        let duplicates = matches.count();
        if duplicates > 0 {
            warn!(
                "Zone {} has {} A records named {}; editing the first one returned by {}",
                zone.domain,
                duplicates + 1,
                full_name,
                zone.provider.provider_name()
            );
        }

        let payload = RecordPayload::address(full_name, ip.as_str())
            .with_ttl(self.ttl)
            .with_proxied(self.proxied);

        match existing {
            Some(record) => {
                zone.provider
                    .edit_record(zone.zone_id, &record.id, &payload)
                    .await?;
                info!("Updated DNS record for {} to IP: {}", full_name, ip);
                Ok(SubdomainOutcome::Updated {
                    record_id: record.id.clone(),
                })
            }
            None => {
                let created = zone.provider.create_record(zone.zone_id, &payload).await?;
                info!("Created DNS record for {} with IP: {}", full_name, ip);
                Ok(SubdomainOutcome::Created {
                    record_id: created.id,
                })
            }
        }
    }
}

impl std::fmt::Debug for RecordReconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordReconciler")
            .field("registry", &self.registry)
            .field("subdomains", &self.subdomains.len())
            .field("ttl", &self.ttl)
            .field("proxied", &self.proxied)
            .finish()
    }
}
