// # DNS Provider Trait
//
// Defines the interface for reading and mutating address records in a
// provider zone.
//
// ## Implementations
//
// - Cloudflare: `zoneddns-provider-cloudflare` crate
//
// ## Usage
//
// ```rust,ignore
// use zoneddns_core::traits::{DnsProvider, RecordPayload};
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let provider = /* DnsProvider implementation */;
//
//     let records = provider.list_records("zone-id").await?;
//     let payload = RecordPayload::address("home.example.com", "1.2.3.4");
//     match records.iter().find(|r| r.is_address_for("home.example.com")) {
//         Some(existing) => provider.edit_record("zone-id", &existing.id, &payload).await?,
//         None => provider.create_record("zone-id", &payload).await?,
//     };
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Record type managed by this system
pub const ADDRESS_RECORD_TYPE: &str = "A";

/// Provider-automatic TTL
pub const AUTOMATIC_TTL: u32 = 1;

/// A record as seen at the provider
///
/// Read-only view. Fetched fresh on every reconciliation pass, never cached
/// across cycles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRecord {
    /// Provider-assigned identifier
    pub id: String,
    /// Fully-qualified name
    pub name: String,
    /// Record kind (`A`, `AAAA`, `CNAME`, ...)
    #[serde(rename = "type")]
    pub record_type: String,
    /// Record content (the address for `A` records)
    pub content: String,
}

impl RemoteRecord {
    /// `true` if this is the address record for `full_name`
    pub fn is_address_for(&self, full_name: &str) -> bool {
        self.name == full_name && self.record_type == ADDRESS_RECORD_TYPE
    }
}

/// Field set sent on both create and edit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordPayload {
    /// Always `A`
    #[serde(rename = "type")]
    pub record_type: &'static str,
    /// Fully-qualified record name
    pub name: String,
    /// Target address
    pub content: String,
    /// Time-to-live (1 = provider-automatic)
    pub ttl: u32,
    /// Whether the provider should proxy traffic
    pub proxied: bool,
}

impl RecordPayload {
    /// Address record with automatic TTL and proxying disabled
    pub fn address(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            record_type: ADDRESS_RECORD_TYPE,
            name: name.into(),
            content: content.into(),
            ttl: AUTOMATIC_TTL,
            proxied: false,
        }
    }

    /// Override the TTL
    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = ttl;
        self
    }

    /// Override proxying
    pub fn with_proxied(mut self, proxied: bool) -> Self {
        self.proxied = proxied;
        self
    }
}

/// Trait for DNS provider implementations
///
/// One instance is scoped to one credential (one configured domain). The
/// zone to operate on is passed per call.
///
/// # Trust Level: Untrusted
///
/// ## Allowed Capabilities
/// - ✅ Perform HTTP/HTTPS API calls to their endpoints only
/// - ✅ Parse provider-specific responses
/// - ✅ Return success or failure (the next IP change or tick is the retry)
///
/// ## Forbidden Capabilities
/// - ❌ Spawn tasks or threads
/// - ❌ Implement retry logic or backoff
/// - ❌ Access the state store
/// - ❌ Cache records beyond a single call
/// - ❌ Decide whether a create or an edit is needed (owned by `RecordReconciler`)
///
/// Every call must carry a bounded timeout.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// List the records in a zone
    ///
    /// Implementations may filter server-side to address records; callers
    /// still match on name and type themselves. Order is the provider's.
    async fn list_records(&self, zone_id: &str) -> Result<Vec<RemoteRecord>, crate::Error>;

    /// Create a record
    async fn create_record(
        &self,
        zone_id: &str,
        payload: &RecordPayload,
    ) -> Result<RemoteRecord, crate::Error>;

    /// Edit the record identified by `record_id`
    async fn edit_record(
        &self,
        zone_id: &str,
        record_id: &str,
        payload: &RecordPayload,
    ) -> Result<RemoteRecord, crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

/// Helper trait for constructing DNS providers from per-domain configuration
pub trait DnsProviderFactory: Send + Sync {
    /// Create a provider scoped to one domain's credential
    ///
    /// # Parameters
    ///
    /// - `domain`: The domain key (for diagnostics)
    /// - `config`: The domain's zone and credential
    fn create(
        &self,
        domain: &str,
        config: &crate::config::DomainConfig,
    ) -> Result<Box<dyn DnsProvider>, crate::Error>;
}
