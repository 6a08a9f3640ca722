// # State Store Trait
//
// Defines the interface for persisting the last-known public IP.
//
// ## Purpose
//
// The state store is what makes change detection work across ticks and
// restarts: the engine compares the freshly discovered IP against the
// persisted one and only reconciles DNS when they differ.
//
// ## Implementations
//
// - File-based: plaintext single value, atomic replace (`FileStateStore`)
// - In-memory: `MemoryStateStore`
//
// ## Usage
//
// ```rust,ignore
// use zoneddns_core::{PublicIp, StateStore};
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let store = /* StateStore implementation */;
//
//     if store.saved_ip().await.is_none() {
//         store.save_ip(&PublicIp::new("1.2.3.4")).await?;
//     }
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

use crate::traits::ip_source::PublicIp;

/// Trait for state store implementations
///
/// # Trust Level: Trusted (Core Component)
///
/// ## Allowed Capabilities
/// - ✅ Perform I/O for persistent storage
/// - ✅ Lock internally for thread safety
///
/// ## Forbidden Capabilities
/// - ❌ Decide when to reconcile (owned by `DdnsEngine`)
/// - ❌ Perform DNS updates (owned by `DnsProvider`)
/// - ❌ Discover IPs (owned by `IpSource`)
///
/// ## Implementation Guidelines
///
/// - **Never fail reads**: a missing or corrupt value is `None`, which
///   costs one extra reconciliation rather than a crash
/// - **Atomic writes**: a crash mid-write must not leave a partial value
///   readable by the next cycle
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Get the last IP for which reconciliation was attempted
    ///
    /// # Returns
    ///
    /// - `Some(PublicIp)`: The persisted value
    /// - `None`: Never persisted, empty, or unreadable
    async fn saved_ip(&self) -> Option<PublicIp>;

    /// Overwrite the persisted IP
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Value durably replaced
    /// - `Err(Error::StateStore)`: Storage error
    async fn save_ip(&self, ip: &PublicIp) -> Result<(), crate::Error>;
}
