// # Memory State Store
//
// In-memory implementation of StateStore.
//
// ## Crash Behavior
//
// - State is lost on restart
// - The first cycle after a restart always reconciles
//
// ## When to Use
//
// - Testing environments
// - Container deployments where an initial reconciliation is harmless

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Error;
use crate::traits::ip_source::PublicIp;
use crate::traits::state_store::StateStore;

/// In-memory state store implementation
///
/// # Example
///
/// ```rust,no_run
/// use zoneddns_core::state::MemoryStateStore;
/// use zoneddns_core::traits::{PublicIp, StateStore};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemoryStateStore::new();
///     store.save_ip(&PublicIp::new("1.2.3.4")).await?;
///     assert_eq!(store.saved_ip().await, Some(PublicIp::new("1.2.3.4")));
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStateStore {
    inner: Arc<RwLock<Option<PublicIp>>>,
}

impl MemoryStateStore {
    /// Create a new empty memory state store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `ip`
    pub fn with_ip(ip: PublicIp) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Some(ip))),
        }
    }

    /// Forget the stored value
    pub async fn clear(&self) {
        *self.inner.write().await = None;
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn saved_ip(&self) -> Option<PublicIp> {
        self.inner.read().await.clone()
    }

    async fn save_ip(&self, ip: &PublicIp) -> Result<(), Error> {
        *self.inner.write().await = Some(ip.clone());
        Ok(())
    }
}
