// # zoneddns-core
//
// Core library for the multi-zone dynamic DNS system.
//
// ## Architecture Overview
//
// This library keeps a set of address records pointed at the caller's
// current public IP:
// - **IpSource**: Trait for discovering the current public IP
// - **StateStore**: Trait for persisting the last-known IP (change detection)
// - **DnsProvider**: Trait for listing, creating and editing zone records
// - **ZoneRegistry**: Domain -> (provider client, zone id), built once
// - **RecordReconciler**: Create-or-edit of every enabled subdomain
// - **DdnsEngine**: Interval scheduler driving discovery → compare → reconcile
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from implementations
// 2. **Failure Isolation**: A failed subdomain or cycle never stops the loop
// 3. **Library-First**: All core functionality can be used as a library
// 4. **Convergence**: Periodic retry, not exactly-once delivery

pub mod traits;
pub mod engine;
pub mod registry;
pub mod config;
pub mod error;
pub mod state;

// Re-export core types for convenience
pub use traits::{IpSource, DnsProvider, StateStore, PublicIp};
pub use engine::{CycleOutcome, DdnsEngine, EngineEvent, RecordReconciler};
pub use registry::ZoneRegistry;
pub use config::{DdnsConfig, DomainConfig, EngineConfig, PersistPolicy, SubdomainConfig};
pub use error::{Error, Result};
pub use state::{MemoryStateStore, FileStateStore};
