//! Core traits for the zoneddns system
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`IpSource`]: Discover the current public IP
//! - [`DnsProvider`]: List, create and edit zone records via provider APIs
//! - [`StateStore`]: Persist the last-known IP for change detection

pub mod ip_source;
pub mod dns_provider;
pub mod state_store;

pub use ip_source::{IpSource, PublicIp};
pub use dns_provider::{
    DnsProvider, DnsProviderFactory, RecordPayload, RemoteRecord, ADDRESS_RECORD_TYPE,
    AUTOMATIC_TTL,
};
pub use state_store::StateStore;
