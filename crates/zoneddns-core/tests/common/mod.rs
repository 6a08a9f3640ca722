//! Test doubles and common utilities for contract tests
//!
//! These doubles record every call so tests can assert on exactly which
//! provider operations and state writes a cycle performed.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use zoneddns_core::config::{DdnsConfig, DomainConfig, EngineConfig, SubdomainConfig};
use zoneddns_core::error::{Error, Result};
use zoneddns_core::traits::{
    DnsProvider, IpSource, PublicIp, RecordPayload, RemoteRecord, StateStore,
};
use zoneddns_core::{MemoryStateStore, ZoneRegistry};

/// An IpSource that replays a script of results
///
/// The last scripted result repeats once the script is exhausted.
#[derive(Clone)]
pub struct ScriptedIpSource {
    script: Arc<Mutex<VecDeque<std::result::Result<String, String>>>>,
    last: Arc<Mutex<std::result::Result<String, String>>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedIpSource {
    /// Always returns `ip`
    pub fn fixed(ip: &str) -> Self {
        Self::scripted(vec![Ok(ip.to_string())])
    }

    /// Always fails with a network error
    pub fn failing(reason: &str) -> Self {
        Self::scripted(vec![Err(reason.to_string())])
    }

    /// Replays `script` in order
    pub fn scripted(script: Vec<std::result::Result<String, String>>) -> Self {
        let last = script
            .last()
            .cloned()
            .unwrap_or_else(|| Err("empty script".to_string()));
        Self {
            script: Arc::new(Mutex::new(script.into())),
            last: Arc::new(Mutex::new(last)),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of times current() was called
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IpSource for ScriptedIpSource {
    async fn current(&self) -> Result<PublicIp> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        let result = match next {
            Some(result) => {
                *self.last.lock().unwrap() = result.clone();
                result
            }
            None => self.last.lock().unwrap().clone(),
        };
        result.map(PublicIp::new).map_err(Error::network)
    }

    fn source_name(&self) -> &'static str {
        "scripted"
    }
}

/// One recorded provider call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCall {
    List {
        zone_id: String,
    },
    Create {
        zone_id: String,
        payload: RecordPayload,
    },
    Edit {
        zone_id: String,
        record_id: String,
        payload: RecordPayload,
    },
}

impl ProviderCall {
    pub fn is_mutation(&self) -> bool {
        !matches!(self, ProviderCall::List { .. })
    }
}

#[derive(Default)]
struct ProviderState {
    records: Vec<RemoteRecord>,
    calls: Vec<ProviderCall>,
    failing_names: HashSet<String>,
    next_id: usize,
}

/// A DnsProvider backed by an in-memory record list
///
/// Clones share the same records and call log.
#[derive(Clone, Default)]
pub struct RecordingProvider {
    state: Arc<Mutex<ProviderState>>,
}

impl RecordingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an existing remote record
    pub fn with_record(self, id: &str, name: &str, record_type: &str, content: &str) -> Self {
        self.state.lock().unwrap().records.push(RemoteRecord {
            id: id.to_string(),
            name: name.to_string(),
            record_type: record_type.to_string(),
            content: content.to_string(),
        });
        self
    }

    /// Make create/edit of `name` fail with a network error
    pub fn failing_for(self, name: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_names
            .insert(name.to_string());
        self
    }

    /// Stop failing for `name`
    pub fn recover(&self, name: &str) {
        self.state.lock().unwrap().failing_names.remove(name);
    }

    pub fn calls(&self) -> Vec<ProviderCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn mutation_count(&self) -> usize {
        self.calls().iter().filter(|c| c.is_mutation()).count()
    }

    pub fn list_count(&self) -> usize {
        self.calls().len() - self.mutation_count()
    }

    pub fn records(&self) -> Vec<RemoteRecord> {
        self.state.lock().unwrap().records.clone()
    }

    /// Boxed handle sharing this provider's state
    pub fn boxed(&self) -> Box<dyn DnsProvider> {
        Box::new(self.clone())
    }
}

#[async_trait]
impl DnsProvider for RecordingProvider {
    async fn list_records(&self, zone_id: &str) -> Result<Vec<RemoteRecord>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(ProviderCall::List {
            zone_id: zone_id.to_string(),
        });
        Ok(state.records.clone())
    }

    async fn create_record(&self, zone_id: &str, payload: &RecordPayload) -> Result<RemoteRecord> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(ProviderCall::Create {
            zone_id: zone_id.to_string(),
            payload: payload.clone(),
        });
        if state.failing_names.contains(&payload.name) {
            return Err(Error::network("connection reset"));
        }

        state.next_id += 1;
        let record = RemoteRecord {
            id: format!("rec-{}", state.next_id),
            name: payload.name.clone(),
            record_type: payload.record_type.to_string(),
            content: payload.content.clone(),
        };
        state.records.push(record.clone());
        Ok(record)
    }

    async fn edit_record(
        &self,
        zone_id: &str,
        record_id: &str,
        payload: &RecordPayload,
    ) -> Result<RemoteRecord> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(ProviderCall::Edit {
            zone_id: zone_id.to_string(),
            record_id: record_id.to_string(),
            payload: payload.clone(),
        });
        if state.failing_names.contains(&payload.name) {
            return Err(Error::network("connection reset"));
        }

        let record = state
            .records
            .iter_mut()
            .find(|r| r.id == record_id)
            .ok_or_else(|| Error::provider_api("recording", "record not found"))?;
        record.content = payload.content.clone();
        Ok(record.clone())
    }

    fn provider_name(&self) -> &'static str {
        "recording"
    }
}

/// A StateStore that counts writes and can be made to fail them
#[derive(Clone, Default)]
pub struct CountingStateStore {
    inner: MemoryStateStore,
    saves: Arc<AtomicUsize>,
    fail_saves: Arc<std::sync::atomic::AtomicBool>,
}

impl CountingStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ip(ip: &str) -> Self {
        Self {
            inner: MemoryStateStore::with_ip(PublicIp::new(ip)),
            ..Self::default()
        }
    }

    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub async fn current(&self) -> Option<PublicIp> {
        self.inner.saved_ip().await
    }
}

#[async_trait]
impl StateStore for CountingStateStore {
    async fn saved_ip(&self) -> Option<PublicIp> {
        self.inner.saved_ip().await
    }

    async fn save_ip(&self, ip: &PublicIp) -> Result<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(Error::state_store("disk full"));
        }
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.inner.save_ip(ip).await
    }
}

/// `example.com` zone with the given subdomains (all enabled)
pub fn config_with(subdomains: &[&str]) -> DdnsConfig {
    let mut config = DdnsConfig::new().with_domain(
        "example.com",
        DomainConfig::new("zone-example-com", "test-token"),
    );
    for sub in subdomains {
        config = config.with_subdomain(*sub, SubdomainConfig::new(*sub, "example.com"));
    }
    config.engine = EngineConfig {
        event_channel_capacity: 100,
        ..EngineConfig::default()
    };
    config
}

/// Registry with `example.com` served by `provider`
pub fn registry_with(provider: &RecordingProvider) -> ZoneRegistry {
    ZoneRegistry::new().register("example.com", "zone-example-com", provider.boxed())
}
