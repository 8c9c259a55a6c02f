//! Test doubles and common utilities for contract tests
//!
//! These doubles stand in for the provider API, the address lookup and the
//! state store so the contract tests can count calls and inject failures
//! without touching the network.

#![allow(dead_code)]

use dnsync_core::error::{ProviderError, Result};
use dnsync_core::traits::{AddressSource, ProviderClient, RecordMatch, StateStore, Zone};
use dnsync_core::{Address, DdnsConfig, DomainSpec, Error, MemoryStateStore, ProviderConfig};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Content of every fake record before its first update
pub const INITIAL_CONTENT: &str = "198.51.100.1";

/// In-memory provider with per-domain scripting
///
/// By default every domain has a zone holding one A record for whatever
/// record name is asked for. Record content is kept per record id, so an
/// update is visible to the next lookup. Counters are shared between clones.
#[derive(Clone, Default)]
pub struct FakeProvider {
    inner: Arc<FakeProviderInner>,
}

#[derive(Default)]
struct FakeProviderInner {
    /// Domains with no zone at the provider
    missing_zones: Mutex<HashSet<String>>,
    /// Record counts per record name (default 1)
    record_counts: Mutex<HashMap<String, usize>>,
    /// Domains whose updates are rejected
    failing_updates: Mutex<HashSet<String>>,
    /// Domains whose zone lookup is rejected
    failing_lookups: Mutex<HashSet<String>>,
    /// Delay before every call
    delay: Mutex<Option<Duration>>,
    /// Extra delay before every call for one domain
    domain_delays: Mutex<HashMap<String, Duration>>,
    /// Current content per record id
    contents: Mutex<HashMap<String, String>>,

    zone_lookups: AtomicUsize,
    record_lookups: AtomicUsize,
    updates: AtomicUsize,
    updated: Mutex<Vec<(String, String)>>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn without_zone(self, domain: &str) -> Self {
        self.inner
            .missing_zones
            .lock()
            .unwrap()
            .insert(domain.to_string());
        self
    }

    pub fn with_records(self, record_name: &str, count: usize) -> Self {
        self.inner
            .record_counts
            .lock()
            .unwrap()
            .insert(record_name.to_string(), count);
        self
    }

    pub fn failing_updates_for(self, domain: &str) -> Self {
        self.inner
            .failing_updates
            .lock()
            .unwrap()
            .insert(domain.to_string());
        self
    }

    pub fn failing_lookups_for(self, domain: &str) -> Self {
        self.inner
            .failing_lookups
            .lock()
            .unwrap()
            .insert(domain.to_string());
        self
    }

    pub fn with_delay(self, delay: Duration) -> Self {
        *self.inner.delay.lock().unwrap() = Some(delay);
        self
    }

    /// Slow down every call for `domain` only
    pub fn with_domain_delay(self, domain: &str, delay: Duration) -> Self {
        self.inner
            .domain_delays
            .lock()
            .unwrap()
            .insert(domain.to_string(), delay);
        self
    }

    /// Stop failing updates for a domain (simulates the provider recovering)
    pub fn heal(&self, domain: &str) {
        self.inner.failing_updates.lock().unwrap().remove(domain);
        self.inner.failing_lookups.lock().unwrap().remove(domain);
    }

    /// Total calls of any kind
    pub fn total_calls(&self) -> usize {
        self.zone_lookups() + self.record_lookups() + self.update_calls()
    }

    pub fn zone_lookups(&self) -> usize {
        self.inner.zone_lookups.load(Ordering::SeqCst)
    }

    pub fn record_lookups(&self) -> usize {
        self.inner.record_lookups.load(Ordering::SeqCst)
    }

    pub fn update_calls(&self) -> usize {
        self.inner.updates.load(Ordering::SeqCst)
    }

    /// (record id, new content) of every successful update
    pub fn updated(&self) -> Vec<(String, String)> {
        self.inner.updated.lock().unwrap().clone()
    }

    /// Current content of a record
    pub fn content_of(&self, record_id: &str) -> String {
        self.inner
            .contents
            .lock()
            .unwrap()
            .get(record_id)
            .cloned()
            .unwrap_or_else(|| INITIAL_CONTENT.to_string())
    }

    async fn pause(&self, domain: &str) {
        let delay = *self.inner.delay.lock().unwrap();
        let extra = self.inner.domain_delays.lock().unwrap().get(domain).copied();
        let total = delay.unwrap_or_default() + extra.unwrap_or_default();
        if !total.is_zero() {
            tokio::time::sleep(total).await;
        }
    }
}

#[async_trait::async_trait]
impl ProviderClient for FakeProvider {
    async fn find_zone(&self, domain: &str) -> std::result::Result<Option<Zone>, ProviderError> {
        self.inner.zone_lookups.fetch_add(1, Ordering::SeqCst);
        self.pause(domain).await;

        if self.inner.failing_lookups.lock().unwrap().contains(domain) {
            return Err(ProviderError::auth("fake", "invalid API token"));
        }
        if self.inner.missing_zones.lock().unwrap().contains(domain) {
            return Ok(None);
        }

        Ok(Some(Zone {
            id: format!("zone-{}", domain),
            name: domain.to_string(),
        }))
    }

    async fn find_address_records(
        &self,
        zone: &Zone,
        record_name: &str,
    ) -> std::result::Result<Vec<RecordMatch>, ProviderError> {
        self.inner.record_lookups.fetch_add(1, Ordering::SeqCst);
        self.pause(&zone.name).await;

        let count = self
            .inner
            .record_counts
            .lock()
            .unwrap()
            .get(record_name)
            .copied()
            .unwrap_or(1);

        Ok((0..count)
            .map(|i| {
                let id = format!("{}-rec-{}", zone.name, i);
                RecordMatch {
                    content: self.content_of(&id),
                    id,
                    name: record_name.to_string(),
                    ttl: Some(1),
                    proxied: Some(false),
                }
            })
            .collect())
    }

    async fn update_address_record(
        &self,
        zone: &Zone,
        record: &RecordMatch,
        new_content: &Address,
    ) -> std::result::Result<(), ProviderError> {
        self.inner.updates.fetch_add(1, Ordering::SeqCst);
        self.pause(&zone.name).await;

        if self.inner.failing_updates.lock().unwrap().contains(&zone.name) {
            return Err(ProviderError::api("fake", 500, "internal error"));
        }

        self.inner
            .contents
            .lock()
            .unwrap()
            .insert(record.id.clone(), new_content.to_string());
        self.inner
            .updated
            .lock()
            .unwrap()
            .push((record.id.clone(), new_content.to_string()));
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }
}

/// State store that counts loads and commits
///
/// Backed by a [`MemoryStateStore`]; clones share both state and counters.
#[derive(Clone, Default)]
pub struct RecordingStateStore {
    store: MemoryStateStore,
    loads: Arc<AtomicUsize>,
    commits: Arc<AtomicUsize>,
    fail_commit: Arc<std::sync::atomic::AtomicBool>,
}

impl RecordingStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_address(address: Address) -> Self {
        Self {
            store: MemoryStateStore::with_address(address),
            ..Self::default()
        }
    }

    pub fn fail_commits(&self) {
        self.fail_commit.store(true, Ordering::SeqCst);
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn commit_count(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    pub async fn last(&self) -> Option<Address> {
        self.store.load_last_address().await.unwrap()
    }
}

#[async_trait::async_trait]
impl StateStore for RecordingStateStore {
    async fn load_last_address(&self) -> Result<Option<Address>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.store.load_last_address().await
    }

    async fn commit_address(&self, address: &Address) -> Result<()> {
        if self.fail_commit.load(Ordering::SeqCst) {
            return Err(Error::state_store("disk full"));
        }
        self.commits.fetch_add(1, Ordering::SeqCst);
        self.store.commit_address(address).await
    }
}

/// Address source that can be switched between addresses or made to fail
#[derive(Clone)]
pub struct ScriptedAddressSource {
    current: Arc<Mutex<Option<Address>>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedAddressSource {
    pub fn new(address: Address) -> Self {
        Self {
            current: Arc::new(Mutex::new(Some(address))),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A source whose every lookup fails
    pub fn failing() -> Self {
        Self {
            current: Arc::new(Mutex::new(None)),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn set(&self, address: Address) {
        *self.current.lock().unwrap() = Some(address);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl AddressSource for ScriptedAddressSource {
    async fn current(&self) -> Result<Address> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let current = *self.current.lock().unwrap();
        current.ok_or_else(|| Error::address_lookup("all lookup services failed"))
    }

    fn source_name(&self) -> &'static str {
        "scripted"
    }
}

pub fn addr(s: &str) -> Address {
    s.parse().unwrap()
}

/// Config for the given domains, all with the apex host
pub fn config_for(domains: &[&str]) -> DdnsConfig {
    DdnsConfig::new(
        ProviderConfig::cloudflare("test-token"),
        domains.iter().map(|d| DomainSpec::apex(*d)).collect(),
    )
}
