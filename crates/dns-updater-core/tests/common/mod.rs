//! Test doubles and common utilities for contract tests
//!
//! Every double is `Clone` and shares its counters through `Arc`, so a test
//! can box one clone into the update cycle and keep another to inspect.

#![allow(dead_code)]

use async_trait::async_trait;
use dns_updater_core::cancel::run_cancellable;
use dns_updater_core::error::{Error, Result};
use dns_updater_core::target::{fqdn, validate_ipv4};
use dns_updater_core::{
    CancellationToken, DnsUpdater, IpResolver, LastKnownStore, RecordTarget, UpdateCycle,
    UpsertOutcome,
};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Builds a fresh error each time a double fails
pub type ErrorFn = fn() -> Error;

/// Shared log of calls across doubles, for ordering assertions
#[derive(Clone, Default)]
pub struct Journal {
    entries: Arc<Mutex<Vec<String>>>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, entry: impl Into<String>) {
        self.entries.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }
}

/// IP resolver that replays scripted results, then repeats a fallback
#[derive(Clone)]
pub struct ScriptedResolver {
    script: Arc<Mutex<VecDeque<std::result::Result<&'static str, ErrorFn>>>>,
    fallback: std::result::Result<&'static str, ErrorFn>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedResolver {
    /// Always returns `ip`
    pub fn always(ip: &'static str) -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::new())),
            fallback: Ok(ip),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Always fails with the error built by `err`
    pub fn failing(err: ErrorFn) -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::new())),
            fallback: Err(err),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Returns each IP of `ips` in turn, then keeps returning the last one
    pub fn sequence(ips: &[&'static str]) -> Self {
        let fallback = ips.last().copied().unwrap_or("0.0.0.0");
        Self {
            script: Arc::new(Mutex::new(ips.iter().map(|ip| Ok(*ip)).collect())),
            fallback: Ok(fallback),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IpResolver for ScriptedResolver {
    async fn fetch(&self, cancel: &CancellationToken) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(self.fallback);

        run_cancellable(cancel, async move {
            match step {
                Ok(ip) => Ok(ip.to_string()),
                Err(make) => Err(make()),
            }
        })
        .await
    }
}

/// One recorded upsert call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertCall {
    pub zone: String,
    pub name: String,
    pub ip: String,
    pub ttl: Duration,
}

/// DNS updater that records calls and keeps an in-memory zone
///
/// Behaves like a real idempotent provider: re-applying the same value and
/// TTL reports `Unchanged` and leaves the zone as it was.
#[derive(Clone, Default)]
pub struct RecordingUpdater {
    calls: Arc<Mutex<Vec<UpsertCall>>>,
    records: Arc<Mutex<HashMap<String, (String, Duration)>>>,
    failure: Arc<Mutex<Option<ErrorFn>>>,
    journal: Option<Journal>,
}

impl RecordingUpdater {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_journal(journal: Journal) -> Self {
        Self {
            journal: Some(journal),
            ..Self::default()
        }
    }

    /// Make every following upsert fail
    pub fn fail_with(&self, err: ErrorFn) {
        *self.failure.lock().unwrap() = Some(err);
    }

    /// Let following upserts succeed again
    pub fn recover(&self) {
        *self.failure.lock().unwrap() = None;
    }

    pub fn calls(&self) -> Vec<UpsertCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Current (value, ttl) of the record `fqdn` in the fake zone
    pub fn record(&self, fqdn: &str) -> Option<(String, Duration)> {
        self.records.lock().unwrap().get(fqdn).cloned()
    }
}

#[async_trait]
impl DnsUpdater for RecordingUpdater {
    async fn upsert(
        &self,
        cancel: &CancellationToken,
        zone: &str,
        name: &str,
        ip: &str,
        ttl: Duration,
    ) -> Result<UpsertOutcome> {
        self.calls.lock().unwrap().push(UpsertCall {
            zone: zone.to_string(),
            name: name.to_string(),
            ip: ip.to_string(),
            ttl,
        });
        if let Some(journal) = &self.journal {
            journal.record(format!("upsert {}", ip));
        }

        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        if let Some(make) = *self.failure.lock().unwrap() {
            return Err(make());
        }
        validate_ipv4(ip)?;

        let key = fqdn(name, zone);
        let mut records = self.records.lock().unwrap();
        let outcome = match records.get(&key) {
            Some((value, current_ttl)) if value == ip && *current_ttl == ttl => {
                UpsertOutcome::Unchanged
            }
            Some(_) => UpsertOutcome::Updated,
            None => UpsertOutcome::Created,
        };
        records.insert(key, (ip.to_string(), ttl));
        Ok(outcome)
    }

    fn provider_name(&self) -> &'static str {
        "recording"
    }
}

/// DNS updater whose upsert never completes unless cancelled
#[derive(Clone, Default)]
pub struct ParkedUpdater {
    started: Arc<AtomicUsize>,
}

impl ParkedUpdater {
    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DnsUpdater for ParkedUpdater {
    async fn upsert(
        &self,
        cancel: &CancellationToken,
        _zone: &str,
        _name: &str,
        _ip: &str,
        _ttl: Duration,
    ) -> Result<UpsertOutcome> {
        self.started.fetch_add(1, Ordering::SeqCst);
        run_cancellable(cancel, std::future::pending()).await
    }

    fn provider_name(&self) -> &'static str {
        "parked"
    }
}

/// Last-known-value store that records reads and writes
#[derive(Clone, Default)]
pub struct RecordingStore {
    value: Arc<Mutex<String>>,
    reads: Arc<AtomicUsize>,
    writes: Arc<Mutex<Vec<String>>>,
    read_failure: Arc<Mutex<Option<ErrorFn>>>,
    write_failure: Arc<Mutex<Option<ErrorFn>>>,
    journal: Option<Journal>,
}

impl RecordingStore {
    /// Store with no prior value
    pub fn empty() -> Self {
        Self::default()
    }

    /// Store holding `ip`
    pub fn holding(ip: &str) -> Self {
        let store = Self::default();
        *store.value.lock().unwrap() = ip.to_string();
        store
    }

    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = Some(journal);
        self
    }

    pub fn fail_reads_with(&self, err: ErrorFn) {
        *self.read_failure.lock().unwrap() = Some(err);
    }

    pub fn fail_writes_with(&self, err: ErrorFn) {
        *self.write_failure.lock().unwrap() = Some(err);
    }

    pub fn recover(&self) {
        *self.read_failure.lock().unwrap() = None;
        *self.write_failure.lock().unwrap() = None;
    }

    pub fn value(&self) -> String {
        self.value.lock().unwrap().clone()
    }

    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> Vec<String> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl LastKnownStore for RecordingStore {
    async fn read(&self, cancel: &CancellationToken) -> Result<String> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        if let Some(make) = *self.read_failure.lock().unwrap() {
            return Err(make());
        }
        Ok(self.value())
    }

    async fn write(&self, cancel: &CancellationToken, ip: &str) -> Result<()> {
        self.writes.lock().unwrap().push(ip.to_string());
        if let Some(journal) = &self.journal {
            journal.record(format!("write {}", ip));
        }
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        if let Some(make) = *self.write_failure.lock().unwrap() {
            return Err(make());
        }
        *self.value.lock().unwrap() = ip.to_string();
        Ok(())
    }
}

/// Target used by most tests: `host` in `zone.` with a 60s TTL
pub fn host_target() -> RecordTarget {
    RecordTarget::new("zone", "host", Duration::from_secs(60)).expect("valid target")
}

/// Assemble a cycle from clones of the given doubles
pub fn cycle_with<U, S>(resolver: &ScriptedResolver, updater: &U, store: &S) -> UpdateCycle
where
    U: DnsUpdater + Clone + 'static,
    S: LastKnownStore + Clone + 'static,
{
    UpdateCycle::new(
        Arc::new(resolver.clone()),
        Box::new(updater.clone()),
        Box::new(store.clone()),
        host_target(),
    )
}

pub fn network_down() -> Error {
    Error::network("connection refused")
}

pub fn provider_rejected() -> Error {
    Error::provider("recording", "zone not found")
}

pub fn disk_failure() -> Error {
    Error::storage("read-only file system")
}
