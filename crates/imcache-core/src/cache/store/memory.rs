//! In-process store
//!
//! Behaves like a single remote node: each call is one round trip, values
//! expire lazily, and failures or latency can be injected per key or per
//! round trip so the batch strategies can be exercised without a server.

use super::KvStore;
use crate::error::{CacheError, CacheResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Debug, Clone)]
struct StoredValue {
    value: Vec<u8>,
    expires_at: Option<DateTime<Utc>>,
}

impl StoredValue {
    fn new(value: Vec<u8>, ttl: Option<Duration>) -> Self {
        let expires_at = ttl
            .and_then(|ttl| chrono::Duration::from_std(ttl).ok())
            .map(|ttl| Utc::now() + ttl);
        Self { value, expires_at }
    }

    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|exp| Utc::now() >= exp)
    }
}

/// Store statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStoreStats {
    /// Round trips served (one per single call, one per pipeline)
    pub round_trips: u64,
    /// Commands executed across all round trips
    pub commands: u64,
    /// Highest number of round trips in flight at once
    pub peak_in_flight: usize,
}

/// `DashMap`-backed [`KvStore`]
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, StoredValue>,
    /// Per-key command failures
    failing_keys: DashMap<String, CacheError>,
    /// Per-key command latency
    key_latency: DashMap<String, Duration>,
    /// Failure applied to every round trip
    round_trip_failure: Mutex<Option<CacheError>>,
    /// Latency applied to every round trip
    latency: Mutex<Option<Duration>>,
    round_trips: AtomicU64,
    commands: AtomicU64,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every command touching `key` with `error`
    pub fn fail_key(&self, key: impl Into<String>, error: CacheError) {
        self.failing_keys.insert(key.into(), error);
    }

    /// Fail every round trip with `error` until cleared
    pub fn fail_round_trips(&self, error: CacheError) {
        *self.round_trip_failure.lock() = Some(error);
    }

    /// Remove all injected failures
    pub fn clear_failures(&self) {
        self.failing_keys.clear();
        *self.round_trip_failure.lock() = None;
    }

    /// Delay every round trip by `latency`
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock() = Some(latency);
    }

    /// Delay single commands on `key` by `latency` (on top of round-trip latency)
    pub fn set_key_latency(&self, key: impl Into<String>, latency: Duration) {
        self.key_latency.insert(key.into(), latency);
    }

    /// Write a raw value, bypassing failure injection
    pub fn insert_raw(&self, key: impl Into<String>, value: impl Into<Vec<u8>>) {
        self.entries
            .insert(key.into(), StoredValue::new(value.into(), None));
    }

    /// Whether a live entry exists at `key`
    pub fn contains(&self, key: &str) -> bool {
        self.entries.get(key).is_some_and(|v| !v.is_expired())
    }

    /// Number of stored entries, including expired ones not yet reclaimed
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> MemoryStoreStats {
        MemoryStoreStats {
            round_trips: self.round_trips.load(Ordering::Relaxed),
            commands: self.commands.load(Ordering::Relaxed),
            peak_in_flight: self.peak_in_flight.load(Ordering::Relaxed),
        }
    }

    /// Drop every entry and reset statistics
    pub fn clear(&self) {
        self.entries.clear();
        self.round_trips.store(0, Ordering::Relaxed);
        self.commands.store(0, Ordering::Relaxed);
        self.peak_in_flight.store(0, Ordering::Relaxed);
    }

    /// Account for one round trip, apply latency and round-trip failures.
    /// The returned guard marks the round trip finished when dropped.
    async fn round_trip(&self, commands: usize, key: Option<&str>) -> CacheResult<InFlight<'_>> {
        self.round_trips.fetch_add(1, Ordering::Relaxed);
        self.commands.fetch_add(commands as u64, Ordering::Relaxed);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        let guard = InFlight(&self.in_flight);

        let mut delay = *self.latency.lock();
        if let Some(extra) = key.and_then(|k| self.key_latency.get(k).map(|d| *d)) {
            delay = Some(delay.unwrap_or_default() + extra);
        }
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(err) = self.round_trip_failure.lock().clone() {
            return Err(err);
        }
        Ok(guard)
    }

    fn key_failure(&self, key: &str) -> CacheResult<()> {
        match self.failing_keys.get(key) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn read(&self, key: &str) -> Option<Vec<u8>> {
        let expired = match self.entries.get(key) {
            Some(stored) if !stored.is_expired() => return Some(stored.value.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries.remove_if(key, |_, v| v.is_expired());
        }
        None
    }

    fn remove(&self, key: &str) -> bool {
        self.entries
            .remove(key)
            .is_some_and(|(_, stored)| !stored.is_expired())
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> CacheResult<()> {
        let _in_flight = self.round_trip(1, Some(key)).await?;
        self.key_failure(key)?;
        self.entries
            .insert(key.to_string(), StoredValue::new(value, ttl));
        Ok(())
    }

    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        let _in_flight = self.round_trip(1, Some(key)).await?;
        self.key_failure(key)?;
        Ok(self.read(key))
    }

    async fn del(&self, key: &str) -> CacheResult<bool> {
        let _in_flight = self.round_trip(1, Some(key)).await?;
        self.key_failure(key)?;
        Ok(self.remove(key))
    }

    async fn pipeline_set(
        &self,
        entries: Vec<(String, Vec<u8>)>,
        ttl: Option<Duration>,
    ) -> CacheResult<()> {
        let _in_flight = self.round_trip(entries.len(), None).await?;
        let mut first_error = None;
        for (key, value) in entries {
            match self.key_failure(&key) {
                Ok(()) => {
                    self.entries.insert(key, StoredValue::new(value, ttl));
                }
                Err(err) => {
                    first_error.get_or_insert(err);
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    async fn pipeline_get(&self, keys: Vec<String>) -> CacheResult<Vec<CacheResult<Option<Vec<u8>>>>> {
        let _in_flight = self.round_trip(keys.len(), None).await?;
        Ok(keys
            .iter()
            .map(|key| self.key_failure(key).map(|()| self.read(key)))
            .collect())
    }

    async fn pipeline_del(&self, keys: Vec<String>) -> CacheResult<usize> {
        let _in_flight = self.round_trip(keys.len(), None).await?;
        let mut removed = 0;
        let mut first_error = None;
        for key in &keys {
            match self.key_failure(key) {
                Ok(()) => {
                    if self.remove(key) {
                        removed += 1;
                    }
                }
                Err(err) => {
                    first_error.get_or_insert(err);
                }
            }
        }
        first_error.map_or(Ok(removed), Err)
    }
}
