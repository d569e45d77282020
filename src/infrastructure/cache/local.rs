//! Process-local store with per-entry expiry, built on moka

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use moka::ops::compute::{CompResult, Op};
use moka::policy::EvictionPolicy;
use moka::sync::Cache as MokaCache;
use moka::Expiry;
use regex::Regex;

use crate::domain::clock::{deadline_millis, Clock, SystemClock};
use crate::domain::DomainError;

/// Configuration for the local store
#[derive(Debug, Clone)]
pub struct LocalStoreConfig {
    /// Maximum number of entries before the least recently used ones are evicted
    pub max_capacity: u64,
}

impl Default for LocalStoreConfig {
    fn default() -> Self {
        Self {
            max_capacity: 10_000,
        }
    }
}

impl LocalStoreConfig {
    pub fn with_max_capacity(mut self, capacity: u64) -> Self {
        self.max_capacity = capacity;
        self
    }
}

#[derive(Debug, Clone)]
struct LocalEntry<V> {
    value: V,
    /// Absolute expiry, Unix epoch millis
    expires_at: Option<i64>,
}

impl<V> LocalEntry<V> {
    fn is_expired(&self, now: i64) -> bool {
        matches!(self.expires_at, Some(expires_at) if now >= expires_at)
    }
}

/// Hands each entry's deadline to moka so expired entries release their slot
#[derive(Debug)]
struct EntryExpiry {
    clock: Arc<dyn Clock>,
}

impl EntryExpiry {
    fn remaining<V>(&self, entry: &LocalEntry<V>) -> Option<Duration> {
        let expires_at = entry.expires_at?;
        let millis = expires_at.saturating_sub(self.clock.now_millis()).max(0);
        Some(Duration::from_millis(millis as u64))
    }
}

impl<V> Expiry<String, LocalEntry<V>> for EntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &LocalEntry<V>,
        _created_at: Instant,
    ) -> Option<Duration> {
        self.remaining(value)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &LocalEntry<V>,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        self.remaining(value)
    }
}

/// Thread-safe key/value store whose entries may carry an absolute expiry.
///
/// Entries without a TTL never expire on their own. Expiry is checked against
/// the store's [`Clock`] on every read, and moka evicts expired entries in the
/// background. When full, the least recently used entry makes room.
pub struct ExpiringLocalStore<V>
where
    V: Clone + Send + Sync + 'static,
{
    cache: MokaCache<String, LocalEntry<V>>,
    clock: Arc<dyn Clock>,
}

impl<V> fmt::Debug for ExpiringLocalStore<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpiringLocalStore")
            .field("entries", &self.cache.entry_count())
            .field("clock", &self.clock)
            .finish()
    }
}

impl<V> Default for ExpiringLocalStore<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<V> ExpiringLocalStore<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::with_config(LocalStoreConfig::default(), Arc::new(SystemClock))
    }

    pub fn with_config(config: LocalStoreConfig, clock: Arc<dyn Clock>) -> Self {
        let cache = MokaCache::builder()
            .max_capacity(config.max_capacity)
            .eviction_policy(EvictionPolicy::lru())
            .expire_after(EntryExpiry {
                clock: clock.clone(),
            })
            .build();

        Self { cache, clock }
    }

    /// Removes `key` only if its entry is expired at the time of the check
    fn evict_if_expired(&self, key: &str) {
        let now = self.clock.now_millis();
        self.cache
            .entry_by_ref(key)
            .and_compute_with(|entry| match entry {
                Some(entry) if entry.value().is_expired(now) => Op::Remove,
                _ => Op::Nop,
            });
    }

    /// Stores a value, replacing any previous entry.
    ///
    /// Returns false when the store could not keep the entry. A zero TTL
    /// removes the key and counts as stored.
    pub fn put(&self, key: &str, value: V, ttl: Option<Duration>) -> bool {
        if ttl.is_some_and(|ttl| ttl.is_zero()) {
            self.remove(key);
            return true;
        }

        let entry = LocalEntry {
            value,
            expires_at: ttl.map(|ttl| deadline_millis(self.clock.now_millis(), ttl)),
        };
        self.cache.insert(key.to_string(), entry);

        // Capacity is enforced during maintenance, not on insert
        self.cache.run_pending_tasks();
        self.cache.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<V> {
        let entry = self.cache.get(key)?;

        if entry.is_expired(self.clock.now_millis()) {
            self.evict_if_expired(key);
            return None;
        }

        Some(entry.value)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn remove(&self, key: &str) {
        self.cache.invalidate(key);
    }

    /// Resets the expiry of a live entry; false when absent or expired
    pub fn touch(&self, key: &str, ttl: Duration) -> bool {
        let now = self.clock.now_millis();
        let expires_at = deadline_millis(now, ttl);

        let result = self
            .cache
            .entry_by_ref(key)
            .and_compute_with(|entry| match entry {
                Some(entry) if !entry.value().is_expired(now) => {
                    let mut refreshed = entry.into_value();
                    refreshed.expires_at = Some(expires_at);
                    Op::Put(refreshed)
                }
                Some(_) => Op::Remove,
                None => Op::Nop,
            });

        matches!(result, CompResult::ReplacedWith(_))
    }

    /// Removes every key matching a glob pattern (`*` wildcard)
    pub fn remove_matching(&self, pattern: &str) -> Result<usize, DomainError> {
        let regex = glob_to_regex(pattern)?;

        let keys: Vec<String> = self
            .cache
            .iter()
            .filter(|(key, _)| regex.is_match(key.as_str()))
            .map(|(key, _)| String::clone(&key))
            .collect();

        for key in &keys {
            self.cache.invalidate(key);
        }

        Ok(keys.len())
    }

    pub fn clear(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks();
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        let now = self.clock.now_millis();
        self.cache
            .iter()
            .filter(|(_, entry)| !entry.is_expired(now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn glob_to_regex(pattern: &str) -> Result<Regex, DomainError> {
    let body = pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");

    Regex::new(&format!("^{}$", body))
        .map_err(|e| DomainError::cache(format!("Invalid pattern '{}': {}", pattern, e)))
}
