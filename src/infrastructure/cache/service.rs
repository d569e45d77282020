//! Failover cache facade over a networked backend and the local store

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::health::BackendHealth;
use super::local::ExpiringLocalStore;
use crate::domain::cache::{value, CacheBackend, ConnectionEvent};
use crate::domain::DomainError;

/// Snapshot of the cache state for administrative calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStatus {
    pub available: bool,
    pub local_entry_count: usize,
}

/// Cache that prefers the networked backend and falls back to the local store.
///
/// Routing reads the health flag and the backend's open state before every
/// call. A failed backend call is retried against the local store within the
/// same call and never surfaces as an error; health only changes through
/// connection lifecycle events.
pub struct CacheService {
    backend: Arc<dyn CacheBackend>,
    local: ExpiringLocalStore<Value>,
    health: Arc<BackendHealth>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for CacheService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheService")
            .field("backend", &self.backend)
            .field("local", &self.local)
            .field("health", &self.health)
            .finish()
    }
}

impl CacheService {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self::with_local_store(backend, ExpiringLocalStore::new())
    }

    pub fn with_local_store(
        backend: Arc<dyn CacheBackend>,
        local: ExpiringLocalStore<Value>,
    ) -> Self {
        Self {
            backend,
            local,
            health: Arc::new(BackendHealth::new(false)),
            listener: Mutex::new(None),
        }
    }

    fn use_backend(&self) -> bool {
        self.health.is_available() && self.backend.is_open()
    }

    pub fn is_available(&self) -> bool {
        self.health.is_available()
    }

    /// Feeds a lifecycle event into the health flag
    pub fn on_connection_event(&self, event: &ConnectionEvent) {
        self.health.apply(event);
    }

    fn start_listener(&self) {
        let mut listener = self.listener.lock().unwrap_or_else(PoisonError::into_inner);
        if listener.is_some() {
            return;
        }

        let mut events = self.backend.subscribe();
        let health = self.health.clone();

        *listener = Some(tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        health.apply(&event);
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Missed cache backend lifecycle events");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }));
    }

    fn stop_listener(&self) {
        let handle = self
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(handle) = handle {
            handle.abort();
        }
    }

    /// Opens the backend connection; on failure the service keeps running on the local store
    pub async fn connect(&self) -> bool {
        self.start_listener();

        match self.backend.connect().await {
            Ok(()) => {
                self.on_connection_event(&ConnectionEvent::Ready);
                info!(backend = self.backend.backend_name(), "Cache backend connected");
                true
            }
            Err(e) => {
                self.on_connection_event(&ConnectionEvent::Error(e.to_string()));
                warn!(
                    backend = self.backend.backend_name(),
                    error = %e,
                    "Cache backend connection failed, running in degraded mode on the local store"
                );
                false
            }
        }
    }

    pub async fn disconnect(&self) {
        self.stop_listener();

        if let Err(e) = self.backend.disconnect().await {
            error!(backend = self.backend.backend_name(), error = %e, "Failed to close cache backend connection");
        }

        self.on_connection_event(&ConnectionEvent::Closed);
    }

    async fn write_backend(
        &self,
        key: &str,
        value: &Value,
        ttl: Option<Duration>,
    ) -> Result<(), DomainError> {
        let encoded = value::encode(value)?;
        self.backend.set_raw(key, &encoded, ttl).await?;

        // A copy left over from a degraded period would resurface on the next fallback
        self.local.remove(key);
        Ok(())
    }

    /// Stores a value; false only when no backend accepted it
    pub async fn set(&self, key: &str, value: &Value, ttl: Option<Duration>) -> bool {
        if self.use_backend() {
            match self.write_backend(key, value, ttl).await {
                Ok(()) => {
                    debug!(key, backend = self.backend.backend_name(), "Cache set");
                    return true;
                }
                Err(e) => {
                    warn!(key, error = %e, "Cache backend write failed, falling back to local store");
                }
            }
        }

        if !self.local.put(key, value.clone(), ttl) {
            error!(key, "Local store rejected cache write");
            return false;
        }

        debug!(key, "Cache set in local store");
        true
    }

    pub async fn get(&self, key: &str) -> Option<Value> {
        if self.use_backend() {
            match self.backend.get_raw(key).await {
                Ok(Some(raw)) => {
                    debug!(key, backend = self.backend.backend_name(), "Cache hit");
                    return Some(value::decode(raw));
                }
                Ok(None) => {
                    debug!(key, backend = self.backend.backend_name(), "Cache miss");
                    return None;
                }
                Err(e) => {
                    warn!(key, error = %e, "Cache backend read failed, falling back to local store");
                }
            }
        }

        let found = self.local.get(key);
        if found.is_some() {
            debug!(key, "Cache hit in local store");
        } else {
            debug!(key, "Cache miss in local store");
        }
        found
    }

    /// Deletes from both backends; false when the networked delete failed
    pub async fn del(&self, key: &str) -> bool {
        let mut deleted = true;

        if self.backend.is_open() {
            if let Err(e) = self.backend.delete(key).await {
                error!(key, error = %e, "Failed to delete key from cache backend");
                deleted = false;
            }
        }

        self.local.remove(key);
        debug!(key, "Cache entry deleted");
        deleted
    }

    pub async fn exists(&self, key: &str) -> bool {
        if self.use_backend() {
            match self.backend.exists(key).await {
                Ok(exists) => return exists,
                Err(e) => {
                    warn!(key, error = %e, "Cache backend exists check failed, falling back to local store");
                }
            }
        }

        self.local.contains(key)
    }

    /// Refreshes the TTL of an existing key in the active backend
    pub async fn expire(&self, key: &str, ttl: Duration) -> bool {
        if self.use_backend() {
            match self.backend.expire(key, ttl).await {
                Ok(updated) => return updated,
                Err(e) => {
                    warn!(key, error = %e, "Cache backend expire failed, falling back to local store");
                }
            }
        }

        self.local.touch(key, ttl)
    }

    /// Clears both backends regardless of health; false if any side failed
    pub async fn flush(&self) -> bool {
        let mut flushed = true;

        if self.backend.is_open() {
            match self.backend.clear().await {
                Ok(()) => info!(backend = self.backend.backend_name(), "Cache backend flushed"),
                Err(e) => {
                    error!(backend = self.backend.backend_name(), error = %e, "Failed to flush cache backend");
                    flushed = false;
                }
            }
        }

        self.local.clear();
        info!("Local cache store flushed");
        flushed
    }

    /// Removes every key matching a glob pattern from both backends
    pub async fn delete_pattern(&self, pattern: &str) -> bool {
        let mut deleted = true;

        if self.backend.is_open() {
            match self.backend.delete_pattern(pattern).await {
                Ok(count) => debug!(pattern, count, "Deleted keys from cache backend"),
                Err(e) => {
                    error!(pattern, error = %e, "Failed to delete keys from cache backend");
                    deleted = false;
                }
            }
        }

        match self.local.remove_matching(pattern) {
            Ok(count) => debug!(pattern, count, "Deleted keys from local store"),
            Err(e) => {
                error!(pattern, error = %e, "Failed to delete keys from local store");
                deleted = false;
            }
        }

        deleted
    }

    /// Serializes a typed value and stores it
    pub async fn set_typed<T>(&self, key: &str, value: &T, ttl: Option<Duration>) -> bool
    where
        T: Serialize + ?Sized,
    {
        match serde_json::to_value(value) {
            Ok(value) => self.set(key, &value, ttl).await,
            Err(e) => {
                error!(key, error = %e, "Failed to serialize cache value");
                false
            }
        }
    }

    /// Reads a typed value; a value of another shape is reported as a miss
    pub async fn get_typed<T>(&self, key: &str) -> Option<T>
    where
        T: DeserializeOwned,
    {
        let value = self.get(key).await?;

        match serde_json::from_value(value) {
            Ok(typed) => Some(typed),
            Err(e) => {
                warn!(key, error = %e, "Cached value has an unexpected shape, ignoring it");
                None
            }
        }
    }

    pub fn status(&self) -> CacheStatus {
        CacheStatus {
            available: self.health.is_available(),
            local_entry_count: self.local.len(),
        }
    }
}

impl Drop for CacheService {
    fn drop(&mut self) {
        self.stop_listener();
    }
}
