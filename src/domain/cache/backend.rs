//! Networked cache backend contract

use std::fmt::{self, Debug};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::domain::DomainError;

/// Connection lifecycle notifications published by a backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// Socket established
    Connected,
    /// Backend answers commands
    Ready,
    /// Backend is trying to re-establish a lost connection
    Reconnecting,
    /// Connection-level failure
    Error(String),
    /// Connection closed
    Closed,
}

impl ConnectionEvent {
    /// Health value this event implies, `None` for informational events
    pub fn availability(&self) -> Option<bool> {
        match self {
            ConnectionEvent::Connected | ConnectionEvent::Ready => Some(true),
            ConnectionEvent::Error(_) | ConnectionEvent::Closed => Some(false),
            ConnectionEvent::Reconnecting => None,
        }
    }
}

impl fmt::Display for ConnectionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionEvent::Connected => write!(f, "connected"),
            ConnectionEvent::Ready => write!(f, "ready"),
            ConnectionEvent::Reconnecting => write!(f, "reconnecting"),
            ConnectionEvent::Error(message) => write!(f, "error: {}", message),
            ConnectionEvent::Closed => write!(f, "closed"),
        }
    }
}

/// Key-value backend reached over the network.
///
/// Values are opaque strings; encoding is the caller's concern. Every call
/// made while the connection is not open must fail fast with a cache error
/// instead of waiting for a connection.
///
/// Backends publish lifecycle events through [`CacheBackend::subscribe`] for
/// transitions they observe on their own (a dropped connection, a successful
/// reconnect). Transitions caused by explicit `connect`/`disconnect` calls are
/// reported through the return value instead.
#[async_trait]
pub trait CacheBackend: Send + Sync + Debug {
    /// Opens the connection
    async fn connect(&self) -> Result<(), DomainError>;

    /// Closes the connection
    async fn disconnect(&self) -> Result<(), DomainError>;

    /// Whether a connection is currently held
    fn is_open(&self) -> bool;

    /// Subscribes to lifecycle events
    fn subscribe(&self) -> broadcast::Receiver<ConnectionEvent>;

    /// Gets a raw value
    async fn get_raw(&self, key: &str) -> Result<Option<String>, DomainError>;

    /// Sets a raw value, with an expiry when `ttl` is given
    async fn set_raw(
        &self,
        key: &str,
        value: &str,
        ttl: Option<Duration>,
    ) -> Result<(), DomainError>;

    /// Deletes a key, returning whether it existed
    async fn delete(&self, key: &str) -> Result<bool, DomainError>;

    /// Deletes every key matching a glob pattern (`*` wildcard)
    async fn delete_pattern(&self, pattern: &str) -> Result<usize, DomainError>;

    /// Checks if a key exists
    async fn exists(&self, key: &str) -> Result<bool, DomainError> {
        Ok(self.get_raw(key).await?.is_some())
    }

    /// Updates the TTL of an existing key
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, DomainError>;

    /// Clears the backend namespace
    async fn clear(&self) -> Result<(), DomainError>;

    /// Backend name for logging
    fn backend_name(&self) -> &'static str;
}
