//! Backend used when no networked cache is configured

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::domain::cache::{CacheBackend, ConnectionEvent};
use crate::domain::DomainError;

/// Backend that never opens, leaving every operation to the local store
#[derive(Debug)]
pub struct NullBackend {
    events: broadcast::Sender<ConnectionEvent>,
}

impl Default for NullBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl NullBackend {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(1);
        Self { events }
    }

    fn disabled() -> DomainError {
        DomainError::cache("networked cache backend is disabled")
    }
}

#[async_trait]
impl CacheBackend for NullBackend {
    async fn connect(&self) -> Result<(), DomainError> {
        Err(Self::disabled())
    }

    async fn disconnect(&self) -> Result<(), DomainError> {
        Ok(())
    }

    fn is_open(&self) -> bool {
        false
    }

    fn subscribe(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.events.subscribe()
    }

    async fn get_raw(&self, _key: &str) -> Result<Option<String>, DomainError> {
        Err(Self::disabled())
    }

    async fn set_raw(
        &self,
        _key: &str,
        _value: &str,
        _ttl: Option<Duration>,
    ) -> Result<(), DomainError> {
        Err(Self::disabled())
    }

    async fn delete(&self, _key: &str) -> Result<bool, DomainError> {
        Err(Self::disabled())
    }

    async fn delete_pattern(&self, _pattern: &str) -> Result<usize, DomainError> {
        Err(Self::disabled())
    }

    async fn expire(&self, _key: &str, _ttl: Duration) -> Result<bool, DomainError> {
        Err(Self::disabled())
    }

    async fn clear(&self) -> Result<(), DomainError> {
        Err(Self::disabled())
    }

    fn backend_name(&self) -> &'static str {
        "none"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_null_backend_never_opens() {
        let backend = NullBackend::new();

        assert!(backend.connect().await.is_err());
        assert!(!backend.is_open());
        assert!(backend.get_raw("key").await.is_err());
    }
}
