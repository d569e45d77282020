//! Wiring of the failover cache from configuration

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::cache::CacheBackend;
use crate::domain::clock::{Clock, SystemClock};
use crate::domain::DomainError;

use super::local::{ExpiringLocalStore, LocalStoreConfig};
use super::null::NullBackend;
use super::redis::{RedisBackend, RedisBackendConfig};
use super::service::CacheService;

/// Networked backend placed in front of the local store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    /// No networked backend; every call is served locally
    LocalOnly,
    #[default]
    Redis,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::LocalOnly => "local",
            BackendKind::Redis => "redis",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();

        match normalized.as_str() {
            "local" | "memory" | "none" => Ok(BackendKind::LocalOnly),
            "redis" => Ok(BackendKind::Redis),
            _ => Err(DomainError::configuration(format!(
                "unsupported cache backend '{}', expected one of: local, redis",
                s
            ))),
        }
    }
}

/// Everything needed to build a [`CacheService`]
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub backend: BackendKind,
    pub redis_url: Option<String>,
    /// Prepended to every networked key with a `:` separator, e.g. `proxy`
    pub key_prefix: Option<String>,
    pub connect_timeout: Duration,
    pub command_timeout: Duration,
    pub reconnect_interval: Duration,
    pub local_max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::redis("redis://127.0.0.1:6379")
    }
}

impl CacheConfig {
    pub fn local_only() -> Self {
        Self {
            backend: BackendKind::LocalOnly,
            redis_url: None,
            ..Self::default()
        }
    }

    pub fn redis(url: impl Into<String>) -> Self {
        Self {
            backend: BackendKind::Redis,
            redis_url: Some(url.into()),
            key_prefix: None,
            connect_timeout: Duration::from_secs(10),
            command_timeout: Duration::from_secs(5),
            reconnect_interval: Duration::from_secs(1),
            local_max_capacity: LocalStoreConfig::default().max_capacity,
        }
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    pub fn with_local_max_capacity(mut self, capacity: u64) -> Self {
        self.local_max_capacity = capacity;
        self
    }

    fn redis_backend_config(&self) -> Result<RedisBackendConfig, DomainError> {
        let Some(url) = self.redis_url.as_deref() else {
            return Err(DomainError::configuration(
                "a Redis URL must be configured when the Redis backend is selected",
            ));
        };

        let config = RedisBackendConfig::new(url)
            .with_connect_timeout(self.connect_timeout)
            .with_command_timeout(self.command_timeout)
            .with_reconnect_interval(self.reconnect_interval);

        Ok(match &self.key_prefix {
            Some(prefix) => config.with_key_prefix(prefix.as_str()),
            None => config,
        })
    }
}

/// Builds cache services from [`CacheConfig`]
#[derive(Debug, Default)]
pub struct CacheFactory;

impl CacheFactory {
    pub fn new() -> Self {
        Self
    }

    pub fn create_backend(&self, config: &CacheConfig) -> Result<Arc<dyn CacheBackend>, DomainError> {
        let backend: Arc<dyn CacheBackend> = match config.backend {
            BackendKind::LocalOnly => Arc::new(NullBackend::new()),
            BackendKind::Redis => Arc::new(RedisBackend::new(config.redis_backend_config()?)),
        };

        Ok(backend)
    }

    /// Creates a service that is not yet connected
    pub fn create(&self, config: &CacheConfig) -> Result<Arc<CacheService>, DomainError> {
        self.create_with_clock(config, Arc::new(SystemClock))
    }

    pub fn create_with_clock(
        &self,
        config: &CacheConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Arc<CacheService>, DomainError> {
        let backend = self.create_backend(config)?;
        let local = ExpiringLocalStore::with_config(
            LocalStoreConfig::default().with_max_capacity(config.local_max_capacity),
            clock,
        );

        Ok(Arc::new(CacheService::with_local_store(backend, local)))
    }
}
