//! Cache infrastructure - backends, local store and the failover service

mod factory;
mod health;
mod local;
mod null;
mod redis;
mod service;

pub use factory::{BackendKind, CacheConfig, CacheFactory};
pub use health::BackendHealth;
pub use local::{ExpiringLocalStore, LocalStoreConfig};
pub use null::NullBackend;
pub use redis::{RedisBackend, RedisBackendConfig};
pub use service::{CacheService, CacheStatus};
