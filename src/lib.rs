//! WeChat API Cache
//!
//! Failover caching core for a WeChat API proxy:
//! - Redis as the shared networked backend, an expiring in-process store as fallback
//! - Health tracking driven by backend connection lifecycle events
//! - Access token fetch-or-refresh, response memoization and material/draft caching

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use tracing::{info, warn};

use domain::{DomainError, SystemClock};
use infrastructure::cache::{CacheFactory, CacheService};
use infrastructure::services::WeChatCacheService;
use infrastructure::wechat::HttpWeChatClient;

/// Wired services shared by the CLI commands
#[derive(Debug, Clone)]
pub struct AppContext {
    pub cache: Arc<CacheService>,
    pub wechat: Arc<WeChatCacheService>,
}

impl AppContext {
    /// Disconnects the networked backend
    pub async fn shutdown(&self) {
        self.cache.disconnect().await;
    }
}

/// Builds and connects the cache stack described by the configuration.
///
/// An unreachable Redis is not an error: the service starts degraded and
/// serves from the local store until the backend reports itself ready.
pub async fn create_app_context(config: &AppConfig) -> Result<AppContext, DomainError> {
    let cache = CacheFactory::new().create(&config.cache_config())?;

    if cache.connect().await {
        info!("Cache backend connected");
    } else if config.uses_redis() {
        warn!("Cache backend unavailable at startup, serving from local store");
    } else {
        info!("Networked cache disabled, serving from local store");
    }

    let client = HttpWeChatClient::with_timeout(
        config.wechat.api_base_url.clone(),
        config.request_timeout(),
    )?;

    let wechat = WeChatCacheService::with_config(
        cache.clone(),
        Arc::new(client),
        config.wechat_cache_config(),
        Arc::new(SystemClock),
    );

    Ok(AppContext {
        cache,
        wechat: Arc::new(wechat),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_context_without_redis() {
        let mut config = AppConfig::default();
        config.redis.enabled = false;

        let context = create_app_context(&config).await.unwrap();

        assert!(context.wechat.cache_material("m1", &json!({"a": 1}), None).await);
        assert_eq!(context.wechat.get_cached_material("m1").await, Some(json!({"a": 1})));

        let stats = context.wechat.get_cache_stats();
        assert!(!stats.available);
        assert_eq!(stats.local_entry_count, 1);

        context.shutdown().await;
    }
}
