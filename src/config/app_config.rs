use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::domain::wechat::TtlPolicy;
use crate::infrastructure::cache::{BackendKind, CacheConfig};
use crate::infrastructure::services::WeChatCacheConfig;
use crate::infrastructure::wechat::DEFAULT_WECHAT_BASE_URL;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub redis: RedisSettings,
    pub local_store: LocalStoreSettings,
    pub wechat: WeChatSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Networked backend settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RedisSettings {
    /// When false the service runs on the local store only
    pub enabled: bool,
    pub url: String,
    pub key_prefix: Option<String>,
    pub connect_timeout_secs: u64,
    pub command_timeout_secs: u64,
    pub reconnect_interval_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LocalStoreSettings {
    pub max_capacity: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WeChatSettings {
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub single_flight: bool,
    pub ttl: TtlPolicy,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for RedisSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            url: "redis://127.0.0.1:6379".to_string(),
            key_prefix: None,
            connect_timeout_secs: 10,
            command_timeout_secs: 5,
            reconnect_interval_ms: 1000,
        }
    }
}

impl Default for LocalStoreSettings {
    fn default() -> Self {
        Self {
            max_capacity: 10_000,
        }
    }
}

impl Default for WeChatSettings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_WECHAT_BASE_URL.to_string(),
            request_timeout_secs: 10,
            single_flight: false,
            ttl: TtlPolicy::default(),
        }
    }
}

impl AppConfig {
    /// Loads `config/default`, `config/local` and `APP__*` variables, later sources winning
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from_dir(Path::new("config"))
    }

    /// Like [`AppConfig::load`], reading the optional files from `dir`
    pub fn load_from_dir(dir: &Path) -> Result<Self, config::ConfigError> {
        let file = |name: &str| {
            let path = dir.join(name);
            config::File::with_name(&path.to_string_lossy()).required(false)
        };

        let config = config::Config::builder()
            .add_source(file("default"))
            .add_source(file("local"))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    pub fn cache_config(&self) -> CacheConfig {
        let redis = &self.redis;
        let base = if redis.enabled {
            CacheConfig::redis(redis.url.clone())
        } else {
            CacheConfig::local_only()
        };

        CacheConfig {
            key_prefix: redis.key_prefix.clone().filter(|p| !p.is_empty()),
            connect_timeout: Duration::from_secs(redis.connect_timeout_secs),
            command_timeout: Duration::from_secs(redis.command_timeout_secs),
            reconnect_interval: Duration::from_millis(redis.reconnect_interval_ms),
            local_max_capacity: self.local_store.max_capacity,
            ..base
        }
    }

    pub fn wechat_cache_config(&self) -> WeChatCacheConfig {
        WeChatCacheConfig::default()
            .with_ttl(self.wechat.ttl.clone())
            .with_single_flight(self.wechat.single_flight)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.wechat.request_timeout_secs)
    }

    pub fn uses_redis(&self) -> bool {
        self.cache_config().backend == BackendKind::Redis
    }
}
