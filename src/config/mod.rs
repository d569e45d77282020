mod app_config;

pub use app_config::{
    AppConfig, LocalStoreSettings, LogFormat, LoggingConfig, RedisSettings, WeChatSettings,
};
