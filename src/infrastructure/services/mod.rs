//! Infrastructure services

mod wechat_cache;

pub use wechat_cache::{CacheStats, ClearTarget, WeChatCacheConfig, WeChatCacheService};
