//! WeChat domain - access tokens, cache namespaces and the upstream client contract

mod client;
mod policy;
mod token;

pub use client::WeChatClient;
pub use policy::{CacheKind, TtlPolicy};
pub use token::{AccessToken, TokenGrant, DEFAULT_TOKEN_LIFETIME_SECS, EARLY_REFRESH_WINDOW_SECS};

#[cfg(test)]
pub use client::MockWeChatClient;
