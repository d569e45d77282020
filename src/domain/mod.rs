//! Domain layer - cache contracts, WeChat entities and errors

pub mod cache;
pub mod clock;
pub mod error;
pub mod wechat;

pub use cache::{CacheBackend, ConnectionEvent};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::DomainError;
pub use wechat::{AccessToken, CacheKind, TokenGrant, TtlPolicy, WeChatClient};
