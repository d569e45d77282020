//! WeChat upstream API client

mod http_client;

pub use http_client::{HttpWeChatClient, DEFAULT_WECHAT_BASE_URL};
