use async_trait::async_trait;

use super::TokenGrant;
use crate::domain::DomainError;

/// Client for the upstream WeChat API.
///
/// Implementations report a well-formed error payload from WeChat as
/// [`DomainError::Upstream`] and network or decoding failures as
/// [`DomainError::UpstreamUnavailable`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WeChatClient: Send + Sync {
    /// Exchanges an appid/secret pair for a fresh access token
    async fn fetch_access_token(&self, appid: &str, secret: &str)
    -> Result<TokenGrant, DomainError>;
}
