use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Classes of cached WeChat data, each with its own key namespace and TTL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKind {
    AccessToken,
    Ticket,
    ApiResponse,
    Material,
    Draft,
}

impl CacheKind {
    /// Prefix shared by every WeChat key
    pub const ROOT: &'static str = "wechat";

    pub fn namespace(&self) -> &'static str {
        match self {
            CacheKind::AccessToken => "wechat:access_token",
            CacheKind::Ticket => "wechat:ticket",
            CacheKind::ApiResponse => "wechat:api_response",
            CacheKind::Material => "wechat:material",
            CacheKind::Draft => "wechat:draft",
        }
    }
}

impl fmt::Display for CacheKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.namespace())
    }
}

/// TTL per cache kind, in seconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TtlPolicy {
    /// Shorter than the real 7200s lifetime so tokens are refreshed before WeChat rejects them
    pub access_token: u64,
    pub ticket: u64,
    pub api_response: u64,
    pub material: u64,
    pub draft: u64,
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self {
            access_token: 7000,
            ticket: 7000,
            api_response: 300,
            material: 86_400,
            draft: 3600,
        }
    }
}

impl TtlPolicy {
    pub fn ttl_for(&self, kind: CacheKind) -> Duration {
        let secs = match kind {
            CacheKind::AccessToken => self.access_token,
            CacheKind::Ticket => self.ticket,
            CacheKind::ApiResponse => self.api_response,
            CacheKind::Material => self.material,
            CacheKind::Draft => self.draft,
        };
        Duration::from_secs(secs)
    }
}
