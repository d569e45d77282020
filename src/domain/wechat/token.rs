use serde::{Deserialize, Serialize};

/// Lifetime assumed when the upstream omits `expires_in`
pub const DEFAULT_TOKEN_LIFETIME_SECS: u64 = 7200;

/// Remaining lifetime under which a cached token is reported as expiring soon
pub const EARLY_REFRESH_WINDOW_SECS: i64 = 600;

/// Token as returned by the upstream token endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
}

impl TokenGrant {
    pub fn new(access_token: impl Into<String>, expires_in: Option<u64>) -> Self {
        Self {
            access_token: access_token.into(),
            expires_in,
        }
    }
}

/// Cached access token for one appid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    /// Lifetime granted by the upstream, in seconds
    pub expires_in: u64,
    /// Unix timestamp (seconds) at which the upstream stops accepting the token
    pub expires_at: i64,
    pub appid: String,
}

impl AccessToken {
    /// Builds the record for a grant received at `now_secs`
    pub fn issue(appid: impl Into<String>, grant: TokenGrant, now_secs: i64) -> Self {
        let expires_in = grant.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);

        Self {
            access_token: grant.access_token,
            expires_in,
            expires_at: now_secs + expires_in as i64,
            appid: appid.into(),
        }
    }

    pub fn seconds_remaining(&self, now_secs: i64) -> i64 {
        self.expires_at - now_secs
    }

    pub fn expires_soon(&self, now_secs: i64) -> bool {
        self.seconds_remaining(now_secs) < EARLY_REFRESH_WINDOW_SECS
    }
}
