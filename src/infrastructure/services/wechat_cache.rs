//! WeChat-aware caching on top of the failover cache.
//!
//! Keeps access tokens, jsapi tickets, memoized API responses, materials and
//! drafts under fixed `wechat:` namespaces, each with its own TTL.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::domain::cache::key::{namespaced, request_digest};
use crate::domain::clock::{Clock, SystemClock};
use crate::domain::wechat::{AccessToken, CacheKind, TtlPolicy, WeChatClient};
use crate::domain::DomainError;
use crate::infrastructure::cache::CacheService;

/// Configuration for the WeChat cache
#[derive(Debug, Clone, Default)]
pub struct WeChatCacheConfig {
    pub ttl: TtlPolicy,
    /// Serialize concurrent cold token refreshes per appid
    pub single_flight: bool,
}

impl WeChatCacheConfig {
    pub fn with_ttl(mut self, ttl: TtlPolicy) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_single_flight(mut self, enabled: bool) -> Self {
        self.single_flight = enabled;
        self
    }
}

/// Snapshot reported by [`WeChatCacheService::get_cache_stats`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub available: bool,
    pub local_entry_count: usize,
    pub ttl_policy: TtlPolicy,
}

/// What an administrative clear removes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClearTarget {
    AccessToken { appid: String },
    Material { media_id: String },
    Draft { media_id: String },
    /// Every `wechat:` key
    WeChat,
    /// Everything in both stores
    All,
}

impl ClearTarget {
    /// Builds a target from its textual type and the identifiers it needs
    pub fn parse(
        kind: &str,
        appid: Option<&str>,
        media_id: Option<&str>,
    ) -> Result<Self, DomainError> {
        let required = |value: Option<&str>, name: &str| {
            value
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .ok_or_else(|| DomainError::validation(format!("{} is required to clear {}", name, kind)))
        };

        match kind.to_lowercase().as_str() {
            "token" | "access_token" => Ok(Self::AccessToken {
                appid: required(appid, "appid")?,
            }),
            "material" => Ok(Self::Material {
                media_id: required(media_id, "media_id")?,
            }),
            "draft" => Ok(Self::Draft {
                media_id: required(media_id, "media_id")?,
            }),
            "wechat" => Ok(Self::WeChat),
            "all" => Ok(Self::All),
            other => Err(DomainError::validation(format!(
                "Unknown clear type: {}. Valid types: token, material, draft, wechat, all",
                other
            ))),
        }
    }
}

/// Domain cache for WeChat API data
pub struct WeChatCacheService {
    cache: Arc<CacheService>,
    client: Arc<dyn WeChatClient>,
    clock: Arc<dyn Clock>,
    config: WeChatCacheConfig,
    refresh_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl std::fmt::Debug for WeChatCacheService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeChatCacheService")
            .field("cache", &self.cache)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl WeChatCacheService {
    pub fn new(cache: Arc<CacheService>, client: Arc<dyn WeChatClient>) -> Self {
        Self::with_config(cache, client, WeChatCacheConfig::default(), Arc::new(SystemClock))
    }

    pub fn with_config(
        cache: Arc<CacheService>,
        client: Arc<dyn WeChatClient>,
        config: WeChatCacheConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            cache,
            client,
            clock,
            config,
            refresh_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl_policy(&self) -> &TtlPolicy {
        &self.config.ttl
    }

    /// A zero override falls back to the policy TTL
    fn ttl(&self, kind: CacheKind, ttl_override: Option<Duration>) -> Duration {
        ttl_override
            .filter(|ttl| !ttl.is_zero())
            .unwrap_or_else(|| self.config.ttl.ttl_for(kind))
    }

    fn key(kind: CacheKind, id: &str) -> String {
        namespaced(kind.namespace(), id)
    }

    // Access tokens

    /// Returns a valid access token, fetching one from WeChat on a cache miss
    pub async fn get_or_refresh_access_token(
        &self,
        appid: &str,
        secret: &str,
    ) -> Result<AccessToken, DomainError> {
        if appid.is_empty() || secret.is_empty() {
            return Err(DomainError::validation("appid and secret are required"));
        }

        if let Some(token) = self.get_access_token(appid).await {
            return Ok(token);
        }

        if !self.config.single_flight {
            return self.fetch_access_token(appid, secret).await;
        }

        let lock = self.refresh_lock(appid).await;
        let result = {
            let _guard = lock.lock().await;

            // A concurrent caller may have stored a token while we waited
            match self.get_access_token(appid).await {
                Some(token) => Ok(token),
                None => self.fetch_access_token(appid, secret).await,
            }
        };

        drop(lock);
        self.release_refresh_lock(appid).await;
        result
    }

    async fn refresh_lock(&self, appid: &str) -> Arc<Mutex<()>> {
        let mut locks = self.refresh_locks.lock().await;
        locks.entry(appid.to_string()).or_default().clone()
    }

    /// Drops the appid's lock once no caller holds a handle to it
    async fn release_refresh_lock(&self, appid: &str) {
        let mut locks = self.refresh_locks.lock().await;
        if locks.get(appid).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            locks.remove(appid);
        }
    }

    async fn fetch_access_token(
        &self,
        appid: &str,
        secret: &str,
    ) -> Result<AccessToken, DomainError> {
        info!(appid = %appid, "Fetching access token from WeChat");

        let grant = match self.client.fetch_access_token(appid, secret).await {
            Ok(grant) => grant,
            Err(e) => {
                match &e {
                    DomainError::Upstream { errcode, errmsg, .. } => {
                        error!(appid = %appid, errcode = *errcode, errmsg = %errmsg, "WeChat rejected access token request");
                    }
                    _ => {
                        error!(appid = %appid, error = %e, "Access token request failed");
                    }
                }
                return Err(e);
            }
        };

        let token = AccessToken::issue(appid, grant, self.clock.now_secs());
        if !self.set_access_token(appid, &token, None).await {
            warn!(appid = %appid, "Fetched access token could not be cached");
        }

        info!(appid = %appid, expires_in = token.expires_in, "Access token cached");
        Ok(token)
    }

    /// Returns the cached token, warning when it is close to expiry
    pub async fn get_access_token(&self, appid: &str) -> Option<AccessToken> {
        let token: AccessToken = self
            .cache
            .get_typed(&Self::key(CacheKind::AccessToken, appid))
            .await?;

        let now = self.clock.now_secs();
        if token.expires_soon(now) {
            warn!(
                appid = %appid,
                seconds_remaining = token.seconds_remaining(now),
                "Cached access token expires soon"
            );
        } else {
            debug!(appid = %appid, "Access token served from cache");
        }

        Some(token)
    }

    pub async fn set_access_token(
        &self,
        appid: &str,
        token: &AccessToken,
        ttl: Option<Duration>,
    ) -> bool {
        self.cache
            .set_typed(
                &Self::key(CacheKind::AccessToken, appid),
                token,
                Some(self.ttl(CacheKind::AccessToken, ttl)),
            )
            .await
    }

    pub async fn delete_access_token(&self, appid: &str) -> bool {
        self.cache.del(&Self::key(CacheKind::AccessToken, appid)).await
    }

    // Tickets

    pub async fn cache_ticket(&self, appid: &str, ticket: &Value, ttl: Option<Duration>) -> bool {
        self.cache
            .set(
                &Self::key(CacheKind::Ticket, appid),
                ticket,
                Some(self.ttl(CacheKind::Ticket, ttl)),
            )
            .await
    }

    pub async fn get_cached_ticket(&self, appid: &str) -> Option<Value> {
        self.cache.get(&Self::key(CacheKind::Ticket, appid)).await
    }

    pub async fn delete_ticket(&self, appid: &str) -> bool {
        self.cache.del(&Self::key(CacheKind::Ticket, appid)).await
    }

    // API responses

    /// Memoizes a response under the digest of `path` and `params`
    pub async fn cache_api_response(
        &self,
        path: &str,
        params: Option<&Value>,
        response: &Value,
        ttl: Option<Duration>,
    ) -> bool {
        let key = Self::key(CacheKind::ApiResponse, &request_digest(path, params));
        debug!(path = %path, key = %key, "Caching API response");

        self.cache
            .set(&key, response, Some(self.ttl(CacheKind::ApiResponse, ttl)))
            .await
    }

    pub async fn get_cached_api_response(&self, path: &str, params: Option<&Value>) -> Option<Value> {
        let key = Self::key(CacheKind::ApiResponse, &request_digest(path, params));
        self.cache.get(&key).await
    }

    // Materials

    pub async fn cache_material(
        &self,
        media_id: &str,
        material: &Value,
        ttl: Option<Duration>,
    ) -> bool {
        self.cache
            .set(
                &Self::key(CacheKind::Material, media_id),
                material,
                Some(self.ttl(CacheKind::Material, ttl)),
            )
            .await
    }

    pub async fn get_cached_material(&self, media_id: &str) -> Option<Value> {
        self.cache.get(&Self::key(CacheKind::Material, media_id)).await
    }

    pub async fn delete_material_cache(&self, media_id: &str) -> bool {
        self.cache.del(&Self::key(CacheKind::Material, media_id)).await
    }

    // Drafts

    pub async fn cache_draft(&self, media_id: &str, draft: &Value, ttl: Option<Duration>) -> bool {
        self.cache
            .set(
                &Self::key(CacheKind::Draft, media_id),
                draft,
                Some(self.ttl(CacheKind::Draft, ttl)),
            )
            .await
    }

    pub async fn get_cached_draft(&self, media_id: &str) -> Option<Value> {
        self.cache.get(&Self::key(CacheKind::Draft, media_id)).await
    }

    pub async fn delete_draft_cache(&self, media_id: &str) -> bool {
        self.cache.del(&Self::key(CacheKind::Draft, media_id)).await
    }

    // Administration

    /// Removes every `wechat:` key from both stores
    pub async fn clear_all_wechat(&self) -> bool {
        let pattern = format!("{}:*", CacheKind::ROOT);
        let cleared = self.cache.delete_pattern(&pattern).await;
        info!(cleared, "Cleared WeChat cache entries");
        cleared
    }

    pub async fn clear(&self, target: ClearTarget) -> Result<bool, DomainError> {
        let cleared = match &target {
            ClearTarget::AccessToken { appid } => self.delete_access_token(appid).await,
            ClearTarget::Material { media_id } => self.delete_material_cache(media_id).await,
            ClearTarget::Draft { media_id } => self.delete_draft_cache(media_id).await,
            ClearTarget::WeChat => self.clear_all_wechat().await,
            ClearTarget::All => self.cache.flush().await,
        };

        info!(clear_target = ?target, cleared, "Cache clear requested");
        Ok(cleared)
    }

    pub fn get_cache_stats(&self) -> CacheStats {
        let status = self.cache.status();

        CacheStats {
            available: status.available,
            local_entry_count: status.local_entry_count,
            ttl_policy: self.config.ttl.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use serde_json::json;

    use crate::domain::cache::MockBackend;
    use crate::domain::clock::ManualClock;
    use crate::domain::wechat::{MockWeChatClient, TokenGrant};
    use crate::infrastructure::cache::{ExpiringLocalStore, LocalStoreConfig};

    /// Client that counts fetches and yields before answering
    #[derive(Default)]
    struct CountingClient {
        calls: AtomicUsize,
    }

    impl CountingClient {
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl WeChatClient for CountingClient {
        async fn fetch_access_token(
            &self,
            _appid: &str,
            _secret: &str,
        ) -> Result<TokenGrant, DomainError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(TokenGrant::new(format!("token-{}", n), Some(7200)))
        }
    }

    struct Fixture {
        cache: Arc<CacheService>,
        backend: Arc<MockBackend>,
        clock: Arc<ManualClock>,
    }

    async fn fixture() -> Fixture {
        let clock = Arc::new(ManualClock::fixed());
        let backend = Arc::new(MockBackend::with_clock(clock.clone()));
        let local = ExpiringLocalStore::with_config(LocalStoreConfig::default(), clock.clone());
        let cache = Arc::new(CacheService::with_local_store(backend.clone(), local));
        assert!(cache.connect().await);

        Fixture {
            cache,
            backend,
            clock,
        }
    }

    fn service(fixture: &Fixture, client: Arc<dyn WeChatClient>, single_flight: bool) -> WeChatCacheService {
        WeChatCacheService::with_config(
            fixture.cache.clone(),
            client,
            WeChatCacheConfig::default().with_single_flight(single_flight),
            fixture.clock.clone(),
        )
    }

    fn client_returning(grant: TokenGrant, times: usize) -> Arc<MockWeChatClient> {
        let mut client = MockWeChatClient::new();
        client
            .expect_fetch_access_token()
            .times(times)
            .returning(move |_, _| Ok(grant.clone()));
        Arc::new(client)
    }

    #[tokio::test]
    async fn test_cold_cache_fetches_once() {
        let f = fixture().await;
        let client = client_returning(TokenGrant::new("T1", Some(7200)), 1);
        let service = service(&f, client, false);

        let first = service.get_or_refresh_access_token("wx1", "s").await.unwrap();
        let second = service.get_or_refresh_access_token("wx1", "s").await.unwrap();

        assert_eq!(first.access_token, "T1");
        assert_eq!(first.expires_in, 7200);
        assert_eq!(first.expires_at, f.clock.now_secs() + 7200);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_stored_record_shape() {
        let f = fixture().await;
        let client = client_returning(TokenGrant::new("T1", None), 1);
        let service = service(&f, client, false);

        service.get_or_refresh_access_token("wx1", "s").await.unwrap();

        let stored = f.cache.get("wechat:access_token:wx1").await.unwrap();
        assert_eq!(
            stored,
            json!({
                "access_token": "T1",
                "expires_in": 7200,
                "expires_at": f.clock.now_secs() + 7200,
                "appid": "wx1",
            })
        );
        assert!(f.backend.raw_entry("wechat:access_token:wx1").is_some());
    }

    #[tokio::test]
    async fn test_refetch_after_cache_ttl() {
        let f = fixture().await;
        let client = client_returning(TokenGrant::new("T1", Some(7200)), 2);
        let service = service(&f, client, false);

        service.get_or_refresh_access_token("wx1", "s").await.unwrap();
        f.clock.advance(Duration::from_secs(7001));

        let token = service.get_or_refresh_access_token("wx1", "s").await.unwrap();
        assert_eq!(token.expires_at, f.clock.now_secs() + 7200);
    }

    #[tokio::test]
    async fn test_expiring_token_is_still_served() {
        let f = fixture().await;
        let client = client_returning(TokenGrant::new("T1", Some(7200)), 1);
        let service = service(&f, client, false);

        let issued = service.get_or_refresh_access_token("wx1", "s").await.unwrap();
        f.clock.advance(Duration::from_secs(6700));

        let cached = service.get_or_refresh_access_token("wx1", "s").await.unwrap();
        assert!(cached.expires_soon(f.clock.now_secs()));
        assert_eq!(cached, issued);
    }

    #[tokio::test]
    async fn test_upstream_error_propagates_unmodified() {
        let f = fixture().await;
        let payload = json!({"errcode": 40013, "errmsg": "invalid appid"});
        let expected = payload.clone();

        let mut client = MockWeChatClient::new();
        client
            .expect_fetch_access_token()
            .times(1)
            .returning(move |_, _| Err(DomainError::upstream(40013, "invalid appid", payload.clone())));
        let service = service(&f, Arc::new(client), false);

        match service.get_or_refresh_access_token("bad", "s").await {
            Err(DomainError::Upstream { errcode, payload, .. }) => {
                assert_eq!(errcode, 40013);
                assert_eq!(payload, expected);
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(service.get_access_token("bad").await.is_none());
    }

    #[tokio::test]
    async fn test_transport_error_propagates() {
        let f = fixture().await;
        let mut client = MockWeChatClient::new();
        client
            .expect_fetch_access_token()
            .returning(|_, _| Err(DomainError::upstream_unavailable("connection refused")));
        let service = service(&f, Arc::new(client), false);

        let err = service.get_or_refresh_access_token("wx1", "s").await.unwrap_err();
        assert!(matches!(err, DomainError::UpstreamUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_missing_credentials_rejected() {
        let f = fixture().await;
        let service = service(&f, client_returning(TokenGrant::new("T1", None), 0), false);

        let err = service.get_or_refresh_access_token("", "s").await.unwrap_err();
        assert!(matches!(err, DomainError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_token_survives_backend_outage() {
        let f = fixture().await;
        let client = client_returning(TokenGrant::new("T1", Some(7200)), 1);
        let service = service(&f, client, false);
        f.backend.set_failing(true);

        let first = service.get_or_refresh_access_token("wx1", "s").await.unwrap();
        let second = service.get_or_refresh_access_token("wx1", "s").await.unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_concurrent_cold_calls_without_single_flight() {
        let f = fixture().await;
        let client = Arc::new(CountingClient::default());
        let service = service(&f, client.clone(), false);

        let results = futures::future::join_all(
            (0..2).map(|_| service.get_or_refresh_access_token("wx1", "s")),
        )
        .await;

        assert!(results.iter().all(Result::is_ok));
        assert!((1..=2).contains(&client.calls()));

        let fetched = client.calls();
        service.get_or_refresh_access_token("wx1", "s").await.unwrap();
        assert_eq!(client.calls(), fetched);
    }

    #[tokio::test]
    async fn test_single_flight_fetches_once() {
        let f = fixture().await;
        let client = Arc::new(CountingClient::default());
        let service = service(&f, client.clone(), true);

        let results = futures::future::join_all(
            (0..5).map(|_| service.get_or_refresh_access_token("wx1", "s")),
        )
        .await;

        assert_eq!(client.calls(), 1);
        for result in results {
            assert_eq!(result.unwrap().access_token, "token-1");
        }
    }

    #[tokio::test]
    async fn test_single_flight_releases_appid_locks() {
        let f = fixture().await;
        let client = Arc::new(CountingClient::default());
        let service = service(&f, client.clone(), true);

        let calls = ["wx1", "wx2", "wx1", "wx3"]
            .into_iter()
            .map(|appid| service.get_or_refresh_access_token(appid, "s"));
        let results = futures::future::join_all(calls).await;

        assert!(results.iter().all(Result::is_ok));
        assert_eq!(client.calls(), 3);
        assert!(service.refresh_locks.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_zero_ttl_override_uses_policy() {
        let f = fixture().await;
        let service = service(&f, client_returning(TokenGrant::new("T", None), 0), false);

        assert!(service.cache_material("m1", &json!("m"), Some(Duration::ZERO)).await);
        f.clock.advance(Duration::from_secs(3600));

        assert_eq!(service.get_cached_material("m1").await, Some(json!("m")));
    }

    #[tokio::test]
    async fn test_memoized_responses_by_params() {
        let f = fixture().await;
        let service = service(&f, client_returning(TokenGrant::new("T", None), 0), false);
        let m1 = json!({"item": [1, 2]});
        let m2 = json!({"item": [3]});

        assert!(service
            .cache_api_response("/cgi-bin/material/batchget", Some(&json!({"type": "news", "offset": 0})), &m1, None)
            .await);
        assert!(service
            .cache_api_response("/cgi-bin/material/batchget", Some(&json!({"type": "news", "offset": 20})), &m2, None)
            .await);

        assert_eq!(
            service
                .get_cached_api_response("/cgi-bin/material/batchget", Some(&json!({"offset": 0, "type": "news"})))
                .await,
            Some(m1)
        );
        assert_eq!(
            service
                .get_cached_api_response("/cgi-bin/material/batchget", Some(&json!({"type": "news", "offset": 20})))
                .await,
            Some(m2)
        );
        assert_eq!(
            service
                .get_cached_api_response("/cgi-bin/material/batchget", Some(&json!({"type": "news", "offset": 40})))
                .await,
            None
        );
    }

    #[tokio::test]
    async fn test_memoized_response_ttl() {
        let f = fixture().await;
        let service = service(&f, client_returning(TokenGrant::new("T", None), 0), false);
        let body = json!({"ok": true});

        service.cache_api_response("/a", None, &body, None).await;
        service
            .cache_api_response("/b", None, &body, Some(Duration::from_secs(1000)))
            .await;

        assert_eq!(service.get_cached_api_response("/a", Some(&json!({}))).await, Some(body.clone()));

        f.clock.advance(Duration::from_secs(301));
        assert_eq!(service.get_cached_api_response("/a", None).await, None);
        assert_eq!(service.get_cached_api_response("/b", None).await, Some(body));
    }

    #[tokio::test]
    async fn test_material_and_draft_ttls() {
        let f = fixture().await;
        let service = service(&f, client_returning(TokenGrant::new("T", None), 0), false);

        service.cache_material("m1", &json!({"title": "cover"}), None).await;
        service.cache_draft("d1", &json!({"title": "draft"}), None).await;

        f.clock.advance(Duration::from_secs(3601));
        assert_eq!(service.get_cached_draft("d1").await, None);
        assert_eq!(service.get_cached_material("m1").await, Some(json!({"title": "cover"})));

        assert!(service.delete_material_cache("m1").await);
        assert_eq!(service.get_cached_material("m1").await, None);
    }

    #[tokio::test]
    async fn test_ticket_round_trip() {
        let f = fixture().await;
        let service = service(&f, client_returning(TokenGrant::new("T", None), 0), false);
        let ticket = json!({"ticket": "jsapi-1", "expires_in": 7200});

        service.cache_ticket("wx1", &ticket, None).await;
        assert_eq!(service.get_cached_ticket("wx1").await, Some(ticket));

        service.delete_ticket("wx1").await;
        assert_eq!(service.get_cached_ticket("wx1").await, None);
    }

    #[tokio::test]
    async fn test_clear_all_wechat_keeps_other_keys() {
        let f = fixture().await;
        let service = service(&f, client_returning(TokenGrant::new("T1", None), 1), false);

        service.get_or_refresh_access_token("wx1", "s").await.unwrap();
        service.cache_draft("d1", &json!("draft"), None).await;
        f.cache.set("session:1", &json!("keep"), None).await;

        assert!(service.clear_all_wechat().await);
        assert_eq!(service.get_cached_draft("d1").await, None);
        assert!(service.get_access_token("wx1").await.is_none());
        assert_eq!(f.cache.get("session:1").await, Some(json!("keep")));
    }

    #[tokio::test]
    async fn test_clear_targets() {
        let f = fixture().await;
        let service = service(&f, client_returning(TokenGrant::new("T1", None), 1), false);

        service.get_or_refresh_access_token("wx1", "s").await.unwrap();
        service.cache_material("m1", &json!("m"), None).await;
        f.cache.set("other", &json!(1), None).await;

        let target = ClearTarget::parse("token", Some("wx1"), None).unwrap();
        assert!(service.clear(target).await.unwrap());
        assert!(service.get_access_token("wx1").await.is_none());

        assert!(service.clear(ClearTarget::All).await.unwrap());
        assert_eq!(service.get_cached_material("m1").await, None);
        assert_eq!(f.cache.get("other").await, None);
    }

    #[test]
    fn test_clear_target_parse() {
        assert_eq!(
            ClearTarget::parse("draft", None, Some("d1")).unwrap(),
            ClearTarget::Draft {
                media_id: "d1".to_string()
            }
        );
        assert_eq!(ClearTarget::parse("WECHAT", None, None).unwrap(), ClearTarget::WeChat);
        assert!(ClearTarget::parse("token", None, None).is_err());
        assert!(ClearTarget::parse("material", None, Some("")).is_err());
        assert!(ClearTarget::parse("sessions", None, None).is_err());
    }

    #[tokio::test]
    async fn test_cache_stats() {
        let f = fixture().await;
        let service = service(&f, client_returning(TokenGrant::new("T", None), 0), false);
        service.cache_material("m1", &json!("m"), None).await;

        let stats = service.get_cache_stats();
        assert!(stats.available);
        assert_eq!(stats.ttl_policy, TtlPolicy::default());
        assert_eq!(
            serde_json::to_value(&stats).unwrap()["ttl_policy"]["api_response"],
            json!(300)
        );
    }
}
