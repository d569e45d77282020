use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::{DomainError, TokenGrant, WeChatClient};

pub const DEFAULT_WECHAT_BASE_URL: &str = "https://api.weixin.qq.com";

/// WeChat API client using reqwest
#[derive(Debug, Clone)]
pub struct HttpWeChatClient {
    client: reqwest::Client,
    base_url: String,
}

impl Default for HttpWeChatClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpWeChatClient {
    pub fn new() -> Self {
        Self::with_client(reqwest::Client::new(), DEFAULT_WECHAT_BASE_URL)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self::with_client(client, base_url))
    }

    fn token_url(&self) -> String {
        format!("{}/cgi-bin/token", self.base_url)
    }
}

/// Splits a token endpoint body into a grant or the upstream error payload
fn parse_token_response(body: Value) -> Result<TokenGrant, DomainError> {
    if let Some(token) = body.get("access_token").and_then(Value::as_str) {
        let expires_in = body.get("expires_in").and_then(Value::as_u64);
        return Ok(TokenGrant::new(token, expires_in));
    }

    let errcode = body.get("errcode").and_then(Value::as_i64).unwrap_or(-1);
    let errmsg = body
        .get("errmsg")
        .and_then(Value::as_str)
        .unwrap_or("failed to obtain access_token")
        .to_string();

    Err(DomainError::upstream(errcode, errmsg, body))
}

#[async_trait]
impl WeChatClient for HttpWeChatClient {
    async fn fetch_access_token(
        &self,
        appid: &str,
        secret: &str,
    ) -> Result<TokenGrant, DomainError> {
        let response = self
            .client
            .get(self.token_url())
            .query(&[
                ("grant_type", "client_credential"),
                ("appid", appid),
                ("secret", secret),
            ])
            .send()
            .await
            .map_err(|e| DomainError::upstream_unavailable(format!("Request failed: {}", e)))?;

        let status = response.status();
        let body: Value = response.json().await.map_err(|e| {
            DomainError::upstream_unavailable(format!(
                "Failed to parse response (HTTP {}): {}",
                status, e
            ))
        })?;

        parse_token_response(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_parse_success() {
        let grant = parse_token_response(json!({"access_token": "abc", "expires_in": 7200})).unwrap();
        assert_eq!(grant, TokenGrant::new("abc", Some(7200)));
    }

    #[test]
    fn test_parse_success_without_lifetime() {
        let grant = parse_token_response(json!({"access_token": "abc"})).unwrap();
        assert_eq!(grant.expires_in, None);
    }

    #[test]
    fn test_parse_error_payload() {
        let body = json!({"errcode": 40125, "errmsg": "invalid appsecret"});

        match parse_token_response(body.clone()) {
            Err(DomainError::Upstream {
                errcode,
                errmsg,
                payload,
            }) => {
                assert_eq!(errcode, 40125);
                assert_eq!(errmsg, "invalid appsecret");
                assert_eq!(payload, body);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_parse_error_without_message() {
        let err = parse_token_response(json!({})).unwrap_err();
        assert_eq!(err.to_string(), "Upstream error -1: failed to obtain access_token");
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = HttpWeChatClient::with_client(reqwest::Client::new(), "http://localhost:8080/");
        assert_eq!(client.token_url(), "http://localhost:8080/cgi-bin/token");
    }

    #[tokio::test]
    async fn test_fetch_access_token() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/cgi-bin/token"))
            .and(query_param("grant_type", "client_credential"))
            .and(query_param("appid", "wx1"))
            .and(query_param("secret", "s3cret"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"access_token": "abc", "expires_in": 7200})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpWeChatClient::with_timeout(server.uri(), Duration::from_secs(5)).unwrap();
        let grant = client.fetch_access_token("wx1", "s3cret").await.unwrap();

        assert_eq!(grant, TokenGrant::new("abc", Some(7200)));
    }

    #[tokio::test]
    async fn test_fetch_access_token_application_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/cgi-bin/token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"errcode": 40013, "errmsg": "invalid appid"})),
            )
            .mount(&server)
            .await;

        let client = HttpWeChatClient::with_client(reqwest::Client::new(), server.uri());
        let err = client.fetch_access_token("bad", "s3cret").await.unwrap_err();

        assert!(err.is_upstream_application_error());
    }

    #[tokio::test]
    async fn test_fetch_access_token_non_json_body() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/cgi-bin/token"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .mount(&server)
            .await;

        let client = HttpWeChatClient::with_client(reqwest::Client::new(), server.uri());
        let err = client.fetch_access_token("wx1", "s3cret").await.unwrap_err();

        assert!(matches!(err, DomainError::UpstreamUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_fetch_access_token_unreachable() {
        let client = HttpWeChatClient::with_timeout("http://127.0.0.1:1", Duration::from_secs(2)).unwrap();
        let err = client.fetch_access_token("wx1", "s3cret").await.unwrap_err();

        assert!(matches!(err, DomainError::UpstreamUnavailable { .. }));
    }
}
