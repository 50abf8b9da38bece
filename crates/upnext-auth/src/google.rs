//! Google OAuth2 delegated authorization, installed-application flow.
//!
//! The consent URL is printed for the user to open; the authorization code
//! comes back as a single pasted line on stdin. Token exchange and refresh
//! are plain form POSTs against the token endpoint named by the client
//! secret.

use serde::Deserialize;
use std::io::BufRead;

use crate::credentials::InstalledSecret;
use crate::error::AuthError;
use crate::token::{TokenCache, TokenSet};

pub(crate) const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub(crate) const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Read-only calendar scope.
const CALENDAR_SCOPE: &str = "https://www.googleapis.com/auth/calendar.readonly";

/// Token endpoint response, for both the code and refresh grants.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: u64,
    pub token_type: String,
    #[serde(default)]
    pub scope: String,
}

pub struct GoogleAuthorizer {
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    auth_url: String,
    token_url: String,
    http: reqwest::Client,
}

impl GoogleAuthorizer {
    pub fn new(secret: &InstalledSecret) -> Self {
        Self {
            client_id: secret.client_id.clone(),
            client_secret: secret.client_secret.clone(),
            redirect_uri: secret.redirect_uri().to_string(),
            auth_url: secret.auth_uri.clone(),
            token_url: secret.token_uri.clone(),
            http: reqwest::Client::new(),
        }
    }

    /// Generate the consent URL for offline, read-only calendar access.
    /// Returns (url, state).
    pub fn authorization_url(&self) -> (String, String) {
        let state = uuid::Uuid::new_v4().to_string();

        let url = format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}&access_type=offline&prompt=consent",
            self.auth_url,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(CALENDAR_SCOPE),
            urlencoding::encode(&state),
        );

        (url, state)
    }

    /// Exchange an authorization code for a token set.
    #[tracing::instrument(skip(self, code), level = "info")]
    pub async fn exchange_code(&self, code: &str) -> Result<TokenSet, AuthError> {
        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("code", code),
                ("grant_type", "authorization_code"),
                ("redirect_uri", self.redirect_uri.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AuthError::ExchangeFailed(error_text));
        }

        let token: TokenResponse = response.json().await?;
        Ok(token_set_from(token, None))
    }

    /// Refresh an expired access token. The previous refresh token is kept
    /// when the endpoint omits one from the response.
    #[tracing::instrument(skip(self, refresh_token), level = "info")]
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenSet, AuthError> {
        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AuthError::RefreshFailed(error_text));
        }

        let token: TokenResponse = response.json().await?;
        Ok(token_set_from(token, Some(refresh_token)))
    }

    /// Print the consent URL, block for a pasted authorization code, then
    /// exchange it.
    pub async fn authenticate_interactive(&self) -> Result<TokenSet, AuthError> {
        let (url, _state) = self.authorization_url();
        println!("Go to the following link in your browser then type the authorization code:");
        println!("{url}");

        let code = read_code_line()?;
        self.exchange_code(code.trim()).await
    }
}

/// Resolve a usable token: cached, refreshed, or interactively obtained.
///
/// A cache that is missing or unreadable is treated the same way: the
/// interactive flow runs once and its result is written back before use.
pub async fn obtain_token(
    authorizer: &GoogleAuthorizer,
    cache: &TokenCache,
) -> Result<TokenSet, AuthError> {
    match cache.load() {
        Ok(token) if !token.needs_refresh() => return Ok(token),
        Ok(token) => {
            if let Some(refresh_token) = token.refresh_token.as_deref() {
                match authorizer.refresh(refresh_token).await {
                    Ok(refreshed) => {
                        cache.save(&refreshed)?;
                        return Ok(refreshed);
                    }
                    Err(err) => {
                        tracing::warn!("Token refresh failed, re-authorizing: {}", err);
                    }
                }
            }
        }
        Err(err) => {
            if cache.path().exists() {
                tracing::warn!(
                    "Ignoring unreadable token cache at {}: {}",
                    cache.path().display(),
                    err
                );
            }
        }
    }

    let token = authorizer.authenticate_interactive().await?;
    cache.save(&token)?;
    Ok(token)
}

fn read_code_line() -> Result<String, AuthError> {
    let mut code = String::new();
    std::io::stdin().lock().read_line(&mut code)?;
    Ok(code)
}

fn token_set_from(response: TokenResponse, previous_refresh: Option<&str>) -> TokenSet {
    let expires_at = chrono::Utc::now().timestamp() + response.expires_in as i64;

    TokenSet {
        access_token: response.access_token,
        refresh_token: response
            .refresh_token
            .or_else(|| previous_refresh.map(str::to_string)),
        expires_at,
        scopes: response
            .scope
            .split_whitespace()
            .map(str::to_string)
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_secret(token_uri: &str) -> InstalledSecret {
        InstalledSecret {
            client_id: "test_client_id".to_string(),
            client_secret: "test_client_secret".to_string(),
            auth_uri: GOOGLE_AUTH_URL.to_string(),
            token_uri: token_uri.to_string(),
            redirect_uris: vec![],
        }
    }

    #[test]
    fn auth_url_requests_offline_readonly_access() {
        let authorizer = GoogleAuthorizer::new(&test_secret(GOOGLE_TOKEN_URL));
        let (url, _state) = authorizer.authorization_url();

        assert!(url.starts_with(GOOGLE_AUTH_URL));
        assert!(url.contains("access_type=offline"));
        assert!(url.contains("prompt=consent"));
        assert!(url.contains("calendar.readonly"));
        assert!(url.contains("client_id=test_client_id"));
    }

    #[test]
    fn auth_url_state_is_unique() {
        let authorizer = GoogleAuthorizer::new(&test_secret(GOOGLE_TOKEN_URL));
        let (_, state1) = authorizer.authorization_url();
        let (_, state2) = authorizer.authorization_url();
        assert_ne!(state1, state2);
    }

    #[tokio::test]
    async fn exchange_code_returns_token_set() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code=auth-code"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "at-123",
                "refresh_token": "rt-456",
                "expires_in": 3600,
                "token_type": "Bearer",
                "scope": "https://www.googleapis.com/auth/calendar.readonly"
            })))
            .mount(&server)
            .await;

        let authorizer = GoogleAuthorizer::new(&test_secret(&format!("{}/token", server.uri())));
        let token = authorizer.exchange_code("auth-code").await.unwrap();

        assert_eq!(token.access_token, "at-123");
        assert_eq!(token.refresh_token.as_deref(), Some("rt-456"));
        assert!(token.expires_at > chrono::Utc::now().timestamp());
        assert_eq!(token.scopes.len(), 1);
    }

    #[tokio::test]
    async fn exchange_failure_surfaces_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(400).set_body_string("invalid_grant"))
            .mount(&server)
            .await;

        let authorizer = GoogleAuthorizer::new(&test_secret(&format!("{}/token", server.uri())));
        let result = authorizer.exchange_code("bad-code").await;

        match result {
            Err(AuthError::ExchangeFailed(body)) => assert!(body.contains("invalid_grant")),
            other => panic!("expected ExchangeFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn refresh_keeps_previous_refresh_token() {
        let server = MockServer::start().await;

        // Google omits refresh_token from refresh responses.
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "at-new",
                "expires_in": 3600,
                "token_type": "Bearer",
                "scope": "https://www.googleapis.com/auth/calendar.readonly"
            })))
            .mount(&server)
            .await;

        let authorizer = GoogleAuthorizer::new(&test_secret(&format!("{}/token", server.uri())));
        let token = authorizer.refresh("rt-old").await.unwrap();

        assert_eq!(token.access_token, "at-new");
        assert_eq!(token.refresh_token.as_deref(), Some("rt-old"));
    }

    #[tokio::test]
    async fn obtain_token_uses_fresh_cache_without_network() {
        let dir = tempfile::tempdir().unwrap();
        let cache = TokenCache::at(dir.path().join("token.json"));
        cache
            .save(&TokenSet {
                access_token: "cached".to_string(),
                refresh_token: None,
                expires_at: chrono::Utc::now().timestamp() + 3600,
                scopes: vec![],
            })
            .unwrap();

        // Token endpoint is unreachable; a fresh cache must not need it.
        let authorizer = GoogleAuthorizer::new(&test_secret("http://127.0.0.1:1/token"));
        let token = obtain_token(&authorizer, &cache).await.unwrap();
        assert_eq!(token.access_token, "cached");
    }

    #[tokio::test]
    async fn obtain_token_refreshes_and_saves_expired_cache() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "at-refreshed",
                "expires_in": 3600,
                "token_type": "Bearer",
                "scope": ""
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let cache = TokenCache::at(dir.path().join("token.json"));
        cache
            .save(&TokenSet {
                access_token: "stale".to_string(),
                refresh_token: Some("rt-old".to_string()),
                expires_at: chrono::Utc::now().timestamp() - 10,
                scopes: vec![],
            })
            .unwrap();

        let authorizer = GoogleAuthorizer::new(&test_secret(&format!("{}/token", server.uri())));
        let token = obtain_token(&authorizer, &cache).await.unwrap();

        assert_eq!(token.access_token, "at-refreshed");
        // The refreshed token was written back.
        let reloaded = cache.load().unwrap();
        assert_eq!(reloaded.access_token, "at-refreshed");
        assert_eq!(reloaded.refresh_token.as_deref(), Some("rt-old"));
    }
}
