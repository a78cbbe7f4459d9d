use crate::config::{ClientConfig, Credentials};
use crate::headers::add_token_headers;
use crate::transport::send;
use crate::{CatalogError, Result};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use http_client::{HttpClient, Request};
use http_types::{Method, Url};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Tokens are renewed this long before the catalog says they expire
const EXPIRY_MARGIN_SECS: i64 = 60;

/// A bearer token issued by the accounts service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        now + ChronoDuration::seconds(EXPIRY_MARGIN_SECS) < self.expires_at
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
    expires_in: i64,
}

/// Client-credentials token exchange with an in-memory token cache.
///
/// Concurrent callers share one cached token; when it is about to expire the
/// first caller renews it while the others wait on the lock.
pub struct TokenManager {
    client: Arc<dyn HttpClient + Send + Sync>,
    credentials: Credentials,
    accounts_base_url: String,
    timeout: Duration,
    cached: Mutex<Option<AccessToken>>,
}

impl TokenManager {
    pub fn new(client: Arc<dyn HttpClient + Send + Sync>, config: &ClientConfig) -> Self {
        Self {
            client,
            credentials: config.credentials.clone(),
            accounts_base_url: config.accounts_base_url.clone(),
            timeout: config.timeout,
            cached: Mutex::new(None),
        }
    }

    /// Return a usable access token, exchanging credentials when needed.
    pub async fn bearer(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.is_fresh_at(Utc::now()) {
                return Ok(token.value.clone());
            }
            log::debug!("Access token expires at {}, renewing", token.expires_at);
        }

        let token = self.exchange().await?;
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }

    /// Drop the cached token so the next call performs a fresh exchange.
    pub async fn invalidate(&self) {
        *self.cached.lock().await = None;
    }

    async fn exchange(&self) -> Result<AccessToken> {
        let token_url = format!("{}/api/token", self.accounts_base_url);
        let url = token_url
            .parse::<Url>()
            .map_err(|e| CatalogError::Auth(format!("invalid token URL {token_url}: {e}")))?;

        let form_string = [
            ("grant_type", "client_credentials"),
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
        ]
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");

        let mut request = Request::new(Method::Post, url);
        add_token_headers(&mut request);
        request.set_body(form_string);

        let response = send(self.client.as_ref(), request, self.timeout).await?;
        if !response.is_success() {
            return Err(CatalogError::Auth(format!(
                "token exchange answered {}: {}",
                response.status,
                response.body.trim()
            )));
        }

        let payload: TokenResponse = serde_json::from_str(&response.body)
            .map_err(|e| CatalogError::Auth(format!("unreadable token response: {e}")))?;

        if let Some(kind) = payload.token_type.as_deref() {
            if !kind.eq_ignore_ascii_case("bearer") {
                log::warn!("Unexpected token type '{kind}', using it as a bearer token");
            }
        }

        log::debug!("Obtained access token valid for {}s", payload.expires_in);
        Ok(AccessToken {
            value: payload.access_token,
            expires_at: Utc::now() + ChronoDuration::seconds(payload.expires_in),
        })
    }
}
