use crate::{CatalogError, Result};
use http_client::{HttpClient, Request};
use std::time::{Duration, Instant};

/// Fallback wait when a 429 carries no usable `Retry-After` header
const DEFAULT_RETRY_AFTER: u64 = 5;

/// A fully read upstream response.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub retry_after: Option<u64>,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Turn a non-success answer into the matching error, keeping the body
    /// so it can be passed back to the caller as-is.
    pub fn error_for_status(self) -> Result<Self> {
        if self.is_success() {
            return Ok(self);
        }
        if self.status == 429 {
            return Err(CatalogError::RateLimit {
                retry_after: self.retry_after.unwrap_or(DEFAULT_RETRY_AFTER),
            });
        }
        Err(CatalogError::Upstream {
            status: self.status,
            body: self.body,
            content_type: self.content_type,
        })
    }

    /// Deserialize the body, reporting malformed JSON as a parse error.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.body).map_err(|e| CatalogError::Parse(e.to_string()))
    }
}

/// Send `request`, bounded by `timeout`, and read the whole body.
pub async fn send(
    client: &(dyn HttpClient + Send + Sync),
    request: Request,
    timeout: Duration,
) -> Result<RawResponse> {
    let description = format!("{} {}", request.method(), request.url().path());
    let request_start = Instant::now();

    let mut response = tokio::time::timeout(timeout, client.send(request))
        .await
        .map_err(|_| CatalogError::Timeout(timeout.as_secs()))?
        .map_err(|e| CatalogError::Http(e.to_string()))?;

    let status: u16 = response.status().into();
    let content_type = response
        .header("Content-Type")
        .map(|values| values.last().as_str().to_string());
    let retry_after = response
        .header("Retry-After")
        .and_then(|values| values.last().as_str().trim().parse::<u64>().ok());

    let body = response
        .body_string()
        .await
        .map_err(|e| CatalogError::Http(e.to_string()))?;

    log::debug!(
        "{description} -> {status} ({} bytes in {}ms)",
        body.len(),
        request_start.elapsed().as_millis()
    );

    Ok(RawResponse {
        status,
        content_type,
        retry_after,
        body,
    })
}
