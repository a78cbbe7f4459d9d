use thiserror::Error;

/// Error types for catalog operations.
///
/// This enum covers everything that can go wrong between an incoming request and
/// the upstream music catalog: transport failures, credential exchange failures,
/// malformed payloads, non-success upstream statuses and local input validation.
///
/// # Error Handling Examples
///
/// ```rust,no_run
/// use album_expander::{CatalogClient, CatalogClientImpl, CatalogError, ClientConfig, FetchOptions};
///
/// #[tokio::main]
/// async fn main() {
///     let config = ClientConfig::new("client-id", "client-secret");
///     let client = CatalogClientImpl::new(
///         Box::new(http_client::native::NativeClient::new()),
///         config,
///     );
///
///     match client.get_album("4aawyAB9vmqN3uQ7FjRGTy", &FetchOptions::default()).await {
///         Ok(album) => println!("Fetched {}", album["name"]),
///         Err(CatalogError::Upstream { status, .. }) => eprintln!("Catalog answered {status}"),
///         Err(CatalogError::RateLimit { retry_after }) => {
///             eprintln!("Rate limited, retry in {retry_after} seconds");
///         }
///         Err(e) => eprintln!("Other error: {e}"),
///     }
/// }
/// ```
#[derive(Error, Debug)]
pub enum CatalogError {
    /// HTTP/network related errors.
    ///
    /// Connection failures, DNS errors and other transport problems where the
    /// catalog could not be reached at all.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The upstream call did not finish within the configured timeout.
    #[error("Upstream request timed out after {0} seconds")]
    Timeout(u64),

    /// The client-credentials exchange failed.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Failed to parse the catalog's response body.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// The catalog answered with a non-success status.
    ///
    /// The body and content type are kept so the facade can hand them back to
    /// the caller unmodified.
    #[error("Upstream responded with status {status}")]
    Upstream {
        status: u16,
        body: String,
        content_type: Option<String>,
    },

    /// Rate limiting from the catalog.
    ///
    /// The `retry_after` field is taken from the `Retry-After` header when present.
    #[error("Rate limited, retry after {retry_after} seconds")]
    RateLimit {
        /// Number of seconds to wait before retrying
        retry_after: u64,
    },

    /// Request parameters were rejected before any upstream call.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A lookup that the catalog answered successfully found nothing.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Writing a CSV export failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// File system or socket I/O errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CatalogError {
    /// True for upstream 404 answers and local lookups that found nothing.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CatalogError::NotFound(_) | CatalogError::Upstream { status: 404, .. }
        )
    }
}
