//! Process configuration.
//!
//! Everything is read once at start-up by [`Args`] (command line flags with
//! environment fallbacks) and then handed out as immutable values: a
//! [`ClientConfig`] injected into the catalog client and [`ExpandSettings`]
//! for the HTTP facade.

use crate::params::{validate_page_size, MAX_PAGE_SIZE};
use crate::retry::RetryConfig;
use crate::Result;
use clap::Parser;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "https://api.spotify.com";
pub const DEFAULT_ACCOUNTS_BASE_URL: &str = "https://accounts.spotify.com";

/// Application credentials for the catalog's client-credentials grant.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

impl Credentials {
    pub fn new(client_id: &str, client_secret: &str) -> Self {
        Self {
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Settings for the catalog client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub credentials: Credentials,
    /// Base URL of the REST API, without the `/v1` prefix
    pub api_base_url: String,
    /// Base URL of the accounts service issuing access tokens
    pub accounts_base_url: String,
    /// Timeout applied to every single upstream request
    pub timeout: Duration,
    pub retry: RetryConfig,
}

impl ClientConfig {
    /// Create a config with default endpoints, a 30 second timeout and the
    /// default retry policy.
    pub fn new(client_id: &str, client_secret: &str) -> Self {
        Self {
            credentials: Credentials::new(client_id, client_secret),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            accounts_base_url: DEFAULT_ACCOUNTS_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            retry: RetryConfig::default(),
        }
    }

    /// Point both the API and the accounts service at one base URL.
    ///
    /// This is useful for testing against a local stand-in.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        let base_url = base_url.trim_end_matches('/');
        self.api_base_url = base_url.to_string();
        self.accounts_base_url = base_url.to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

/// Behaviour of the album expansion route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandSettings {
    /// Page size used when paging through album tracks (1..=50)
    pub page_size: u32,
    /// Fill simplified album tracks from the full track objects
    pub hydrate_tracks: bool,
    /// Append the album artists' genres after the album's own
    pub infer_artist_genres: bool,
}

impl Default for ExpandSettings {
    fn default() -> Self {
        Self {
            page_size: MAX_PAGE_SIZE,
            hydrate_tracks: true,
            infer_artist_genres: true,
        }
    }
}

/// Command line interface of the proxy.
#[derive(Parser, Debug, Clone)]
#[command(name = "album-expander")]
#[command(about = "Local proxy that expands catalog albums for tag-editing clients")]
pub struct Args {
    /// Catalog application client id
    #[arg(long, env = "CLIENT_ID", hide_env_values = true)]
    pub client_id: String,

    /// Catalog application client secret
    #[arg(long, env = "CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: String,

    /// Address to listen on
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "8000")]
    pub port: u16,

    /// Base URL of the catalog REST API
    #[arg(long, env = "CATALOG_API_URL", default_value = DEFAULT_API_BASE_URL)]
    pub api_url: String,

    /// Base URL of the catalog accounts service
    #[arg(long, env = "CATALOG_ACCOUNTS_URL", default_value = DEFAULT_ACCOUNTS_BASE_URL)]
    pub accounts_url: String,

    /// Tracks requested per page when expanding an album
    #[arg(long, env = "PAGE_SIZE", default_value = "50")]
    pub page_size: u32,

    /// Timeout for each upstream request, in seconds
    #[arg(long, env = "UPSTREAM_TIMEOUT_SECS", default_value = "30")]
    pub timeout_secs: u64,

    /// Retries on upstream rate limiting
    #[arg(long, env = "MAX_RETRIES", default_value = "3")]
    pub max_retries: u32,

    /// Skip filling album tracks from the full track objects
    #[arg(long, env = "NO_HYDRATE")]
    pub no_hydrate: bool,

    /// Skip looking up the album artists' genres
    #[arg(long, env = "NO_INFER_ARTIST_GENRES")]
    pub no_infer_artist_genres: bool,

    /// Show detailed debug information
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            credentials: Credentials::new(&self.client_id, &self.client_secret),
            api_base_url: self.api_url.trim_end_matches('/').to_string(),
            accounts_base_url: self.accounts_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(self.timeout_secs),
            retry: RetryConfig::with_retries(self.max_retries),
        }
    }

    pub fn expand_settings(&self) -> Result<ExpandSettings> {
        validate_page_size(self.page_size)?;
        Ok(ExpandSettings {
            page_size: self.page_size,
            hydrate_tracks: !self.no_hydrate,
            infer_artist_genres: !self.no_infer_artist_genres,
        })
    }
}
