use crate::auth::TokenManager;
use crate::headers::add_api_headers;
use crate::params::{validate_catalog_id, validate_page_size, FetchOptions, MAX_TRACK_BATCH};
use crate::r#trait::CatalogClient;
use crate::retry::retry_operation;
use crate::transport::{send, RawResponse};
use crate::{AlbumGroup, AlbumPage, ArtistRecord, CatalogError, ClientConfig, Page, Result, TrackPage};
use async_trait::async_trait;
use http_client::{HttpClient, Request};
use http_types::{Method, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

/// Concrete client for the catalog's REST API.
///
/// The client is cheap to clone; clones share the HTTP transport and the
/// access-token cache.
///
/// # Examples
///
/// ```rust,no_run
/// use album_expander::{CatalogClient, CatalogClientImpl, ClientConfig, FetchOptions, Result};
///
/// #[tokio::main]
/// async fn main() -> Result<()> {
///     let http_client = http_client::native::NativeClient::new();
///     let client = CatalogClientImpl::new(
///         Box::new(http_client),
///         ClientConfig::new("client-id", "client-secret"),
///     );
///
///     let album = client
///         .get_album("4aawyAB9vmqN3uQ7FjRGTy", &FetchOptions::default())
///         .await?;
///     println!("{} has {} tracks", album["name"], album["total_tracks"]);
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct CatalogClientImpl {
    client: Arc<dyn HttpClient + Send + Sync>,
    config: ClientConfig,
    tokens: Arc<TokenManager>,
}

impl CatalogClientImpl {
    pub fn new(client: Box<dyn HttpClient + Send + Sync>, config: ClientConfig) -> Self {
        let client: Arc<dyn HttpClient + Send + Sync> = Arc::from(client);
        let tokens = Arc::new(TokenManager::new(client.clone(), &config));
        Self {
            client,
            config,
            tokens,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// GET `/v1{path_and_query}` and deserialize the answer, retrying on rate limits.
    async fn get_json<T: DeserializeOwned>(&self, path_and_query: &str) -> Result<T> {
        let url = format!("{}/v1{}", self.config.api_base_url, path_and_query);
        let response = retry_operation(&self.config.retry, path_and_query, || {
            self.get_authorized(&url)
        })
        .await?
        .result;
        response.json()
    }

    /// One authorized GET. A 401 means the cached token went stale early, so it
    /// is dropped and the request is sent once more with a fresh one.
    async fn get_authorized(&self, url: &str) -> Result<RawResponse> {
        let response = self.get_with_token(url).await?;
        if response.status == 401 {
            log::debug!("Access token rejected, renewing and retrying {url}");
            self.tokens.invalidate().await;
            return self.get_with_token(url).await?.error_for_status();
        }
        response.error_for_status()
    }

    async fn get_with_token(&self, url: &str) -> Result<RawResponse> {
        let parsed = url
            .parse::<Url>()
            .map_err(|e| CatalogError::InvalidInput(format!("invalid upstream URL {url}: {e}")))?;
        let token = self.tokens.bearer().await?;

        let mut request = Request::new(Method::Get, parsed);
        add_api_headers(&mut request, &token);

        send(self.client.as_ref(), request, self.config.timeout).await
    }
}

#[derive(Deserialize)]
struct SeveralTracksResponse {
    tracks: Vec<Option<Value>>,
}

#[derive(Deserialize)]
struct ArtistSearchResponse {
    artists: Page<ArtistRecord>,
}

#[async_trait]
impl CatalogClient for CatalogClientImpl {
    async fn get_album(&self, album_id: &str, options: &FetchOptions) -> Result<Value> {
        validate_catalog_id("album", album_id)?;
        log::debug!("Fetching album {album_id}");
        self.get_json(&format!(
            "/albums/{album_id}{}",
            options.query_string()
        ))
        .await
    }

    async fn get_album_tracks_page(
        &self,
        album_id: &str,
        limit: u32,
        offset: u32,
        options: &FetchOptions,
    ) -> Result<TrackPage> {
        validate_catalog_id("album", album_id)?;
        validate_page_size(limit)?;
        log::debug!("Fetching tracks of album {album_id} at offset {offset}");
        self.get_json(&format!(
            "/albums/{album_id}/tracks?limit={limit}&offset={offset}{}",
            options.query_suffix()
        ))
        .await
    }

    async fn get_track(&self, track_id: &str, options: &FetchOptions) -> Result<Value> {
        validate_catalog_id("track", track_id)?;
        log::debug!("Fetching track {track_id}");
        self.get_json(&format!(
            "/tracks/{track_id}{}",
            options.query_string()
        ))
        .await
    }

    async fn get_several_tracks(
        &self,
        track_ids: &[String],
        options: &FetchOptions,
    ) -> Result<Vec<Value>> {
        if track_ids.is_empty() {
            return Ok(Vec::new());
        }
        if track_ids.len() > MAX_TRACK_BATCH {
            return Err(CatalogError::InvalidInput(format!(
                "at most {MAX_TRACK_BATCH} track ids per batch, got {}",
                track_ids.len()
            )));
        }
        for track_id in track_ids {
            validate_catalog_id("track", track_id)?;
        }

        log::debug!("Fetching {} full track objects", track_ids.len());
        let response: SeveralTracksResponse = self
            .get_json(&format!(
                "/tracks?ids={}{}",
                track_ids.join(","),
                options.query_suffix()
            ))
            .await?;

        Ok(response.tracks.into_iter().flatten().collect())
    }

    async fn get_artist(&self, artist_id: &str) -> Result<ArtistRecord> {
        validate_catalog_id("artist", artist_id)?;
        log::debug!("Fetching artist {artist_id}");
        self.get_json(&format!("/artists/{artist_id}")).await
    }

    async fn search_artist(&self, name: &str) -> Result<Option<ArtistRecord>> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CatalogError::InvalidInput(
                "artist name must not be empty".to_string(),
            ));
        }

        log::debug!("Searching artist '{name}'");
        let response: ArtistSearchResponse = self
            .get_json(&format!(
                "/search?q={}&type=artist&limit=1",
                urlencoding::encode(name)
            ))
            .await?;

        Ok(response.artists.items.into_iter().next())
    }

    async fn get_artist_albums_page(
        &self,
        artist_id: &str,
        group: AlbumGroup,
        limit: u32,
        offset: u32,
    ) -> Result<AlbumPage> {
        validate_catalog_id("artist", artist_id)?;
        validate_page_size(limit)?;
        log::debug!(
            "Fetching {} albums of artist {artist_id} at offset {offset}",
            group.as_str()
        );
        self.get_json(&format!(
            "/artists/{artist_id}/albums?include_groups={}&limit={limit}&offset={offset}",
            group.as_str()
        ))
        .await
    }
}
