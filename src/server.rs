//! HTTP facade served to the tagging client.
//!
//! Every route is a GET. Failures are mapped onto status codes by the
//! [`IntoResponse`] implementation of [`CatalogError`]; upstream errors keep the
//! catalog's status and body.

use crate::iterator::{collect_album_tracks, ArtistAlbumsIterator, AsyncPaginatedIterator};
use crate::merge::{capitalize_genre, enrich_album, hydrate_tracks, track_ids};
use crate::params::{validate_catalog_id, FetchOptions, MarketQuery, MAX_TRACK_BATCH};
use crate::r#trait::CatalogClient;
use crate::{
    AlbumGroup, AlbumRecord, ArtistAlbums, CatalogError, EnrichedAlbumRecord, ExpandSettings,
    Result,
};
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Shared state of the facade: the catalog client and the expansion settings.
#[derive(Clone)]
pub struct AppState {
    pub client: Arc<dyn CatalogClient>,
    pub settings: ExpandSettings,
}

impl AppState {
    pub fn new(client: Arc<dyn CatalogClient>, settings: ExpandSettings) -> Self {
        Self { client, settings }
    }
}

/// Build the router with all routes.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/albums/:id", get(get_album))
        .route("/tracks/:id", get(get_track))
        .route("/expand/album/:id", get(expand_album))
        .route("/mp3tag/album/:id", get(expand_album))
        .route("/artists/:name/albums", get(artist_albums))
        .route("/spmusic/albums/by-artist/:name", get(artist_albums))
        .with_state(state)
}

/// Bind `addr` and serve the facade until the process is stopped.
pub async fn serve(addr: SocketAddr, state: AppState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

// ================================================================================================
// HANDLERS
// ================================================================================================

/// GET /albums/:id
async fn get_album(
    State(state): State<AppState>,
    Path(album_id): Path<String>,
    Query(query): Query<MarketQuery>,
) -> Result<Json<Value>> {
    let options = query.into_options()?;
    let started = Instant::now();
    let album = state.client.get_album(&album_id, &options).await?;
    log::info!(
        "GET /albums/{album_id} served in {}ms",
        started.elapsed().as_millis()
    );
    Ok(Json(album))
}

/// GET /tracks/:id
async fn get_track(
    State(state): State<AppState>,
    Path(track_id): Path<String>,
    Query(query): Query<MarketQuery>,
) -> Result<Json<Value>> {
    let options = query.into_options()?;
    let started = Instant::now();
    let track = state.client.get_track(&track_id, &options).await?;
    log::info!(
        "GET /tracks/{track_id} served in {}ms",
        started.elapsed().as_millis()
    );
    Ok(Json(track))
}

/// GET /expand/album/:id and GET /mp3tag/album/:id
async fn expand_album(
    State(state): State<AppState>,
    Path(album_id): Path<String>,
    Query(query): Query<MarketQuery>,
) -> Result<Json<EnrichedAlbumRecord>> {
    let options = query.into_options()?;
    validate_catalog_id("album", &album_id)?;

    let started = Instant::now();
    let enriched = expand(state.client.as_ref(), &state.settings, &album_id, &options).await?;
    log::info!(
        "Expanded album {album_id} with {} tracks in {}ms",
        enriched.tracks().len(),
        started.elapsed().as_millis()
    );
    Ok(Json(enriched))
}

#[derive(Debug, Deserialize)]
struct ArtistAlbumsQuery {
    #[serde(default)]
    appears: bool,
    #[serde(default = "default_compilation")]
    compilation: bool,
    /// Answer with a CSV attachment instead of JSON
    #[serde(default)]
    down: bool,
}

fn default_compilation() -> bool {
    true
}

impl ArtistAlbumsQuery {
    fn groups(&self) -> Vec<AlbumGroup> {
        let mut groups = vec![AlbumGroup::Album, AlbumGroup::Single];
        if self.appears {
            groups.push(AlbumGroup::AppearsOn);
        }
        if self.compilation {
            groups.push(AlbumGroup::Compilation);
        }
        groups
    }
}

/// GET /artists/:name/albums and GET /spmusic/albums/by-artist/:name
async fn artist_albums(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<ArtistAlbumsQuery>,
) -> Result<Response> {
    let started = Instant::now();
    let listing = list_artist_albums(
        state.client.as_ref(),
        state.settings.page_size,
        &name,
        &query.groups(),
    )
    .await?;
    log::info!(
        "Listed {} albums of '{}' in {}ms",
        listing.albums.len(),
        listing.artist.name,
        started.elapsed().as_millis()
    );

    if !query.down {
        return Ok(Json(listing).into_response());
    }

    let body = albums_csv(&name, &listing.albums)?;
    let disposition = format!("attachment; filename={}_albums.csv", file_stem(&name));
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

const CSV_BOM: &[u8] = b"\xEF\xBB\xBF";

const CSV_COLUMNS: [&str; 7] = [
    "release_date",
    "album_type",
    "albumartist",
    "name",
    "id",
    "total_tracks",
    "external_url",
];

#[derive(Debug, Serialize)]
struct AlbumCsvRow<'a> {
    release_date: Option<&'a str>,
    album_type: Option<&'a str>,
    albumartist: &'a str,
    name: Option<&'a str>,
    id: Option<&'a str>,
    total_tracks: Option<u64>,
    external_url: Option<&'a str>,
}

impl<'a> AlbumCsvRow<'a> {
    fn new(artist: &'a str, album: &'a Value) -> Self {
        let text = |key: &str| album.get(key).and_then(Value::as_str);
        Self {
            release_date: text("release_date"),
            album_type: text("album_type"),
            albumartist: artist,
            name: text("name"),
            id: text("id"),
            total_tracks: album.get("total_tracks").and_then(Value::as_u64),
            external_url: album
                .pointer("/external_urls/spotify")
                .and_then(Value::as_str),
        }
    }
}

/// Render the album listing as UTF-8 CSV with a byte order mark, one row per
/// album, credited to `artist` as requested.
fn albums_csv(artist: &str, albums: &[Value]) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(CSV_BOM.to_vec());
    writer.write_record(CSV_COLUMNS)?;
    for album in albums {
        writer.serialize(AlbumCsvRow::new(artist, album))?;
    }
    writer
        .into_inner()
        .map_err(|e| CatalogError::Io(e.into_error()))
}

/// Attachment file name for an artist, limited to characters safe in a header.
fn file_stem(name: &str) -> String {
    let stem: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() {
        "artist".to_string()
    } else {
        stem
    }
}

// ================================================================================================
// COMPOSITION
// ================================================================================================

/// Fetch an album with every track and build its enriched record.
///
/// ```rust,no_run
/// # use album_expander::{CatalogClientImpl, ClientConfig, ExpandSettings, FetchOptions};
/// # tokio_test::block_on(async {
/// let client = CatalogClientImpl::new(
///     Box::new(http_client::native::NativeClient::new()),
///     ClientConfig::new("client-id", "client-secret"),
/// );
/// let enriched = album_expander::server::expand(
///     &client,
///     &ExpandSettings::default(),
///     "4aawyAB9vmqN3uQ7FjRGTy",
///     &FetchOptions::default(),
/// )
/// .await?;
/// println!("{} / {}", enriched.tags.genre, enriched.tags.copyright);
/// # Ok::<(), album_expander::CatalogError>(())
/// # });
/// ```
pub async fn expand<C: CatalogClient + ?Sized>(
    client: &C,
    settings: &ExpandSettings,
    album_id: &str,
    options: &FetchOptions,
) -> Result<EnrichedAlbumRecord> {
    let album = client.get_album(album_id, options).await?;
    let mut tracks = collect_album_tracks(client, album_id, settings.page_size, options).await?;

    if settings.hydrate_tracks {
        tracks = hydrate(client, tracks, options).await?;
    }

    let artist_genres = if settings.infer_artist_genres {
        infer_artist_genres(client, &AlbumRecord::from_value(&album)?).await?
    } else {
        Vec::new()
    };

    enrich_album(album, tracks, &artist_genres)
}

/// Complete simplified tracks with the full track objects, 50 ids per call.
async fn hydrate<C: CatalogClient + ?Sized>(
    client: &C,
    tracks: Vec<Value>,
    options: &FetchOptions,
) -> Result<Vec<Value>> {
    let ids = track_ids(&tracks);
    let mut detailed: Vec<Value> = Vec::with_capacity(ids.len());
    for batch in ids.chunks(MAX_TRACK_BATCH) {
        detailed.extend(client.get_several_tracks(batch, options).await?);
    }
    log::debug!(
        "Hydrating {} tracks from {} full objects",
        tracks.len(),
        detailed.len()
    );
    Ok(hydrate_tracks(tracks, &detailed))
}

/// Genres of the album's credited artists, in credit order.
async fn infer_artist_genres<C: CatalogClient + ?Sized>(
    client: &C,
    album: &AlbumRecord,
) -> Result<Vec<String>> {
    let mut seen = HashSet::new();
    let mut genres = Vec::new();
    for artist_id in album.artist_ids() {
        if !seen.insert(artist_id.clone()) {
            continue;
        }
        let artist = client.get_artist(&artist_id).await?;
        genres.extend(artist.genres.iter().map(|genre| capitalize_genre(genre)));
    }
    log::debug!("Inferred {} genres for album {}", genres.len(), album.id);
    Ok(genres)
}

/// Find an artist by name and list its albums across `groups`, in group order.
pub async fn list_artist_albums<C: CatalogClient + ?Sized>(
    client: &C,
    page_size: u32,
    name: &str,
    groups: &[AlbumGroup],
) -> Result<ArtistAlbums> {
    let artist = client
        .search_artist(name)
        .await?
        .ok_or_else(|| CatalogError::NotFound(format!("no artist matches '{name}'")))?;

    let mut albums = Vec::new();
    for &group in groups {
        let mut pages = ArtistAlbumsIterator::new(client, &artist.id, group, page_size)?;
        albums.extend(pages.collect_all().await?);
    }

    Ok(ArtistAlbums { artist, albums })
}

// ================================================================================================
// ERROR RESPONSES
// ================================================================================================

impl CatalogError {
    /// Status code reported to the tagging client for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            CatalogError::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            CatalogError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            CatalogError::NotFound(_) => StatusCode::NOT_FOUND,
            CatalogError::RateLimit { .. } => StatusCode::TOO_MANY_REQUESTS,
            CatalogError::Io(_) | CatalogError::Csv(_) => StatusCode::INTERNAL_SERVER_ERROR,
            CatalogError::Http(_)
            | CatalogError::Timeout(_)
            | CatalogError::Auth(_)
            | CatalogError::Parse(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for CatalogError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("Request failed: {self}");
        } else {
            log::info!("Request rejected: {self}");
        }

        match self {
            CatalogError::Upstream {
                body, content_type, ..
            } => {
                let mut response = (status, body).into_response();
                if let Some(value) = content_type.and_then(|ct| HeaderValue::from_str(&ct).ok()) {
                    response.headers_mut().insert(header::CONTENT_TYPE, value);
                }
                response
            }
            CatalogError::RateLimit { retry_after } => {
                let mut response = (status, self.to_string()).into_response();
                response
                    .headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
                response
            }
            other => (status, other.to_string()).into_response(),
        }
    }
}
