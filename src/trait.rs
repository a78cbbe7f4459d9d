use crate::params::FetchOptions;
use crate::{AlbumGroup, AlbumPage, ArtistRecord, Result, TrackPage};
use async_trait::async_trait;
use serde_json::Value;

/// Trait for music catalog operations that can be mocked for testing.
///
/// This trait abstracts every upstream call the proxy makes, so the pagination
/// iterators, the album expansion and the HTTP routes can all be exercised
/// without a network.
///
/// # Mocking Support
///
/// When the `mock` feature is enabled, this crate provides `MockCatalogClient`
/// that implements this trait using the `mockall` library.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Fetch one album, including the first page of its track listing.
    ///
    /// The catalog's JSON is returned untouched.
    async fn get_album(&self, album_id: &str, options: &FetchOptions) -> Result<Value>;

    /// Fetch one page of an album's track listing.
    ///
    /// Items come back in the catalog's canonical order (disc, then track number).
    async fn get_album_tracks_page(
        &self,
        album_id: &str,
        limit: u32,
        offset: u32,
        options: &FetchOptions,
    ) -> Result<TrackPage>;

    /// Fetch one full track object, untouched.
    async fn get_track(&self, track_id: &str, options: &FetchOptions) -> Result<Value>;

    /// Fetch up to 50 full track objects in one call.
    ///
    /// The objects are returned as raw JSON so they can be merged field by field
    /// into simplified tracks. Ids the catalog does not know are skipped.
    async fn get_several_tracks(
        &self,
        track_ids: &[String],
        options: &FetchOptions,
    ) -> Result<Vec<Value>>;

    /// Fetch one artist, including its genre list.
    async fn get_artist(&self, artist_id: &str) -> Result<ArtistRecord>;

    /// Find the best artist match for a free-text name.
    async fn search_artist(&self, name: &str) -> Result<Option<ArtistRecord>>;

    /// Fetch one page of an artist's albums restricted to a single album group.
    async fn get_artist_albums_page(
        &self,
        artist_id: &str,
        group: AlbumGroup,
        limit: u32,
        offset: u32,
    ) -> Result<AlbumPage>;
}
