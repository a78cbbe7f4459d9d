//! Data types for music catalog metadata.
//!
//! This module contains the records exchanged with the upstream catalog (albums,
//! tracks, artists and their paging envelopes) as well as the enriched album shape
//! served to tag-editing clients.
//!
//! Records travel through the proxy as raw JSON. The typed records here are
//! read-only views used to derive tag fields; they accept `null` wherever the
//! catalog may send it and are never serialized back in place of the raw body.

use crate::{CatalogError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Sentinel emitted for derived fields the catalog gave no data for.
pub const UNKNOWN: &str = "Unknown";

/// Deserialize `null` as the type's default value.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn view_of<T: DeserializeOwned>(kind: &str, value: &Value) -> Result<T> {
    serde_json::from_value(value.clone())
        .map_err(|e| CatalogError::Parse(format!("unexpected {kind} shape: {e}")))
}

// ================================================================================================
// CATALOG RECORDS
// ================================================================================================

/// An artist reference as embedded in album and track records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtistRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ArtistRef {
    pub fn named(name: &str) -> Self {
        Self {
            id: None,
            name: name.to_string(),
            extra: Map::new(),
        }
    }
}

/// Copyright statement attached to an album.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Copyright {
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    /// `C` for the composition copyright, `P` for the sound recording
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

/// External identifiers of a track (ISRC, EAN, UPC).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalIds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isrc: Option<String>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// A track as returned by the catalog, either standalone or nested in an album.
///
/// # Examples
///
/// ```rust
/// use album_expander::{ArtistRef, TrackRecord};
///
/// let track = TrackRecord::new("Paranoid Android", vec![ArtistRef::named("Radiohead")])
///     .with_position(1, 2);
///
/// assert_eq!(track.primary_artist(), Some("Radiohead"));
/// assert_eq!(track.disc_number, Some(1));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub artists: Vec<ArtistRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disc_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    /// Only present on full track objects, not on the simplified album listing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_ids: Option<ExternalIds>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub external_urls: BTreeMap<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TrackRecord {
    pub fn new(name: &str, artists: Vec<ArtistRef>) -> Self {
        Self {
            id: None,
            name: name.to_string(),
            artists,
            disc_number: None,
            track_number: None,
            duration_ms: None,
            external_ids: None,
            external_urls: BTreeMap::new(),
            extra: Map::new(),
        }
    }

    /// Typed view of a raw track object.
    pub fn from_value(value: &Value) -> Result<Self> {
        view_of("track", value)
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn with_position(mut self, disc_number: u32, track_number: u32) -> Self {
        self.disc_number = Some(disc_number);
        self.track_number = Some(track_number);
        self
    }

    /// Name of the first-listed artist, if the track credits anyone.
    pub fn primary_artist(&self) -> Option<&str> {
        self.artists.first().map(|artist| artist.name.as_str())
    }

    pub fn isrc(&self) -> Option<&str> {
        self.external_ids.as_ref()?.isrc.as_deref()
    }
}

/// The catalog's paging envelope.
///
/// `next` and `previous` hold absolute URLs to the neighbouring pages, or `None`
/// at the ends of the listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Page<T> {
    #[serde(default, deserialize_with = "null_as_default")]
    pub items: Vec<T>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub limit: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub offset: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl<T> Page<T> {
    /// Whether the catalog signalled that another page follows this one.
    ///
    /// A short page ends the listing even if a `next` link is still present.
    pub fn has_next_page(&self, page_size: u32) -> bool {
        self.next.is_some() && self.items.len() as u32 >= page_size
    }

    /// A single page holding the complete listing, with no neighbours.
    pub fn complete(items: Vec<T>) -> Self {
        let len = items.len() as u32;
        Self {
            items,
            total: len,
            limit: len,
            offset: 0,
            next: None,
            previous: None,
            extra: Map::new(),
        }
    }
}

/// A page of raw track objects from `/albums/{id}/tracks`.
pub type TrackPage = Page<Value>;

/// A page of albums from `/artists/{id}/albums`.
pub type AlbumPage = Page<Value>;

/// Typed view of the catalog's album object.
///
/// # Examples
///
/// ```rust
/// use album_expander::AlbumRecord;
///
/// let raw = serde_json::json!({
///     "id": "4aawyAB9vmqN3uQ7FjRGTy",
///     "name": "Global Warming",
///     "album_type": "album",
///     "release_date": "2012-11-16",
///     "label": null,
///     "genres": null,
///     "popularity": 57
/// });
/// let album = AlbumRecord::from_value(&raw).unwrap();
///
/// assert_eq!(album.release_year(), Some("2012"));
/// assert_eq!(album.label, None);
/// assert!(album.genres.is_empty());
/// assert_eq!(album.extra["popularity"], 57);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlbumRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album_type: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub artists: Vec<ArtistRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date_precision: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub images: Vec<Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub external_urls: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_tracks: Option<u32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub genres: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub copyrights: Vec<Copyright>,
    /// First page of the track listing, as embedded by the album endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracks: Option<TrackPage>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AlbumRecord {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            album_type: None,
            artists: Vec::new(),
            release_date: None,
            release_date_precision: None,
            label: None,
            images: Vec::new(),
            external_urls: BTreeMap::new(),
            total_tracks: None,
            genres: Vec::new(),
            copyrights: Vec::new(),
            tracks: None,
            extra: Map::new(),
        }
    }

    /// Typed view of a raw album object.
    pub fn from_value(value: &Value) -> Result<Self> {
        view_of("album", value)
    }

    /// The four-digit year of the release date, whatever its precision.
    pub fn release_year(&self) -> Option<&str> {
        let date = self.release_date.as_deref()?;
        let year = date.get(..4)?;
        year.chars().all(|c| c.is_ascii_digit()).then_some(year)
    }

    pub fn is_compilation(&self) -> bool {
        self.album_type.as_deref() == Some("compilation")
    }

    pub fn artist_ids(&self) -> Vec<String> {
        self.artists
            .iter()
            .filter_map(|artist| artist.id.clone())
            .collect()
    }
}

/// An artist as returned by `/artists/{id}` or the search endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtistRecord {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub genres: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ================================================================================================
// ENRICHED OUTPUT
// ================================================================================================

/// A genre entry in the `{ "text": .. }` shape tagging templates iterate over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenreText {
    pub text: String,
}

/// Fields derived from an album and its tracks for the tagging template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagFields {
    /// `1` for albums the catalog types as compilations, absent otherwise
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compilation: Option<u8>,
    /// Set when the tracks credit more than one distinct primary artist
    pub complication: bool,
    pub disc_total: u32,
    pub copyright: String,
    pub genre: String,
    pub genres: Vec<GenreText>,
}

/// An album with its complete track listing and the derived tag fields.
///
/// `album` is the catalog's raw album object with `tracks` replaced by the
/// complete listing; it serializes as-is with the derived fields added under
/// `mp3tag`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedAlbumRecord {
    #[serde(flatten)]
    pub album: Map<String, Value>,
    #[serde(rename = "mp3tag")]
    pub tags: TagFields,
}

impl EnrichedAlbumRecord {
    pub fn tracks(&self) -> &[Value] {
        self.album
            .get("tracks")
            .and_then(|tracks| tracks.get("items"))
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

// ================================================================================================
// ARTIST ALBUM LISTING
// ================================================================================================

/// Album groups accepted by the `/artists/{id}/albums` endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlbumGroup {
    Album,
    Single,
    AppearsOn,
    Compilation,
}

impl AlbumGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlbumGroup::Album => "album",
            AlbumGroup::Single => "single",
            AlbumGroup::AppearsOn => "appears_on",
            AlbumGroup::Compilation => "compilation",
        }
    }
}

/// An artist together with every album listed under the requested groups.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtistAlbums {
    pub artist: ArtistRecord,
    pub albums: Vec<Value>,
}
