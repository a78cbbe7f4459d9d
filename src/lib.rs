//! # album-expander
//!
//! A local HTTP proxy that fetches album and track metadata from a music
//! catalog, flattens it into one record per album and serves it to
//! tag-editing clients.
//!
//! The crate is layered bottom-up:
//!
//! - [`CatalogClient`] / [`CatalogClientImpl`]: upstream calls, token handling
//!   and rate-limit retries
//! - [`AlbumTracksIterator`]: pagination of an album's track listing
//! - [`merge`]: the pure normalization into an [`EnrichedAlbumRecord`]
//! - [`server`]: the axum routes composing the above
//!
//! ## Mocking
//!
//! With the `mock` feature enabled, [`MockCatalogClient`] can stand in for the
//! real client, so code built on the trait can be tested without a network.

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod headers;
pub mod iterator;
pub mod merge;
pub mod params;
pub mod retry;
pub mod server;
pub mod r#trait;
pub mod transport;
pub mod types;

pub use client::CatalogClientImpl;
pub use config::{Args, ClientConfig, Credentials, ExpandSettings};
pub use error::CatalogError;
pub use iterator::{
    collect_album_tracks, AlbumTracksIterator, ArtistAlbumsIterator, AsyncPaginatedIterator,
};
pub use merge::{enrich_album, fill_missing};
pub use params::{FetchOptions, Market};
pub use r#trait::CatalogClient;
pub use retry::RetryConfig;
pub use server::{router, serve, AppState};
pub use types::{
    AlbumGroup, AlbumPage, AlbumRecord, ArtistAlbums, ArtistRecord, ArtistRef, Copyright,
    EnrichedAlbumRecord, ExternalIds, GenreText, Page, TagFields, TrackPage, TrackRecord, UNKNOWN,
};

#[cfg(feature = "mock")]
pub use r#trait::MockCatalogClient;

pub type Result<T> = std::result::Result<T, CatalogError>;
