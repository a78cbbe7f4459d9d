use crate::params::{validate_page_size, FetchOptions};
use crate::r#trait::CatalogClient;
use crate::{AlbumGroup, AlbumPage, Result, TrackPage};

use async_trait::async_trait;
use serde_json::Value;

/// Async iterator trait for paginated catalog listings.
///
/// This trait provides a common interface for walking offset-paginated data from
/// the catalog, such as an album's tracks or an artist's albums. Pages are fetched
/// lazily and strictly one after another, since each offset depends on how many
/// items the previous page carried.
#[async_trait]
pub trait AsyncPaginatedIterator<T: Send> {
    /// Fetch the next item from the iterator.
    ///
    /// This method automatically handles pagination, fetching new pages as needed.
    /// Returns `None` when there are no more items available.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(item))` - Next item in the sequence
    /// - `Ok(None)` - No more items available
    /// - `Err(...)` - Network or parsing error occurred
    async fn next(&mut self) -> Result<Option<T>>;

    /// Collect all remaining items into a Vec.
    ///
    /// This is all-or-nothing: if any page fails, the items gathered so far are
    /// dropped and the error is returned.
    async fn collect_all(&mut self) -> Result<Vec<T>> {
        let mut items = Vec::new();
        while let Some(item) = self.next().await? {
            items.push(item);
        }
        Ok(items)
    }

    /// Take up to n items from the iterator.
    async fn take(&mut self, n: usize) -> Result<Vec<T>> {
        let mut items = Vec::new();
        for _ in 0..n {
            match self.next().await? {
                Some(item) => items.push(item),
                None => break,
            }
        }
        Ok(items)
    }

    /// Number of pages fetched so far.
    fn pages_fetched(&self) -> u32;
}

/// Iterator over every track of an album, yielding the raw track objects.
///
/// The iterator requests `/albums/{id}/tracks` with increasing offsets until a page
/// comes back shorter than the page size or without a `next` link. The declared
/// `total` of the listing is never trusted; only the items actually returned are.
pub struct AlbumTracksIterator<'a, C: CatalogClient + ?Sized> {
    client: &'a C,
    album_id: String,
    page_size: u32,
    options: FetchOptions,
    offset: u32,
    has_more: bool,
    buffer: Vec<Value>,
    pages_fetched: u32,
}

#[async_trait]
impl<C: CatalogClient + ?Sized> AsyncPaginatedIterator<Value> for AlbumTracksIterator<'_, C> {
    async fn next(&mut self) -> Result<Option<Value>> {
        // If buffer is empty, try to load next page
        if self.buffer.is_empty() {
            if let Some(page) = self.next_page().await? {
                self.buffer = page.items;
                self.buffer.reverse(); // Reverse so we can pop from end efficiently
            }
        }

        Ok(self.buffer.pop())
    }

    fn pages_fetched(&self) -> u32 {
        self.pages_fetched
    }
}

impl<'a, C: CatalogClient + ?Sized> AlbumTracksIterator<'a, C> {
    /// Create a new album tracks iterator.
    ///
    /// Fails without touching the network when `page_size` is outside 1..=50.
    pub fn new(
        client: &'a C,
        album_id: &str,
        page_size: u32,
        options: FetchOptions,
    ) -> Result<Self> {
        validate_page_size(page_size)?;
        Ok(Self {
            client,
            album_id: album_id.to_string(),
            page_size,
            options,
            offset: 0,
            has_more: true,
            buffer: Vec::new(),
            pages_fetched: 0,
        })
    }

    /// Fetch the next page of tracks.
    pub async fn next_page(&mut self) -> Result<Option<TrackPage>> {
        if !self.has_more {
            return Ok(None);
        }

        log::debug!(
            "Fetching tracks of album {} from offset {} (page {})",
            self.album_id,
            self.offset,
            self.pages_fetched + 1
        );

        let page = self
            .client
            .get_album_tracks_page(&self.album_id, self.page_size, self.offset, &self.options)
            .await?;

        self.pages_fetched += 1;
        self.has_more = page.has_next_page(self.page_size);
        self.offset += page.items.len() as u32;

        if page.items.is_empty() {
            self.has_more = false;
        }

        Ok(Some(page))
    }
}

/// Aggregate the complete, ordered track listing of an album.
pub async fn collect_album_tracks<C: CatalogClient + ?Sized>(
    client: &C,
    album_id: &str,
    page_size: u32,
    options: &FetchOptions,
) -> Result<Vec<Value>> {
    let mut iterator = AlbumTracksIterator::new(client, album_id, page_size, options.clone())?;
    let tracks = iterator.collect_all().await?;

    log::debug!(
        "Album {album_id} has {} tracks across {} pages",
        tracks.len(),
        iterator.pages_fetched()
    );
    Ok(tracks)
}

/// Iterator over an artist's albums in one album group.
///
/// Album objects are kept as raw JSON; the listing is passed through to callers
/// without reshaping.
pub struct ArtistAlbumsIterator<'a, C: CatalogClient + ?Sized> {
    client: &'a C,
    artist_id: String,
    group: AlbumGroup,
    page_size: u32,
    offset: u32,
    has_more: bool,
    buffer: Vec<Value>,
    pages_fetched: u32,
}

#[async_trait]
impl<C: CatalogClient + ?Sized> AsyncPaginatedIterator<Value> for ArtistAlbumsIterator<'_, C> {
    async fn next(&mut self) -> Result<Option<Value>> {
        if self.buffer.is_empty() {
            if let Some(page) = self.next_page().await? {
                self.buffer = page.items;
                self.buffer.reverse();
            }
        }

        Ok(self.buffer.pop())
    }

    fn pages_fetched(&self) -> u32 {
        self.pages_fetched
    }
}

impl<'a, C: CatalogClient + ?Sized> ArtistAlbumsIterator<'a, C> {
    pub fn new(client: &'a C, artist_id: &str, group: AlbumGroup, page_size: u32) -> Result<Self> {
        validate_page_size(page_size)?;
        Ok(Self {
            client,
            artist_id: artist_id.to_string(),
            group,
            page_size,
            offset: 0,
            has_more: true,
            buffer: Vec::new(),
            pages_fetched: 0,
        })
    }

    /// Fetch the next page of albums.
    ///
    /// Each iterator walks exactly one group and stops at the first short page.
    pub async fn next_page(&mut self) -> Result<Option<AlbumPage>> {
        if !self.has_more {
            return Ok(None);
        }

        let page = self
            .client
            .get_artist_albums_page(&self.artist_id, self.group, self.page_size, self.offset)
            .await?;

        self.pages_fetched += 1;
        self.has_more = page.items.len() as u32 >= self.page_size;
        self.offset += page.items.len() as u32;

        Ok(Some(page))
    }
}
