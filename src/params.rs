use crate::{CatalogError, Result};
use regex::Regex;
use serde::Deserialize;
use std::fmt;
use std::sync::OnceLock;

/// Largest page the catalog serves for track and album listings.
pub const MAX_PAGE_SIZE: u32 = 50;

/// Largest id batch accepted by the several-tracks endpoint.
pub const MAX_TRACK_BATCH: usize = 50;

fn catalog_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[0-9A-Za-z]{1,64}$").expect("catalog id pattern"))
}

fn market_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z]{2}$").expect("market pattern"))
}

/// Check that `id` looks like a catalog identifier (base62) before it is put
/// into an upstream URL.
pub fn validate_catalog_id(kind: &str, id: &str) -> Result<()> {
    if catalog_id_pattern().is_match(id) {
        Ok(())
    } else {
        Err(CatalogError::InvalidInput(format!(
            "'{id}' is not a valid {kind} id"
        )))
    }
}

pub fn validate_page_size(page_size: u32) -> Result<()> {
    if (1..=MAX_PAGE_SIZE).contains(&page_size) {
        Ok(())
    } else {
        Err(CatalogError::InvalidInput(format!(
            "page size must be between 1 and {MAX_PAGE_SIZE}, got {page_size}"
        )))
    }
}

/// An ISO 3166-1 alpha-2 country code, normalized to upper case.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Market(String);

impl Market {
    pub fn parse(code: &str) -> Result<Self> {
        if market_pattern().is_match(code) {
            Ok(Self(code.to_ascii_uppercase()))
        } else {
            Err(CatalogError::InvalidInput(format!(
                "market must be a two-letter country code, got '{code}'"
            )))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-request options forwarded to every catalog call of that request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchOptions {
    pub market: Option<Market>,
}

impl FetchOptions {
    pub fn with_market(market: Market) -> Self {
        Self {
            market: Some(market),
        }
    }

    /// Query string (`?market=XX`) for an upstream URL without other parameters.
    pub fn query_string(&self) -> String {
        match &self.market {
            Some(market) => format!("?market={market}"),
            None => String::new(),
        }
    }

    /// Query string fragment (`&market=XX`) to append to an upstream URL.
    pub fn query_suffix(&self) -> String {
        match &self.market {
            Some(market) => format!("&market={market}"),
            None => String::new(),
        }
    }
}

/// Query parameters accepted by the album and track routes.
#[derive(Debug, Default, Deserialize)]
pub struct MarketQuery {
    pub market: Option<String>,
}

impl MarketQuery {
    pub fn into_options(self) -> Result<FetchOptions> {
        match self.market.as_deref() {
            Some(code) => Ok(FetchOptions::with_market(Market::parse(code)?)),
            None => Ok(FetchOptions::default()),
        }
    }
}
