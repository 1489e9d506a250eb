//! Trait definition for remote manga catalogs.
//!
//! Catalog clients implement this trait, allowing the search session
//! and any embedding UI to be source-agnostic.

use std::future::Future;

/// A remote, paginated manga catalog.
pub trait CatalogService: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Search the catalog by free text.
    fn search(
        &self,
        query: &str,
        page: u32,
    ) -> impl Future<Output = Result<CatalogPage, Self::Error>> + Send;

    /// Fetch the full record for a single entry.
    fn fetch_by_id(
        &self,
        id: u64,
    ) -> impl Future<Output = Result<CatalogEntry, Self::Error>> + Send;

    /// Browse the catalog by genre.
    fn fetch_by_genre(
        &self,
        genre_id: u64,
        page: u32,
    ) -> impl Future<Output = Result<CatalogPage, Self::Error>> + Send;

    /// Browse the currently trending entries.
    fn fetch_trending(
        &self,
        page: u32,
    ) -> impl Future<Output = Result<CatalogPage, Self::Error>> + Send;
}

/// One catalog entry as returned by the remote source.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CatalogEntry {
    pub id: u64,
    pub title: String,
    pub cover_url: Option<String>,
    pub large_cover_url: Option<String>,
    pub score: Option<f32>,
    pub status: Option<String>,
    pub chapters: Option<u32>,
    pub genres: Vec<String>,
    pub authors: Vec<String>,
    pub synopsis: Option<String>,
}

/// One page of catalog results plus pagination metadata.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CatalogPage {
    pub entries: Vec<CatalogEntry>,
    pub last_page: u32,
}
