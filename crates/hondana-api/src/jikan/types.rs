use serde::Deserialize;

use crate::traits::{CatalogEntry, CatalogPage};

// ── List / detail responses ─────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct JikanListResponse {
    #[serde(default)]
    pub data: Vec<JikanManga>,
    pub pagination: Option<JikanPagination>,
}

#[derive(Debug, Deserialize)]
pub struct JikanDetailResponse {
    pub data: JikanManga,
}

#[derive(Debug, Deserialize)]
pub struct JikanPagination {
    pub last_visible_page: Option<u32>,
    #[allow(dead_code)]
    pub has_next_page: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct JikanManga {
    pub mal_id: u64,
    pub title: String,
    pub images: Option<JikanImages>,
    pub score: Option<f32>,
    pub status: Option<String>,
    pub chapters: Option<u32>,
    #[serde(default)]
    pub genres: Vec<JikanNamed>,
    #[serde(default)]
    pub authors: Vec<JikanNamed>,
    pub synopsis: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct JikanImages {
    pub jpg: Option<JikanImageSet>,
}

#[derive(Debug, Deserialize)]
pub struct JikanImageSet {
    pub image_url: Option<String>,
    pub large_image_url: Option<String>,
}

/// A named reference (genre, author) with its MAL id.
#[derive(Debug, Deserialize)]
pub struct JikanNamed {
    #[allow(dead_code)]
    pub mal_id: Option<u64>,
    pub name: String,
}

// ── Conversions to shared trait types ───────────────────────────

impl JikanManga {
    pub fn into_entry(self) -> CatalogEntry {
        let images = self.images.and_then(|i| i.jpg);
        CatalogEntry {
            id: self.mal_id,
            title: self.title,
            cover_url: images.as_ref().and_then(|i| i.image_url.clone()),
            large_cover_url: images.and_then(|i| i.large_image_url),
            score: self.score,
            status: self.status,
            chapters: self.chapters,
            genres: self.genres.into_iter().map(|g| g.name).collect(),
            authors: self.authors.into_iter().map(|a| a.name).collect(),
            synopsis: self.synopsis,
        }
    }
}

impl JikanListResponse {
    pub fn into_page(self) -> CatalogPage {
        let last_page = self
            .pagination
            .and_then(|p| p.last_visible_page)
            .unwrap_or(1)
            .max(1);
        CatalogPage {
            entries: self.data.into_iter().map(JikanManga::into_entry).collect(),
            last_page,
        }
    }
}
