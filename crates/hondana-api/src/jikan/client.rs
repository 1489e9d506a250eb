use reqwest::Client;

use super::error::JikanError;
use super::types::{JikanDetailResponse, JikanListResponse};
use crate::traits::{CatalogEntry, CatalogPage, CatalogService};

const BASE_URL: &str = "https://api.jikan.moe/v4";

/// Entries requested per page.
const PAGE_LIMIT: u32 = 20;

/// Jikan (unofficial MyAnimeList) REST client.
pub struct JikanClient {
    base_url: String,
    page_size: u32,
    http: Client,
}

impl JikanClient {
    pub fn new() -> Self {
        Self {
            base_url: BASE_URL.to_string(),
            page_size: PAGE_LIMIT,
            http: Client::new(),
        }
    }

    /// Override the API base URL (tests, self-hosted mirrors).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, JikanError> {
        if resp.status().is_success() {
            Ok(resp)
        } else {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(status, "Jikan API error");
            Err(JikanError::Api {
                status,
                message: body,
            })
        }
    }

    async fn get_page(
        &self,
        url: String,
        query: &[(&str, String)],
    ) -> Result<CatalogPage, JikanError> {
        let resp = self.http.get(url).query(query).send().await?;
        let resp = Self::check_response(resp).await?;
        let body: JikanListResponse = resp
            .json()
            .await
            .map_err(|e| JikanError::Parse(e.to_string()))?;
        Ok(body.into_page())
    }
}

impl Default for JikanClient {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogService for JikanClient {
    type Error = JikanError;

    async fn search(&self, query: &str, page: u32) -> Result<CatalogPage, JikanError> {
        self.get_page(
            format!("{}/manga", self.base_url),
            &[
                ("q", query.to_string()),
                ("page", page.to_string()),
                ("limit", self.page_size.to_string()),
            ],
        )
        .await
    }

    async fn fetch_by_id(&self, id: u64) -> Result<CatalogEntry, JikanError> {
        let resp = self
            .http
            .get(format!("{}/manga/{}", self.base_url, id))
            .send()
            .await?;
        let resp = Self::check_response(resp).await?;
        let body: JikanDetailResponse = resp
            .json()
            .await
            .map_err(|e| JikanError::Parse(e.to_string()))?;
        Ok(body.data.into_entry())
    }

    async fn fetch_by_genre(&self, genre_id: u64, page: u32) -> Result<CatalogPage, JikanError> {
        self.get_page(
            format!("{}/manga", self.base_url),
            &[
                ("genres", genre_id.to_string()),
                ("page", page.to_string()),
                ("limit", self.page_size.to_string()),
            ],
        )
        .await
    }

    async fn fetch_trending(&self, page: u32) -> Result<CatalogPage, JikanError> {
        self.get_page(
            format!("{}/top/manga", self.base_url),
            &[
                ("page", page.to_string()),
                ("limit", self.page_size.to_string()),
            ],
        )
        .await
    }
}
