//! Headless runtime for the hondana catalog browser.
//!
//! Owns the loaded configuration, the persisted saved list, and the
//! search session; an embedding shell (GUI, TUI, Tauri command layer)
//! calls these async methods and renders the returned snapshots.

pub mod search;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use hondana_api::jikan::JikanClient;
use hondana_api::traits::CatalogEntry;
use hondana_core::config::AppConfig;
use hondana_core::library::SavedList;
use hondana_core::models::{ReadingStatus, SavedManga};
use hondana_core::storage::SqliteStore;

pub use search::{CatalogFilter, SearchSession, SearchState};

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("config error: {0}")]
    Config(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("API error: {0}")]
    Api(String),
}

pub struct Runtime {
    config: AppConfig,
    library: RwLock<SavedList<SqliteStore>>,
    search: SearchSession<JikanClient>,
}

impl Runtime {
    /// Load config, open the data directory, and wire up the engine.
    pub fn new() -> Result<Self, RuntimeError> {
        let config = AppConfig::load().map_err(|e| RuntimeError::Config(e.to_string()))?;
        let db_path =
            AppConfig::ensure_db_path().map_err(|e| RuntimeError::Config(e.to_string()))?;
        let store = SqliteStore::open(&db_path).map_err(|e| RuntimeError::Storage(e.to_string()))?;
        Ok(Self::with_parts(config, store))
    }

    /// Build a runtime from preconstructed parts (isolated data dirs,
    /// test configs).
    pub fn with_parts(config: AppConfig, store: SqliteStore) -> Self {
        let client = JikanClient::new()
            .with_base_url(config.catalog.base_url.clone())
            .with_page_size(config.catalog.page_size);
        let search = SearchSession::new(
            Arc::new(client),
            Duration::from_millis(config.general.debounce_ms),
        );
        Self {
            config,
            library: RwLock::new(SavedList::load(store)),
            search,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    // ── Search ──────────────────────────────────────────────────

    pub async fn search_state(&self) -> SearchState {
        self.search.state().await
    }

    pub async fn set_query_text(&self, text: &str) {
        self.search.set_query_text(text).await;
    }

    pub async fn submit_search(&self) {
        self.search.submit_search().await;
    }

    pub async fn prev_page(&self) {
        self.search.prev_page().await;
    }

    pub async fn next_page(&self) {
        self.search.next_page().await;
    }

    pub async fn select_genre(&self, genre_id: u64) {
        self.search.select_genre(genre_id).await;
    }

    pub async fn toggle_trending(&self) {
        self.search.toggle_trending().await;
    }

    pub async fn retry(&self) {
        self.search.retry().await;
    }

    pub async fn fetch_detail(&self, id: u64) -> Result<CatalogEntry, RuntimeError> {
        self.search
            .fetch_detail(id)
            .await
            .map_err(|e| RuntimeError::Api(e.to_string()))
    }

    // ── Saved list ──────────────────────────────────────────────

    /// Add a catalog entry to the saved list (idempotent).
    pub async fn add_to_list(&self, entry: &CatalogEntry) {
        let cover = entry
            .cover_url
            .clone()
            .or_else(|| entry.large_cover_url.clone())
            .unwrap_or_default();
        self.library
            .write()
            .await
            .add(entry.id, entry.title.clone(), cover);
    }

    pub async fn remove_from_list(&self, id: u64) {
        self.library.write().await.remove(id);
    }

    pub async fn cycle_status(&self, id: u64) {
        self.library.write().await.cycle_status(id);
    }

    pub async fn toggle_favorite(&self, id: u64) {
        self.library.write().await.toggle_favorite(id);
    }

    pub async fn is_saved(&self, id: u64) -> bool {
        self.library.read().await.is_saved(id)
    }

    pub async fn reading_status(&self, id: u64) -> Option<ReadingStatus> {
        self.library.read().await.get(id).map(|m| m.status)
    }

    pub async fn list_items(&self) -> Vec<SavedManga> {
        self.library.read().await.items().to_vec()
    }
}
