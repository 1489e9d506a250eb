//! The user's persisted reading list.

use chrono::Utc;
use tracing::warn;

use crate::models::{ReadingStatus, SavedManga};
use crate::storage::KeyValueStore;

/// Storage key for the serialized list blob.
const LIST_KEY: &str = "manga_list";

/// The saved manga collection, keyed by catalog id.
///
/// Owns its storage handle; callers construct one per process (or per
/// test) instead of sharing a global. Every mutation rewrites the whole
/// serialized list through [`KeyValueStore::write`].
pub struct SavedList<S> {
    items: Vec<SavedManga>,
    store: S,
}

impl<S: KeyValueStore> SavedList<S> {
    /// Load the saved list from `store`, starting empty when nothing
    /// usable is stored.
    pub fn load(store: S) -> Self {
        let items = match store.read(LIST_KEY) {
            Ok(Some(blob)) => serde_json::from_str(&blob).unwrap_or_else(|e| {
                warn!(error = %e, "discarding malformed saved list");
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "failed to read saved list");
                Vec::new()
            }
        };
        Self { items, store }
    }

    /// Add a manga with default status. Repeated adds of the same id
    /// are no-ops.
    pub fn add(&mut self, id: u64, title: impl Into<String>, cover_url: impl Into<String>) {
        if self.is_saved(id) {
            return;
        }
        self.items.push(SavedManga {
            id,
            title: title.into(),
            cover_url: cover_url.into(),
            status: ReadingStatus::PlanToRead,
            favorite: false,
            added_at: Utc::now(),
        });
        self.persist();
    }

    /// Remove the manga with `id`, if present.
    pub fn remove(&mut self, id: u64) {
        let before = self.items.len();
        self.items.retain(|m| m.id != id);
        if self.items.len() != before {
            self.persist();
        }
    }

    /// Advance the reading status of `id` one step along the cycle.
    /// No-op for unknown ids.
    pub fn cycle_status(&mut self, id: u64) {
        if let Some(manga) = self.items.iter_mut().find(|m| m.id == id) {
            manga.status = manga.status.next();
            self.persist();
        }
    }

    /// Flip the favorite flag of `id`. No-op for unknown ids.
    pub fn toggle_favorite(&mut self, id: u64) {
        if let Some(manga) = self.items.iter_mut().find(|m| m.id == id) {
            manga.favorite = !manga.favorite;
            self.persist();
        }
    }

    pub fn is_saved(&self, id: u64) -> bool {
        self.items.iter().any(|m| m.id == id)
    }

    pub fn get(&self, id: u64) -> Option<&SavedManga> {
        self.items.iter().find(|m| m.id == id)
    }

    pub fn items(&self) -> &[SavedManga] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Serialize the whole list under [`LIST_KEY`]. Write failures are
    /// absorbed; the list then lives for the session only.
    fn persist(&self) {
        let blob = match serde_json::to_string(&self.items) {
            Ok(blob) => blob,
            Err(e) => {
                warn!(error = %e, "failed to serialize saved list");
                return;
            }
        };
        if let Err(e) = self.store.write(LIST_KEY, &blob) {
            warn!(error = %e, "failed to persist saved list");
        }
    }
}
