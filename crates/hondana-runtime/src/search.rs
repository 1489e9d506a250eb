//! Debounced search session over a remote catalog.
//!
//! All state lives behind one lock and is mutated only by the session's
//! own methods and the completion handlers they spawn. Every fetch
//! carries a request token; a completion whose token is no longer the
//! latest is discarded, so a slow page-1 response cannot overwrite a
//! newer page-2 result.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use hondana_api::traits::{CatalogEntry, CatalogPage, CatalogService};

/// Message shown for any failed list fetch.
const FETCH_ERROR_MESSAGE: &str = "Something went wrong. Try again.";

/// Active browse filter, mutually exclusive with a free-text query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CatalogFilter {
    Genre(u64),
    Trending,
}

/// Parameters of one dispatched list fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchRequest {
    Query { text: String, page: u32 },
    Genre { genre_id: u64, page: u32 },
    Trending { page: u32 },
}

impl FetchRequest {
    fn page(&self) -> u32 {
        match self {
            Self::Query { page, .. } | Self::Genre { page, .. } | Self::Trending { page } => *page,
        }
    }
}

/// Observable state of the search screen.
#[derive(Debug, Clone, Serialize)]
pub struct SearchState {
    pub query: String,
    pub filter: Option<CatalogFilter>,
    pub page: u32,
    pub last_page: u32,
    pub is_loading: bool,
    pub error: Option<String>,
    pub has_searched: bool,
    pub results: Vec<CatalogEntry>,
    /// Parameters of the most recent dispatch, re-issued by `retry`.
    #[serde(skip)]
    last_request: Option<FetchRequest>,
}

impl Default for SearchState {
    fn default() -> Self {
        Self {
            query: String::new(),
            filter: None,
            page: 1,
            last_page: 1,
            is_loading: false,
            error: None,
            has_searched: false,
            results: Vec::new(),
            last_request: None,
        }
    }
}

/// Headless controller for the catalog search screen.
pub struct SearchSession<S> {
    service: Arc<S>,
    state: Arc<RwLock<SearchState>>,
    debounce: Duration,
    pending: Arc<Mutex<Option<JoinHandle<()>>>>,
    token: Arc<AtomicU64>,
}

impl<S> Clone for SearchSession<S> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            state: self.state.clone(),
            debounce: self.debounce,
            pending: self.pending.clone(),
            token: self.token.clone(),
        }
    }
}

impl<S: CatalogService + 'static> SearchSession<S> {
    pub fn new(service: Arc<S>, debounce: Duration) -> Self {
        Self {
            service,
            state: Arc::new(RwLock::new(SearchState::default())),
            debounce,
            pending: Arc::new(Mutex::new(None)),
            token: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Snapshot of the current state for the view layer.
    pub async fn state(&self) -> SearchState {
        self.state.read().await.clone()
    }

    /// Replace the query text.
    ///
    /// Non-empty text clears the active filter and (re)starts the
    /// debounce timer; empty text resets the result state and cancels
    /// any pending timer. Neither fetches on its own.
    pub async fn set_query_text(&self, text: &str) {
        self.cancel_debounce().await;

        let trimmed = text.trim().to_string();
        {
            let mut state = self.state.write().await;
            state.query = text.to_string();
            if trimmed.is_empty() {
                state.results.clear();
                state.error = None;
                state.has_searched = false;
                state.page = 1;
                return;
            }
            state.filter = None;
        }

        let session = self.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(session.debounce).await;
            session
                .dispatch(FetchRequest::Query {
                    text: trimmed,
                    page: 1,
                })
                .await;
        });
        *self.pending.lock().await = Some(handle);
    }

    /// Immediately search page 1 of the current query, overriding any
    /// pending debounce. No-op when the trimmed query is empty.
    pub async fn submit_search(&self) {
        self.cancel_debounce().await;

        let trimmed = {
            let state = self.state.read().await;
            state.query.trim().to_string()
        };
        if trimmed.is_empty() {
            return;
        }
        self.dispatch(FetchRequest::Query {
            text: trimmed,
            page: 1,
        })
        .await;
    }

    /// Move to the previous results page. No-op on the first page or
    /// while a fetch is in flight.
    pub async fn prev_page(&self) {
        let request = {
            let state = self.state.read().await;
            if state.is_loading || state.page == 1 {
                return;
            }
            request_for(&state, state.page - 1)
        };
        if let Some(request) = request {
            self.dispatch(request).await;
        }
    }

    /// Move to the next results page. No-op on the last page or while a
    /// fetch is in flight.
    pub async fn next_page(&self) {
        let request = {
            let state = self.state.read().await;
            if state.is_loading || state.page >= state.last_page {
                return;
            }
            request_for(&state, state.page + 1)
        };
        if let Some(request) = request {
            self.dispatch(request).await;
        }
    }

    /// Toggle the genre filter. Selecting the active genre again clears
    /// the filter and results; a new genre fetches page 1 immediately.
    pub async fn select_genre(&self, genre_id: u64) {
        self.cancel_debounce().await;
        {
            let mut state = self.state.write().await;
            if state.filter == Some(CatalogFilter::Genre(genre_id)) {
                clear_filter(&mut state);
                return;
            }
            state.filter = Some(CatalogFilter::Genre(genre_id));
            state.query.clear();
        }
        self.dispatch(FetchRequest::Genre { genre_id, page: 1 })
            .await;
    }

    /// Toggle the trending filter, mutually exclusive with the genre
    /// filter and the free-text query.
    pub async fn toggle_trending(&self) {
        self.cancel_debounce().await;
        {
            let mut state = self.state.write().await;
            if state.filter == Some(CatalogFilter::Trending) {
                clear_filter(&mut state);
                return;
            }
            state.filter = Some(CatalogFilter::Trending);
            state.query.clear();
        }
        self.dispatch(FetchRequest::Trending { page: 1 }).await;
    }

    /// Re-issue the most recent fetch with identical parameters. No-op
    /// when nothing has been dispatched yet.
    pub async fn retry(&self) {
        let request = {
            let state = self.state.read().await;
            state.last_request.clone()
        };
        if let Some(request) = request {
            self.dispatch(request).await;
        }
    }

    /// Fetch one full record for detail display, independent of the
    /// list state. Failures are returned to the caller.
    pub async fn fetch_detail(&self, id: u64) -> Result<CatalogEntry, S::Error> {
        self.service.fetch_by_id(id).await
    }

    async fn cancel_debounce(&self) {
        if let Some(handle) = self.pending.lock().await.take() {
            handle.abort();
        }
    }

    /// Mark the state loading and spawn the fetch for `request`. The
    /// completion applies only while its token is still the latest.
    async fn dispatch(&self, request: FetchRequest) {
        let token = self.token.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut state = self.state.write().await;
            state.is_loading = true;
            state.error = None;
            state.results.clear();
            state.page = request.page();
            state.last_request = Some(request.clone());
        }
        debug!(?request, token, "dispatching catalog fetch");

        let session = self.clone();
        tokio::spawn(async move {
            let outcome = match &request {
                FetchRequest::Query { text, page } => session.service.search(text, *page).await,
                FetchRequest::Genre { genre_id, page } => {
                    session.service.fetch_by_genre(*genre_id, *page).await
                }
                FetchRequest::Trending { page } => session.service.fetch_trending(*page).await,
            };
            session.apply(token, outcome).await;
        });
    }

    async fn apply(&self, token: u64, outcome: Result<CatalogPage, S::Error>) {
        if self.token.load(Ordering::SeqCst) != token {
            debug!(token, "discarding stale fetch result");
            return;
        }
        let mut state = self.state.write().await;
        match outcome {
            Ok(page) => {
                state.results = page.entries;
                state.last_page = page.last_page.max(1);
                state.page = state.page.min(state.last_page);
                state.has_searched = true;
                state.error = None;
            }
            Err(e) => {
                warn!(error = %e, "catalog fetch failed");
                state.error = Some(FETCH_ERROR_MESSAGE.to_string());
            }
        }
        state.is_loading = false;
    }
}

/// Build the fetch for `page` from whichever of filter or query is
/// active.
fn request_for(state: &SearchState, page: u32) -> Option<FetchRequest> {
    match state.filter {
        Some(CatalogFilter::Genre(genre_id)) => Some(FetchRequest::Genre { genre_id, page }),
        Some(CatalogFilter::Trending) => Some(FetchRequest::Trending { page }),
        None => {
            let text = state.query.trim();
            (!text.is_empty()).then(|| FetchRequest::Query {
                text: text.to_string(),
                page,
            })
        }
    }
}

fn clear_filter(state: &mut SearchState) {
    state.filter = None;
    state.results.clear();
    state.error = None;
    state.has_searched = false;
    state.page = 1;
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex as StdMutex;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Search { query: String, page: u32 },
        Genre { genre_id: u64, page: u32 },
        Trending { page: u32 },
        Detail { id: u64 },
    }

    #[derive(Debug, thiserror::Error)]
    #[error("stub failure")]
    struct StubError;

    fn entry(id: u64) -> CatalogEntry {
        CatalogEntry {
            id,
            title: format!("manga {id}"),
            cover_url: None,
            large_cover_url: None,
            score: None,
            status: None,
            chapters: None,
            genres: Vec::new(),
            authors: Vec::new(),
            synopsis: None,
        }
    }

    /// Scripted catalog: records calls in order, answers each list
    /// fetch with one entry tagged with the call's sequence number, and
    /// optionally sleeps per call before answering.
    struct StubCatalog {
        calls: StdMutex<Vec<Call>>,
        seq: AtomicU64,
        delays: StdMutex<Vec<Duration>>,
        last_page: u32,
        fail: bool,
    }

    impl StubCatalog {
        fn new() -> Self {
            Self {
                calls: StdMutex::new(Vec::new()),
                seq: AtomicU64::new(0),
                delays: StdMutex::new(Vec::new()),
                last_page: 1,
                fail: false,
            }
        }

        fn with_last_page(mut self, last_page: u32) -> Self {
            self.last_page = last_page;
            self
        }

        fn failing(mut self) -> Self {
            self.fail = true;
            self
        }

        /// Delays consumed front-to-back, one per list fetch.
        fn with_delays(self, delays: Vec<Duration>) -> Self {
            *self.delays.lock().unwrap() = delays;
            self
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        async fn respond(&self, call: Call) -> Result<CatalogPage, StubError> {
            let seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
            let delay = {
                let mut delays = self.delays.lock().unwrap();
                if delays.is_empty() {
                    None
                } else {
                    Some(delays.remove(0))
                }
            };
            self.calls.lock().unwrap().push(call);
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail {
                return Err(StubError);
            }
            Ok(CatalogPage {
                entries: vec![entry(seq)],
                last_page: self.last_page,
            })
        }
    }

    impl CatalogService for StubCatalog {
        type Error = StubError;

        async fn search(&self, query: &str, page: u32) -> Result<CatalogPage, StubError> {
            self.respond(Call::Search {
                query: query.to_string(),
                page,
            })
            .await
        }

        async fn fetch_by_id(&self, id: u64) -> Result<CatalogEntry, StubError> {
            self.calls.lock().unwrap().push(Call::Detail { id });
            if self.fail {
                return Err(StubError);
            }
            Ok(entry(id))
        }

        async fn fetch_by_genre(&self, genre_id: u64, page: u32) -> Result<CatalogPage, StubError> {
            self.respond(Call::Genre { genre_id, page }).await
        }

        async fn fetch_trending(&self, page: u32) -> Result<CatalogPage, StubError> {
            self.respond(Call::Trending { page }).await
        }
    }

    fn session_with(stub: Arc<StubCatalog>) -> SearchSession<StubCatalog> {
        SearchSession::new(stub, Duration::from_millis(500))
    }

    /// Let spawned tasks start and register their timers.
    async fn tick() {
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
    }

    /// Park repeatedly so pending timers auto-advance and in-flight
    /// fetches drain. Covers stub delays up to one virtual second.
    async fn settle() {
        for _ in 0..20 {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_fires_once_for_final_text() {
        let stub = Arc::new(StubCatalog::new().with_last_page(5));
        let session = session_with(stub.clone());

        session.set_query_text("nar").await;
        tick().await;
        tokio::time::advance(Duration::from_millis(200)).await;
        session.set_query_text("naruto").await;
        tick().await;

        tokio::time::advance(Duration::from_millis(499)).await;
        assert!(stub.calls().is_empty());

        tokio::time::advance(Duration::from_millis(2)).await;
        settle().await;

        assert_eq!(
            stub.calls(),
            vec![Call::Search {
                query: "naruto".into(),
                page: 1
            }]
        );
        let state = session.state().await;
        assert_eq!(state.page, 1);
        assert_eq!(state.last_page, 5);
        assert!(state.has_searched);
        assert!(!state.is_loading);
        assert_eq!(state.results.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_is_trimmed_before_fetch() {
        let stub = Arc::new(StubCatalog::new());
        let session = session_with(stub.clone());

        session.set_query_text("  one piece  ").await;
        tick().await;
        tokio::time::advance(Duration::from_millis(501)).await;
        settle().await;

        assert_eq!(
            stub.calls(),
            vec![Call::Search {
                query: "one piece".into(),
                page: 1
            }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_query_resets_and_cancels_debounce() {
        let stub = Arc::new(StubCatalog::new().with_last_page(3));
        let session = session_with(stub.clone());

        session.set_query_text("naruto").await;
        session.submit_search().await;
        settle().await;
        assert_eq!(session.state().await.results.len(), 1);

        session.set_query_text("naruto again").await;
        tick().await;
        session.set_query_text("").await;

        tokio::time::advance(Duration::from_millis(600)).await;
        settle().await;

        // The pending debounce never fired.
        assert_eq!(stub.calls().len(), 1);
        let state = session.state().await;
        assert_eq!(state.query, "");
        assert_eq!(state.page, 1);
        assert!(state.results.is_empty());
        assert!(state.error.is_none());
        assert!(!state.has_searched);
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_search_skips_debounce() {
        let stub = Arc::new(StubCatalog::new());
        let session = session_with(stub.clone());

        session.set_query_text("berserk").await;
        session.submit_search().await;
        settle().await;

        assert_eq!(
            stub.calls(),
            vec![Call::Search {
                query: "berserk".into(),
                page: 1
            }]
        );

        // The debounce that set_query_text scheduled was cancelled, so
        // the fetch is not repeated later.
        tokio::time::advance(Duration::from_millis(600)).await;
        settle().await;
        assert_eq!(stub.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_with_empty_query_is_noop() {
        let stub = Arc::new(StubCatalog::new());
        let session = session_with(stub.clone());

        session.submit_search().await;
        session.set_query_text("   ").await;
        session.submit_search().await;
        settle().await;

        assert!(stub.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_next_page_is_optimistic_then_confirms() {
        let stub = Arc::new(
            StubCatalog::new()
                .with_last_page(5)
                .with_delays(vec![Duration::ZERO, Duration::from_millis(100)]),
        );
        let session = session_with(stub.clone());

        session.set_query_text("naruto").await;
        session.submit_search().await;
        settle().await;

        session.next_page().await;
        let state = session.state().await;
        assert_eq!(state.page, 2);
        assert!(state.is_loading);
        assert!(state.results.is_empty());

        settle().await;
        let state = session.state().await;
        assert_eq!(
            stub.calls()[1],
            Call::Search {
                query: "naruto".into(),
                page: 2
            }
        );
        assert_eq!(state.page, 2);
        assert!(!state.is_loading);
        assert_eq!(state.results.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pagination_noops_at_bounds() {
        let stub = Arc::new(StubCatalog::new().with_last_page(1));
        let session = session_with(stub.clone());

        session.set_query_text("naruto").await;
        session.submit_search().await;
        settle().await;
        assert_eq!(stub.calls().len(), 1);

        // page == 1: prev is a no-op; page == last_page: next is too.
        session.prev_page().await;
        session.next_page().await;
        settle().await;
        assert_eq!(stub.calls().len(), 1);
        assert_eq!(session.state().await.page, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pagination_noop_while_loading() {
        let stub = Arc::new(
            StubCatalog::new()
                .with_last_page(5)
                .with_delays(vec![Duration::from_millis(200)]),
        );
        let session = session_with(stub.clone());

        session.set_query_text("naruto").await;
        session.submit_search().await;
        tick().await;
        assert!(session.state().await.is_loading);

        session.next_page().await;
        tokio::time::advance(Duration::from_millis(200)).await;
        settle().await;

        assert_eq!(stub.calls().len(), 1);
        assert_eq!(session.state().await.page, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_genre_toggle_law() {
        let stub = Arc::new(StubCatalog::new().with_last_page(9));
        let session = session_with(stub.clone());

        session.select_genre(4).await;
        settle().await;
        assert_eq!(
            stub.calls(),
            vec![Call::Genre {
                genre_id: 4,
                page: 1
            }]
        );
        assert_eq!(session.state().await.filter, Some(CatalogFilter::Genre(4)));

        // Same genre again: clear, do not re-fetch.
        session.select_genre(4).await;
        settle().await;
        assert_eq!(stub.calls().len(), 1);
        let state = session.state().await;
        assert_eq!(state.filter, None);
        assert!(state.results.is_empty());
        assert!(!state.has_searched);
        assert_eq!(state.page, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_genre_clears_query_and_pending_debounce() {
        let stub = Arc::new(StubCatalog::new());
        let session = session_with(stub.clone());

        session.set_query_text("naruto").await;
        tick().await;
        session.select_genre(4).await;
        settle().await;

        let state = session.state().await;
        assert_eq!(state.query, "");
        assert_eq!(state.filter, Some(CatalogFilter::Genre(4)));

        // The debounced text search never fires.
        tokio::time::advance(Duration::from_millis(600)).await;
        settle().await;
        assert_eq!(
            stub.calls(),
            vec![Call::Genre {
                genre_id: 4,
                page: 1
            }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_clears_filter() {
        let stub = Arc::new(StubCatalog::new());
        let session = session_with(stub.clone());

        session.toggle_trending().await;
        settle().await;
        assert_eq!(
            session.state().await.filter,
            Some(CatalogFilter::Trending)
        );

        session.set_query_text("naruto").await;
        assert_eq!(session.state().await.filter, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_trending_and_genre_are_mutually_exclusive() {
        let stub = Arc::new(StubCatalog::new());
        let session = session_with(stub.clone());

        session.toggle_trending().await;
        settle().await;
        session.select_genre(7).await;
        settle().await;
        assert_eq!(session.state().await.filter, Some(CatalogFilter::Genre(7)));

        session.toggle_trending().await;
        settle().await;
        assert_eq!(
            session.state().await.filter,
            Some(CatalogFilter::Trending)
        );

        session.toggle_trending().await;
        settle().await;
        assert_eq!(session.state().await.filter, None);
        assert_eq!(
            stub.calls(),
            vec![
                Call::Trending { page: 1 },
                Call::Genre {
                    genre_id: 7,
                    page: 1
                },
                Call::Trending { page: 1 },
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_error_sets_message_and_retry_reissues() {
        let stub = Arc::new(StubCatalog::new().failing());
        let session = session_with(stub.clone());

        session.set_query_text("naruto").await;
        session.submit_search().await;
        settle().await;

        let state = session.state().await;
        assert!(state.results.is_empty());
        assert!(!state.is_loading);
        let message = state.error.expect("error message set");
        assert!(!message.is_empty());

        session.retry().await;
        settle().await;
        let calls = stub.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], calls[1]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_without_prior_fetch_is_noop() {
        let stub = Arc::new(StubCatalog::new());
        let session = session_with(stub.clone());

        session.retry().await;
        settle().await;
        assert!(stub.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_response_is_discarded() {
        let stub = Arc::new(
            StubCatalog::new().with_delays(vec![Duration::from_millis(2000), Duration::ZERO]),
        );
        let session = session_with(stub.clone());

        session.set_query_text("naruto").await;
        session.submit_search().await;
        tick().await;
        session.submit_search().await;
        settle().await;

        // The second (fast) response landed.
        let state = session.state().await;
        assert_eq!(state.results[0].id, 2);
        assert!(!state.is_loading);

        // Now the first (slow) response arrives and must not win.
        tokio::time::advance(Duration::from_millis(2000)).await;
        settle().await;
        let state = session.state().await;
        assert_eq!(stub.calls().len(), 2);
        assert_eq!(state.results[0].id, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_detail_passes_through() {
        let stub = Arc::new(StubCatalog::new());
        let session = session_with(stub.clone());

        let detail = session.fetch_detail(42).await.unwrap();
        assert_eq!(detail.id, 42);
        assert_eq!(stub.calls(), vec![Call::Detail { id: 42 }]);

        // Detail fetches leave the list state alone.
        let state = session.state().await;
        assert!(!state.is_loading);
        assert!(state.results.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_detail_propagates_error() {
        let stub = Arc::new(StubCatalog::new().failing());
        let session = session_with(stub.clone());

        assert!(session.fetch_detail(42).await.is_err());
        assert!(session.state().await.error.is_none());
    }
}
