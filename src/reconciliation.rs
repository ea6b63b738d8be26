// ⚖️ Reconciliation Engine - cache first, then network
//
// load():
//   1. read the cache (sync)
//   2. cache non-empty OR offline → derive + emit the cached list now
//   3. fetch in the background
//   4. fetched == cached (every field, in order) → nothing
//      otherwise → save, derive, emit
//   5. fetch failed → emit an empty list, log the error
//
// Each load() takes a generation number. A completion whose generation is no
// longer the latest is dropped, so overlapping loads cannot apply a stale list.

use crate::cache::CacheStore;
use crate::coin::{derive_display_states, lists_same_state, Coin};
use crate::connectivity::ConnectivityOracle;
use crate::error::FetchResult;
use crate::filter::{self, FilterOption};
use crate::remote::RemoteSource;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

pub const NO_INTERNET: &str = "No internet connection.";
pub const NO_DATA: &str =
    "No data found. Please pull to refresh or check your internet connection.";
pub const NO_SEARCH_DATA: &str = "Sorry, we couldn't find any results for your search. \
Please try again with different keywords or refine your search criteria.";

/// Receives every displayed-list change.
pub type ListListener = Arc<dyn Fn(Vec<Coin>) + Send + Sync>;

// ============================================================================
// EMPTY STATE
// ============================================================================

/// Why the displayed list is empty, for the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyState {
    Offline,
    NoSearchResults,
    NoData,
}

impl EmptyState {
    pub fn message(&self) -> &'static str {
        match self {
            EmptyState::Offline => NO_INTERNET,
            EmptyState::NoSearchResults => NO_SEARCH_DATA,
            EmptyState::NoData => NO_DATA,
        }
    }
}

// ============================================================================
// LIST STATE
// ============================================================================

#[derive(Debug, Default)]
struct ListState {
    all: Vec<Coin>,
    displayed: Vec<Coin>,
    last_filters: Vec<FilterOption>,
    last_query: String,
    last_error: Option<String>,
}

// ============================================================================
// RECONCILIATION ENGINE
// ============================================================================

/// One engine per screen session. Cloning shares the same state.
#[derive(Clone)]
pub struct ReconciliationEngine {
    cache: Arc<dyn CacheStore>,
    remote: Arc<dyn RemoteSource>,
    connectivity: Arc<dyn ConnectivityOracle>,
    state: Arc<Mutex<ListState>>,
    listener: Arc<RwLock<Option<ListListener>>>,
    generation: Arc<AtomicU64>,
    reapply_on_refresh: bool,
}

impl ReconciliationEngine {
    pub fn new(
        cache: Arc<dyn CacheStore>,
        remote: Arc<dyn RemoteSource>,
        connectivity: Arc<dyn ConnectivityOracle>,
    ) -> Self {
        ReconciliationEngine {
            cache,
            remote,
            connectivity,
            state: Arc::new(Mutex::new(ListState::default())),
            listener: Arc::new(RwLock::new(None)),
            generation: Arc::new(AtomicU64::new(0)),
            reapply_on_refresh: false,
        }
    }

    /// Re-run the last filter selection and search query after each
    /// reconciliation pass instead of resetting to the full list.
    pub fn with_reapply_on_refresh(mut self, reapply: bool) -> Self {
        self.reapply_on_refresh = reapply;
        self
    }

    /// Register the `onListChanged` callback, replacing any previous one.
    /// Scheduling onto a UI thread is the caller's business.
    pub fn on_list_changed<F>(&self, listener: F)
    where
        F: Fn(Vec<Coin>) + Send + Sync + 'static,
    {
        if let Ok(mut slot) = self.listener.write() {
            *slot = Some(Arc::new(listener));
        }
    }

    // ------------------------------------------------------------------------
    // load
    // ------------------------------------------------------------------------

    /// Cache-then-network load. Must be called inside a tokio runtime.
    ///
    /// The returned handle resolves once the background fetch has been
    /// reconciled; callers are free to drop it.
    pub fn load(&self) -> JoinHandle<()> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let cached = self.cache.load();
        let connected = self.connectivity.is_connected();

        debug!(generation, cached = cached.len(), connected, "Starting load");

        if !cached.is_empty() || !connected {
            self.replace_all(cached.clone());
        }

        let engine = self.clone();
        tokio::spawn(async move {
            let result = engine.remote.fetch().await;
            engine.complete_fetch(generation, &cached, result).await;
        })
    }

    async fn complete_fetch(
        &self,
        generation: u64,
        cached: &[Coin],
        result: FetchResult<Vec<Coin>>,
    ) {
        let latest = self.generation.load(Ordering::SeqCst);
        if generation != latest {
            debug!(generation, latest, "Dropping stale fetch result");
            return;
        }

        match result {
            Ok(fetched) => {
                self.lock_state().last_error = None;

                if lists_same_state(cached, &fetched) {
                    info!(count = fetched.len(), "Data is the same, no update needed");
                    return;
                }

                // SQLite writes stay off the async workers; the emission does not wait on them
                let cache = self.cache.clone();
                let snapshot = fetched.clone();
                let save = tokio::task::spawn_blocking(move || cache.save(&snapshot));

                info!(count = fetched.len(), "Coin list updated from remote");
                self.replace_all(fetched);

                if let Err(e) = save.await {
                    warn!(error = %e, "Cache save task failed");
                }
            }
            Err(e) => {
                error!(error = %e, "Failed to fetch coin list");
                let displayed = {
                    let mut state = self.lock_state();
                    state.last_error = Some(e.to_string());
                    state.displayed.clear();
                    state.displayed.clone()
                };
                self.emit(displayed);
            }
        }
    }

    /// Install a new "all coins" list: dedup by identity, derive display
    /// state, reset (or reapply) the displayed projection, emit.
    fn replace_all(&self, coins: Vec<Coin>) {
        let mut coins = filter::remove_duplicates(coins);
        derive_display_states(&mut coins);

        let displayed = {
            let mut state = self.lock_state();
            state.all = coins;
            state.last_error = None;

            state.displayed = if self.reapply_on_refresh {
                let filtered = filter::apply_filters(&state.all, &state.last_filters);
                filter::search(&state.all, &filtered, &state.last_query)
            } else {
                state.all.clone()
            };
            state.displayed.clone()
        };

        self.emit(displayed);
    }

    // ------------------------------------------------------------------------
    // filter + search
    // ------------------------------------------------------------------------

    /// Replace the displayed list with the union of the selected options.
    /// Any previous search stops being in effect.
    pub fn apply_filter(&self, selected: &[FilterOption]) -> Vec<Coin> {
        let displayed = {
            let mut state = self.lock_state();
            state.displayed = filter::apply_filters(&state.all, selected);
            state.last_filters = selected.to_vec();
            state.last_query.clear();
            state.displayed.clone()
        };

        debug!(filters = selected.len(), count = displayed.len(), "Applied filters");
        self.emit(displayed.clone());
        displayed
    }

    /// Narrow the displayed list by `query`; an empty query restores the full list.
    pub fn search(&self, query: &str) -> Vec<Coin> {
        let displayed = {
            let mut state = self.lock_state();
            state.displayed = filter::search(&state.all, &state.displayed, query);
            state.last_query = query.to_string();
            state.displayed.clone()
        };

        debug!(query, count = displayed.len(), "Searched coins");
        self.emit(displayed.clone());
        displayed
    }

    // ------------------------------------------------------------------------
    // accessors
    // ------------------------------------------------------------------------

    pub fn all_coins(&self) -> Vec<Coin> {
        self.lock_state().all.clone()
    }

    pub fn displayed(&self) -> Vec<Coin> {
        self.lock_state().displayed.clone()
    }

    pub fn last_error(&self) -> Option<String> {
        self.lock_state().last_error.clone()
    }

    /// Reason the displayed list is empty, `None` when it is not.
    pub fn empty_state(&self) -> Option<EmptyState> {
        let state = self.lock_state();
        if !state.displayed.is_empty() {
            return None;
        }

        if !self.connectivity.is_connected() {
            Some(EmptyState::Offline)
        } else if !state.last_query.is_empty() && !state.all.is_empty() {
            Some(EmptyState::NoSearchResults)
        } else {
            Some(EmptyState::NoData)
        }
    }

    fn emit(&self, coins: Vec<Coin>) {
        let listener = match self.listener.read() {
            Ok(slot) => slot.clone(),
            Err(_) => {
                warn!("Listener lock poisoned, dropping emission");
                return;
            }
        };

        if let Some(listener) = listener {
            listener(coins);
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, ListState> {
        // State is always left consistent, so a poisoned lock is still usable
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

// ============================================================================
// TESTS
// ============================================================================
