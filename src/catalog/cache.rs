//! In-memory catalog cache with lazy, single-flight refresh.
//!
//! Reads are served from the last successfully built [`Catalog`] while it
//! is younger than the freshness window. Once it ages out, the next reader
//! refreshes it; concurrent readers either wait for that refresh (when
//! there is nothing to serve yet) or get the stale catalog straight away.
//!
//! A failed refresh never discards a good catalog: the stale one keeps
//! being served, and no further attempt is made until `retry_after` has
//! passed. Only when nothing was ever built does the failure reach the
//! caller, as [`CatalogError::Unavailable`].

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::catalog::fetch::PageSource;
use crate::catalog::parser::PageParser;
use crate::catalog::Catalog;
use crate::error::{CatalogError, RefreshError};
use crate::observability::metrics;

/// Timing knobs for [`CatalogCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheSettings {
    /// Maximum age before a refresh is attempted.
    pub ttl: Duration,
    /// Minimum wait after a failed refresh before trying again, while a
    /// stale catalog is available.
    pub retry_after: Duration,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(60 * 60),
            retry_after: Duration::from_secs(60),
        }
    }
}

/// Point-in-time view of the cache, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStatus {
    /// Whether any catalog has been built.
    pub loaded: bool,
    /// When the cached page was downloaded.
    pub fetched_at: Option<DateTime<Utc>>,
    /// Seconds since the cached catalog was built.
    pub age_secs: Option<u64>,
    /// Whether the cached catalog is past the freshness window.
    pub stale: bool,
    /// Error from the most recent refresh, if it failed.
    pub last_error: Option<String>,
}

#[derive(Debug)]
struct Entry {
    catalog: Arc<Catalog>,
    built_at: Instant,
}

#[derive(Debug)]
struct Failure {
    at: Instant,
    error: RefreshError,
}

#[derive(Debug, Default)]
struct State {
    entry: Option<Entry>,
    last_failure: Option<Failure>,
    /// Completed refresh attempts, successful or not.
    attempts: u64,
}

/// Owns the current catalog and the machinery to rebuild it.
pub struct CatalogCache {
    source: Arc<dyn PageSource>,
    parser: PageParser,
    settings: CacheSettings,
    state: RwLock<State>,
    // held for the whole fetch + parse; the state lock is only taken to swap
    refresh_lock: Mutex<()>,
}

impl CatalogCache {
    /// Creates an empty cache. Nothing is fetched until the first read.
    #[must_use]
    pub fn new(source: Arc<dyn PageSource>, parser: PageParser, settings: CacheSettings) -> Self {
        Self {
            source,
            parser,
            settings,
            state: RwLock::new(State::default()),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Returns the current catalog, refreshing it first if it is missing
    /// or stale.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Unavailable`] only when no catalog has ever
    /// been built and the refresh attempt failed.
    pub async fn get(&self) -> Result<Arc<Catalog>, CatalogError> {
        let (stale, seen_attempts) = {
            let state = self.state.read().await;
            if let Some(catalog) = self.servable(&state) {
                return Ok(catalog);
            }
            (
                state.entry.as_ref().map(|e| Arc::clone(&e.catalog)),
                state.attempts,
            )
        };

        let _guard = if let Ok(guard) = self.refresh_lock.try_lock() {
            guard
        } else if let Some(catalog) = stale {
            debug!("refresh already in flight, serving stale catalog");
            metrics::record_stale_served();
            return Ok(catalog);
        } else {
            self.refresh_lock.lock().await
        };

        {
            let state = self.state.read().await;
            if let Some(catalog) = self.servable(&state) {
                return Ok(catalog);
            }
            // a refresh finished while we waited and still produced nothing
            if state.entry.is_none() && state.attempts != seen_attempts {
                if let Some(failure) = &state.last_failure {
                    return Err(CatalogError::Unavailable {
                        source: failure.error.clone(),
                    });
                }
            }
        }

        self.refresh_locked().await
    }

    /// Rebuilds the catalog now, regardless of its age.
    ///
    /// Waits for an in-flight refresh first. Falls back to the previous
    /// catalog on failure, like [`get`](Self::get).
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Unavailable`] when the refresh failed and
    /// there is no previous catalog.
    pub async fn refresh(&self) -> Result<Arc<Catalog>, CatalogError> {
        let _guard = self.refresh_lock.lock().await;
        self.refresh_locked().await
    }

    /// Snapshot of the cache state.
    pub async fn status(&self) -> CacheStatus {
        let state = self.state.read().await;
        let entry = state.entry.as_ref();
        CacheStatus {
            loaded: entry.is_some(),
            fetched_at: entry.map(|e| e.catalog.fetched_at),
            age_secs: entry.map(|e| e.built_at.elapsed().as_secs()),
            stale: entry.is_some_and(|e| self.is_stale(e)),
            last_error: state.last_failure.as_ref().map(|f| f.error.to_string()),
        }
    }

    /// Catalog that can be served without a refresh: fresh, or stale
    /// while a recent failure holds off retries.
    fn servable(&self, state: &State) -> Option<Arc<Catalog>> {
        let entry = state.entry.as_ref()?;
        if !self.is_stale(entry) {
            return Some(Arc::clone(&entry.catalog));
        }
        let backing_off = state
            .last_failure
            .as_ref()
            .is_some_and(|f| f.at.elapsed() < self.settings.retry_after);
        if backing_off {
            metrics::record_stale_served();
            return Some(Arc::clone(&entry.catalog));
        }
        None
    }

    fn is_stale(&self, entry: &Entry) -> bool {
        entry.built_at.elapsed() > self.settings.ttl
    }

    /// Fetches, parses and swaps. Caller must hold `refresh_lock`.
    async fn refresh_locked(&self) -> Result<Arc<Catalog>, CatalogError> {
        let started = Instant::now();
        let outcome = self.build().await;

        let mut state = self.state.write().await;
        state.attempts += 1;
        match outcome {
            Ok(catalog) => {
                let catalog = Arc::new(catalog);
                let items = catalog.presets.total_items();
                state.entry = Some(Entry {
                    catalog: Arc::clone(&catalog),
                    built_at: Instant::now(),
                });
                state.last_failure = None;
                metrics::record_catalog_refresh("success");
                metrics::set_catalog_items(items);
                info!(items, elapsed = ?started.elapsed(), "catalog refreshed");
                Ok(catalog)
            }
            Err(error) => {
                metrics::record_catalog_refresh(match error {
                    RefreshError::Fetch(_) => "fetch_error",
                    RefreshError::Parse(_) => "parse_error",
                });
                state.last_failure = Some(Failure {
                    at: Instant::now(),
                    error: error.clone(),
                });
                if let Some(entry) = &state.entry {
                    warn!(
                        error = %error,
                        age = ?entry.built_at.elapsed(),
                        retry_after = ?self.settings.retry_after,
                        "catalog refresh failed, serving stale catalog"
                    );
                    metrics::record_stale_served();
                    Ok(Arc::clone(&entry.catalog))
                } else {
                    warn!(error = %error, "catalog refresh failed and no catalog is cached");
                    Err(CatalogError::Unavailable { source: error })
                }
            }
        }
    }

    async fn build(&self) -> Result<Catalog, RefreshError> {
        let markup = self.source.fetch().await?;
        let presets = self.parser.parse(&markup)?;
        Ok(Catalog::new(presets, Utc::now()))
    }
}

impl std::fmt::Debug for CatalogCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogCache")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
