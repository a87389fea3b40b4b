//! Search facade over one or more catalogs.

use crate::error::SearchError;
use crate::types::BookSummary;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use tracing::{debug, warn};

use super::google::GoogleBooks;
use super::open_library::OpenLibrary;
use super::types::{BookCatalog, SearchConfig, SearchQuery};

/// Queries catalogs in order and remembers recent results.
///
/// Two surfaces with fixed failure policies:
/// - [`search`](Self::search) returns the error when every catalog fails
/// - [`search_or_empty`](Self::search_or_empty) logs it and returns no books
pub struct BookSearch {
    catalogs: Vec<Box<dyn BookCatalog>>,
    cache: Mutex<LruCache<SearchQuery, Vec<BookSummary>>>,
}

impl BookSearch {
    pub fn new(catalogs: Vec<Box<dyn BookCatalog>>, cache_size: usize) -> Self {
        let cache_size = NonZeroUsize::new(cache_size.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            catalogs,
            cache: Mutex::new(LruCache::new(cache_size)),
        }
    }

    /// Google Books first, Open Library as fallback.
    pub fn from_config(config: &SearchConfig) -> Result<Self, SearchError> {
        let catalogs: Vec<Box<dyn BookCatalog>> = vec![
            Box::new(GoogleBooks::new(config)?),
            Box::new(OpenLibrary::new(config)?),
        ];
        Ok(Self::new(catalogs, config.cache_size))
    }

    pub fn search(&self, query: &SearchQuery) -> Result<Vec<BookSummary>, SearchError> {
        if query.is_blank() {
            return Ok(Vec::new());
        }

        let query = query.normalized();
        if let Some(cached) = self.cache.lock().get(&query).cloned() {
            debug!(q = %query.text, "search cache hit");
            return Ok(cached);
        }

        let mut last_error = None;
        for catalog in &self.catalogs {
            match catalog.search(&query) {
                Ok(books) => {
                    debug!(catalog = catalog.name(), count = books.len(), "search finished");
                    self.cache.lock().put(query, books.clone());
                    return Ok(books);
                }
                Err(e) => {
                    warn!(catalog = catalog.name(), error = %e, "catalog search failed");
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) => Err(e),
            None => Ok(Vec::new()),
        }
    }

    pub fn search_or_empty(&self, query: &SearchQuery) -> Vec<BookSummary> {
        self.search(query).unwrap_or_else(|e| {
            warn!(q = %query.text, error = %e, "search degraded to no results");
            Vec::new()
        })
    }

    pub fn clear_cache(&self) {
        self.cache.lock().clear();
    }
}
