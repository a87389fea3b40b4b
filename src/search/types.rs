//! Search query and configuration types.

use crate::error::SearchError;
use crate::types::BookSummary;
use serde::{Deserialize, Serialize};

/// Which catalog field a query targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchKind {
    Title,
    Author,
    Subject,
    /// An Open Library subject key such as `science_fiction`.
    SubjectKey,
}

/// A catalog query.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SearchQuery {
    pub text: String,
    /// None = free text across all fields.
    pub kind: Option<SearchKind>,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: None,
        }
    }

    pub fn with_kind(mut self, kind: SearchKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Query with surrounding whitespace removed (cache key).
    pub fn normalized(&self) -> Self {
        Self {
            text: self.text.trim().to_string(),
            kind: self.kind,
        }
    }
}

/// A book-search provider.
pub trait BookCatalog: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    fn search(&self, query: &SearchQuery) -> Result<Vec<BookSummary>, SearchError>;
}

/// Search configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub google_base_url: String,
    pub open_library_base_url: String,
    /// Results requested per query.
    pub max_results: usize,
    pub timeout_secs: u64,
    /// Recent queries kept in memory.
    pub cache_size: usize,
    pub user_agent: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            google_base_url: "https://www.googleapis.com/books/v1".to_string(),
            open_library_base_url: "https://openlibrary.org".to_string(),
            max_results: 10,
            timeout_secs: 15,
            cache_size: 64,
            user_agent: concat!("readify/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}
