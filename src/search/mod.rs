//! Book-search boundary.
//!
//! Catalog clients return [`SearchError`](crate::SearchError) on failure;
//! [`BookSearch`] decides per call site whether that propagates or degrades
//! to an empty list.

mod google;
mod open_library;
mod service;
mod types;

pub use google::GoogleBooks;
pub use open_library::{subject_key, OpenLibrary};
pub use service::BookSearch;
pub use types::{BookCatalog, SearchConfig, SearchKind, SearchQuery};
