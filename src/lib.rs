//! # Readify
//!
//! Client-side sync layer for a personal reading tracker.
//!
//! ## Core Concepts
//!
//! - **Identity**: the signed-in user, relayed from the auth provider
//! - **Library subscription**: one live, owner-scoped feed from the remote store
//! - **Reading state**: a single reducer-owned state value
//! - **Optimistic insert**: confirmed writes shown before the next snapshot
//!
//! ## Example
//!
//! ```ignore
//! use readify::{IdentityWatcher, MemoryAuthProvider, MemoryStore, SyncConfig, SyncController};
//!
//! let provider = MemoryAuthProvider::new();
//! let store = Arc::new(MemoryStore::new());
//!
//! let mut controller = SyncController::new(store, SyncConfig::default())?;
//! let _watcher = IdentityWatcher::start(&provider, controller.events());
//!
//! Authenticator::new(Arc::new(provider.clone())).sign_in("ada@example.com", "secret1")?;
//! controller.pump();
//!
//! controller.add_book(&book, MoodAnnotation::default().with_color("#336699"))?;
//! controller.pump();
//! ```

pub mod auth;
pub mod cache;
pub mod error;
pub mod library;
pub mod remote;
pub mod search;
pub mod stats;
pub mod types;

// Re-exports
pub use auth::{
    AuthProvider, Authenticator, IdentityWatcher, MemoryAuthProvider, ProviderError, ProviderUser,
};
pub use cache::LocalCache;
pub use error::{AuthError, Result, SearchError, StoreError};
pub use library::{
    reduce, Action, EventSender, Generation, InsertTicket, NoticeListener, ReadingState,
    SubscriptionManager, SubscriptionPhase, SyncConfig, SyncController, SyncEvent, SyncNotice,
};
pub use remote::{Document, MemoryStore, OwnerFilter, RemoteStore, Unsubscribe};
pub use search::{BookCatalog, BookSearch, SearchConfig, SearchKind, SearchQuery};
pub use stats::LibraryStats;
pub use types::*;
