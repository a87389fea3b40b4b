//! Types at the remote document store boundary.

use crate::error::{Result, StoreError};
use crate::types::RecordId;
use std::fmt;
use std::sync::Arc;

/// Field that scopes documents to their owner.
pub const OWNER_FIELD: &str = "ownerId";

/// A document as held by the remote store.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    /// Store-assigned id.
    pub id: RecordId,
    /// Document fields (a JSON object).
    pub data: serde_json::Value,
}

impl Document {
    pub fn new(id: RecordId, data: serde_json::Value) -> Self {
        Self { id, data }
    }

    /// Owner of this document, if the field is present.
    pub fn owner_id(&self) -> Option<&str> {
        self.data.get(OWNER_FIELD)?.as_str()
    }
}

/// Selects the documents of one owner in one collection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OwnerFilter {
    pub collection: String,
    pub owner_id: String,
}

impl OwnerFilter {
    pub fn new(collection: impl Into<String>, owner_id: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            owner_id: owner_id.into(),
        }
    }

    /// Check if a document in `collection` matches.
    pub fn matches(&self, collection: &str, document: &Document) -> bool {
        self.collection == collection && document.owner_id() == Some(self.owner_id.as_str())
    }
}

/// Receives the full matching document set each time it changes.
pub type SnapshotCallback = Arc<dyn Fn(Vec<Document>) + Send + Sync>;

/// Receives subscription failures.
pub type ErrorCallback = Arc<dyn Fn(StoreError) + Send + Sync>;

/// Receives the outcome of an insert.
pub type InsertCallback = Box<dyn FnOnce(Result<RecordId>) + Send>;

/// Cancellation handle returned by [`RemoteStore::subscribe`].
///
/// Calling it (or dropping it) ends the subscription exactly once.
pub struct Unsubscribe(Option<Box<dyn FnOnce() + Send>>);

impl Unsubscribe {
    pub fn new(f: impl FnOnce() + Send + 'static) -> Self {
        Unsubscribe(Some(Box::new(f)))
    }

    /// End the subscription.
    pub fn call(mut self) {
        if let Some(f) = self.0.take() {
            f();
        }
    }
}

impl Drop for Unsubscribe {
    fn drop(&mut self) {
        if let Some(f) = self.0.take() {
            f();
        }
    }
}

impl fmt::Debug for Unsubscribe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unsubscribe")
            .field("live", &self.0.is_some())
            .finish()
    }
}

/// A push-based remote document store.
pub trait RemoteStore: Send + Sync {
    /// Start delivering snapshots of documents matching `filter`.
    ///
    /// Snapshots may arrive zero or many times, on any thread. The returned
    /// handle marks the subscription as established.
    fn subscribe(
        &self,
        filter: OwnerFilter,
        on_snapshot: SnapshotCallback,
        on_error: ErrorCallback,
    ) -> Result<Unsubscribe>;

    /// Write a new document; `done` receives the assigned id or the failure.
    fn insert(&self, collection: &str, document: serde_json::Value, done: InsertCallback);
}
