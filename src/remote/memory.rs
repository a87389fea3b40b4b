//! In-process remote store for development and tests.

use crate::error::{Result, StoreError};
use crate::types::RecordId;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::debug;

use super::types::{
    Document, ErrorCallback, InsertCallback, OwnerFilter, RemoteStore, SnapshotCallback,
    Unsubscribe,
};

/// Unique identifier for a subscription inside a [`MemoryStore`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Internal subscription state.
struct Subscription {
    filter: OwnerFilter,
    on_snapshot: SnapshotCallback,
    on_error: ErrorCallback,
}

#[derive(Default)]
struct Inner {
    /// Documents by collection, in insertion order.
    collections: RwLock<HashMap<String, Vec<Document>>>,
    /// Active subscriptions by ID.
    subscriptions: RwLock<HashMap<SubscriptionId, Subscription>>,
    next_subscription: AtomicU64,
    next_document: AtomicU64,
    fail_next_insert: Mutex<Option<String>>,
    fail_next_subscribe: Mutex<Option<String>>,
}

impl Inner {
    fn matching(&self, filter: &OwnerFilter) -> Vec<Document> {
        self.collections
            .read()
            .get(&filter.collection)
            .map(|docs| {
                docs.iter()
                    .filter(|d| filter.matches(&filter.collection, d))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Push a fresh snapshot to every subscription watching `document`.
    fn broadcast(&self, collection: &str, document: &Document) {
        let targets: Vec<(OwnerFilter, SnapshotCallback)> = self
            .subscriptions
            .read()
            .values()
            .filter(|sub| sub.filter.matches(collection, document))
            .map(|sub| (sub.filter.clone(), Arc::clone(&sub.on_snapshot)))
            .collect();

        // Callbacks run without holding any lock.
        for (filter, on_snapshot) in targets {
            on_snapshot(self.matching(&filter));
        }
    }
}

/// Shared in-memory document store.
///
/// Clones share the same documents and subscriptions. Snapshots are
/// delivered synchronously on the calling thread: once on subscribe and
/// after every matching insert. An insert reports its id before the
/// resulting snapshot is pushed, like a server acknowledging a write ahead
/// of the listener update.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next insert fail with `message`.
    pub fn fail_next_insert(&self, message: impl Into<String>) {
        *self.inner.fail_next_insert.lock() = Some(message.into());
    }

    /// Make the next subscribe call fail with `message`.
    pub fn fail_next_subscribe(&self, message: impl Into<String>) {
        *self.inner.fail_next_subscribe.lock() = Some(message.into());
    }

    /// Report an error to every live subscription.
    pub fn fail_subscriptions(&self, message: &str) {
        let targets: Vec<ErrorCallback> = self
            .inner
            .subscriptions
            .read()
            .values()
            .map(|sub| Arc::clone(&sub.on_error))
            .collect();

        for on_error in targets {
            on_error(StoreError::Subscription(message.to_string()));
        }
    }

    /// All documents in a collection, in insertion order.
    pub fn documents(&self, collection: &str) -> Vec<Document> {
        self.inner
            .collections
            .read()
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    /// Get subscription count.
    pub fn subscription_count(&self) -> usize {
        self.inner.subscriptions.read().len()
    }

    fn unsubscribe(inner: &Weak<Inner>, id: SubscriptionId) {
        if let Some(inner) = inner.upgrade() {
            if inner.subscriptions.write().remove(&id).is_some() {
                debug!(subscription = id.0, "memory store subscription removed");
            }
        }
    }
}

impl RemoteStore for MemoryStore {
    fn subscribe(
        &self,
        filter: OwnerFilter,
        on_snapshot: SnapshotCallback,
        on_error: ErrorCallback,
    ) -> Result<Unsubscribe> {
        if let Some(message) = self.inner.fail_next_subscribe.lock().take() {
            return Err(StoreError::Subscription(message));
        }

        let id = SubscriptionId(self.inner.next_subscription.fetch_add(1, Ordering::SeqCst));
        let initial = self.inner.matching(&filter);

        self.inner.subscriptions.write().insert(
            id,
            Subscription {
                filter,
                on_snapshot: Arc::clone(&on_snapshot),
                on_error,
            },
        );

        on_snapshot(initial);

        let weak = Arc::downgrade(&self.inner);
        Ok(Unsubscribe::new(move || MemoryStore::unsubscribe(&weak, id)))
    }

    fn insert(&self, collection: &str, document: serde_json::Value, done: InsertCallback) {
        if let Some(message) = self.inner.fail_next_insert.lock().take() {
            done(Err(StoreError::Write(message)));
            return;
        }

        if !document.is_object() {
            done(Err(StoreError::InvalidOperation(
                "document must be a JSON object".into(),
            )));
            return;
        }

        let n = self.inner.next_document.fetch_add(1, Ordering::SeqCst) + 1;
        let document = Document::new(RecordId(format!("doc-{n}")), document);

        self.inner
            .collections
            .write()
            .entry(collection.to_string())
            .or_default()
            .push(document.clone());

        done(Ok(document.id.clone()));
        self.inner.broadcast(collection, &document);
    }
}
