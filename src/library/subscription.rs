//! Owns the single live library subscription.

use crate::error::{Result, StoreError};
use crate::remote::{Document, ErrorCallback, OwnerFilter, RemoteStore, SnapshotCallback, Unsubscribe};
use crate::types::{sort_newest_first, LibraryRecord};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::event::{EventSender, Generation, SyncEvent};

/// Observable lifecycle phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubscriptionPhase {
    Idle,
    Subscribing,
    Active,
}

/// Internal phase carrying the subscription it describes.
enum Phase {
    Idle,
    Subscribing {
        owner_id: String,
        generation: Generation,
    },
    Active {
        owner_id: String,
        generation: Generation,
        handle: Unsubscribe,
    },
}

/// Keeps at most one subscription to the remote store, scoped to one owner.
///
/// Callbacks handed to the store are tagged with a [`Generation`]; snapshots
/// whose generation is not the live one are discarded by [`accept`], so a
/// store that keeps calling back after unsubscribe cannot leak records into
/// another session.
///
/// [`accept`]: SubscriptionManager::accept
pub struct SubscriptionManager {
    store: Arc<dyn RemoteStore>,
    collection: String,
    events: EventSender,
    phase: Phase,
    last_generation: u64,
    subscribes: u64,
    unsubscribes: u64,
}

impl SubscriptionManager {
    pub fn new(store: Arc<dyn RemoteStore>, collection: impl Into<String>, events: EventSender) -> Self {
        Self {
            store,
            collection: collection.into(),
            events,
            phase: Phase::Idle,
            last_generation: 0,
            subscribes: 0,
            unsubscribes: 0,
        }
    }

    pub fn phase(&self) -> SubscriptionPhase {
        match self.phase {
            Phase::Idle => SubscriptionPhase::Idle,
            Phase::Subscribing { .. } => SubscriptionPhase::Subscribing,
            Phase::Active { .. } => SubscriptionPhase::Active,
        }
    }

    /// Owner the current subscription is scoped to.
    pub fn owner_id(&self) -> Option<&str> {
        match &self.phase {
            Phase::Idle => None,
            Phase::Subscribing { owner_id, .. } | Phase::Active { owner_id, .. } => Some(owner_id),
        }
    }

    /// Generation of the current subscription.
    pub fn generation(&self) -> Option<Generation> {
        match &self.phase {
            Phase::Idle => None,
            Phase::Subscribing { generation, .. } | Phase::Active { generation, .. } => {
                Some(*generation)
            }
        }
    }

    pub fn is_tracking(&self, owner_id: &str) -> bool {
        self.owner_id() == Some(owner_id)
    }

    /// Number of subscribe calls issued to the store.
    pub fn subscribe_count(&self) -> u64 {
        self.subscribes
    }

    /// Number of unsubscribe handles invoked.
    pub fn unsubscribe_count(&self) -> u64 {
        self.unsubscribes
    }

    /// Tear down the current subscription unless it already tracks
    /// `next_owner`. Returns true if something was torn down.
    pub fn release_unless(&mut self, next_owner: Option<&str>) -> bool {
        if let Some(next) = next_owner {
            if self.is_tracking(next) {
                return false;
            }
        }
        self.release()
    }

    /// Tear down any live subscription.
    pub fn shutdown(&mut self) {
        self.release();
    }

    fn release(&mut self) -> bool {
        match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Idle => false,
            Phase::Subscribing {
                owner_id,
                generation,
            } => {
                info!(owner = %owner_id, ?generation, "abandoned pending library subscription");
                true
            }
            Phase::Active {
                owner_id,
                generation,
                handle,
            } => {
                handle.call();
                self.unsubscribes += 1;
                info!(owner = %owner_id, ?generation, "library subscription released");
                true
            }
        }
    }

    /// Subscribe to the library of `owner_id`.
    ///
    /// Only valid while idle; call [`release_unless`](Self::release_unless)
    /// first. On failure the manager stays idle and the error is returned.
    pub fn subscribe(&mut self, owner_id: &str) -> Result<Generation> {
        if !matches!(self.phase, Phase::Idle) {
            return Err(StoreError::InvalidOperation(format!(
                "subscription for {} is still live",
                self.owner_id().unwrap_or_default()
            )));
        }

        self.last_generation += 1;
        let generation = Generation(self.last_generation);
        self.phase = Phase::Subscribing {
            owner_id: owner_id.to_string(),
            generation,
        };

        let snapshots = self.events.clone();
        let on_snapshot: SnapshotCallback = Arc::new(move |documents| {
            snapshots.send(SyncEvent::Snapshot {
                generation,
                documents,
            });
        });
        let errors = self.events.clone();
        let on_error: ErrorCallback = Arc::new(move |error| {
            errors.send(SyncEvent::SubscriptionError { generation, error });
        });

        self.subscribes += 1;
        let filter = OwnerFilter::new(self.collection.as_str(), owner_id);
        match self.store.subscribe(filter, on_snapshot, on_error) {
            Ok(handle) => {
                self.phase = Phase::Active {
                    owner_id: owner_id.to_string(),
                    generation,
                    handle,
                };
                info!(owner = %owner_id, ?generation, "library subscription active");
                Ok(generation)
            }
            Err(e) => {
                self.phase = Phase::Idle;
                warn!(owner = %owner_id, ?generation, error = %e, "library subscription failed");
                Err(e)
            }
        }
    }

    /// Turn a snapshot into ordered records, or `None` if it belongs to a
    /// superseded subscription.
    pub fn accept(&self, generation: Generation, documents: Vec<Document>) -> Option<Vec<LibraryRecord>> {
        let owner = match &self.phase {
            Phase::Subscribing {
                owner_id,
                generation: live,
            }
            | Phase::Active {
                owner_id,
                generation: live,
                ..
            } if *live == generation => owner_id.as_str(),
            _ => {
                debug!(?generation, live = ?self.generation(), "discarding stale snapshot");
                return None;
            }
        };

        let mut records = Vec::with_capacity(documents.len());
        for document in documents {
            if document.owner_id() != Some(owner) {
                warn!(id = %document.id, owner, "snapshot document has a different owner");
                continue;
            }
            match decode_document(document) {
                Ok(record) => records.push(record),
                Err(e) => warn!(error = %e, "skipping malformed library document"),
            }
        }

        sort_newest_first(&mut records);
        debug!(?generation, count = records.len(), "snapshot accepted");
        Some(records)
    }

    /// Log a subscription failure. Records already shown stay visible.
    pub fn on_error(&self, generation: Generation, error: &StoreError) {
        if self.generation() == Some(generation) {
            warn!(?generation, error = %error, "library subscription error");
        } else {
            debug!(?generation, error = %error, "error from superseded subscription");
        }
    }
}

/// Decode a store document into a record, taking the id from the document.
pub fn decode_document(document: Document) -> Result<LibraryRecord> {
    let Document { id, mut data } = document;
    match data.as_object_mut() {
        Some(fields) => {
            fields.insert("id".to_string(), serde_json::Value::String(id.0));
        }
        None => {
            return Err(StoreError::Deserialization(format!(
                "document {id} is not an object"
            )))
        }
    }
    serde_json::from_value(data).map_err(|e| StoreError::Deserialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::MemoryStore;
    use crate::types::RecordId;
    use crossbeam_channel::{unbounded, Receiver};
    use serde_json::json;

    fn doc(id: &str, owner: &str, ts: i64) -> Document {
        Document::new(
            RecordId::from(id),
            json!({
                "ownerId": owner,
                "title": format!("Book {id}"),
                "author": "Someone",
                "moodColor": "#112233",
                "emotions": ["Happy"],
                "notes": "",
                "dateAdded": ts,
            }),
        )
    }

    fn manager() -> (SubscriptionManager, MemoryStore, Receiver<SyncEvent>) {
        let store = MemoryStore::new();
        let (tx, rx) = unbounded();
        let manager = SubscriptionManager::new(Arc::new(store.clone()), "books", EventSender::new(tx));
        (manager, store, rx)
    }

    #[test]
    fn test_decode_document() {
        let record = decode_document(doc("d1", "u1", 9)).unwrap();
        assert_eq!(record.id, RecordId::from("d1"));
        assert_eq!(record.owner_id, "u1");
        assert!(record.emotions.contains("Happy"));

        let bad = Document::new(RecordId::from("d2"), json!(["not", "an", "object"]));
        assert!(matches!(decode_document(bad), Err(StoreError::Deserialization(_))));

        let missing = Document::new(RecordId::from("d3"), json!({ "ownerId": "u1" }));
        assert!(decode_document(missing).is_err());
    }

    #[test]
    fn test_lifecycle_counts() {
        let (mut manager, store, _rx) = manager();

        let first = manager.subscribe("u1").unwrap();
        assert_eq!(manager.phase(), SubscriptionPhase::Active);
        assert!(manager.subscribe("u2").is_err());

        assert!(!manager.release_unless(Some("u1")));
        assert!(manager.release_unless(Some("u2")));
        assert_eq!(store.subscription_count(), 0);

        let second = manager.subscribe("u2").unwrap();
        assert!(second > first);

        manager.shutdown();
        assert_eq!(manager.phase(), SubscriptionPhase::Idle);
        assert_eq!(manager.subscribe_count(), 2);
        assert_eq!(manager.unsubscribe_count(), 2);
        assert!(!manager.release_unless(None));
    }

    #[test]
    fn test_accept_sorts_and_filters() {
        let (mut manager, _store, _rx) = manager();
        let generation = manager.subscribe("u1").unwrap();

        let records = manager
            .accept(
                generation,
                vec![doc("t1", "u1", 1), doc("t3", "u1", 3), doc("x", "u2", 5), doc("t2", "u1", 2)],
            )
            .unwrap();

        let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["t3", "t2", "t1"]);
    }

    #[test]
    fn test_stale_generation_discarded() {
        let (mut manager, _store, _rx) = manager();
        let old = manager.subscribe("u1").unwrap();
        manager.release_unless(Some("u2"));
        let new = manager.subscribe("u2").unwrap();

        assert!(manager.accept(old, vec![doc("a", "u1", 1)]).is_none());
        assert!(manager.accept(new, vec![]).is_some());

        manager.shutdown();
        assert!(manager.accept(new, vec![]).is_none());
    }

    #[test]
    fn test_subscribe_failure_stays_idle() {
        let (mut manager, store, _rx) = manager();
        store.fail_next_subscribe("permission denied");

        assert!(manager.subscribe("u1").is_err());
        assert_eq!(manager.phase(), SubscriptionPhase::Idle);
        assert_eq!(manager.owner_id(), None);

        manager.subscribe("u1").unwrap();
        assert_eq!(manager.phase(), SubscriptionPhase::Active);
    }

    #[test]
    fn test_snapshots_are_tagged() {
        let (mut manager, _store, rx) = manager();
        let generation = manager.subscribe("u1").unwrap();

        match rx.try_recv().unwrap() {
            SyncEvent::Snapshot {
                generation: tagged,
                documents,
            } => {
                assert_eq!(tagged, generation);
                assert!(documents.is_empty());
            }
            other => panic!("Expected Snapshot event, got {:?}", other),
        }
    }
}
