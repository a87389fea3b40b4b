//! The single owner of reading state.

use crate::cache::LocalCache;
use crate::error::{Result, StoreError};
use crate::remote::RemoteStore;
use crate::stats::LibraryStats;
use crate::types::{sort_newest_first, BookSummary, Identity, MoodAnnotation, NewRecord, Timestamp};
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::event::{EventSender, InsertTicket, SyncEvent};
use super::insert::{InsertOutcome, InsertPath};
use super::notify::{ListenerId, NoticeBroadcaster, NoticeListener, SyncNotice, DEFAULT_NOTICE_BUFFER};
use super::state::{reduce, Action, ReadingState};
use super::subscription::{SubscriptionManager, SubscriptionPhase};

/// Controller configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Remote collection holding library documents.
    pub collection: String,

    /// Directory of the local cache (None = no cache).
    pub cache_path: Option<PathBuf>,

    /// Notices buffered per listener before it is dropped.
    pub notice_buffer: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            collection: "books".to_string(),
            cache_path: None,
            notice_buffer: DEFAULT_NOTICE_BUFFER,
        }
    }
}

/// Owns [`ReadingState`] and applies every event in arrival order.
///
/// External callbacks post [`SyncEvent`]s through an [`EventSender`]; the
/// controller drains them on one thread with [`pump`](Self::pump),
/// [`run_until`](Self::run_until) or [`run`](Self::run). It is the only
/// caller of [`reduce`].
pub struct SyncController {
    config: SyncConfig,
    state: ReadingState,
    subscriptions: SubscriptionManager,
    inserts: InsertPath,
    notices: NoticeBroadcaster,
    cache: Option<LocalCache>,
    sender: EventSender,
    receiver: Receiver<SyncEvent>,
}

impl SyncController {
    pub fn new(store: Arc<dyn RemoteStore>, config: SyncConfig) -> Result<Self> {
        let cache = config.cache_path.as_ref().map(LocalCache::open).transpose()?;

        let (tx, receiver) = unbounded();
        let sender = EventSender::new(tx);

        Ok(Self {
            subscriptions: SubscriptionManager::new(
                Arc::clone(&store),
                config.collection.as_str(),
                sender.clone(),
            ),
            inserts: InsertPath::new(store, config.collection.as_str(), sender.clone()),
            state: ReadingState::default(),
            notices: NoticeBroadcaster::new(),
            cache,
            sender,
            receiver,
            config,
        })
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Handle for posting events from callbacks.
    pub fn events(&self) -> EventSender {
        self.sender.clone()
    }

    pub fn state(&self) -> &ReadingState {
        &self.state
    }

    pub fn subscriptions(&self) -> &SubscriptionManager {
        &self.subscriptions
    }

    pub fn pending_inserts(&self) -> usize {
        self.inserts.pending()
    }

    pub fn stats(&self) -> LibraryStats {
        LibraryStats::from_records(&self.state.library_records)
    }

    /// Identity stored by the previous session, if a cache is configured.
    pub fn cached_identity(&self) -> Option<Identity> {
        let cache = self.cache.as_ref()?;
        cache.load_identity().unwrap_or_else(|e| {
            warn!(error = %e, "could not read cached identity");
            None
        })
    }

    pub fn listen(&mut self) -> NoticeListener {
        self.notices.listen(self.config.notice_buffer)
    }

    pub fn unlisten(&mut self, id: ListenerId) {
        self.notices.unlisten(id);
    }

    /// Apply an action.
    ///
    /// Identity actions also retarget the library subscription, exactly as
    /// an [`SyncEvent::IdentityChanged`] would.
    pub fn dispatch(&mut self, action: Action) {
        match action {
            Action::SetIdentity(identity) => self.change_identity(Some(identity)),
            Action::ClearIdentity => self.change_identity(None),
            other => self.apply(other),
        }
    }

    /// Add a book to the current user's library.
    ///
    /// The record appears once the store confirms the write; the outcome is
    /// also reported to listeners.
    pub fn add_book(&mut self, book: &BookSummary, mood: MoodAnnotation) -> Result<InsertTicket> {
        let owner_id = self
            .state
            .identity
            .as_ref()
            .map(|i| i.id.clone())
            .ok_or(StoreError::NotSignedIn)?;

        self.inserts
            .begin(NewRecord::new(owner_id, book, mood, Timestamp::now()))
    }

    /// Apply one event. Returns false for [`SyncEvent::Shutdown`].
    pub fn handle(&mut self, event: SyncEvent) -> bool {
        match event {
            SyncEvent::IdentityChanged(identity) => self.change_identity(identity),

            SyncEvent::Snapshot {
                generation,
                documents,
            } => {
                if let Some(records) = self.subscriptions.accept(generation, documents) {
                    self.apply(Action::SetRecords(records));
                }
            }

            SyncEvent::SubscriptionError { generation, error } => {
                self.subscriptions.on_error(generation, &error);
            }

            SyncEvent::InsertFinished {
                ticket,
                record,
                result,
            } => {
                let outcome = self
                    .inserts
                    .resolve(self.state.owner_id(), ticket, record, result);
                self.finish_insert(outcome);
            }

            SyncEvent::Shutdown => return false,
        }
        true
    }

    /// Apply every queued event without blocking. Returns how many were
    /// applied.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.receiver.try_recv() {
            applied += 1;
            if !self.handle(event) {
                break;
            }
        }
        applied
    }

    /// Apply events until `deadline` or a shutdown event.
    pub fn run_until(&mut self, deadline: Instant) -> usize {
        let mut applied = 0;
        loop {
            let timeout = deadline.saturating_duration_since(Instant::now());
            match self.receiver.recv_timeout(timeout) {
                Ok(event) => {
                    applied += 1;
                    if !self.handle(event) {
                        break;
                    }
                }
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        applied
    }

    /// Apply events until a shutdown event, then release the subscription.
    pub fn run(&mut self) {
        while let Ok(event) = self.receiver.recv() {
            if !self.handle(event) {
                break;
            }
        }
        self.shutdown();
    }

    /// Release the library subscription.
    pub fn shutdown(&mut self) {
        self.subscriptions.shutdown();
    }

    /// Identity changes tear down first, then clear, then resubscribe.
    fn change_identity(&mut self, next: Option<Identity>) {
        let next_owner = next.as_ref().map(|i| i.id.clone());

        if self.subscriptions.release_unless(next_owner.as_deref()) {
            self.apply(Action::SetRecords(Vec::new()));
        }

        match next {
            Some(identity) => {
                info!(user = %identity.id, "identity set");
                self.apply(Action::SetIdentity(identity));
            }
            None => {
                info!("identity cleared");
                self.apply(Action::ClearIdentity);
            }
        }

        if let Some(owner) = next_owner {
            if self.subscriptions.phase() == SubscriptionPhase::Idle {
                self.seed_from_cache(&owner);
                if let Err(e) = self.subscriptions.subscribe(&owner) {
                    debug!(owner = %owner, error = %e, "subscribe deferred to next identity event");
                }
            }
        }
    }

    /// Show cached records for `owner` until the first snapshot arrives.
    fn seed_from_cache(&mut self, owner: &str) {
        let Some(cache) = &self.cache else {
            return;
        };

        let mut records = match cache.load_records() {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "could not read cached library");
                return;
            }
        };
        records.retain(|r| r.owner_id == owner);
        if records.is_empty() {
            return;
        }

        sort_newest_first(&mut records);
        debug!(owner, count = records.len(), "library seeded from cache");
        self.apply(Action::SetRecords(records));
    }

    fn finish_insert(&mut self, outcome: InsertOutcome) {
        match outcome {
            InsertOutcome::Confirmed { ticket, record } => {
                info!(?ticket, id = %record.id, "insert confirmed");
                let record_id = record.id.clone();
                self.apply(Action::AddRecordOptimistic(record));
                self.notices.broadcast(SyncNotice::Inserted { ticket, record_id });
            }
            InsertOutcome::Failed {
                ticket,
                title,
                error,
            } => {
                warn!(?ticket, error = %error, "insert failed");
                self.notices.broadcast(SyncNotice::InsertFailed {
                    ticket,
                    title,
                    message: error.to_string(),
                });
            }
            InsertOutcome::Discarded { ticket, title } => {
                warn!(?ticket, "insert finished after identity change; result ignored");
                self.notices
                    .broadcast(SyncNotice::InsertDiscarded { ticket, title });
            }
        }
    }

    /// Reduce, persist, and notify.
    fn apply(&mut self, action: Action) {
        let persist_user = matches!(action, Action::SetIdentity(_) | Action::ClearIdentity);
        let persist_books = matches!(
            action,
            Action::SetRecords(_) | Action::AddRecordOptimistic(_) | Action::ClearIdentity
        );

        let state = std::mem::take(&mut self.state);
        self.state = reduce(state, action);

        if let Some(cache) = &self.cache {
            if persist_user {
                if let Err(e) = cache.save_identity(self.state.identity.as_ref()) {
                    warn!(error = %e, "could not cache identity");
                }
            }
            if persist_books {
                if let Err(e) = cache.save_records(&self.state.library_records) {
                    warn!(error = %e, "could not cache library");
                }
            }
        }

        self.notices
            .broadcast(SyncNotice::StateChanged(self.state.clone()));
    }
}
