//! Reactive library sync.
//!
//! This module keeps the reading state consistent with the remote store:
//! - [`state`]: the reducer, the only writer of [`ReadingState`]
//! - [`SubscriptionManager`]: one live subscription per identity
//! - [`InsertPath`]: remote writes applied optimistically on success
//! - [`SyncController`]: owns all of the above and the event queue
//!
//! # Example
//!
//! ```ignore
//! let store = Arc::new(MemoryStore::new());
//! let mut controller = SyncController::new(store, SyncConfig::default())?;
//! let _watcher = IdentityWatcher::start(&provider, controller.events());
//!
//! let notices = controller.listen();
//! loop {
//!     controller.run_until(Instant::now() + Duration::from_millis(16));
//!     for notice in notices.drain() {
//!         render(notice);
//!     }
//! }
//! ```

mod controller;
mod event;
mod insert;
mod notify;
pub mod state;
mod subscription;

pub use controller::{SyncConfig, SyncController};
pub use event::{EventSender, Generation, InsertTicket, SyncEvent};
pub use insert::{InsertOutcome, InsertPath};
pub use notify::{
    DropReason, ListenerId, NoticeBroadcaster, NoticeListener, SyncNotice, DEFAULT_NOTICE_BUFFER,
};
pub use state::{reduce, Action, ReadingState};
pub use subscription::{decode_document, SubscriptionManager, SubscriptionPhase};
