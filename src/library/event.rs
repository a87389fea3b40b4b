//! Events posted to the controller by external callbacks.

use crate::error::{Result, StoreError};
use crate::remote::Document;
use crate::types::{Identity, NewRecord, RecordId};
use crossbeam_channel::Sender;
use std::fmt;

/// Tag distinguishing successive subscription instances.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(pub u64);

impl fmt::Debug for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Gen({})", self.0)
    }
}

/// Identifies one call to `add_book` until its write resolves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct InsertTicket(pub u64);

/// Everything that can happen outside the controller.
#[derive(Debug)]
pub enum SyncEvent {
    /// The auth provider reported a session (`None` = signed out).
    IdentityChanged(Option<Identity>),

    /// Full matching document set for the subscription `generation`.
    Snapshot {
        generation: Generation,
        documents: Vec<Document>,
    },

    /// The subscription `generation` reported a failure.
    SubscriptionError {
        generation: Generation,
        error: StoreError,
    },

    /// A remote write finished. `record.owner_id` is the identity that
    /// started it.
    InsertFinished {
        ticket: InsertTicket,
        record: NewRecord,
        result: Result<RecordId>,
    },

    /// Stop `SyncController::run`.
    Shutdown,
}

/// Cloneable handle for posting [`SyncEvent`]s.
#[derive(Clone, Debug)]
pub struct EventSender(Sender<SyncEvent>);

impl EventSender {
    pub(crate) fn new(sender: Sender<SyncEvent>) -> Self {
        EventSender(sender)
    }

    /// Post an event. Returns false once the controller is gone.
    pub fn send(&self, event: SyncEvent) -> bool {
        self.0.send(event).is_ok()
    }

    pub fn identity_changed(&self, identity: Option<Identity>) -> bool {
        self.send(SyncEvent::IdentityChanged(identity))
    }

    pub fn shutdown(&self) -> bool {
        self.send(SyncEvent::Shutdown)
    }
}
