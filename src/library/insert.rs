//! Optimistic insert path.

use crate::error::{Result, StoreError};
use crate::remote::RemoteStore;
use crate::types::{LibraryRecord, NewRecord, RecordId};
use std::sync::Arc;
use tracing::debug;

use super::event::{EventSender, InsertTicket, SyncEvent};

/// How a finished write should be applied.
#[derive(Debug)]
pub enum InsertOutcome {
    /// Write confirmed for the identity still signed in.
    Confirmed {
        ticket: InsertTicket,
        record: LibraryRecord,
    },
    /// Write failed for the identity still signed in.
    Failed {
        ticket: InsertTicket,
        title: String,
        error: StoreError,
    },
    /// The identity changed while the write was in flight.
    Discarded {
        ticket: InsertTicket,
        title: String,
    },
}

/// Issues remote writes and matches their completions to the identity that
/// started them.
pub struct InsertPath {
    store: Arc<dyn RemoteStore>,
    collection: String,
    events: EventSender,
    next_ticket: u64,
    pending: usize,
}

impl InsertPath {
    pub fn new(store: Arc<dyn RemoteStore>, collection: impl Into<String>, events: EventSender) -> Self {
        Self {
            store,
            collection: collection.into(),
            events,
            next_ticket: 1,
            pending: 0,
        }
    }

    /// Writes started but not yet resolved.
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Start writing `record`. Completion arrives as
    /// [`SyncEvent::InsertFinished`].
    pub fn begin(&mut self, record: NewRecord) -> Result<InsertTicket> {
        let document = serde_json::to_value(&record)?;
        let ticket = InsertTicket(self.next_ticket);
        self.next_ticket += 1;
        self.pending += 1;

        debug!(?ticket, owner = %record.owner_id, title = %record.title, "insert started");

        let events = self.events.clone();
        self.store.insert(
            &self.collection,
            document,
            Box::new(move |result| {
                events.send(SyncEvent::InsertFinished {
                    ticket,
                    record,
                    result,
                });
            }),
        );

        Ok(ticket)
    }

    /// Match a completion against the identity signed in now.
    pub fn resolve(
        &mut self,
        current_owner: Option<&str>,
        ticket: InsertTicket,
        record: NewRecord,
        result: Result<RecordId>,
    ) -> InsertOutcome {
        self.pending = self.pending.saturating_sub(1);

        if current_owner != Some(record.owner_id.as_str()) {
            return InsertOutcome::Discarded {
                ticket,
                title: record.title,
            };
        }

        match result {
            Ok(id) => InsertOutcome::Confirmed {
                ticket,
                record: record.into_record(id),
            },
            Err(error) => InsertOutcome::Failed {
                ticket,
                title: record.title,
                error,
            },
        }
    }
}
