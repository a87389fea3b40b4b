//! Notices from the controller to UI listeners.

use crate::types::RecordId;
use crossbeam_channel::{bounded, Receiver, RecvError, RecvTimeoutError, Sender, TryRecvError, TrySendError};
use std::collections::HashMap;
use std::time::Duration;

use super::event::InsertTicket;
use super::state::ReadingState;

/// Default number of notices buffered per listener.
pub const DEFAULT_NOTICE_BUFFER: usize = 256;

/// Messages delivered to listeners.
#[derive(Clone, Debug)]
pub enum SyncNotice {
    /// State after a transition.
    StateChanged(ReadingState),

    /// A book was written and added to the library.
    Inserted {
        ticket: InsertTicket,
        record_id: RecordId,
    },

    /// A book could not be written; the library is unchanged.
    InsertFailed {
        ticket: InsertTicket,
        title: String,
        message: String,
    },

    /// A write finished after the user changed; its result was ignored.
    InsertDiscarded { ticket: InsertTicket, title: String },

    /// The listener was removed.
    Dropped { reason: DropReason },
}

/// Why a listener was dropped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DropReason {
    /// Buffer overflowed (slow consumer).
    BufferOverflow,
    /// Explicitly removed.
    Unlistened,
}

/// Unique identifier for a listener.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Receiving end of a listener.
pub struct NoticeListener {
    pub id: ListenerId,
    pub receiver: Receiver<SyncNotice>,
}

impl NoticeListener {
    /// Receive the next notice (blocking).
    pub fn recv(&self) -> Result<SyncNotice, RecvError> {
        self.receiver.recv()
    }

    /// Try to receive a notice (non-blocking).
    pub fn try_recv(&self) -> Result<SyncNotice, TryRecvError> {
        self.receiver.try_recv()
    }

    /// Receive with timeout.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<SyncNotice, RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Everything currently buffered.
    pub fn drain(&self) -> Vec<SyncNotice> {
        self.receiver.try_iter().collect()
    }
}

/// Fans notices out to bounded listeners, dropping the ones that fall behind.
#[derive(Default)]
pub struct NoticeBroadcaster {
    listeners: HashMap<ListenerId, Sender<SyncNotice>>,
    next_id: u64,
}

impl NoticeBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn listen(&mut self, buffer_size: usize) -> NoticeListener {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        let (sender, receiver) = bounded(buffer_size.max(1));
        self.listeners.insert(id, sender);
        NoticeListener { id, receiver }
    }

    pub fn unlisten(&mut self, id: ListenerId) {
        if let Some(sender) = self.listeners.remove(&id) {
            let _ = sender.try_send(SyncNotice::Dropped {
                reason: DropReason::Unlistened,
            });
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Send `notice` to every listener.
    pub fn broadcast(&mut self, notice: SyncNotice) {
        let mut to_remove = Vec::new();

        for (id, sender) in &self.listeners {
            match sender.try_send(notice.clone()) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                    to_remove.push(*id)
                }
            }
        }

        for id in to_remove {
            if let Some(sender) = self.listeners.remove(&id) {
                // Full buffers usually reject this too.
                let _ = sender.try_send(SyncNotice::Dropped {
                    reason: DropReason::BufferOverflow,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listen_unlisten() {
        let mut notices = NoticeBroadcaster::new();
        let listener = notices.listen(4);
        assert_eq!(notices.listener_count(), 1);

        notices.unlisten(listener.id);
        assert_eq!(notices.listener_count(), 0);
        assert!(matches!(
            listener.try_recv(),
            Ok(SyncNotice::Dropped {
                reason: DropReason::Unlistened
            })
        ));
    }

    #[test]
    fn test_broadcast_reaches_all() {
        let mut notices = NoticeBroadcaster::new();
        let a = notices.listen(4);
        let b = notices.listen(4);

        notices.broadcast(SyncNotice::StateChanged(ReadingState::default()));

        assert!(matches!(a.try_recv(), Ok(SyncNotice::StateChanged(_))));
        assert!(matches!(b.try_recv(), Ok(SyncNotice::StateChanged(_))));
    }

    #[test]
    fn test_drop_slow_listener() {
        let mut notices = NoticeBroadcaster::new();
        let slow = notices.listen(2);

        for _ in 0..5 {
            notices.broadcast(SyncNotice::StateChanged(ReadingState::default()));
        }

        assert_eq!(notices.listener_count(), 0);
        assert_eq!(slow.drain().len(), 2);
    }

    #[test]
    fn test_disconnected_listener_removed() {
        let mut notices = NoticeBroadcaster::new();
        drop(notices.listen(2));

        notices.broadcast(SyncNotice::StateChanged(ReadingState::default()));
        assert_eq!(notices.listener_count(), 0);
    }
}
