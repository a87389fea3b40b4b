//! Remote document store boundary.
//!
//! The store holds per-user library documents and pushes the full matching
//! set to subscribers whenever it changes:
//! - `subscribe` returns an [`Unsubscribe`] handle that ends delivery
//! - `insert` reports the assigned id through a completion callback
//!
//! [`MemoryStore`] is an in-process implementation.

mod memory;
mod types;

pub use memory::{MemoryStore, SubscriptionId};
pub use types::{
    Document, ErrorCallback, InsertCallback, OwnerFilter, RemoteStore, SnapshotCallback,
    Unsubscribe, OWNER_FIELD,
};
