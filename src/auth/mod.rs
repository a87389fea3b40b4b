//! Authentication boundary.
//!
//! - [`AuthProvider`] is the external service issuing sessions
//! - [`IdentityWatcher`] relays its session changes into the sync queue
//! - [`Authenticator`] validates credentials before they reach the provider

mod memory;
mod provider;
mod session;
mod watcher;

pub use memory::MemoryAuthProvider;
pub use provider::{AuthProvider, IdentityCallback, ProviderError, ProviderUser, Registration};
pub use session::{Authenticator, MIN_PASSWORD_LEN};
pub use watcher::{normalize, IdentityWatcher};
