//! Authentication provider boundary.

use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// User object as reported by the provider, before normalization.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProviderUser {
    pub uid: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
}

/// A provider failure carrying the provider's string code (`auth/...`).
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct ProviderError {
    pub code: String,
    pub message: String,
}

impl ProviderError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Receives the current user (or `None`) whenever the session changes.
pub type IdentityCallback = Arc<dyn Fn(Option<ProviderUser>) + Send + Sync>;

/// Handle returned by [`AuthProvider::on_identity_change`].
///
/// Unregisters exactly once, on [`Registration::unregister`] or drop.
pub struct Registration(Option<Box<dyn FnOnce() + Send>>);

impl Registration {
    pub fn new(f: impl FnOnce() + Send + 'static) -> Self {
        Registration(Some(Box::new(f)))
    }

    pub fn unregister(mut self) {
        if let Some(f) = self.0.take() {
            f();
        }
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        if let Some(f) = self.0.take() {
            f();
        }
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("live", &self.0.is_some())
            .finish()
    }
}

/// An external service issuing user sessions.
pub trait AuthProvider: Send + Sync {
    fn sign_in(&self, email: &str, password: &str) -> Result<ProviderUser, ProviderError>;

    fn sign_up(
        &self,
        display_name: &str,
        email: &str,
        password: &str,
    ) -> Result<ProviderUser, ProviderError>;

    fn sign_out(&self) -> Result<(), ProviderError>;

    /// Register for session changes. Providers report the current session
    /// once shortly after registration, then on every change.
    fn on_identity_change(&self, callback: IdentityCallback) -> Registration;
}
