//! Relays provider session changes into the sync event queue.

use crate::library::EventSender;
use crate::types::Identity;
use std::sync::Arc;
use tracing::debug;

use super::provider::{AuthProvider, IdentityCallback, ProviderUser, Registration};

/// Extract a normalized [`Identity`] from a provider user.
///
/// Missing display names fall back to the local part of the email.
pub fn normalize(user: &ProviderUser) -> Identity {
    let email = user.email.clone().unwrap_or_default();
    let display_name = match user.display_name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => email.split('@').next().unwrap_or_default().to_string(),
    };

    Identity {
        id: user.uid.clone(),
        display_name,
        email,
    }
}

/// Holds the single registration with the provider's change channel.
pub struct IdentityWatcher {
    registration: Option<Registration>,
}

impl IdentityWatcher {
    /// Register with `provider`; every change is posted to `events`.
    pub fn start(provider: &dyn AuthProvider, events: EventSender) -> Self {
        let callback: IdentityCallback = Arc::new(move |user: Option<ProviderUser>| {
            let identity = user.as_ref().map(normalize);
            debug!(
                user = identity.as_ref().map(|i| i.id.as_str()),
                "identity change reported"
            );
            events.identity_changed(identity);
        });

        Self {
            registration: Some(provider.on_identity_change(callback)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.registration.is_some()
    }

    /// Unregister from the provider. Safe to call more than once.
    pub fn stop(&mut self) {
        if let Some(registration) = self.registration.take() {
            registration.unregister();
        }
    }
}

impl Drop for IdentityWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}
