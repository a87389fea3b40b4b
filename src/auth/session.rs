//! Credential validation in front of the provider.

use crate::error::AuthError;
use crate::types::Identity;
use std::sync::Arc;
use tracing::{info, warn};

use super::provider::{AuthProvider, ProviderError};
use super::watcher::normalize;

/// Shortest password accepted before asking the provider.
pub const MIN_PASSWORD_LEN: usize = 3;

/// Validates form input locally, then calls the provider.
///
/// Session changes that follow a successful call also reach the
/// [`IdentityWatcher`](super::IdentityWatcher); the identity returned here
/// is for immediate feedback only.
#[derive(Clone)]
pub struct Authenticator {
    provider: Arc<dyn AuthProvider>,
}

impl Authenticator {
    pub fn new(provider: Arc<dyn AuthProvider>) -> Self {
        Self { provider }
    }

    pub fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let email = email.trim();
        if email.is_empty() || password.trim().is_empty() {
            return Err(AuthError::MissingFields);
        }

        let user = self
            .provider
            .sign_in(email, password)
            .map_err(|e| map_provider_error("sign_in", e))?;

        info!(user = %user.uid, "signed in");
        Ok(normalize(&user))
    }

    pub fn sign_up(&self, name: &str, email: &str, password: &str) -> Result<Identity, AuthError> {
        let name = name.trim();
        let email = email.trim();
        if name.is_empty() || email.is_empty() || password.trim().is_empty() {
            return Err(AuthError::MissingFields);
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword);
        }

        let user = self
            .provider
            .sign_up(name, email, password)
            .map_err(|e| map_provider_error("sign_up", e))?;

        info!(user = %user.uid, "account created");
        Ok(normalize(&user))
    }

    pub fn sign_out(&self) -> Result<(), AuthError> {
        self.provider
            .sign_out()
            .map_err(|e| map_provider_error("sign_out", e))
    }
}

fn map_provider_error(operation: &str, error: ProviderError) -> AuthError {
    warn!(operation, code = %error.code, message = %error.message, "auth provider rejected request");
    AuthError::from_code(&error.code)
}
