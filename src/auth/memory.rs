//! In-process authentication provider for development and tests.

use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use super::provider::{AuthProvider, IdentityCallback, ProviderError, ProviderUser, Registration};

/// Minimum password length the provider itself enforces.
const PROVIDER_MIN_PASSWORD_LEN: usize = 6;

struct Account {
    uid: String,
    display_name: String,
    password: String,
    disabled: bool,
}

impl Account {
    fn user(&self, email: &str) -> ProviderUser {
        ProviderUser {
            uid: self.uid.clone(),
            display_name: Some(self.display_name.clone()),
            email: Some(email.to_string()),
        }
    }
}

#[derive(Default)]
struct Inner {
    /// Accounts by email.
    accounts: RwLock<HashMap<String, Account>>,
    current: Mutex<Option<ProviderUser>>,
    listeners: RwLock<HashMap<u64, IdentityCallback>>,
    next_uid: AtomicU64,
    next_listener: AtomicU64,
}

impl Inner {
    fn set_current(&self, user: Option<ProviderUser>) {
        *self.current.lock() = user.clone();

        let listeners: Vec<IdentityCallback> =
            self.listeners.read().values().map(Arc::clone).collect();
        for listener in listeners {
            listener(user.clone());
        }
    }
}

/// Email/password accounts kept in memory.
///
/// Listeners are called synchronously on the thread that changed the
/// session, and once on registration with the current session.
#[derive(Clone, Default)]
pub struct MemoryAuthProvider {
    inner: Arc<Inner>,
}

impl MemoryAuthProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an account without signing in. Returns its uid.
    pub fn add_account(&self, display_name: &str, email: &str, password: &str) -> String {
        let uid = format!("uid-{}", self.inner.next_uid.fetch_add(1, Ordering::SeqCst) + 1);
        self.inner.accounts.write().insert(
            email.to_string(),
            Account {
                uid: uid.clone(),
                display_name: display_name.to_string(),
                password: password.to_string(),
                disabled: false,
            },
        );
        uid
    }

    /// Disable an account; an active session for it ends.
    pub fn disable(&self, email: &str) {
        let uid = match self.inner.accounts.write().get_mut(email) {
            Some(account) => {
                account.disabled = true;
                account.uid.clone()
            }
            None => return,
        };

        let signed_in = self
            .inner
            .current
            .lock()
            .as_ref()
            .is_some_and(|user| user.uid == uid);
        if signed_in {
            self.inner.set_current(None);
        }
    }

    /// End the current session as if it had expired.
    pub fn expire_session(&self) {
        self.inner.set_current(None);
    }

    pub fn current_user(&self) -> Option<ProviderUser> {
        self.inner.current.lock().clone()
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.read().len()
    }

    fn unregister(inner: &Weak<Inner>, id: u64) {
        if let Some(inner) = inner.upgrade() {
            inner.listeners.write().remove(&id);
        }
    }
}

impl AuthProvider for MemoryAuthProvider {
    fn sign_in(&self, email: &str, password: &str) -> Result<ProviderUser, ProviderError> {
        let user = {
            let accounts = self.inner.accounts.read();
            let account = accounts
                .get(email)
                .ok_or_else(|| ProviderError::new("auth/user-not-found", "no such account"))?;
            if account.disabled {
                return Err(ProviderError::new("auth/user-disabled", "account disabled"));
            }
            if account.password != password {
                return Err(ProviderError::new("auth/wrong-password", "password mismatch"));
            }
            account.user(email)
        };

        self.inner.set_current(Some(user.clone()));
        Ok(user)
    }

    fn sign_up(
        &self,
        display_name: &str,
        email: &str,
        password: &str,
    ) -> Result<ProviderUser, ProviderError> {
        if !email.contains('@') {
            return Err(ProviderError::new("auth/invalid-email", "malformed email"));
        }
        if password.chars().count() < PROVIDER_MIN_PASSWORD_LEN {
            return Err(ProviderError::new("auth/weak-password", "password too short"));
        }
        if self.inner.accounts.read().contains_key(email) {
            return Err(ProviderError::new(
                "auth/email-already-in-use",
                "account exists",
            ));
        }

        self.add_account(display_name, email, password);
        self.sign_in(email, password)
    }

    fn sign_out(&self) -> Result<(), ProviderError> {
        self.inner.set_current(None);
        Ok(())
    }

    fn on_identity_change(&self, callback: IdentityCallback) -> Registration {
        let id = self.inner.next_listener.fetch_add(1, Ordering::SeqCst);
        self.inner.listeners.write().insert(id, Arc::clone(&callback));

        callback(self.current_user());

        let weak = Arc::downgrade(&self.inner);
        Registration::new(move || MemoryAuthProvider::unregister(&weak, id))
    }
}
