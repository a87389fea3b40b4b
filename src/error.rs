//! Error types for the sync layer and its collaborators.

use thiserror::Error;

/// Errors from the remote store, the local cache, and the sync controller.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Corruption detected: {0}")]
    Corruption(String),

    #[error("Cache is locked by another process")]
    Locked,

    #[error("Checksum mismatch: expected {expected}, got {got}")]
    ChecksumMismatch { expected: u32, got: u32 },

    #[error("Subscription failed: {0}")]
    Subscription(String),

    #[error("Write failed: {0}")]
    Write(String),

    #[error("No user is signed in")]
    NotSignedIn,

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Authentication failures, closed over the provider's string codes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("missing required fields")]
    MissingFields,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("user not found")]
    UserNotFound,

    #[error("user disabled")]
    UserDisabled,

    #[error("email already in use")]
    EmailInUse,

    #[error("invalid email")]
    InvalidEmail,

    #[error("weak password")]
    WeakPassword,

    #[error("too many requests")]
    TooManyRequests,

    #[error("network error")]
    Network,

    #[error("provider error: {code}")]
    Provider { code: String },
}

impl AuthError {
    /// Map a provider error code (`auth/...`) to a variant.
    pub fn from_code(code: &str) -> Self {
        match code.strip_prefix("auth/").unwrap_or(code) {
            "invalid-credential" | "wrong-password" => AuthError::InvalidCredentials,
            "user-not-found" => AuthError::UserNotFound,
            "user-disabled" => AuthError::UserDisabled,
            "email-already-in-use" => AuthError::EmailInUse,
            "invalid-email" => AuthError::InvalidEmail,
            "weak-password" => AuthError::WeakPassword,
            "too-many-requests" => AuthError::TooManyRequests,
            "network-request-failed" => AuthError::Network,
            _ => AuthError::Provider {
                code: code.to_string(),
            },
        }
    }

    /// Text shown to the user.
    pub fn user_message(&self) -> &'static str {
        match self {
            AuthError::MissingFields => "Please fill in all fields",
            AuthError::InvalidCredentials => "Incorrect email or password",
            AuthError::UserNotFound => "No account found with this email",
            AuthError::UserDisabled => "This account has been disabled",
            AuthError::EmailInUse => "An account with this email already exists",
            AuthError::InvalidEmail => "Please enter a valid email address",
            AuthError::WeakPassword => "Password is too weak",
            AuthError::TooManyRequests => "Too many attempts, please try again later",
            AuthError::Network => "Network error, please check your connection",
            AuthError::Provider { .. } => "Something went wrong, please try again",
        }
    }
}

/// Book-search failures.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Parse error: {0}")]
    Parse(String),
}
