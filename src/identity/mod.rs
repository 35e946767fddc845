mod memory;
mod password;
mod postgres;

pub use memory::MemoryIdentityProvider;
pub use password::{hash_password, verify_password};
pub use postgres::PgIdentityProvider;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

pub const SESSION_TTL_DAYS: i64 = 7;

/// Account behind a live session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub email: String,
    pub verified: bool,
    /// Role flag stored with the account; an alternative to the configured allow-list.
    pub admin_claim: bool,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub token: Uuid,
    pub expires_at: DateTime<Utc>,
    pub identity: Identity,
}

#[derive(Debug)]
pub enum AuthError {
    InvalidCredential,
    UserNotFound,
    WrongPassword,
    Backend(String),
}

impl AuthError {
    /// Stable failure code, translated for the login form by [`login_error_message`].
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::InvalidCredential => "invalid-credential",
            AuthError::UserNotFound => "user-not-found",
            AuthError::WrongPassword => "wrong-password",
            AuthError::Backend(_) => "internal-error",
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::Backend(message) => write!(f, "identity backend error: {message}"),
            other => write!(f, "authentication failed: {}", other.code()),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        AuthError::Backend(err.to_string())
    }
}

pub fn login_error_message(code: &str) -> &'static str {
    match code {
        "invalid-credential" | "wrong-password" | "user-not-found" => "Invalid email or password",
        "too-many-requests" => "Too many failed attempts. Please try again later.",
        _ => "Something went wrong. Please try again.",
    }
}

/// Email/password sign-in and session bookkeeping.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    /// Identity for a session token, or `None` when the session is unknown or expired.
    async fn resolve(&self, token: Uuid) -> Result<Option<Identity>, AuthError>;

    async fn sign_out(&self, token: Uuid) -> Result<(), AuthError>;

    /// Creates a verified account unless one already exists. Returns whether it created one.
    async fn ensure_account(
        &self,
        email: &str,
        password: &str,
        admin_claim: bool,
    ) -> Result<bool, AuthError>;
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_map_to_friendly_messages() {
        for code in ["invalid-credential", "wrong-password", "user-not-found"] {
            assert_eq!(login_error_message(code), "Invalid email or password");
        }
        assert_eq!(
            login_error_message("too-many-requests"),
            "Too many failed attempts. Please try again later."
        );
        assert_eq!(
            login_error_message("network-request-failed"),
            "Something went wrong. Please try again."
        );
        assert_eq!(
            login_error_message(AuthError::Backend("boom".into()).code()),
            "Something went wrong. Please try again."
        );
    }

    #[test]
    fn emails_are_normalized() {
        assert_eq!(normalize_email("  Admin@Example.COM "), "admin@example.com");
    }
}
