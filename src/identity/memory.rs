use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    AuthError, Identity, IdentityProvider, SESSION_TTL_DAYS, Session, hash_password,
    normalize_email, verify_password,
};

struct Account {
    identity: Identity,
    password_hash: String,
}

/// Accounts and sessions held in process memory.
#[derive(Default)]
pub struct MemoryIdentityProvider {
    accounts: RwLock<HashMap<String, Account>>,
    sessions: RwLock<HashMap<Uuid, (String, DateTime<Utc>)>>,
}

impl MemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an account whose verification flag is chosen by the caller.
    pub async fn insert_account(
        &self,
        email: &str,
        password: &str,
        verified: bool,
        admin_claim: bool,
    ) -> Result<Identity, AuthError> {
        let email = normalize_email(email);
        let password_hash = hash_password(password)
            .map_err(|err| AuthError::Backend(format!("failed to hash password: {err}")))?;
        let identity = Identity {
            user_id: Uuid::new_v4(),
            email: email.clone(),
            verified,
            admin_claim,
        };

        self.accounts.write().await.insert(
            email,
            Account {
                identity: identity.clone(),
                password_hash,
            },
        );
        Ok(identity)
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let email = normalize_email(email);
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::InvalidCredential);
        }

        let identity = {
            let accounts = self.accounts.read().await;
            let account = accounts.get(&email).ok_or(AuthError::UserNotFound)?;
            if !verify_password(password, &account.password_hash) {
                return Err(AuthError::WrongPassword);
            }
            account.identity.clone()
        };

        let token = Uuid::new_v4();
        let expires_at = Utc::now() + Duration::days(SESSION_TTL_DAYS);
        self.sessions
            .write()
            .await
            .insert(token, (email, expires_at));

        Ok(Session {
            token,
            expires_at,
            identity,
        })
    }

    async fn resolve(&self, token: Uuid) -> Result<Option<Identity>, AuthError> {
        let email = {
            let sessions = self.sessions.read().await;
            match sessions.get(&token) {
                Some((email, expires_at)) if *expires_at > Utc::now() => email.clone(),
                _ => return Ok(None),
            }
        };

        let accounts = self.accounts.read().await;
        Ok(accounts.get(&email).map(|account| account.identity.clone()))
    }

    async fn sign_out(&self, token: Uuid) -> Result<(), AuthError> {
        self.sessions.write().await.remove(&token);
        Ok(())
    }

    async fn ensure_account(
        &self,
        email: &str,
        password: &str,
        admin_claim: bool,
    ) -> Result<bool, AuthError> {
        if self
            .accounts
            .read()
            .await
            .contains_key(&normalize_email(email))
        {
            return Ok(false);
        }

        self.insert_account(email, password, true, admin_claim)
            .await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sign_in_resolve_sign_out_cycle() {
        let provider = MemoryIdentityProvider::new();
        assert!(provider
            .ensure_account("Admin@Example.com", "pw", false)
            .await
            .unwrap());
        assert!(!provider
            .ensure_account("admin@example.com", "other", false)
            .await
            .unwrap());

        let session = provider.sign_in(" admin@example.com ", "pw").await.unwrap();
        assert_eq!(session.identity.email, "admin@example.com");
        assert!(session.identity.verified);

        let resolved = provider.resolve(session.token).await.unwrap();
        assert_eq!(resolved, Some(session.identity.clone()));

        provider.sign_out(session.token).await.unwrap();
        assert!(provider.resolve(session.token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn sign_in_failures_carry_codes() {
        let provider = MemoryIdentityProvider::new();
        provider
            .insert_account("a@b.com", "right", true, false)
            .await
            .unwrap();

        let err = provider.sign_in("a@b.com", "wrong").await.unwrap_err();
        assert_eq!(err.code(), "wrong-password");

        let err = provider.sign_in("x@y.com", "right").await.unwrap_err();
        assert_eq!(err.code(), "user-not-found");

        let err = provider.sign_in("", "").await.unwrap_err();
        assert_eq!(err.code(), "invalid-credential");
    }

    #[tokio::test]
    async fn unknown_tokens_resolve_to_none() {
        let provider = MemoryIdentityProvider::new();
        assert!(provider.resolve(Uuid::new_v4()).await.unwrap().is_none());
    }
}
