use async_trait::async_trait;
use chrono::{Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{
    AuthError, Identity, IdentityProvider, SESSION_TTL_DAYS, Session, hash_password,
    normalize_email, verify_password,
};

#[derive(sqlx::FromRow)]
struct AccountRow {
    id: Uuid,
    email: String,
    password_hash: String,
    verified: bool,
    is_admin: bool,
}

#[derive(sqlx::FromRow)]
struct IdentityRow {
    id: Uuid,
    email: String,
    verified: bool,
    is_admin: bool,
}

impl From<IdentityRow> for Identity {
    fn from(row: IdentityRow) -> Self {
        Self {
            user_id: row.id,
            email: row.email,
            verified: row.verified,
            admin_claim: row.is_admin,
        }
    }
}

/// Accounts and sessions kept in the `users` and `sessions` tables.
#[derive(Clone)]
pub struct PgIdentityProvider {
    pool: PgPool,
}

impl PgIdentityProvider {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityProvider for PgIdentityProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let email = normalize_email(email);
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::InvalidCredential);
        }

        let account = sqlx::query_as::<_, AccountRow>(
            "SELECT id, email, password_hash, verified, is_admin FROM users WHERE email = $1",
        )
        .bind(&email)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AuthError::UserNotFound)?;

        if !verify_password(password, &account.password_hash) {
            return Err(AuthError::WrongPassword);
        }

        let token = Uuid::new_v4();
        let expires_at = Utc::now() + Duration::days(SESSION_TTL_DAYS);
        sqlx::query("INSERT INTO sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(token)
            .bind(account.id)
            .bind(expires_at)
            .execute(&self.pool)
            .await?;

        Ok(Session {
            token,
            expires_at,
            identity: Identity {
                user_id: account.id,
                email: account.email,
                verified: account.verified,
                admin_claim: account.is_admin,
            },
        })
    }

    async fn resolve(&self, token: Uuid) -> Result<Option<Identity>, AuthError> {
        let row = sqlx::query_as::<_, IdentityRow>(
            "SELECT users.id, users.email, users.verified, users.is_admin FROM sessions JOIN users ON users.id = sessions.user_id WHERE sessions.id = $1 AND sessions.expires_at > NOW()",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Identity::from))
    }

    async fn sign_out(&self, token: Uuid) -> Result<(), AuthError> {
        sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn ensure_account(
        &self,
        email: &str,
        password: &str,
        admin_claim: bool,
    ) -> Result<bool, AuthError> {
        let email = normalize_email(email);
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
            .bind(&email)
            .fetch_one(&self.pool)
            .await?;
        if exists {
            return Ok(false);
        }

        let password_hash = hash_password(password)
            .map_err(|err| AuthError::Backend(format!("failed to hash password: {err}")))?;

        let result = sqlx::query(
            "INSERT INTO users (id, email, password_hash, verified, is_admin) VALUES ($1, $2, $3, TRUE, $4)
             ON CONFLICT (email) DO NOTHING",
        )
        .bind(Uuid::new_v4())
        .bind(&email)
        .bind(password_hash)
        .bind(admin_claim)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
