use async_trait::async_trait;
use uuid::Uuid;

use super::model::{Article, ArticleStatus, NewArticle};

/// Failure talking to the article store.
#[derive(Debug)]
pub struct StoreError {
    message: String,
}

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "article store error: {}", self.message)
    }
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::new(err.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Document store holding the `articles` collection.
///
/// Each method is a single round trip. Nothing is batched or wrapped in a transaction,
/// so concurrent writers race with last-write-wins semantics.
#[async_trait]
pub trait ArticleStore: Send + Sync {
    fn backend_tag(&self) -> &'static str;

    /// Inserts a pending record; the store assigns `id` and `created_at`.
    async fn create(&self, article: NewArticle) -> StoreResult<Article>;

    async fn get(&self, id: Uuid) -> StoreResult<Option<Article>>;

    /// Every record, oldest `created_at` first with ties broken by `id`.
    async fn list_all(&self) -> StoreResult<Vec<Article>>;

    /// Records with the given status, newest `created_at` first.
    async fn list_by_status(&self, status: &ArticleStatus) -> StoreResult<Vec<Article>>;

    /// Marks a record approved and stamps the approver. Returns `None` for unknown ids.
    async fn approve(&self, id: Uuid, approver: &str) -> StoreResult<Option<Article>>;

    /// Hard-deletes a record. Returns whether anything was removed.
    async fn delete(&self, id: Uuid) -> StoreResult<bool>;
}
