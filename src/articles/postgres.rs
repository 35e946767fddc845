use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{
    model::{Article, ArticleRow, ArticleStatus, NewArticle},
    store::{ArticleStore, StoreResult},
};

const ARTICLE_COLUMNS: &str = "id, title, slug, content, category, cover_image, author, status, created_at, approved_at, approved_by, views, tags";

#[derive(Clone)]
pub struct PgArticleStore {
    pool: PgPool,
}

impl PgArticleStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ArticleStore for PgArticleStore {
    fn backend_tag(&self) -> &'static str {
        "postgres"
    }

    async fn create(&self, article: NewArticle) -> StoreResult<Article> {
        let row = sqlx::query_as::<_, ArticleRow>(&format!(
            "INSERT INTO articles (id, title, slug, content, category, cover_image, author, status, views, tags)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 0, '{{}}')
             RETURNING {ARTICLE_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&article.title)
        .bind(&article.slug)
        .bind(&article.content)
        .bind(article.category.as_str())
        .bind(&article.cover_image)
        .bind(&article.author)
        .bind(ArticleStatus::Pending.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<Article>> {
        let row = sqlx::query_as::<_, ArticleRow>(&format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Article::from))
    }

    async fn list_all(&self) -> StoreResult<Vec<Article>> {
        let rows = sqlx::query_as::<_, ArticleRow>(&format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles ORDER BY created_at ASC, id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Article::from).collect())
    }

    async fn list_by_status(&self, status: &ArticleStatus) -> StoreResult<Vec<Article>> {
        let rows = sqlx::query_as::<_, ArticleRow>(&format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles WHERE status = $1 ORDER BY created_at DESC"
        ))
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Article::from).collect())
    }

    async fn approve(&self, id: Uuid, approver: &str) -> StoreResult<Option<Article>> {
        let row = sqlx::query_as::<_, ArticleRow>(&format!(
            "UPDATE articles SET status = $2, approved_at = NOW(), approved_by = $3
             WHERE id = $1
             RETURNING {ARTICLE_COLUMNS}"
        ))
        .bind(id)
        .bind(ArticleStatus::Approved.as_str())
        .bind(approver)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Article::from))
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM articles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
