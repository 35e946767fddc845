use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    model::{Article, ArticleStatus, NewArticle},
    store::{ArticleStore, StoreResult},
};

/// Process-local article store used for local runs and tests.
#[derive(Default)]
pub struct MemoryArticleStore {
    articles: RwLock<Vec<Article>>,
}

impl MemoryArticleStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn with_articles(articles: Vec<Article>) -> Self {
        Self {
            articles: RwLock::new(articles),
        }
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.articles.read().await.len()
    }
}

#[async_trait]
impl ArticleStore for MemoryArticleStore {
    fn backend_tag(&self) -> &'static str {
        "memory"
    }

    async fn create(&self, article: NewArticle) -> StoreResult<Article> {
        let record = Article {
            id: Uuid::new_v4(),
            title: article.title,
            slug: article.slug,
            content: article.content,
            category: article.category,
            cover_image: article.cover_image,
            author: article.author,
            status: ArticleStatus::Pending,
            created_at: Utc::now(),
            approved_at: None,
            approved_by: None,
            views: 0,
            tags: Vec::new(),
        };

        self.articles.write().await.push(record.clone());
        Ok(record)
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<Article>> {
        let guard = self.articles.read().await;
        Ok(guard.iter().find(|article| article.id == id).cloned())
    }

    async fn list_all(&self) -> StoreResult<Vec<Article>> {
        let mut articles = self.articles.read().await.clone();
        articles.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(articles)
    }

    async fn list_by_status(&self, status: &ArticleStatus) -> StoreResult<Vec<Article>> {
        let guard = self.articles.read().await;
        let mut matching: Vec<Article> = guard
            .iter()
            .filter(|article| &article.status == status)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matching)
    }

    async fn approve(&self, id: Uuid, approver: &str) -> StoreResult<Option<Article>> {
        let mut guard = self.articles.write().await;
        let Some(article) = guard.iter_mut().find(|article| article.id == id) else {
            return Ok(None);
        };

        article.status = ArticleStatus::Approved;
        article.approved_at = Some(Utc::now());
        article.approved_by = Some(approver.to_string());
        Ok(Some(article.clone()))
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let mut guard = self.articles.write().await;
        let before = guard.len();
        guard.retain(|article| article.id != id);
        Ok(guard.len() != before)
    }
}
