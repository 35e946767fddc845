use super::{Article, ArticleStatus, ArticleStore, StoreResult};

/// Outcome of a slug lookup. A finished lookup is either a hit or a definite miss.
#[derive(Debug, Clone)]
pub enum SlugLookup {
    Found(Article),
    NotFound,
}

/// Published articles, newest first.
pub async fn list_approved(store: &dyn ArticleStore) -> StoreResult<Vec<Article>> {
    let articles = store.list_by_status(&ArticleStatus::Approved).await?;
    // Backends filter by status already; keep the published-only guarantee local.
    Ok(articles
        .into_iter()
        .filter(Article::is_approved)
        .collect())
}

/// Articles waiting for moderation, newest first.
pub async fn list_pending(store: &dyn ArticleStore) -> StoreResult<Vec<Article>> {
    store.list_by_status(&ArticleStatus::Pending).await
}

/// Scans the whole collection and returns the first article carrying `slug`.
///
/// Slugs are not unique; when two records share one the oldest record wins and the
/// other is unreachable through this lookup.
pub async fn find_by_slug(store: &dyn ArticleStore, slug: &str) -> StoreResult<SlugLookup> {
    let articles = store.list_all().await?;
    Ok(articles
        .into_iter()
        .find(|article| article.slug == slug)
        .map(SlugLookup::Found)
        .unwrap_or(SlugLookup::NotFound))
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    use super::*;
    use crate::articles::{memory::MemoryArticleStore, model::Category};

    fn article(slug: &str, status: ArticleStatus, age_hours: i64) -> Article {
        Article {
            id: Uuid::new_v4(),
            title: slug.to_string(),
            slug: slug.to_string(),
            content: "text".to_string(),
            category: Category::Seo,
            cover_image: "https://img.example/x.png".to_string(),
            author: "Grace".to_string(),
            status,
            created_at: Utc::now() - Duration::hours(age_hours),
            approved_at: None,
            approved_by: None,
            views: 0,
            tags: Vec::new(),
        }
    }

    #[tokio::test]
    async fn list_approved_excludes_pending_and_orders_by_recency() {
        let store = MemoryArticleStore::with_articles(vec![
            article("old", ArticleStatus::Approved, 48),
            article("draft", ArticleStatus::Pending, 1),
            article("new", ArticleStatus::Approved, 2),
            article("odd", ArticleStatus::from_str("archived"), 3),
        ]);

        let listed = list_approved(&store).await.unwrap();
        let slugs: Vec<&str> = listed.iter().map(|a| a.slug.as_str()).collect();
        assert_eq!(slugs, vec!["new", "old"]);
        assert!(listed.iter().all(|a| a.status != ArticleStatus::Pending));
    }

    #[tokio::test]
    async fn list_pending_only_returns_drafts() {
        let store = MemoryArticleStore::with_articles(vec![
            article("live", ArticleStatus::Approved, 5),
            article("draft", ArticleStatus::Pending, 1),
        ]);

        let pending = list_pending(&store).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].slug, "draft");
    }

    #[tokio::test]
    async fn find_by_slug_distinguishes_hit_from_miss() {
        let first = article("shared", ArticleStatus::Approved, 3);
        let shadowed = article("shared", ArticleStatus::Approved, 1);
        let first_id = first.id;
        let store = MemoryArticleStore::with_articles(vec![first, shadowed]);

        match find_by_slug(&store, "shared").await.unwrap() {
            SlugLookup::Found(found) => assert_eq!(found.id, first_id),
            SlugLookup::NotFound => panic!("expected a match"),
        }

        assert!(matches!(
            find_by_slug(&store, "missing").await.unwrap(),
            SlugLookup::NotFound
        ));
    }
}
