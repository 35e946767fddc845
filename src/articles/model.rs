use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArticleStatus {
    Pending,
    Approved,
    Other(Cow<'static, str>),
}

impl ArticleStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ArticleStatus::Pending => "pending",
            ArticleStatus::Approved => "approved",
            ArticleStatus::Other(value) => value.as_ref(),
        }
    }

    pub fn from_str(value: &str) -> Self {
        match value {
            "pending" => ArticleStatus::Pending,
            "approved" => ArticleStatus::Approved,
            other => ArticleStatus::Other(Cow::Owned(other.to_string())),
        }
    }
}

impl Serialize for ArticleStatus {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ArticleStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(ArticleStatus::from_str(&value))
    }
}

/// Topic an article is filed under. Stored values outside the offered set are kept as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Category {
    #[default]
    Seo,
    Ai,
    Ads,
    Marketing,
    Others,
    Custom(Cow<'static, str>),
}

impl Category {
    /// Choices offered by the submission form, in display order.
    pub const OFFERED: [Category; 5] = [
        Category::Seo,
        Category::Ai,
        Category::Ads,
        Category::Marketing,
        Category::Others,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Category::Seo => "SEO",
            Category::Ai => "AI",
            Category::Ads => "Ads",
            Category::Marketing => "Marketing",
            Category::Others => "Others",
            Category::Custom(value) => value.as_ref(),
        }
    }

    pub fn from_str(value: &str) -> Self {
        match value {
            "SEO" => Category::Seo,
            "AI" => Category::Ai,
            "Ads" => Category::Ads,
            "Marketing" => Category::Marketing,
            "Others" => Category::Others,
            other => Category::Custom(Cow::Owned(other.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Article {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub category: Category,
    pub cover_image: String,
    pub author: String,
    pub status: ArticleStatus,
    pub created_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub approved_by: Option<String>,
    pub views: i64,
    pub tags: Vec<String>,
}

impl Article {
    pub fn is_approved(&self) -> bool {
        self.status == ArticleStatus::Approved
    }
}

/// Fields supplied when a pending article is first written to the store.
#[derive(Debug, Clone)]
pub struct NewArticle {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub category: Category,
    pub cover_image: String,
    pub author: String,
}

/// Database row for the `articles` table.
#[derive(Clone, sqlx::FromRow)]
pub struct ArticleRow {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub category: String,
    pub cover_image: String,
    pub author: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub approved_by: Option<String>,
    pub views: i64,
    pub tags: Vec<String>,
}

impl From<ArticleRow> for Article {
    fn from(row: ArticleRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            slug: row.slug,
            content: row.content,
            category: Category::from_str(&row.category),
            cover_image: row.cover_image,
            author: row.author,
            status: ArticleStatus::from_str(&row.status),
            created_at: row.created_at,
            approved_at: row.approved_at,
            approved_by: row.approved_by,
            views: row.views,
            tags: row.tags,
        }
    }
}
