pub mod memory;
pub mod model;
pub mod postgres;
pub mod repository;
pub mod store;

pub use memory::MemoryArticleStore;
pub use model::{Article, ArticleStatus, Category, NewArticle};
pub use postgres::PgArticleStore;
pub use repository::{SlugLookup, find_by_slug, list_approved, list_pending};
pub use store::{ArticleStore, StoreError, StoreResult};
