use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{Article, ArticleRecord, Category};

/// Operations the pipeline and the lifecycle sweep need from the article store.
///
/// Every bulk operation is a single conditional statement, so each one is
/// atomic on its own and safe to retry. Returned counts are affected rows.
#[async_trait]
pub trait ArticleStore: Send + Sync {
    async fn url_exists(&self, article_url: &str) -> Result<bool>;

    async fn fingerprint_exists(&self, fingerprint: &str) -> Result<bool>;

    /// Fails with `AppError::DuplicateArticle` when the URL or fingerprint is
    /// already stored.
    async fn insert_article(&self, record: ArticleRecord) -> Result<i64>;

    /// `expired = true` where `expired_at < now` and not yet expired.
    async fn expire_due(&self, now: DateTime<Utc>) -> Result<usize>;

    /// `expired = true` for rows without `expired_at` published before `cutoff`.
    async fn expire_legacy(&self, cutoff: DateTime<Utc>) -> Result<usize>;

    /// Remove rows where `deleted_at < now`.
    async fn delete_due(&self, now: DateTime<Utc>) -> Result<usize>;

    /// Remove rows without `deleted_at` published (or, lacking that, created)
    /// before `cutoff`.
    async fn delete_legacy(&self, cutoff: DateTime<Utc>) -> Result<usize>;

    async fn list_active(&self, category: Option<Category>, limit: usize) -> Result<Vec<Article>>;
}
