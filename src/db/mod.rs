mod repository;
mod schema;
mod store;
mod writer;

pub use repository::Repository;
pub use store::ArticleStore;
pub use writer::ArticleWriter;

#[cfg(test)]
pub mod test_support {
    use async_trait::async_trait;
    use chrono::{DateTime, Duration, Utc};

    use super::ArticleStore;
    use crate::error::{AppError, Result};
    use crate::models::{Article, ArticleRecord, Category, LifecycleDates, NewArticle};

    pub fn sample_article(url: &str, fingerprint: &str) -> NewArticle {
        NewArticle {
            category: Category::Finance,
            title: "Markets rally after rate decision".to_string(),
            summary: "Stocks rose after the central bank held rates.".to_string(),
            image_url: "https://cdn.example.com/photo-1200x800.jpg".to_string(),
            source: "Example News".to_string(),
            published_at: None,
            article_url: url.to_string(),
            story_fingerprint: fingerprint.to_string(),
            original_content: "Full article body".to_string(),
            snippet: "Short snippet".to_string(),
        }
    }

    /// A freshly ingested, still active record anchored at the current time.
    pub fn sample_record(url: &str, fingerprint: &str) -> ArticleRecord {
        let now = Utc::now();
        ArticleRecord {
            article: sample_article(url, fingerprint),
            published_at: None,
            lifecycle: LifecycleDates {
                expired_at: now + Duration::hours(48),
                gone_at: now + Duration::days(7),
                deleted_at: now + Duration::days(30),
            },
            expired: false,
            created_at: now,
        }
    }

    /// Store whose every operation fails, as if the database were unreachable.
    pub struct FailingStore;

    fn unavailable<T>() -> Result<T> {
        Err(AppError::Other(anyhow::anyhow!("store unavailable")))
    }

    #[async_trait]
    impl ArticleStore for FailingStore {
        async fn url_exists(&self, _article_url: &str) -> Result<bool> {
            unavailable()
        }

        async fn fingerprint_exists(&self, _fingerprint: &str) -> Result<bool> {
            unavailable()
        }

        async fn insert_article(&self, _record: ArticleRecord) -> Result<i64> {
            unavailable()
        }

        async fn expire_due(&self, _now: DateTime<Utc>) -> Result<usize> {
            unavailable()
        }

        async fn expire_legacy(&self, _cutoff: DateTime<Utc>) -> Result<usize> {
            unavailable()
        }

        async fn delete_due(&self, _now: DateTime<Utc>) -> Result<usize> {
            unavailable()
        }

        async fn delete_legacy(&self, _cutoff: DateTime<Utc>) -> Result<usize> {
            unavailable()
        }

        async fn list_active(
            &self,
            _category: Option<Category>,
            _limit: usize,
        ) -> Result<Vec<Article>> {
            unavailable()
        }
    }
}
