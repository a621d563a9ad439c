use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::error::AppError;
use crate::lifecycle::LifecyclePolicy;
use crate::models::{parse_timestamp, ArticleRecord, NewArticle};

use super::store::ArticleStore;

/// Turns a processed article into a stored row with its lifecycle fixed.
pub struct ArticleWriter {
    store: Arc<dyn ArticleStore>,
    policy: LifecyclePolicy,
}

impl ArticleWriter {
    pub fn new(store: Arc<dyn ArticleStore>, policy: LifecyclePolicy) -> Self {
        Self { store, policy }
    }

    /// Returns whether the row was stored. Failures, including a lost race
    /// against another worker inserting the same story, are logged only.
    pub async fn insert(&self, article: NewArticle) -> bool {
        self.insert_at(article, Utc::now()).await
    }

    pub async fn insert_at(&self, article: NewArticle, now: DateTime<Utc>) -> bool {
        let record = self.record_for(article, now);
        let url = record.article.article_url.clone();

        match self.store.insert_article(record).await {
            Ok(id) => {
                debug!(id, %url, "Article stored");
                true
            }
            Err(AppError::DuplicateArticle(_)) => {
                debug!(%url, "Insert rejected by unique constraint");
                false
            }
            Err(e) => {
                warn!(%url, error = %e, "Insert failed");
                false
            }
        }
    }

    fn record_for(&self, article: NewArticle, now: DateTime<Utc>) -> ArticleRecord {
        let published_at = article.published_at.as_deref().and_then(parse_timestamp);
        let lifecycle = self
            .policy
            .compute_lifecycle(article.published_at.as_deref(), now);

        ArticleRecord {
            article,
            published_at,
            lifecycle,
            expired: false,
            created_at: now,
        }
    }
}
