use std::sync::Arc;

use tracing::{debug, warn};

use crate::db::ArticleStore;

/// Existing-article checks run before any expensive work on a candidate.
///
/// Lookups fail open: a store error is logged and the candidate is treated as
/// new. The worst case is one wasted extraction and summary, after which the
/// store's unique constraints reject the insert.
#[derive(Clone)]
pub struct Deduplicator {
    store: Arc<dyn ArticleStore>,
}

impl Deduplicator {
    pub fn new(store: Arc<dyn ArticleStore>) -> Self {
        Self { store }
    }

    pub async fn is_duplicate(&self, article_url: &str) -> bool {
        match self.store.url_exists(article_url).await {
            Ok(exists) => {
                if exists {
                    debug!(url = %article_url, "Duplicate article URL");
                }
                exists
            }
            Err(e) => {
                warn!(url = %article_url, error = %e, "URL duplicate check failed; continuing");
                false
            }
        }
    }

    pub async fn is_duplicate_fingerprint(&self, fingerprint: &str) -> bool {
        match self.store.fingerprint_exists(fingerprint).await {
            Ok(exists) => {
                if exists {
                    debug!(%fingerprint, "Duplicate story fingerprint");
                }
                exists
            }
            Err(e) => {
                warn!(%fingerprint, error = %e, "Fingerprint duplicate check failed; continuing");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{sample_record, FailingStore};
    use crate::db::Repository;

    #[tokio::test]
    async fn test_lookup_failure_fails_open() {
        let dedup = Deduplicator::new(Arc::new(FailingStore));

        assert!(!dedup.is_duplicate("https://example.com/story").await);
        assert!(!dedup.is_duplicate_fingerprint("abc").await);
    }

    #[tokio::test]
    async fn test_detects_url_and_fingerprint() {
        let repo = Repository::open_in_memory().await.unwrap();
        let record = sample_record("https://example.com/a", "fp-a");
        repo.insert_article(record).await.unwrap();

        let dedup = Deduplicator::new(Arc::new(repo));
        assert!(dedup.is_duplicate("https://example.com/a").await);
        assert!(!dedup.is_duplicate("https://example.com/b").await);
        assert!(dedup.is_duplicate_fingerprint("fp-a").await);
        assert!(!dedup.is_duplicate_fingerprint("fp-b").await);
    }
}
