use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::db::ArticleStore;
use crate::error::Result;

use super::policy::LifecyclePolicy;

/// Affected-row counts from one sweep. Advisory only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub expired: usize,
    pub deleted: usize,
}

/// Moves stored articles through expired and deleted.
///
/// A sweep is a batch of independent conditional statements rather than a
/// transaction. A failing step is logged and contributes zero; later steps
/// still run.
pub struct LifecycleManager {
    store: Arc<dyn ArticleStore>,
    policy: LifecyclePolicy,
}

impl LifecycleManager {
    pub fn new(store: Arc<dyn ArticleStore>, policy: LifecyclePolicy) -> Self {
        Self { store, policy }
    }

    pub async fn run_sweep(&self, now: DateTime<Utc>) -> SweepReport {
        let expire_cutoff = now - self.policy.expire_after();
        let delete_cutoff = now - self.policy.delete_after();

        let expired = step("expire_due", self.store.expire_due(now).await)
            + step("expire_legacy", self.store.expire_legacy(expire_cutoff).await);
        let deleted = step("delete_due", self.store.delete_due(now).await)
            + step("delete_legacy", self.store.delete_legacy(delete_cutoff).await);

        info!(expired, deleted, "Lifecycle sweep finished");
        SweepReport { expired, deleted }
    }
}

fn step(name: &'static str, result: Result<usize>) -> usize {
    match result {
        Ok(affected) => affected,
        Err(e) => {
            warn!(step = name, error = %e, "Lifecycle sweep step failed");
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{sample_record, FailingStore};
    use crate::db::Repository;
    use crate::models::Category;
    use async_trait::async_trait;
    use chrono::Duration;
    use std::sync::Mutex;

    fn record_anchored_at(url: &str, anchor: DateTime<Utc>) -> crate::models::ArticleRecord {
        let mut record = sample_record(url, &format!("fp-{}", url));
        record.published_at = Some(anchor);
        record.created_at = anchor;
        record.lifecycle = LifecyclePolicy::default().dates_from(anchor);
        record
    }

    async fn seeded_repo(now: DateTime<Utc>) -> Arc<Repository> {
        let repo = Repository::open_in_memory().await.unwrap();
        for (url, age) in [
            ("fresh", Duration::hours(1)),
            ("stale", Duration::hours(50)),
            ("gone", Duration::days(10)),
            ("ancient", Duration::days(31)),
        ] {
            repo.insert_article(record_anchored_at(url, now - age))
                .await
                .unwrap();
        }
        Arc::new(repo)
    }

    #[tokio::test]
    async fn test_sweep_expires_and_deletes() {
        let now = Utc::now();
        let repo = seeded_repo(now).await;
        let manager = LifecycleManager::new(repo.clone(), LifecyclePolicy::default());

        let report = manager.run_sweep(now).await;

        // stale, gone and ancient are past expiry; ancient is also past deletion.
        assert_eq!(report, SweepReport { expired: 3, deleted: 1 });
        assert_eq!(repo.count().await.unwrap(), 3);

        let active = repo.list_active(None, 10).await.unwrap();
        let urls: Vec<_> = active.iter().map(|a| a.article_url.as_str()).collect();
        assert_eq!(urls, vec!["fresh"]);
    }

    #[tokio::test]
    async fn test_sweep_is_idempotent() {
        let now = Utc::now();
        let repo = seeded_repo(now).await;
        let manager = LifecycleManager::new(repo, LifecyclePolicy::default());

        let first = manager.run_sweep(now).await;
        assert_ne!(first, SweepReport::default());

        let second = manager.run_sweep(now).await;
        assert_eq!(second, SweepReport { expired: 0, deleted: 0 });
    }

    #[tokio::test]
    async fn test_legacy_rows_use_fallbacks() {
        let now = Utc::now();
        let repo = Repository::open_in_memory().await.unwrap();
        let old = crate::models::format_timestamp(now - Duration::days(3));
        let very_old = crate::models::format_timestamp(now - Duration::days(40));

        // Rows written before lifecycle columns existed.
        let inserts = [
            format!(
                "INSERT INTO news_articles (article_url, category, title, summary, source, published_at, created_at) \
                 VALUES ('legacy-expire', 'Finance', 't', 's', 'src', '{old}', '{old}')"
            ),
            format!(
                "INSERT INTO news_articles (article_url, category, title, summary, source, published_at, created_at) \
                 VALUES ('legacy-delete', 'Finance', 't', 's', 'src', '{very_old}', '{very_old}')"
            ),
            format!(
                "INSERT INTO news_articles (article_url, category, title, summary, source, created_at) \
                 VALUES ('legacy-undated', 'Finance', 't', 's', 'src', '{very_old}')"
            ),
        ];
        for sql in inserts {
            repo.execute_raw(sql).await.unwrap();
        }

        let manager = LifecycleManager::new(Arc::new(repo), LifecyclePolicy::default());
        let report = manager.run_sweep(now).await;

        // legacy-expire and legacy-delete are both past the 48h fallback;
        // legacy-undated has no published_at so only the deletion fallback applies.
        assert_eq!(report, SweepReport { expired: 2, deleted: 2 });
        assert_eq!(manager.run_sweep(now).await, SweepReport::default());
    }

    #[tokio::test]
    async fn test_failing_store_yields_zero_counts() {
        let manager = LifecycleManager::new(Arc::new(FailingStore), LifecyclePolicy::default());
        assert_eq!(manager.run_sweep(Utc::now()).await, SweepReport::default());
    }

    /// Fails the first step only, recording which steps ran.
    struct FlakyStore {
        calls: Mutex<Vec<&'static str>>,
    }

    #[async_trait]
    impl ArticleStore for FlakyStore {
        async fn url_exists(&self, _: &str) -> Result<bool> {
            Ok(false)
        }
        async fn fingerprint_exists(&self, _: &str) -> Result<bool> {
            Ok(false)
        }
        async fn insert_article(&self, _: crate::models::ArticleRecord) -> Result<i64> {
            Ok(1)
        }
        async fn expire_due(&self, _: DateTime<Utc>) -> Result<usize> {
            self.calls.lock().unwrap().push("expire_due");
            Err(crate::error::AppError::Other(anyhow::anyhow!("timeout")))
        }
        async fn expire_legacy(&self, _: DateTime<Utc>) -> Result<usize> {
            self.calls.lock().unwrap().push("expire_legacy");
            Ok(2)
        }
        async fn delete_due(&self, _: DateTime<Utc>) -> Result<usize> {
            self.calls.lock().unwrap().push("delete_due");
            Ok(3)
        }
        async fn delete_legacy(&self, _: DateTime<Utc>) -> Result<usize> {
            self.calls.lock().unwrap().push("delete_legacy");
            Ok(0)
        }
        async fn list_active(
            &self,
            _: Option<Category>,
            _: usize,
        ) -> Result<Vec<crate::models::Article>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_failed_step_does_not_abort_sweep() {
        let store = Arc::new(FlakyStore {
            calls: Mutex::new(Vec::new()),
        });
        let manager = LifecycleManager::new(store.clone(), LifecyclePolicy::default());

        let report = manager.run_sweep(Utc::now()).await;

        assert_eq!(report, SweepReport { expired: 2, deleted: 3 });
        assert_eq!(
            *store.calls.lock().unwrap(),
            vec!["expire_due", "expire_legacy", "delete_due", "delete_legacy"]
        );
    }
}
