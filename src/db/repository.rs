use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, ErrorCode, Row};
use tokio_rusqlite::Connection;

use crate::error::{AppError, Result};
use crate::models::{format_timestamp, parse_timestamp, Article, ArticleRecord, Category};

use super::schema::SCHEMA;
use super::store::ArticleStore;

const ARTICLE_COLUMNS: &str = "id, article_url, story_fingerprint, category, title, summary, \
     image_url, source, published_at, expired, expired_at, gone_at, deleted_at, created_at";

/// SQLite-backed `news_articles` store.
pub struct Repository {
    conn: Connection,
}

impl Repository {
    pub async fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path).await?;
        Self::init(conn).await
    }

    pub async fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().await?;
        Self::init(conn).await
    }

    async fn init(conn: Connection) -> Result<Self> {
        conn.call(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;

        Ok(Self { conn })
    }

    async fn exists(&self, sql: &'static str, value: String) -> Result<bool> {
        let exists = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(sql)?;
                Ok(stmt.exists(params![value])?)
            })
            .await?;
        Ok(exists)
    }

    async fn execute_with_cutoff(&self, sql: &'static str, cutoff: DateTime<Utc>) -> Result<usize> {
        let cutoff = format_timestamp(cutoff);
        let affected = self
            .conn
            .call(move |conn| Ok(conn.execute(sql, params![cutoff])?))
            .await?;
        Ok(affected)
    }

    #[cfg(test)]
    pub async fn execute_raw(&self, sql: String) -> Result<usize> {
        let affected = self
            .conn
            .call(move |conn| Ok(conn.execute(&sql, [])?))
            .await?;
        Ok(affected)
    }

    #[cfg(test)]
    pub async fn count(&self) -> Result<i64> {
        let count = self
            .conn
            .call(|conn| {
                Ok(conn.query_row("SELECT COUNT(*) FROM news_articles", [], |row| {
                    row.get(0)
                })?)
            })
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl ArticleStore for Repository {
    async fn url_exists(&self, article_url: &str) -> Result<bool> {
        self.exists(
            "SELECT 1 FROM news_articles WHERE article_url = ?1 LIMIT 1",
            article_url.to_string(),
        )
        .await
    }

    async fn fingerprint_exists(&self, fingerprint: &str) -> Result<bool> {
        self.exists(
            "SELECT 1 FROM news_articles WHERE story_fingerprint = ?1 LIMIT 1",
            fingerprint.to_string(),
        )
        .await
    }

    async fn insert_article(&self, record: ArticleRecord) -> Result<i64> {
        let url = record.article.article_url.clone();
        self.conn
            .call(move |conn| {
                let ArticleRecord {
                    article,
                    published_at,
                    lifecycle,
                    expired,
                    created_at,
                } = record;
                conn.execute(
                    r#"INSERT INTO news_articles (
                           article_url, story_fingerprint, category, title, summary, image_url,
                           source, original_content, snippet, published_at, expired,
                           expired_at, gone_at, deleted_at, created_at)
                       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)"#,
                    params![
                        article.article_url,
                        article.story_fingerprint,
                        article.category.as_str(),
                        article.title,
                        article.summary,
                        article.image_url,
                        article.source,
                        article.original_content,
                        article.snippet,
                        published_at.map(format_timestamp),
                        expired,
                        format_timestamp(lifecycle.expired_at),
                        format_timestamp(lifecycle.gone_at),
                        format_timestamp(lifecycle.deleted_at),
                        format_timestamp(created_at),
                    ],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await
            .map_err(|e| match e {
                tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(err, _))
                    if err.code == ErrorCode::ConstraintViolation =>
                {
                    AppError::DuplicateArticle(url)
                }
                other => other.into(),
            })
    }

    async fn expire_due(&self, now: DateTime<Utc>) -> Result<usize> {
        self.execute_with_cutoff(
            "UPDATE news_articles SET expired = 1 WHERE expired_at < ?1 AND expired = 0",
            now,
        )
        .await
    }

    async fn expire_legacy(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        self.execute_with_cutoff(
            r#"UPDATE news_articles SET expired = 1
               WHERE expired_at IS NULL AND published_at < ?1 AND expired = 0"#,
            cutoff,
        )
        .await
    }

    async fn delete_due(&self, now: DateTime<Utc>) -> Result<usize> {
        self.execute_with_cutoff("DELETE FROM news_articles WHERE deleted_at < ?1", now)
            .await
    }

    async fn delete_legacy(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        self.execute_with_cutoff(
            r#"DELETE FROM news_articles
               WHERE deleted_at IS NULL
                 AND (published_at < ?1 OR (published_at IS NULL AND created_at < ?1))"#,
            cutoff,
        )
        .await
    }

    async fn list_active(&self, category: Option<Category>, limit: usize) -> Result<Vec<Article>> {
        let category = category.map(|c| c.as_str().to_string());
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let articles = self
            .conn
            .call(move |conn| {
                let sql = format!(
                    r#"SELECT {ARTICLE_COLUMNS} FROM news_articles
                       WHERE expired = 0 AND (?1 IS NULL OR category = ?1)
                       ORDER BY published_at DESC NULLS LAST, created_at DESC
                       LIMIT ?2"#
                );
                let mut stmt = conn.prepare(&sql)?;
                let articles = stmt
                    .query_map(params![category, limit], article_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(articles)
            })
            .await?;
        Ok(articles)
    }
}

fn timestamp_column(row: &Row, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    Ok(row
        .get::<_, Option<String>>(idx)?
        .and_then(|s| parse_timestamp(&s)))
}

fn article_from_row(row: &Row) -> rusqlite::Result<Article> {
    Ok(Article {
        id: row.get(0)?,
        article_url: row.get(1)?,
        story_fingerprint: row.get(2)?,
        category: row.get(3)?,
        title: row.get(4)?,
        summary: row.get(5)?,
        image_url: row.get(6)?,
        source: row.get(7)?,
        published_at: timestamp_column(row, 8)?,
        expired: row.get::<_, i64>(9)? != 0,
        expired_at: timestamp_column(row, 10)?,
        gone_at: timestamp_column(row, 11)?,
        deleted_at: timestamp_column(row, 12)?,
        created_at: timestamp_column(row, 13)?.unwrap_or_else(Utc::now),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::sample_record;
    use chrono::Duration;
    use tokio_test::assert_ok;

    #[tokio::test]
    async fn test_insert_and_lookup() {
        let repo = Repository::open_in_memory().await.unwrap();
        let record = sample_record("https://example.com/one", "fp-one");

        let id = assert_ok!(repo.insert_article(record).await);
        assert!(id > 0);
        assert!(repo.url_exists("https://example.com/one").await.unwrap());
        assert!(!repo.url_exists("https://example.com/two").await.unwrap());
        assert!(repo.fingerprint_exists("fp-one").await.unwrap());
    }

    #[tokio::test]
    async fn test_unique_url_is_reported_as_duplicate() {
        let repo = Repository::open_in_memory().await.unwrap();
        repo.insert_article(sample_record("https://example.com/one", "fp-one"))
            .await
            .unwrap();

        let err = repo
            .insert_article(sample_record("https://example.com/one", "fp-other"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateArticle(url) if url == "https://example.com/one"));
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unique_fingerprint_is_reported_as_duplicate() {
        let repo = Repository::open_in_memory().await.unwrap();
        repo.insert_article(sample_record("https://a.example.com/story", "same-story"))
            .await
            .unwrap();

        let err = repo
            .insert_article(sample_record("https://b.example.com/story", "same-story"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateArticle(_)));
    }

    #[tokio::test]
    async fn test_list_active_filters_and_orders() {
        let repo = Repository::open_in_memory().await.unwrap();
        let now = Utc::now();

        let mut older = sample_record("https://example.com/older", "fp-older");
        older.published_at = Some(now - Duration::hours(3));
        let mut newer = sample_record("https://example.com/newer", "fp-newer");
        newer.published_at = Some(now - Duration::hours(1));
        let mut expired = sample_record("https://example.com/expired", "fp-expired");
        expired.expired = true;
        let mut sports = sample_record("https://example.com/sports", "fp-sports");
        sports.article.category = Category::Sports;

        for record in [older, newer, expired, sports] {
            repo.insert_article(record).await.unwrap();
        }

        let finance = repo.list_active(Some(Category::Finance), 10).await.unwrap();
        let urls: Vec<_> = finance.iter().map(|a| a.article_url.as_str()).collect();
        assert_eq!(urls, vec!["https://example.com/newer", "https://example.com/older"]);

        let all = repo.list_active(None, 10).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(repo.list_active(None, 1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_file_backed_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("news.db");
        let path = path.to_str().unwrap();

        {
            let repo = Repository::new(path).await.unwrap();
            repo.insert_article(sample_record("https://example.com/kept", "fp-kept"))
                .await
                .unwrap();
        }

        let reopened = Repository::new(path).await.unwrap();
        assert!(reopened.url_exists("https://example.com/kept").await.unwrap());
    }
}
