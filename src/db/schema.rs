pub const SCHEMA: &str = r#"
-- news_articles table
CREATE TABLE IF NOT EXISTS news_articles (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    article_url TEXT NOT NULL UNIQUE,
    story_fingerprint TEXT UNIQUE,
    category TEXT NOT NULL,
    title TEXT NOT NULL,
    summary TEXT NOT NULL,
    image_url TEXT,
    source TEXT NOT NULL,
    original_content TEXT,
    snippet TEXT,
    published_at TEXT,
    expired INTEGER NOT NULL DEFAULT 0,
    expired_at TEXT,
    gone_at TEXT,
    deleted_at TEXT,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
);

CREATE INDEX IF NOT EXISTS idx_news_articles_expired_at ON news_articles(expired_at);
CREATE INDEX IF NOT EXISTS idx_news_articles_deleted_at ON news_articles(deleted_at);
CREATE INDEX IF NOT EXISTS idx_news_articles_category_expired ON news_articles(category, expired);
CREATE INDEX IF NOT EXISTS idx_news_articles_published_at ON news_articles(published_at DESC);
"#;
