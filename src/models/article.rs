use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Fixed topic set every stored article belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "AI")]
    Ai,
    Health,
    Sports,
    Finance,
    Geopolitical,
    Crypto,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Ai,
        Category::Health,
        Category::Sports,
        Category::Finance,
        Category::Geopolitical,
        Category::Crypto,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Ai => "AI",
            Category::Health => "Health",
            Category::Sports => "Sports",
            Category::Finance => "Finance",
            Category::Geopolitical => "Geopolitical",
            Category::Crypto => "Crypto",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AppError::Config(format!("Unknown category: {}", s)))
    }
}

/// An item read from a publisher feed, not yet processed.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub title: String,
    pub link: String,
    pub snippet: String,
    pub published_at: Option<String>,
    pub source: String,
    pub category: Category,
}

/// Readable article text produced by a content extractor.
#[derive(Debug, Clone)]
pub struct ExtractedContent {
    pub text: String,
    pub title: String,
    pub publish_date: Option<String>,
}

/// A fully processed article ready for the store writer.
#[derive(Debug, Clone)]
pub struct NewArticle {
    pub category: Category,
    pub title: String,
    pub summary: String,
    pub image_url: String,
    pub source: String,
    pub published_at: Option<String>,
    pub article_url: String,
    pub story_fingerprint: String,
    pub original_content: String,
    pub snippet: String,
}

/// Timestamps fixed at insert time that drive the article's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleDates {
    pub expired_at: DateTime<Utc>,
    pub gone_at: DateTime<Utc>,
    pub deleted_at: DateTime<Utc>,
}

impl LifecycleDates {
    pub fn state_at(&self, now: DateTime<Utc>) -> ArticleState {
        if now >= self.deleted_at {
            ArticleState::Deleted
        } else if now >= self.gone_at {
            ArticleState::Gone
        } else if now >= self.expired_at {
            ArticleState::Expired
        } else {
            ArticleState::Active
        }
    }
}

/// The row as handed to the store: article fields plus computed lifecycle.
#[derive(Debug, Clone)]
pub struct ArticleRecord {
    pub article: NewArticle,
    pub published_at: Option<DateTime<Utc>>,
    pub lifecycle: LifecycleDates,
    pub expired: bool,
    pub created_at: DateTime<Utc>,
}

/// Visibility of an article to downstream consumers.
///
/// `Gone` articles are answered with HTTP 410 and kept out of sitemaps;
/// `Deleted` rows are due for physical removal by the next sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleState {
    Active,
    Expired,
    Gone,
    Deleted,
}

impl ArticleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArticleState::Active => "active",
            ArticleState::Expired => "expired",
            ArticleState::Gone => "gone",
            ArticleState::Deleted => "deleted",
        }
    }
}

/// A stored article as read back from `news_articles`.
#[derive(Debug, Clone, Serialize)]
pub struct Article {
    pub id: i64,
    pub article_url: String,
    pub story_fingerprint: Option<String>,
    pub category: String,
    pub title: String,
    pub summary: String,
    pub image_url: Option<String>,
    pub source: String,
    pub published_at: Option<DateTime<Utc>>,
    pub expired: bool,
    pub expired_at: Option<DateTime<Utc>>,
    pub gone_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Article {
    /// Legacy rows without lifecycle timestamps are classified only by the
    /// cached `expired` flag.
    pub fn state_at(&self, now: DateTime<Utc>) -> ArticleState {
        match (self.expired_at, self.gone_at, self.deleted_at) {
            (Some(expired_at), Some(gone_at), Some(deleted_at)) => LifecycleDates {
                expired_at,
                gone_at,
                deleted_at,
            }
            .state_at(now),
            _ if self.expired => ArticleState::Expired,
            _ => ArticleState::Active,
        }
    }
}
