use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use feed_rs::model::Entry;
use feed_rs::parser;
use futures::stream::{self, StreamExt};
use regex::Regex;
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::error::{AppError, Result};
use crate::models::{format_timestamp, Candidate, Category};

use super::urls::is_valid_article_url;

const USER_AGENT: &str = "newsblitz-ingest/1.0";
const CONCURRENT_FEEDS: usize = 5;

/// A publisher feed configured for one category.
#[derive(Debug, Clone)]
pub struct FeedSource {
    pub category: Category,
    pub name: String,
    pub url: String,
}

/// Produces the candidate articles for one ingestion run.
#[async_trait]
pub trait CandidateSource: Send + Sync {
    async fn fetch_candidates(&self) -> Vec<Candidate>;
}

#[derive(Debug, Clone)]
pub struct FeedSettings {
    pub max_per_feed: usize,
    pub min_title_length: usize,
    pub blocked_url_patterns: Vec<String>,
    pub request_timeout: Duration,
}

pub struct FeedFetcher {
    client: Client,
    sources: Vec<FeedSource>,
    settings: FeedSettings,
}

impl FeedFetcher {
    pub fn new(sources: Vec<FeedSource>, settings: FeedSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.request_timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            sources,
            settings,
        })
    }

    pub async fn fetch_feed(&self, source: &FeedSource) -> Result<Vec<Candidate>> {
        let response = self.client.get(&source.url).send().await?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!("Failed to fetch feed: HTTP {}", response.status()).into());
        }

        let bytes = response.bytes().await?;
        self.parse_feed(&bytes[..], source)
    }

    /// Parse a feed document into candidates, keeping at most `max_per_feed`
    /// entries and dropping aggregator links and too-short titles.
    pub fn parse_feed(&self, bytes: &[u8], source: &FeedSource) -> Result<Vec<Candidate>> {
        let feed = parser::parse(bytes)?;

        Ok(feed
            .entries
            .into_iter()
            .take(self.settings.max_per_feed)
            .filter_map(|entry| self.candidate_from_entry(entry, source))
            .collect())
    }

    fn candidate_from_entry(&self, entry: Entry, source: &FeedSource) -> Option<Candidate> {
        let link = entry
            .links
            .first()
            .map(|l| l.href.trim().to_string())
            .unwrap_or_default();
        if link.is_empty() || !is_valid_article_url(&link, &self.settings.blocked_url_patterns) {
            debug!(%link, feed = %source.name, "Skipping entry with unusable link");
            return None;
        }

        let title = entry
            .title
            .map(|t| t.content.trim().to_string())
            .unwrap_or_default();
        if title.chars().count() < self.settings.min_title_length {
            debug!(%title, feed = %source.name, "Skipping entry with short title");
            return None;
        }

        let snippet_html = entry
            .summary
            .map(|s| s.content)
            .or_else(|| entry.content.and_then(|c| c.body))
            .unwrap_or_default();

        Some(Candidate {
            title,
            link,
            snippet: strip_tags(&snippet_html),
            published_at: entry.published.or(entry.updated).map(format_timestamp),
            source: source.name.clone(),
            category: source.category,
        })
    }

    /// Fetch every configured feed concurrently. Feeds that fail are logged
    /// and contribute nothing.
    pub async fn fetch_all(&self) -> Vec<Candidate> {
        let results: Vec<Vec<Candidate>> = stream::iter(0..self.sources.len())
            .map(|i| {
                let source = &self.sources[i];
                async move {
                    match self.fetch_feed(source).await {
                        Ok(candidates) => {
                            info!(
                                feed = %source.name,
                                category = %source.category,
                                count = candidates.len(),
                                "Fetched feed"
                            );
                            candidates
                        }
                        Err(e) => {
                            warn!(feed = %source.name, url = %source.url, error = %e, "Failed to fetch feed");
                            Vec::new()
                        }
                    }
                }
            })
            .buffer_unordered(CONCURRENT_FEEDS)
            .collect()
            .await;

        results.into_iter().flatten().collect()
    }
}

#[async_trait]
impl CandidateSource for FeedFetcher {
    async fn fetch_candidates(&self) -> Vec<Candidate> {
        self.fetch_all().await
    }
}

fn tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]+>").expect("valid tag regex"))
}

/// Drop markup and collapse whitespace.
pub fn strip_tags(html: &str) -> String {
    tag_regex()
        .replace_all(html, " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
