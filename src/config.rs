use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{AppError, Result};
use crate::feed::sources::{self, BLOCKED_PUBLISHERS, BLOCKED_URL_PATTERNS};
use crate::feed::{FeedSettings, FeedSource};
use crate::lifecycle::LifecyclePolicy;
use crate::models::Category;
use crate::services::ImageSettings;

const API_KEY_ENV: &str = "OPENROUTER_API_KEY";
const DB_PATH_ENV: &str = "NEWSBLITZ_DB_PATH";

const FALLBACK_PLACEHOLDER_IMAGE: &str = "https://media.istockphoto.com/id/1409309637/vector/breaking-news-label-banner-isolated-vector-design.jpg?s=2048x2048&w=is&k=20&c=rHMT7lr46TFGxQqLQHvSGD6r79AIeTVng-KYA6J1XKM=";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: String,

    #[serde(default = "default_blocked_url_patterns")]
    pub blocked_url_patterns: Vec<String>,

    #[serde(default = "default_blocked_publishers")]
    pub blocked_publishers: Vec<String>,

    #[serde(default)]
    pub summarizer: SummarizerConfig,

    #[serde(default)]
    pub lifecycle: LifecycleConfig,

    #[serde(default)]
    pub pipeline: PipelineConfig,

    #[serde(default)]
    pub images: ImageConfig,

    #[serde(default = "default_feeds")]
    pub feeds: Vec<FeedConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizerConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub api_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    /// Minimum spacing between requests across all workers.
    pub min_interval_ms: u64,
    pub request_timeout_secs: u64,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: "https://openrouter.ai/api/v1/chat/completions".to_string(),
            model: "xiaomi/mimo-v2-flash:free".to_string(),
            temperature: 0.3,
            max_tokens: 200,
            max_attempts: 4,
            base_delay_ms: 1_000,
            max_delay_ms: 30_000,
            min_interval_ms: 1_000,
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    pub expire_hours: i64,
    pub gone_hours: i64,
    pub delete_hours: i64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            expire_hours: 48,
            gone_hours: 7 * 24,
            delete_hours: 30 * 24,
        }
    }
}

impl LifecycleConfig {
    pub fn policy(&self) -> Result<LifecyclePolicy> {
        LifecyclePolicy::new(
            chrono::Duration::hours(self.expire_hours),
            chrono::Duration::hours(self.gone_hours),
            chrono::Duration::hours(self.delete_hours),
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub workers: usize,
    pub max_per_feed: usize,
    pub min_content_length: usize,
    pub min_title_length: usize,
    pub feed_timeout_secs: u64,
    /// Per-request timeout for article pages.
    pub content_request_timeout_secs: u64,
    /// Per-request timeout for image lookups.
    pub image_request_timeout_secs: u64,
    pub content_timeout_secs: u64,
    pub image_timeout_secs: u64,
    pub summary_timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            max_per_feed: 10,
            min_content_length: 100,
            min_title_length: 10,
            feed_timeout_secs: 15,
            content_request_timeout_secs: 15,
            image_request_timeout_secs: 15,
            content_timeout_secs: 45,
            image_timeout_secs: 20,
            summary_timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    pub min_width: u32,
    pub placeholder_url: String,
    /// Publisher domain to a house image used when nothing better is found.
    pub publisher_defaults: HashMap<String, String>,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            min_width: 300,
            placeholder_url: FALLBACK_PLACEHOLDER_IMAGE.to_string(),
            publisher_defaults: HashMap::from([
                (
                    "reuters.com".to_string(),
                    "https://www.reuters.com/pf/resources/images/reuters/reuters-default.png"
                        .to_string(),
                ),
                (
                    "bloomberg.com".to_string(),
                    "https://assets.bwbx.io/s3/javelin/public/javelin/images/bloomberg_default.png"
                        .to_string(),
                ),
            ]),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    pub category: String,
    pub name: String,
    pub url: String,
}

fn default_db_path() -> String {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("newsblitz");
    std::fs::create_dir_all(&data_dir).ok();
    data_dir.join("news.db").to_string_lossy().to_string()
}

fn default_blocked_url_patterns() -> Vec<String> {
    BLOCKED_URL_PATTERNS.iter().map(|p| p.to_string()).collect()
}

fn default_blocked_publishers() -> Vec<String> {
    BLOCKED_PUBLISHERS.iter().map(|p| p.to_string()).collect()
}

fn default_feeds() -> Vec<FeedConfig> {
    sources::default_feeds()
        .into_iter()
        .map(|f| FeedConfig {
            category: f.category.to_string(),
            name: f.name,
            url: f.url,
        })
        .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            blocked_url_patterns: default_blocked_url_patterns(),
            blocked_publishers: default_blocked_publishers(),
            summarizer: SummarizerConfig::default(),
            lifecycle: LifecycleConfig::default(),
            pipeline: PipelineConfig::default(),
            images: ImageConfig::default(),
            feeds: default_feeds(),
        }
    }
}

impl Config {
    /// Load from `path`, or from the default location when `None`. A missing
    /// file is created with defaults. Environment overrides apply last.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = path.map(Path::to_path_buf).unwrap_or_else(Self::config_path);

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            let config = Config::default();
            config.save(&config_path)?;
            tracing::info!(path = %config_path.display(), "Wrote default config");
            config
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("newsblitz")
            .join("config.toml")
    }

    fn apply_env_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(key) = var(API_KEY_ENV).filter(|k| !k.trim().is_empty()) {
            self.summarizer.api_key = Some(key);
        }
        if let Some(path) = var(DB_PATH_ENV).filter(|p| !p.trim().is_empty()) {
            self.db_path = path;
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.summarizer_api_key()?;

        if self.summarizer.api_url.trim().is_empty() {
            return Err(AppError::Config("summarizer.api_url must not be empty".to_string()));
        }
        if self.summarizer.max_attempts == 0 {
            return Err(AppError::Config("summarizer.max_attempts must be at least 1".to_string()));
        }
        if self.pipeline.workers == 0 {
            return Err(AppError::Config("pipeline.workers must be at least 1".to_string()));
        }

        self.lifecycle.policy()?;
        self.feed_sources()?;
        Ok(())
    }

    pub fn summarizer_api_key(&self) -> Result<&str> {
        self.summarizer
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                AppError::Config(format!(
                    "{} is not set (environment or summarizer.api_key)",
                    API_KEY_ENV
                ))
            })
    }

    pub fn feed_sources(&self) -> Result<Vec<FeedSource>> {
        self.feeds
            .iter()
            .map(|feed| {
                Ok(FeedSource {
                    category: feed.category.parse::<Category>()?,
                    name: feed.name.clone(),
                    url: feed.url.clone(),
                })
            })
            .collect()
    }

    pub fn feed_settings(&self) -> FeedSettings {
        FeedSettings {
            max_per_feed: self.pipeline.max_per_feed,
            min_title_length: self.pipeline.min_title_length,
            blocked_url_patterns: self.blocked_url_patterns.clone(),
            request_timeout: Duration::from_secs(self.pipeline.feed_timeout_secs),
        }
    }

    pub fn image_settings(&self) -> ImageSettings {
        ImageSettings {
            min_width: self.images.min_width,
            placeholder_url: self.images.placeholder_url.clone(),
            publisher_defaults: self.images.publisher_defaults.clone(),
            blocked_publishers: self.blocked_publishers.clone(),
            request_timeout: Duration::from_secs(self.pipeline.image_request_timeout_secs),
        }
    }
}
