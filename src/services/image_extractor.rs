use std::collections::HashMap;
use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use scraper::Html;

use crate::error::Result;
use crate::feed::urls::{domain, resolve_url};

use super::page::{browser_client, fetch_html, first_element, image_sources, meta_content};

const META_IMAGE_KEYS: &[&str] = &["og:image", "twitter:image", "article:image"];
const MAX_INLINE_IMAGES: usize = 5;
const MIN_IMAGE_HEIGHT: u32 = 200;

const INVALID_PATTERNS: &[&str] = &[
    "logo",
    "icon",
    "favicon",
    "avatar",
    "sprite",
    "badge",
    "brand",
    "apple-touch-icon",
    "defaultpromocrop",
    "placeholder",
    "1x1",
    "pixel",
    "tracking",
    "beacon",
    "analytics",
    "spacer",
    "blank",
    "transparent",
    "google.com",
    "googleusercontent.com",
    "gstatic.com",
];

/// Picks a representative image for an article. Always yields a URL.
#[async_trait]
pub trait ImageExtractor: Send + Sync {
    async fn extract_image(&self, url: &str) -> String;

    /// Image used when extraction gives up or runs out of time.
    fn placeholder(&self) -> &str;
}

#[derive(Debug, Clone)]
pub struct ImageSettings {
    pub min_width: u32,
    pub placeholder_url: String,
    /// Publisher domain to its house image.
    pub publisher_defaults: HashMap<String, String>,
    pub blocked_publishers: Vec<String>,
    pub request_timeout: Duration,
}

pub struct HtmlImageExtractor {
    client: Client,
    settings: ImageSettings,
}

impl HtmlImageExtractor {
    pub fn new(settings: ImageSettings) -> Result<Self> {
        Ok(Self {
            client: browser_client(settings.request_timeout)?,
            settings,
        })
    }

    fn publisher_default(&self, key: &str) -> String {
        self.settings
            .publisher_defaults
            .get(key)
            .cloned()
            .unwrap_or_else(|| self.settings.placeholder_url.clone())
    }

    /// Blocked publishers never serve a usable image, so skip the request.
    fn blocked_publisher_image(&self, article_domain: &str) -> Option<String> {
        self.settings
            .blocked_publishers
            .iter()
            .find(|blocked| article_domain.contains(blocked.as_str()))
            .map(|blocked| self.publisher_default(blocked))
    }
}

#[async_trait]
impl ImageExtractor for HtmlImageExtractor {
    async fn extract_image(&self, url: &str) -> String {
        let article_domain = domain(url);

        if let Some(image) = self.blocked_publisher_image(&article_domain) {
            return image;
        }

        if let Some(html) = fetch_html(&self.client, url).await {
            if let Some(image) = find_image(&html, url, self.settings.min_width) {
                return image;
            }
        }

        tracing::debug!(%url, "No usable image found; using fallback");
        self.publisher_default(&article_domain)
    }

    fn placeholder(&self) -> &str {
        &self.settings.placeholder_url
    }
}

/// Best image on the page: social meta tags first, then the first few inline
/// images of the article body.
pub fn find_image(html: &str, page_url: &str, min_width: u32) -> Option<String> {
    let document = Html::parse_document(html);
    let from_meta = META_IMAGE_KEYS.iter().find_map(|key| {
        meta_content(&document, &[*key])
            .and_then(|src| resolve_url(&src, page_url))
            .filter(|img| is_valid_image_url(img, min_width))
    });
    if from_meta.is_some() {
        return from_meta;
    }

    ["article", "main"].iter().find_map(|tag| {
        let region = first_element(&document, &[*tag])?;
        image_sources(region)
            .into_iter()
            .take(MAX_INLINE_IMAGES)
            .filter_map(|src| resolve_url(&src, page_url))
            .find(|img| is_valid_image_url(img, min_width))
    })
}

fn size_param_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)[?&_x-](?:w|width|size)[=_-]?(\d+)").expect("valid size regex")
    })
}

fn dimensions_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+)x(\d+)").expect("valid dimensions regex"))
}

/// Rejects data URIs, icons, tracking pixels, logos and images whose URL
/// advertises a size too small to headline an article.
pub fn is_valid_image_url(img_url: &str, min_width: u32) -> bool {
    if img_url.is_empty() || img_url.starts_with("data:") || img_url.ends_with(".ico") {
        return false;
    }

    let lower = img_url.to_lowercase();
    if INVALID_PATTERNS.iter().any(|p| lower.contains(p)) {
        return false;
    }

    if let Some(width) = size_param_regex()
        .captures(img_url)
        .and_then(|caps| caps[1].parse::<u64>().ok())
    {
        if width < u64::from(min_width) {
            return false;
        }
    }

    if let Some(caps) = dimensions_regex().captures(img_url) {
        let width = caps[1].parse::<u64>().unwrap_or(0);
        let height = caps[2].parse::<u64>().unwrap_or(0);
        if width < u64::from(min_width) || height < u64::from(MIN_IMAGE_HEIGHT) {
            return false;
        }
    }

    true
}
