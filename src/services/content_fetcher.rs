use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use scraper::Html;

use crate::error::Result;
use crate::models::ExtractedContent;

use super::page::{
    browser_client, document_title, fetch_html, main_region, meta_content, strip_boilerplate,
};

/// Snippets shorter than this are not worth standing in for the article.
const MIN_SNIPPET_FALLBACK: usize = 50;

/// Width handed to html2text; large enough that paragraphs are not wrapped.
const TEXT_WIDTH: usize = 10_000;

/// Turns an article URL into readable text.
#[async_trait]
pub trait ContentExtractor: Send + Sync {
    async fn extract(
        &self,
        url: &str,
        fallback_title: &str,
        fallback_snippet: &str,
    ) -> Option<ExtractedContent>;
}

/// What a single page yielded.
#[derive(Debug, Clone, PartialEq)]
pub struct PageContent {
    pub text: String,
    pub title: Option<String>,
    pub publish_date: Option<String>,
}

pub struct ContentFetcher {
    client: Client,
    min_content_length: usize,
}

impl ContentFetcher {
    pub fn new(request_timeout: Duration, min_content_length: usize) -> Result<Self> {
        Ok(Self {
            client: browser_client(request_timeout)?,
            min_content_length,
        })
    }

    async fn fetch_page(&self, url: &str) -> Option<PageContent> {
        let html = fetch_html(&self.client, url).await?;
        let page = parse_page(&html)?;

        if page.text.chars().count() < self.min_content_length {
            tracing::debug!(%url, chars = page.text.chars().count(), "Extracted content too short");
            return None;
        }
        Some(page)
    }
}

#[async_trait]
impl ContentExtractor for ContentFetcher {
    async fn extract(
        &self,
        url: &str,
        fallback_title: &str,
        fallback_snippet: &str,
    ) -> Option<ExtractedContent> {
        for attempt_url in [url.to_string(), amp_url(url)] {
            if let Some(page) = self.fetch_page(&attempt_url).await {
                return Some(ExtractedContent {
                    text: page.text,
                    title: page.title.unwrap_or_else(|| fallback_title.to_string()),
                    publish_date: page.publish_date,
                });
            }
        }

        let fallback = snippet_fallback(fallback_title, fallback_snippet);
        if fallback.is_some() {
            tracing::debug!(%url, "Using feed snippet in place of article text");
        }
        fallback
    }
}

/// AMP variant of an article URL.
pub fn amp_url(url: &str) -> String {
    if url.contains('?') {
        format!("{}&amp", url)
    } else {
        format!("{}?amp", url)
    }
}

/// Feed title and snippet standing in for the article when no page could be
/// read.
pub fn snippet_fallback(title: &str, snippet: &str) -> Option<ExtractedContent> {
    if snippet.chars().count() < MIN_SNIPPET_FALLBACK {
        return None;
    }
    Some(ExtractedContent {
        text: format!("{}\n\n{}", title, snippet),
        title: title.to_string(),
        publish_date: None,
    })
}

/// Readable text, title and publish date of an article page.
///
/// Text comes from the `<article>` element when there is one, else `<main>`,
/// else the whole body, with navigation and script blocks removed.
pub fn parse_page(html: &str) -> Option<PageContent> {
    let document = Html::parse_document(html);
    let title = meta_content(&document, &["og:title", "twitter:title"])
        .or_else(|| document_title(&document));
    let publish_date = meta_content(
        &document,
        &["article:published_time", "og:published_time", "datePublished", "pubdate"],
    );

    let cleaned = match main_region(&document) {
        Some(region) => strip_boilerplate(region),
        None => html.to_string(),
    };

    let text = match html2text::config::plain().string_from_read(cleaned.as_bytes(), TEXT_WIDTH) {
        Ok(t) => t,
        Err(e) => {
            tracing::debug!(error = %e, "Failed to convert HTML to text");
            return None;
        }
    };

    let text = text
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    Some(PageContent {
        text,
        title,
        publish_date,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARTICLE_PAGE: &str = r#"<!doctype html>
<html><head>
<title>Fallback Title</title>
<meta property="og:title" content="Central bank holds rates steady">
<meta property="article:published_time" content="2024-03-05T10:00:00Z">
<script>var tracking = "ignore me";</script>
</head>
<body>
<header><a href="/">Home</a> <a href="/world">World</a></header>
<article>
  <h1>Central bank holds rates steady</h1>
  <p>The central bank left its benchmark rate unchanged on Tuesday.</p>
  <figure><img src="/chart.png"><figcaption>Chart caption</figcaption></figure>
  <p>Officials said inflation was easing but remained above target.</p>
  <script>console.log("inline")</script>
</article>
<footer>Copyright Example</footer>
</body></html>"#;

    #[test]
    fn test_parse_page_prefers_article_body() {
        let page = parse_page(ARTICLE_PAGE).unwrap();

        assert_eq!(page.title.as_deref(), Some("Central bank holds rates steady"));
        assert_eq!(page.publish_date.as_deref(), Some("2024-03-05T10:00:00Z"));
        assert!(page.text.contains("left its benchmark rate unchanged"));
        assert!(page.text.contains("inflation was easing"));
        assert!(!page.text.contains("console.log"));
        assert!(!page.text.contains("Chart caption"));
        assert!(!page.text.contains("Copyright"));
        assert!(!page.text.contains("\n\n"));
    }

    #[test]
    fn test_parse_page_without_article_uses_title_tag() {
        let page = parse_page("<html><head><title>Only Title</title></head><body><p>Body text.</p></body></html>")
            .unwrap();
        assert_eq!(page.title.as_deref(), Some("Only Title"));
        assert_eq!(page.publish_date, None);
        assert_eq!(page.text, "Body text.");
    }

    #[test]
    fn test_nested_article_keeps_whole_story() {
        let page = parse_page(
            "<html><body><article><p>Lead paragraph.</p>\
             <article><p>Related card</p></article>\
             <p>Second half of the real story.</p></article></body></html>",
        )
        .unwrap();
        assert!(page.text.contains("Lead paragraph."));
        assert!(page.text.contains("Second half of the real story."));
    }

    #[test]
    fn test_amp_url() {
        assert_eq!(amp_url("https://example.com/a"), "https://example.com/a?amp");
        assert_eq!(amp_url("https://example.com/a?id=1"), "https://example.com/a?id=1&amp");
    }

    #[test]
    fn test_snippet_fallback_requires_fifty_chars() {
        let snippet = "x".repeat(49);
        assert!(snippet_fallback("Title", &snippet).is_none());

        let snippet = "y".repeat(50);
        let content = snippet_fallback("Title", &snippet).unwrap();
        assert_eq!(content.text, format!("Title\n\n{}", snippet));
        assert_eq!(content.title, "Title");
        assert_eq!(content.publish_date, None);
    }

    #[tokio::test]
    async fn test_unreachable_page_falls_back_to_snippet() {
        let fetcher = ContentFetcher::new(Duration::from_secs(2), 100).unwrap();
        let snippet = "A snippet long enough to stand in for the unreachable article.";

        let content = fetcher
            .extract("http://127.0.0.1:1/story", "Feed Title", snippet)
            .await
            .unwrap();
        assert_eq!(content.text, format!("Feed Title\n\n{}", snippet));
        assert_eq!(content.title, "Feed Title");

        assert!(fetcher
            .extract("http://127.0.0.1:1/story", "Feed Title", "too short")
            .await
            .is_none());
    }
}
