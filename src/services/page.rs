//! Fetching publisher pages and pulling simple facts out of their markup.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};

use crate::error::{AppError, Result};

const USER_AGENT_STRING: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";
const ACCEPT_STRING: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";

const NOISE_TAGS: &[&str] = &[
    "script", "style", "noscript", "nav", "header", "footer", "aside", "form", "figure", "iframe",
];

/// HTTP client that presents itself as a desktop browser.
pub fn browser_client(timeout: Duration) -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_STRING));
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_STRING));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));

    Client::builder()
        .timeout(timeout)
        .default_headers(headers)
        .build()
        .map_err(|e| AppError::Extraction(format!("Failed to create HTTP client: {}", e)))
}

/// Body of a successful GET, or `None` on any failure.
pub async fn fetch_html(client: &Client, url: &str) -> Option<String> {
    let response = match client.get(url).send().await {
        Ok(r) => r,
        Err(e) => {
            tracing::debug!(%url, error = %e, "Page request failed");
            return None;
        }
    };

    if !response.status().is_success() {
        tracing::debug!(%url, status = %response.status(), "Page returned error status");
        return None;
    }

    response.text().await.ok()
}

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

/// `content` of the first `<meta>` whose `property` or `name` equals one of
/// `keys`, trying the keys in order.
pub fn meta_content(document: &Html, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        ["property", "name"].iter().find_map(|attr| {
            let sel = selector(&format!(r#"meta[{}="{}"]"#, attr, key))?;
            document.select(&sel).find_map(|el| {
                el.value()
                    .attr("content")
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .map(str::to_string)
            })
        })
    })
}

/// Text of the `<title>` element.
pub fn document_title(document: &Html) -> Option<String> {
    let sel = selector("title")?;
    document
        .select(&sel)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
}

/// First element matching one of `tags`, tried in order.
pub fn first_element<'a>(document: &'a Html, tags: &[&str]) -> Option<ElementRef<'a>> {
    tags.iter().find_map(|tag| {
        let sel = selector(tag)?;
        document.select(&sel).next()
    })
}

/// The part of the page holding the story: `<article>`, else `<main>`, else
/// `<body>`. The outermost article wins when articles nest.
pub fn main_region(document: &Html) -> Option<ElementRef<'_>> {
    first_element(document, &["article", "main", "body"])
}

/// Inner markup of `region` with scripts, navigation, captions and other
/// chrome removed.
pub fn strip_boilerplate(region: ElementRef<'_>) -> String {
    let mut markup = region.inner_html();
    for tag in NOISE_TAGS {
        let Some(sel) = selector(tag) else {
            continue;
        };
        for element in region.select(&sel) {
            markup = markup.replace(&element.html(), "");
        }
    }
    markup
}

/// `src` (or lazy-load `data-src`) of every `<img>` under `region`.
pub fn image_sources(region: ElementRef<'_>) -> Vec<String> {
    let Some(sel) = selector("img") else {
        return Vec::new();
    };
    region
        .select(&sel)
        .filter_map(|img| {
            let attrs = img.value();
            attrs
                .attr("src")
                .map(str::trim)
                .filter(|s| !s.is_empty() && !s.starts_with("data:"))
                .or_else(|| attrs.attr("data-src").map(str::trim))
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        })
        .collect()
}
