use url::Url;

/// Host of a URL without a leading `www.`; empty when the URL does not parse.
pub fn domain(article_url: &str) -> String {
    Url::parse(article_url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.trim_start_matches("www.").to_string()))
        .unwrap_or_default()
}

/// Whether the URL belongs to a news aggregator rather than the publisher.
pub fn is_aggregator_url(article_url: &str, blocked_patterns: &[String]) -> bool {
    let lower = article_url.to_lowercase();
    blocked_patterns
        .iter()
        .any(|pattern| lower.contains(&pattern.to_lowercase()))
}

/// An absolute http(s) URL that is not an aggregator link.
pub fn is_valid_article_url(article_url: &str, blocked_patterns: &[String]) -> bool {
    let has_scheme = article_url.starts_with("http://") || article_url.starts_with("https://");
    has_scheme && !is_aggregator_url(article_url, blocked_patterns)
}

/// Resolve a possibly relative or protocol-relative URL against the page it
/// appeared on.
pub fn resolve_url(href: &str, base_url: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    if href.starts_with("http://") || href.starts_with("https://") {
        return Some(href.to_string());
    }
    if let Some(rest) = href.strip_prefix("//") {
        return Some(format!("https://{}", rest));
    }

    Url::parse(base_url)
        .ok()
        .and_then(|base| base.join(href).ok())
        .map(|u| u.to_string())
}
