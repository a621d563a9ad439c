//! Built-in publisher feeds and blocklists used when the config file does not
//! override them.

use crate::models::Category;

use super::fetcher::FeedSource;

/// Direct publisher feeds only, no aggregators.
const DEFAULT_FEEDS: &[(Category, &str, &str)] = &[
    (Category::Ai, "BBC Technology", "https://feeds.bbci.co.uk/news/technology/rss.xml"),
    (Category::Ai, "The Guardian Tech", "https://www.theguardian.com/technology/rss"),
    (Category::Ai, "Ars Technica", "https://feeds.arstechnica.com/arstechnica/technology-lab"),
    (Category::Ai, "Wired", "https://www.wired.com/feed/rss"),
    (Category::Ai, "MIT Technology Review", "https://www.technologyreview.com/feed/"),
    (Category::Health, "BBC Health", "https://feeds.bbci.co.uk/news/health/rss.xml"),
    (Category::Health, "NPR Health", "https://feeds.npr.org/1128/rss.xml"),
    (Category::Health, "The Guardian Health", "https://www.theguardian.com/society/health/rss"),
    (Category::Health, "WebMD", "https://rssfeeds.webmd.com/rss/rss.aspx?RSSSource=RSS_PUBLIC"),
    (Category::Sports, "BBC Sport", "https://feeds.bbci.co.uk/sport/rss.xml"),
    (Category::Sports, "ESPN", "https://www.espn.com/espn/rss/news"),
    (Category::Sports, "The Guardian Sport", "https://www.theguardian.com/sport/rss"),
    (Category::Sports, "CBS Sports", "https://www.cbssports.com/rss/headlines/"),
    (Category::Finance, "CNBC", "https://www.cnbc.com/id/100003114/device/rss/rss.html"),
    (Category::Finance, "BBC Business", "https://feeds.bbci.co.uk/news/business/rss.xml"),
    (Category::Finance, "The Guardian Business", "https://www.theguardian.com/business/rss"),
    (Category::Finance, "MarketWatch", "https://feeds.marketwatch.com/marketwatch/topstories/"),
    (Category::Geopolitical, "BBC World", "https://feeds.bbci.co.uk/news/world/rss.xml"),
    (Category::Geopolitical, "Al Jazeera", "https://www.aljazeera.com/xml/rss/all.xml"),
    (Category::Geopolitical, "The Guardian World", "https://www.theguardian.com/world/rss"),
    (Category::Geopolitical, "NPR World", "https://feeds.npr.org/1004/rss.xml"),
    (Category::Geopolitical, "AP News", "https://rsshub.app/apnews/topics/world-news"),
    (Category::Crypto, "CoinDesk", "https://www.coindesk.com/arc/outboundfeeds/rss/"),
    (Category::Crypto, "Cointelegraph", "https://cointelegraph.com/rss"),
    (Category::Crypto, "The Block", "https://www.theblock.co/rss.xml"),
    (Category::Crypto, "Decrypt", "https://decrypt.co/feed"),
];

pub const BLOCKED_URL_PATTERNS: &[&str] = &[
    "news.google.com",
    "google.com/url",
    "googleusercontent.com",
    "yahoo.com/news",
    "bing.com/news",
    "msn.com/en-us/news",
    "apple.news",
    "flipboard.com",
];

/// Paywalled publishers whose pages never yield a usable image.
pub const BLOCKED_PUBLISHERS: &[&str] = &["reuters.com", "bloomberg.com", "wsj.com", "ft.com"];

pub fn default_feeds() -> Vec<FeedSource> {
    DEFAULT_FEEDS
        .iter()
        .map(|(category, name, url)| FeedSource {
            category: *category,
            name: name.to_string(),
            url: url.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::urls::is_aggregator_url;

    #[test]
    fn test_every_category_has_feeds() {
        let feeds = default_feeds();
        for category in Category::ALL {
            assert!(feeds.iter().any(|f| f.category == category), "{} has no feeds", category);
        }
    }

    #[test]
    fn test_default_feeds_are_not_aggregators() {
        let patterns: Vec<String> = BLOCKED_URL_PATTERNS.iter().map(|p| p.to_string()).collect();
        assert!(default_feeds()
            .iter()
            .all(|f| !is_aggregator_url(&f.url, &patterns)));
    }
}
