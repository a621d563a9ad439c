use chrono::Timelike;
use sha2::{Digest, Sha256};

use crate::models::parse_wall_clock;

/// Only the head of the article body contributes to the fingerprint.
pub const CONTENT_PREFIX_CHARS: usize = 400;
const BUCKET_HOURS: u32 = 6;
const UNKNOWN_BUCKET: &str = "unknown";

/// Content-identity hash for a story.
///
/// Two scrapes of the same wire story published in the same six hour window
/// hash identically even when punctuation, casing or whitespace differ. The
/// result is a 64 character lowercase hex SHA-256 digest.
pub fn story_fingerprint(title: &str, content: &str, published_at: Option<&str>) -> String {
    let content_prefix: String = content.chars().take(CONTENT_PREFIX_CHARS).collect();
    let source = format!(
        "{}|{}|{}",
        normalize_text(title),
        normalize_text(&content_prefix),
        time_bucket(published_at)
    );

    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Lowercase, drop everything that is not a word character or whitespace,
/// collapse whitespace runs and trim.
pub fn normalize_text(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// `YYYY-MM-DD-HH` of the six hour window (00/06/12/18) containing the
/// publish time, or `unknown` when it is missing or unparseable.
///
/// Windows follow the timestamp's own clock: `01:10+02:00` falls in the
/// `00` window of that day, not in the previous UTC day.
pub fn time_bucket(published_at: Option<&str>) -> String {
    let Some(dt) = published_at.and_then(parse_wall_clock) else {
        return UNKNOWN_BUCKET.to_string();
    };

    let bucket_hour = (dt.hour() / BUCKET_HOURS) * BUCKET_HOURS;
    format!("{}-{:02}", dt.format("%Y-%m-%d"), bucket_hour)
}
