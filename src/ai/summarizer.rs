use std::sync::{Arc, OnceLock};
use std::time::Duration;

use regex::Regex;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use super::backend::{CallOutcome, CompletionBackend};
use super::rate_limit::RateLimiter;

const PROMPT: &str = "Summarize the following news article in strictly under 80-100 words while preserving all key details. \
The summary should be concise, coherent, and easy to understand. Capture the core facts. \
Do not include any additional commentary or meta-text.:\n\n";

/// Longer articles are cut before prompting.
const MAX_INPUT_CHARS: usize = 10_000;

/// Bounded exponential backoff for transient failures.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Delay before the retry following failed attempt number `attempt` (1-based).
    /// A server-supplied delay wins over the computed backoff but is still
    /// capped at `max_delay`.
    pub fn delay_for(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        if let Some(delay) = retry_after {
            return delay.min(self.max_delay);
        }
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(1 << exponent)
            .min(self.max_delay)
    }
}

pub struct Summarizer {
    backend: Arc<dyn CompletionBackend>,
    limiter: Arc<RateLimiter>,
    retry: RetryPolicy,
}

impl Summarizer {
    pub fn new(
        backend: Arc<dyn CompletionBackend>,
        limiter: Arc<RateLimiter>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            backend,
            limiter,
            retry,
        }
    }

    /// Summarize article text in roughly 80-100 words.
    ///
    /// Returns `None` when the backend fails permanently, keeps failing past
    /// the retry budget, or produces nothing usable.
    pub async fn summarize(&self, article_text: &str) -> Option<String> {
        let content: String = article_text.chars().take(MAX_INPUT_CHARS).collect();
        let prompt = format!("{}{}", PROMPT, content);
        let started = Instant::now();

        for attempt in 1..=self.retry.max_attempts {
            self.limiter.acquire().await;

            match self.backend.complete(&prompt).await {
                CallOutcome::Success(text) => {
                    let summary = strip_reasoning(&text);
                    if summary.is_empty() {
                        debug!(attempt, "Summarizer returned empty text");
                        return None;
                    }
                    info!(
                        attempt,
                        model = self.backend.model(),
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        words = summary.split_whitespace().count(),
                        "Summary generated"
                    );
                    return Some(summary);
                }
                CallOutcome::Permanent(reason) => {
                    warn!(attempt, %reason, "Summarizer request failed permanently");
                    return None;
                }
                CallOutcome::Transient {
                    reason,
                    retry_after,
                } => {
                    if attempt == self.retry.max_attempts {
                        warn!(
                            attempt,
                            max = self.retry.max_attempts,
                            elapsed_ms = started.elapsed().as_millis() as u64,
                            %reason,
                            "Summarizer exhausted retries"
                        );
                        return None;
                    }

                    let delay = self.retry.delay_for(attempt, retry_after);
                    warn!(
                        attempt,
                        max = self.retry.max_attempts,
                        ?delay,
                        %reason,
                        "Summarizer attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }

        None
    }
}

fn reasoning_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<think>.*?</think>\s*").expect("valid reasoning regex"))
}

/// Remove every `<think>...</think>` block (and the whitespace after it).
pub fn strip_reasoning(text: &str) -> String {
    reasoning_regex().replace_all(text, "").trim().to_string()
}
