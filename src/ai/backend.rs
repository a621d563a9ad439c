use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

const APP_REFERER: &str = "https://newsblitz.app";
const APP_TITLE: &str = "NewsBlitz";

/// Result of one completion request, classified for the retry policy.
#[derive(Debug, Clone, PartialEq)]
pub enum CallOutcome {
    Success(String),
    /// Worth retrying. `retry_after` is the delay the server asked for, if any.
    Transient {
        reason: String,
        retry_after: Option<Duration>,
    },
    Permanent(String),
}

/// A text completion endpoint.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, prompt: &str) -> CallOutcome;

    fn model(&self) -> &str;
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    text: Option<String>,
}

/// OpenRouter-style `/completions` client.
pub struct OpenRouterBackend {
    client: Client,
    api_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenRouterBackend {
    pub fn new(
        api_url: String,
        api_key: String,
        model: String,
        temperature: f32,
        max_tokens: u32,
        request_timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(request_timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AppError::Summarizer(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_url,
            api_key,
            model,
            temperature,
            max_tokens,
        })
    }
}

#[async_trait]
impl CompletionBackend for OpenRouterBackend {
    async fn complete(&self, prompt: &str) -> CallOutcome {
        let request = CompletionRequest {
            model: &self.model,
            prompt,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let response = match self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", APP_REFERER)
            .header("X-Title", APP_TITLE)
            .json(&request)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                return CallOutcome::Transient {
                    reason: format!("request failed: {}", e),
                    retry_after: None,
                }
            }
        };

        let status = response.status();
        if !status.is_success() {
            let retry_after = retry_after(response.headers());
            let body = response.text().await.unwrap_or_default();
            return classify_status(status, retry_after, body);
        }

        match response.json::<CompletionResponse>().await {
            Ok(body) => CallOutcome::Success(
                body.choices
                    .into_iter()
                    .next()
                    .and_then(|choice| choice.text)
                    .unwrap_or_default(),
            ),
            Err(e) if e.is_timeout() => CallOutcome::Transient {
                reason: format!("timed out reading response: {}", e),
                retry_after: None,
            },
            Err(e) => CallOutcome::Permanent(format!("malformed response: {}", e)),
        }
    }

    fn model(&self) -> &str {
        &self.model
    }
}

fn classify_status(status: StatusCode, retry_after: Option<Duration>, body: String) -> CallOutcome {
    let reason = format!("HTTP {}: {}", status, body);
    match status {
        StatusCode::TOO_MANY_REQUESTS | StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE => {
            CallOutcome::Transient {
                reason,
                retry_after,
            }
        }
        s if s.is_server_error() || s == StatusCode::REQUEST_TIMEOUT => CallOutcome::Transient {
            reason,
            retry_after: None,
        },
        _ => CallOutcome::Permanent(reason),
    }
}

/// `Retry-After` as delay-seconds. HTTP-date values, negative numbers and
/// values too large for a `Duration` are ignored.
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    let value = headers.get(RETRY_AFTER)?.to_str().ok()?.trim();
    let secs: f64 = value.parse().ok()?;
    Duration::try_from_secs_f64(secs).ok()
}
