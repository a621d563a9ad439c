mod backend;
mod rate_limit;
mod summarizer;

pub use backend::{CallOutcome, CompletionBackend, OpenRouterBackend};
pub use rate_limit::RateLimiter;
pub use summarizer::{RetryPolicy, Summarizer};
