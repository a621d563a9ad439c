mod fetcher;
pub mod sources;
pub mod urls;

pub use fetcher::{CandidateSource, FeedFetcher, FeedSettings, FeedSource};
