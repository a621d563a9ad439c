mod deduplicator;
mod fingerprint;

pub use deduplicator::Deduplicator;
pub use fingerprint::story_fingerprint;
