use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use tokio::time::{timeout, Instant};
use tracing::{debug, info};

use crate::ai::Summarizer;
use crate::db::{ArticleStore, ArticleWriter};
use crate::dedup::{story_fingerprint, Deduplicator};
use crate::feed::CandidateSource;
use crate::lifecycle::{LifecycleManager, LifecyclePolicy, SweepReport};
use crate::models::{Candidate, NewArticle};
use crate::services::{ContentExtractor, ImageExtractor};

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub workers: usize,
    pub min_content_length: usize,
    pub min_title_length: usize,
    pub content_timeout: Duration,
    pub image_timeout: Duration,
    pub summary_timeout: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            workers: 4,
            min_content_length: 100,
            min_title_length: 10,
            content_timeout: Duration::from_secs(45),
            image_timeout: Duration::from_secs(20),
            summary_timeout: Duration::from_secs(120),
        }
    }
}

/// What happened to one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Outcome {
    Stored,
    Duplicate,
    DuplicateStory,
    ExtractionFailed,
    ContentTooShort,
    TitleTooShort,
    NoSummary,
    SummaryTimedOut,
    WriteFailed,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Stored => "stored",
            Outcome::Duplicate => "duplicate",
            Outcome::DuplicateStory => "duplicate_story",
            Outcome::ExtractionFailed => "extraction_failed",
            Outcome::ContentTooShort => "content_too_short",
            Outcome::TitleTooShort => "title_too_short",
            Outcome::NoSummary => "no_summary",
            Outcome::SummaryTimedOut => "summary_timed_out",
            Outcome::WriteFailed => "write_failed",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub stored: usize,
    pub total: usize,
    pub elapsed: Duration,
    pub sweep: SweepReport,
    /// Drop reasons with their counts; never contains `Outcome::Stored`.
    pub dropped: BTreeMap<Outcome, usize>,
}

impl RunReport {
    fn record(&mut self, outcome: Outcome) {
        if outcome == Outcome::Stored {
            self.stored += 1;
        } else {
            *self.dropped.entry(outcome).or_insert(0) += 1;
        }
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} stored in {:.1}s (expired {}, deleted {})",
            self.stored,
            self.total,
            self.elapsed.as_secs_f64(),
            self.sweep.expired,
            self.sweep.deleted
        )?;
        for (outcome, count) in &self.dropped {
            write!(f, ", {} {}", outcome, count)?;
        }
        Ok(())
    }
}

/// One ingestion run: lifecycle sweep, feed fetch, then every candidate
/// through extraction, dedup, summary, image and write on a bounded pool.
pub struct IngestPipeline {
    source: Arc<dyn CandidateSource>,
    dedup: Deduplicator,
    content: Arc<dyn ContentExtractor>,
    images: Arc<dyn ImageExtractor>,
    summarizer: Arc<Summarizer>,
    writer: ArticleWriter,
    lifecycle: LifecycleManager,
    settings: PipelineSettings,
}

impl IngestPipeline {
    pub fn new(
        store: Arc<dyn ArticleStore>,
        policy: LifecyclePolicy,
        source: Arc<dyn CandidateSource>,
        content: Arc<dyn ContentExtractor>,
        images: Arc<dyn ImageExtractor>,
        summarizer: Arc<Summarizer>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            source,
            dedup: Deduplicator::new(Arc::clone(&store)),
            content,
            images,
            summarizer,
            writer: ArticleWriter::new(Arc::clone(&store), policy),
            lifecycle: LifecycleManager::new(store, policy),
            settings,
        }
    }

    pub async fn run(&self) -> RunReport {
        let started = Instant::now();

        let sweep = self.lifecycle.run_sweep(Utc::now()).await;

        let candidates = self.source.fetch_candidates().await;
        let total = candidates.len();
        info!(total, workers = self.settings.workers, "Processing candidates");

        let outcomes: Vec<Outcome> = stream::iter(candidates)
            .map(|candidate| self.process_candidate(candidate))
            .buffer_unordered(self.settings.workers.max(1))
            .collect()
            .await;

        let mut report = RunReport {
            total,
            sweep,
            ..RunReport::default()
        };
        for outcome in outcomes {
            report.record(outcome);
        }
        report.elapsed = started.elapsed();

        info!(
            stored = report.stored,
            total = report.total,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Ingestion complete"
        );
        report
    }

    pub async fn process_candidate(&self, candidate: Candidate) -> Outcome {
        let url = candidate.link.clone();

        if self.dedup.is_duplicate(&url).await {
            return drop_candidate(&url, Outcome::Duplicate);
        }

        let extracted = timeout(
            self.settings.content_timeout,
            self.content
                .extract(&url, &candidate.title, &candidate.snippet),
        )
        .await;
        let content = match extracted {
            Ok(Some(content)) => content,
            Ok(None) | Err(_) => return drop_candidate(&url, Outcome::ExtractionFailed),
        };

        if content.text.chars().count() < self.settings.min_content_length {
            return drop_candidate(&url, Outcome::ContentTooShort);
        }
        if content.title.chars().count() < self.settings.min_title_length {
            return drop_candidate(&url, Outcome::TitleTooShort);
        }

        let published_at = candidate.published_at.or(content.publish_date);
        let fingerprint = story_fingerprint(&content.title, &content.text, published_at.as_deref());
        if self.dedup.is_duplicate_fingerprint(&fingerprint).await {
            return drop_candidate(&url, Outcome::DuplicateStory);
        }

        let (summary, image) = tokio::join!(
            timeout(
                self.settings.summary_timeout,
                self.summarizer.summarize(&content.text)
            ),
            timeout(self.settings.image_timeout, self.images.extract_image(&url)),
        );

        let image_url = image.unwrap_or_else(|_| {
            debug!(%url, "Image extraction timed out; using placeholder");
            self.images.placeholder().to_string()
        });
        let summary = match summary {
            Ok(Some(summary)) => summary,
            Ok(None) => return drop_candidate(&url, Outcome::NoSummary),
            Err(_) => return drop_candidate(&url, Outcome::SummaryTimedOut),
        };

        // Another worker may have stored the same URL while this one was summarizing.
        if self.dedup.is_duplicate(&url).await {
            return drop_candidate(&url, Outcome::Duplicate);
        }

        let title = content.title;
        let stored = self
            .writer
            .insert(NewArticle {
                category: candidate.category,
                title: title.clone(),
                summary,
                image_url,
                source: candidate.source,
                published_at,
                article_url: url.clone(),
                story_fingerprint: fingerprint,
                original_content: content.text,
                snippet: candidate.snippet,
            })
            .await;

        if stored {
            info!(%url, %title, category = %candidate.category, "Stored article");
            Outcome::Stored
        } else {
            drop_candidate(&url, Outcome::WriteFailed)
        }
    }
}

fn drop_candidate(url: &str, outcome: Outcome) -> Outcome {
    debug!(%url, reason = %outcome, "Dropped candidate");
    outcome
}
