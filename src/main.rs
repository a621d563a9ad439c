use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod ai;
mod cli;
mod config;
mod db;
mod dedup;
mod error;
mod feed;
mod lifecycle;
mod models;
mod pipeline;
mod services;

use ai::{OpenRouterBackend, RateLimiter, RetryPolicy, Summarizer};
use cli::{Cli, Command};
use config::Config;
use db::{ArticleStore, Repository};
use error::Result;
use feed::FeedFetcher;
use lifecycle::LifecycleManager;
use models::Category;
use pipeline::{IngestPipeline, PipelineSettings};
use services::{ContentFetcher, HtmlImageExtractor};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    let repository: Arc<dyn ArticleStore> = Arc::new(Repository::new(&config.db_path).await?);

    match cli.command() {
        Command::Ingest => ingest(&config, repository).await,
        Command::Sweep => sweep(&config, repository).await,
        Command::List {
            category,
            limit,
            json,
        } => list(repository, category, limit, json).await,
    }
}

async fn ingest(config: &Config, store: Arc<dyn ArticleStore>) -> Result<()> {
    config.validate()?;

    let policy = config.lifecycle.policy()?;
    let summarizer_config = &config.summarizer;

    let backend = OpenRouterBackend::new(
        summarizer_config.api_url.clone(),
        config.summarizer_api_key()?.to_string(),
        summarizer_config.model.clone(),
        summarizer_config.temperature,
        summarizer_config.max_tokens,
        Duration::from_secs(summarizer_config.request_timeout_secs),
    )?;
    let limiter = Arc::new(RateLimiter::new(Duration::from_millis(
        summarizer_config.min_interval_ms,
    )));
    let summarizer = Arc::new(Summarizer::new(
        Arc::new(backend),
        limiter,
        RetryPolicy {
            max_attempts: summarizer_config.max_attempts,
            base_delay: Duration::from_millis(summarizer_config.base_delay_ms),
            max_delay: Duration::from_millis(summarizer_config.max_delay_ms),
        },
    ));

    let fetcher = FeedFetcher::new(config.feed_sources()?, config.feed_settings())?;
    let content = ContentFetcher::new(
        Duration::from_secs(config.pipeline.content_request_timeout_secs),
        config.pipeline.min_content_length,
    )?;
    let images = HtmlImageExtractor::new(config.image_settings())?;

    let pipeline = IngestPipeline::new(
        store,
        policy,
        Arc::new(fetcher),
        Arc::new(content),
        Arc::new(images),
        summarizer,
        PipelineSettings {
            workers: config.pipeline.workers,
            min_content_length: config.pipeline.min_content_length,
            min_title_length: config.pipeline.min_title_length,
            content_timeout: Duration::from_secs(config.pipeline.content_timeout_secs),
            image_timeout: Duration::from_secs(config.pipeline.image_timeout_secs),
            summary_timeout: Duration::from_secs(config.pipeline.summary_timeout_secs),
        },
    );

    let report = pipeline.run().await;
    println!("Complete: {}", report);
    Ok(())
}

async fn sweep(config: &Config, store: Arc<dyn ArticleStore>) -> Result<()> {
    let manager = LifecycleManager::new(store, config.lifecycle.policy()?);
    let report = manager.run_sweep(Utc::now()).await;
    println!("Expired: {}, Deleted: {}", report.expired, report.deleted);
    Ok(())
}

async fn list(
    store: Arc<dyn ArticleStore>,
    category: Option<Category>,
    limit: usize,
    json: bool,
) -> Result<()> {
    let articles = store.list_active(category, limit).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&articles)?);
        return Ok(());
    }

    let now = Utc::now();
    for article in &articles {
        let published = article
            .published_at
            .map(|p| p.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "[{}] {:<12} {}  {}\n    {}",
            article.state_at(now).as_str(),
            article.category,
            published,
            article.title,
            article.article_url
        );
    }
    println!("{} active article(s)", articles.len());
    Ok(())
}
