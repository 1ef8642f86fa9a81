//! One editorial run: harvest, aggregate, synthesize, fact-check, store.
//!
//! Harvesting never fails the run. Synthesis and storage are hard stages and
//! surface as [`PipelineError`]; the fact check only ever downgrades the verdict.

use anyhow::Context;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{error, info};

use crate::aggregator;
use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::extractor;
use crate::fact_checker::FactChecker;
use crate::fetcher::{HttpFetcher, PageFetch};
use crate::harvester::{HarvestLimits, Harvester, NewsApiHarvester, RssHarvester};
use crate::llm::{OpenRouterClient, BLOG_GENERATOR_TITLE, FACT_CHECKER_TITLE};
use crate::models::{
    ExtractedArticle, FactCheckResult, FactCheckStatus, GeneratedPost, PostIndexEntry, SourceRef,
};
use crate::revalidate::Revalidator;
use crate::storage::{self, PostStore};
use crate::synthesizer::Synthesizer;

pub const POST_EXCERPT_CHARS: usize = 300;
pub const ROUNDUP_TAGS: &[&str] = &["accessibility", "wcag", "news", "roundup"];

/// Runs every harvester and merges their output into the top-N list
pub struct Collector {
    harvesters: Vec<Box<dyn Harvester>>,
    feed_concurrency: usize,
    top_n: usize,
}

impl Collector {
    pub fn new(harvesters: Vec<Box<dyn Harvester>>, feed_concurrency: usize, top_n: usize) -> Self {
        Self {
            harvesters,
            feed_concurrency: feed_concurrency.max(1),
            top_n,
        }
    }

    /// One RSS harvester per configured feed plus the news-API harvester when keyed
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let settings = &config.settings;
        let fetcher: Arc<dyn PageFetch> = Arc::new(HttpFetcher::new(
            &settings.user_agent,
            settings.http_timeout,
            settings.max_connections,
        )?);
        let limits = HarvestLimits::from(settings);

        let mut harvesters: Vec<Box<dyn Harvester>> = config
            .feeds
            .iter()
            .filter(|feed| feed.enabled)
            .map(|feed| {
                Box::new(RssHarvester::new(feed.clone(), fetcher.clone(), limits.clone()))
                    as Box<dyn Harvester>
            })
            .collect();

        if let Some(news_api) = &config.news_api {
            harvesters.push(Box::new(NewsApiHarvester::new(
                news_api.clone(),
                fetcher.clone(),
                limits,
            )));
        }

        Ok(Self::new(harvesters, settings.feed_concurrency, settings.top_n))
    }

    pub fn source_count(&self) -> usize {
        self.harvesters.len()
    }

    /// Per-source result sets, in harvester order
    pub async fn harvest_all(&self, now: DateTime<Utc>) -> Vec<Vec<ExtractedArticle>> {
        stream::iter(&self.harvesters)
            .map(|harvester| async move {
                let articles = harvester.harvest(now).await;
                info!("{}: {} articles", harvester.name(), articles.len());
                articles
            })
            .buffered(self.feed_concurrency)
            .collect()
            .await
    }

    /// Unique articles from every source, newest first, at most top-N
    pub async fn collect(&self, now: DateTime<Utc>) -> Vec<ExtractedArticle> {
        let sets = self.harvest_all(now).await;
        let total: usize = sets.iter().map(Vec::len).sum();

        let top = aggregator::aggregate(sets, self.top_n);
        info!("Selected {} of {} harvested articles", top.len(), total);
        top
    }
}

/// Summary of a completed run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub articles_considered: usize,
    pub post: PostIndexEntry,
    pub fact_check_notes: String,
}

pub struct Pipeline {
    collector: Collector,
    synthesizer: Synthesizer,
    fact_checker: FactChecker,
    store: PostStore,
    auto_publish: bool,
    revalidator: Option<Revalidator>,
}

impl Pipeline {
    pub fn new(
        collector: Collector,
        synthesizer: Synthesizer,
        fact_checker: FactChecker,
        store: PostStore,
        auto_publish: bool,
    ) -> Self {
        Self {
            collector,
            synthesizer,
            fact_checker,
            store,
            auto_publish,
            revalidator: None,
        }
    }

    pub fn with_revalidator(mut self, revalidator: Revalidator) -> Self {
        self.revalidator = Some(revalidator);
        self
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let api_key = config.require_openrouter_key()?;
        let settings = &config.settings;

        let blog_model = OpenRouterClient::new(
            api_key,
            &config.openrouter_base_url,
            &config.blog_model,
            BLOG_GENERATOR_TITLE,
        )?;
        let fact_check_model = OpenRouterClient::new(
            api_key,
            &config.openrouter_base_url,
            &config.fact_check_model,
            FACT_CHECKER_TITLE,
        )?;

        let mut pipeline = Self::new(
            Collector::from_config(config)?,
            Synthesizer::new(
                Arc::new(blog_model),
                settings.prompt_chars_per_article,
                settings.window_hours,
            ),
            FactChecker::new(Arc::new(fact_check_model)),
            PostStore::new(&config.posts_dir),
            config.auto_publish,
        );

        if let Some(revalidate) = &config.revalidate {
            let revalidator = Revalidator::new(revalidate.clone(), settings.http_timeout)
                .context("Failed to set up revalidation hook")?;
            pipeline = pipeline.with_revalidator(revalidator);
        }

        Ok(pipeline)
    }

    pub fn collector(&self) -> &Collector {
        &self.collector
    }

    pub fn store(&self) -> &PostStore {
        &self.store
    }

    pub async fn run(&self, now: DateTime<Utc>) -> Result<RunReport> {
        if self.collector.source_count() == 0 {
            error!("No article sources configured");
            return Err(PipelineError::Config("no article sources configured".to_string()));
        }
        info!("Starting blog generation with {} sources", self.collector.source_count());

        let articles = self.collector.collect(now).await;

        let markdown = self.synthesizer.synthesize(&articles).await.map_err(|e| {
            error!("Blog generation failed: {}", e);
            e
        })?;

        let (title, content) = split_title(&markdown, now);
        let verdict = self.fact_checker.fact_check(&content, &title).await;
        let post = assemble_post(title, content, &articles, verdict, self.auto_publish, now);

        self.store.save(&post).map_err(|e| {
            error!("Failed to save blog post: {}", e);
            e
        })?;

        if let Some(revalidator) = &self.revalidator {
            revalidator.revalidate(&post.slug).await;
        }

        info!(
            "Blog post created: {} ({}, {})",
            post.slug,
            post.fact_check_status.as_str(),
            if post.is_published { "published" } else { "draft" }
        );

        Ok(RunReport {
            articles_considered: articles.len(),
            post: PostIndexEntry::from(&post),
            fact_check_notes: post.fact_check_notes,
        })
    }
}

/// Title from the first `# ` heading, removed from the body; otherwise a dated roundup title
pub fn split_title(markdown: &str, now: DateTime<Utc>) -> (String, String) {
    let heading = markdown.lines().enumerate().find_map(|(idx, line)| {
        let rest = line.strip_prefix('#')?;
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }
        let text = rest.trim();
        (!text.is_empty()).then(|| (idx, text.to_string()))
    });

    match heading {
        Some((idx, title)) => {
            let body = markdown
                .lines()
                .enumerate()
                .filter(|(i, _)| *i != idx)
                .map(|(_, line)| line)
                .collect::<Vec<_>>()
                .join("\n");
            (title, body.trim().to_string())
        }
        None => (default_title(now), markdown.trim().to_string()),
    }
}

pub fn default_title(now: DateTime<Utc>) -> String {
    format!("Accessibility News Roundup - {}", now.format("%B %-d, %Y"))
}

fn assemble_post(
    title: String,
    content: String,
    articles: &[ExtractedArticle],
    verdict: FactCheckResult,
    auto_publish: bool,
    now: DateTime<Utc>,
) -> GeneratedPost {
    let slug = match storage::generate_slug(&title) {
        slug if slug.is_empty() => storage::generate_slug(&default_title(now)),
        slug => slug,
    };

    let mut tags: Vec<String> = ROUNDUP_TAGS.iter().map(|tag| tag.to_string()).collect();
    for tag in extractor::extract_tags(&content, &title) {
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }

    GeneratedPost {
        slug,
        excerpt: extractor::generate_excerpt(&content, POST_EXCERPT_CHARS),
        published_at: now,
        generated_at: now,
        sources: articles.iter().map(SourceRef::from).collect(),
        fact_check_status: FactCheckStatus::from_verdict(verdict.verified),
        fact_check_notes: verdict.notes,
        is_published: auto_publish && verdict.verified,
        tags,
        title,
        content,
    }
}
