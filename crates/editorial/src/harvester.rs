//! Per-source harvesting: one harvester per RSS feed plus one for the news-search API.
//!
//! A harvester never fails as a whole. A source that cannot be fetched or parsed
//! yields no articles, and a bad entry is skipped without affecting its siblings.

use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use futures::stream::{self, StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::PipelineSettings;
use crate::extractor::{self, ARTICLE_EXCERPT_CHARS};
use crate::fetcher::PageFetch;
use crate::models::ExtractedArticle;
use crate::relevance;
use crate::sources::{FeedSource, NewsApiConfig};

const NEWS_API_SOURCE: &str = "News API";

/// Per-source filtering limits
#[derive(Debug, Clone)]
pub struct HarvestLimits {
    pub window_hours: i64,
    pub min_content_chars: usize,
    pub entry_concurrency: usize,
}

impl From<&PipelineSettings> for HarvestLimits {
    fn from(settings: &PipelineSettings) -> Self {
        Self {
            window_hours: settings.window_hours,
            min_content_chars: settings.min_content_chars,
            entry_concurrency: settings.entry_concurrency.max(1),
        }
    }
}

impl Default for HarvestLimits {
    fn default() -> Self {
        Self::from(&PipelineSettings::default())
    }
}

#[async_trait]
pub trait Harvester: Send + Sync {
    /// Human-readable source name for logs
    fn name(&self) -> &str;

    /// Harvests articles published within the window ending at `now`
    async fn harvest(&self, now: DateTime<Utc>) -> Vec<ExtractedArticle>;
}

/// True when `published` is at most `window_hours` old and not in the future
/// The entry's page: an `alternate` (or untyped) link first, else whatever comes first.
/// Atom entries often list `self` and `replies` links ahead of it.
fn entry_link(links: &[feed_rs::model::Link]) -> Option<&feed_rs::model::Link> {
    links
        .iter()
        .find(|link| matches!(link.rel.as_deref(), None | Some("alternate")))
        .or_else(|| links.first())
}

pub fn is_within_window(published: DateTime<Utc>, now: DateTime<Utc>, window_hours: i64) -> bool {
    let age = now - published;
    age >= Duration::zero() && age <= Duration::hours(window_hours)
}

struct FeedCandidate {
    title: String,
    link: String,
    published: DateTime<Utc>,
    snippet: String,
}

pub struct RssHarvester {
    feed: FeedSource,
    fetcher: Arc<dyn PageFetch>,
    limits: HarvestLimits,
}

impl RssHarvester {
    pub fn new(feed: FeedSource, fetcher: Arc<dyn PageFetch>, limits: HarvestLimits) -> Self {
        Self {
            feed,
            fetcher,
            limits,
        }
    }

    fn candidates(&self, xml: &str, now: DateTime<Utc>) -> Option<Vec<FeedCandidate>> {
        let feed = match feed_rs::parser::parse(xml.as_bytes()) {
            Ok(feed) => feed,
            Err(e) => {
                warn!("Failed to parse feed {} ({}): {}", self.feed.name, self.feed.url, e);
                return None;
            }
        };

        let total = feed.entries.len();
        let candidates: Vec<FeedCandidate> = feed
            .entries
            .into_iter()
            .filter_map(|entry| {
                let title = entry.title.map(|t| t.content.trim().to_string())?;
                let link = entry_link(&entry.links).map(|l| l.href.trim().to_string())?;
                if title.is_empty() || link.is_empty() {
                    return None;
                }

                let Some(published) = entry.published.or(entry.updated) else {
                    debug!("Skipping undated entry: {}", title);
                    return None;
                };
                if !is_within_window(published, now, self.limits.window_hours) {
                    debug!("Skipping entry outside window: {} ({})", title, published);
                    return None;
                }

                let snippet = entry
                    .summary
                    .map(|s| extractor::fragment_text(&s.content))
                    .unwrap_or_default();

                Some(FeedCandidate {
                    title,
                    link,
                    published,
                    snippet,
                })
            })
            .collect();

        debug!(
            "{}: {} of {} entries inside the {}h window",
            self.feed.name,
            candidates.len(),
            total,
            self.limits.window_hours
        );
        Some(candidates)
    }

    async fn process_entry(&self, candidate: FeedCandidate) -> Option<ExtractedArticle> {
        let html = match self.fetcher.fetch_text(&candidate.link).await {
            Ok(html) => html,
            Err(e) => {
                warn!("Failed to fetch article content: {}", e);
                return None;
            }
        };

        let processed = extractor::extract(&html, &candidate.link, &candidate.title);
        if processed.content.chars().count() < self.limits.min_content_chars {
            debug!("Skipping article with insufficient content: {}", candidate.title);
            return None;
        }

        let text = format!("{} {} {}", candidate.title, candidate.snippet, processed.content);
        if !relevance::passes_lenient_check(&text) {
            debug!("Skipping non-accessibility article from RSS: {}", candidate.title);
            return None;
        }

        let excerpt = if processed.excerpt.is_empty() {
            extractor::generate_excerpt(&candidate.snippet, ARTICLE_EXCERPT_CHARS)
        } else {
            processed.excerpt
        };

        Some(ExtractedArticle {
            title: candidate.title,
            url: candidate.link,
            source: self.feed.name.clone(),
            published_date: candidate.published,
            content: processed.content,
            excerpt,
        })
    }
}

#[async_trait]
impl Harvester for RssHarvester {
    fn name(&self) -> &str {
        &self.feed.name
    }

    async fn harvest(&self, now: DateTime<Utc>) -> Vec<ExtractedArticle> {
        let xml = match self.fetcher.fetch_text(&self.feed.url).await {
            Ok(xml) => xml,
            Err(e) => {
                warn!("Failed to fetch RSS feed {}: {}", self.feed.name, e);
                return Vec::new();
            }
        };

        let Some(candidates) = self.candidates(&xml, now) else {
            return Vec::new();
        };

        let articles: Vec<ExtractedArticle> = stream::iter(candidates)
            .map(|candidate| self.process_entry(candidate))
            .buffered(self.limits.entry_concurrency)
            .filter_map(|article| async move { article })
            .collect()
            .await;

        info!("Extracted {} articles from {}", articles.len(), self.feed.name);
        articles
    }
}

#[derive(Debug, Deserialize)]
struct NewsApiResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    articles: Vec<NewsApiArticle>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewsApiArticle {
    title: Option<String>,
    url: Option<String>,
    description: Option<String>,
    published_at: Option<String>,
    source: Option<NewsApiSource>,
}

#[derive(Debug, Deserialize)]
struct NewsApiSource {
    name: Option<String>,
}

pub struct NewsApiHarvester {
    config: NewsApiConfig,
    fetcher: Arc<dyn PageFetch>,
    limits: HarvestLimits,
}

impl NewsApiHarvester {
    pub fn new(config: NewsApiConfig, fetcher: Arc<dyn PageFetch>, limits: HarvestLimits) -> Self {
        Self {
            config,
            fetcher,
            limits,
        }
    }

    /// Search URL for the window ending at `now`; the query must also match the title
    pub fn search_url(&self, now: DateTime<Utc>) -> String {
        let from = (now - Duration::hours(self.limits.window_hours))
            .to_rfc3339_opts(SecondsFormat::Secs, true);

        format!(
            "{}?apiKey={}&q={}&qInTitle={}&language={}&sortBy={}&from={}&pageSize={}",
            self.config.endpoint,
            urlencoding::encode(&self.config.api_key),
            urlencoding::encode(&self.config.query),
            urlencoding::encode(&self.config.query),
            urlencoding::encode(&self.config.language),
            urlencoding::encode(&self.config.sort_by),
            urlencoding::encode(&from),
            self.config.page_size
        )
    }

    async fn process_article(
        &self,
        article: NewsApiArticle,
        now: DateTime<Utc>,
    ) -> Option<ExtractedArticle> {
        let title = article.title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())?;
        let url = article.url.map(|u| u.trim().to_string()).filter(|u| !u.is_empty())?;

        let published = article
            .published_at
            .as_deref()
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|dt| dt.with_timezone(&Utc))?;
        if !is_within_window(published, now, self.limits.window_hours) {
            debug!("Skipping News API article outside window: {}", title);
            return None;
        }

        let description = article.description.unwrap_or_default();
        let content = match self.fetcher.fetch_text(&url).await {
            Ok(html) => {
                let processed = extractor::extract(&html, &url, &title);
                if processed.content.is_empty() {
                    description.clone()
                } else {
                    processed.content
                }
            }
            Err(e) => {
                debug!("Falling back to description after fetch failure: {}", e);
                description.clone()
            }
        };

        if content.chars().count() < self.limits.min_content_chars {
            debug!("Skipping News API article with insufficient content: {}", title);
            return None;
        }

        let text = format!("{} {} {}", title, description, content);
        if !relevance::passes_strict_check(&text) {
            debug!("Skipping News API article without accessibility focus: {}", title);
            return None;
        }

        let source = article
            .source
            .and_then(|s| s.name)
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| NEWS_API_SOURCE.to_string());
        let excerpt = extractor::generate_excerpt(&content, ARTICLE_EXCERPT_CHARS);

        Some(ExtractedArticle {
            title,
            url,
            source,
            published_date: published,
            content,
            excerpt,
        })
    }
}

#[async_trait]
impl Harvester for NewsApiHarvester {
    fn name(&self) -> &str {
        NEWS_API_SOURCE
    }

    async fn harvest(&self, now: DateTime<Utc>) -> Vec<ExtractedArticle> {
        if !self.config.enabled || self.config.api_key.is_empty() {
            return Vec::new();
        }

        let body = match self.fetcher.fetch_text(&self.search_url(now)).await {
            Ok(body) => body,
            Err(e) => {
                warn!("Failed to fetch from News API: {}", e);
                return Vec::new();
            }
        };

        let response: NewsApiResponse = match serde_json::from_str(&body) {
            Ok(response) => response,
            Err(e) => {
                warn!("Failed to decode News API response: {}", e);
                return Vec::new();
            }
        };

        if response.status != "ok" {
            warn!(
                "News API returned status '{}': {}",
                response.status,
                response.message.unwrap_or_default()
            );
            return Vec::new();
        }

        let articles: Vec<ExtractedArticle> = stream::iter(response.articles)
            .map(|article| self.process_article(article, now))
            .buffered(self.limits.entry_concurrency)
            .filter_map(|article| async move { article })
            .collect()
            .await;

        info!("Extracted {} articles from News API", articles.len());
        articles
    }
}
