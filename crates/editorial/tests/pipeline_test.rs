use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use editorial::error::{FetchError, LlmError, SynthesisError};
use editorial::fact_checker::FactChecker;
use editorial::fetcher::PageFetch;
use editorial::harvester::{HarvestLimits, Harvester, RssHarvester};
use editorial::llm::{CompletionRequest, CompletionService};
use editorial::sources::FeedSource;
use editorial::synthesizer::Synthesizer;
use editorial::{aggregator, Collector, FactCheckStatus, Pipeline, PipelineError, PostStore};
use pretty_assertions::assert_eq;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

const FEED_URL: &str = "https://a11y.example/feed.xml";
const ARTICLE_URL: &str = "https://a11y.example/posts/wcag-22-guidance";

const SYNTHESIZED: &str = "# Accessibility Weekly: WCAG 2.2 Arrives\n\n\
## Introduction\n\nWCAG 2.2 guidance landed this week.\n\n## Sources\n\n- New WCAG 2.2 Guidance";

struct MapFetcher {
    pages: HashMap<String, String>,
}

#[async_trait]
impl PageFetch for MapFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        self.pages.get(url).cloned().ok_or_else(|| FetchError::Status {
            url: url.to_string(),
            status: 404,
        })
    }
}

/// Replies in order, one scripted response per call
struct ScriptedModel {
    replies: Mutex<VecDeque<String>>,
    calls: AtomicUsize,
}

impl ScriptedModel {
    fn new(replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionService for ScriptedModel {
    async fn complete(&self, _request: &CompletionRequest) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(LlmError::NoChoices)
    }
}

fn now() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-10-16T09:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

fn feed_xml(published: DateTime<Utc>) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>A11y Example</title>
    <link>https://a11y.example</link>
    <description>Accessibility news</description>
    <item>
      <title>New WCAG 2.2 Guidance</title>
      <link>{}</link>
      <pubDate>{}</pubDate>
      <description>&lt;p&gt;What changes in WCAG 2.2&lt;/p&gt;</description>
    </item>
  </channel>
</rss>"#,
        ARTICLE_URL,
        published.to_rfc2822()
    )
}

const ARTICLE_HTML: &str = r#"<html><head><title>New WCAG 2.2 Guidance</title></head><body>
<nav><a href="/">Home</a></nav>
<main><article>
<p>The W3C has published new guidance explaining how WCAG 2.2 changes accessibility testing for web teams, with a focus on keyboard users.</p>
<p>Focus appearance, target size, and accessible authentication are the headline criteria, and each one affects how designers build forms and navigation.</p>
<p>Accessibility specialists recommend auditing existing components before the next release, starting with focus indicators and drag interactions.</p>
</article></main>
<footer>Copyright</footer>
</body></html>"#;

fn fetcher() -> Arc<MapFetcher> {
    let pages = HashMap::from([
        (FEED_URL.to_string(), feed_xml(now() - Duration::hours(2))),
        (ARTICLE_URL.to_string(), ARTICLE_HTML.to_string()),
    ]);
    Arc::new(MapFetcher { pages })
}

fn feed_harvester(fetcher: Arc<MapFetcher>) -> RssHarvester {
    RssHarvester::new(
        FeedSource::new("A11y Example", FEED_URL),
        fetcher,
        HarvestLimits::default(),
    )
}

fn single_feed(harvester: RssHarvester) -> Collector {
    Collector::new(vec![Box::new(harvester) as Box<dyn Harvester>], 4, 7)
}

fn pipeline(model: Arc<ScriptedModel>, store_dir: &TempDir, auto_publish: bool) -> Pipeline {
    let collector = single_feed(feed_harvester(fetcher()));
    Pipeline::new(
        collector,
        Synthesizer::new(model.clone(), 2000, 72),
        FactChecker::new(model),
        PostStore::new(store_dir.path()),
        auto_publish,
    )
}

#[tokio::test]
async fn stages_compose_on_a_single_feed_entry() {
    let harvested = feed_harvester(fetcher()).harvest(now()).await;
    assert_eq!(harvested.len(), 1);
    assert_eq!(harvested[0].title, "New WCAG 2.2 Guidance");
    assert_eq!(harvested[0].source, "A11y Example");
    assert!(harvested[0].content.chars().count() >= 300);

    let top = aggregator::aggregate(vec![harvested], 7);
    assert_eq!(top.len(), 1);

    let model = ScriptedModel::new(&[SYNTHESIZED, r#"{"verified":true,"notes":"ok"}"#]);
    let markdown = Synthesizer::new(model.clone(), 2000, 72)
        .synthesize(&top)
        .await
        .unwrap();
    assert_eq!(markdown, SYNTHESIZED);

    let verdict = FactChecker::new(model.clone())
        .fact_check(&markdown, "Accessibility Weekly")
        .await;
    assert_eq!(FactCheckStatus::from_verdict(verdict.verified), FactCheckStatus::Verified);
    assert_eq!(model.calls(), 2);
}

#[tokio::test]
async fn full_run_saves_a_verified_post() {
    let dir = TempDir::new().unwrap();
    let model = ScriptedModel::new(&[SYNTHESIZED, r#"{"verified":true,"notes":"ok"}"#]);
    let pipeline = pipeline(model.clone(), &dir, true);

    let report = pipeline.run(now()).await.unwrap();

    assert_eq!(report.articles_considered, 1);
    assert_eq!(report.post.slug, "accessibility-weekly-wcag-22-arrives");
    assert_eq!(report.post.title, "Accessibility Weekly: WCAG 2.2 Arrives");
    assert_eq!(report.post.fact_check_status, FactCheckStatus::Verified);
    assert!(report.post.is_published);
    assert_eq!(report.fact_check_notes, "ok");
    assert_eq!(model.calls(), 2);

    let store = pipeline.store();
    let saved = store.get_by_slug(&report.post.slug).unwrap().unwrap();
    assert!(saved.content.starts_with("## Introduction"));
    assert_eq!(saved.sources.len(), 1);
    assert_eq!(saved.sources[0].url, ARTICLE_URL);
    assert_eq!(saved.published_at, now());
    assert_eq!(store.list_all().unwrap(), vec![report.post.clone()]);
}

#[tokio::test]
async fn rerun_with_same_title_updates_the_single_index_entry() {
    let dir = TempDir::new().unwrap();

    let first = ScriptedModel::new(&[SYNTHESIZED, r#"{"verified":true,"notes":"ok"}"#]);
    pipeline(first, &dir, true).run(now()).await.unwrap();

    let second = ScriptedModel::new(&[SYNTHESIZED, "I could not decide."]);
    let report = pipeline(second, &dir, true).run(now()).await.unwrap();

    assert_eq!(report.post.fact_check_status, FactCheckStatus::NeedsReview);
    assert!(!report.post.is_published);
    assert!(report.fact_check_notes.ends_with("Manual review required."));

    let index = PostStore::new(dir.path()).list_all().unwrap();
    assert_eq!(index.len(), 1);
    assert_eq!(index[0].fact_check_status, FactCheckStatus::NeedsReview);
}

#[tokio::test]
async fn run_without_articles_fails_at_synthesis_and_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let model = ScriptedModel::new(&[SYNTHESIZED]);
    let empty = Arc::new(MapFetcher {
        pages: HashMap::new(),
    });
    let collector = single_feed(feed_harvester(empty));
    let pipeline = Pipeline::new(
        collector,
        Synthesizer::new(model.clone(), 2000, 72),
        FactChecker::new(model.clone()),
        PostStore::new(dir.path()),
        true,
    );

    let result = pipeline.run(now()).await;

    assert!(matches!(
        result,
        Err(PipelineError::Synthesis(SynthesisError::NoArticles))
    ));
    assert_eq!(model.calls(), 0);
    assert!(PostStore::new(dir.path()).list_all().unwrap().is_empty());
}
