use tracing::warn;
use url::Url;

pub const NEWS_API_ENDPOINT: &str = "https://newsapi.org/v2/everything";

/// Terms OR-joined into the news-search query
pub const NEWS_API_QUERY_TERMS: &[&str] = &[
    "web accessibility",
    "website accessibility",
    "WCAG",
    "WCAG 2.2",
    "WCAG guidelines",
    "WCAG compliance",
    "ADA compliance",
    "ADA website",
    "ADA lawsuit",
    "accessibility lawsuit",
    "digital accessibility",
    "Section 508",
    "accessible website",
    "accessible design",
    "screen reader",
    "keyboard navigation",
    "ARIA",
    "accessibility standards",
    "accessibility audit",
    "accessibility testing",
    "inclusive design",
    "a11y",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSource {
    pub name: String,
    pub url: String,
    pub enabled: bool,
}

impl FeedSource {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            enabled: true,
        }
    }
}

/// Curated accessibility feeds used when no override is configured
pub fn default_feeds() -> Vec<FeedSource> {
    vec![
        FeedSource::new("A11y Project", "https://www.a11yproject.com/feed/"),
        FeedSource::new("WebAIM Blog", "https://webaim.org/blog/feed/"),
        FeedSource::new("Deque Blog", "https://www.deque.com/blog/feed/"),
        FeedSource::new("Accessibility.com", "https://www.accessibility.com/blog/feed"),
    ]
}

/// Feeds from a comma-separated override, or the defaults when unset.
///
/// Override entries are trimmed and entries that are not http(s) URLs are
/// dropped. Accepted entries are named `Source 1`, `Source 2`, ...
pub fn resolve_feeds(override_list: Option<&str>) -> Vec<FeedSource> {
    let Some(list) = override_list.filter(|list| !list.trim().is_empty()) else {
        return default_feeds().into_iter().filter(|feed| feed.enabled).collect();
    };

    list.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .filter(|entry| match Url::parse(entry) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => true,
            _ => {
                warn!("Ignoring invalid feed URL in RSS_FEEDS: {}", entry);
                false
            }
        })
        .enumerate()
        .map(|(idx, url)| FeedSource::new(format!("Source {}", idx + 1), url))
        .collect()
}

#[derive(Debug, Clone)]
pub struct NewsApiConfig {
    pub enabled: bool,
    pub api_key: String,
    pub query: String,
    pub language: String,
    pub sort_by: String,
    pub page_size: u32,
    pub endpoint: String,
}

impl NewsApiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            enabled: true,
            api_key: api_key.into(),
            query: build_query(NEWS_API_QUERY_TERMS),
            language: "en".to_string(),
            sort_by: "relevancy".to_string(),
            page_size: 20,
            endpoint: NEWS_API_ENDPOINT.to_string(),
        }
    }
}

/// Search-API configuration, present only when a key is configured
pub fn news_api_config(api_key: Option<&str>) -> Option<NewsApiConfig> {
    api_key
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(NewsApiConfig::new)
}

/// OR-joins terms, quoting multi-word phrases so they match exactly
pub fn build_query(terms: &[&str]) -> String {
    terms
        .iter()
        .map(|term| {
            if term.contains(' ') {
                format!("\"{}\"", term)
            } else {
                term.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" OR ")
}
