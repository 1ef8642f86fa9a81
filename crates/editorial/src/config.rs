use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

use crate::sources::{self, FeedSource, NewsApiConfig};

pub const DEFAULT_MODEL: &str = "openai/gpt-4o-mini";
pub const DEFAULT_OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
const APP_DIR: &str = "accessibility-news";

/// Knobs that bound a pipeline run
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub window_hours: i64,
    pub top_n: usize,
    pub prompt_chars_per_article: usize,
    pub min_content_chars: usize,
    pub feed_concurrency: usize,
    pub entry_concurrency: usize,
    pub max_connections: usize,
    pub http_timeout: Duration,
    pub user_agent: String,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            window_hours: 72,
            top_n: 7,
            prompt_chars_per_article: 2000,
            min_content_chars: 100,
            feed_concurrency: 4,
            entry_concurrency: 5,
            max_connections: 10,
            http_timeout: Duration::from_secs(30),
            user_agent: "Mozilla/5.0 (compatible; AccessibilityNewsBot/1.0)".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RevalidateConfig {
    pub url: String,
    pub secret: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub openrouter_api_key: Option<String>,
    pub openrouter_base_url: String,
    pub blog_model: String,
    pub fact_check_model: String,
    pub feeds: Vec<FeedSource>,
    pub news_api: Option<NewsApiConfig>,
    pub auto_publish: bool,
    pub posts_dir: PathBuf,
    pub revalidate: Option<RevalidateConfig>,
    pub settings: PipelineSettings,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Try to load .env from multiple locations
        Self::try_load_dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup; `from_env` passes the process environment
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let posts_dir = match non_empty("BLOG_POSTS_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => default_posts_dir()?,
        };

        let revalidate = non_empty("REVALIDATE_URL").map(|url| RevalidateConfig {
            url,
            secret: non_empty("REVALIDATE_SECRET"),
        });

        Ok(Self {
            openrouter_api_key: non_empty("OPENROUTER_API_KEY"),
            openrouter_base_url: non_empty("OPENROUTER_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENROUTER_BASE_URL.to_string()),
            blog_model: non_empty("OPENROUTER_BLOG_MODEL")
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            fact_check_model: non_empty("OPENROUTER_FACT_CHECK_MODEL")
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            feeds: sources::resolve_feeds(non_empty("RSS_FEEDS").as_deref()),
            news_api: sources::news_api_config(non_empty("NEWS_API_KEY").as_deref()),
            auto_publish: non_empty("BLOG_AUTO_PUBLISH").as_deref() == Some("true"),
            posts_dir,
            revalidate,
            settings: PipelineSettings::default(),
        })
    }

    /// The completion API key, which only generation needs
    pub fn require_openrouter_key(&self) -> Result<&str> {
        self.openrouter_api_key.as_deref().context(
            "OPENROUTER_API_KEY not found.\n\n\
            To fix this, create ~/.config/accessibility-news/.env with:\n  \
            OPENROUTER_API_KEY=your_key_here\n  \
            NEWS_API_KEY=your_key_here   (optional)\n\n\
            Get an OpenRouter API key from: https://openrouter.ai/keys",
        )
    }

    fn try_load_dotenv() {
        // Try locations in order of preference:

        // 1. Current directory (for development)
        if dotenvy::dotenv().is_ok() {
            return;
        }

        // 2. ~/.config/accessibility-news/.env (standard config location)
        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join(APP_DIR).join(".env");
            if config_path.exists() && dotenvy::from_path(&config_path).is_ok() {
                return;
            }
        }

        // 3. ~/.env (home directory)
        if let Some(home_dir) = dirs::home_dir() {
            let home_path = home_dir.join(".env");
            if home_path.exists() {
                if let Err(e) = dotenvy::from_path(&home_path) {
                    debug!("Ignoring unreadable {}: {}", home_path.display(), e);
                }
            }
        }
    }
}

/// `<local data dir>/accessibility-news/posts`
pub fn default_posts_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_local_dir()
        .context("Could not determine local data directory; set BLOG_POSTS_DIR")?;
    Ok(data_dir.join(APP_DIR).join("posts"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = Config::from_lookup(lookup_from(&[("BLOG_POSTS_DIR", "/tmp/posts")])).unwrap();
        assert!(config.openrouter_api_key.is_none());
        assert!(config.require_openrouter_key().is_err());
        assert_eq!(config.blog_model, DEFAULT_MODEL);
        assert_eq!(config.feeds.len(), 4);
        assert!(config.news_api.is_none());
        assert!(!config.auto_publish);
        assert!(config.revalidate.is_none());
        assert_eq!(config.posts_dir, PathBuf::from("/tmp/posts"));
        assert_eq!(config.settings.window_hours, 72);
        assert_eq!(config.settings.top_n, 7);
    }

    #[test]
    fn reads_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("BLOG_POSTS_DIR", "/srv/posts"),
            ("OPENROUTER_API_KEY", "key"),
            ("OPENROUTER_FACT_CHECK_MODEL", "anthropic/claude-3.5-haiku"),
            ("NEWS_API_KEY", "news"),
            ("RSS_FEEDS", "https://one.example/feed"),
            ("BLOG_AUTO_PUBLISH", "true"),
            ("REVALIDATE_URL", "https://site.example/api/revalidate"),
        ]))
        .unwrap();

        assert_eq!(config.require_openrouter_key().unwrap(), "key");
        assert_eq!(config.fact_check_model, "anthropic/claude-3.5-haiku");
        assert_eq!(config.feeds.len(), 1);
        assert!(config.news_api.is_some());
        assert!(config.auto_publish);
        let revalidate = config.revalidate.unwrap();
        assert!(revalidate.secret.is_none());
    }

    #[test]
    fn auto_publish_requires_literal_true() {
        let config = Config::from_lookup(lookup_from(&[
            ("BLOG_POSTS_DIR", "/tmp/posts"),
            ("BLOG_AUTO_PUBLISH", "yes"),
        ]))
        .unwrap();
        assert!(!config.auto_publish);
    }
}
