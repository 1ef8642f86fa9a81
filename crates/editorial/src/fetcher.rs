use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::debug;

use crate::error::FetchError;

/// Text-over-HTTP GET used for feeds, article pages and the news API
#[async_trait]
pub trait PageFetch: Send + Sync {
    async fn fetch_text(&self, url: &str) -> std::result::Result<String, FetchError>;
}

/// Timeout-bounded fetcher that caps concurrent connections across all sources
pub struct HttpFetcher {
    client: Client,
    semaphore: Arc<Semaphore>,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, timeout: Duration, max_connections: usize) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .context("Failed to create HTTP client")?;

        let semaphore = Arc::new(Semaphore::new(max_connections.max(1)));

        Ok(Self { client, semaphore })
    }
}

#[async_trait]
impl PageFetch for HttpFetcher {
    async fn fetch_text(&self, url: &str) -> std::result::Result<String, FetchError> {
        // The semaphore is never closed, so acquire only fails after shutdown
        let _permit = self.semaphore.acquire().await.ok();

        let shown = display_url(url);
        debug!("GET {}", shown);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Http {
                url: shown.clone(),
                source: source.without_url(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: shown,
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|source| FetchError::Http {
            url: shown,
            source: source.without_url(),
        })
    }
}

/// URL without its query string, so API keys passed as parameters stay out of logs
pub fn display_url(url: &str) -> String {
    url.split(['?', '#']).next().unwrap_or(url).to_string()
}
