use anyhow::Context;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::RevalidateConfig;

#[derive(Serialize)]
struct RevalidateRequest<'a> {
    path: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    secret: Option<&'a str>,
}

/// Asks the site to rebuild cached pages after a post is saved
pub struct Revalidator {
    client: Client,
    config: RevalidateConfig,
}

impl Revalidator {
    pub fn new(config: RevalidateConfig, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { client, config })
    }

    /// Paths that must be refreshed when `slug` changes
    pub fn paths_for(slug: &str) -> [String; 2] {
        ["/blog".to_string(), format!("/blog/{}", slug)]
    }

    /// Best effort: failures are logged and never propagated
    pub async fn revalidate(&self, slug: &str) {
        for path in Self::paths_for(slug) {
            let body = RevalidateRequest {
                path: &path,
                secret: self.config.secret.as_deref(),
            };

            let result = self
                .client
                .post(&self.config.url)
                .json(&body)
                .send()
                .await
                .and_then(|response| response.error_for_status());

            match result {
                Ok(_) => info!("Revalidated {}", path),
                Err(e) => warn!("Revalidation of {} failed (non-critical): {}", path, e.without_url()),
            }
        }
    }
}
