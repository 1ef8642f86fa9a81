use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One harvested candidate article, normalized across feed and search-API sources
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedArticle {
    pub title: String,
    pub url: String,
    pub source: String,
    pub published_date: DateTime<Utc>,
    pub content: String,
    pub excerpt: String,
}

impl ExtractedArticle {
    /// Key used for cross-source deduplication
    pub fn dedup_key(&self) -> String {
        self.url.trim().to_lowercase()
    }
}

/// Provenance entry for an article that fed a synthesis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    pub title: String,
    pub url: String,
    pub source: String,
}

impl From<&ExtractedArticle> for SourceRef {
    fn from(article: &ExtractedArticle) -> Self {
        Self {
            title: article.title.clone(),
            url: article.url.clone(),
            source: article.source.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactCheckStatus {
    Verified,
    NeedsReview,
}

impl FactCheckStatus {
    pub fn from_verdict(verified: bool) -> Self {
        if verified {
            Self::Verified
        } else {
            Self::NeedsReview
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Verified => "verified",
            Self::NeedsReview => "needs_review",
        }
    }
}

impl std::str::FromStr for FactCheckStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "verified" => Ok(Self::Verified),
            "needs_review" => Ok(Self::NeedsReview),
            other => Err(format!(
                "unknown fact-check status '{}', expected 'verified' or 'needs_review'",
                other
            )),
        }
    }
}

/// Verdict returned by the fact-checking model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactCheckResult {
    pub verified: bool,
    pub notes: String,
}

/// The durable output of a pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedPost {
    pub slug: String,
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub published_at: DateTime<Utc>,
    pub generated_at: DateTime<Utc>,
    pub sources: Vec<SourceRef>,
    pub fact_check_status: FactCheckStatus,
    #[serde(default)]
    pub fact_check_notes: String,
    pub is_published: bool,
    pub tags: Vec<String>,
}

/// Lightweight projection of a post kept in the listing index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostIndexEntry {
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub published_at: DateTime<Utc>,
    pub fact_check_status: FactCheckStatus,
    pub is_published: bool,
}

impl From<&GeneratedPost> for PostIndexEntry {
    fn from(post: &GeneratedPost) -> Self {
        Self {
            slug: post.slug.clone(),
            title: post.title.clone(),
            excerpt: post.excerpt.clone(),
            published_at: post.published_at,
            fact_check_status: post.fact_check_status,
            is_published: post.is_published,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fact_check_status_uses_snake_case_on_the_wire() {
        let json = serde_json::to_string(&FactCheckStatus::NeedsReview).unwrap();
        assert_eq!(json, "\"needs_review\"");
        let parsed: FactCheckStatus = serde_json::from_str("\"verified\"").unwrap();
        assert_eq!(parsed, FactCheckStatus::Verified);
    }

    #[test]
    fn fact_check_status_parses_cli_values() {
        assert_eq!("verified".parse::<FactCheckStatus>(), Ok(FactCheckStatus::Verified));
        assert_eq!(" needs_review ".parse::<FactCheckStatus>(), Ok(FactCheckStatus::NeedsReview));
        assert!("maybe".parse::<FactCheckStatus>().is_err());
    }

    #[test]
    fn dedup_key_ignores_case_and_surrounding_whitespace() {
        let article = ExtractedArticle {
            title: "t".to_string(),
            url: "  HTTP://Example.com/A ".to_string(),
            source: "s".to_string(),
            published_date: Utc::now(),
            content: String::new(),
            excerpt: String::new(),
        };
        assert_eq!(article.dedup_key(), "http://example.com/a");
    }
}
