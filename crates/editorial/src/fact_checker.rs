//! Second-opinion review of a synthesized article.
//!
//! The verdict never fails the run. Transport errors, unparseable replies and
//! replies with the wrong shape all degrade to `verified: false` with a note
//! asking for manual review, so the post is still stored for triage.

use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::llm::{CompletionRequest, CompletionService};
use crate::models::FactCheckResult;

const SYSTEM_PROMPT: &str = "You are a fact-checker for accessibility content. You verify the \
accuracy of WCAG guidelines, accessibility standards, legal information, and technical details. \
Always respond with valid JSON only.";

const TEMPERATURE: f32 = 0.3;
const MAX_TOKENS: u32 = 1000;

/// Strictly typed reply; a missing or mistyped field rejects the candidate
#[derive(Deserialize)]
struct Verdict {
    verified: bool,
    notes: String,
}

pub struct FactChecker {
    service: Arc<dyn CompletionService>,
}

impl FactChecker {
    pub fn new(service: Arc<dyn CompletionService>) -> Self {
        Self { service }
    }

    pub async fn fact_check(&self, content: &str, title: &str) -> FactCheckResult {
        let request = CompletionRequest {
            system: SYSTEM_PROMPT.to_string(),
            user: build_prompt(content, title),
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
            json_response: true,
        };

        let reply = match self.service.complete(&request).await {
            Ok(reply) => reply,
            Err(e) => return review_required(&e.to_string()),
        };

        match parse_verdict(&reply) {
            Some(result) => {
                info!(
                    "Fact-check completed: {}",
                    if result.verified { "Verified" } else { "Needs Review" }
                );
                result
            }
            None => review_required("Failed to parse fact-check response as JSON"),
        }
    }
}

fn review_required(reason: &str) -> FactCheckResult {
    warn!("Fact-checking failed: {}", reason);
    FactCheckResult {
        verified: false,
        notes: format!("Fact-checking failed: {}. Manual review required.", reason),
    }
}

/// Tries each recovery strategy in turn; the first well-formed verdict wins
fn parse_verdict(reply: &str) -> Option<FactCheckResult> {
    let strategies: [fn(&str) -> Option<&str>; 3] = [direct, fenced_block, outer_braces];

    strategies
        .iter()
        .filter_map(|strategy| strategy(reply))
        .find_map(|candidate| serde_json::from_str::<Verdict>(candidate.trim()).ok())
        .map(|verdict| FactCheckResult {
            verified: verdict.verified,
            notes: verdict.notes,
        })
}

fn direct(reply: &str) -> Option<&str> {
    Some(reply)
}

/// Body of a ```json (or bare ```) fenced block containing an object
fn fenced_block(reply: &str) -> Option<&str> {
    let start = reply.find("```")?;
    let after_fence = &reply[start + 3..];
    let body = after_fence.strip_prefix("json").unwrap_or(after_fence);
    let end = body.find("```")?;
    let inner = body[..end].trim();
    inner.starts_with('{').then_some(inner)
}

/// Span from the first `{` to the last `}`
fn outer_braces(reply: &str) -> Option<&str> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    (end > start).then(|| &reply[start..=end])
}

fn build_prompt(content: &str, title: &str) -> String {
    format!(
        r#"You are a fact-checker specializing in web accessibility and WCAG compliance. Review the following blog post for factual accuracy.

Title: {title}

Content:
{content}

Please check for:
1. Accuracy of WCAG compliance claims and guidelines
2. Correctness of dates, statistics, and technical information
3. Verification of accessibility standards and best practices
4. Any misleading or incorrect statements about accessibility
5. Accuracy of legal information (ADA, Section 508, etc.)
6. Technical accuracy of implementation details

Respond with a JSON object in this exact format:
{{
  "verified": true or false,
  "notes": "Detailed explanation of any issues found, or 'All facts verified' if everything is correct"
}}

If the content is factually correct, set "verified" to true. If there are any factual errors, inaccuracies, or unverified claims, set "verified" to false and provide detailed notes.

Return ONLY the JSON object, no other text."#
    )
}
