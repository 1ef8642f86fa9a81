use std::sync::Arc;
use tracing::info;

use crate::error::SynthesisError;
use crate::llm::{CompletionRequest, CompletionService};
use crate::models::ExtractedArticle;

const SYSTEM_PROMPT: &str = "You are an expert accessibility content writer who creates \
well-structured, informative blog posts about web accessibility and WCAG compliance.";

const TEMPERATURE: f32 = 0.7;
const MAX_TOKENS: u32 = 4000;

/// Turns the aggregated articles into one long-form markdown article
pub struct Synthesizer {
    service: Arc<dyn CompletionService>,
    prompt_chars_per_article: usize,
    window_hours: i64,
}

impl Synthesizer {
    pub fn new(
        service: Arc<dyn CompletionService>,
        prompt_chars_per_article: usize,
        window_hours: i64,
    ) -> Self {
        Self {
            service,
            prompt_chars_per_article,
            window_hours,
        }
    }

    pub async fn synthesize(&self, articles: &[ExtractedArticle]) -> Result<String, SynthesisError> {
        if articles.is_empty() {
            return Err(SynthesisError::NoArticles);
        }

        let request = CompletionRequest {
            system: SYSTEM_PROMPT.to_string(),
            user: self.build_prompt(articles),
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
            json_response: false,
        };

        let markdown = self.service.complete(&request).await?;
        info!("Blog post generated from {} articles", articles.len());
        Ok(markdown)
    }

    pub fn build_prompt(&self, articles: &[ExtractedArticle]) -> String {
        let articles_text = articles
            .iter()
            .enumerate()
            .map(|(index, article)| {
                format!(
                    "Article {}:\nTitle: {}\nSource: {}\nURL: {}\nPublished: {}\nContent: {}",
                    index + 1,
                    article.title,
                    article.source,
                    article.url,
                    article.published_date.to_rfc3339(),
                    truncate_chars(&article.content, self.prompt_chars_per_article)
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n---\n\n");

        format!(
            r#"You are a professional accessibility content writer. Create a comprehensive, well-structured blog post that consolidates and synthesizes the following accessibility articles from the last {hours} hours.

Articles:
{articles}

Requirements:
1. Create a single, cohesive blog post (not a list of articles)
2. Synthesize information from all articles into a unified narrative
3. Use proper markdown formatting with headings, paragraphs, and lists
4. Include a "Sources" section at the end with all article titles, sources, and URLs
5. Write in a professional, engaging tone suitable for accessibility professionals
6. Focus on key insights, trends, and important information
7. Ensure the content is accurate and well-organized
8. The blog post should be substantial (at least 800 words)
9. Use H2 headings for main sections
10. Include an introduction and conclusion

Format the response as clean markdown. Do not include a title in the markdown (we'll add that separately)."#,
            hours = self.window_hours,
            articles = articles_text
        )
    }
}

/// First `max_chars` characters, with `...` appended when anything was cut
fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}
