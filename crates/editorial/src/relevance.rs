//! Keyword-based relevance checks for accessibility news.
//!
//! Feed sources are pre-curated, so they get the lenient check. Search-API results
//! are noisy and must pass the strict multi-signal check.

/// Vocabulary that marks text as accessibility/compliance related
pub const ACCESSIBILITY_KEYWORDS: &[&str] = &[
    "accessibility",
    "web accessibility",
    "wcag",
    "wcag 2.1",
    "wcag 2.2",
    "wcag 3.0",
    "ada",
    "ada compliance",
    "americans with disabilities act",
    "section 508",
    "accessibility lawsuit",
    "ada lawsuit",
    "digital accessibility",
    "a11y",
    "assistive technology",
    "screen reader",
    "keyboard navigation",
    "aria",
    "inclusive design",
    "accessible design",
    "accessibility compliance",
    "accessibility audit",
    "accessibility testing",
    "accessibility standards",
    "accessibility guidelines",
    "accessibility requirements",
    "accessible website",
    "accessible web",
    "web content accessibility",
];

/// High-confidence unrelated topics that can slip into curated feeds
pub const OFF_TOPIC_TERMS: &[&str] = &[
    "cybersecurity",
    "meat packaging",
    "food packaging",
    "stock market",
    "cryptocurrency",
    "bitcoin",
    "real estate",
    "automotive",
];

/// Terms that on their own indicate the article is about accessibility
pub const PRIMARY_TERMS: &[&str] = &[
    "accessibility",
    "wcag",
    "ada",
    "section 508",
    "a11y",
    "accessible",
];

/// Contextual terms that corroborate a single primary-term hit
pub const SUPPORTING_TERMS: &[&str] = &[
    "website",
    "web",
    "digital",
    "compliance",
    "guidelines",
    "standards",
    "lawsuit",
    "disabilities",
    "disability",
    "screen reader",
    "keyboard",
    "assistive",
    "inclusive",
    "audit",
];

/// Returns true when the lower-cased text contains any vocabulary term
pub fn is_accessibility_related(text: &str) -> bool {
    let lower = text.to_lowercase();
    contains_any(&lower, ACCESSIBILITY_KEYWORDS)
}

/// Lenient gate for feed-sourced items: reject only when an off-topic term is
/// present and nothing accessibility related is.
pub fn passes_lenient_check(text: &str) -> bool {
    let lower = text.to_lowercase();
    let off_topic = contains_any(&lower, OFF_TOPIC_TERMS);
    !off_topic || contains_any(&lower, ACCESSIBILITY_KEYWORDS)
}

/// Strict gate for search-API items.
///
/// Requires two distinct primary terms, or one primary term plus a supporting
/// term, and then the general vocabulary check over the same text.
pub fn passes_strict_check(text: &str) -> bool {
    let lower = text.to_lowercase();

    let primary_hits = PRIMARY_TERMS
        .iter()
        .filter(|term| lower.contains(*term))
        .count();
    let has_support = contains_any(&lower, SUPPORTING_TERMS);

    let enough_signal = primary_hits >= 2 || (primary_hits >= 1 && has_support);
    enough_signal && contains_any(&lower, ACCESSIBILITY_KEYWORDS)
}

fn contains_any(lower: &str, terms: &[&str]) -> bool {
    terms.iter().any(|term| lower.contains(term))
}
