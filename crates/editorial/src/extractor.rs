//! Main-content extraction from fetched article pages.
//!
//! Scores paragraph containers the way readability-style extractors do and
//! falls back to the page body with scripts and styles removed. Nothing in here
//! returns an error: an unusable page yields empty content and the caller skips it.

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

/// Excerpt length for harvested articles
pub const ARTICLE_EXCERPT_CHARS: usize = 200;
pub const MAX_TAGS: usize = 10;

/// Tag vocabulary, in the order tags are reported
pub const TAG_KEYWORDS: &[&str] = &[
    "wcag",
    "accessibility",
    "a11y",
    "ada",
    "section 508",
    "screen reader",
    "keyboard navigation",
    "aria",
    "semantic html",
    "alt text",
    "contrast",
    "focus",
    "assistive technology",
    "inclusive design",
    "web accessibility",
    "digital accessibility",
];

const NON_CONTENT_TAGS: &[&str] = &["script", "style", "noscript", "template", "svg", "iframe"];
const BOILERPLATE_TAGS: &[&str] = &["nav", "header", "footer", "aside", "form", "button"];
const BOILERPLATE_HINTS: &[&str] = &[
    "nav", "menu", "footer", "sidebar", "comment", "share", "social", "advert", "promo",
    "cookie", "newsletter", "related", "breadcrumb", "banner", "popup",
];
const BLOCK_TAGS: &[&str] = &[
    "p", "div", "section", "article", "main", "br", "li", "ul", "ol", "h1", "h2", "h3", "h4",
    "h5", "h6", "blockquote", "pre", "table", "tr", "figcaption",
];

const MIN_PARAGRAPH_CHARS: usize = 25;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessedContent {
    pub content: String,
    pub excerpt: String,
    pub tags: Vec<String>,
}

/// Extracts readable content, an excerpt and topic tags from a page
pub fn extract(html: &str, url: &str, title: &str) -> ProcessedContent {
    let document = Html::parse_document(html);

    let content = match main_content(&document) {
        Some(text) if !text.is_empty() => text,
        _ => {
            debug!("No main content block found for {}, using page body", url);
            body_text(&document)
        }
    };

    let excerpt = generate_excerpt(&content, ARTICLE_EXCERPT_CHARS);
    let tags = extract_tags(&content, title);

    ProcessedContent {
        content: content.trim().to_string(),
        excerpt,
        tags,
    }
}

/// Converts an HTML fragment such as a feed summary into plain text
pub fn fragment_text(html: &str) -> String {
    let text = html2text::from_read(html.as_bytes(), 100);
    collapse_whitespace(&text)
}

/// Collapses whitespace and cuts at the last word boundary so the result,
/// ellipsis included, fits in `max_chars`.
pub fn generate_excerpt(content: &str, max_chars: usize) -> String {
    let cleaned = collapse_whitespace(content);
    if cleaned.chars().count() <= max_chars {
        return cleaned;
    }

    let budget = max_chars.saturating_sub(3);
    let cut = cleaned
        .char_indices()
        .nth(budget)
        .map(|(idx, _)| idx)
        .unwrap_or(cleaned.len());
    let truncated = &cleaned[..cut];

    match truncated.rfind(' ') {
        Some(idx) if idx > 0 => format!("{}...", &truncated[..idx]),
        _ => format!("{}...", truncated),
    }
}

/// Tags found in `title + content`, in vocabulary order, at most [`MAX_TAGS`]
pub fn extract_tags(content: &str, title: &str) -> Vec<String> {
    let text = format!("{} {}", title, content).to_lowercase();
    TAG_KEYWORDS
        .iter()
        .filter(|keyword| text.contains(*keyword))
        .take(MAX_TAGS)
        .map(|keyword| keyword.to_string())
        .collect()
}

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

fn main_content(document: &Html) -> Option<String> {
    let paragraphs = selector("p")?;
    // First-seen order, so ties resolve the same way on every run
    let mut candidates: Vec<(ElementRef<'_>, usize)> = Vec::new();

    for paragraph in document.select(&paragraphs) {
        if inside_boilerplate(&paragraph) {
            continue;
        }

        let text = collapse_whitespace(&paragraph.text().collect::<String>());
        let length = text.chars().count();
        if length < MIN_PARAGRAPH_CHARS {
            continue;
        }

        // Longer paragraphs and comma-heavy prose weigh more
        let score = 1 + text.matches(',').count() + (length / 100).min(3);

        let Some(parent) = paragraph.parent().and_then(ElementRef::wrap) else {
            continue;
        };
        add_score(&mut candidates, parent, score * 2);

        if let Some(grandparent) = parent.parent().and_then(ElementRef::wrap) {
            add_score(&mut candidates, grandparent, score);
        }
    }

    // `max_by_key` keeps the last maximum; reversing makes the earliest container win
    let (best, _) = candidates
        .into_iter()
        .rev()
        .max_by_key(|(_, score)| *score)?;

    let text = element_text(best, true);
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn add_score<'a>(
    candidates: &mut Vec<(ElementRef<'a>, usize)>,
    element: ElementRef<'a>,
    score: usize,
) {
    match candidates.iter_mut().find(|(seen, _)| seen.id() == element.id()) {
        Some((_, total)) => *total += score,
        None => candidates.push((element, score)),
    }
}

fn body_text(document: &Html) -> String {
    let root = selector("body")
        .and_then(|body| document.select(&body).next())
        .unwrap_or_else(|| document.root_element());
    element_text(root, false)
}

fn element_text(element: ElementRef<'_>, skip_boilerplate: bool) -> String {
    let mut raw = String::new();
    collect_text(element, skip_boilerplate, &mut raw);

    raw.lines()
        .map(collapse_whitespace)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn collect_text(element: ElementRef<'_>, skip_boilerplate: bool, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
            continue;
        }

        let Some(child) = ElementRef::wrap(child) else {
            continue;
        };
        let name = child.value().name();
        if NON_CONTENT_TAGS.contains(&name) {
            continue;
        }
        if skip_boilerplate && is_boilerplate(&child) {
            continue;
        }

        let block = BLOCK_TAGS.contains(&name);
        if block {
            out.push('\n');
        }
        collect_text(child, skip_boilerplate, out);
        if block {
            out.push('\n');
        }
    }
}

fn is_boilerplate(element: &ElementRef<'_>) -> bool {
    let value = element.value();
    if BOILERPLATE_TAGS.contains(&value.name()) {
        return true;
    }
    if matches!(value.attr("role"), Some("navigation" | "banner" | "contentinfo")) {
        return true;
    }

    let markers = format!(
        "{} {}",
        value.attr("class").unwrap_or(""),
        value.id().unwrap_or("")
    )
    .to_lowercase();
    BOILERPLATE_HINTS.iter().any(|hint| markers.contains(hint))
}

/// Page-level classes on `<body>` or `<html>` (`has-sidebar`, `menu-open`) say
/// nothing about a paragraph, so the walk stops below them.
fn inside_boilerplate(element: &ElementRef<'_>) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .take_while(|ancestor| !matches!(ancestor.value().name(), "body" | "html"))
        .any(|ancestor| is_boilerplate(&ancestor))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
