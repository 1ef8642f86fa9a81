use std::collections::HashSet;

use crate::models::ExtractedArticle;

/// Merges per-source result sets into the top `limit` unique articles, newest first.
///
/// Duplicates are detected by normalized URL and the first occurrence wins, so
/// source order decides which copy survives. Equal dates keep their merged order.
pub fn aggregate(sets: Vec<Vec<ExtractedArticle>>, limit: usize) -> Vec<ExtractedArticle> {
    let mut seen = HashSet::new();
    let mut merged: Vec<ExtractedArticle> = sets
        .into_iter()
        .flatten()
        .filter(|article| seen.insert(article.dedup_key()))
        .collect();

    merged.sort_by(|a, b| b.published_date.cmp(&a.published_date));
    merged.truncate(limit);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, Utc};
    use pretty_assertions::assert_eq;

    fn base() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-10-16T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn article(url: &str, source: &str, hours_ago: i64) -> ExtractedArticle {
        ExtractedArticle {
            title: format!("Story at {}", url),
            url: url.to_string(),
            source: source.to_string(),
            published_date: base() - Duration::hours(hours_ago),
            content: "body".to_string(),
            excerpt: "body".to_string(),
        }
    }

    #[test]
    fn duplicate_urls_keep_first_occurrence() {
        let sets = vec![
            vec![article("https://x.com/a", "Feed One", 1)],
            vec![article("HTTPS://X.COM/A ", "Feed Two", 0)],
            vec![article("https://x.com/b", "Feed Three", 2)],
        ];

        let merged = aggregate(sets, 7);
        let sources: Vec<&str> = merged.iter().map(|a| a.source.as_str()).collect();
        assert_eq!(sources, vec!["Feed One", "Feed Three"]);
    }

    #[test]
    fn keeps_newest_up_to_limit() {
        let sets = vec![
            (0..10).map(|i| article(&format!("https://a.example/{}", i), "A", i * 3)).collect(),
            (0..10).map(|i| article(&format!("https://b.example/{}", i), "B", i * 3 + 1)).collect(),
        ];

        let merged = aggregate(sets, 7);
        assert_eq!(merged.len(), 7);
        assert!(merged
            .windows(2)
            .all(|pair| pair[0].published_date >= pair[1].published_date));
        assert_eq!(merged[0].url, "https://a.example/0");
        assert_eq!(merged[1].url, "https://b.example/0");
        assert_eq!(merged[6].url, "https://a.example/3");
    }

    #[test]
    fn equal_dates_keep_merge_order() {
        let sets = vec![
            vec![article("https://a.example/1", "A", 5)],
            vec![article("https://b.example/1", "B", 5)],
        ];
        let merged = aggregate(sets, 7);
        assert_eq!(merged[0].source, "A");
        assert_eq!(merged[1].source, "B");
    }

    #[test]
    fn empty_input_is_empty_output() {
        assert!(aggregate(Vec::new(), 7).is_empty());
        assert!(aggregate(vec![Vec::new(), Vec::new()], 7).is_empty());
    }
}
