use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::StorageError;
use crate::models::{GeneratedPost, PostIndexEntry};

const INDEX_FILE: &str = "index.json";
/// Slug whose post file would collide with the index
const RESERVED_SLUG: &str = "index";

/// File-backed post store: one `<slug>.json` per post plus an `index.json` listing
#[derive(Debug, Clone)]
pub struct PostStore {
    dir: PathBuf,
}

impl PostStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes the full record, then upserts its index entry.
    ///
    /// An existing post with the same slug is overwritten and its index entry is
    /// replaced, so the index never holds two entries for one slug.
    pub fn save(&self, post: &GeneratedPost) -> Result<(), StorageError> {
        if !is_valid_slug(&post.slug) {
            return Err(StorageError::InvalidSlug(post.slug.clone()));
        }
        fs::create_dir_all(&self.dir).map_err(|e| StorageError::io(&self.dir, e))?;

        write_json(&self.post_path(&post.slug), post)?;

        let mut index = self.list_all()?;
        let entry = PostIndexEntry::from(post);
        match index.iter_mut().find(|existing| existing.slug == entry.slug) {
            Some(existing) => *existing = entry,
            None => index.push(entry),
        }
        index.sort_by(|a, b| b.published_at.cmp(&a.published_at));

        write_json(&self.index_path(), &index)?;
        info!("Saved post {} ({} posts indexed)", post.slug, index.len());
        Ok(())
    }

    /// Full record for `slug`, or `None` when no such post exists
    pub fn get_by_slug(&self, slug: &str) -> Result<Option<GeneratedPost>, StorageError> {
        if !is_valid_slug(slug) {
            return Ok(None);
        }
        read_json(&self.post_path(slug))
    }

    /// Every index entry, newest first; an absent index is an empty listing
    pub fn list_all(&self) -> Result<Vec<PostIndexEntry>, StorageError> {
        Ok(read_json(&self.index_path())?.unwrap_or_default())
    }

    pub fn list_published(&self) -> Result<Vec<PostIndexEntry>, StorageError> {
        Ok(self
            .list_all()?
            .into_iter()
            .filter(|entry| entry.is_published)
            .collect())
    }

    pub fn exists(&self, slug: &str) -> bool {
        is_valid_slug(slug) && self.post_path(slug).is_file()
    }

    fn post_path(&self, slug: &str) -> PathBuf {
        self.dir.join(format!("{}.json", slug))
    }

    fn index_path(&self) -> PathBuf {
        self.dir.join(INDEX_FILE)
    }
}

/// URL-safe identifier over `[a-z0-9-]`: lowercase, everything else dropped, runs of
/// whitespace/underscores/hyphens collapsed to one hyphen, no leading or trailing hyphen.
///
/// A title that reduces to `index` becomes `index-post` so its file cannot
/// overwrite the post index.
pub fn generate_slug(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_separator = false;

    for ch in title.to_lowercase().chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(ch);
        } else if ch.is_whitespace() || ch == '-' || ch == '_' {
            pending_separator = true;
        }
    }

    if slug == RESERVED_SLUG {
        slug.push_str("-post");
    }
    slug
}

/// Slugs the store accepts as file stems
fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug != RESERVED_SLUG
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && slug
            .chars()
            .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-')
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StorageError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("{} not found", path.display());
            return Ok(None);
        }
        Err(e) => return Err(StorageError::io(path, e)),
    };

    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| StorageError::json(path, e))
}

/// Serializes to a sibling temp file, then renames it over `path`
fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StorageError> {
    let json = serde_json::to_string_pretty(value).map_err(|e| StorageError::json(path, e))?;

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).map_err(|e| StorageError::io(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| StorageError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FactCheckStatus, SourceRef};
    use chrono::{DateTime, Duration, Utc};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn at(hours_ago: i64) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-10-16T08:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
            - Duration::hours(hours_ago)
    }

    fn post(title: &str, hours_ago: i64) -> GeneratedPost {
        GeneratedPost {
            slug: generate_slug(title),
            title: title.to_string(),
            content: "## Section\n\nBody".to_string(),
            excerpt: "Body".to_string(),
            published_at: at(hours_ago),
            generated_at: at(hours_ago),
            sources: vec![SourceRef {
                title: "Source".to_string(),
                url: "https://a.example/1".to_string(),
                source: "A11y Project".to_string(),
            }],
            fact_check_status: FactCheckStatus::Verified,
            fact_check_notes: "ok".to_string(),
            is_published: false,
            tags: vec!["accessibility".to_string()],
        }
    }

    #[test]
    fn slug_examples() {
        assert_eq!(generate_slug("Hello, World!"), "hello-world");
        assert_eq!(generate_slug("  WCAG 2.2:  What's New?  "), "wcag-22-whats-new");
        assert_eq!(generate_slug("snake_case -- and  dashes"), "snake-case-and-dashes");
        assert_eq!(generate_slug("---"), "");
    }

    #[test]
    fn slugs_stay_within_ascii_charset() {
        for title in [
            "Café Accessibility Update",
            "Ärzte und Barrierefreiheit",
            "屏幕阅读器 screen readers",
            "WCAG ２.２ notes",
        ] {
            let slug = generate_slug(title);
            assert!(
                slug.chars()
                    .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-'),
                "{:?} -> {:?}",
                title,
                slug
            );
            assert!(!slug.starts_with('-') && !slug.ends_with('-'));
        }
        assert_eq!(generate_slug("Café Accessibility Update"), "caf-accessibility-update");
        assert_eq!(generate_slug("屏幕阅读器 screen readers"), "screen-readers");
    }

    #[test]
    fn post_titled_index_leaves_the_index_intact() {
        let dir = TempDir::new().unwrap();
        let store = PostStore::new(dir.path());
        store.save(&post("WCAG Weekly", 2)).unwrap();

        let index_post = post("Index", 1);
        assert_eq!(index_post.slug, "index-post");
        store.save(&index_post).unwrap();

        let slugs: Vec<String> = store.list_all().unwrap().into_iter().map(|e| e.slug).collect();
        assert_eq!(slugs, vec!["index-post", "wcag-weekly"]);
        assert_eq!(store.get_by_slug("index").unwrap(), None);
        assert!(!store.exists("index"));
    }

    #[test]
    fn unsafe_slugs_are_rejected_before_writing() {
        let dir = TempDir::new().unwrap();
        let store = PostStore::new(dir.path());
        store.save(&post("WCAG Weekly", 2)).unwrap();

        for slug in ["index", "../escape", "Caps", ""] {
            let mut bad = post("Anything", 1);
            bad.slug = slug.to_string();
            assert!(matches!(store.save(&bad), Err(StorageError::InvalidSlug(_))));
        }

        assert_eq!(store.list_all().unwrap().len(), 1);
        assert!(!dir.path().join("escape.json").exists());
    }

    #[test]
    fn save_then_get_round_trips() {
        let dir = TempDir::new().unwrap();
        let store = PostStore::new(dir.path().join("posts"));
        let original = post("WCAG Weekly", 1);

        store.save(&original).unwrap();

        assert!(store.exists(&original.slug));
        assert_eq!(store.get_by_slug(&original.slug).unwrap(), Some(original.clone()));
        assert_eq!(store.list_all().unwrap(), vec![PostIndexEntry::from(&original)]);
    }

    #[test]
    fn saving_same_slug_twice_updates_in_place() {
        let dir = TempDir::new().unwrap();
        let store = PostStore::new(dir.path());
        let mut first = post("WCAG Weekly", 1);
        store.save(&first).unwrap();

        first.excerpt = "Updated".to_string();
        first.is_published = true;
        store.save(&first).unwrap();

        let index = store.list_all().unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index[0].excerpt, "Updated");
        assert_eq!(store.list_published().unwrap().len(), 1);
    }

    #[test]
    fn index_is_newest_first() {
        let dir = TempDir::new().unwrap();
        let store = PostStore::new(dir.path());
        store.save(&post("Middle", 5)).unwrap();
        store.save(&post("Oldest", 10)).unwrap();
        store.save(&post("Newest", 1)).unwrap();

        let slugs: Vec<String> = store.list_all().unwrap().into_iter().map(|e| e.slug).collect();
        assert_eq!(slugs, vec!["newest", "middle", "oldest"]);
    }

    #[test]
    fn missing_files_read_as_empty() {
        let dir = TempDir::new().unwrap();
        let store = PostStore::new(dir.path().join("never-created"));
        assert!(store.list_all().unwrap().is_empty());
        assert_eq!(store.get_by_slug("nope").unwrap(), None);
        assert!(!store.exists("nope"));
    }

    #[test]
    fn corrupt_index_is_an_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(INDEX_FILE), "{ not json").unwrap();
        let store = PostStore::new(dir.path());

        assert!(matches!(store.list_all(), Err(StorageError::Json { .. })));
        assert!(store.save(&post("Anything", 1)).is_err());
    }

    #[test]
    fn writes_camel_case_keys_and_no_temp_files() {
        let dir = TempDir::new().unwrap();
        let store = PostStore::new(dir.path());
        store.save(&post("Keys", 1)).unwrap();

        let raw = fs::read_to_string(dir.path().join("keys.json")).unwrap();
        assert!(raw.contains("\"factCheckStatus\": \"verified\""));
        assert!(raw.contains("\"publishedAt\""));
        assert!(raw.contains("\"isPublished\": false"));

        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }
}
