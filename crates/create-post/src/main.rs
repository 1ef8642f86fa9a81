use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::Parser;
use editorial::storage::generate_slug;
use editorial::{Config, FactCheckStatus, GeneratedPost, PostStore};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

const DEFAULT_EXCERPT_CHARS: usize = 300;

#[derive(Parser)]
#[command(name = "create-post")]
#[command(about = "Create a hand-written blog post and add it to the post index")]
struct Args {
    /// Post title; the slug is derived from it
    #[arg(short, long)]
    title: String,

    /// Markdown body, or a path to a markdown file
    #[arg(short, long)]
    content: String,

    /// Listing excerpt (defaults to the start of the body)
    #[arg(short, long)]
    excerpt: Option<String>,

    /// Publication date, YYYY-MM-DD or RFC 3339 (defaults to now)
    #[arg(long)]
    published_at: Option<String>,

    /// Fact-check status (verified, needs_review)
    #[arg(long, default_value = "needs_review")]
    fact_check: FactCheckStatus,

    /// Save as a draft instead of publishing
    #[arg(long)]
    draft: bool,

    /// Comma-separated tags
    #[arg(
        long,
        value_delimiter = ',',
        default_values_t = ["accessibility".to_string(), "WCAG".to_string()]
    )]
    tags: Vec<String>,

    /// Directory holding post files and index.json (overrides BLOG_POSTS_DIR)
    #[arg(short, long)]
    posts_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    println!("📝 Create New Blog Post\n");

    let posts_dir = match args.posts_dir {
        Some(dir) => dir,
        None => Config::from_env()?.posts_dir,
    };

    let content = read_content(&args.content)?;
    let slug = generate_slug(&args.title);
    if slug.is_empty() {
        anyhow::bail!("Title '{}' does not produce a usable slug", args.title);
    }

    let now = Utc::now();
    let published_at = match args.published_at.as_deref() {
        Some(raw) => parse_date(raw)?,
        None => now,
    };

    let post = GeneratedPost {
        slug: slug.clone(),
        title: args.title,
        excerpt: args
            .excerpt
            .filter(|excerpt| !excerpt.trim().is_empty())
            .unwrap_or_else(|| default_excerpt(&content)),
        content,
        published_at,
        generated_at: now,
        sources: Vec::new(),
        fact_check_status: args.fact_check,
        fact_check_notes: String::new(),
        is_published: !args.draft,
        tags: args
            .tags
            .iter()
            .map(|tag| tag.trim().to_string())
            .filter(|tag| !tag.is_empty())
            .collect(),
    };

    let store = PostStore::new(&posts_dir);
    if store.exists(&slug) {
        println!("⚠ Replacing existing post with slug {}", slug);
    }
    store.save(&post).context("Failed to save blog post")?;

    println!("✅ Blog post created successfully!");
    println!("   Slug: {}", slug);
    println!("   File: {}", posts_dir.join(format!("{}.json", slug)).display());
    println!("   URL: /blog/{}", slug);
    println!(
        "   Status: {}",
        if post.is_published { "Published" } else { "Draft" }
    );

    Ok(())
}

/// Reads the body from a file when the argument names one, otherwise uses it verbatim
fn read_content(arg: &str) -> Result<String> {
    let path = Path::new(arg);
    if path.is_file() {
        fs::read_to_string(path)
            .with_context(|| format!("Failed to read content file: {}", path.display()))
    } else {
        Ok(arg.to_string())
    }
}

fn parse_date(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }

    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD or RFC 3339", raw))?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .context("Invalid time of day")?;
    Ok(midnight.and_utc())
}

/// First 300 characters with line breaks flattened, followed by `...`
fn default_excerpt(content: &str) -> String {
    let head: String = content.chars().take(DEFAULT_EXCERPT_CHARS).collect();
    format!("{}...", head.replace('\n', " "))
}
