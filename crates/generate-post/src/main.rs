use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use editorial::{Collector, Config, FactCheckStatus, Pipeline};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "generate-post")]
#[command(about = "Harvest recent accessibility news and turn it into a fact-checked blog post")]
struct Args {
    /// Only harvest and list the selected articles; no model calls, nothing written
    #[arg(long)]
    harvest_only: bool,

    /// Directory holding post files and index.json (overrides BLOG_POSTS_DIR)
    #[arg(short, long)]
    posts_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let args = Args::parse();
    let mut config = Config::from_env()?;
    if let Some(dir) = args.posts_dir {
        config.posts_dir = dir;
    }

    let now = Utc::now();

    if args.harvest_only {
        return harvest_only(&config, now).await;
    }

    let pipeline = Pipeline::from_config(&config)?;
    println!(
        "📰 Harvesting accessibility news from {} sources (last {} hours)...",
        pipeline.collector().source_count(),
        config.settings.window_hours
    );
    println!("  (This may take a minute...)");

    let report = pipeline.run(now).await.context("Blog generation failed")?;

    println!("✓ Synthesized from {} articles", report.articles_considered);
    match report.post.fact_check_status {
        FactCheckStatus::Verified => println!("✓ Fact-check: verified"),
        FactCheckStatus::NeedsReview => {
            println!("⚠ Fact-check: needs review");
            println!("  {}", report.fact_check_notes);
        }
    }

    println!("\n✅ Blog post saved: {}", report.post.title);
    println!("   Slug: {}", report.post.slug);
    println!(
        "   File: {}",
        config.posts_dir.join(format!("{}.json", report.post.slug)).display()
    );
    println!(
        "   Status: {}",
        if report.post.is_published { "Published" } else { "Draft" }
    );

    Ok(())
}

async fn harvest_only(config: &Config, now: chrono::DateTime<Utc>) -> Result<()> {
    let collector = Collector::from_config(config)?;
    println!(
        "📰 Checking {} sources (last {} hours)...",
        collector.source_count(),
        config.settings.window_hours
    );

    let articles = collector.collect(now).await;
    if articles.is_empty() {
        println!("No accessibility articles found in the last {} hours.", config.settings.window_hours);
        return Ok(());
    }

    println!("✓ Selected {} articles\n", articles.len());
    for (idx, article) in articles.iter().enumerate() {
        println!("{}. {}", idx + 1, article.title);
        println!("   Source: {}", article.source);
        println!("   URL: {}", article.url);
        println!("   Published: {}", article.published_date.format("%Y-%m-%d %H:%M UTC"));
        if !article.excerpt.is_empty() {
            println!("   {}", article.excerpt);
        }
        println!();
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
