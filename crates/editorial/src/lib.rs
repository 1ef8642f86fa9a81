pub mod aggregator;
pub mod config;
pub mod error;
pub mod extractor;
pub mod fact_checker;
pub mod fetcher;
pub mod harvester;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod relevance;
pub mod revalidate;
pub mod sources;
pub mod storage;
pub mod synthesizer;

pub use config::Config;
pub use error::PipelineError;
pub use models::{ExtractedArticle, FactCheckStatus, GeneratedPost, PostIndexEntry};
pub use pipeline::{Collector, Pipeline, RunReport};
pub use storage::PostStore;
