use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP error for {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },
}

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("completion request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("completion API error: {status} - {body}")]
    Api { status: u16, body: String },

    #[error("no response from completion API")]
    NoChoices,

    #[error("empty response from completion API")]
    EmptyContent,
}

#[derive(Debug, thiserror::Error)]
pub enum SynthesisError {
    #[error("no articles provided for synthesis")]
    NoArticles,

    #[error(transparent)]
    Llm(#[from] LlmError),
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error at {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON in {}: {}", .path.display(), .source)]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid post slug '{0}'")]
    InvalidSlug(String),
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }
}

/// Hard failures of a pipeline run, one variant per stage that may abort it
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("synthesis stage failed: {0}")]
    Synthesis(#[from] SynthesisError),

    #[error("storage stage failed: {0}")]
    Storage(#[from] StorageError),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
