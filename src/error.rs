//! Error types for each external collaborator and pipeline stage.
//!
//! The split mirrors how failures are handled:
//! - [`ArticleError`] is recovered locally by the corpus builder (skip and count).
//! - [`FeedError`], [`OracleError`], [`AnnotateError`] and [`ExtractError`] are
//!   fatal to the call that raised them and always propagate.

use thiserror::Error;

/// A metadata query against the news feed failed.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("feed request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("feed returned HTTP {status} for {url}")]
    Status { status: u16, url: String },

    #[error("feed XML parse error: {0}")]
    Xml(#[from] quick_xml::de::DeError),

    #[error("malformed feed item: {0}")]
    Malformed(String),

    #[error("invalid feed URL: {0}")]
    Url(#[from] url::ParseError),
}

/// A single article could not be resolved to text.
#[derive(Debug, Error)]
pub enum ArticleError {
    #[error("article request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("article returned HTTP {status}")]
    Status { status: u16 },

    #[error("article at {url} has no extractable text")]
    Empty { url: String },
}

/// The annotator could not produce an annotated corpus.
#[derive(Debug, Error)]
pub enum AnnotateError {
    #[error("annotator request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("annotator returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("annotator response is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no annotator model configured for language '{0}'")]
    NoModel(String),

    #[error("malformed CoNLL-U at line {line}: {reason}")]
    Conllu { line: usize, reason: String },
}

/// Term extraction failed for one corpus.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("term '{0}' not present in vocabulary")]
    TermNotFound(String),
}

/// A relatedness query failed; the enclosing score is discarded.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("oracle request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("oracle returned HTTP {status} for {url}")]
    Status { status: u16, url: String },

    #[error("oracle response is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("oracle response has no numeric 'value' field: {0}")]
    MissingValue(String),
}

/// Loading the YAML configuration failed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Yaml {
        path: String,
        source: serde_yaml::Error,
    },
}

/// Collecting one window (crawl + build + optional persist) failed.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error(transparent)]
    Feed(#[from] FeedError),

    #[error("cannot write corpus: {0}")]
    Io(#[from] std::io::Error),
}

/// Top-level failure of a drift or extraction run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Collect(#[from] CollectError),

    #[error(transparent)]
    Annotate(#[from] AnnotateError),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Oracle(#[from] OracleError),
}

impl From<FeedError> for PipelineError {
    fn from(e: FeedError) -> Self {
        PipelineError::Collect(CollectError::Feed(e))
    }
}
