//! YAML configuration for endpoints, thresholds and pacing.
//!
//! Every field has a default, so the file is optional and may be partial:
//!
//! ```yaml
//! feed:
//!   near_cap_threshold: 85
//!   max_depth: 3
//! oracle:
//!   pacing_ms: 2000
//! stopwords:
//!   extra:
//!     fr: [aussi, encore]
//! ```

use crate::corpus::MIN_ARTICLE_CHARS;
use crate::crawler::{MAX_DEPTH, NEAR_CAP_THRESHOLD};
use crate::error::ConfigError;
use crate::models::Language;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{info, instrument};

/// Root configuration object.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub feed: FeedConfig,
    pub corpus: CorpusConfig,
    pub collector: CollectorConfig,
    pub oracle: OracleConfig,
    pub annotator: AnnotatorConfig,
    pub stopwords: StopwordConfig,
}

impl Config {
    /// Load from `path`, or return defaults when no path is given.
    #[instrument(level = "info")]
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            info!("No config file given; using defaults");
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_string(),
            source,
        })?;
        let config = serde_yaml::from_str(&raw).map_err(|source| ConfigError::Yaml {
            path: path.to_string(),
            source,
        })?;
        info!(%path, "Loaded configuration");
        Ok(config)
    }
}

/// News feed query settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FeedConfig {
    pub base_url: String,
    pub user_agent: String,
    /// Item count above which a window is considered possibly truncated.
    pub near_cap_threshold: usize,
    /// Bisection depth at which results are accepted as-is.
    pub max_depth: u32,
    /// Per-request timeout; unset means wait indefinitely.
    pub timeout_secs: Option<u64>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: "https://news.google.com".to_string(),
            user_agent: default_user_agent(),
            near_cap_threshold: NEAR_CAP_THRESHOLD,
            max_depth: MAX_DEPTH,
            timeout_secs: None,
        }
    }
}

/// Article resolution and persistence settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorpusConfig {
    /// Articles with fewer characters than this are dropped.
    pub min_article_chars: usize,
    pub articles_dir: String,
    pub user_agent: String,
    pub timeout_secs: Option<u64>,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            min_article_chars: MIN_ARTICLE_CHARS,
            articles_dir: "articles".to_string(),
            user_agent: default_user_agent(),
            timeout_secs: None,
        }
    }
}

/// Window sizes for the two collection modes.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CollectorConfig {
    pub window_days: u64,
    pub daily_window_count: u64,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            window_days: 20,
            daily_window_count: 10,
        }
    }
}

/// Relatedness oracle settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OracleConfig {
    pub base_url: String,
    pub user_agent: String,
    /// Minimum gap between two oracle calls; `0` disables pacing.
    pub pacing_ms: u64,
    pub timeout_secs: Option<u64>,
}

impl OracleConfig {
    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            base_url: "http://api.conceptnet.io".to_string(),
            user_agent: default_user_agent(),
            pacing_ms: 2000,
            timeout_secs: None,
        }
    }
}

/// UDPipe annotator settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AnnotatorConfig {
    pub base_url: String,
    pub user_agent: String,
    /// UDPipe model name per language.
    pub models: HashMap<Language, String>,
    pub timeout_secs: Option<u64>,
}

impl Default for AnnotatorConfig {
    fn default() -> Self {
        let models = [
            (Language::En, "english"),
            (Language::Fr, "french"),
            (Language::De, "german"),
            (Language::Es, "spanish"),
            (Language::It, "italian"),
        ]
        .into_iter()
        .map(|(l, m)| (l, m.to_string()))
        .collect();
        Self {
            base_url: "https://lindat.mff.cuni.cz/services/udpipe/api".to_string(),
            user_agent: default_user_agent(),
            models,
            timeout_secs: None,
        }
    }
}

/// Extra stopwords merged into each language's dictionary.
///
/// `extra` overrides `default_extra` for the languages it names.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StopwordConfig {
    pub default_extra: Vec<String>,
    pub extra: HashMap<Language, Vec<String>>,
}

impl StopwordConfig {
    /// The near-stopword list that applies to `language`.
    pub fn extra_for(&self, language: Language) -> &[String] {
        self.extra
            .get(&language)
            .map(Vec::as_slice)
            .unwrap_or(&self.default_extra)
    }
}

impl Default for StopwordConfig {
    fn default() -> Self {
        Self {
            default_extra: ["could", "get", "come", "go", "also", "might", "many"]
                .into_iter()
                .map(String::from)
                .collect(),
            extra: HashMap::new(),
        }
    }
}

fn default_user_agent() -> String {
    format!("news_drift/{}", env!("CARGO_PKG_VERSION"))
}

/// Build an HTTP client with the given user agent and optional timeout.
pub fn http_client(user_agent: &str, timeout_secs: Option<u64>) -> Result<reqwest::Client, reqwest::Error> {
    let mut builder = reqwest::Client::builder().user_agent(user_agent);
    if let Some(secs) = timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    builder.build()
}
