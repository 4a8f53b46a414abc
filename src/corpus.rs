//! Corpus assembly from feed metadata.
//!
//! Article sources are unreliable: paywalls, takedowns and malformed markup
//! are routine. The builder therefore resolves articles best-effort, counting
//! and skipping failures while reporting a running failure rate, and only
//! then applies the minimum-length filter.

use crate::error::ArticleError;
use crate::models::ArticleMeta;
use crate::scrapers::ArticleResolver;
use itertools::Itertools;
use serde::Serialize;
use tracing::{info, instrument, warn};

/// Articles with fewer characters than this carry too little text to use.
pub const MIN_ARTICLE_CHARS: usize = 500;

/// Separator placed between articles when a corpus is flattened for annotation.
const FLATTEN_SEPARATOR: &str = "           ";

/// Counts describing one corpus build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    /// Metadata records received.
    pub requested: usize,
    /// Records left after removing exact duplicates.
    pub unique: usize,
    /// Articles resolved to text.
    pub fetched: usize,
    /// Articles that failed to resolve.
    pub failed: usize,
    /// Articles surviving the length filter.
    pub kept: usize,
}

impl BuildReport {
    pub fn fail_rate(&self) -> f64 {
        if self.unique == 0 {
            0.0
        } else {
            self.failed as f64 / self.unique as f64
        }
    }
}

/// Resolves metadata to article text with partial-failure tolerance.
#[derive(Debug)]
pub struct CorpusBuilder<R> {
    resolver: R,
    min_chars: usize,
}

impl<R: ArticleResolver> CorpusBuilder<R> {
    #[cfg(test)]
    pub fn new(resolver: R) -> Self {
        Self::with_min_chars(resolver, MIN_ARTICLE_CHARS)
    }

    pub fn with_min_chars(resolver: R, min_chars: usize) -> Self {
        Self { resolver, min_chars }
    }

    /// Deduplicate `meta`, resolve each record in turn, and drop short bodies.
    ///
    /// A failed article is logged and skipped; it never aborts the batch.
    /// Progress and the running failure rate are logged after every record.
    ///
    /// # Arguments
    ///
    /// * `meta` - Feed records, possibly containing exact duplicates
    ///
    /// # Returns
    ///
    /// The surviving article bodies, in the order of the deduplicated list,
    /// and a [`BuildReport`] with the counts at each step.
    #[instrument(level = "info", skip_all, fields(requested = meta.len()))]
    pub async fn build_with_report(&self, meta: Vec<ArticleMeta>) -> (Vec<String>, BuildReport) {
        let mut report = BuildReport {
            requested: meta.len(),
            ..BuildReport::default()
        };
        let unique: Vec<ArticleMeta> = meta.into_iter().unique().collect();
        report.unique = unique.len();
        info!(count = report.unique, "Building corpus from articles");

        let total = unique.len();
        let mut articles = Vec::with_capacity(total);
        for (i, meta) in unique.iter().enumerate() {
            let processed = i + 1;
            match self.resolver.resolve(meta).await {
                Ok(text) => articles.push(text),
                Err(e) => {
                    report.failed += 1;
                    log_failure(meta, &e);
                }
            }
            info!(
                processed,
                total,
                progress_pct = processed as f64 / total as f64 * 100.0,
                fail_rate_pct = report.failed as f64 / processed as f64 * 100.0,
                "Corpus progress"
            );
        }
        report.fetched = articles.len();

        remove_short(&mut articles, self.min_chars);
        report.kept = articles.len();
        info!(
            fetched = report.fetched,
            failed = report.failed,
            kept = report.kept,
            "Corpus complete"
        );
        (articles, report)
    }
}

fn log_failure(meta: &ArticleMeta, e: &ArticleError) {
    warn!(url = %meta.url, error = %e, "Article fetch failed; skipping");
}

/// Remove every article shorter than `min_chars` characters.
pub fn remove_short(articles: &mut Vec<String>, min_chars: usize) {
    articles.retain(|a| a.chars().count() >= min_chars);
}

/// Join a corpus into the single text handed to the annotator.
pub fn flatten_corpus(articles: &[String]) -> String {
    articles.join(FLATTEN_SEPARATOR)
}
