//! Window-by-window corpus collection.
//!
//! Two modes drive the crawler and corpus builder over a sequence of windows:
//!
//! - **Walk forward** ([`IncrementalCollector::collect_until`]): fixed-size
//!   windows from a start date up to today, each corpus written to disk as
//!   soon as it is built. The next window starts the day after the previous
//!   window's end date. No resumption state is kept; a rerun starts over.
//! - **Daily** ([`IncrementalCollector::collect_daily`]): a fixed count of
//!   single-day windows, kept in memory for immediate comparison.

use crate::config::CollectorConfig;
use crate::corpus::CorpusBuilder;
use crate::crawler::DateRangeCrawler;
use crate::error::{CollectError, FeedError};
use crate::models::{Language, Window, WindowCorpus};
use crate::outputs::corpus_file::{corpus_path, write_corpus};
use crate::scrapers::{ArticleResolver, NewsFeed};
use crate::utils::{ensure_writable_dir, today};
use chrono::{Days, NaiveDate};
use std::path::PathBuf;
use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{info, instrument};

/// Languages fetched by [`IncrementalCollector::collect_languages`] by default.
pub const DEFAULT_LANGUAGES: [Language; 5] = [
    Language::En,
    Language::Fr,
    Language::De,
    Language::Es,
    Language::It,
];

/// Windows of `days` days from `start`, stepping to the day after each
/// window's end, while the window start is on or before `today`.
pub fn walk_forward_windows(start: NaiveDate, today: NaiveDate, days: u64) -> Vec<Window> {
    let mut windows = Vec::new();
    let mut cursor = start;
    while cursor <= today {
        let window = Window::starting(cursor, days);
        windows.push(window);
        match window.end().checked_add_days(Days::new(1)) {
            Some(next) => cursor = next,
            None => break,
        }
    }
    windows
}

/// The window used when none is given: today only.
pub fn default_window() -> Window {
    Window::starting(today(), 1)
}

/// `count` consecutive single-day windows beginning at `start`.
pub fn daily_windows(start: NaiveDate, count: u64) -> Vec<Window> {
    (0..count)
        .filter_map(|i| start.checked_add_days(Days::new(i)))
        .map(|day| Window::starting(day, 1))
        .collect()
}

/// Collects one corpus per window.
#[derive(Debug)]
pub struct IncrementalCollector<F, R> {
    crawler: DateRangeCrawler<F>,
    builder: CorpusBuilder<R>,
    articles_dir: String,
    window_days: u64,
}

impl<F: NewsFeed, R: ArticleResolver> IncrementalCollector<F, R> {
    pub fn new(
        crawler: DateRangeCrawler<F>,
        builder: CorpusBuilder<R>,
        config: &CollectorConfig,
        articles_dir: impl Into<String>,
    ) -> Self {
        Self {
            crawler,
            builder,
            articles_dir: articles_dir.into(),
            window_days: config.window_days,
        }
    }

    /// Crawl one window and build its corpus.
    #[instrument(level = "info", skip_all, fields(%keyword, %language, %window))]
    pub async fn collect_window(
        &self,
        keyword: &str,
        language: Language,
        window: Window,
    ) -> Result<WindowCorpus, FeedError> {
        info!("Querying articles");
        let meta = self.crawler.fetch_metadata(keyword, window, language, 0).await?;
        info!(count = meta.len(), "Number of articles retrieved");
        let (articles, report) = self.builder.build_with_report(meta).await;
        info!(
            unique = report.unique,
            failed = report.failed,
            fail_rate_pct = report.fail_rate() * 100.0,
            kept = report.kept,
            "Window corpus built"
        );
        Ok(WindowCorpus {
            keyword: keyword.to_string(),
            language,
            window,
            articles,
        })
    }

    /// Walk forward from `start` to `today`, persisting each window's corpus.
    ///
    /// Windows are `window_days` long and the next one starts the day after
    /// the previous window's end date. A window starting on `today` is still
    /// collected. Each corpus is written before the next window is crawled.
    ///
    /// # Arguments
    ///
    /// * `keyword` - Search term sent to the feed
    /// * `language` - Feed language and country
    /// * `start` - First day of the first window
    /// * `today` - Last day a window may start on
    ///
    /// # Returns
    ///
    /// Every collected corpus, in window order.
    ///
    /// # Errors
    ///
    /// Stops at the first feed or write failure; corpora already written stay
    /// on disk.
    #[instrument(level = "info", skip_all, fields(%keyword, %language, %start, %today))]
    pub async fn collect_until(
        &self,
        keyword: &str,
        language: Language,
        start: NaiveDate,
        today: NaiveDate,
    ) -> Result<Vec<WindowCorpus>, CollectError> {
        ensure_writable_dir(&self.articles_dir).await?;
        let windows = walk_forward_windows(start, today, self.window_days);
        info!(windows = windows.len(), window_days = self.window_days, "Starting walk-forward collection");

        let mut corpora = Vec::with_capacity(windows.len());
        for window in windows {
            info!(%window, "Using date range");
            let corpus = self.collect_window(keyword, language, window).await?;
            self.persist(&corpus).await?;
            corpora.push(corpus);
        }
        Ok(corpora)
    }

    /// Write `corpus` under the articles directory and return its path.
    pub async fn persist(&self, corpus: &WindowCorpus) -> std::io::Result<PathBuf> {
        let path = corpus_path(&self.articles_dir, &corpus.keyword, corpus.window);
        write_corpus(&path, &corpus.articles).await?;
        Ok(path)
    }

    /// Collect `count` single-day windows starting at `start`, in memory.
    #[instrument(level = "info", skip_all, fields(%keyword, %language, %start, count = count))]
    pub async fn collect_daily(
        &self,
        keyword: &str,
        language: Language,
        start: NaiveDate,
        count: u64,
    ) -> Result<Vec<WindowCorpus>, FeedError> {
        stream::iter(daily_windows(start, count))
            .then(|window| self.collect_window(keyword, language, window))
            .try_collect()
            .await
    }

    /// Collect the same keyword and window in several languages.
    #[instrument(level = "info", skip_all, fields(%keyword, %window))]
    pub async fn collect_languages(
        &self,
        keyword: &str,
        window: Window,
        languages: &[Language],
    ) -> Result<Vec<WindowCorpus>, FeedError> {
        stream::iter(languages.iter().copied())
            .then(|language| self.collect_window(keyword, language, window))
            .try_collect()
            .await
    }
}
