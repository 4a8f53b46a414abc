//! Date-range crawler that keeps each feed query under the provider's cap.
//!
//! The feed truncates every response at roughly 100 items without saying so.
//! When a window comes back near that size, it is bisected at its midpoint day
//! and each half is queried again, down to a fixed depth:
//!
//! ```text
//! depth 0   [08-01 ............... 08-09)     90 items -> split
//! depth 1   [08-01 .... 08-05) [08-05 .. 08-09)
//! depth 2   ...
//! depth 3   accepted as-is, even if still near the cap
//! ```
//!
//! With a cap `c` and maximum depth `d` a single call can return at most
//! about `c * 2^d` items. Duplicates across sibling windows are left for the
//! corpus builder to remove.

use crate::config::FeedConfig;
use crate::error::FeedError;
use crate::models::{ArticleMeta, Language, Window};
use crate::scrapers::NewsFeed;
use tracing::{debug, info, instrument};

/// Bisection depth at which results are returned unsplit.
pub const MAX_DEPTH: u32 = 3;

/// Item count above which a response is treated as possibly truncated.
pub const NEAR_CAP_THRESHOLD: usize = 85;

/// Recursive window-splitting crawler over a [`NewsFeed`].
#[derive(Debug)]
pub struct DateRangeCrawler<F> {
    feed: F,
    near_cap_threshold: usize,
    max_depth: u32,
}

impl<F: NewsFeed> DateRangeCrawler<F> {
    #[cfg(test)]
    pub fn new(feed: F) -> Self {
        Self {
            feed,
            near_cap_threshold: NEAR_CAP_THRESHOLD,
            max_depth: MAX_DEPTH,
        }
    }

    pub fn with_config(feed: F, config: &FeedConfig) -> Self {
        Self {
            feed,
            near_cap_threshold: config.near_cap_threshold,
            max_depth: config.max_depth,
        }
    }

    #[cfg(test)]
    pub fn feed(&self) -> &F {
        &self.feed
    }

    /// Fetch metadata for `keyword` in `window`, splitting the window while
    /// responses look truncated.
    ///
    /// A response larger than the near-cap threshold is discarded and both
    /// halves of the window are queried instead, unless the window is a
    /// single day or `depth` has reached the maximum.
    ///
    /// # Arguments
    ///
    /// * `keyword` - Search term sent to the feed
    /// * `window` - Half-open date range to cover
    /// * `language` - Feed language and country
    /// * `depth` - Current bisection depth; external callers pass `0`
    ///
    /// # Returns
    ///
    /// The concatenation of the leaf queries, left half first. Duplicates
    /// across leaves are kept.
    ///
    /// # Errors
    ///
    /// Any feed failure propagates unchanged and discards sibling results.
    #[instrument(level = "info", skip_all, fields(%keyword, %window, %language, depth = depth))]
    pub async fn fetch_metadata(
        &self,
        keyword: &str,
        window: Window,
        language: Language,
        depth: u32,
    ) -> Result<Vec<ArticleMeta>, FeedError> {
        let items = self.feed.search(keyword, window, language).await?;

        if depth >= self.max_depth {
            debug!(count = items.len(), "Max depth reached; accepting results");
            return Ok(items);
        }

        if items.len() <= self.near_cap_threshold || window.span_days() <= 1 {
            return Ok(items);
        }

        let Some((left, right)) = window.bisect() else {
            return Ok(items);
        };

        info!(
            count = items.len(),
            threshold = self.near_cap_threshold,
            %left,
            %right,
            "Window near feed cap; bisecting"
        );
        let mut merged = Box::pin(self.fetch_metadata(keyword, left, language, depth + 1)).await?;
        let right_items = Box::pin(self.fetch_metadata(keyword, right, language, depth + 1)).await?;
        merged.extend(right_items);
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, NaiveDate};
    use std::sync::Mutex;

    /// Feed that returns `items_for(window)` items and records each query.
    struct FakeFeed<C: Fn(Window) -> usize> {
        items_for: C,
        calls: Mutex<Vec<Window>>,
        fail_on: Option<Window>,
    }

    impl<C: Fn(Window) -> usize> FakeFeed<C> {
        fn new(items_for: C) -> Self {
            Self {
                items_for,
                calls: Mutex::new(Vec::new()),
                fail_on: None,
            }
        }

        fn calls(&self) -> Vec<Window> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl<C: Fn(Window) -> usize> NewsFeed for FakeFeed<C> {
        async fn search(
            &self,
            _keyword: &str,
            window: Window,
            _language: Language,
        ) -> Result<Vec<ArticleMeta>, FeedError> {
            self.calls.lock().unwrap().push(window);
            if self.fail_on == Some(window) {
                return Err(FeedError::Malformed("boom".into()));
            }
            let n = (self.items_for)(window);
            Ok((0..n)
                .map(|i| ArticleMeta {
                    title: format!("{window} #{i}"),
                    publish_date: DateTime::parse_from_rfc2822("Mon, 01 Aug 2022 07:00:00 GMT").unwrap(),
                    url: format!("https://example.com/{}/{i}", window.start()),
                })
                .collect())
        }
    }

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn w(a: &str, b: &str) -> Window {
        Window::new(d(a), d(b)).unwrap()
    }

    #[tokio::test]
    async fn test_small_result_is_not_split() {
        let crawler = DateRangeCrawler::new(FakeFeed::new(|_: Window| 40));
        let items = crawler
            .fetch_metadata("africa", w("2022-08-01", "2022-08-21"), Language::En, 0)
            .await
            .unwrap();
        assert_eq!(items.len(), 40);
        assert_eq!(crawler.feed().calls().len(), 1);
    }

    #[tokio::test]
    async fn test_three_day_window_splits_once() {
        let full = w("2022-08-01", "2022-08-03");
        let crawler = DateRangeCrawler::new(FakeFeed::new(move |win: Window| if win == full { 90 } else { 30 }));
        let items = crawler.fetch_metadata("africa", full, Language::En, 0).await.unwrap();

        assert_eq!(
            crawler.feed().calls(),
            vec![full, w("2022-08-01", "2022-08-02"), w("2022-08-02", "2022-08-03")]
        );
        assert_eq!(items.len(), 60);
        assert!(items[0].url.contains("2022-08-01"));
        assert!(items[59].url.contains("2022-08-02"));
    }

    #[tokio::test]
    async fn test_single_day_window_over_threshold_is_accepted() {
        let crawler = DateRangeCrawler::new(FakeFeed::new(|_: Window| 99));
        let items = crawler
            .fetch_metadata("africa", w("2022-08-01", "2022-08-02"), Language::En, 0)
            .await
            .unwrap();
        assert_eq!(items.len(), 99);
        assert_eq!(crawler.feed().calls().len(), 1);
    }

    #[tokio::test]
    async fn test_recursion_stops_at_max_depth() {
        let root = w("2022-01-01", "2022-03-02");
        let crawler = DateRangeCrawler::new(FakeFeed::new(|_: Window| 100));
        let items = crawler.fetch_metadata("africa", root, Language::En, 0).await.unwrap();

        // 1 + 2 + 4 + 8 queries, with the 8 leaves at depth 3 contributing results.
        let calls = crawler.feed().calls();
        assert_eq!(calls.len(), 15);
        assert_eq!(items.len(), 800);
    }

    #[tokio::test]
    async fn test_leaf_windows_partition_the_request() {
        let root = w("2022-01-01", "2022-02-14");
        let crawler = DateRangeCrawler::new(FakeFeed::new(|win: Window| if win.span_days() > 3 { 90 } else { 10 }));
        crawler.fetch_metadata("africa", root, Language::En, 0).await.unwrap();

        let calls = crawler.feed().calls();
        // Leaves are queried windows that contain no other queried window.
        let leaves: Vec<Window> = calls
            .iter()
            .copied()
            .filter(|c| !calls.iter().any(|o| o != c && o.start() >= c.start() && o.end() <= c.end()))
            .collect();
        let mut day = root.start();
        while day < root.end() {
            let hits = leaves.iter().filter(|l| l.contains(day)).count();
            assert_eq!(hits, 1, "day {day} covered {hits} times");
            day = day.succ_opt().unwrap();
        }
        assert!(calls.iter().all(|c| c.span_days() >= 1));
    }

    #[tokio::test]
    async fn test_configured_threshold_and_depth() {
        let config = FeedConfig {
            near_cap_threshold: 10,
            max_depth: 1,
            ..FeedConfig::default()
        };
        let crawler = DateRangeCrawler::with_config(FakeFeed::new(|_: Window| 20), &config);
        let items = crawler
            .fetch_metadata("africa", w("2022-08-01", "2022-08-09"), Language::En, 0)
            .await
            .unwrap();
        assert_eq!(crawler.feed().calls().len(), 3);
        assert_eq!(items.len(), 40);
    }

    #[tokio::test]
    async fn test_feed_failure_in_subwindow_propagates() {
        let full = w("2022-08-01", "2022-08-03");
        let mut feed = FakeFeed::new(move |win: Window| if win == full { 90 } else { 30 });
        feed.fail_on = Some(w("2022-08-02", "2022-08-03"));
        let crawler = DateRangeCrawler::new(feed);
        let result = crawler.fetch_metadata("africa", full, Language::En, 0).await;
        assert!(matches!(result, Err(FeedError::Malformed(_))));
    }
}
