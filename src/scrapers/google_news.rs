//! Google News RSS search feed.
//!
//! Queries `https://news.google.com/rss/search` with the `after:`/`before:`
//! date operators and a language/locale triple, and parses the returned RSS
//! into [`ArticleMeta`] records.
//!
//! # Query Pattern
//!
//! ```text
//! /rss/search?q=africa+after:2022-08-01+before:2022-08-03&ceid=US:en&hl=en-US&gl=US
//! ```
//!
//! The feed silently caps each response at roughly 100 items; see
//! [`crate::crawler`] for how windows are split to stay under it.

use crate::config::{FeedConfig, http_client};
use crate::error::FeedError;
use crate::models::{ArticleMeta, Language, Window};
use crate::utils::DATE_FORMAT;
use chrono::DateTime;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, instrument};
use url::Url;

static HREF: Lazy<Regex> = Lazy::new(|| Regex::new(r#"href="([^"]+)""#).expect("valid href regex"));

/// A searchable news feed.
pub trait NewsFeed {
    /// Return every item the feed lists for `keyword` published in `window`.
    ///
    /// A failure here means the window's contents are unknown, so it is
    /// never turned into a partial result.
    async fn search(
        &self,
        keyword: &str,
        window: Window,
        language: Language,
    ) -> Result<Vec<ArticleMeta>, FeedError>;
}

/// HTTP client for the Google News RSS search endpoint.
#[derive(Debug, Clone)]
pub struct GoogleNewsFeed {
    client: Client,
    base_url: Url,
}

impl GoogleNewsFeed {
    pub fn new(config: &FeedConfig) -> Result<Self, FeedError> {
        Ok(Self {
            client: http_client(&config.user_agent, config.timeout_secs)?,
            base_url: Url::parse(&config.base_url)?,
        })
    }

    /// Build the search URL for one keyword/window/language tuple.
    pub fn search_url(&self, keyword: &str, window: Window, language: Language) -> Result<Url, FeedError> {
        let mut url = self.base_url.join("/rss/search")?;
        let country = language.country();
        let lang = language.code();
        let q = format!(
            "{} after:{} before:{}",
            keyword,
            window.start().format(DATE_FORMAT),
            window.end().format(DATE_FORMAT)
        );
        url.query_pairs_mut()
            .append_pair("q", &q)
            .append_pair("ceid", &format!("{country}:{lang}"))
            .append_pair("hl", &format!("{lang}-{country}"))
            .append_pair("gl", &country);
        Ok(url)
    }
}

impl NewsFeed for GoogleNewsFeed {
    #[instrument(level = "info", skip_all, fields(%keyword, %window, %language))]
    async fn search(
        &self,
        keyword: &str,
        window: Window,
        language: Language,
    ) -> Result<Vec<ArticleMeta>, FeedError> {
        let url = self.search_url(keyword, window, language)?;
        debug!(%url, "Querying news feed");

        let resp = self.client.get(url.clone()).send().await?;
        if !resp.status().is_success() {
            return Err(FeedError::Status {
                status: resp.status().as_u16(),
                url: url.to_string(),
            });
        }
        let body = resp.text().await?;
        let items = parse_feed(&body)?;
        info!(count = items.len(), "Feed returned items");
        Ok(items)
    }
}

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    items: Vec<RssItem>,
}

#[derive(Debug, Deserialize)]
struct RssItem {
    title: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    link: Option<String>,
    description: Option<String>,
}

/// Parse an RSS document into article metadata.
///
/// The article link is taken from the anchor embedded in `<description>`,
/// falling back to `<link>`.
///
/// # Errors
///
/// Returns [`FeedError::Xml`] for malformed XML and [`FeedError::Malformed`]
/// for an item without a usable date or link.
pub fn parse_feed(xml: &str) -> Result<Vec<ArticleMeta>, FeedError> {
    let rss: Rss = quick_xml::de::from_str(xml)?;
    rss.channel
        .items
        .into_iter()
        .map(|item| -> Result<ArticleMeta, FeedError> {
            let title = item.title.unwrap_or_default().trim().to_string();
            let raw_date = item
                .pub_date
                .ok_or_else(|| FeedError::Malformed(format!("item '{title}' has no pubDate")))?;
            let publish_date = DateTime::parse_from_rfc2822(raw_date.trim())
                .map_err(|e| FeedError::Malformed(format!("bad pubDate '{raw_date}': {e}")))?;
            let url = item
                .description
                .as_deref()
                .and_then(|d| HREF.captures(d))
                .map(|c| c[1].to_string())
                .or(item.link.map(|l| l.trim().to_string()))
                .filter(|l| !l.is_empty())
                .ok_or_else(|| FeedError::Malformed(format!("item '{title}' has no link")))?;
            Ok(ArticleMeta {
                title,
                publish_date,
                url,
            })
        })
        .collect()
}
