//! External news sources.
//!
//! Collection follows a two-phase pattern:
//!
//! 1. **Searching**: query a feed for article metadata in a date window
//!    ([`google_news`])
//! 2. **Resolving**: download each article and reduce it to text ([`article`])
//!
//! Both phases sit behind traits ([`NewsFeed`], [`ArticleResolver`]) so the
//! crawl and corpus logic can be driven by in-memory fakes.

pub mod article;
pub mod google_news;

pub use article::{ArticleResolver, HttpArticleResolver};
pub use google_news::{GoogleNewsFeed, NewsFeed};
