//! Article body resolution.
//!
//! Downloads an article page and reduces it to plain paragraph text. Pages
//! behind paywalls, removed stories and unusual markup fail here routinely;
//! callers are expected to skip failures rather than abort.

use crate::config::{CorpusConfig, http_client};
use crate::error::ArticleError;
use crate::models::ArticleMeta;
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::{debug, instrument};

/// Resolves article metadata to the article's body text.
pub trait ArticleResolver {
    async fn resolve(&self, meta: &ArticleMeta) -> Result<String, ArticleError>;
}

/// Fetches article pages over HTTP and extracts their paragraphs.
#[derive(Debug, Clone)]
pub struct HttpArticleResolver {
    client: Client,
}

impl HttpArticleResolver {
    pub fn new(config: &CorpusConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: http_client(&config.user_agent, config.timeout_secs)?,
        })
    }
}

impl ArticleResolver for HttpArticleResolver {
    #[instrument(level = "debug", skip_all, fields(url = %meta.url))]
    async fn resolve(&self, meta: &ArticleMeta) -> Result<String, ArticleError> {
        let resp = self.client.get(&meta.url).send().await?;
        if !resp.status().is_success() {
            return Err(ArticleError::Status {
                status: resp.status().as_u16(),
            });
        }
        let html = resp.text().await?;
        let text = extract_text(&html);
        if text.is_empty() {
            return Err(ArticleError::Empty {
                url: meta.url.clone(),
            });
        }
        debug!(chars = text.chars().count(), "Parsed article");
        Ok(text)
    }
}

/// Extract the readable body of an HTML page as a single line.
///
/// Paragraphs inside `<article>` are preferred; pages without one fall back to
/// every `<p>`. Whitespace, including newlines, is collapsed to single spaces
/// so a body always fits on one line of a corpus file.
pub fn extract_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let in_article = Selector::parse("article p").expect("valid selector");
    let any_paragraph = Selector::parse("p").expect("valid selector");

    let mut paragraphs: Vec<String> = document
        .select(&in_article)
        .map(|p| p.text().collect::<String>())
        .collect();
    if paragraphs.is_empty() {
        paragraphs = document
            .select(&any_paragraph)
            .map(|p| p.text().collect::<String>())
            .collect();
    }

    paragraphs
        .iter()
        .flat_map(|p| p.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn meta(url: String) -> ArticleMeta {
        ArticleMeta {
            title: "t".into(),
            publish_date: DateTime::parse_from_rfc2822("Mon, 01 Aug 2022 07:00:00 GMT").unwrap(),
            url,
        }
    }

    #[test]
    fn test_extract_text_prefers_article_paragraphs() {
        let html = r#"<html><body>
            <nav><p>Subscribe now</p></nav>
            <article><h1>Title</h1><p>First   paragraph
            spans lines.</p><p>Second.</p></article>
        </body></html>"#;
        assert_eq!(extract_text(html), "First paragraph spans lines. Second.");
    }

    #[test]
    fn test_extract_text_falls_back_to_all_paragraphs() {
        let html = "<html><body><div><p>One.</p><p>Two.</p></div></body></html>";
        assert_eq!(extract_text(html), "One. Two.");
    }

    #[test]
    fn test_extract_text_without_paragraphs_is_empty() {
        assert_eq!(extract_text("<html><body><div>nothing</div></body></html>"), "");
    }

    #[tokio::test]
    async fn test_resolve_fetches_and_extracts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/story"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<html><article><p>Body text.</p></article></html>"),
            )
            .mount(&server)
            .await;

        let resolver = HttpArticleResolver::new(&CorpusConfig::default()).unwrap();
        let text = resolver.resolve(&meta(format!("{}/story", server.uri()))).await.unwrap();
        assert_eq!(text, "Body text.");
    }

    #[tokio::test]
    async fn test_resolve_reports_status_and_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/blank"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&server)
            .await;

        let resolver = HttpArticleResolver::new(&CorpusConfig::default()).unwrap();
        let gone = resolver.resolve(&meta(format!("{}/gone", server.uri()))).await;
        assert!(matches!(gone, Err(ArticleError::Status { status: 404 })));
        let blank = resolver.resolve(&meta(format!("{}/blank", server.uri()))).await;
        assert!(matches!(blank, Err(ArticleError::Empty { .. })));
    }
}
