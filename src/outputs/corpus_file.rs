//! Flat-text corpus files.
//!
//! A corpus is stored as UTF-8 with one article body per line, each line
//! terminated by `\n`, at `<dir>/<keyword> <start> <end>.txt`. Bodies produced
//! by [`crate::scrapers::article::extract_text`] never contain newlines, so
//! reading a file back and splitting on `\n` restores the original list.

use crate::models::Window;
use crate::utils::DATE_FORMAT;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};

/// Path of the corpus file for `keyword` over `window`.
pub fn corpus_path(dir: &str, keyword: &str, window: Window) -> PathBuf {
    Path::new(dir).join(format!(
        "{} {} {}.txt",
        keyword,
        window.start().format(DATE_FORMAT),
        window.end().format(DATE_FORMAT)
    ))
}

/// Write `articles` to `path`, one per line, replacing any existing file.
#[instrument(level = "info", skip_all, fields(path = %path.display(), count = articles.len()))]
pub async fn write_corpus(path: &Path, articles: &[String]) -> io::Result<()> {
    let mut body = String::with_capacity(articles.iter().map(|a| a.len() + 1).sum());
    for article in articles {
        body.push_str(article);
        body.push('\n');
    }
    fs::write(path, body).await?;
    info!("Wrote articles to txt");
    Ok(())
}

/// Read a corpus file written by [`write_corpus`].
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn read_corpus(path: &Path) -> io::Result<Vec<String>> {
    let body = fs::read_to_string(path).await?;
    let articles: Vec<String> = body.lines().map(str::to_string).collect();
    info!(count = articles.len(), "Read corpus");
    Ok(articles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_corpus_path_pattern() {
        let window = Window::new(
            NaiveDate::from_ymd_opt(2022, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2022, 1, 21).unwrap(),
        )
        .unwrap();
        let path = corpus_path("articles", "africa", window);
        assert_eq!(path, PathBuf::from("articles/africa 2022-01-01 2022-01-21.txt"));
    }

    #[tokio::test]
    async fn test_write_then_read_restores_articles() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("africa 2022-01-01 2022-01-21.txt");
        let articles = vec![
            "First article about the Sahel, with commas, quotes \"and\" unicode: é ü ñ.".to_string(),
            "Second article.".to_string(),
            "  leading and trailing spaces  ".to_string(),
        ];

        write_corpus(&path, &articles).await.unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.ends_with(".\n"));
        assert_eq!(raw.matches('\n').count(), 3);

        let back = read_corpus(&path).await.unwrap();
        assert_eq!(back, articles);
    }

    #[tokio::test]
    async fn test_empty_corpus_round_trips() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("empty.txt");
        write_corpus(&path, &[]).await.unwrap();
        assert!(read_corpus(&path).await.unwrap().is_empty());
    }
}
