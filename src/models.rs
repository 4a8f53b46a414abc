//! Data models shared by the crawl, corpus, extraction and scoring stages.
//!
//! - [`Window`]: half-open date range, the unit of crawling
//! - [`ArticleMeta`]: one feed item, deduplicated by full-record equality
//! - [`WindowCorpus`]: article bodies collected for one keyword/language/window
//! - [`Term`] and [`TermList`]: ranked related terms from one extraction method
//! - [`DriftPoint`] and [`DriftSeries`]: the final per-window score time series

use chrono::{DateTime, Days, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of terms any extraction method may return.
pub const MAX_TERMS: usize = 8;

/// Languages the feed, annotator and oracle are queried in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Fr,
    De,
    Es,
    It,
}

impl Language {
    /// Two-letter ISO 639-1 code, as used by the feed and the oracle.
    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Fr => "fr",
            Language::De => "de",
            Language::Es => "es",
            Language::It => "it",
        }
    }

    /// Country the feed is localised to. English is pinned to the US edition.
    pub fn country(&self) -> String {
        match self {
            Language::En => "US".to_string(),
            other => other.code().to_uppercase(),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A contiguous range of calendar days, `[start, end)`.
///
/// The end date is exclusive, matching the feed's `after:`/`before:` search
/// operators, so the two halves returned by [`Window::bisect`] share their
/// boundary date without overlapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Window {
    start: NaiveDate,
    end: NaiveDate,
}

impl Window {
    /// Create a window, or `None` if `start` is after `end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    /// A window of `days` days beginning at `start`.
    pub fn starting(start: NaiveDate, days: u64) -> Self {
        let end = start.checked_add_days(Days::new(days)).unwrap_or(NaiveDate::MAX);
        Self { start, end }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of days covered.
    pub fn span_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    /// The date the window would be split at.
    pub fn midpoint(&self) -> NaiveDate {
        let half = (self.span_days() / 2) as u64;
        self.start.checked_add_days(Days::new(half)).unwrap_or(self.end)
    }

    /// Split at the midpoint day into `[start, mid)` and `[mid, end)`.
    ///
    /// Returns `None` when the split would produce a zero-width first half,
    /// i.e. for windows spanning a single day or less.
    pub fn bisect(&self) -> Option<(Window, Window)> {
        let mid = self.midpoint();
        if mid == self.start {
            return None;
        }
        Some((
            Window { start: self.start, end: mid },
            Window { start: mid, end: self.end },
        ))
    }

    #[cfg(test)]
    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day < self.end
    }

    /// Short label used in logs and the drift series, e.g. `Aug 15`.
    pub fn label(&self) -> String {
        self.start.format("%b %d").to_string()
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Metadata for one feed item.
///
/// Two records are duplicates only when every field matches.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArticleMeta {
    pub title: String,
    pub publish_date: DateTime<FixedOffset>,
    pub url: String,
}

/// Article bodies collected for a single keyword, language and window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowCorpus {
    pub keyword: String,
    pub language: Language,
    pub window: Window,
    pub articles: Vec<String>,
}

/// The three independent term-extraction methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMethod {
    Frequency,
    Word2Vec,
    FastText,
}

impl ExtractionMethod {
    pub const ALL: [ExtractionMethod; 3] = [
        ExtractionMethod::Frequency,
        ExtractionMethod::Word2Vec,
        ExtractionMethod::FastText,
    ];
}

impl fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExtractionMethod::Frequency => "frequency",
            ExtractionMethod::Word2Vec => "word2vec",
            ExtractionMethod::FastText => "fasttext",
        })
    }
}

/// A related term, with a similarity score when the method produces one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Term {
    Bare(String),
    Scored { term: String, score: f32 },
}

impl Term {
    pub fn text(&self) -> &str {
        match self {
            Term::Bare(t) => t,
            Term::Scored { term, .. } => term,
        }
    }

    pub fn score(&self) -> Option<f32> {
        match self {
            Term::Bare(_) => None,
            Term::Scored { score, .. } => Some(*score),
        }
    }
}

/// Ranked terms from one extraction method, never longer than [`MAX_TERMS`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermList {
    language: Language,
    method: ExtractionMethod,
    terms: Vec<Term>,
}

impl TermList {
    /// Build a list, keeping at most the first [`MAX_TERMS`] terms.
    pub fn new(language: Language, method: ExtractionMethod, mut terms: Vec<Term>) -> Self {
        terms.truncate(MAX_TERMS);
        Self { language, method, terms }
    }

    pub fn method(&self) -> ExtractionMethod {
        self.method
    }

    #[cfg(test)]
    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// The bare term strings, dropping any scores.
    pub fn texts(&self) -> Vec<&str> {
        self.terms.iter().map(Term::text).collect()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

impl fmt::Display for TermList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}/{}] ", self.language, self.method)?;
        let rendered: Vec<String> = self
            .terms
            .iter()
            .map(|t| match t.score() {
                Some(s) => format!("{} ({:.3})", t.text(), s),
                None => t.text().to_string(),
            })
            .collect();
        f.write_str(&rendered.join(", "))
    }
}

/// Cross-language relatedness of one window, one score per method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftPoint {
    pub window: Window,
    pub label: String,
    pub frequency: f64,
    pub word2vec: f64,
    pub fasttext: f64,
}

impl DriftPoint {
    pub fn score(&self, method: ExtractionMethod) -> f64 {
        match method {
            ExtractionMethod::Frequency => self.frequency,
            ExtractionMethod::Word2Vec => self.word2vec,
            ExtractionMethod::FastText => self.fasttext,
        }
    }
}

/// Drift scores ordered by window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriftSeries {
    pub keyword1: String,
    pub language1: Language,
    pub keyword2: String,
    pub language2: Language,
    pub points: Vec<DriftPoint>,
}

impl DriftSeries {
    /// The time series for a single method, in window order.
    pub fn series(&self, method: ExtractionMethod) -> Vec<f64> {
        self.points.iter().map(|p| p.score(method)).collect()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.points.iter().map(|p| p.label.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn w(a: &str, b: &str) -> Window {
        Window::new(d(a), d(b)).unwrap()
    }

    #[test]
    fn test_window_rejects_inverted_range() {
        assert!(Window::new(d("2022-08-03"), d("2022-08-01")).is_none());
        assert!(Window::new(d("2022-08-01"), d("2022-08-01")).is_some());
    }

    #[test]
    fn test_bisect_three_day_window() {
        let (left, right) = w("2022-08-01", "2022-08-03").bisect().unwrap();
        assert_eq!(left, w("2022-08-01", "2022-08-02"));
        assert_eq!(right, w("2022-08-02", "2022-08-03"));
    }

    #[test]
    fn test_bisect_single_day_is_none() {
        assert!(w("2022-08-01", "2022-08-02").bisect().is_none());
        assert!(w("2022-08-01", "2022-08-01").bisect().is_none());
    }

    #[test]
    fn test_bisect_partitions_every_day_exactly_once() {
        for span in 2..60u64 {
            let parent = Window::starting(d("2022-01-01"), span);
            let (left, right) = parent.bisect().unwrap();
            assert_eq!(left.start(), parent.start());
            assert_eq!(left.end(), right.start());
            assert_eq!(right.end(), parent.end());
            let mut day = parent.start();
            while day < parent.end() {
                let hits = [left, right].iter().filter(|c| c.contains(day)).count();
                assert_eq!(hits, 1, "day {day} covered {hits} times in {parent}");
                day = day.succ_opt().unwrap();
            }
        }
    }

    #[test]
    fn test_language_country() {
        assert_eq!(Language::En.country(), "US");
        assert_eq!(Language::Fr.country(), "FR");
        assert_eq!(Language::De.code(), "de");
    }

    #[test]
    fn test_term_list_caps_at_max_terms() {
        let terms = (0..12).map(|i| Term::Bare(format!("t{i}"))).collect();
        let list = TermList::new(Language::En, ExtractionMethod::Frequency, terms);
        assert_eq!(list.len(), MAX_TERMS);
        assert_eq!(list.texts()[0], "t0");
    }

    #[test]
    fn test_scored_terms_project_to_text() {
        let list = TermList::new(
            Language::Fr,
            ExtractionMethod::Word2Vec,
            vec![
                Term::Scored { term: "continent".into(), score: 0.9 },
                Term::Scored { term: "sahel".into(), score: 0.7 },
            ],
        );
        assert_eq!(list.texts(), vec!["continent", "sahel"]);
        assert_eq!(list.terms()[1].score(), Some(0.7));
    }

    #[test]
    fn test_drift_series_per_method() {
        let series = DriftSeries {
            keyword1: "africa".into(),
            language1: Language::En,
            keyword2: "afrique".into(),
            language2: Language::Fr,
            points: vec![
                DriftPoint {
                    window: w("2022-08-15", "2022-08-16"),
                    label: "Aug 15".into(),
                    frequency: 1.0,
                    word2vec: 2.0,
                    fasttext: 3.0,
                },
                DriftPoint {
                    window: w("2022-08-16", "2022-08-17"),
                    label: "Aug 16".into(),
                    frequency: 4.0,
                    word2vec: 5.0,
                    fasttext: 6.0,
                },
            ],
        };
        assert_eq!(series.series(ExtractionMethod::FastText), vec![3.0, 6.0]);
        assert_eq!(series.labels(), vec!["Aug 15", "Aug 16"]);
    }
}
