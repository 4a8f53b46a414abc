//! End-to-end runs: collect, annotate, extract, score.
//!
//! [`DriftPipeline`] owns one of each stage and wires them per window:
//!
//! ```text
//! window -> collector -> corpus -> annotator -> extractor -> 3 term lists
//!                                                               |
//!                        other language's 3 term lists -> scorer -> DriftPoint
//! ```
//!
//! Every window is all-or-nothing: a feed, annotator, extraction or oracle
//! failure aborts the run.

use crate::collector::IncrementalCollector;
use crate::corpus::flatten_corpus;
use crate::drift::{DriftScorer, RelatednessOracle};
use crate::error::PipelineError;
use crate::models::{DriftPoint, DriftSeries, ExtractionMethod, Language, Window, WindowCorpus};
use crate::nlp::annotate::Annotator;
use crate::nlp::extract::{MethodTerms, TermExtractor};
use crate::scrapers::{ArticleResolver, NewsFeed};
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;
use tracing::{info, instrument};

/// Method pairs compared by [`DriftPipeline::agreement`].
pub const METHOD_PAIRS: [(ExtractionMethod, ExtractionMethod); 3] = [
    (ExtractionMethod::Frequency, ExtractionMethod::Word2Vec),
    (ExtractionMethod::Frequency, ExtractionMethod::FastText),
    (ExtractionMethod::Word2Vec, ExtractionMethod::FastText),
];

/// Same-language relatedness between two extraction methods.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodAgreement {
    pub method1: ExtractionMethod,
    pub method2: ExtractionMethod,
    pub score: f64,
}

impl fmt::Display for MethodAgreement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} vs {}: {:.4}", self.method1, self.method2, self.score)
    }
}

/// Result of comparing the extraction methods on one window.
#[derive(Debug, Clone, Serialize)]
pub struct AgreementReport {
    pub keyword: String,
    pub language: Language,
    pub window: Window,
    pub agreements: Vec<MethodAgreement>,
}

/// Collector, annotator, extractor and scorer wired together.
pub struct DriftPipeline<F, R, A, O> {
    collector: IncrementalCollector<F, R>,
    annotator: A,
    extractor: TermExtractor,
    scorer: DriftScorer<O>,
}

impl<F, R, A, O> fmt::Debug for DriftPipeline<F, R, A, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriftPipeline")
            .field("extractor", &self.extractor)
            .finish_non_exhaustive()
    }
}

impl<F, R, A, O> DriftPipeline<F, R, A, O>
where
    F: NewsFeed,
    R: ArticleResolver,
    A: Annotator,
    O: RelatednessOracle,
{
    pub fn new(
        collector: IncrementalCollector<F, R>,
        annotator: A,
        extractor: TermExtractor,
        scorer: DriftScorer<O>,
    ) -> Self {
        Self {
            collector,
            annotator,
            extractor,
            scorer,
        }
    }

    /// Annotate an in-memory corpus and run all three extraction methods.
    #[instrument(level = "info", skip_all, fields(%language, %seed, articles = articles.len()))]
    pub async fn extract_terms(
        &self,
        articles: &[String],
        language: Language,
        seed: &str,
    ) -> Result<MethodTerms, PipelineError> {
        let text = flatten_corpus(articles);
        let annotated = self.annotator.annotate(&text, language).await?;
        Ok(self.extractor.extract_all(&annotated, language, seed)?)
    }

    async fn corpus_terms(&self, corpus: &WindowCorpus) -> Result<MethodTerms, PipelineError> {
        self.extract_terms(&corpus.articles, corpus.language, &corpus.keyword).await
    }

    /// Score two corpora of the same window against each other, per method.
    #[instrument(level = "info", skip_all, fields(window = %c1.window))]
    pub async fn window_point(&self, c1: &WindowCorpus, c2: &WindowCorpus) -> Result<DriftPoint, PipelineError> {
        let terms1 = self.corpus_terms(c1).await?;
        let terms2 = self.corpus_terms(c2).await?;

        let mut scores = [0.0; 3];
        for (slot, method) in scores.iter_mut().zip(ExtractionMethod::ALL) {
            *slot = self
                .scorer
                .score(c1.language, terms1.get(method), c2.language, terms2.get(method))
                .await?;
        }
        let [frequency, word2vec, fasttext] = scores;
        info!(frequency, word2vec, fasttext, "Window scored");
        Ok(DriftPoint {
            window: c1.window,
            label: c1.window.label(),
            frequency,
            word2vec,
            fasttext,
        })
    }

    /// Collect `days` single-day windows for both keywords and score each.
    #[instrument(level = "info", skip_all, fields(%keyword1, %language1, %keyword2, %language2, %start, days = days))]
    pub async fn drift_series(
        &self,
        keyword1: &str,
        language1: Language,
        keyword2: &str,
        language2: Language,
        start: NaiveDate,
        days: u64,
    ) -> Result<DriftSeries, PipelineError> {
        let corpora1 = self.collector.collect_daily(keyword1, language1, start, days).await?;
        let corpora2 = self.collector.collect_daily(keyword2, language2, start, days).await?;

        let mut points = Vec::with_capacity(corpora1.len());
        for (c1, c2) in corpora1.iter().zip(&corpora2) {
            points.push(self.window_point(c1, c2).await?);
        }
        info!(points = points.len(), "Drift series complete");
        Ok(DriftSeries {
            keyword1: keyword1.to_string(),
            language1,
            keyword2: keyword2.to_string(),
            language2,
            points,
        })
    }

    /// Compare the three extraction methods against each other on one window.
    #[instrument(level = "info", skip_all, fields(%keyword, %language, %window))]
    pub async fn agreement(
        &self,
        keyword: &str,
        language: Language,
        window: Window,
    ) -> Result<AgreementReport, PipelineError> {
        let corpus = self.collector.collect_window(keyword, language, window).await?;
        let terms = self.corpus_terms(&corpus).await?;

        let mut agreements = Vec::with_capacity(METHOD_PAIRS.len());
        for (m1, m2) in METHOD_PAIRS {
            let score = self
                .scorer
                .score_same_lang(terms.get(m1), terms.get(m2), language)
                .await?;
            agreements.push(MethodAgreement {
                method1: m1,
                method2: m2,
                score,
            });
        }
        Ok(AgreementReport {
            keyword: keyword.to_string(),
            language,
            window,
            agreements,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CollectorConfig, StopwordConfig};
    use crate::corpus::CorpusBuilder;
    use crate::corpus::tests::{MapResolver, meta};
    use crate::crawler::DateRangeCrawler;
    use crate::error::{AnnotateError, ExtractError, FeedError, OracleError};
    use crate::models::ArticleMeta;
    use crate::nlp::annotate::AnnotatedCorpus;
    use crate::nlp::annotate::tests::annotated;
    use std::sync::Mutex;

    /// One article per language and day.
    struct DayFeed;

    impl NewsFeed for DayFeed {
        async fn search(&self, _keyword: &str, window: Window, language: Language) -> Result<Vec<ArticleMeta>, FeedError> {
            Ok(vec![meta("story", &format!("https://n.example/{language}/{}", window.start()))])
        }
    }

    /// Returns a fixed tagged corpus per language and records the input text.
    #[derive(Default)]
    struct FixedAnnotator {
        texts: Mutex<Vec<String>>,
    }

    impl Annotator for FixedAnnotator {
        async fn annotate(&self, text: &str, language: Language) -> Result<AnnotatedCorpus, AnnotateError> {
            self.texts.lock().unwrap().push(text.to_string());
            let (seed, adj, noun) = match language {
                Language::Fr => ("afrique", "nouveau", "commerce"),
                _ => ("africa", "new", "trade"),
            };
            let s: &[(&str, &str, &str)] = &[(seed, seed, "PROPN"), (adj, adj, "ADJ"), (noun, noun, "NOUN")];
            Ok(annotated(&[s, s, s]))
        }
    }

    /// Constant relatedness; counts calls.
    #[derive(Default)]
    struct CountingOracle {
        calls: Mutex<usize>,
    }

    impl RelatednessOracle for CountingOracle {
        async fn relatedness(&self, _: Language, _: &str, _: Language, _: &str) -> Result<f64, OracleError> {
            *self.calls.lock().unwrap() += 1;
            Ok(0.25)
        }
    }

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn pipeline(bodies: &[(&str, String)]) -> DriftPipeline<DayFeed, MapResolver, FixedAnnotator, CountingOracle> {
        let collector = IncrementalCollector::new(
            DateRangeCrawler::new(DayFeed),
            CorpusBuilder::new(MapResolver::new(bodies)),
            &CollectorConfig::default(),
            "unused",
        );
        DriftPipeline::new(
            collector,
            FixedAnnotator::default(),
            TermExtractor::new(StopwordConfig::default()),
            DriftScorer::new(CountingOracle::default()),
        )
    }

    #[tokio::test]
    async fn test_drift_series_one_point_per_day() {
        let body = "mot ".repeat(200);
        let p = pipeline(&[
            ("https://n.example/en/2022-08-15", body.clone()),
            ("https://n.example/fr/2022-08-15", body.clone()),
        ]);
        let series = p
            .drift_series("africa", Language::En, "afrique", Language::Fr, d("2022-08-15"), 3)
            .await
            .unwrap();

        assert_eq!(series.points.len(), 3);
        assert_eq!(series.labels(), vec!["Aug 15", "Aug 16", "Aug 17"]);
        // frequency: 1x1 adjective pair; embeddings: 2x2 neighbour pairs.
        assert_eq!(series.points[0].frequency, 0.25);
        assert_eq!(series.points[0].word2vec, 1.0);
        assert_eq!(series.points[0].fasttext, 1.0);
        assert_eq!(*p.scorer.oracle().calls.lock().unwrap(), 3 * 9);
        assert_eq!(p.annotator.texts.lock().unwrap()[0], body);
    }

    #[tokio::test]
    async fn test_agreement_scores_three_method_pairs() {
        let p = pipeline(&[]);
        let report = p
            .agreement("africa", Language::En, Window::starting(d("2022-08-15"), 1))
            .await
            .unwrap();

        let pairs: Vec<_> = report.agreements.iter().map(|a| (a.method1, a.method2)).collect();
        assert_eq!(pairs, METHOD_PAIRS.to_vec());
        assert_eq!(report.agreements[0].score, 0.5);
        assert_eq!(report.agreements[2].score, 1.0);
        assert_eq!(report.agreements[0].to_string(), "frequency vs word2vec: 0.5000");
    }

    #[tokio::test]
    async fn test_missing_seed_aborts_run() {
        let p = pipeline(&[]);
        let err = p
            .extract_terms(&["text".to_string()], Language::En, "asia")
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Extract(ExtractError::TermNotFound(_))));
    }
}
