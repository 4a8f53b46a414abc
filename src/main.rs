//! # News Drift
//!
//! Builds Google News corpora for a keyword over date windows and measures how
//! closely the keyword's related terms agree across languages.
//!
//! ## Usage
//!
//! ```sh
//! news_drift collect --keyword africa --language en --start 2022-01-01
//! news_drift drift --start 2022-08-15 --keyword1 africa --language1 en \
//!     --keyword2 afrique --language2 fr --output drift.json
//! ```
//!
//! ## Architecture
//!
//! 1. **Crawling**: query the RSS search feed per window, bisecting windows
//!    whose result count nears the feed's silent cap
//! 2. **Corpus building**: resolve each article to text, skipping failures
//! 3. **Annotation**: tag the flattened corpus with lemmas and parts of speech
//! 4. **Extraction**: frequency, word-level and subword-level related terms
//! 5. **Scoring**: sum ConceptNet relatedness over all cross-language term pairs

use clap::Parser;
use std::error::Error;
use std::path::Path;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod collector;
mod config;
mod corpus;
mod crawler;
mod drift;
mod error;
mod models;
mod nlp;
mod outputs;
mod pipeline;
mod scrapers;
mod utils;

use cli::{Cli, Command};
use collector::{DEFAULT_LANGUAGES, IncrementalCollector, default_window};
use config::{CollectorConfig, Config};
use corpus::CorpusBuilder;
use crawler::DateRangeCrawler;
use drift::{ConceptNetOracle, ConfiguredPacer, DriftScorer, PacedOracle};
use models::{ExtractionMethod, Window};
use nlp::{TermExtractor, UdpipeAnnotator};
use outputs::{corpus_file, json};
use pipeline::DriftPipeline;
use scrapers::{GoogleNewsFeed, HttpArticleResolver};
use utils::{ensure_writable_dir, today};

type LiveCollector = IncrementalCollector<GoogleNewsFeed, HttpArticleResolver>;
type LivePipeline =
    DriftPipeline<GoogleNewsFeed, HttpArticleResolver, UdpipeAnnotator, PacedOracle<ConceptNetOracle, ConfiguredPacer>>;

fn build_collector(config: &Config, collector: &CollectorConfig, articles_dir: &str) -> Result<LiveCollector, Box<dyn Error>> {
    let feed = GoogleNewsFeed::new(&config.feed)?;
    let resolver = HttpArticleResolver::new(&config.corpus)?;
    Ok(IncrementalCollector::new(
        DateRangeCrawler::with_config(feed, &config.feed),
        CorpusBuilder::with_min_chars(resolver, config.corpus.min_article_chars),
        collector,
        articles_dir,
    ))
}

fn build_pipeline(config: &Config) -> Result<LivePipeline, Box<dyn Error>> {
    let collector = build_collector(config, &config.collector, &config.corpus.articles_dir)?;
    let oracle = PacedOracle::new(
        ConceptNetOracle::new(&config.oracle)?,
        ConfiguredPacer::new(config.oracle.pacing()),
    );
    Ok(DriftPipeline::new(
        collector,
        UdpipeAnnotator::new(&config.annotator)?,
        TermExtractor::new(config.stopwords.clone()),
        DriftScorer::new(oracle),
    ))
}

fn window_or_err(start: chrono::NaiveDate, end: chrono::NaiveDate) -> Result<Window, Box<dyn Error>> {
    Window::new(start, end).ok_or_else(|| format!("window start {start} is after end {end}").into())
}

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("news_drift starting up");

    let args = Cli::parse();
    debug!(?args.command, "Parsed CLI arguments");
    let config = Config::load(args.config.as_deref())?;

    match args.command {
        Command::Collect {
            keyword,
            language,
            start,
            window_days,
            output_dir,
        } => {
            let mut collector_config = config.collector.clone();
            if let Some(days) = window_days {
                collector_config.window_days = days;
            }
            let dir = output_dir.unwrap_or_else(|| config.corpus.articles_dir.clone());
            let collector = build_collector(&config, &collector_config, &dir)?;
            let corpora = collector.collect_until(&keyword, language, start, today()).await?;
            info!(windows = corpora.len(), dir = %dir, "Collection complete");
        }

        Command::Languages {
            keyword,
            languages,
            start,
            end,
            output_dir,
        } => {
            let window = match (start, end) {
                (None, None) => default_window(),
                (Some(s), None) => Window::starting(s, 1),
                (s, Some(e)) => window_or_err(s.unwrap_or_else(today), e)?,
            };
            let languages = if languages.is_empty() {
                DEFAULT_LANGUAGES.to_vec()
            } else {
                languages
            };
            let dir = output_dir.unwrap_or_else(|| config.corpus.articles_dir.clone());
            if let Err(e) = ensure_writable_dir(&dir).await {
                error!(path = %dir, error = %e, "Corpus directory is not writable");
                return Err(e.into());
            }

            let collector = build_collector(&config, &config.collector, &dir)?;
            let corpora = collector.collect_languages(&keyword, window, &languages).await?;
            for corpus in &corpora {
                let path = collector.persist(corpus).await?;
                info!(language = %corpus.language, articles = corpus.articles.len(), path = %path.display(), "Saved corpus");
            }
        }

        Command::Drift {
            start,
            days,
            keyword1,
            language1,
            keyword2,
            language2,
            output,
        } => {
            let days = days.unwrap_or(config.collector.daily_window_count);
            let pipeline = build_pipeline(&config)?;
            let series = pipeline
                .drift_series(&keyword1, language1, &keyword2, language2, start, days)
                .await?;
            println!("method\t{}", series.labels().join("\t"));
            for method in ExtractionMethod::ALL {
                let scores: Vec<String> = series.series(method).iter().map(|s| format!("{s:.4}")).collect();
                println!("{method}\t{}", scores.join("\t"));
            }
            if let Err(e) = json::write_series(&series, &output).await {
                error!(path = %output.display(), error = %e, "Failed to write drift series");
                return Err(e);
            }
        }

        Command::Agreement {
            keyword,
            language,
            start,
            end,
        } => {
            let window = window_or_err(start, end)?;
            let pipeline = build_pipeline(&config)?;
            let report = pipeline.agreement(&keyword, language, window).await?;
            for agreement in &report.agreements {
                println!("{agreement}");
            }
        }

        Command::Extract {
            corpus,
            language,
            seed,
        } => {
            let articles = corpus_file::read_corpus(Path::new(&corpus)).await?;
            let pipeline = build_pipeline(&config)?;
            let terms = pipeline.extract_terms(&articles, language, &seed).await?;
            for list in [&terms.frequency, &terms.word2vec, &terms.fasttext] {
                println!("{}: {}", list.method(), list);
            }
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );
    Ok(())
}
