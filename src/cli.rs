//! Command-line interface definitions for News Drift.
//!
//! Every subcommand shares the optional `--config` YAML file; dates are
//! `YYYY-MM-DD`.

use crate::models::Language;
use crate::utils::parse_date;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments for the News Drift application.
///
/// # Examples
///
/// ```sh
/// # Walk forward in 20-day windows and persist each corpus
/// news_drift collect --keyword africa --language en --start 2022-01-01
///
/// # Ten daily drift points between two languages
/// news_drift drift --start 2022-08-15 \
///     --keyword1 africa --language1 en --keyword2 afrique --language2 fr
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to config.yaml file
    #[arg(short, long, global = true, env = "NEWS_DRIFT_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Collect and persist corpora window by window, from a start date to today
    Collect {
        #[arg(short, long)]
        keyword: String,

        #[arg(short, long, value_enum)]
        language: Language,

        #[arg(short, long, value_parser = parse_date)]
        start: NaiveDate,

        /// Window size in days; defaults to the configured value
        #[arg(short, long)]
        window_days: Option<u64>,

        /// Output directory for corpus files; defaults to the configured value
        #[arg(short, long)]
        output_dir: Option<String>,
    },

    /// Collect and persist one window of a keyword in several languages
    Languages {
        #[arg(short, long)]
        keyword: String,

        /// Languages to query; defaults to en, fr, de, es and it
        #[arg(short, long, value_enum, value_delimiter = ',')]
        languages: Vec<Language>,

        /// Window start; defaults to today
        #[arg(short, long, value_parser = parse_date)]
        start: Option<NaiveDate>,

        /// Exclusive window end; defaults to the day after the start
        #[arg(short, long, value_parser = parse_date)]
        end: Option<NaiveDate>,

        /// Output directory for corpus files; defaults to the configured value
        #[arg(short, long)]
        output_dir: Option<String>,
    },

    /// Score daily cross-language drift between two keywords
    Drift {
        #[arg(short, long, value_parser = parse_date)]
        start: NaiveDate,

        /// Number of daily windows; defaults to the configured value
        #[arg(short, long)]
        days: Option<u64>,

        #[arg(long)]
        keyword1: String,

        #[arg(long, value_enum)]
        language1: Language,

        #[arg(long)]
        keyword2: String,

        #[arg(long, value_enum)]
        language2: Language,

        /// Path of the JSON drift series
        #[arg(short, long, default_value = "drift.json")]
        output: PathBuf,
    },

    /// Compare the three extraction methods against each other on one window
    Agreement {
        #[arg(short, long)]
        keyword: String,

        #[arg(short, long, value_enum)]
        language: Language,

        #[arg(short, long, value_parser = parse_date)]
        start: NaiveDate,

        /// Exclusive end date
        #[arg(short, long, value_parser = parse_date)]
        end: NaiveDate,
    },

    /// Extract related terms from a persisted corpus file
    Extract {
        #[arg(long)]
        corpus: PathBuf,

        #[arg(short, long, value_enum)]
        language: Language,

        /// Keyword whose neighbours the embedding methods look up
        #[arg(short, long)]
        seed: String,
    },
}
