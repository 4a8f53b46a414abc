//! Annotated corpora and the annotator that produces them.
//!
//! The annotator is an external tagging pipeline (tokenize, part-of-speech,
//! lemma). Its output is consumed here as CoNLL-U, the interchange format
//! UDPipe, Stanza and spaCy can all emit, and navigated as ordered sentences
//! of ordered words.

use crate::config::{AnnotatorConfig, http_client};
use crate::error::AnnotateError;
use crate::models::Language;
use crate::utils::truncate_for_log;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, info, instrument};

/// One syntactic word with its lemma and universal part-of-speech tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub text: String,
    pub lemma: Option<String>,
    pub upos: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sentence {
    pub words: Vec<Word>,
}

/// A tagged corpus: sentences of words.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotatedCorpus {
    pub sentences: Vec<Sentence>,
}

impl AnnotatedCorpus {
    /// Parse CoNLL-U text.
    ///
    /// Comment lines are skipped, blank lines end a sentence, and multiword
    /// token ranges (`1-2`) and empty nodes (`1.1`) are ignored in favour of
    /// the syntactic words they cover. A lemma of `_` is treated as missing.
    ///
    /// # Errors
    ///
    /// Returns [`AnnotateError::Conllu`] for a word line without ten
    /// tab-separated columns.
    pub fn from_conllu(text: &str) -> Result<Self, AnnotateError> {
        let mut sentences = Vec::new();
        let mut current = Sentence::default();

        for (idx, line) in text.lines().enumerate() {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                if !current.words.is_empty() {
                    sentences.push(std::mem::take(&mut current));
                }
                continue;
            }
            if line.starts_with('#') {
                continue;
            }

            let cols: Vec<&str> = line.split('\t').collect();
            if cols.len() != 10 {
                return Err(AnnotateError::Conllu {
                    line: idx + 1,
                    reason: format!("expected 10 columns, found {}", cols.len()),
                });
            }
            if cols[0].contains('-') || cols[0].contains('.') {
                continue;
            }

            let lemma = match cols[2] {
                "_" if cols[1] != "_" => None,
                l => Some(l.to_string()),
            };
            current.words.push(Word {
                text: cols[1].to_string(),
                lemma,
                upos: cols[3].to_string(),
            });
        }
        if !current.words.is_empty() {
            sentences.push(current);
        }
        Ok(Self { sentences })
    }

    pub fn words(&self) -> impl Iterator<Item = &Word> {
        self.sentences.iter().flat_map(|s| s.words.iter())
    }

    pub fn word_count(&self) -> usize {
        self.sentences.iter().map(|s| s.words.len()).sum()
    }
}

/// Tags raw text in a given language.
pub trait Annotator {
    async fn annotate(&self, text: &str, language: Language) -> Result<AnnotatedCorpus, AnnotateError>;
}

#[derive(Debug, Deserialize)]
struct UdpipeResponse {
    result: String,
}

/// Client for the UDPipe REST service.
#[derive(Debug, Clone)]
pub struct UdpipeAnnotator {
    client: Client,
    base_url: String,
    models: HashMap<Language, String>,
}

impl UdpipeAnnotator {
    pub fn new(config: &AnnotatorConfig) -> Result<Self, AnnotateError> {
        Ok(Self {
            client: http_client(&config.user_agent, config.timeout_secs)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            models: config.models.clone(),
        })
    }
}

impl Annotator for UdpipeAnnotator {
    #[instrument(level = "info", skip_all, fields(%language, chars = text.len()))]
    async fn annotate(&self, text: &str, language: Language) -> Result<AnnotatedCorpus, AnnotateError> {
        let model = self
            .models
            .get(&language)
            .ok_or_else(|| AnnotateError::NoModel(language.to_string()))?;
        let url = format!("{}/process", self.base_url);
        debug!(%url, %model, "Sending text to annotator");

        let resp = self
            .client
            .post(&url)
            .form(&[
                ("data", text),
                ("model", model.as_str()),
                ("tokenizer", ""),
                ("tagger", ""),
            ])
            .send()
            .await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(AnnotateError::Status {
                status: status.as_u16(),
                body: truncate_for_log(&body, 300),
            });
        }

        let parsed: UdpipeResponse = serde_json::from_str(&body)?;
        let corpus = AnnotatedCorpus::from_conllu(&parsed.result)?;
        info!(
            sentences = corpus.sentences.len(),
            words = corpus.word_count(),
            "Tagged corpus created"
        );
        Ok(corpus)
    }
}
