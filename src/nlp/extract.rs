//! Related-term extraction from an annotated corpus.
//!
//! Three methods, each returning at most [`MAX_TERMS`] terms:
//!
//! | method    | input                         | output                      |
//! |-----------|-------------------------------|-----------------------------|
//! | frequency | lemma counts, adjectives only | bare terms, most frequent   |
//! | word2vec  | per-sentence lemma lists      | scored neighbours of seed   |
//! | fasttext  | per-sentence lemma lists      | scored neighbours of seed   |
//!
//! The embedding methods train a fresh model per corpus. Their minimum word
//! count grows with the number of sentences so that large corpora do not
//! drown in hapaxes.

use crate::config::StopwordConfig;
use crate::error::ExtractError;
use crate::models::{ExtractionMethod, Language, MAX_TERMS, Term, TermList};
use crate::nlp::annotate::AnnotatedCorpus;
use crate::nlp::embedding::{CooccurrenceTrainer, EmbeddingTrainer, SubwordTrainer, TrainingParams};
use crate::nlp::stopwords::Stopwords;
use itertools::Itertools;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, instrument};

pub const WORD2VEC_WINDOW: usize = 5;
pub const FASTTEXT_WINDOW: usize = 4;

/// Upper sentence-count bound of each minimum-count tier.
const MIN_COUNT_TIERS: [usize; 10] = [250, 1000, 3000, 6000, 10000, 13000, 16000, 20000, 25000, 35000];

/// Minimum word count for the word-level model given `sentences` sentences.
pub fn word2vec_min_count(sentences: usize) -> usize {
    2 + MIN_COUNT_TIERS.iter().take_while(|&&bound| sentences > bound).count()
}

/// Minimum word count for the subword model; one lower than the word-level tier.
pub fn fasttext_min_count(sentences: usize) -> usize {
    word2vec_min_count(sentences) - 1
}

/// Lemmas of a corpus split by part of speech, stopwords removed.
///
/// Every bucket keeps corpus order and repeats.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LemmaBuckets {
    pub all: Vec<String>,
    pub adjectives: Vec<String>,
    pub nouns: Vec<String>,
    pub verbs: Vec<String>,
}

/// Bucket every lemma of `corpus`. Words without a lemma are skipped.
pub fn lemma_buckets(corpus: &AnnotatedCorpus, stopwords: &Stopwords) -> LemmaBuckets {
    let mut buckets = LemmaBuckets::default();
    for word in corpus.words() {
        let Some(lemma) = word.lemma.as_deref() else {
            continue;
        };
        if stopwords.contains(lemma) {
            continue;
        }
        buckets.all.push(lemma.to_string());
        match word.upos.as_str() {
            "ADJ" => buckets.adjectives.push(lemma.to_string()),
            "NOUN" => buckets.nouns.push(lemma.to_string()),
            "VERB" => buckets.verbs.push(lemma.to_string()),
            _ => {}
        }
    }
    buckets
}

/// One lowercased lemma list per sentence, stopwords removed.
pub fn sentence_tokens(corpus: &AnnotatedCorpus, stopwords: &Stopwords) -> Vec<Vec<String>> {
    corpus
        .sentences
        .iter()
        .map(|s| {
            s.words
                .iter()
                .filter_map(|w| w.lemma.as_deref())
                .map(str::to_lowercase)
                .filter(|l| !stopwords.contains(l))
                .collect()
        })
        .collect()
}

/// Lemmas by descending frequency; ties keep first-appearance order.
fn rank_by_frequency(lemmas: &[String]) -> Vec<&str> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for l in lemmas {
        *counts.entry(l.as_str()).or_insert(0) += 1;
    }
    lemmas
        .iter()
        .map(String::as_str)
        .unique()
        .enumerate()
        .sorted_by(|(ia, a), (ib, b)| counts[b].cmp(&counts[a]).then(ia.cmp(ib)))
        .map(|(_, l)| l)
        .collect()
}

/// The three term lists of one corpus.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodTerms {
    pub frequency: TermList,
    pub word2vec: TermList,
    pub fasttext: TermList,
}

impl MethodTerms {
    pub fn get(&self, method: ExtractionMethod) -> &TermList {
        match method {
            ExtractionMethod::Frequency => &self.frequency,
            ExtractionMethod::Word2Vec => &self.word2vec,
            ExtractionMethod::FastText => &self.fasttext,
        }
    }
}

/// Runs the extraction methods with the configured stopwords and trainers.
#[derive(Debug, Clone)]
pub struct TermExtractor<W = CooccurrenceTrainer, S = SubwordTrainer> {
    stopwords: StopwordConfig,
    word_trainer: W,
    subword_trainer: S,
}

impl TermExtractor {
    pub fn new(stopwords: StopwordConfig) -> Self {
        Self::with_trainers(stopwords, CooccurrenceTrainer, SubwordTrainer::default())
    }
}

impl<W: EmbeddingTrainer, S: EmbeddingTrainer> TermExtractor<W, S> {
    pub fn with_trainers(stopwords: StopwordConfig, word_trainer: W, subword_trainer: S) -> Self {
        Self {
            stopwords,
            word_trainer,
            subword_trainer,
        }
    }

    /// Extract up to [`MAX_TERMS`] terms related to `seed` with `method`.
    ///
    /// # Errors
    ///
    /// The embedding methods return [`ExtractError::TermNotFound`] when the
    /// lowercased seed is not in the trained vocabulary.
    #[instrument(level = "info", skip_all, fields(%method, %language, %seed))]
    pub fn extract(
        &self,
        corpus: &AnnotatedCorpus,
        method: ExtractionMethod,
        language: Language,
        seed: &str,
    ) -> Result<TermList, ExtractError> {
        let stopwords = Stopwords::for_language(language, &self.stopwords);
        let terms = match method {
            ExtractionMethod::Frequency => self.frequency_terms(corpus, &stopwords),
            ExtractionMethod::Word2Vec => {
                let sentences = sentence_tokens(corpus, &stopwords);
                let params = TrainingParams {
                    window: WORD2VEC_WINDOW,
                    min_count: word2vec_min_count(sentences.len()),
                };
                neighbours(&self.word_trainer, &sentences, params, seed)?
            }
            ExtractionMethod::FastText => {
                let sentences = sentence_tokens(corpus, &stopwords);
                let params = TrainingParams {
                    window: FASTTEXT_WINDOW,
                    min_count: fasttext_min_count(sentences.len()),
                };
                neighbours(&self.subword_trainer, &sentences, params, seed)?
            }
        };
        let list = TermList::new(language, method, terms);
        info!(terms = %list, "Extracted terms");
        Ok(list)
    }

    /// Run all three methods on one corpus.
    pub fn extract_all(
        &self,
        corpus: &AnnotatedCorpus,
        language: Language,
        seed: &str,
    ) -> Result<MethodTerms, ExtractError> {
        Ok(MethodTerms {
            frequency: self.extract(corpus, ExtractionMethod::Frequency, language, seed)?,
            word2vec: self.extract(corpus, ExtractionMethod::Word2Vec, language, seed)?,
            fasttext: self.extract(corpus, ExtractionMethod::FastText, language, seed)?,
        })
    }

    fn frequency_terms(&self, corpus: &AnnotatedCorpus, stopwords: &Stopwords) -> Vec<Term> {
        let buckets = lemma_buckets(corpus, stopwords);
        let adjectives: HashSet<&str> = buckets.adjectives.iter().map(String::as_str).collect();
        debug!(
            lemmas = buckets.all.len(),
            adjectives = buckets.adjectives.len(),
            nouns = buckets.nouns.len(),
            verbs = buckets.verbs.len(),
            "Bucketed lemmas"
        );
        rank_by_frequency(&buckets.all)
            .into_iter()
            .filter(|l| adjectives.contains(l))
            .take(MAX_TERMS)
            .map(|l| Term::Bare(l.to_string()))
            .collect()
    }
}

fn neighbours<T: EmbeddingTrainer>(
    trainer: &T,
    sentences: &[Vec<String>],
    params: TrainingParams,
    seed: &str,
) -> Result<Vec<Term>, ExtractError> {
    let embeddings = trainer.train(sentences, params);
    debug!(
        sentences = sentences.len(),
        vocab = embeddings.vocab_len(),
        min_count = params.min_count,
        "Trained embeddings"
    );
    Ok(embeddings
        .most_similar(&seed.to_lowercase(), MAX_TERMS)?
        .into_iter()
        .map(|(term, score)| Term::Scored { term, score })
        .collect())
}
