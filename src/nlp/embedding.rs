//! Corpus-local word embeddings and nearest-neighbour lookup.
//!
//! Two trainers fill the word-level and subword-level roles:
//!
//! - [`CooccurrenceTrainer`]: distance-weighted co-occurrence counts inside a
//!   symmetric context window, reweighted by positive pointwise mutual
//!   information. Words sharing contexts end up close.
//! - [`SubwordTrainer`]: the same context signal plus hashed character
//!   n-grams of the word itself (`<wor`, `word`, `ord>` ...), so words with
//!   shared morphology also end up close.
//!
//! Vectors are sparse and unit-normalized; similarity is cosine.
//! Training is deterministic for a given sentence list: features live in
//! ordered maps so every float sum runs in the same order.

use crate::error::ExtractError;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

type SparseVector = BTreeMap<u64, f32>;

/// Offset separating n-gram feature ids from context feature ids.
const NGRAM_SPACE: u64 = 1 << 32;

/// Hyper-parameters for one training run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrainingParams {
    /// Context words considered on each side of a target word.
    pub window: usize,
    /// Words occurring fewer times than this are dropped from the vocabulary.
    pub min_count: usize,
}

/// Trains an [`Embeddings`] table from tokenized sentences.
pub trait EmbeddingTrainer {
    fn train(&self, sentences: &[Vec<String>], params: TrainingParams) -> Embeddings;
}

/// A trained vocabulary of unit vectors.
#[derive(Debug, Clone, Default)]
pub struct Embeddings {
    vectors: HashMap<String, SparseVector>,
}

impl Embeddings {
    #[cfg(test)]
    pub fn contains(&self, word: &str) -> bool {
        self.vectors.contains_key(word)
    }

    pub fn vocab_len(&self) -> usize {
        self.vectors.len()
    }

    #[cfg(test)]
    pub fn similarity(&self, a: &str, b: &str) -> Option<f32> {
        Some(cosine(self.vectors.get(a)?, self.vectors.get(b)?))
    }

    /// The `topn` words closest to `word`, best first, excluding `word`.
    ///
    /// Equal scores are ordered alphabetically.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::TermNotFound`] if `word` is not in the vocabulary.
    pub fn most_similar(&self, word: &str, topn: usize) -> Result<Vec<(String, f32)>, ExtractError> {
        let target = self
            .vectors
            .get(word)
            .ok_or_else(|| ExtractError::TermNotFound(word.to_string()))?;

        let mut scored: Vec<(String, f32)> = self
            .vectors
            .iter()
            .filter(|(w, _)| w.as_str() != word)
            .map(|(w, v)| (w.clone(), cosine(target, v)))
            .collect();
        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        scored.truncate(topn);
        Ok(scored)
    }
}

/// Word-level embeddings from windowed co-occurrence.
#[derive(Debug, Clone, Copy, Default)]
pub struct CooccurrenceTrainer;

impl EmbeddingTrainer for CooccurrenceTrainer {
    fn train(&self, sentences: &[Vec<String>], params: TrainingParams) -> Embeddings {
        let vocab = Vocabulary::build(sentences, params.min_count);
        let context = context_vectors(sentences, &vocab, params.window);
        debug!(vocab = vocab.words.len(), window = params.window, "Trained co-occurrence embeddings");
        Embeddings {
            vectors: vocab.words.into_iter().zip(context).collect(),
        }
    }
}

/// Subword-aware embeddings: context signal plus character n-grams.
#[derive(Debug, Clone, Copy)]
pub struct SubwordTrainer {
    pub min_n: usize,
    pub max_n: usize,
    pub buckets: u64,
    /// Weight of the n-gram part relative to the context part.
    pub subword_weight: f32,
}

impl Default for SubwordTrainer {
    fn default() -> Self {
        Self {
            min_n: 3,
            max_n: 6,
            buckets: 2_000_000,
            subword_weight: 0.5,
        }
    }
}

impl SubwordTrainer {
    fn ngram_vector(&self, word: &str) -> SparseVector {
        let chars: Vec<char> = format!("<{word}>").chars().collect();
        let mut v = SparseVector::new();
        for n in self.min_n..=self.max_n {
            for gram in chars.windows(n) {
                let gram: String = gram.iter().collect();
                let id = NGRAM_SPACE + fnv1a(&gram) % self.buckets;
                *v.entry(id).or_insert(0.0) += 1.0;
            }
        }
        normalize(&mut v);
        v
    }
}

impl EmbeddingTrainer for SubwordTrainer {
    fn train(&self, sentences: &[Vec<String>], params: TrainingParams) -> Embeddings {
        let vocab = Vocabulary::build(sentences, params.min_count);
        let context = context_vectors(sentences, &vocab, params.window);

        let vectors = vocab
            .words
            .into_iter()
            .zip(context)
            .map(|(word, mut v)| {
                for (id, x) in self.ngram_vector(&word) {
                    *v.entry(id).or_insert(0.0) += self.subword_weight * x;
                }
                normalize(&mut v);
                (word, v)
            })
            .collect::<HashMap<_, _>>();
        debug!(vocab = vectors.len(), window = params.window, "Trained subword embeddings");
        Embeddings { vectors }
    }
}

/// Words meeting `min_count`, in first-appearance order.
struct Vocabulary {
    words: Vec<String>,
    index: HashMap<String, usize>,
}

impl Vocabulary {
    fn build(sentences: &[Vec<String>], min_count: usize) -> Self {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        let mut order: Vec<&str> = Vec::new();
        for token in sentences.iter().flatten() {
            let c = counts.entry(token.as_str()).or_insert(0);
            if *c == 0 {
                order.push(token);
            }
            *c += 1;
        }

        let words: Vec<String> = order
            .into_iter()
            .filter(|w| counts[w] >= min_count)
            .map(String::from)
            .collect();
        let index = words.iter().enumerate().map(|(i, w)| (w.clone(), i)).collect();
        Self { words, index }
    }
}

/// PPMI-weighted, unit-normalized context vectors, one per vocabulary word.
///
/// Out-of-vocabulary tokens are removed from each sentence before windowing.
fn context_vectors(sentences: &[Vec<String>], vocab: &Vocabulary, window: usize) -> Vec<SparseVector> {
    let mut cooc: Vec<BTreeMap<usize, f32>> = vec![BTreeMap::new(); vocab.words.len()];
    for sentence in sentences {
        let ids: Vec<usize> = sentence.iter().filter_map(|t| vocab.index.get(t).copied()).collect();
        for (i, &target) in ids.iter().enumerate() {
            let lo = i.saturating_sub(window);
            let hi = (i + window).min(ids.len().saturating_sub(1));
            for j in lo..=hi {
                if j == i {
                    continue;
                }
                let weight = 1.0 / (i.abs_diff(j) as f32);
                *cooc[target].entry(ids[j]).or_insert(0.0) += weight;
            }
        }
    }

    let marginals: Vec<f32> = cooc.iter().map(|row| row.values().sum()).collect();
    let total: f32 = marginals.iter().sum();

    cooc.into_iter()
        .enumerate()
        .map(|(i, row)| {
            let mut v: SparseVector = row
                .into_iter()
                .filter_map(|(j, c)| {
                    let pmi = (c * total / (marginals[i] * marginals[j])).ln();
                    (pmi > 0.0).then_some((j as u64, pmi))
                })
                .collect();
            normalize(&mut v);
            v
        })
        .collect()
}

fn normalize(v: &mut SparseVector) {
    let norm = v.values().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        v.values_mut().for_each(|x| *x /= norm);
    }
}

/// Dot product of two unit vectors.
fn cosine(a: &SparseVector, b: &SparseVector) -> f32 {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    small
        .iter()
        .filter_map(|(k, x)| large.get(k).map(|y| x * y))
        .sum()
}

fn fnv1a(s: &str) -> u64 {
    s.bytes().fold(0xcbf2_9ce4_8422_2325, |h, b| {
        (h ^ u64::from(b)).wrapping_mul(0x0000_0100_0000_01b3)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sentences(raw: &[&str]) -> Vec<Vec<String>> {
        raw.iter()
            .map(|s| s.split_whitespace().map(String::from).collect())
            .collect()
    }

    fn params(window: usize, min_count: usize) -> TrainingParams {
        TrainingParams { window, min_count }
    }

    fn corpus() -> Vec<Vec<String>> {
        sentences(&[
            "cat drinks milk at home",
            "dog drinks water at home",
            "cat chases mouse in garden",
            "dog chases ball in garden",
            "market prices rise sharply today",
            "stock prices fall sharply today",
        ])
    }

    #[test]
    fn test_min_count_prunes_vocabulary() {
        let emb = CooccurrenceTrainer.train(&corpus(), params(5, 2));
        assert!(emb.contains("cat"));
        assert!(emb.contains("sharply"));
        assert!(!emb.contains("milk"));
        assert!(!emb.contains("market"));
    }

    #[test]
    fn test_most_similar_excludes_seed_and_caps() {
        let emb = CooccurrenceTrainer.train(&corpus(), params(5, 1));
        let near = emb.most_similar("cat", 8).unwrap();
        assert_eq!(near.len(), 8);
        assert!(near.iter().all(|(w, _)| w != "cat"));
        assert!(near.windows(2).all(|p| p[0].1 >= p[1].1));
    }

    #[test]
    fn test_shared_contexts_are_close() {
        let emb = CooccurrenceTrainer.train(&corpus(), params(5, 1));
        let cat_dog = emb.similarity("cat", "dog").unwrap();
        let cat_stock = emb.similarity("cat", "stock").unwrap();
        assert!(cat_dog > cat_stock);
        assert_eq!(emb.most_similar("cat", 1).unwrap()[0].0, "dog");
    }

    #[test]
    fn test_unknown_seed_is_term_not_found() {
        let emb = CooccurrenceTrainer.train(&corpus(), params(5, 1));
        let err = emb.most_similar("zebra", 8).unwrap_err();
        assert!(matches!(err, ExtractError::TermNotFound(w) if w == "zebra"));
    }

    #[test]
    fn test_subword_trainer_rewards_shared_morphology() {
        let emb = SubwordTrainer::default().train(
            &sentences(&[
                "economic growth slows",
                "economics growth slows",
                "banana growth slows",
            ]),
            params(4, 1),
        );
        let close = emb.similarity("economic", "economics").unwrap();
        let far = emb.similarity("economic", "banana").unwrap();
        assert!(close > far);
    }

    #[test]
    fn test_training_is_deterministic() {
        let a = SubwordTrainer::default().train(&corpus(), params(4, 1));
        let b = SubwordTrainer::default().train(&corpus(), params(4, 1));
        assert_eq!(a.most_similar("dog", 5).unwrap(), b.most_similar("dog", 5).unwrap());
    }

    #[test]
    fn test_empty_corpus() {
        let emb = CooccurrenceTrainer.train(&[], params(5, 1));
        assert_eq!(emb.vocab_len(), 0);
        assert!(emb.most_similar("africa", 8).is_err());
    }
}
