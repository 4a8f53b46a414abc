//! Cross-language drift scoring.
//!
//! The drift score of two term lists is the sum of oracle relatedness over
//! every ordered pair `(a, b)` with `a` from the first list and `b` from the
//! second. A higher score means the two keywords' neighbourhoods are closer.

pub mod oracle;
pub mod pacing;

pub use oracle::{ConceptNetOracle, PacedOracle, RelatednessOracle};
pub use pacing::ConfiguredPacer;

use crate::error::OracleError;
use crate::models::{Language, TermList};
use tracing::{debug, info, instrument};

/// Sums oracle relatedness over all cross pairs of two term lists.
#[derive(Debug)]
pub struct DriftScorer<O> {
    oracle: O,
}

impl<O: RelatednessOracle> DriftScorer<O> {
    pub fn new(oracle: O) -> Self {
        Self { oracle }
    }

    #[cfg(test)]
    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Score `terms1` (in `language1`) against `terms2` (in `language2`).
    ///
    /// Issues exactly `terms1.len() * terms2.len()` oracle calls, in row-major
    /// order. Scored terms are compared by their text only.
    ///
    /// # Arguments
    ///
    /// * `language1` - Language of the first list's terms
    /// * `terms1` - First term list
    /// * `language2` - Language of the second list's terms
    /// * `terms2` - Second term list
    ///
    /// # Returns
    ///
    /// The sum of relatedness over every pair. An empty list scores `0.0`
    /// without calling the oracle.
    ///
    /// # Errors
    ///
    /// The first oracle failure aborts the score; no partial sum is returned.
    #[instrument(level = "info", skip_all, fields(%language1, %language2, n = terms1.len(), m = terms2.len()))]
    pub async fn score(
        &self,
        language1: Language,
        terms1: &TermList,
        language2: Language,
        terms2: &TermList,
    ) -> Result<f64, OracleError> {
        if terms1.is_empty() || terms2.is_empty() {
            debug!("Empty term list; nothing to score");
            return Ok(0.0);
        }
        let mut total = 0.0;
        for a in terms1.texts() {
            for b in terms2.texts() {
                total += self.oracle.relatedness(language1, a, language2, b).await?;
            }
        }
        info!(total, "Drift score");
        Ok(total)
    }

    /// Score two term lists of the same language, e.g. two extraction methods.
    pub async fn score_same_lang(
        &self,
        terms1: &TermList,
        terms2: &TermList,
        language: Language,
    ) -> Result<f64, OracleError> {
        self.score(language, terms1, language, terms2).await
    }
}
