//! @ai:module:intent Continuous similarity between a candidate fix and the reference
//! @ai:module:layer domain
//! @ai:module:public_api SimilarityScorer, SimilarityScores, SimilarityError, CodeBleu, CodeBleuScore

pub mod bleu;
pub mod codebleu;
pub mod dataflow;
pub mod levenshtein;
pub mod syntax;

pub use codebleu::{CodeBleu, CodeBleuScore};

use crate::config::CodeBleuConfig;
use thiserror::Error;

/// @ai:intent Recoverable per-example scoring failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SimilarityError {
    #[error("reference solution does not parse: {0}")]
    ReferenceParse(String),
}

/// @ai:intent All similarity metrics for one candidate; None marks a metric that could not be computed
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityScores {
    pub codebleu: Option<CodeBleuScore>,
    pub bleu: Option<f64>,
    pub levenshtein_distance: Option<usize>,
    pub levenshtein_ratio: Option<f64>,
}

/// @ai:intent Trait for similarity scoring
pub trait SimilarityScorerTrait: Send + Sync {
    /// @ai:intent Score a normalized candidate against a normalized reference
    fn score(&self, candidate: &str, reference: &str) -> SimilarityScores;
}

/// @ai:intent Runs every similarity scorer, isolating failures per metric
pub struct SimilarityScorer {
    codebleu: CodeBleu,
}

impl SimilarityScorer {
    /// @ai:intent Create a new similarity scorer
    /// @ai:effects pure
    pub fn new(config: &CodeBleuConfig) -> Self {
        Self {
            codebleu: CodeBleu::new(config),
        }
    }
}

impl Default for SimilarityScorer {
    fn default() -> Self {
        Self::new(&CodeBleuConfig::default())
    }
}

impl SimilarityScorerTrait for SimilarityScorer {
    /// @ai:effects pure
    fn score(&self, candidate: &str, reference: &str) -> SimilarityScores {
        let codebleu = match self.codebleu.score(candidate, reference) {
            Ok(score) => Some(score),
            Err(e) => {
                tracing::error!("CodeBLEU failed: {}", e);
                None
            }
        };

        SimilarityScores {
            codebleu,
            bleu: Some(bleu::sentence_bleu(reference, candidate)),
            levenshtein_distance: Some(levenshtein::distance(candidate, reference)),
            levenshtein_ratio: Some(levenshtein::ratio(candidate, reference)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_candidate_degrades_to_lowest_scores() {
        let reference = "def f(x):\n    return x + 1";
        let scores = SimilarityScorer::default().score("", reference);

        assert_eq!(scores.codebleu.map(|s| s.codebleu), Some(0.0));
        assert_eq!(scores.bleu, Some(0.0));
        assert_eq!(scores.levenshtein_distance, Some(reference.chars().count()));
        assert_eq!(scores.levenshtein_ratio, Some(0.0));
    }

    #[test]
    fn test_reference_parse_failure_only_drops_codebleu() {
        let scores = SimilarityScorer::default().score("x = 1", "def f(:");
        assert!(scores.codebleu.is_none());
        assert!(scores.bleu.is_some());
        // "x =" -> "def", keep the space, "1" -> "f(:"
        assert_eq!(scores.levenshtein_distance, Some(6));
    }
}
