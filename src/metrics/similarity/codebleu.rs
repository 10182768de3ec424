//! @ai:module:intent CodeBLEU: n-gram, keyword-weighted, syntax and data-flow match
//! @ai:module:layer domain
//! @ai:module:public_api CodeBleu, CodeBleuScore
//! @ai:module:stateless true

use super::bleu::{self, NgramStats, Smoothing, DEFAULT_EPSILON, MAX_ORDER};
use super::{dataflow, syntax, SimilarityError};
use crate::config::CodeBleuConfig;
use rustpython_parser::{ast, Parse};
use serde::{Deserialize, Serialize};

const NON_KEYWORD_WEIGHT: f64 = 0.2;

const PYTHON_KEYWORDS: [&str; 35] = [
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
    "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return",
    "try", "while", "with", "yield",
];

/// @ai:intent Combined CodeBLEU value and its four components
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CodeBleuScore {
    pub codebleu: f64,
    pub ngram_match: f64,
    pub weighted_ngram_match: f64,
    pub syntax_match: f64,
    pub dataflow_match: f64,
}

/// @ai:intent Scores Python candidates against a reference solution
pub struct CodeBleu {
    weights: [f64; 4],
}

impl CodeBleu {
    /// @ai:intent Create a scorer with component weights (ngram, weighted, syntax, dataflow)
    /// @ai:effects pure
    pub fn new(config: &CodeBleuConfig) -> Self {
        Self {
            weights: config.weights,
        }
    }

    /// @ai:intent Score one candidate
    /// @ai:pre reference parses as Python
    /// @ai:post Err only for an unparseable reference; an unparseable candidate scores 0 on syntax and dataflow
    /// @ai:effects pure
    pub fn score(&self, candidate: &str, reference: &str) -> Result<CodeBleuScore, SimilarityError> {
        let reference_suite = ast::Suite::parse(reference, "<reference>")
            .map_err(|e| SimilarityError::ReferenceParse(e.to_string()))?;
        let candidate_suite = match ast::Suite::parse(candidate, "<candidate>") {
            Ok(suite) => Some(suite),
            Err(e) => {
                tracing::debug!("Candidate does not parse, syntax and dataflow score 0: {}", e);
                None
            }
        };

        let reference_tokens = bleu::tokenize(reference);
        let candidate_tokens = bleu::tokenize(candidate);

        let ngram_match = bleu::corpus_bleu(
            [(reference, candidate)],
            Smoothing::Epsilon(DEFAULT_EPSILON),
        );
        let weighted_ngram_match = weighted_ngram_match(&reference_tokens, &candidate_tokens);

        let candidate_tree = candidate_suite.as_deref().map(syntax::build_tree);
        let syntax_match = syntax::match_score(
            &syntax::build_tree(&reference_suite),
            candidate_tree.as_ref(),
        );

        let candidate_flow = candidate_suite
            .as_deref()
            .map(dataflow::extract)
            .unwrap_or_default();
        let dataflow_match = dataflow::match_score(&dataflow::extract(&reference_suite), &candidate_flow);

        let [w_ngram, w_weighted, w_syntax, w_dataflow] = self.weights;
        let codebleu = w_ngram * ngram_match
            + w_weighted * weighted_ngram_match
            + w_syntax * syntax_match
            + w_dataflow * dataflow_match;

        Ok(CodeBleuScore {
            codebleu,
            ngram_match,
            weighted_ngram_match,
            syntax_match,
            dataflow_match,
        })
    }
}

impl Default for CodeBleu {
    fn default() -> Self {
        Self::new(&CodeBleuConfig::default())
    }
}

fn is_keyword(token: &str) -> bool {
    PYTHON_KEYWORDS.contains(&token)
}

/// @ai:intent BLEU over recall, with unigrams weighted by keyword status
/// @ai:effects pure
fn weighted_ngram_match(reference: &[&str], candidate: &[&str]) -> f64 {
    let mut stats = NgramStats {
        hyp_len: candidate.len(),
        ref_len: reference.len(),
        ..Default::default()
    };

    for n in 1..=MAX_ORDER {
        let (numerator, denominator) = weighted_recall(reference, candidate, n);
        stats.numerators[n - 1] = numerator;
        stats.denominators[n - 1] = denominator;
    }

    stats.score(Smoothing::Epsilon(DEFAULT_EPSILON))
}

/// @ai:intent Clipped reference n-gram counts over total reference counts
/// @ai:effects pure
fn weighted_recall(reference: &[&str], candidate: &[&str], n: usize) -> (f64, f64) {
    let candidate_counts = bleu::ngram_counts(candidate, n);
    let reference_counts = bleu::ngram_counts(reference, n);

    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for (gram, count) in &reference_counts {
        let weight = match gram {
            [token] if !is_keyword(token) => NON_KEYWORD_WEIGHT,
            _ => 1.0,
        };
        let clipped = (*count).min(candidate_counts.get(gram).copied().unwrap_or(0));
        numerator += clipped as f64 * weight;
        denominator += *count as f64 * weight;
    }

    (numerator, denominator.max(1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    const REFERENCE: &str = "def gcd(a, b):\n    if b == 0:\n        return a\n    else:\n        return gcd(b, a % b)";

    #[test]
    fn test_identical_code_scores_one() {
        let score = CodeBleu::default().score(REFERENCE, REFERENCE).unwrap();
        assert!((score.codebleu - 1.0).abs() < 1e-9, "{score:?}");
        assert_eq!(score.syntax_match, 1.0);
        assert_eq!(score.dataflow_match, 1.0);
    }

    #[test]
    fn test_small_edit_scores_high_but_below_one() {
        let candidate = "def gcd(a, b):\n    if b == 0:\n        return a\n    else:\n        return gcd(a % b, b)";
        let score = CodeBleu::default().score(candidate, REFERENCE).unwrap();
        assert!(score.codebleu > 0.5 && score.codebleu < 1.0, "{score:?}");
    }

    #[test]
    fn test_empty_candidate_scores_zero() {
        let score = CodeBleu::default().score("", REFERENCE).unwrap();
        assert_eq!(score.codebleu, 0.0);
    }

    #[test]
    fn test_unparseable_candidate_keeps_token_components() {
        let candidate = "def gcd(a, b)\n    return gcd(b, a % b)";
        let score = CodeBleu::default().score(candidate, REFERENCE).unwrap();
        assert_eq!(score.syntax_match, 0.0);
        assert_eq!(score.dataflow_match, 0.0);
        assert!(score.ngram_match > 0.0);
    }

    #[test]
    fn test_unparseable_reference_is_error() {
        let result = CodeBleu::default().score(REFERENCE, "def gcd(a, b)\n    pass");
        assert!(matches!(result, Err(SimilarityError::ReferenceParse(_))));
    }

    #[test]
    fn test_keyword_tokens_weigh_more() {
        let reference = ["return", "x"];
        let keyword_kept = weighted_recall(&reference, &["return"], 1);
        let name_kept = weighted_recall(&reference, &["x"], 1);
        // denominators are floored at 1
        assert_eq!(keyword_kept, (1.0, 1.2));
        assert_eq!(name_kept, (0.2, 1.2));
    }

    #[test]
    fn test_custom_weights() {
        let config = CodeBleuConfig {
            weights: [0.0, 0.0, 1.0, 0.0],
        };
        let score = CodeBleu::new(&config).score("def f(y):\n    return y", "def g(x):\n    return x").unwrap();
        assert_eq!(score.codebleu, score.syntax_match);
        assert_eq!(score.codebleu, 1.0);
    }
}
