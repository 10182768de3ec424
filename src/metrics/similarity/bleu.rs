//! @ai:module:intent BLEU over whitespace tokens with NLTK-compatible smoothing
//! @ai:module:layer domain
//! @ai:module:public_api sentence_bleu, corpus_bleu, Smoothing
//! @ai:module:stateless true

use std::collections::HashMap;

/// Highest n-gram order; weights are uniform over 1..=MAX_ORDER
pub const MAX_ORDER: usize = 4;

/// Epsilon used by CodeBLEU's n-gram components
pub const DEFAULT_EPSILON: f64 = 0.1;

const EXPONENTIAL_K: f64 = 5.0;

/// @ai:intent How zero n-gram precisions are replaced
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Smoothing {
    /// `epsilon / denominator` for every zero precision
    Epsilon(f64),
    /// Geometric decay `1 / (2^i * k / ln(hyp_len))`, skipped for one-token hypotheses
    Exponential { k: f64 },
}

/// @ai:intent Accumulated clipped counts for one or more sentence pairs
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct NgramStats {
    pub numerators: [f64; MAX_ORDER],
    pub denominators: [f64; MAX_ORDER],
    pub hyp_len: usize,
    pub ref_len: usize,
}

impl NgramStats {
    /// @ai:intent Add clipped precision counts for one pair
    /// @ai:effects pure
    pub fn add_precision(&mut self, reference: &[&str], hypothesis: &[&str]) {
        for n in 1..=MAX_ORDER {
            let (matched, total) = modified_precision(reference, hypothesis, n);
            self.numerators[n - 1] += matched as f64;
            self.denominators[n - 1] += total.max(1) as f64;
        }
        self.hyp_len += hypothesis.len();
        self.ref_len += reference.len();
    }

    /// @ai:intent Geometric mean of smoothed precisions times brevity penalty
    /// @ai:post result in [0, 1]; 0 when no unigram matched
    /// @ai:effects pure
    pub fn score(&self, smoothing: Smoothing) -> f64 {
        if self.numerators[0] <= 0.0 {
            return 0.0;
        }

        let weight = 1.0 / MAX_ORDER as f64;
        let mut decay = 1;
        let mut log_sum = 0.0;

        for (numerator, denominator) in self.numerators.iter().zip(&self.denominators) {
            let precision = if *numerator > 0.0 {
                numerator / denominator
            } else {
                match smoothing {
                    Smoothing::Epsilon(epsilon) => epsilon / denominator,
                    Smoothing::Exponential { k } if self.hyp_len > 1 => {
                        let smoothed = 1.0 / (2f64.powi(decay) * k / (self.hyp_len as f64).ln());
                        decay += 1;
                        smoothed / denominator
                    }
                    Smoothing::Exponential { .. } => 0.0,
                }
            };

            // Orders that stay at zero drop out of the mean, as NLTK does
            if precision > 0.0 {
                log_sum += weight * precision.ln();
            }
        }

        let bleu = brevity_penalty(self.ref_len, self.hyp_len) * log_sum.exp();
        bleu.clamp(0.0, 1.0)
    }
}

/// @ai:intent Split on Unicode whitespace
/// @ai:effects pure
pub fn tokenize(text: &str) -> Vec<&str> {
    text.split_whitespace().collect()
}

/// @ai:intent Count every contiguous n-gram
/// @ai:effects pure
pub(crate) fn ngram_counts<'t, 'a>(tokens: &'t [&'a str], n: usize) -> HashMap<&'t [&'a str], usize> {
    let mut counts = HashMap::new();
    if n == 0 || tokens.len() < n {
        return counts;
    }

    for window in tokens.windows(n) {
        *counts.entry(window).or_insert(0) += 1;
    }
    counts
}

/// @ai:intent Hypothesis n-grams clipped by reference counts, and the hypothesis n-gram total
/// @ai:effects pure
fn modified_precision(reference: &[&str], hypothesis: &[&str], n: usize) -> (usize, usize) {
    let hypothesis_counts = ngram_counts(hypothesis, n);
    let reference_counts = ngram_counts(reference, n);

    let matched = hypothesis_counts
        .iter()
        .map(|(gram, count)| (*count).min(reference_counts.get(gram).copied().unwrap_or(0)))
        .sum();
    let total = hypothesis_counts.values().sum();

    (matched, total)
}

/// @ai:effects pure
pub(crate) fn brevity_penalty(ref_len: usize, hyp_len: usize) -> f64 {
    if hyp_len > ref_len {
        1.0
    } else if hyp_len == 0 {
        0.0
    } else {
        (1.0 - ref_len as f64 / hyp_len as f64).exp()
    }
}

/// @ai:intent Sentence BLEU of a candidate against one reference
/// @ai:post 0.0 <= result <= 1.0; identical inputs of at least four tokens score 1.0
/// @ai:effects pure
pub fn sentence_bleu(reference: &str, candidate: &str) -> f64 {
    corpus_bleu(
        [(reference, candidate)],
        Smoothing::Exponential { k: EXPONENTIAL_K },
    )
}

/// @ai:intent Corpus BLEU: counts pooled over all pairs before the mean is taken
/// @ai:effects pure
pub fn corpus_bleu<'a>(
    pairs: impl IntoIterator<Item = (&'a str, &'a str)>,
    smoothing: Smoothing,
) -> f64 {
    let mut stats = NgramStats::default();
    for (reference, candidate) in pairs {
        stats.add_precision(&tokenize(reference), &tokenize(candidate));
    }
    stats.score(smoothing)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-3,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_identical_sequences_score_one() {
        let code = "def f ( x ) : return x + 1";
        assert_close(sentence_bleu(code, code), 1.0);
    }

    #[test]
    fn test_partial_overlap_matches_reference_value() {
        // p1..p4 = 5/6, 3/5, 2/4, 1/3 and no brevity penalty
        let score = sentence_bleu("the cat sat on the mat", "the cat sat on a mat");
        assert_close(score, 0.5373);
    }

    #[test]
    fn test_short_identical_sequence_is_smoothed() {
        // the missing 4-gram order becomes ln(3) / 10
        assert_close(sentence_bleu("a b c", "a b c"), 0.5757);
    }

    #[test]
    fn test_empty_candidate_scores_zero() {
        assert_eq!(sentence_bleu("def f(x): return x", ""), 0.0);
        assert_eq!(sentence_bleu("", ""), 0.0);
    }

    #[test]
    fn test_disjoint_tokens_score_zero() {
        assert_eq!(sentence_bleu("a b c d", "w x y z"), 0.0);
    }

    #[test]
    fn test_bounds() {
        let samples = [
            ("def f(x):\n    return x + 1", "def f(x):\n    return x - 1"),
            ("return a", "return a a a a a a a a"),
            ("x", "x"),
            ("one two three four five", "five four three two one"),
            ("while True: pass", "def f(x):\n    while True: pass"),
        ];

        for (reference, candidate) in samples {
            let score = sentence_bleu(reference, candidate);
            assert!((0.0..=1.0).contains(&score), "{score} for {candidate:?}");
        }
    }

    #[test]
    fn test_brevity_penalty() {
        assert_eq!(brevity_penalty(5, 6), 1.0);
        assert_eq!(brevity_penalty(5, 0), 0.0);
        assert_close(brevity_penalty(6, 3), (-1.0f64).exp());
    }

    #[test]
    fn test_epsilon_smoothing_keeps_missing_orders_small() {
        let exact = corpus_bleu([("a b c d", "a b c d")], Smoothing::Epsilon(DEFAULT_EPSILON));
        let shuffled = corpus_bleu([("a b c d", "d c b a")], Smoothing::Epsilon(DEFAULT_EPSILON));
        assert_close(exact, 1.0);
        assert!(shuffled > 0.0 && shuffled < 0.2, "{shuffled}");
    }

    #[test]
    fn test_ngram_counts() {
        let tokens = ["a", "b", "a", "b"];
        let counts = ngram_counts(&tokens, 2);
        assert_eq!(counts.get(&["a", "b"][..]), Some(&2));
        assert_eq!(counts.get(&["b", "a"][..]), Some(&1));
        assert!(ngram_counts(&tokens, 5).is_empty());
    }
}
