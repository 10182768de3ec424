//! @ai:module:intent Accumulate per-example metrics into corpus statistics
//! @ai:module:layer application
//! @ai:module:public_api MetricsAggregator

use crate::metrics::types::{EvaluationResults, EvaluationSummary, ExampleMetrics, TestVerdict};

/// @ai:intent Trait for metrics aggregation
pub trait MetricsAggregatorTrait: Send + Sync {
    /// @ai:intent Fold one example's metrics into the running totals
    fn record(&mut self, metrics: ExampleMetrics);

    /// @ai:intent Rates and averages over everything recorded so far
    fn summary(&self) -> EvaluationSummary;
}

/// @ai:intent Counters and score sequences for one run; `total` is fixed at construction
pub struct MetricsAggregator {
    total: usize,
    exact_matches: usize,
    ast_matches: usize,
    unit_test_matches: usize,
    timeouts: usize,
    codebleu_scores: Vec<f64>,
    bleu_scores: Vec<f64>,
    levenshtein_distances: Vec<usize>,
    levenshtein_ratios: Vec<f64>,
    examples: Vec<ExampleMetrics>,
}

impl MetricsAggregator {
    /// @ai:intent Create an aggregator for a dataset of `total` examples
    /// @ai:effects pure
    pub fn new(total: usize) -> Self {
        Self {
            total,
            exact_matches: 0,
            ast_matches: 0,
            unit_test_matches: 0,
            timeouts: 0,
            codebleu_scores: Vec::with_capacity(total),
            bleu_scores: Vec::with_capacity(total),
            levenshtein_distances: Vec::with_capacity(total),
            levenshtein_ratios: Vec::with_capacity(total),
            examples: Vec::with_capacity(total),
        }
    }

    pub fn recorded(&self) -> usize {
        self.examples.len()
    }

    pub fn codebleu_scores(&self) -> &[f64] {
        &self.codebleu_scores
    }

    /// @ai:intent Close the run and hand back the full results
    /// @ai:effects pure
    pub fn finish(self, dataset: &str) -> EvaluationResults {
        if self.examples.len() != self.total {
            tracing::warn!(
                "Recorded {} of {} examples",
                self.examples.len(),
                self.total
            );
        }

        EvaluationResults {
            timestamp: chrono::Utc::now().to_rfc3339(),
            dataset: dataset.to_string(),
            summary: self.summary(),
            examples: self.examples,
        }
    }
}

impl MetricsAggregatorTrait for MetricsAggregator {
    fn record(&mut self, metrics: ExampleMetrics) {
        if metrics.exact_match {
            self.exact_matches += 1;
        }
        if metrics.ast_match {
            self.ast_matches += 1;
        }
        match metrics.unit_test {
            TestVerdict::Pass => self.unit_test_matches += 1,
            TestVerdict::Timeout => self.timeouts += 1,
            TestVerdict::Fail => {}
        }

        if let Some(score) = &metrics.codebleu {
            self.codebleu_scores.push(score.codebleu);
        }
        if let Some(bleu) = metrics.bleu {
            self.bleu_scores.push(bleu);
        }
        if let Some(distance) = metrics.levenshtein_distance {
            self.levenshtein_distances.push(distance);
        }
        if let Some(ratio) = metrics.levenshtein_ratio {
            self.levenshtein_ratios.push(ratio);
        }

        self.examples.push(metrics);
    }

    /// @ai:effects pure
    fn summary(&self) -> EvaluationSummary {
        EvaluationSummary {
            total: self.total,
            exact_matches: self.exact_matches,
            ast_matches: self.ast_matches,
            unit_test_matches: self.unit_test_matches,
            timeouts: self.timeouts,
            avg_codebleu: average(self.codebleu_scores.iter().copied()),
            avg_bleu: average(self.bleu_scores.iter().copied()),
            avg_levenshtein_distance: average(self.levenshtein_distances.iter().map(|d| *d as f64)),
            avg_levenshtein_ratio: average(self.levenshtein_ratios.iter().copied()),
        }
    }
}

/// @ai:intent Calculate average of an iterator of f64
/// @ai:post None for an empty iterator
/// @ai:effects pure
fn average<I: Iterator<Item = f64>>(iter: I) -> Option<f64> {
    let (sum, count) = iter.fold((0.0, 0u32), |(s, c), v| (s + v, c + 1));

    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::AstComparison;
    use crate::metrics::similarity::CodeBleuScore;

    fn metrics(name: &str, exact: bool, ast: bool, unit_test: TestVerdict, codebleu: Option<f64>) -> ExampleMetrics {
        ExampleMetrics {
            name: name.to_string(),
            raw_prediction: String::new(),
            predicted_code: String::new(),
            extraction: None,
            exact_match: exact,
            ast_match: ast,
            ast_comparison: if ast {
                AstComparison::Equal
            } else {
                AstComparison::Different
            },
            unit_test,
            failure_stage: None,
            failure_message: None,
            codebleu: codebleu.map(|value| CodeBleuScore {
                codebleu: value,
                ngram_match: value,
                weighted_ngram_match: value,
                syntax_match: value,
                dataflow_match: value,
            }),
            bleu: Some(0.5),
            levenshtein_distance: Some(4),
            levenshtein_ratio: Some(0.8),
        }
    }

    #[test]
    fn test_average() {
        let values = vec![10.0, 20.0, 30.0];
        assert!((average(values.into_iter()).unwrap() - 20.0).abs() < 0.01);
    }

    #[test]
    fn test_average_empty() {
        assert_eq!(average(Vec::<f64>::new().into_iter()), None);
    }

    #[test]
    fn test_accounting() {
        let mut aggregator = MetricsAggregator::new(4);
        aggregator.record(metrics("a", true, true, TestVerdict::Pass, Some(1.0)));
        aggregator.record(metrics("b", false, true, TestVerdict::Pass, Some(0.8)));
        aggregator.record(metrics("c", false, false, TestVerdict::Fail, Some(0.4)));
        aggregator.record(metrics("d", false, false, TestVerdict::Timeout, Some(0.2)));

        let summary = aggregator.summary();
        assert_eq!(summary.total, 4);
        assert_eq!(summary.exact_matches, 1);
        assert_eq!(summary.ast_matches, 2);
        assert_eq!(summary.unit_test_matches, 2);
        assert_eq!(summary.timeouts, 1);
        assert!((summary.avg_codebleu.unwrap() - 0.6).abs() < 1e-9);
        assert_eq!(summary.avg_levenshtein_distance, Some(4.0));

        assert_eq!(aggregator.codebleu_scores().len(), 4);
        assert_eq!(aggregator.recorded(), 4);
    }

    #[test]
    fn test_missing_metric_is_not_averaged() {
        let mut aggregator = MetricsAggregator::new(2);
        aggregator.record(metrics("a", false, false, TestVerdict::Fail, Some(0.5)));
        aggregator.record(metrics("b", false, false, TestVerdict::Fail, None));

        assert_eq!(aggregator.codebleu_scores().len(), 1);
        assert_eq!(aggregator.summary().avg_codebleu, Some(0.5));
    }

    #[test]
    fn test_empty_run() {
        let results = MetricsAggregator::new(0).finish("empty.jsonl");
        assert_eq!(results.summary.total, 0);
        assert_eq!(results.summary.avg_bleu, None);
        assert_eq!(results.summary.exact_match_rate(), 0.0);
        assert!(results.examples.is_empty());
    }

    #[test]
    fn test_finish_keeps_examples_in_order() {
        let mut aggregator = MetricsAggregator::new(2);
        aggregator.record(metrics("first", true, true, TestVerdict::Pass, Some(1.0)));
        aggregator.record(metrics("second", false, false, TestVerdict::Fail, Some(0.1)));

        let results = aggregator.finish("data.jsonl");
        let names: Vec<_> = results.examples.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["first", "second"]);
        assert_eq!(results.dataset, "data.jsonl");
    }
}
