//! @ai:module:intent Metric types for evaluation results
//! @ai:module:layer domain
//! @ai:module:public_api ExampleMetrics, TestVerdict, EvaluationSummary, EvaluationResults
//! @ai:module:stateless true

use crate::evaluator::{AstComparison, Extraction, ExtractionStrategy, FailureStage, TestOutcome};
use crate::metrics::similarity::{CodeBleuScore, SimilarityScores};
use serde::{Deserialize, Serialize};

/// @ai:intent Counted unit-test outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestVerdict {
    Pass,
    Fail,
    Timeout,
}

impl TestVerdict {
    /// @ai:intent Console label
    /// @ai:effects pure
    pub fn as_str(&self) -> &'static str {
        match self {
            TestVerdict::Pass => "PASS",
            TestVerdict::Fail => "FAIL",
            TestVerdict::Timeout => "TIMEOUT",
        }
    }
}

/// @ai:intent Scores for a single example
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExampleMetrics {
    pub name: String,
    /// Code as extracted from the generation, before cleaning
    pub raw_prediction: String,
    /// Candidate after extraction, docstring stripping and normalization
    pub predicted_code: String,
    pub extraction: Option<ExtractionStrategy>,
    pub exact_match: bool,
    pub ast_match: bool,
    pub ast_comparison: AstComparison,
    pub unit_test: TestVerdict,
    pub failure_stage: Option<FailureStage>,
    pub failure_message: Option<String>,
    pub codebleu: Option<CodeBleuScore>,
    pub bleu: Option<f64>,
    pub levenshtein_distance: Option<usize>,
    pub levenshtein_ratio: Option<f64>,
}

impl ExampleMetrics {
    /// @ai:intent Assemble metrics from the individual checks
    /// @ai:effects pure
    pub fn from_checks(
        name: &str,
        extraction: Extraction,
        predicted_code: String,
        exact_match: bool,
        ast_comparison: AstComparison,
        outcome: &TestOutcome,
        similarity: SimilarityScores,
    ) -> Self {
        let (unit_test, failure_stage, failure_message) = match outcome {
            TestOutcome::Passed => (TestVerdict::Pass, None, None),
            TestOutcome::Failed { stage, message } => {
                (TestVerdict::Fail, Some(*stage), Some(message.clone()))
            }
            TestOutcome::TimedOut { after } => (
                TestVerdict::Timeout,
                None,
                Some(format!("timed out after {}s", after.as_secs_f64())),
            ),
        };

        Self {
            name: name.to_string(),
            raw_prediction: extraction.code,
            predicted_code,
            extraction: extraction.strategy,
            exact_match,
            ast_match: ast_comparison.is_equal(),
            ast_comparison,
            unit_test,
            failure_stage,
            failure_message,
            codebleu: similarity.codebleu,
            bleu: similarity.bleu,
            levenshtein_distance: similarity.levenshtein_distance,
            levenshtein_ratio: similarity.levenshtein_ratio,
        }
    }

    pub fn passed(&self) -> bool {
        self.unit_test == TestVerdict::Pass
    }
}

/// @ai:intent Corpus-level rates and averages
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationSummary {
    pub total: usize,
    pub exact_matches: usize,
    pub ast_matches: usize,
    pub unit_test_matches: usize,
    pub timeouts: usize,
    /// Averages are None when no example produced the metric
    pub avg_codebleu: Option<f64>,
    pub avg_bleu: Option<f64>,
    pub avg_levenshtein_distance: Option<f64>,
    pub avg_levenshtein_ratio: Option<f64>,
}

impl EvaluationSummary {
    /// @ai:intent Percentage of total, 0 for an empty dataset
    /// @ai:effects pure
    pub fn percentage(&self, count: usize) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            count as f64 / self.total as f64 * 100.0
        }
    }

    pub fn exact_match_rate(&self) -> f64 {
        self.percentage(self.exact_matches)
    }

    pub fn ast_match_rate(&self) -> f64 {
        self.percentage(self.ast_matches)
    }

    pub fn unit_test_rate(&self) -> f64 {
        self.percentage(self.unit_test_matches)
    }
}

/// @ai:intent Complete results of one evaluation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationResults {
    pub timestamp: String,
    pub dataset: String,
    pub summary: EvaluationSummary,
    pub examples: Vec<ExampleMetrics>,
}
