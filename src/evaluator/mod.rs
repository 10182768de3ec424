//! @ai:module:intent Per-example scoring pipeline for candidate fixes
//! @ai:module:layer application
//! @ai:module:public_api Evaluator, CodeExtractor, AstComparator, TestRunner, TestOutcome

pub mod ast_compare;
pub mod code_extractor;
pub mod docstring;
pub mod normalizer;
pub mod test_runner;

pub use ast_compare::{canonical_dump, AstComparator, AstComparison};
pub use code_extractor::{CodeExtractor, CodeExtractorTrait, Extraction, ExtractionStrategy};
pub use docstring::strip_docstring;
pub use normalizer::normalize;
pub use test_runner::{FailureStage, MockTestRunner, TestOutcome, TestRunner, TestRunnerTrait};

use crate::config::EvalConfig;
use crate::corpus::Example;
use crate::metrics::{ExampleMetrics, SimilarityScorer, SimilarityScorerTrait};

/// @ai:intent Runs every check for one example; generic over the sandbox so tests can swap it
pub struct Evaluator<R: TestRunnerTrait = TestRunner> {
    extractor: CodeExtractor,
    comparator: AstComparator,
    runner: R,
    similarity: SimilarityScorer,
}

impl Evaluator<TestRunner> {
    /// @ai:intent Create an evaluator backed by the interpreter sandbox
    /// @ai:effects pure
    pub fn new(config: &EvalConfig) -> Self {
        Self::with_runner(config, TestRunner::from_config(&config.sandbox))
    }
}

impl<R: TestRunnerTrait> Evaluator<R> {
    /// @ai:intent Create an evaluator with a caller-supplied test runner
    /// @ai:effects pure
    pub fn with_runner(config: &EvalConfig, runner: R) -> Self {
        Self {
            extractor: CodeExtractor::new(config.extraction.clone()),
            comparator: AstComparator::new(),
            runner,
            similarity: SimilarityScorer::new(&config.codebleu),
        }
    }

    /// @ai:intent Extraction output after docstring removal and normalization
    /// @ai:effects pure
    pub fn predict(&self, generated_output: &str) -> (Extraction, String) {
        let extraction = self.extractor.extract(&normalize(generated_output));
        let predicted = normalize(&strip_docstring(&extraction.code));
        (extraction, predicted)
    }

    /// @ai:intent Score one example on every axis
    /// @ai:post never fails; harness errors in the sandbox count as an interpreter failure
    /// @ai:effects fs:write, process
    pub async fn evaluate(&self, example: &Example) -> ExampleMetrics {
        let (extraction, predicted) = self.predict(&example.generated_output);
        let reference = normalize(&example.solution);

        if extraction.code.is_empty() {
            tracing::warn!(
                "No code extracted for {}. Output preview: {}",
                example.name,
                truncate_for_log(&example.generated_output, 200)
            );
        } else {
            tracing::debug!(
                "Extracted {} chars for {} via {:?}",
                extraction.code.len(),
                example.name,
                extraction.strategy
            );
        }

        let exact_match = predicted == reference;
        let ast_comparison = self.comparator.compare(&predicted, &reference);

        let outcome = match self.runner.run(&predicted, &example.tests).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("Sandbox failed for {}: {:#}", example.name, e);
                TestOutcome::Failed {
                    stage: FailureStage::Interpreter,
                    message: e.to_string(),
                }
            }
        };
        if let TestOutcome::Failed { stage, message } = &outcome {
            tracing::debug!("{} failed in {} stage: {}", example.name, stage.as_str(), message);
        }

        let similarity = self.similarity.score(&predicted, &reference);

        ExampleMetrics::from_checks(
            &example.name,
            extraction,
            predicted,
            exact_match,
            ast_comparison,
            &outcome,
            similarity,
        )
    }
}

/// @ai:intent Truncate string for logging
/// @ai:effects pure
fn truncate_for_log(s: &str, max_chars: usize) -> String {
    let flat = s.replace('\n', "\\n");
    if flat.chars().count() <= max_chars {
        flat
    } else {
        format!("{}...", flat.chars().take(max_chars).collect::<String>())
    }
}
