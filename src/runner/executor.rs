//! @ai:module:intent Drive the evaluation loop over a dataset
//! @ai:module:layer application
//! @ai:module:public_api EvaluationExecutor
//! @ai:module:stateless false

use crate::corpus::Example;
use crate::evaluator::{Evaluator, TestRunnerTrait};
use crate::metrics::{EvaluationResults, MetricsAggregator, MetricsAggregatorTrait};
use crate::report::console;

/// @ai:intent Evaluates examples one after another and accumulates the results
pub struct EvaluationExecutor<R: TestRunnerTrait> {
    evaluator: Evaluator<R>,
    print_examples: bool,
}

impl<R: TestRunnerTrait> EvaluationExecutor<R> {
    /// @ai:intent Create a new evaluation executor
    /// @ai:effects pure
    pub fn new(evaluator: Evaluator<R>) -> Self {
        Self {
            evaluator,
            print_examples: true,
        }
    }

    /// @ai:intent Turn the per-example console block on or off
    pub fn with_example_output(mut self, enabled: bool) -> Self {
        self.print_examples = enabled;
        self
    }

    /// @ai:intent Evaluate every example in order and return the finished results
    /// @ai:post results.examples has one entry per input example, in input order
    /// @ai:effects fs:write, process
    pub async fn run(&self, examples: &[Example], dataset: &str) -> EvaluationResults {
        let mut aggregator = MetricsAggregator::new(examples.len());

        for (index, example) in examples.iter().enumerate() {
            tracing::info!(
                "Evaluating {}/{}: {}",
                index + 1,
                examples.len(),
                example.name
            );

            let metrics = self.evaluator.evaluate(example).await;

            if self.print_examples {
                console::print_example(example, &metrics);
            }
            tracing::debug!(
                "{}: exact={} ast={} unit_test={}",
                example.name,
                metrics.exact_match,
                metrics.ast_match,
                metrics.unit_test.as_str()
            );

            aggregator.record(metrics);
        }

        aggregator.finish(dataset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EvalConfig;
    use crate::evaluator::{FailureStage, MockTestRunner, TestOutcome};

    fn example(name: &str, generated_output: &str) -> Example {
        Example {
            name: name.to_string(),
            buggy_program: "def f(x):\n    return x - 1".to_string(),
            docstring: "Add one.".to_string(),
            solution: "def f(x):\n    return x + 1".to_string(),
            tests: "assert f(2) == 3".to_string(),
            generated_output: generated_output.to_string(),
        }
    }

    fn executor(outcome: TestOutcome) -> EvaluationExecutor<MockTestRunner> {
        let evaluator = Evaluator::with_runner(&EvalConfig::default(), MockTestRunner::new(outcome));
        EvaluationExecutor::new(evaluator).with_example_output(false)
    }

    #[tokio::test]
    async fn test_every_example_contributes() {
        let examples = vec![
            example("exact", "### Response:\n```python\ndef f(x):\n    return x + 1\n```"),
            example("cosmetic", "### Response:\n```python\ndef f(x):\n\n    return x+1\n```"),
            example("garbage", "no idea"),
        ];

        let results = executor(TestOutcome::Passed).run(&examples, "quix.jsonl").await;

        assert_eq!(results.summary.total, 3);
        assert_eq!(results.examples.len(), 3);
        assert_eq!(results.summary.exact_matches, 1);
        assert_eq!(results.summary.ast_matches, 2);
        assert_eq!(
            results.examples.iter().filter(|m| m.codebleu.is_some()).count(),
            3
        );
        assert!(results.summary.avg_codebleu.is_some());
    }

    #[tokio::test]
    async fn test_failures_are_not_counted_as_passes() {
        let examples = vec![example("f", "### Response:\n```python\ndef f(x):\n    return x - 1\n```")];
        let results = executor(TestOutcome::Failed {
            stage: FailureStage::Tests,
            message: "AssertionError: ".to_string(),
        })
        .run(&examples, "quix.jsonl")
        .await;

        assert_eq!(results.summary.unit_test_matches, 0);
        assert_eq!(results.summary.timeouts, 0);
        assert_eq!(results.summary.unit_test_rate(), 0.0);
    }

    #[tokio::test]
    async fn test_empty_dataset() {
        let results = executor(TestOutcome::Passed).run(&[], "empty.jsonl").await;
        assert_eq!(results.summary.total, 0);
        assert_eq!(results.summary.avg_codebleu, None);
    }
}
