//! @ai:module:intent Evaluation harness for LLM-generated Python bug fixes
//! @ai:module:layer application
//! @ai:module:public_api config, corpus, evaluator, metrics, prompt, report, runner, toolchain

pub mod config;
pub mod corpus;
pub mod error;
pub mod evaluator;
pub mod metrics;
pub mod prompt;
pub mod report;
pub mod runner;
pub mod toolchain;

pub use config::EvalConfig;
pub use corpus::{DatasetLoader, DatasetLoaderTrait, Example};
pub use error::EvalError;
pub use evaluator::{Evaluator, TestRunner, TestRunnerTrait};
pub use metrics::{EvaluationResults, EvaluationSummary, ExampleMetrics, MetricsAggregator};
pub use report::ReportGenerator;
pub use runner::EvaluationExecutor;
pub use toolchain::{ToolchainStatus, ToolchainValidator};
