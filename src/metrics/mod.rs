//! @ai:module:intent Metrics: similarity scoring, per-example records and aggregation
//! @ai:module:layer application
//! @ai:module:public_api ExampleMetrics, EvaluationSummary, EvaluationResults, MetricsAggregator, SimilarityScorer

pub mod aggregator;
pub mod similarity;
pub mod types;

pub use aggregator::{MetricsAggregator, MetricsAggregatorTrait};
pub use similarity::{
    CodeBleu, CodeBleuScore, SimilarityError, SimilarityScorer, SimilarityScorerTrait,
    SimilarityScores,
};
pub use types::{EvaluationResults, EvaluationSummary, ExampleMetrics, TestVerdict};
