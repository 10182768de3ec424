//! @ai:module:intent Evaluation run orchestration
//! @ai:module:layer application
//! @ai:module:public_api EvaluationExecutor

pub mod executor;

pub use executor::EvaluationExecutor;
