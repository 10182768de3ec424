//! @ai:module:intent Define error types for the evaluation harness
//! @ai:module:layer domain
//! @ai:module:public_api EvalError, Result
//! @ai:module:stateless true

use std::path::PathBuf;
use thiserror::Error;

/// @ai:intent Unified error type for loading, configuration and reporting
#[derive(Error, Debug)]
pub enum EvalError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read dataset {path}: {source}")]
    DatasetRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed dataset row at {path}:{line}: {source}")]
    DatasetParse {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("No dataset path given (pass it on the command line or set [dataset].path)")]
    MissingDataset,

    #[error("Example not found: {0}")]
    ExampleNotFound(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EvalError>;
