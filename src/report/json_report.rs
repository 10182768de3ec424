//! @ai:module:intent JSON report generation
//! @ai:module:layer infrastructure
//! @ai:module:public_api JsonReporter
//! @ai:module:stateless true

use crate::metrics::EvaluationResults;
use anyhow::{Context, Result};
use std::path::Path;

/// @ai:intent Trait for JSON report generation
pub trait JsonReporterTrait: Send + Sync {
    /// @ai:intent Generate JSON report from results
    fn generate(&self, results: &EvaluationResults, output_path: &Path) -> Result<()>;
}

/// @ai:intent Writes summary and per-example metrics as pretty JSON
pub struct JsonReporter;

impl JsonReporter {
    /// @ai:intent Create a new JSON reporter
    /// @ai:effects pure
    pub fn new() -> Self {
        Self
    }
}

impl Default for JsonReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonReporterTrait for JsonReporter {
    /// @ai:effects fs:write
    fn generate(&self, results: &EvaluationResults, output_path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(results)?;
        std::fs::write(output_path, json)
            .with_context(|| format!("Failed to write {}", output_path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::EvaluationSummary;
    use tempfile::TempDir;

    #[test]
    fn test_generate_json_report() {
        let reporter = JsonReporter::new();
        let temp = TempDir::new().unwrap();
        let output = temp.path().join("results.json");

        let results = EvaluationResults {
            timestamp: "2026-01-19T00:00:00Z".to_string(),
            dataset: "quixbugs.jsonl".to_string(),
            summary: EvaluationSummary {
                total: 2,
                exact_matches: 1,
                ..Default::default()
            },
            examples: vec![],
        };

        reporter.generate(&results, &output).unwrap();

        let content = std::fs::read_to_string(&output).unwrap();
        let parsed: EvaluationResults = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed.dataset, "quixbugs.jsonl");
        assert_eq!(parsed.summary, results.summary);
    }
}
