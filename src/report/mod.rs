//! @ai:module:intent Report generation for evaluation results
//! @ai:module:layer infrastructure
//! @ai:module:public_api ReportGenerator, JsonReporter, ChartGenerator, console

pub mod charts;
pub mod console;
pub mod json_report;

pub use charts::{ChartGenerator, ChartGeneratorTrait};
pub use json_report::{JsonReporter, JsonReporterTrait};

use crate::metrics::EvaluationResults;
use anyhow::Result;
use std::path::Path;

/// @ai:intent Combined report generator
pub struct ReportGenerator {
    json: JsonReporter,
    charts: ChartGenerator,
}

impl ReportGenerator {
    /// @ai:intent Create a new report generator
    /// @ai:effects pure
    pub fn new() -> Self {
        Self {
            json: JsonReporter::new(),
            charts: ChartGenerator::new(),
        }
    }

    /// @ai:intent Write results.json and, when enabled, the charts
    /// @ai:effects fs:write
    pub fn generate_all(
        &self,
        results: &EvaluationResults,
        output_dir: &Path,
        with_charts: bool,
    ) -> Result<()> {
        std::fs::create_dir_all(output_dir)?;

        self.json.generate(results, &output_dir.join("results.json"))?;
        if with_charts {
            let files = self.charts.generate_all(results, output_dir)?;
            tracing::debug!("Charts written: {:?}", files);
        }

        tracing::info!("Reports generated in {}", output_dir.display());
        Ok(())
    }
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::EvaluationSummary;
    use tempfile::TempDir;

    #[test]
    fn test_json_only() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("run");
        let results = EvaluationResults {
            timestamp: "2026-01-19T00:00:00Z".to_string(),
            dataset: "quixbugs.jsonl".to_string(),
            summary: EvaluationSummary::default(),
            examples: vec![],
        };

        ReportGenerator::new().generate_all(&results, &dir, false).unwrap();

        assert!(dir.join("results.json").exists());
        assert!(!dir.join("scores.png").exists());
    }
}
