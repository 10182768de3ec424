//! @ai:module:intent Chart generation for evaluation results
//! @ai:module:layer infrastructure
//! @ai:module:public_api ChartGenerator
//! @ai:module:stateless true

use crate::metrics::{CodeBleuScore, EvaluationResults};
use anyhow::Result;
use plotters::prelude::*;
use std::path::Path;

/// @ai:intent Trait for chart generation
pub trait ChartGeneratorTrait: Send + Sync {
    /// @ai:intent Generate all charts from results, returning the written file names
    fn generate_all(&self, results: &EvaluationResults, output_dir: &Path) -> Result<Vec<String>>;
}

/// @ai:intent Generates bar charts from evaluation results
pub struct ChartGenerator;

impl ChartGenerator {
    /// @ai:intent Create a new chart generator
    /// @ai:effects pure
    pub fn new() -> Self {
        Self
    }

    /// @ai:intent Draw one labelled bar per value on a 0-100 scale
    /// @ai:effects fs:write
    fn draw_bars(
        &self,
        caption: &str,
        y_desc: &str,
        bars: &[(&str, f64)],
        color: RGBColor,
        output_path: &Path,
    ) -> Result<()> {
        let root = BitMapBackend::new(output_path, (900, 600)).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(caption, ("sans-serif", 28))
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(0..bars.len() as i32, 0f64..100f64)?;

        chart
            .configure_mesh()
            .x_labels(bars.len())
            .y_desc(y_desc)
            .x_label_formatter(&|x| {
                bars.get(*x as usize)
                    .map(|(name, _)| name.to_string())
                    .unwrap_or_default()
            })
            .draw()?;

        chart.draw_series(bars.iter().enumerate().map(|(i, (_, value))| {
            let mut bar = Rectangle::new(
                [(i as i32, 0.0), (i as i32 + 1, value.clamp(0.0, 100.0))],
                color.mix(0.7).filled(),
            );
            bar.set_margin(0, 0, 10, 10);
            bar
        }))?;

        root.present()?;
        Ok(())
    }

    /// @ai:intent Pass rates and averaged similarity, similarity scaled to percent
    /// @ai:effects fs:write
    fn generate_scores_chart(&self, results: &EvaluationResults, output_path: &Path) -> Result<()> {
        self.draw_bars(
            &format!("Scores over {} examples", results.summary.total),
            "Score (%)",
            &score_bars(results),
            BLUE,
            output_path,
        )
    }

    /// @ai:intent Averages of the four CodeBLEU components
    /// @ai:effects fs:write
    fn generate_codebleu_chart(
        &self,
        scores: &[CodeBleuScore],
        output_path: &Path,
    ) -> Result<()> {
        let count = scores.len() as f64;
        let mean = |pick: fn(&CodeBleuScore) -> f64| scores.iter().map(pick).sum::<f64>() / count * 100.0;

        let bars = [
            ("N-gram", mean(|s| s.ngram_match)),
            ("Weighted", mean(|s| s.weighted_ngram_match)),
            ("Syntax", mean(|s| s.syntax_match)),
            ("Dataflow", mean(|s| s.dataflow_match)),
        ];

        self.draw_bars("CodeBLEU components", "Average (%)", &bars, GREEN, output_path)
    }
}

impl Default for ChartGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl ChartGeneratorTrait for ChartGenerator {
    /// @ai:effects fs:write
    fn generate_all(&self, results: &EvaluationResults, output_dir: &Path) -> Result<Vec<String>> {
        std::fs::create_dir_all(output_dir)?;

        let mut generated = Vec::new();

        self.generate_scores_chart(results, &output_dir.join("scores.png"))?;
        generated.push("scores.png".to_string());

        let codebleu: Vec<CodeBleuScore> = results.examples.iter().filter_map(|m| m.codebleu).collect();
        if codebleu.is_empty() {
            tracing::debug!("No CodeBLEU scores, skipping component chart");
        } else {
            self.generate_codebleu_chart(&codebleu, &output_dir.join("codebleu_components.png"))?;
            generated.push("codebleu_components.png".to_string());
        }

        Ok(generated)
    }
}

/// @ai:intent Bars for the scores chart; averages that were never recorded are left out
/// @ai:effects pure
fn score_bars(results: &EvaluationResults) -> Vec<(&'static str, f64)> {
    let summary = &results.summary;
    let mut bars = vec![
        ("Exact", summary.exact_match_rate()),
        ("AST", summary.ast_match_rate()),
        ("Unit test", summary.unit_test_rate()),
    ];

    let averages = [
        ("CodeBLEU", summary.avg_codebleu),
        ("BLEU", summary.avg_bleu),
        ("Lev. ratio", summary.avg_levenshtein_ratio),
    ];
    bars.extend(
        averages
            .into_iter()
            .filter_map(|(name, value)| value.map(|v| (name, v * 100.0))),
    );

    bars
}
