//! @ai:module:intent Human-readable per-example diagnostics and run summary on stdout
//! @ai:module:layer infrastructure
//! @ai:module:public_api print_example, print_summary, format_example, format_summary
//! @ai:module:stateless true

use crate::corpus::Example;
use crate::metrics::{EvaluationSummary, ExampleMetrics};

fn separator() -> String {
    "=".repeat(60)
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

fn optional_score(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.4}"))
}

/// @ai:intent Diagnostic block for one example: inputs, predictions, then one line per check
/// @ai:effects pure
pub fn format_example(example: &Example, metrics: &ExampleMetrics) -> String {
    let rule = "-".repeat(60);
    let mut out = format!("{}\nExample: {}\n", separator(), example.name);

    out.push_str(&format!("{rule}\nBuggy program:\n{}\n", example.buggy_program));
    out.push_str(&format!("{rule}\nRaw prediction:\n{}\n", metrics.raw_prediction));
    out.push_str(&format!("{rule}\nCleaned prediction:\n{}\n", metrics.predicted_code));
    out.push_str(&format!("{rule}\nReference solution:\n{}\n", example.solution));
    out.push_str(&format!("{rule}\n"));

    out.push_str(&format!("Exact match:        {}\n", yes_no(metrics.exact_match)));
    out.push_str(&format!(
        "AST match:          {} ({})\n",
        yes_no(metrics.ast_match),
        metrics.ast_comparison.as_str()
    ));

    let detail = match (&metrics.failure_stage, &metrics.failure_message) {
        (Some(stage), Some(message)) => format!(" [{}] {}", stage.as_str(), message),
        (_, Some(message)) => format!(" {message}"),
        _ => String::new(),
    };
    out.push_str(&format!("Unit test:          {}{}\n", metrics.unit_test.as_str(), detail));

    out.push_str(&format!(
        "CodeBLEU:           {}\n",
        optional_score(metrics.codebleu.map(|s| s.codebleu))
    ));
    out.push_str(&format!("BLEU:               {}\n", optional_score(metrics.bleu)));
    out.push_str(&format!(
        "Levenshtein:        distance {} ratio {}\n",
        metrics
            .levenshtein_distance
            .map_or_else(|| "n/a".to_string(), |d| d.to_string()),
        optional_score(metrics.levenshtein_ratio)
    ));

    out
}

/// @ai:intent Rates as count/total (pct%), then whichever averages were recorded
/// @ai:effects pure
pub fn format_summary(summary: &EvaluationSummary) -> String {
    let rate = |count: usize| {
        format!(
            "{}/{} ({:.1}%)",
            count,
            summary.total,
            summary.percentage(count)
        )
    };

    let mut out = format!("{}\nSUMMARY\n{}\n", separator(), "-".repeat(60));
    out.push_str(&format!("Exact match rate:      {}\n", rate(summary.exact_matches)));
    out.push_str(&format!("AST match rate:        {}\n", rate(summary.ast_matches)));
    out.push_str(&format!("Unit test match rate:  {}\n", rate(summary.unit_test_matches)));
    out.push_str(&format!("Timeouts:              {}\n", summary.timeouts));

    if let Some(value) = summary.avg_codebleu {
        out.push_str(&format!("Average CodeBLEU:      {value:.4}\n"));
    }
    if let Some(value) = summary.avg_bleu {
        out.push_str(&format!("Average BLEU:          {value:.4}\n"));
    }
    if let Some(value) = summary.avg_levenshtein_distance {
        out.push_str(&format!("Average Levenshtein distance: {value:.2}\n"));
    }
    if let Some(value) = summary.avg_levenshtein_ratio {
        out.push_str(&format!("Average Levenshtein ratio:    {value:.4}\n"));
    }

    out
}

/// @ai:effects io
pub fn print_example(example: &Example, metrics: &ExampleMetrics) {
    print!("{}", format_example(example, metrics));
}

/// @ai:effects io
pub fn print_summary(summary: &EvaluationSummary) {
    print!("{}", format_summary(summary));
}
