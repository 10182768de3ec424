//! @ai:module:intent Configuration structs for the evaluation harness
//! @ai:module:layer infrastructure
//! @ai:module:public_api EvalConfig, DatasetConfig, SandboxConfig, ExtractionConfig, CodeBleuConfig, ReportConfig, FilterConfig
//! @ai:module:stateless true

use crate::error::EvalError;
use crate::evaluator::ExtractionStrategy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Config file read from the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "quix-eval.toml";

/// @ai:intent Main configuration for the evaluation harness
/// @ai:effects pure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvalConfig {
    #[serde(default)]
    pub dataset: DatasetConfig,
    #[serde(default)]
    pub sandbox: SandboxConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub codebleu: CodeBleuConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub filter: FilterConfig,
}

/// @ai:intent Location of the newline-delimited JSON dataset
/// @ai:effects pure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatasetConfig {
    pub path: Option<PathBuf>,
}

/// @ai:intent Interpreter and time budget for sandboxed test execution
/// @ai:effects pure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandboxConfig {
    #[serde(default = "default_python")]
    pub python: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

/// @ai:intent Markers and strategy order used to pull code out of raw generations
/// @ai:effects pure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    #[serde(default = "default_response_marker")]
    pub response_marker: String,
    #[serde(default = "default_quoted_marker")]
    pub quoted_marker: String,
    #[serde(default = "default_instruction_marker")]
    pub instruction_marker: String,
    #[serde(default = "default_strategies")]
    pub strategies: Vec<ExtractionStrategy>,
}

/// @ai:intent Component weights for CodeBLEU (ngram, weighted ngram, syntax, dataflow)
/// @ai:effects pure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeBleuConfig {
    #[serde(default = "default_codebleu_weights")]
    pub weights: [f64; 4],
}

/// @ai:intent Where persisted reports go, if anywhere
/// @ai:effects pure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    pub output_dir: Option<PathBuf>,
    #[serde(default = "default_charts")]
    pub charts: bool,
}

/// @ai:intent Filter configuration for selecting examples by name
/// @ai:effects pure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterConfig {
    pub names: Option<Vec<String>>,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            python: default_python(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            response_marker: default_response_marker(),
            quoted_marker: default_quoted_marker(),
            instruction_marker: default_instruction_marker(),
            strategies: default_strategies(),
        }
    }
}

impl Default for CodeBleuConfig {
    fn default() -> Self {
        Self {
            weights: default_codebleu_weights(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            charts: default_charts(),
        }
    }
}

fn default_python() -> String {
    "python3".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_response_marker() -> String {
    "### Response:".to_string()
}

fn default_quoted_marker() -> String {
    "Fixed program:".to_string()
}

fn default_instruction_marker() -> String {
    "Provide a fixed version of the program.".to_string()
}

fn default_strategies() -> Vec<ExtractionStrategy> {
    vec![
        ExtractionStrategy::FencedBlock,
        ExtractionStrategy::ResponseText,
        ExtractionStrategy::QuotedBlock,
        ExtractionStrategy::InstructionTail,
    ]
}

fn default_codebleu_weights() -> [f64; 4] {
    [0.25, 0.25, 0.25, 0.25]
}

fn default_charts() -> bool {
    true
}

impl EvalConfig {
    /// @ai:intent Load configuration from a TOML file
    /// @ai:pre path exists and is readable
    /// @ai:effects fs:read
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// @ai:intent Save configuration to a TOML file
    /// @ai:effects fs:write
    pub fn save(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// @ai:intent Reject values the harness cannot run with
    /// @ai:effects pure
    pub fn validate(&self) -> Result<(), EvalError> {
        if self.sandbox.timeout_seconds == 0 {
            return Err(EvalError::Config(
                "sandbox.timeout_seconds must be greater than zero".to_string(),
            ));
        }

        if self.extraction.strategies.is_empty() {
            return Err(EvalError::Config(
                "extraction.strategies must name at least one strategy".to_string(),
            ));
        }

        if self.codebleu.weights.iter().any(|w| *w < 0.0) {
            return Err(EvalError::Config(
                "codebleu.weights must be non-negative".to_string(),
            ));
        }

        Ok(())
    }

    /// @ai:intent Resolve the dataset path or fail with a configuration error
    /// @ai:effects pure
    pub fn dataset_path(&self) -> Result<&std::path::Path, EvalError> {
        self.dataset
            .path
            .as_deref()
            .ok_or(EvalError::MissingDataset)
    }
}

impl SandboxConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl FilterConfig {
    /// @ai:intent Check if filter matches an example name
    /// @ai:effects pure
    pub fn matches(&self, name: &str) -> bool {
        self.names
            .as_ref()
            .map(|names| names.iter().any(|n| n == name))
            .unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_matches_all_when_empty() {
        let filter = FilterConfig::default();
        assert!(filter.matches("gcd"));
    }

    #[test]
    fn test_filter_matches_specific_names() {
        let filter = FilterConfig {
            names: Some(vec!["gcd".to_string(), "bitcount".to_string()]),
        };
        assert!(filter.matches("gcd"));
        assert!(filter.matches("bitcount"));
        assert!(!filter.matches("quicksort"));
    }

    #[test]
    fn test_defaults_from_empty_toml() {
        let config: EvalConfig = toml::from_str("").unwrap();
        assert_eq!(config.sandbox.timeout_seconds, 30);
        assert_eq!(config.sandbox.python, "python3");
        assert_eq!(config.extraction.response_marker, "### Response:");
        assert_eq!(config.extraction.strategies.len(), 4);
        assert!(config.dataset.path.is_none());
        assert!(config.report.charts);
    }

    #[test]
    fn test_partial_toml_overrides() {
        let config: EvalConfig = toml::from_str(
            r#"
[dataset]
path = "data/quixbugs.jsonl"

[sandbox]
timeout_seconds = 5

[extraction]
strategies = ["quoted_block"]
"#,
        )
        .unwrap();

        assert_eq!(
            config.dataset_path().unwrap(),
            std::path::Path::new("data/quixbugs.jsonl")
        );
        assert_eq!(config.sandbox.timeout(), Duration::from_secs(5));
        assert_eq!(config.sandbox.python, "python3");
        assert_eq!(
            config.extraction.strategies,
            vec![ExtractionStrategy::QuotedBlock]
        );
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = EvalConfig::default();
        config.sandbox.timeout_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_dataset_path() {
        let config = EvalConfig::default();
        assert!(matches!(
            config.dataset_path(),
            Err(EvalError::MissingDataset)
        ));
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join(DEFAULT_CONFIG_FILE);

        let mut config = EvalConfig::default();
        config.dataset.path = Some(PathBuf::from("quixbugs.jsonl"));
        config.save(&path).unwrap();

        let loaded = EvalConfig::load(&path).unwrap();
        assert_eq!(loaded.dataset.path, config.dataset.path);
        assert_eq!(loaded.sandbox.timeout_seconds, 30);
    }

    #[test]
    fn test_default_config_file_name() {
        assert_eq!(DEFAULT_CONFIG_FILE, "quix-eval.toml");
    }
}
