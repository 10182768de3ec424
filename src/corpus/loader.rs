//! @ai:module:intent Newline-delimited JSON loader for evaluation examples
//! @ai:module:layer infrastructure
//! @ai:module:public_api DatasetLoader
//! @ai:module:stateless true

use crate::config::FilterConfig;
use crate::corpus::example::Example;
use crate::error::{EvalError, Result};
use std::path::Path;

/// @ai:intent Trait for loading the example dataset
pub trait DatasetLoaderTrait: Send + Sync {
    /// @ai:intent Load every example in file order
    fn load_all(&self, path: &Path) -> Result<Vec<Example>>;

    /// @ai:intent Load examples matching filter criteria, preserving order
    fn load_filtered(&self, path: &Path, filter: &FilterConfig) -> Result<Vec<Example>>;

    /// @ai:intent Load a single example by name
    fn load_by_name(&self, path: &Path, name: &str) -> Result<Example>;
}

/// @ai:intent Loads example rows from a .jsonl file
/// @ai:effects pure (stateless)
pub struct DatasetLoader;

impl DatasetLoader {
    /// @ai:intent Create a new dataset loader
    /// @ai:effects pure
    pub fn new() -> Self {
        Self
    }

    /// @ai:intent Parse dataset text; any malformed non-blank line fails the whole load
    /// @ai:pre content is the full file body
    /// @ai:effects pure
    pub fn parse(path: &Path, content: &str) -> Result<Vec<Example>> {
        let mut examples = Vec::new();

        for (index, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }

            let example: Example =
                serde_json::from_str(line).map_err(|source| EvalError::DatasetParse {
                    path: path.to_path_buf(),
                    line: index + 1,
                    source,
                })?;
            examples.push(example);
        }

        Ok(examples)
    }
}

impl Default for DatasetLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DatasetLoaderTrait for DatasetLoader {
    /// @ai:effects fs:read
    fn load_all(&self, path: &Path) -> Result<Vec<Example>> {
        let content = std::fs::read_to_string(path).map_err(|source| EvalError::DatasetRead {
            path: path.to_path_buf(),
            source,
        })?;

        let examples = Self::parse(path, &content)?;
        tracing::debug!("Loaded {} examples from {}", examples.len(), path.display());
        Ok(examples)
    }

    /// @ai:effects fs:read
    fn load_filtered(&self, path: &Path, filter: &FilterConfig) -> Result<Vec<Example>> {
        let all = self.load_all(path)?;

        Ok(all
            .into_iter()
            .filter(|example| filter.matches(&example.name))
            .collect())
    }

    /// @ai:effects fs:read
    fn load_by_name(&self, path: &Path, name: &str) -> Result<Example> {
        self.load_all(path)?
            .into_iter()
            .find(|e| e.name == name)
            .ok_or_else(|| EvalError::ExampleNotFound(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn row(name: &str) -> String {
        serde_json::json!({
            "name": name,
            "buggy_program": "def f(x):\n    return x",
            "docstring": "Adds one.",
            "solution": "def f(x):\n    return x + 1",
            "tests": "assert f(1) == 2",
            "generated_output": "### Response:\n```python\ndef f(x):\n    return x + 1\n```",
        })
        .to_string()
    }

    fn write_dataset(dir: &Path, lines: &[String]) -> std::path::PathBuf {
        let path = dir.join("dataset.jsonl");
        let mut file = std::fs::File::create(&path).unwrap();
        for line in lines {
            writeln!(file, "{line}").unwrap();
        }
        path
    }

    #[test]
    fn test_load_preserves_file_order() {
        let temp = TempDir::new().unwrap();
        let path = write_dataset(temp.path(), &[row("gcd"), row("bitcount"), row("quicksort")]);

        let examples = DatasetLoader::new().load_all(&path).unwrap();
        let names: Vec<_> = examples.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["gcd", "bitcount", "quicksort"]);
    }

    #[test]
    fn test_malformed_line_fails_whole_load() {
        let temp = TempDir::new().unwrap();
        let path = write_dataset(temp.path(), &[row("gcd"), "{not json".to_string(), row("lis")]);

        let err = DatasetLoader::new().load_all(&path).unwrap_err();
        match err {
            EvalError::DatasetParse { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let temp = TempDir::new().unwrap();
        let path = write_dataset(temp.path(), &[row("gcd"), String::new(), row("lis")]);

        let examples = DatasetLoader::new().load_all(&path).unwrap();
        assert_eq!(examples.len(), 2);
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let temp = TempDir::new().unwrap();
        let err = DatasetLoader::new()
            .load_all(&temp.path().join("absent.jsonl"))
            .unwrap_err();
        assert!(matches!(err, EvalError::DatasetRead { .. }));
    }

    #[test]
    fn test_load_filtered_by_name() {
        let temp = TempDir::new().unwrap();
        let path = write_dataset(temp.path(), &[row("gcd"), row("bitcount"), row("lis")]);

        let filter = FilterConfig {
            names: Some(vec!["lis".to_string(), "gcd".to_string()]),
        };
        let examples = DatasetLoader::new().load_filtered(&path, &filter).unwrap();
        let names: Vec<_> = examples.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["gcd", "lis"]);
    }

    #[test]
    fn test_load_by_name_not_found() {
        let temp = TempDir::new().unwrap();
        let path = write_dataset(temp.path(), &[row("gcd")]);

        let loader = DatasetLoader::new();
        assert_eq!(loader.load_by_name(&path, "gcd").unwrap().name, "gcd");
        assert!(matches!(
            loader.load_by_name(&path, "lis"),
            Err(EvalError::ExampleNotFound(_))
        ));
    }
}
