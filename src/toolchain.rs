//! @ai:module:intent Validate the interpreter required for sandboxed test execution
//! @ai:module:layer infrastructure
//! @ai:module:public_api ToolchainValidator, ToolchainStatus
//! @ai:module:stateless true

use std::process::Command;

/// @ai:intent Status of toolchain validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolchainStatus {
    pub interpreter: String,
    /// Output of `--version`, None when the interpreter could not be run
    pub version: Option<String>,
}

impl ToolchainStatus {
    pub fn is_available(&self) -> bool {
        self.version.is_some()
    }
}

/// @ai:intent Validates that the configured interpreter is installed
pub struct ToolchainValidator;

impl ToolchainValidator {
    /// @ai:intent Get install hint for an interpreter
    /// @ai:effects pure
    fn get_install_hint(tool: &str) -> &'static str {
        if tool.starts_with("python") {
            "Install Python: https://www.python.org/downloads/ or set [sandbox] python"
        } else {
            "Check the [sandbox] python setting points to a Python 3 interpreter"
        }
    }

    /// @ai:intent Check if a command is available on the system
    /// @ai:effects io
    pub(crate) fn is_tool_available(tool: &str, args: &[&str]) -> bool {
        Command::new(tool)
            .args(args)
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    /// @ai:intent Run the interpreter and capture its version string
    /// @ai:effects io
    pub fn validate(python: &str) -> ToolchainStatus {
        let version = Command::new(python)
            .arg("--version")
            .output()
            .ok()
            .filter(|output| output.status.success())
            .map(|output| {
                // Python 2 printed the version on stderr
                let text = if output.stdout.is_empty() {
                    output.stderr
                } else {
                    output.stdout
                };
                String::from_utf8_lossy(&text).trim().to_string()
            });

        ToolchainStatus {
            interpreter: python.to_string(),
            version,
        }
    }

    /// @ai:intent Log the interpreter check result
    /// @ai:effects io
    pub fn log_warnings(status: &ToolchainStatus) {
        match &status.version {
            Some(version) => tracing::info!("Using interpreter '{}' ({})", status.interpreter, version),
            None => tracing::warn!(
                "Interpreter '{}' not found - every test run will fail. {}",
                status.interpreter,
                Self::get_install_hint(&status.interpreter)
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_install_hint() {
        assert!(ToolchainValidator::get_install_hint("python3").contains("python.org"));
        assert!(ToolchainValidator::get_install_hint("/opt/py/bin/py").contains("[sandbox]"));
    }

    #[test]
    fn test_is_tool_available_nonexistent() {
        assert!(!ToolchainValidator::is_tool_available(
            "nonexistent_tool_xyz",
            &["--version"]
        ));
    }

    #[test]
    fn test_validate_missing_interpreter() {
        let status = ToolchainValidator::validate("nonexistent_python_xyz");
        assert!(!status.is_available());
        assert_eq!(status.interpreter, "nonexistent_python_xyz");
    }

    #[test]
    fn test_validate_reports_python_version() {
        let status = ToolchainValidator::validate("python3");
        if let Some(version) = status.version {
            assert!(version.starts_with("Python"), "{version}");
        }
    }
}
