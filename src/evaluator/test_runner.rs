//! @ai:module:intent Execute candidate code and its unit tests in a sandboxed interpreter
//! @ai:module:layer infrastructure
//! @ai:module:public_api TestRunner, MockTestRunner, TestOutcome, FailureStage
//! @ai:module:stateless true

use crate::config::SandboxConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;

const EXIT_CANDIDATE_FAILED: i32 = 3;
const EXIT_TESTS_FAILED: i32 = 4;
const ERROR_MARKER: &str = "__sandbox_error__ ";
const OK_MARKER: &str = "__sandbox_ok__ ";
const MAX_MESSAGE_CHARS: usize = 500;
/// Only the last bytes of stderr are kept; both markers are written at the very end.
const MAX_STDERR_BYTES: usize = 64 * 1024;

/// Runs the candidate, then the tests, in one fresh namespace. Exit code names the failing stage;
/// the ok marker with the run token is written only after the tests returned.
const DRIVER: &str = r#"import os
import sys


def _load(path):
    with open(path, encoding="utf-8") as handle:
        return compile(handle.read(), path, "exec")


def _run():
    token = sys.stdin.readline().strip()
    sys.stdin.close()
    sys.stdin = open(os.devnull, encoding="utf-8")
    candidate_path, tests_path = sys.argv[1], sys.argv[2]
    sys.argv = [candidate_path]
    err = sys.__stderr__

    namespace = {"__name__": "__candidate__", "__builtins__": __builtins__}
    stage = 3
    try:
        exec(_load(candidate_path), namespace)
        stage = 4
        exec(_load(tests_path), namespace)
    except SystemExit as exc:
        err.write("\n__sandbox_error__ SystemExit: exit(%r) before the tests finished\n" % (exc.code,))
        err.flush()
        sys.exit(stage)
    except BaseException as exc:
        message = str(exc).replace("\n", " ")
        err.write("\n__sandbox_error__ %s: %s\n" % (type(exc).__name__, message))
        err.flush()
        sys.exit(stage)

    err.write("\n__sandbox_ok__ %s\n" % token)
    err.flush()


_run()
"#;

/// @ai:intent Which part of the sandboxed run raised
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    /// Defining the candidate raised (syntax error, bad import, top-level crash)
    Candidate,
    /// The test snippet raised (assertion or runtime error)
    Tests,
    /// The interpreter itself failed or was killed by a signal
    Interpreter,
}

impl FailureStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureStage::Candidate => "candidate",
            FailureStage::Tests => "tests",
            FailureStage::Interpreter => "interpreter",
        }
    }
}

/// @ai:intent Result of one sandboxed test run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestOutcome {
    Passed,
    Failed { stage: FailureStage, message: String },
    TimedOut { after: Duration },
}

impl TestOutcome {
    pub fn passed(&self) -> bool {
        matches!(self, TestOutcome::Passed)
    }
}

/// @ai:intent Trait for sandboxed test execution
#[allow(async_fn_in_trait)]
pub trait TestRunnerTrait: Send + Sync {
    /// @ai:intent Run candidate code followed by the test snippet
    /// @ai:post Err only for harness failures; candidate failures are outcomes
    async fn run(&self, code: &str, tests: &str) -> Result<TestOutcome>;
}

/// @ai:intent Executes candidate plus tests in a child interpreter under a wall-clock budget
pub struct TestRunner {
    python: String,
    timeout: Duration,
}

impl TestRunner {
    /// @ai:intent Create a new test runner
    /// @ai:effects pure
    pub fn new(python: impl Into<String>, timeout: Duration) -> Self {
        Self {
            python: python.into(),
            timeout,
        }
    }

    /// @ai:intent Create a runner from the sandbox section of the config
    /// @ai:effects pure
    pub fn from_config(config: &SandboxConfig) -> Self {
        Self::new(config.python.clone(), config.timeout())
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// @ai:intent Write driver, candidate and tests into the sandbox directory
    /// @ai:effects fs:write
    fn write_workspace(dir: &Path, code: &str, tests: &str) -> Result<()> {
        std::fs::write(dir.join("driver.py"), DRIVER)?;
        std::fs::write(dir.join("candidate.py"), code)?;
        std::fs::write(dir.join("tests.py"), tests)?;
        Ok(())
    }
}

impl Default for TestRunner {
    fn default() -> Self {
        Self::from_config(&SandboxConfig::default())
    }
}

impl TestRunnerTrait for TestRunner {
    /// @ai:effects fs:write, process
    async fn run(&self, code: &str, tests: &str) -> Result<TestOutcome> {
        // Dropped on every exit path, removing the files.
        let workspace = TempDir::new().context("Failed to create sandbox directory")?;
        Self::write_workspace(workspace.path(), code, tests)
            .context("Failed to write sandbox files")?;

        let token = run_token();
        let mut child = Command::new(&self.python)
            .arg("-I")
            .arg("driver.py")
            .arg("candidate.py")
            .arg("tests.py")
            .current_dir(workspace.path())
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to start interpreter '{}'", self.python))?;
        let stderr = child
            .stderr
            .take()
            .context("Sandbox stderr was not captured")?;

        // The token never appears on argv or in the driver's module globals.
        let mut stdin = child.stdin.take().context("Sandbox stdin was not captured")?;
        if let Err(e) = stdin.write_all(format!("{token}\n").as_bytes()).await {
            // An interpreter that died this early is classified from its exit status.
            tracing::debug!("Failed to pass the run token: {}", e);
        }
        drop(stdin);

        let finished = async {
            let tail = read_tail(stderr, MAX_STDERR_BYTES).await?;
            let status = child.wait().await?;
            Ok::<_, std::io::Error>((status, tail))
        };

        // On expiry the child is killed when it goes out of scope.
        match tokio::time::timeout(self.timeout, finished).await {
            Ok(result) => {
                let (status, tail) = result.context("Failed to collect sandbox output")?;
                Ok(classify(status, &String::from_utf8_lossy(&tail), &token))
            }
            Err(_) => {
                tracing::warn!("Sandboxed run exceeded {:?}, killed", self.timeout);
                Ok(TestOutcome::TimedOut {
                    after: self.timeout,
                })
            }
        }
    }
}

/// @ai:intent Runner returning a fixed outcome, for tests without an interpreter
pub struct MockTestRunner {
    outcome: TestOutcome,
}

impl MockTestRunner {
    pub fn new(outcome: TestOutcome) -> Self {
        Self { outcome }
    }
}

impl TestRunnerTrait for MockTestRunner {
    async fn run(&self, _code: &str, _tests: &str) -> Result<TestOutcome> {
        Ok(self.outcome.clone())
    }
}

/// @ai:intent Token the driver echoes after the tests ran, so candidate output cannot fake a pass
/// @ai:effects pure
fn run_token() -> String {
    let nanos = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
    format!("{:x}{:x}", std::process::id(), nanos)
}

/// @ai:intent Drain a stream, keeping only its last `limit` bytes
/// @ai:effects io
async fn read_tail<R: AsyncRead + Unpin>(mut reader: R, limit: usize) -> std::io::Result<Vec<u8>> {
    let mut tail = Vec::new();
    let mut chunk = [0u8; 8192];

    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        tail.extend_from_slice(&chunk[..n]);
        if tail.len() > limit {
            let excess = tail.len() - limit;
            tail.drain(..excess);
        }
    }

    Ok(tail)
}

/// @ai:intent Map interpreter exit status and stderr to an outcome
/// @ai:post Passed only for exit 0 with the ok marker for this run's token
/// @ai:effects pure
fn classify(status: std::process::ExitStatus, stderr: &str, token: &str) -> TestOutcome {
    let stage = match status.code() {
        Some(0) if tests_completed(stderr, token) => return TestOutcome::Passed,
        Some(0) => {
            return TestOutcome::Failed {
                stage: FailureStage::Interpreter,
                message: "interpreter exited before the tests finished".to_string(),
            }
        }
        Some(EXIT_CANDIDATE_FAILED) => FailureStage::Candidate,
        Some(EXIT_TESTS_FAILED) => FailureStage::Tests,
        _ => FailureStage::Interpreter,
    };

    TestOutcome::Failed {
        stage,
        message: failure_message(stderr, status),
    }
}

fn tests_completed(stderr: &str, token: &str) -> bool {
    stderr
        .lines()
        .filter_map(|line| line.strip_prefix(OK_MARKER))
        .any(|seen| seen.trim_end() == token)
}

/// @ai:intent Prefer the driver's one-line summary, else the tail of stderr
/// @ai:effects pure
fn failure_message(stderr: &str, status: std::process::ExitStatus) -> String {
    if let Some(line) = stderr
        .lines()
        .rev()
        .find_map(|line| line.strip_prefix(ERROR_MARKER))
    {
        return truncate(line.trim());
    }

    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        format!("interpreter exited with {status}")
    } else {
        truncate(trimmed)
    }
}

fn truncate(message: &str) -> String {
    if message.chars().count() <= MAX_MESSAGE_CHARS {
        message.to_string()
    } else {
        let head: String = message.chars().take(MAX_MESSAGE_CHARS).collect();
        format!("{head}...")
    }
}
