//! @ai:module:intent Structural equivalence of Python sources via position-free AST dumps
//! @ai:module:layer domain
//! @ai:module:public_api AstComparator, AstComparison, canonical_dump
//! @ai:module:stateless true

use regex::Regex;
use rustpython_parser::{ast, Parse};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// @ai:intent Outcome of comparing two sources structurally
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", content = "error", rename_all = "snake_case")]
pub enum AstComparison {
    Equal,
    Different,
    CandidateUnparseable(String),
    ReferenceUnparseable(String),
}

impl AstComparison {
    pub fn is_equal(&self) -> bool {
        matches!(self, AstComparison::Equal)
    }

    /// @ai:intent Short label for console output
    /// @ai:effects pure
    pub fn as_str(&self) -> &'static str {
        match self {
            AstComparison::Equal => "equal",
            AstComparison::Different => "different",
            AstComparison::CandidateUnparseable(_) => "candidate does not parse",
            AstComparison::ReferenceUnparseable(_) => "reference does not parse",
        }
    }
}

fn range_regex() -> &'static Regex {
    static RANGE: OnceLock<Regex> = OnceLock::new();
    RANGE.get_or_init(|| {
        Regex::new(r"range: (?:\d+\.\.\d+|TextRange \{[^}]*\})(, )?").expect("static regex")
    })
}

/// @ai:intent Parse a module and render its AST without source offsets
/// @ai:post equal results for sources differing only in layout
/// @ai:effects pure
pub fn canonical_dump(source: &str) -> Result<String, String> {
    let suite = ast::Suite::parse(source, "<candidate>").map_err(|e| e.to_string())?;
    let dump = format!("{suite:?}");
    Ok(range_regex().replace_all(&dump, "").into_owned())
}

/// @ai:intent Compares candidate and reference code by AST structure
pub struct AstComparator;

impl AstComparator {
    /// @ai:intent Create a new comparator
    /// @ai:effects pure
    pub fn new() -> Self {
        Self
    }

    /// @ai:intent Compare two sources; parse failures are verdicts, never errors
    /// @ai:effects pure
    pub fn compare(&self, candidate: &str, reference: &str) -> AstComparison {
        let reference_dump = match canonical_dump(reference) {
            Ok(dump) => dump,
            Err(e) => {
                tracing::warn!("Reference solution does not parse (dataset bug?): {}", e);
                return AstComparison::ReferenceUnparseable(e);
            }
        };

        match canonical_dump(candidate) {
            Ok(dump) if dump == reference_dump => AstComparison::Equal,
            Ok(_) => AstComparison::Different,
            Err(e) => {
                tracing::debug!("Candidate does not parse: {}", e);
                AstComparison::CandidateUnparseable(e)
            }
        }
    }

    /// @ai:effects pure
    pub fn is_ast_equal(&self, candidate: &str, reference: &str) -> bool {
        self.compare(candidate, reference).is_equal()
    }
}

impl Default for AstComparator {
    fn default() -> Self {
        Self::new()
    }
}
