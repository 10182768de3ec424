//! @ai:module:intent Extract the candidate fix from raw model generations
//! @ai:module:layer application
//! @ai:module:public_api CodeExtractor, Extraction, ExtractionStrategy
//! @ai:module:stateless true

use crate::config::ExtractionConfig;
use regex::Regex;
use serde::{Deserialize, Serialize};

const QUOTE_CHARS: [char; 3] = ['"', '\'', '`'];
const TRIPLE_QUOTES: [&str; 2] = ["\"\"\"", "'''"];

/// @ai:intent One way of locating code inside a generation, tried in configured order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStrategy {
    /// Longest fenced block after the response marker
    FencedBlock,
    /// Raw text after the response marker
    ResponseText,
    /// Triple-quoted block after the quoted-block marker
    QuotedBlock,
    /// Raw text after the instruction phrase
    InstructionTail,
}

impl ExtractionStrategy {
    /// @ai:intent Convert strategy to string representation
    /// @ai:effects pure
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionStrategy::FencedBlock => "fenced_block",
            ExtractionStrategy::ResponseText => "response_text",
            ExtractionStrategy::QuotedBlock => "quoted_block",
            ExtractionStrategy::InstructionTail => "instruction_tail",
        }
    }
}

impl std::fmt::Display for ExtractionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// @ai:intent Extracted candidate code and the strategy that found it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub code: String,
    /// None when no strategy matched; code is then empty
    pub strategy: Option<ExtractionStrategy>,
}

impl Extraction {
    fn empty() -> Self {
        Self {
            code: String::new(),
            strategy: None,
        }
    }
}

/// @ai:intent Trait for code extraction
pub trait CodeExtractorTrait: Send + Sync {
    /// @ai:intent Run the strategy chain; never fails, degrades to an empty string
    fn extract(&self, raw: &str) -> Extraction;

    /// @ai:intent All fenced code blocks in a text, in order
    fn fenced_blocks(&self, text: &str) -> Vec<String>;
}

/// @ai:intent Extracts code using an ordered chain of marker-based strategies
pub struct CodeExtractor {
    code_block_regex: Regex,
    config: ExtractionConfig,
}

impl CodeExtractor {
    /// @ai:intent Create a new code extractor
    /// @ai:effects pure
    pub fn new(config: ExtractionConfig) -> Self {
        Self {
            // ```python\n...``` or ```\n...```
            code_block_regex: Regex::new(r"```([\w+\-]*)[^\S\n]*\n([\s\S]*?)```")
                .expect("static regex"),
            config,
        }
    }

    /// @ai:intent Apply a single strategy
    /// @ai:effects pure
    fn apply(&self, strategy: ExtractionStrategy, raw: &str) -> Option<String> {
        match strategy {
            ExtractionStrategy::FencedBlock => {
                let section = section_after(raw, &self.config.response_marker)?;
                longest(self.fenced_blocks(section))
            }
            ExtractionStrategy::ResponseText => section_after(raw, &self.config.response_marker)
                .map(|section| trim_quotes(&strip_fence_lines(section))),
            ExtractionStrategy::QuotedBlock => {
                let section = section_after(raw, &self.config.quoted_marker)?;
                first_triple_quoted(section).map(|body| trim_quotes(body))
            }
            ExtractionStrategy::InstructionTail => section_after(raw, &self.config.instruction_marker)
                .map(|section| trim_quotes(&strip_fence_lines(section))),
        }
    }
}

impl Default for CodeExtractor {
    fn default() -> Self {
        Self::new(ExtractionConfig::default())
    }
}

impl CodeExtractorTrait for CodeExtractor {
    /// @ai:effects pure
    fn extract(&self, raw: &str) -> Extraction {
        for strategy in &self.config.strategies {
            if let Some(code) = self.apply(*strategy, raw) {
                if !code.is_empty() {
                    return Extraction {
                        code,
                        strategy: Some(*strategy),
                    };
                }
            }
        }

        Extraction::empty()
    }

    /// @ai:effects pure
    fn fenced_blocks(&self, text: &str) -> Vec<String> {
        self.code_block_regex
            .captures_iter(text)
            .filter_map(|cap| cap.get(2))
            .map(|m| m.as_str().trim().to_string())
            .collect()
    }
}

/// @ai:intent Text between the first and second occurrence of a marker
/// @ai:effects pure
fn section_after<'a>(text: &'a str, marker: &str) -> Option<&'a str> {
    if marker.is_empty() {
        return None;
    }

    text.splitn(3, marker).nth(1)
}

/// @ai:intent Pick the longest block; ties keep the earliest
/// @ai:effects pure
fn longest(blocks: Vec<String>) -> Option<String> {
    let mut best: Option<String> = None;

    for block in blocks {
        let longer = best.as_ref().map_or(true, |b| block.len() > b.len());
        if longer {
            best = Some(block);
        }
    }

    best
}

/// @ai:intent Body of the first """...""" or '''...''' literal
/// @ai:effects pure
fn first_triple_quoted(text: &str) -> Option<&str> {
    let (start, delimiter) = TRIPLE_QUOTES
        .iter()
        .filter_map(|d| text.find(d).map(|pos| (pos, *d)))
        .min_by_key(|(pos, _)| *pos)?;

    let body_start = start + delimiter.len();
    let end = text[body_start..].find(delimiter)?;
    Some(&text[body_start..body_start + end])
}

/// @ai:intent Drop fence delimiter lines so a fence tag never becomes code
/// @ai:effects pure
fn strip_fence_lines(text: &str) -> String {
    text.lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// @ai:intent Strip surrounding whitespace and quote characters
/// @ai:effects pure
fn trim_quotes(text: &str) -> String {
    text.trim()
        .trim_matches(|c| QUOTE_CHARS.contains(&c))
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn extractor() -> CodeExtractor {
        CodeExtractor::default()
    }

    #[test]
    fn test_extract_fenced_block_after_marker() {
        let raw = r#"### Instruction:
Fix this:
```python
def f(x):
    return x - 1
```
### Response:
Here is the fix:
```python
def f(x):
    return x + 1
```
"#;

        let extraction = extractor().extract(raw);
        assert_eq!(extraction.code, "def f(x):\n    return x + 1");
        assert_eq!(extraction.strategy, Some(ExtractionStrategy::FencedBlock));
    }

    #[test]
    fn test_longest_fenced_block_wins() {
        let raw = r#"### Response:
The bug is in `x - 1`:
```python
x + 1
```
Full function:
```python
def f(x):
    return x + 1
```
"#;

        let extraction = extractor().extract(raw);
        assert_eq!(extraction.code, "def f(x):\n    return x + 1");
    }

    #[test]
    fn test_unlabeled_fence() {
        let raw = "### Response:\n```\ndef g():\n    pass\n```";
        assert_eq!(extractor().extract(raw).code, "def g():\n    pass");
    }

    #[test]
    fn test_response_text_fallback_trims_quotes() {
        let raw = "prompt\n### Response:\n  \"def f(x):\n    return x + 1\"  \n";

        let extraction = extractor().extract(raw);
        assert_eq!(extraction.code, "def f(x):\n    return x + 1");
        assert_eq!(extraction.strategy, Some(ExtractionStrategy::ResponseText));
    }

    #[test]
    fn test_response_section_stops_at_repeated_marker() {
        let raw = "### Response:\ndef a():\n    pass\n### Response:\ndef b():\n    pass";
        assert_eq!(extractor().extract(raw).code, "def a():\n    pass");
    }

    #[test]
    fn test_quoted_block_alternate_template() {
        let raw = "Buggy program: ...\nFixed program:\n'''\ndef f(x):\n    return x + 1\n'''\ntrailing notes";

        let extraction = extractor().extract(raw);
        assert_eq!(extraction.code, "def f(x):\n    return x + 1");
        assert_eq!(extraction.strategy, Some(ExtractionStrategy::QuotedBlock));
    }

    #[test]
    fn test_instruction_tail_alternate_template() {
        let raw = "def f(x):\n    return x - 1\nProvide a fixed version of the program.\ndef f(x):\n    return x + 1\n";

        let extraction = extractor().extract(raw);
        assert_eq!(extraction.code, "def f(x):\n    return x + 1");
        assert_eq!(extraction.strategy, Some(ExtractionStrategy::InstructionTail));
    }

    #[test]
    fn test_no_marker_returns_empty() {
        let raw = "The model rambled and never produced code.";

        let extraction = extractor().extract(raw);
        assert_eq!(extraction, Extraction::empty());
    }

    #[test]
    fn test_empty_response_after_marker_falls_through() {
        let raw = "### Response:\n   \n";
        assert_eq!(extractor().extract(raw).code, "");
    }

    #[test]
    fn test_empty_fenced_block_yields_no_code() {
        for raw in ["### Response:\n```python\n```", "### Response:\n```python\n```\n\n"] {
            let extraction = extractor().extract(raw);
            assert_eq!(extraction, Extraction::empty());
        }
    }

    #[test]
    fn test_fence_tag_is_not_code_in_instruction_tail() {
        let raw = "Provide a fixed version of the program.\n```python\n```";
        assert_eq!(extractor().extract(raw).code, "");
    }

    #[test]
    fn test_configured_strategy_order() {
        let config = ExtractionConfig {
            strategies: vec![ExtractionStrategy::ResponseText],
            ..Default::default()
        };
        let raw = "### Response:\n```python\nx = 1\n```";

        let extraction = CodeExtractor::new(config).extract(raw);
        assert_eq!(extraction.code, "x = 1");
        assert_eq!(extraction.strategy, Some(ExtractionStrategy::ResponseText));
    }

    #[test]
    fn test_first_triple_quoted_prefers_earliest_delimiter() {
        assert_eq!(first_triple_quoted("a '''b''' \"\"\"c\"\"\""), Some("b"));
        assert_eq!(first_triple_quoted("\"\"\"unterminated"), None);
    }
}
