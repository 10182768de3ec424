//! @ai:module:intent Instruction prompt for a repair example, matching the markers the extractor looks for
//! @ai:module:layer domain
//! @ai:module:public_api build_instruction_prompt
//! @ai:module:stateless true

use crate::config::ExtractionConfig;
use crate::corpus::Example;

const INSTRUCTION_HEADER: &str = "### Instruction:";

/// @ai:intent Render the instruction-style repair prompt for one example
/// @ai:post ends with the response marker, so a model continuation lands in the response section
/// @ai:effects pure
pub fn build_instruction_prompt(example: &Example, markers: &ExtractionConfig) -> String {
    format!(
        "{header}\n{docstring}\n\n```python\n{buggy}\n```\n\n{instruction}\n\n{response}\n",
        header = INSTRUCTION_HEADER,
        docstring = example.docstring.trim(),
        buggy = example.buggy_program.trim_end(),
        instruction = markers.instruction_marker,
        response = markers.response_marker,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::{CodeExtractor, CodeExtractorTrait, ExtractionStrategy};
    use pretty_assertions::assert_eq;

    fn example() -> Example {
        Example {
            name: "bitcount".to_string(),
            buggy_program: "def bitcount(n):\n    count = 0\n    while n:\n        n ^= n - 1\n        count += 1\n    return count\n".to_string(),
            docstring: "Count the set bits of a nonnegative int.".to_string(),
            solution: String::new(),
            tests: String::new(),
            generated_output: String::new(),
        }
    }

    #[test]
    fn test_prompt_layout() {
        let prompt = build_instruction_prompt(&example(), &ExtractionConfig::default());

        assert!(prompt.starts_with("### Instruction:\nCount the set bits"));
        assert!(prompt.contains("```python\ndef bitcount(n):"));
        assert!(prompt.contains("Provide a fixed version of the program."));
        assert!(prompt.ends_with("### Response:\n"));
    }

    #[test]
    fn test_continuation_is_extractable() {
        let markers = ExtractionConfig::default();
        let fix = "def bitcount(n):\n    count = 0\n    while n:\n        n &= n - 1\n        count += 1\n    return count";
        let generation = format!(
            "{}```python\n{}\n```",
            build_instruction_prompt(&example(), &markers),
            fix
        );

        let extraction = CodeExtractor::new(markers).extract(&generation);
        assert_eq!(extraction.strategy, Some(ExtractionStrategy::FencedBlock));
        assert_eq!(extraction.code, fix);
    }
}
