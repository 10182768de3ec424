//! @ai:module:intent Example record for one code-repair evaluation row
//! @ai:module:layer domain
//! @ai:module:public_api Example
//! @ai:module:stateless true

use serde::{Deserialize, Serialize};

/// @ai:intent One dataset row: a buggy program, its reference fix and the model's raw output
/// @ai:effects pure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Example {
    pub name: String,
    pub buggy_program: String,
    /// Natural-language description, only used to build prompts
    pub docstring: String,
    /// Reference fix, stored without a docstring
    pub solution: String,
    pub tests: String,
    /// Raw generation text, usually the echoed prompt followed by the response
    pub generated_output: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_ignores_extra_fields() {
        let line = r#"{"name":"gcd","buggy_program":"def gcd(a, b):\n    pass","docstring":"gcd","solution":"def gcd(a, b):\n    return a","tests":"assert True","generated_output":"","model":"x"}"#;
        let example: Example = serde_json::from_str(line).unwrap();
        assert_eq!(example.name, "gcd");
        assert!(example.generated_output.is_empty());
    }

    #[test]
    fn test_deserialize_rejects_missing_field() {
        let line = r#"{"name":"gcd","buggy_program":"","docstring":"","solution":"","tests":""}"#;
        assert!(serde_json::from_str::<Example>(line).is_err());
    }
}
