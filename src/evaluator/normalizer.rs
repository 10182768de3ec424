//! @ai:module:intent Remove cosmetic blank lines before code comparison
//! @ai:module:layer domain
//! @ai:module:public_api normalize
//! @ai:module:stateless true

/// @ai:intent Drop empty and whitespace-only lines, keep the rest verbatim
/// @ai:post result contains no blank lines; normalize(normalize(s)) == normalize(s)
/// @ai:effects pure
pub fn normalize(code: &str) -> String {
    code.lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removes_blank_and_whitespace_lines() {
        let code = "def f(x):\n\n    \n    return x\n\t\n";
        assert_eq!(normalize(code), "def f(x):\n    return x");
    }

    #[test]
    fn test_preserves_indentation() {
        let code = "if a:\n\n        b()\n    c()";
        assert_eq!(normalize(code), "if a:\n        b()\n    c()");
    }

    #[test]
    fn test_idempotent() {
        let samples = [
            "",
            "\n\n",
            "def f(x):\n\n    return x+1\n",
            "  x = 1  \r\n\r\n  y = 2",
            "a\n \n b\n\n\n c",
        ];

        for s in samples {
            let once = normalize(s);
            assert_eq!(normalize(&once), once, "not idempotent for {s:?}");
        }
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   \n\t\n"), "");
    }
}
