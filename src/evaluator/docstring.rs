//! @ai:module:intent Remove a docstring the model echoed back into its fix
//! @ai:module:layer domain
//! @ai:module:public_api strip_docstring
//! @ai:module:stateless true

const DELIMITERS: [&str; 2] = ["\"\"\"", "'''"];

/// Byte span of one line: start, end of content, end including the newline.
#[derive(Debug, Clone, Copy)]
struct LineSpan {
    start: usize,
    end: usize,
    next: usize,
}

fn line_text<'a>(code: &'a str, span: &LineSpan) -> &'a str {
    &code[span.start..span.end]
}

fn line_spans(code: &str) -> Vec<LineSpan> {
    let mut spans = Vec::new();
    let mut start = 0;

    while start < code.len() {
        let (end, next) = match code[start..].find('\n') {
            Some(offset) => (start + offset, start + offset + 1),
            None => (code.len(), code.len()),
        };
        spans.push(LineSpan { start, end, next });
        start = next;
    }

    spans
}

/// @ai:intent Remove the first triple-quoted literal directly after a leading def signature
/// @ai:post code without such a literal is returned unchanged
/// @ai:effects pure
pub fn strip_docstring(code: &str) -> String {
    match find_docstring(code) {
        Some(removal) => removal.apply(code),
        None => code.to_string(),
    }
}

/// Bytes to cut, plus an optional replacement for statements sharing the closing line.
#[derive(Debug)]
struct Removal {
    start: usize,
    end: usize,
    replacement: String,
}

impl Removal {
    fn apply(&self, code: &str) -> String {
        let mut out = String::with_capacity(code.len());
        out.push_str(&code[..self.start]);
        out.push_str(&self.replacement);
        out.push_str(&code[self.end..]);
        out
    }
}

fn find_docstring(code: &str) -> Option<Removal> {
    let lines = line_spans(code);

    let def_index = lines
        .iter()
        .position(|l| !line_text(code, l).trim().is_empty())?;
    let def_line = line_text(code, &lines[def_index]).trim_start();
    if !(def_line.starts_with("def ") || def_line.starts_with("async def ")) {
        return None;
    }

    let signature_end = signature_end(code, &lines, def_index)?;
    let doc_index = (signature_end + 1..lines.len())
        .find(|i| !line_text(code, &lines[*i]).trim().is_empty())?;
    let doc_span = lines[doc_index];
    let doc_line = line_text(code, &doc_span);

    let indent = doc_line.len() - doc_line.trim_start().len();
    let literal = &doc_line[indent..];
    let prefix_len = literal
        .chars()
        .take_while(|c| matches!(c, 'r' | 'R' | 'u' | 'U' | 'b' | 'B'))
        .count();
    if prefix_len > 2 {
        return None;
    }
    let delimiter: &str = DELIMITERS
        .iter()
        .copied()
        .find(|d| literal[prefix_len..].starts_with(d))?;

    let body_start = doc_span.start + indent + prefix_len + delimiter.len();
    let close = body_start + code[body_start..].find(delimiter)?;
    let literal_end = close + delimiter.len();

    let closing_line = lines.iter().find(|l| l.start <= close && close < l.next)?;
    let rest = code[literal_end..closing_line.end].trim();
    let rest = rest.trim_start_matches(';').trim_start();

    if rest.is_empty() {
        Some(Removal {
            start: doc_span.start,
            end: closing_line.next,
            replacement: String::new(),
        })
    } else {
        Some(Removal {
            start: doc_span.start,
            end: closing_line.end,
            replacement: format!("{}{}", &doc_line[..indent], rest),
        })
    }
}

/// Index of the line that closes the signature; None for one-line defs with an inline body.
fn signature_end(code: &str, lines: &[LineSpan], def_index: usize) -> Option<usize> {
    let mut depth: i32 = 0;

    for (index, span) in lines.iter().enumerate().skip(def_index) {
        let line = line_text(code, span);

        for c in line.chars() {
            match c {
                '(' | '[' | '{' => depth += 1,
                ')' | ']' | '}' => depth -= 1,
                _ => {}
            }
        }

        if depth <= 0 {
            return line.trim_end().ends_with(':').then_some(index);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_strips_multiline_docstring() {
        let code = "def gcd(a, b):\n    \"\"\"\n    Greatest common divisor.\n    \"\"\"\n    if b == 0:\n        return a\n    return gcd(b, a % b)";
        assert_eq!(
            strip_docstring(code),
            "def gcd(a, b):\n    if b == 0:\n        return a\n    return gcd(b, a % b)"
        );
    }

    #[test]
    fn test_strips_single_line_docstring() {
        let code = "def f(x):\n    '''Add one.'''\n    return x + 1\n";
        assert_eq!(strip_docstring(code), "def f(x):\n    return x + 1\n");
    }

    #[test]
    fn test_only_first_literal_removed() {
        let code = "def f():\n    \"\"\"doc\"\"\"\n    s = \"\"\"keep me\"\"\"\n    return s";
        assert_eq!(
            strip_docstring(code),
            "def f():\n    s = \"\"\"keep me\"\"\"\n    return s"
        );
    }

    #[test]
    fn test_no_docstring_is_noop() {
        let samples = [
            "def f(x):\n    return x + 1",
            "def f(x):\n    s = 'text'\n    return s",
            "def f(x): return x",
            "x = \"\"\"not a docstring\"\"\"",
            "",
            "def f(x):\n    return \"\"\"late literal\"\"\"",
        ];

        for code in samples {
            assert_eq!(strip_docstring(code), code);
        }
    }

    #[test]
    fn test_multiline_signature() {
        let code = "def f(\n    a,\n    b,\n):\n    r\"\"\"Raw doc.\"\"\"\n    return a";
        assert_eq!(strip_docstring(code), "def f(\n    a,\n    b,\n):\n    return a");
    }

    #[test]
    fn test_unterminated_docstring_is_noop() {
        let code = "def f():\n    \"\"\"never closed\n    return 1";
        assert_eq!(strip_docstring(code), code);
    }

    #[test]
    fn test_statement_after_closing_quotes_is_kept() {
        let code = "def f():\n    \"\"\"doc\"\"\"; return 1";
        assert_eq!(strip_docstring(code), "def f():\n    return 1");
    }
}
