//! INI-style line tokenizer.
//!
//! Classifies each line of a configuration file as blank/comment, section
//! header, `key = value` entry, or malformed. Section scoping and key
//! dispatch are left to the loader.

/// A single classified line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line<'a> {
    /// Blank line or full-line comment.
    Blank,
    /// `[name]` header; the name is trimmed.
    Section(&'a str),
    /// `key = value`; both sides trimmed, value unquoted and stripped of inline comments.
    Entry { key: &'a str, value: &'a str },
    /// Starts with `[` but is not a valid header.
    MalformedHeader,
    /// Anything else.
    Malformed,
}

/// A classified line together with its 1-based line number and raw text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub line: usize,
    pub raw: &'a str,
    pub kind: Line<'a>,
}

/// Tokenize a whole document.
pub fn tokenize(text: &str) -> impl Iterator<Item = Token<'_>> {
    text.trim_start_matches('\u{feff}')
        .lines()
        .enumerate()
        .map(|(idx, raw)| Token {
            line: idx + 1,
            raw,
            kind: classify(raw),
        })
}

/// Classify one line.
pub fn classify(raw: &str) -> Line<'_> {
    let line = raw.trim();
    if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
        return Line::Blank;
    }

    let line = strip_inline_comment(line);

    if let Some(rest) = line.strip_prefix('[') {
        return match rest.strip_suffix(']') {
            Some(name) => {
                let name = name.trim();
                if name.is_empty() || name.contains(|c: char| c == '[' || c == ']') {
                    Line::MalformedHeader
                } else {
                    Line::Section(name)
                }
            }
            None => Line::MalformedHeader,
        };
    }

    let Some((lhs, rhs)) = line.split_once('=') else {
        return Line::Malformed;
    };
    let key = lhs.trim();
    if key.is_empty() || key.contains(char::is_whitespace) {
        return Line::Malformed;
    }

    Line::Entry {
        key,
        value: unquote(rhs.trim()),
    }
}

/// Cut a trailing `;` or `#` comment that is preceded by whitespace and not inside quotes.
fn strip_inline_comment(line: &str) -> &str {
    let mut in_quotes = false;
    let mut prev_ws = false;
    for (idx, ch) in line.char_indices() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ';' | '#' if !in_quotes && prev_ws => return line[..idx].trim_end(),
            _ => {}
        }
        prev_ws = ch.is_whitespace();
    }
    line
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_basic_lines() {
        assert_eq!(classify(""), Line::Blank);
        assert_eq!(classify("   "), Line::Blank);
        assert_eq!(classify("; comment"), Line::Blank);
        assert_eq!(classify("  # comment"), Line::Blank);
        assert_eq!(classify("[general]"), Line::Section("general"));
        assert_eq!(classify("[ mode2 ]"), Line::Section("mode2"));
        assert_eq!(
            classify("viewerPort = 5900"),
            Line::Entry { key: "viewerPort", value: "5900" }
        );
        assert_eq!(
            classify("runAsUser=nobody"),
            Line::Entry { key: "runAsUser", value: "nobody" }
        );
    }

    #[test]
    fn test_classify_malformed() {
        assert_eq!(classify("[general"), Line::MalformedHeader);
        assert_eq!(classify("[]"), Line::MalformedHeader);
        assert_eq!(classify("[a]b]"), Line::MalformedHeader);
        assert_eq!(classify("just some words"), Line::Malformed);
        assert_eq!(classify("= 5"), Line::Malformed);
        assert_eq!(classify("view port = 5"), Line::Malformed);
    }

    #[test]
    fn test_inline_comments_and_quotes() {
        assert_eq!(
            classify("maxSessions = 10 ; per host"),
            Line::Entry { key: "maxSessions", value: "10" }
        );
        assert_eq!(
            classify("[general] # main"),
            Line::Section("general")
        );
        assert_eq!(
            classify("runAsUser = \"uvnc rep\""),
            Line::Entry { key: "runAsUser", value: "uvnc rep" }
        );
        assert_eq!(
            classify("eventListenerHost = \"a #b\""),
            Line::Entry { key: "eventListenerHost", value: "a #b" }
        );
        // No whitespace before the marker: part of the value.
        assert_eq!(
            classify("runAsUser = a#b"),
            Line::Entry { key: "runAsUser", value: "a#b" }
        );
        assert_eq!(classify("key ="), Line::Entry { key: "key", value: "" });
    }

    #[test]
    fn test_tokenize_line_numbers() {
        let text = "\u{feff}[general]\n\nviewerPort = 1\r\n";
        let tokens: Vec<_> = tokenize(text).collect();
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].kind, Line::Section("general"));
        assert_eq!(tokens[1].kind, Line::Blank);
        assert_eq!(tokens[2].line, 3);
        assert_eq!(tokens[2].kind, Line::Entry { key: "viewerPort", value: "1" });
    }
}
