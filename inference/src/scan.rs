//! Lexical helpers shared by the matcher and the extractor.
//!
//! Config sources are never parsed. Instead they are *masked*: comments are
//! blanked out and delimiter characters inside string and regex literals are
//! replaced with spaces. The masked text has exactly the same byte length as the
//! input, so any span found in it indexes the original text too.
//!
//! Delimiter matching over masked text is stack based, which keeps nested
//! `(...)`, `{...}` and `[...]` inside field declarations from truncating a
//! captured block. [`Nesting`] pairs every delimiter of a text in one pass.

use std::ops::Range;

use crate::error::InferenceError;

/// Masks comments and in-string delimiters, preserving byte offsets.
///
/// - `// ...` and `/* ... */` become spaces (newlines are kept).
/// - Inside `'...'`, `"..."` and `` `...` `` the characters `(){}[]` become
///   spaces; quotes and all other characters are kept.
/// - Inside a regex literal such as `/^[a-z']+$/` delimiters and quotes
///   become spaces. A `/` starts a regex literal when the previous code byte
///   is one of `( , = : [ ! & | ? { } ;` or there is none; otherwise it is a
///   division.
///
/// An unterminated comment or string simply runs to the end of the input. An
/// unterminated regex literal ends at the line break.
pub fn mask(source: &str) -> Result<String, InferenceError> {
    #[derive(Clone, Copy, PartialEq, Eq)]
    enum State {
        Code,
        LineComment,
        BlockComment,
        Str(u8),
        Regex { in_class: bool },
    }

    let bytes = source.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut state = State::Code;
    // Last non-blank byte of code, outside comments.
    let mut last_code: Option<u8> = None;
    let mut i = 0;

    while i < bytes.len() {
        let byte = bytes[i];
        let next = bytes.get(i + 1).copied();
        match state {
            State::Code => match (byte, next) {
                (b'/', Some(b'/')) => {
                    state = State::LineComment;
                    out.extend_from_slice(b"  ");
                    i += 2;
                    continue;
                }
                (b'/', Some(b'*')) => {
                    state = State::BlockComment;
                    out.extend_from_slice(b"  ");
                    i += 2;
                    continue;
                }
                (b'/', _) if starts_regex(last_code) => {
                    state = State::Regex { in_class: false };
                    last_code = Some(byte);
                    out.push(byte);
                }
                (b'\'' | b'"' | b'`', _) => {
                    state = State::Str(byte);
                    last_code = Some(byte);
                    out.push(byte);
                }
                _ => {
                    if !byte.is_ascii_whitespace() {
                        last_code = Some(byte);
                    }
                    out.push(byte);
                }
            },
            State::LineComment => {
                if byte == b'\n' {
                    state = State::Code;
                    out.push(b'\n');
                } else {
                    out.push(b' ');
                }
            }
            State::BlockComment => {
                if byte == b'*' && next == Some(b'/') {
                    state = State::Code;
                    out.extend_from_slice(b"  ");
                    i += 2;
                    continue;
                }
                out.push(if byte == b'\n' { b'\n' } else { b' ' });
            }
            State::Str(quote) => {
                if byte == b'\\' {
                    out.push(b'\\');
                    if let Some(escaped) = next {
                        out.push(blank_delimiter(escaped));
                        i += 2;
                        continue;
                    }
                } else if byte == quote {
                    state = State::Code;
                    out.push(byte);
                } else if byte == b'\n' && quote != b'`' {
                    // Unterminated single-line string.
                    state = State::Code;
                    out.push(b'\n');
                } else {
                    out.push(blank_delimiter(byte));
                }
            }
            State::Regex { in_class } => {
                if byte == b'\\' {
                    out.push(b'\\');
                    if let Some(escaped) = next {
                        out.push(blank_in_regex(escaped));
                        i += 2;
                        continue;
                    }
                } else if byte == b'\n' {
                    state = State::Code;
                    out.push(b'\n');
                } else if byte == b'/' && !in_class {
                    state = State::Code;
                    out.push(byte);
                } else {
                    if byte == b'[' {
                        state = State::Regex { in_class: true };
                    } else if byte == b']' {
                        state = State::Regex { in_class: false };
                    }
                    out.push(blank_in_regex(byte));
                }
            }
        }
        i += 1;
    }

    String::from_utf8(out).map_err(|_| InferenceError::InvalidMask)
}

fn blank_delimiter(byte: u8) -> u8 {
    if is_opener(byte) || is_closer(byte) {
        b' '
    } else {
        byte
    }
}

fn blank_in_regex(byte: u8) -> u8 {
    if matches!(byte, b'\'' | b'"' | b'`') {
        b' '
    } else {
        blank_delimiter(byte)
    }
}

/// `true` if a `/` following `previous` opens a regex literal.
fn starts_regex(previous: Option<u8>) -> bool {
    match previous {
        None => true,
        Some(byte) => matches!(
            byte,
            b'(' | b',' | b'=' | b':' | b'[' | b'!' | b'&' | b'|' | b'?' | b'{' | b'}' | b';'
        ),
    }
}

fn is_opener(byte: u8) -> bool {
    matches!(byte, b'(' | b'{' | b'[')
}

fn is_closer(byte: u8) -> bool {
    matches!(byte, b')' | b'}' | b']')
}

fn closer_for(opener: u8) -> u8 {
    match opener {
        b'(' => b')',
        b'{' => b'}',
        _ => b']',
    }
}

/// Delimiter pairs and depths of a masked text, computed in one pass.
///
/// An opener is paired with its closer only if every delimiter between them
/// is balanced, so `{ a: f({ b: [] }) }` closes at the final `}` and
/// `{ ( }` does not close at all.
#[derive(Debug, Clone)]
pub struct Nesting {
    depths: Vec<u32>,
    closes: Vec<Close>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Close {
    NotOpener,
    Unclosed,
    At(usize),
}

impl Nesting {
    pub fn new(masked: &str) -> Self {
        let bytes = masked.as_bytes();
        let mut closes = vec![Close::NotOpener; bytes.len()];
        // Open delimiters as (offset, expected closer).
        let mut stack: Vec<(usize, u8)> = Vec::new();
        // Entries below this height saw a mismatched closer while open.
        let mut poisoned = 0;

        for (offset, &byte) in bytes.iter().enumerate() {
            if is_opener(byte) {
                closes[offset] = Close::Unclosed;
                stack.push((offset, closer_for(byte)));
            } else if is_closer(byte) {
                let Some((open, expected)) = stack.pop() else {
                    continue;
                };
                if expected != byte {
                    poisoned = stack.len() + 1;
                }
                if stack.len() < poisoned {
                    poisoned = stack.len();
                } else {
                    closes[open] = Close::At(offset);
                }
            }
        }

        Self {
            depths: depth_map(masked),
            closes,
        }
    }

    /// Depth of every byte, as computed by [`depth_map`].
    pub fn depths(&self) -> &[u32] {
        &self.depths
    }

    /// Byte offset of the delimiter closing the one at `open`.
    pub fn close(&self, open: usize) -> Result<usize, InferenceError> {
        match self.closes.get(open) {
            Some(Close::At(close)) => Ok(*close),
            Some(Close::Unclosed) => Err(InferenceError::Unbalanced(open)),
            Some(Close::NotOpener) | None => Err(InferenceError::NotAnOpener(open)),
        }
    }
}

/// Nesting depth of every byte of `masked`.
///
/// Openers and their closers both carry the depth of the surrounding code;
/// bytes between them are one level deeper. Stray closers never push the
/// depth below zero.
pub fn depth_map(masked: &str) -> Vec<u32> {
    let mut depths = Vec::with_capacity(masked.len());
    let mut depth: u32 = 0;
    for &byte in masked.as_bytes() {
        if is_closer(byte) {
            depth = depth.saturating_sub(1);
            depths.push(depth);
        } else {
            depths.push(depth);
            if is_opener(byte) {
                depth += 1;
            }
        }
    }
    depths
}

/// Splits `masked` at every `separator` byte sitting at depth zero.
///
/// Returned ranges exclude the separators and may be empty or blank.
pub fn split_top_level(masked: &str, depths: &[u32], separator: u8) -> Vec<Range<usize>> {
    let mut segments = Vec::new();
    let mut start = 0;
    for (offset, &byte) in masked.as_bytes().iter().enumerate() {
        if byte == separator && depths.get(offset) == Some(&0) {
            segments.push(start..offset);
            start = offset + 1;
        }
    }
    segments.push(start..masked.len());
    segments
}

/// Returns `true` for characters that can continue a script identifier.
pub fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_preserves_length_and_blanks_comments() {
        let source = "a: z.string(), // b: z.number()\n/* c: z.date() */ d: z.boolean()";
        let masked = mask(source).unwrap();

        assert_eq!(masked.len(), source.len());
        assert!(!masked.contains("number"));
        assert!(!masked.contains("date"));
        assert!(masked.contains("d: z.boolean()"));
        assert_eq!(masked.matches('\n').count(), 1);
    }

    #[test]
    fn test_mask_blanks_delimiters_inside_strings_only() {
        let source = r#"x: z.string().default("{ not: a block }")"#;
        let masked = mask(source).unwrap();

        assert_eq!(masked, r#"x: z.string().default("  not: a block  ")"#);
    }

    #[test]
    fn test_mask_handles_escapes_and_multibyte_text() {
        let source = "t: z.string().describe('it\\'s {é}') // ünïcode";
        let masked = mask(source).unwrap();

        assert_eq!(masked.len(), source.len());
        assert!(masked.starts_with("t: z.string().describe('it\\'s  é ')"));
        assert!(masked.trim_end().ends_with(')'));
    }

    #[test]
    fn test_close_skips_nested_pairs() {
        let text = "{ a: f({ b: [1, 2] }), c: {} } tail";
        let nesting = Nesting::new(text);
        let close = nesting.close(0).unwrap();
        assert_eq!(&text[close..], "} tail");
        assert_eq!(nesting.close(7), Ok(19));
    }

    #[test]
    fn test_close_reports_faults() {
        assert_eq!(Nesting::new("abc").close(0), Err(InferenceError::NotAnOpener(0)));
        assert_eq!(Nesting::new("{").close(5), Err(InferenceError::NotAnOpener(5)));
        assert_eq!(Nesting::new("{ (").close(0), Err(InferenceError::Unbalanced(0)));

        // A mismatch poisons every pair still open around it.
        let nesting = Nesting::new("[ { ( } ] ( )");
        assert_eq!(nesting.close(0), Err(InferenceError::Unbalanced(0)));
        assert_eq!(nesting.close(2), Err(InferenceError::Unbalanced(2)));
        assert_eq!(nesting.close(10), Ok(12));
    }

    #[test]
    fn test_close_table_handles_many_unclosed_openers() {
        let text = "(".repeat(50_000);
        let nesting = Nesting::new(&text);
        assert_eq!(nesting.close(0), Err(InferenceError::Unbalanced(0)));
        assert_eq!(nesting.close(49_999), Err(InferenceError::Unbalanced(49_999)));
        assert_eq!(nesting.depths()[49_999], 49_999);
    }

    #[test]
    fn test_mask_blanks_regex_literals() {
        let source = "slug: z.string().regex(/^[a-z']+$/), draft: z.boolean()";
        let masked = mask(source).unwrap();

        assert_eq!(masked.len(), source.len());
        assert_eq!(masked, "slug: z.string().regex(/^ a-z  +$/), draft: z.boolean()");
        assert_eq!(Nesting::new(&masked).close(22), Ok(34));
    }

    #[test]
    fn test_mask_regex_classes_escapes_and_division() {
        let masked = mask(r"a: f(/[(/]\)/g, 10 / 2), b: (x) / (y)").unwrap();
        assert_eq!(masked, r"a: f(/  / \ /g, 10 / 2), b: (x) / (y)");

        // No closing slash on the line.
        let masked = mask("a: f(/(\nb: g()").unwrap();
        assert_eq!(masked, "a: f(/ \nb: g()");
    }

    #[test]
    fn test_depth_map_and_top_level_split() {
        let text = "a: f(1, 2), b: [x, y], c";
        let depths = depth_map(text);
        let parts: Vec<&str> = split_top_level(text, &depths, b',')
            .into_iter()
            .map(|range| text[range].trim())
            .collect();

        assert_eq!(parts, vec!["a: f(1, 2)", "b: [x, y]", "c"]);
    }

    #[test]
    fn test_depth_map_ignores_stray_closers() {
        let depths = depth_map(")) (");
        assert_eq!(depths, vec![0, 0, 0, 0]);
    }
}
