//! Typst syntax highlighting — a line tokenizer for the editor.
//!
//! DESIGN
//! ======
//! Mirrors the stream-tokenizer rules the editor widget applies client side,
//! so the server can pre-highlight documents (template previews, chat code
//! replies). Each line is scanned left to right; the first matching rule
//! wins. Block comments, strings, math and raw blocks can span lines, so
//! their state is carried in [`LineState`].
//!
//! Offsets are byte offsets within the line. Characters no rule claims
//! produce no span. Adjacent spans of the same kind are merged.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TokenKind {
    Comment,
    String,
    Keyword,
    Number,
    /// Function call head, `#name` directly followed by `(`.
    VariableSpecial,
    Builtin,
    Header,
    Strong,
    Emphasis,
    Operator,
    Bracket,
    Punctuation,
    Variable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Span {
    pub line: usize,
    pub start: usize,
    pub end: usize,
    pub kind: TokenKind,
}

/// State carried from one line to the next.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineState {
    pub in_string: bool,
    pub in_comment: bool,
    pub in_math: bool,
    pub in_code: bool,
}

const KEYWORDS: [&str; 12] = [
    "import", "include", "let", "set", "show", "if", "else", "for", "while", "return", "break", "continue",
];

/// Tokenize a whole document.
#[must_use]
pub fn highlight(source: &str) -> Vec<Span> {
    let mut state = LineState::default();
    let mut spans = Vec::new();
    for (line_no, line) in source.lines().enumerate() {
        spans.extend(tokenize_line(line, line_no, &mut state));
    }
    spans
}

/// Tokenize one line, updating `state` for the next.
pub fn tokenize_line(line: &str, line_no: usize, state: &mut LineState) -> Vec<Span> {
    let mut spans: Vec<Span> = Vec::new();
    let mut pos = 0;

    while pos < line.len() {
        let (len, kind) = next_token(line, pos, state);
        let end = pos + len;
        if let Some(kind) = kind {
            match spans.last_mut() {
                Some(last) if last.kind == kind && last.end == pos => last.end = end,
                _ => spans.push(Span { line: line_no, start: pos, end, kind }),
            }
        }
        pos = end;
    }
    spans
}

/// Length in bytes of the token at `pos` and its kind. Always consumes at least one char.
fn next_token(line: &str, pos: usize, state: &mut LineState) -> (usize, Option<TokenKind>) {
    let rest = &line[pos..];
    let one = char_len(rest);

    if rest.starts_with("//") {
        return (rest.len(), Some(TokenKind::Comment));
    }
    if rest.starts_with("/*") {
        state.in_comment = true;
        return (2, Some(TokenKind::Comment));
    }
    if state.in_comment {
        if rest.starts_with("*/") {
            state.in_comment = false;
            return (2, Some(TokenKind::Comment));
        }
        return (one, Some(TokenKind::Comment));
    }

    if rest.starts_with('"') {
        state.in_string = !state.in_string;
        return (1, Some(TokenKind::String));
    }
    if state.in_string {
        if rest.starts_with("\\\"") {
            return (2, Some(TokenKind::String));
        }
        return (one, Some(TokenKind::String));
    }

    if rest.starts_with('$') {
        state.in_math = !state.in_math;
        return (1, Some(TokenKind::Keyword));
    }
    if state.in_math {
        return (one, Some(TokenKind::Number));
    }

    if rest.starts_with("```") {
        state.in_code = !state.in_code;
        return (3, Some(TokenKind::Keyword));
    }

    if let Some(name) = rest.strip_prefix('#') {
        let ident = ident_len(name);
        if ident > 0 {
            let word = &name[..ident];
            if KEYWORDS.contains(&word) {
                return (1 + ident, Some(TokenKind::Keyword));
            }
            if name[ident..].starts_with('(') {
                return (1 + ident, Some(TokenKind::VariableSpecial));
            }
            return (1 + ident, Some(TokenKind::Builtin));
        }
    }

    if pos == 0 {
        if let Some(len) = header_len(rest) {
            return (len, Some(TokenKind::Header));
        }
    }

    if let Some(len) = delimited_len(rest, '*') {
        return (len, Some(TokenKind::Strong));
    }
    if let Some(len) = delimited_len(rest, '_') {
        return (len, Some(TokenKind::Emphasis));
    }

    if let Some(len) = number_len(rest) {
        return (len, Some(TokenKind::Number));
    }

    let ops = rest.bytes().take_while(|b| b"+-*/=<>!&|".contains(b)).count();
    if ops > 0 {
        return (ops, Some(TokenKind::Operator));
    }

    match rest.as_bytes()[0] {
        b'(' | b')' | b'[' | b']' | b'{' | b'}' => return (1, Some(TokenKind::Bracket)),
        b'.' | b',' | b';' | b':' => return (1, Some(TokenKind::Punctuation)),
        _ => {}
    }

    let ident = ident_len(rest);
    if ident > 0 {
        return (ident, Some(TokenKind::Variable));
    }

    (one, None)
}

fn char_len(s: &str) -> usize {
    s.chars().next().map_or(1, char::len_utf8)
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_ident_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Length of an ASCII identifier `[A-Za-z_][A-Za-z0-9_]*` at the start of `s`.
fn ident_len(s: &str) -> usize {
    let bytes = s.as_bytes();
    match bytes.first() {
        Some(&b) if is_ident_start(b) => 1 + bytes[1..].iter().take_while(|&&b| is_ident_continue(b)).count(),
        _ => 0,
    }
}

/// `=+` followed by one whitespace char.
fn header_len(s: &str) -> Option<usize> {
    let marks = s.bytes().take_while(|&b| b == b'=').count();
    if marks == 0 {
        return None;
    }
    let ws = s[marks..].chars().next().filter(|c| c.is_whitespace())?;
    Some(marks + ws.len_utf8())
}

/// `d X .. Y d` where the body holds no `d`, has at least two chars, and
/// neither starts nor ends with whitespace.
fn delimited_len(s: &str, delim: char) -> Option<usize> {
    let body_and_rest = s.strip_prefix(delim)?;
    let close = body_and_rest.find(delim)?;
    let body = &body_and_rest[..close];
    let mut chars = body.chars();
    let first = chars.next()?;
    let last = chars.next_back()?;
    if first.is_whitespace() || last.is_whitespace() {
        return None;
    }
    Some(delim.len_utf8() * 2 + body.len())
}

/// `-?\d*\.?\d+`, leftmost-longest.
fn number_len(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut i = usize::from(bytes.first() == Some(&b'-'));
    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let int_end = i;
    if bytes.get(i) == Some(&b'.') && bytes.get(i + 1).is_some_and(u8::is_ascii_digit) {
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        return Some(i);
    }
    (int_end > int_start).then_some(int_end)
}

#[cfg(test)]
#[path = "highlight_test.rs"]
mod tests;
