//! Lightweight lexical scan of component source: tracks brace depth while
//! skipping comments, string literals and template literals.
//!
//! This is not a parser. JSX text is mostly treated as code; quotes are only
//! taken as string delimiters where a JS expression can start, and unterminated
//! single-line strings end at the newline.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Code,
    LineComment,
    BlockComment,
    Str(u8),
    Template,
}

/// Words after which a quote opens a string literal.
const EXPRESSION_KEYWORDS: &[&[u8]] = &[
    b"return", b"case", b"typeof", b"in", b"of", b"void", b"yield", b"await", b"else", b"do",
    b"throw", b"new", b"delete",
];

/// Per-byte brace depth. `None` marks bytes inside comments or literals.
#[derive(Debug, Clone)]
pub struct DepthMap {
    depths: Vec<Option<usize>>,
}

impl DepthMap {
    pub fn scan(text: &str) -> Self {
        let bytes = text.as_bytes();
        let mut depths = Vec::with_capacity(bytes.len());
        let mut state = State::Code;
        let mut depth: usize = 0;
        // Brace depth at which each open `${` resumes its template literal.
        let mut templates: Vec<usize> = Vec::new();
        let mut i = 0;

        while i < bytes.len() {
            let b = bytes[i];
            let next = bytes.get(i + 1).copied();
            match state {
                State::Code => {
                    depths.push(Some(depth));
                    match b {
                        b'/' if next == Some(b'/') => state = State::LineComment,
                        b'/' if next == Some(b'*') => {
                            depths.push(None);
                            i += 1;
                            state = State::BlockComment;
                        }
                        b'\'' | b'"' if opens_literal(bytes, i) => state = State::Str(b),
                        b'`' => state = State::Template,
                        b'{' => depth += 1,
                        b'}' => {
                            if templates.last() == Some(&depth) {
                                templates.pop();
                                state = State::Template;
                            } else {
                                depth = depth.saturating_sub(1);
                            }
                        }
                        _ => {}
                    }
                }
                State::LineComment => {
                    if b == b'\n' {
                        depths.push(Some(depth));
                        state = State::Code;
                    } else {
                        depths.push(None);
                    }
                }
                State::BlockComment => {
                    depths.push(None);
                    if b == b'*' && next == Some(b'/') {
                        depths.push(None);
                        i += 1;
                        state = State::Code;
                    }
                }
                State::Str(quote) => {
                    depths.push(None);
                    if b == b'\\' && next.is_some() {
                        depths.push(None);
                        i += 1;
                    } else if b == quote || b == b'\n' {
                        state = State::Code;
                    }
                }
                State::Template => {
                    depths.push(None);
                    if b == b'\\' && next.is_some() {
                        depths.push(None);
                        i += 1;
                    } else if b == b'`' {
                        state = State::Code;
                    } else if b == b'$' && next == Some(b'{') {
                        depths.push(None);
                        i += 1;
                        templates.push(depth);
                        state = State::Code;
                    }
                }
            }
            i += 1;
        }

        Self { depths }
    }

    /// Brace depth at byte `offset`, or `None` inside a comment or literal.
    pub fn depth_at(&self, offset: usize) -> Option<usize> {
        self.depths.get(offset).copied().flatten()
    }

    pub fn is_top_level(&self, offset: usize) -> bool {
        self.depth_at(offset) == Some(0)
    }
}

/// A quote opens a literal when the previous significant byte can precede an expression.
fn opens_literal(bytes: &[u8], quote_at: usize) -> bool {
    let mut j = quote_at;
    while j > 0 && bytes[j - 1].is_ascii_whitespace() {
        j -= 1;
    }
    if j == 0 {
        return true;
    }
    let prev = bytes[j - 1];
    if b"=(,:[!&|?{;+-*%<>~^".contains(&prev) {
        return true;
    }
    if prev.is_ascii_alphanumeric() || prev == b'_' || prev == b'$' {
        let end = j;
        let mut start = j;
        while start > 0 && (bytes[start - 1].is_ascii_alphanumeric() || bytes[start - 1] == b'_') {
            start -= 1;
        }
        return EXPRESSION_KEYWORDS.contains(&&bytes[start..end]);
    }
    false
}
