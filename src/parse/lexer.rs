use crate::parse::error::MarkupError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Span {
    pub(crate) start: usize,
    pub(crate) end: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub(crate) kind: TokenKind,
    pub(crate) span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    /// `<`
    Lt,
    /// `</`
    LtSlash,
    /// `>`
    Gt,
    /// `/>`
    SlashGt,
    Eq,
    Name(String),
    Str(String),
    /// Raw contents of a balanced `{...}`.
    Expr(String),
    Text(String),
    Eof,
}

/// Tokenize a returned-markup block.
///
/// The lexer has two modes: content (text runs, `{...}` expressions, tag openers) and
/// tag (names, `=`, quoted strings, expressions, tag closers).
pub(crate) fn lex(input: &str) -> Result<Vec<Token>, MarkupError> {
    let mut out = Vec::new();
    let bytes = input.as_bytes();
    let mut i = 0usize;
    let mut in_tag = false;

    while i < bytes.len() {
        let c = bytes[i];
        let start = i;

        if !in_tag {
            match c {
                b'<' => {
                    if bytes.get(i + 1) == Some(&b'/') {
                        i += 2;
                        push(&mut out, TokenKind::LtSlash, start, i);
                    } else {
                        i += 1;
                        push(&mut out, TokenKind::Lt, start, i);
                    }
                    in_tag = true;
                }
                b'{' => {
                    let end = balanced_brace(input, i)?;
                    push(
                        &mut out,
                        TokenKind::Expr(input[i + 1..end].to_owned()),
                        start,
                        end + 1,
                    );
                    i = end + 1;
                }
                _ => {
                    while i < bytes.len() && bytes[i] != b'<' && bytes[i] != b'{' {
                        i += 1;
                    }
                    push(
                        &mut out,
                        TokenKind::Text(input[start..i].to_owned()),
                        start,
                        i,
                    );
                }
            }
            continue;
        }

        if c.is_ascii_whitespace() {
            i += 1;
            continue;
        }

        match c {
            b'>' => {
                i += 1;
                push(&mut out, TokenKind::Gt, start, i);
                in_tag = false;
            }
            b'/' if bytes.get(i + 1) == Some(&b'>') => {
                i += 2;
                push(&mut out, TokenKind::SlashGt, start, i);
                in_tag = false;
            }
            b'=' => {
                i += 1;
                push(&mut out, TokenKind::Eq, start, i);
            }
            b'"' | b'\'' => {
                let quote = c;
                i += 1;
                while i < bytes.len() && bytes[i] != quote {
                    i += 1;
                }
                if i >= bytes.len() {
                    return Err(MarkupError::new(start, "unterminated attribute string"));
                }
                push(
                    &mut out,
                    TokenKind::Str(input[start + 1..i].to_owned()),
                    start,
                    i + 1,
                );
                i += 1;
            }
            b'{' => {
                let end = balanced_brace(input, i)?;
                push(
                    &mut out,
                    TokenKind::Expr(input[i + 1..end].to_owned()),
                    start,
                    end + 1,
                );
                i = end + 1;
            }
            _ if is_name_byte(c) => {
                while i < bytes.len() && is_name_byte(bytes[i]) {
                    i += 1;
                }
                push(
                    &mut out,
                    TokenKind::Name(input[start..i].to_owned()),
                    start,
                    i,
                );
            }
            _ => {
                let ch = input[i..].chars().next().unwrap_or('?');
                return Err(MarkupError::new(
                    start,
                    format!("unexpected character '{ch}' inside tag"),
                ));
            }
        }
    }

    if in_tag {
        return Err(MarkupError::new(input.len(), "unterminated tag"));
    }

    out.push(Token {
        kind: TokenKind::Eof,
        span: Span {
            start: input.len(),
            end: input.len(),
        },
    });
    Ok(out)
}

fn push(out: &mut Vec<Token>, kind: TokenKind, start: usize, end: usize) {
    out.push(Token {
        kind,
        span: Span { start, end },
    });
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b':' | b'.' | b'$' | b'@')
}

/// Index of the `}` closing the `{` at `open`, skipping nested braces and string literals.
fn balanced_brace(input: &str, open: usize) -> Result<usize, MarkupError> {
    let bytes = input.as_bytes();
    let mut depth = 0usize;
    let mut i = open;
    while i < bytes.len() {
        match bytes[i] {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(i);
                }
            }
            q @ (b'"' | b'\'' | b'`') => {
                i += 1;
                while i < bytes.len() && bytes[i] != q {
                    if bytes[i] == b'\\' {
                        i += 1;
                    }
                    i += 1;
                }
                if i >= bytes.len() {
                    return Err(MarkupError::new(open, "unterminated string in expression"));
                }
            }
            _ => {}
        }
        i += 1;
    }
    Err(MarkupError::new(open, "unterminated '{' expression"))
}
