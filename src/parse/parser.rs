use crate::parse::ast::{Attr, AttrValue, ElementNode, Node};
use crate::parse::error::MarkupError;
use crate::parse::lexer::{Span, Token, TokenKind, lex};

/// Parse a returned-markup block into top-level nodes.
pub(crate) fn parse_markup(src: &str) -> Result<Vec<Node>, MarkupError> {
    let tokens = lex(src)?;
    let mut p = Parser {
        src,
        tokens,
        pos: 0,
    };
    let nodes = p.parse_children()?;
    if p.peek().kind != TokenKind::Eof {
        return Err(MarkupError::new(
            p.span().start,
            format!("unexpected {:?} at top level", p.peek().kind),
        ));
    }
    Ok(nodes)
}

/// Static literal carried by an expression, if any (`"x"`, `'x'`, `` `x` ``, numbers).
pub(crate) fn static_literal(expr: &str) -> Option<String> {
    let e = expr.trim();
    let bytes = e.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if first == last && matches!(first, b'"' | b'\'') {
            return Some(unescape(&e[1..e.len() - 1]));
        }
        if first == b'`' && last == b'`' && !e.contains("${") {
            return Some(unescape(&e[1..e.len() - 1]));
        }
    }
    if !e.is_empty() && e.parse::<f64>().is_ok() {
        return Some(e.to_owned());
    }
    None
}

fn is_comment(expr: &str) -> bool {
    let e = expr.trim();
    e.is_empty() || (e.starts_with("/*") && e.ends_with("*/"))
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

struct Parser<'a> {
    src: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn bump(&mut self) -> Token {
        let t = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        t
    }

    fn span(&self) -> Span {
        self.peek().span
    }

    fn expect(&mut self, kind: TokenKind) -> Result<(), MarkupError> {
        if self.peek().kind == kind {
            self.bump();
            Ok(())
        } else {
            Err(MarkupError::new(
                self.span().start,
                format!("expected {kind:?}, found {:?}", self.peek().kind),
            ))
        }
    }

    fn consume_name(&mut self) -> Option<String> {
        if let TokenKind::Name(n) = &self.peek().kind {
            let n = n.clone();
            self.bump();
            Some(n)
        } else {
            None
        }
    }

    /// Children until a closing tag or end of input.
    fn parse_children(&mut self) -> Result<Vec<Node>, MarkupError> {
        let mut out = Vec::new();
        loop {
            match &self.peek().kind {
                TokenKind::Eof | TokenKind::LtSlash => return Ok(out),
                TokenKind::Lt => out.push(Node::Element(self.parse_element()?)),
                TokenKind::Text(t) => {
                    let t = t.clone();
                    self.bump();
                    if !(t.trim().is_empty() && t.contains('\n')) {
                        out.push(Node::Text(t));
                    }
                }
                TokenKind::Expr(e) => {
                    let e = e.clone();
                    let span = self.span();
                    self.bump();
                    if let Some(lit) = static_literal(&e) {
                        out.push(Node::Text(lit));
                    } else if !is_comment(&e) {
                        out.push(Node::Opaque(self.src[span.start..span.end].to_owned()));
                    }
                }
                other => {
                    return Err(MarkupError::new(
                        self.span().start,
                        format!("unexpected {other:?} in content"),
                    ));
                }
            }
        }
    }

    fn parse_element(&mut self) -> Result<ElementNode, MarkupError> {
        let open = self.span();
        self.expect(TokenKind::Lt)?;
        let tag = self.consume_name().unwrap_or_default();
        let attrs = self.parse_attrs()?;

        if self.peek().kind == TokenKind::SlashGt {
            self.bump();
            return Ok(ElementNode {
                tag,
                attrs,
                children: Vec::new(),
            });
        }
        self.expect(TokenKind::Gt)?;

        let children = self.parse_children()?;
        if self.peek().kind != TokenKind::LtSlash {
            return Err(MarkupError::new(
                open.start,
                format!("unclosed <{tag}>"),
            ));
        }
        let close = self.span();
        self.bump();
        let closing = self.consume_name().unwrap_or_default();
        if closing != tag {
            return Err(MarkupError::new(
                close.start,
                format!("mismatched closing tag </{closing}> for <{tag}>"),
            ));
        }
        self.expect(TokenKind::Gt)?;

        Ok(ElementNode {
            tag,
            attrs,
            children,
        })
    }

    fn parse_attrs(&mut self) -> Result<Vec<Attr>, MarkupError> {
        let mut attrs = Vec::new();
        loop {
            match &self.peek().kind {
                TokenKind::Name(n) => {
                    let name = n.clone();
                    self.bump();
                    if self.peek().kind != TokenKind::Eq {
                        attrs.push(Attr {
                            name,
                            value: AttrValue::Flag,
                        });
                        continue;
                    }
                    self.bump();
                    let value = match self.bump().kind {
                        TokenKind::Str(s) => AttrValue::Static(s),
                        TokenKind::Expr(e) => match static_literal(&e) {
                            Some(s) => AttrValue::Static(s),
                            None => AttrValue::Opaque(format!("{{{e}}}")),
                        },
                        other => {
                            return Err(MarkupError::new(
                                self.span().start,
                                format!("expected attribute value, found {other:?}"),
                            ));
                        }
                    };
                    attrs.push(Attr { name, value });
                }
                TokenKind::Expr(e) => {
                    let raw = format!("{{{e}}}");
                    self.bump();
                    attrs.push(Attr {
                        name: "...".to_owned(),
                        value: AttrValue::Opaque(raw),
                    });
                }
                _ => return Ok(attrs),
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/parse/parser.rs"]
mod tests;
