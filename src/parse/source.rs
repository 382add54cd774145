use std::path::Path;

use anyhow::Context;

use crate::foundation::error::SlideResult;

/// One generator-emitted file representing a single slide.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceUnit {
    /// Logical path, e.g. `/slides/001.tsx`.
    pub path: String,
    /// Raw source text.
    pub text: String,
}

impl SourceUnit {
    pub fn new(path: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }

    /// Whether the unit lives under the `slides/` namespace.
    pub fn is_slide(&self) -> bool {
        let p = self.path.trim_start_matches('/');
        p.starts_with("slides/") && p.len() > "slides/".len()
    }
}

/// Sort units by path (byte-wise lexicographic); ties keep input order.
pub fn sort_units(units: &mut [SourceUnit]) {
    units.sort_by(|a, b| a.path.cmp(&b.path));
}

/// Collect every regular file under `<root>/slides/` as a source unit.
pub fn collect_slides_dir(root: &Path) -> SlideResult<Vec<SourceUnit>> {
    let slides = root.join("slides");
    let mut out = Vec::new();
    let mut stack = vec![slides.clone()];
    while let Some(dir) = stack.pop() {
        let entries =
            std::fs::read_dir(&dir).with_context(|| format!("read dir '{}'", dir.display()))?;
        for entry in entries {
            let entry = entry.with_context(|| format!("read dir entry in '{}'", dir.display()))?;
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
                continue;
            }
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("read slide source '{}'", path.display()))?;
            let rel = path
                .strip_prefix(root)
                .with_context(|| format!("slide path '{}' outside root", path.display()))?;
            let logical = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/");
            out.push(SourceUnit::new(format!("/{logical}"), text));
        }
    }
    sort_units(&mut out);
    Ok(out)
}

/// Returned-markup blocks found in one source unit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ReturnBlocks<'a> {
    /// Body of the first block (parentheses stripped).
    pub(crate) first: Option<&'a str>,
    /// Byte offset of `first` within the source.
    pub(crate) offset: usize,
    /// Number of markup-returning `return` statements seen.
    pub(crate) count: usize,
}

/// Find every `return (`/`return <` outside strings and comments.
pub(crate) fn extract_return_blocks(src: &str) -> ReturnBlocks<'_> {
    let bytes = src.as_bytes();
    let mut i = 0usize;
    let mut first = None;
    let mut offset = 0usize;
    let mut count = 0usize;

    while i < bytes.len() {
        match bytes[i] {
            b'"' | b'\'' | b'`' => {
                i = skip_string(bytes, i);
                continue;
            }
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
                continue;
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = skip_block_comment(bytes, i);
                continue;
            }
            _ => {}
        }

        if is_keyword_at(bytes, i, b"return") {
            let mut j = i + "return".len();
            while j < bytes.len() && bytes[j].is_ascii_whitespace() {
                j += 1;
            }
            let body = match bytes.get(j) {
                Some(b'(') => balanced_parens(bytes, j, true)
                    .or_else(|| balanced_parens(bytes, j, false))
                    .map(|end| (j + 1, end)),
                Some(b'<') => Some((j, statement_end(bytes, j))),
                _ => None,
            };
            if let Some((start, end)) = body {
                count += 1;
                if first.is_none() {
                    first = src.get(start..end);
                    offset = start;
                }
                i = end;
                continue;
            }
            i = j;
            continue;
        }
        i += 1;
    }

    ReturnBlocks {
        first,
        offset,
        count,
    }
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

fn is_keyword_at(bytes: &[u8], i: usize, kw: &[u8]) -> bool {
    bytes[i..].starts_with(kw)
        && (i == 0 || !is_ident_byte(bytes[i - 1]))
        && bytes.get(i + kw.len()).is_none_or(|b| !is_ident_byte(*b))
}

fn skip_string(bytes: &[u8], start: usize) -> usize {
    let quote = bytes[start];
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b if b == quote => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

fn skip_block_comment(bytes: &[u8], start: usize) -> usize {
    let mut i = start + 2;
    while i + 1 < bytes.len() {
        if bytes[i] == b'*' && bytes[i + 1] == b'/' {
            return i + 2;
        }
        i += 1;
    }
    bytes.len()
}

/// Index of the `)` matching the `(` at `open`.
///
/// With `opaque_text`, parens are only counted outside markup: once an element opens,
/// its text content is skipped until the matching close tag. Without it, parens in text
/// count too, which still finds the block end when the markup itself is unbalanced.
/// Strings inside tags and expressions are skipped; apostrophes in markup text are not
/// treated as quotes.
fn balanced_parens(bytes: &[u8], open: usize, opaque_text: bool) -> Option<usize> {
    let mut depth = 0usize;
    let mut markup = 0usize;
    let mut brace = 0usize;
    // `Some(closing)` while inside a tag.
    let mut tag: Option<bool> = None;
    let mut i = open;
    while i < bytes.len() {
        let b = bytes[i];
        let code = tag.is_some() || brace > 0;
        let counted = !code && (markup == 0 || !opaque_text);
        match b {
            b'"' | b'\'' | b'`' if code => {
                i = skip_string(bytes, i);
                continue;
            }
            b'<' if brace == 0 && tag.is_none() => {
                tag = Some(bytes.get(i + 1) == Some(&b'/'));
            }
            b'>' if brace == 0 => {
                if let Some(closing) = tag.take() {
                    if closing {
                        markup = markup.saturating_sub(1);
                    } else if bytes[i - 1] != b'/' {
                        markup += 1;
                    }
                }
            }
            b'{' => brace += 1,
            b'}' => brace = brace.saturating_sub(1),
            b'(' if counted => depth += 1,
            b')' if counted => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

fn statement_end(bytes: &[u8], start: usize) -> usize {
    let mut i = start;
    let mut brace = 0usize;
    while i < bytes.len() {
        match bytes[i] {
            b'{' => brace += 1,
            b'}' if brace == 0 => return i,
            b'}' => brace -= 1,
            b';' if brace == 0 => return i,
            _ => {}
        }
        i += 1;
    }
    bytes.len()
}

#[cfg(test)]
#[path = "../../tests/unit/parse/source.rs"]
mod tests;
