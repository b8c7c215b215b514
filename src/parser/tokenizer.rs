//! Splits template text into literal and expression spans.

use super::cursor::Cursor;
use crate::constants::{
    CLOSE_MARKER, LONG_COMMENT_CLOSE, LONG_COMMENT_OPEN, OPEN_MARKER, TRIM_MARKER,
};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Literal,
    Expression,
}

/// One span of the template. Expression tokens keep their delimiters in
/// `text`, so concatenating every token's text gives back the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub offset: usize,
}

impl<'a> Token<'a> {
    fn literal(text: &'a str, offset: usize) -> Self {
        Self { kind: TokenKind::Literal, text, offset }
    }

    fn expression(text: &'a str, offset: usize) -> Self {
        Self { kind: TokenKind::Expression, text, offset }
    }

    pub fn is_literal(&self) -> bool {
        self.kind == TokenKind::Literal
    }

    /// Text between the delimiters with whitespace-control markers removed.
    pub fn content(&self) -> &'a str {
        let inner = self.inner();
        let inner = inner.strip_prefix(TRIM_MARKER).unwrap_or(inner);
        inner.strip_suffix(TRIM_MARKER).unwrap_or(inner)
    }

    /// Absolute offset of the first byte of [`Token::content`].
    pub fn content_offset(&self) -> usize {
        let skipped = usize::from(self.inner().starts_with(TRIM_MARKER));
        self.offset + OPEN_MARKER.len() + skipped
    }

    /// `{{~ ...`: strip whitespace at the end of the preceding literal.
    pub fn trims_before(&self) -> bool {
        !self.is_literal() && self.inner().starts_with(TRIM_MARKER)
    }

    /// `... ~}}`: strip whitespace at the start of the following literal.
    pub fn trims_after(&self) -> bool {
        !self.is_literal() && self.inner().len() > 1 && self.inner().ends_with(TRIM_MARKER)
    }

    /// Tags that produce no output of their own and may stand alone on a line.
    pub fn is_structural(&self) -> bool {
        if self.is_literal() {
            return false;
        }
        let content = self.content().trim();
        content == "else"
            || content.starts_with(['#', '^', '/', '!'])
    }

    fn inner(&self) -> &'a str {
        match self.kind {
            TokenKind::Literal => self.text,
            TokenKind::Expression => {
                let text = self.text.strip_prefix(OPEN_MARKER).unwrap_or(self.text);
                text.strip_suffix(CLOSE_MARKER).unwrap_or(text)
            }
        }
    }
}

/// Splits `template` into an ordered, gap-free sequence of tokens.
///
/// An opening marker without a matching closing marker is a parse error at
/// the opening marker's offset.
pub fn scan(template: &str) -> Result<Vec<Token<'_>>> {
    let mut cursor = Cursor::new(template);
    let mut tokens = Vec::new();

    loop {
        let start = cursor.pos();
        let Some(open) = cursor.seek(OPEN_MARKER) else {
            if !cursor.is_eof() {
                tokens.push(Token::literal(cursor.rest(), start));
            }
            break;
        };
        if open > start {
            tokens.push(Token::literal(cursor.slice(start, open), start));
        }

        let (open_len, close_marker) = if cursor.starts_with(LONG_COMMENT_OPEN) {
            (LONG_COMMENT_OPEN.len(), LONG_COMMENT_CLOSE)
        } else {
            (OPEN_MARKER.len(), CLOSE_MARKER)
        };
        cursor.advance(open_len);
        if cursor.seek(close_marker).is_none() {
            return Err(Error::parse(open, "unterminated expression"));
        }
        cursor.advance(close_marker.len());
        tokens.push(Token::expression(cursor.slice(open, cursor.pos()), open));
    }

    Ok(tokens)
}

/// Applies `~` markers and, when `standalone` is set, removes the line of
/// any structural tag that is alone on it.
///
/// Only literal tokens are shortened; the decisions are taken on the
/// untrimmed text so adjacent tags do not influence each other.
pub fn apply_whitespace_control(tokens: &mut [Token<'_>], standalone: bool) {
    let mut bounds: Vec<(usize, usize)> = tokens.iter().map(|t| (0, t.text.len())).collect();
    let last = tokens.len().saturating_sub(1);

    for (i, token) in tokens.iter().enumerate() {
        if token.is_literal() {
            continue;
        }
        let prev = i.checked_sub(1).map(|p| &tokens[p]).filter(|t| t.is_literal());
        let next = tokens.get(i + 1).filter(|t| t.is_literal());

        if token.trims_before() {
            if let Some(prev) = prev {
                bounds[i - 1].1 = bounds[i - 1].1.min(prev.text.trim_end().len());
            }
        }
        if token.trims_after() {
            if let Some(next) = next {
                let start = next.text.len() - next.text.trim_start().len();
                bounds[i + 1].0 = bounds[i + 1].0.max(start);
            }
        }

        if !standalone || !token.is_structural() {
            continue;
        }
        let line_start = match prev {
            None if i == 0 => Some(0),
            None => None,
            Some(prev) => {
                let tail_start = prev.text.rfind('\n').map_or(0, |n| n + 1);
                let blank = prev.text[tail_start..].chars().all(char::is_whitespace);
                (blank && (tail_start > 0 || i == 1)).then_some(tail_start)
            }
        };
        let line_end = match next {
            None if i == last => Some(0),
            None => None,
            Some(next) => match next.text.find('\n') {
                Some(n) if next.text[..n].chars().all(char::is_whitespace) => Some(n + 1),
                None if i + 1 == last && next.text.chars().all(char::is_whitespace) => {
                    Some(next.text.len())
                }
                _ => None,
            },
        };
        if let (Some(line_start), Some(line_end)) = (line_start, line_end) {
            if prev.is_some() {
                bounds[i - 1].1 = bounds[i - 1].1.min(line_start);
            }
            if next.is_some() {
                bounds[i + 1].0 = bounds[i + 1].0.max(line_end);
            }
        }
    }

    for (token, (start, end)) in tokens.iter_mut().zip(bounds) {
        if !token.is_literal() {
            continue;
        }
        let end = end.max(start);
        token.text = &token.text[start..end];
        token.offset += start;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts<'a>(tokens: &[Token<'a>]) -> Vec<&'a str> {
        tokens.iter().map(|t| t.text).collect()
    }

    #[test]
    fn test_scan_literal_only() {
        let tokens = scan("plain text").unwrap();
        assert_eq!(tokens, vec![Token::literal("plain text", 0)]);
    }

    #[test]
    fn test_scan_empty() {
        assert!(scan("").unwrap().is_empty());
    }

    #[test]
    fn test_scan_is_gap_free() {
        let source = "Hi {{name}}, you are {{ age }}!{{#if x}}y{{/if}}";
        let tokens = scan(source).unwrap();
        assert_eq!(tokens.iter().map(|t| t.text).collect::<String>(), source);
        assert_eq!(tokens[1].offset, 3);
        assert_eq!(tokens[1].content(), "name");
        assert_eq!(tokens[3].content(), " age ");
    }

    #[test]
    fn test_scan_unterminated_expression() {
        let err = scan("abc {{ name").unwrap_err();
        assert_eq!(err.offset(), Some(4));
    }

    #[test]
    fn test_scan_long_comment_may_contain_close_marker() {
        let tokens = scan("a{{!-- {{x}} --}}b").unwrap();
        assert_eq!(texts(&tokens), vec!["a", "{{!-- {{x}} --}}", "b"]);
        assert!(tokens[1].is_structural());
    }

    #[test]
    fn test_trim_markers() {
        let mut tokens = scan("a  {{~x~}}  b").unwrap();
        assert!(tokens[1].trims_before());
        assert!(tokens[1].trims_after());
        assert_eq!(tokens[1].content(), "x");
        apply_whitespace_control(&mut tokens, false);
        assert_eq!(texts(&tokens), vec!["a", "{{~x~}}", "b"]);
        assert_eq!(tokens[2].offset, 12);
    }

    #[test]
    fn test_standalone_lines_removed() {
        let source = "list:\n  {{#each items}}\n- {{this}}\n  {{/each}}\ndone";
        let mut tokens = scan(source).unwrap();
        apply_whitespace_control(&mut tokens, true);
        assert_eq!(
            texts(&tokens),
            vec!["list:\n", "{{#each items}}", "- ", "{{this}}", "\n", "{{/each}}", "done"]
        );
    }

    #[test]
    fn test_inline_tags_are_not_standalone() {
        let source = "a {{#if x}}b{{/if}}\n";
        let mut tokens = scan(source).unwrap();
        apply_whitespace_control(&mut tokens, true);
        assert_eq!(tokens.iter().map(|t| t.text).collect::<String>(), source);
    }

    #[test]
    fn test_standalone_disabled_keeps_text() {
        let source = "{{#if x}}\nA\n{{/if}}\n";
        let mut tokens = scan(source).unwrap();
        apply_whitespace_control(&mut tokens, false);
        assert_eq!(tokens.iter().map(|t| t.text).collect::<String>(), source);
    }
}
