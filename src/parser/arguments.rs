//! Splits argument lists into typed arguments and nested helper calls.

use super::cursor::Cursor;
use crate::error::{Error, Result};
use crate::helpers::HelperRegistry;
use crate::value::parse_number;
use log::trace;
use serde_json::Number;

/// One parsed argument.
///
/// Literals are typed here; variables are kept as paths and resolved against
/// the scope chain when the expression is evaluated.
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    Number(Number),
    String(String),
    Bool(bool),
    Null,
    Undefined,
    Variable(String),
    HelperCall(HelperCall),
}

/// A helper invocation with its unevaluated arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct HelperCall {
    pub name: String,
    pub args: Vec<Argument>,
    /// Absolute offset of the helper name in the template.
    pub offset: usize,
}

/// A raw argument token and its absolute offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RawArgument<'a> {
    text: &'a str,
    offset: usize,
}

/// Parses argument lists. Helper names are checked against `registry` to
/// find call boundaries, so the same text may split differently once more
/// helpers are registered.
#[derive(Clone, Copy)]
pub struct ArgumentParser<'r> {
    registry: &'r HelperRegistry,
    max_depth: usize,
}

impl<'r> ArgumentParser<'r> {
    pub fn new(registry: &'r HelperRegistry, max_depth: usize) -> Self {
        Self { registry, max_depth }
    }

    /// Parses `text` (located at absolute `offset`) into arguments.
    ///
    /// `depth` is the helper-call nesting level of `text`; exceeding the
    /// configured maximum is a parse error.
    pub fn parse(&self, text: &str, offset: usize, depth: usize) -> Result<Vec<Argument>> {
        if depth > self.max_depth {
            return Err(Error::parse(
                offset,
                format!("helper calls nested deeper than {}", self.max_depth),
            ));
        }
        self.split(text, offset)?
            .into_iter()
            .map(|raw| self.classify(raw, depth))
            .collect()
    }

    /// Parses the argument text of a call to `name` into a [`HelperCall`].
    pub fn call(
        &self,
        name: &str,
        offset: usize,
        args: &str,
        args_offset: usize,
        depth: usize,
    ) -> Result<HelperCall> {
        let args = self.parse(args, args_offset, depth + 1)?;
        Ok(HelperCall { name: name.to_string(), args, offset })
    }

    /// Splits at whitespace outside quotes and parenthesis groups. A group
    /// opened right after a registered helper name ends its token when it
    /// closes, so sibling calls need no separating space.
    fn split<'t>(&self, text: &'t str, offset: usize) -> Result<Vec<RawArgument<'t>>> {
        let mut cursor = Cursor::with_base(text, offset);
        let mut tokens = Vec::new();

        loop {
            cursor.skip_whitespace();
            if cursor.is_eof() {
                break;
            }
            let start = cursor.pos();
            let mut groups: Vec<usize> = Vec::new();
            let mut call_open = false;

            while let Some(c) = cursor.peek() {
                match c {
                    '"' | '\'' => skip_quoted(&mut cursor)?,
                    '(' => {
                        if groups.is_empty() {
                            let head = cursor.slice(start, cursor.pos());
                            call_open = is_identifier(head) && self.registry.has(head);
                        }
                        groups.push(cursor.pos());
                        cursor.bump();
                    }
                    ')' => {
                        if groups.pop().is_none() {
                            return Err(Error::parse(cursor.offset(), "unbalanced ')'"));
                        }
                        cursor.bump();
                        if groups.is_empty() && call_open {
                            break;
                        }
                    }
                    c if c.is_whitespace() && groups.is_empty() => break,
                    _ => {
                        cursor.bump();
                    }
                }
            }

            if let Some(open) = groups.first() {
                return Err(Error::parse(cursor.offset_of(*open), "unclosed '('"));
            }
            tokens.push(RawArgument {
                text: cursor.slice(start, cursor.pos()),
                offset: cursor.offset_of(start),
            });
        }

        Ok(tokens)
    }

    /// Types one raw token. Order: number, quoted string, boolean, null,
    /// undefined, nested call, parenthesised literal text, variable path.
    fn classify(&self, raw: RawArgument<'_>, depth: usize) -> Result<Argument> {
        let text = raw.text;
        if let Some(serde_json::Value::Number(n)) = parse_number(text) {
            return Ok(Argument::Number(n));
        }
        if let Some(s) = unquote(text) {
            return Ok(Argument::String(s));
        }
        match text {
            "true" => return Ok(Argument::Bool(true)),
            "false" => return Ok(Argument::Bool(false)),
            "null" => return Ok(Argument::Null),
            "undefined" => return Ok(Argument::Undefined),
            _ => {}
        }

        if let Some(call) = self.nested_call(raw, depth)? {
            trace!("Nested call to '{}' at offset {}", call.name, call.offset);
            return Ok(Argument::HelperCall(call));
        }
        if text.contains(['(', ')']) {
            return Ok(Argument::String(text.to_string()));
        }
        Ok(Argument::Variable(text.to_string()))
    }

    /// Recognises `name(args)` and `(name args)` where `name` is registered.
    fn nested_call(&self, raw: RawArgument<'_>, depth: usize) -> Result<Option<HelperCall>> {
        let text = raw.text;

        if let Some((name, inner, inner_start)) = split_functional(text) {
            if !self.registry.has(name) {
                return Ok(None);
            }
            return self
                .call(name, raw.offset, inner, raw.offset + inner_start, depth)
                .map(Some);
        }

        if text.starts_with('(') && find_matching_paren(text, 0) == Some(text.len() - 1) {
            let inner = &text[1..text.len() - 1];
            let leading = inner.len() - inner.trim_start().len();
            let body = inner.trim_start();
            let name = leading_identifier(body);
            let rest = &body[name.len()..];
            let separated = rest.is_empty() || rest.starts_with(char::is_whitespace);
            if !name.is_empty() && separated && self.registry.has(name) {
                let name_offset = raw.offset + 1 + leading;
                let rest_offset = name_offset + name.len();
                return self.call(name, name_offset, rest, rest_offset, depth).map(Some);
            }
        }

        Ok(None)
    }
}

/// Consumes a quoted string starting at the cursor, including both quotes.
fn skip_quoted(cursor: &mut Cursor<'_>) -> Result<()> {
    let start = cursor.offset();
    let Some(quote) = cursor.bump() else {
        return Ok(());
    };
    loop {
        match cursor.bump() {
            None => return Err(Error::parse(start, "unterminated string literal")),
            Some('\\') => {
                cursor.bump();
            }
            Some(c) if c == quote => return Ok(()),
            Some(_) => {}
        }
    }
}

/// Returns the unescaped contents of a token that is exactly one quoted
/// string.
fn unquote(text: &str) -> Option<String> {
    let quote = text.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let mut out = String::with_capacity(text.len());
    let mut chars = text[1..].char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => match chars.next()?.1 {
                'n' => out.push('\n'),
                't' => out.push('\t'),
                other => out.push(other),
            },
            c if c == quote => return (i + 2 == text.len()).then_some(out),
            c => out.push(c),
        }
    }
    None
}

/// Index of the `)` matching the `(` at byte `open`, skipping quoted text.
pub(crate) fn find_matching_paren(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (i, c) in text[open..].char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '(' => depth += 1,
            ')' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(open + i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Splits `name(inner)` where the closing parenthesis ends the text. Returns
/// the name, the inner text and the byte position of the inner text.
pub(crate) fn split_functional(text: &str) -> Option<(&str, &str, usize)> {
    let name = leading_identifier(text);
    if name.is_empty() || !text[name.len()..].starts_with('(') {
        return None;
    }
    let close = find_matching_paren(text, name.len())?;
    (close == text.len() - 1).then(|| (name, &text[name.len() + 1..close], name.len() + 1))
}

fn is_identifier_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$' || c == '-'
}

pub(crate) fn is_identifier(text: &str) -> bool {
    !text.is_empty() && leading_identifier(text).len() == text.len()
}

/// Longest identifier prefix of `text` (empty if there is none).
pub(crate) fn leading_identifier(text: &str) -> &str {
    let mut chars = text.char_indices();
    match chars.next() {
        Some((_, c)) if is_identifier_start(c) => {}
        _ => return "",
    }
    let end = chars
        .find(|(_, c)| !is_identifier_char(*c))
        .map_or(text.len(), |(i, _)| i);
    &text[..end]
}

/// Longest variable-path prefix of `text`: identifiers joined by `.`, with
/// optional `../` and `@` prefixes.
pub(crate) fn leading_path(text: &str) -> &str {
    let end = text
        .char_indices()
        .find(|(_, c)| !(is_identifier_char(*c) || matches!(c, '.' | '/' | '@')))
        .map_or(text.len(), |(i, _)| i);
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(text: &str) -> Result<Vec<Argument>> {
        let registry = HelperRegistry::with_builtins();
        ArgumentParser::new(&registry, 8).parse(text, 0, 0)
    }

    fn number(v: serde_json::Value) -> Argument {
        match v {
            serde_json::Value::Number(n) => Argument::Number(n),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_literal_coercion_order() {
        let args = parse(r#"42 -1.5 "two words" 'single' true false null undefined name.first"#)
            .unwrap();
        assert_eq!(
            args,
            vec![
                number(json!(42)),
                number(json!(-1.5)),
                Argument::String("two words".into()),
                Argument::String("single".into()),
                Argument::Bool(true),
                Argument::Bool(false),
                Argument::Null,
                Argument::Undefined,
                Argument::Variable("name.first".into()),
            ]
        );
    }

    #[test]
    fn test_escapes_in_strings() {
        let args = parse(r#""say \"hi\"\n" 'it\'s'"#).unwrap();
        assert_eq!(
            args,
            vec![Argument::String("say \"hi\"\n".into()), Argument::String("it's".into())]
        );
    }

    #[test]
    fn test_functional_nested_calls() {
        let args = parse("multiply(2 3) 4").unwrap();
        let Argument::HelperCall(call) = &args[0] else {
            panic!("expected a call, got {args:?}");
        };
        assert_eq!(call.name, "multiply");
        assert_eq!(call.args, vec![number(json!(2)), number(json!(3))]);
        assert_eq!(call.offset, 0);
        assert_eq!(args[1], number(json!(4)));
    }

    #[test]
    fn test_sibling_calls_without_space() {
        let args = parse("uppercase(a)lowercase(b)").unwrap();
        assert_eq!(args.len(), 2);
        assert!(matches!(&args[0], Argument::HelperCall(c) if c.name == "uppercase"));
        assert!(matches!(&args[1], Argument::HelperCall(c) if c.name == "lowercase" && c.offset == 12));
    }

    #[test]
    fn test_subexpression_syntax() {
        let args = parse("(add 1 (multiply 2 3))").unwrap();
        let Argument::HelperCall(call) = &args[0] else {
            panic!("expected a call, got {args:?}");
        };
        assert_eq!(call.name, "add");
        assert_eq!(call.offset, 1);
        assert!(matches!(&call.args[1], Argument::HelperCall(c) if c.name == "multiply"));
    }

    #[test]
    fn test_unknown_group_is_literal_text() {
        let args = parse("note(draft one) x").unwrap();
        assert_eq!(
            args,
            vec![Argument::String("note(draft one)".into()), Argument::Variable("x".into())]
        );
    }

    #[test]
    fn test_prefix_of_helper_name_is_not_a_call() {
        let args = parse("adder(1 2)").unwrap();
        assert_eq!(args, vec![Argument::String("adder(1 2)".into())]);
    }

    #[test]
    fn test_quoted_parenthesis_does_not_count() {
        let args = parse(r#"concat(")" "(")"#).unwrap();
        let Argument::HelperCall(call) = &args[0] else {
            panic!("expected a call, got {args:?}");
        };
        assert_eq!(
            call.args,
            vec![Argument::String(")".into()), Argument::String("(".into())]
        );
    }

    #[test]
    fn test_unbalanced_parentheses() {
        assert_eq!(parse("add(1 2").unwrap_err().offset(), Some(3));
        assert_eq!(parse("a)").unwrap_err().offset(), Some(1));
    }

    #[test]
    fn test_unterminated_string() {
        assert_eq!(parse(r#"x "open"#).unwrap_err().offset(), Some(2));
    }

    #[test]
    fn test_depth_limit() {
        let text = "add(".repeat(10) + "1" + &")".repeat(10);
        let err = parse(&text).unwrap_err();
        assert!(err.to_string().contains("nested deeper"));
    }

    #[test]
    fn test_empty_argument_list() {
        assert!(parse("   ").unwrap().is_empty());
    }

    #[test]
    fn test_identifier_helpers() {
        assert_eq!(leading_identifier("snake_case(x)"), "snake_case");
        assert_eq!(leading_identifier("9abc"), "");
        assert_eq!(leading_path("../user.name rest"), "../user.name");
        assert_eq!(leading_path("@index}"), "@index");
        assert_eq!(split_functional("add(1 (2))"), Some(("add", "1 (2)", 4)));
        assert_eq!(split_functional("add(1) 2"), None);
        assert_eq!(find_matching_paren("(a(b)c)", 0), Some(6));
    }
}
