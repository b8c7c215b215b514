//! Classifies the content of one expression span.

use super::arguments::{
    find_matching_paren, is_identifier, leading_identifier, leading_path, Argument,
    ArgumentParser, HelperCall,
};
use crate::constants::blocks::ELSE;
use crate::error::{Error, Result};
use crate::helpers::HelperRegistry;
use log::trace;

/// A parsed expression span.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// `{{path}}`
    Variable(String),
    /// `{{name args}}` or `{{name(args)}}`
    HelperCall(HelperCall),
    /// `{{#name args}}`, or `{{^name args}}` when inverted
    BlockOpen { name: String, args: Vec<Argument>, inverted: bool },
    /// `{{/name}}`
    BlockClose(String),
    /// `{{else}}` or `{{^}}`
    Else,
    /// `{{> name}}` or `{{> name context}}`
    Partial { name: String, context: Option<Argument> },
    /// `{{! ... }}` and `{{!-- ... --}}`
    Comment,
}

pub struct ExpressionParser<'r> {
    registry: &'r HelperRegistry,
    arguments: ArgumentParser<'r>,
}

impl<'r> ExpressionParser<'r> {
    pub fn new(registry: &'r HelperRegistry, max_depth: usize) -> Self {
        Self { registry, arguments: ArgumentParser::new(registry, max_depth) }
    }

    /// Parses the text between the delimiters. `offset` is the absolute
    /// position of `content` in the template.
    pub fn parse(&self, content: &str, offset: usize) -> Result<Expression> {
        let leading = content.len() - content.trim_start().len();
        let text = content.trim();
        let offset = offset + leading;

        let expression = match text.chars().next() {
            None => return Err(Error::parse(offset, "empty expression")),
            Some('!') => Expression::Comment,
            Some('^') if text == "^" => Expression::Else,
            Some(marker @ ('#' | '^')) => {
                self.parse_block_open(&text[1..], offset + 1, marker == '^')?
            }
            Some('/') => {
                let name = text[1..].trim();
                if !is_identifier(name) {
                    return Err(Error::parse(offset, "expected a block name after '/'"));
                }
                Expression::BlockClose(name.to_string())
            }
            Some('>') => self.parse_partial(&text[1..], offset + 1)?,
            Some(_) if text == ELSE => Expression::Else,
            Some(_) => self.parse_value(text, offset)?,
        };

        trace!("Parsed expression at offset {offset}: {expression:?}");
        Ok(expression)
    }

    /// Parses a whole expression as a helper call or a variable; used for
    /// the inline form and for standalone expression evaluation.
    pub fn parse_value(&self, text: &str, offset: usize) -> Result<Expression> {
        let name = leading_path(text);
        if name.is_empty() {
            return Err(Error::parse(offset, "expected a variable or helper name"));
        }
        let rest = &text[name.len()..];

        if rest.starts_with('(') {
            if !is_identifier(name) {
                return Err(Error::parse(offset + name.len(), "unexpected '('"));
            }
            let close = find_matching_paren(text, name.len()).ok_or_else(|| {
                Error::parse(offset + name.len(), "unbalanced parentheses")
            })?;
            self.ensure_helper(name)?;
            // `name(...)` followed by more text is a traditional call whose
            // first argument is the parenthesised group.
            let call = if close == text.len() - 1 {
                let inner = &text[name.len() + 1..close];
                self.arguments.call(name, offset, inner, offset + name.len() + 1, 0)?
            } else {
                self.arguments.call(name, offset, rest, offset + name.len(), 0)?
            };
            return Ok(Expression::HelperCall(call));
        }

        if rest.is_empty() {
            if self.registry.has(name) {
                return Ok(Expression::HelperCall(HelperCall {
                    name: name.to_string(),
                    args: Vec::new(),
                    offset,
                }));
            }
            return Ok(Expression::Variable(name.to_string()));
        }

        if !rest.starts_with(char::is_whitespace) {
            return Err(Error::parse(offset + name.len(), "unexpected character in expression"));
        }
        self.ensure_helper(name)?;
        let call = self.arguments.call(name, offset, rest, offset + name.len(), 0)?;
        Ok(Expression::HelperCall(call))
    }

    fn parse_block_open(&self, text: &str, offset: usize, inverted: bool) -> Result<Expression> {
        let name = leading_identifier(text);
        if name.is_empty() {
            return Err(Error::parse(offset, "expected a block name"));
        }
        let rest = &text[name.len()..];
        let rest_offset = offset + name.len();

        // `{{#if(cond)}}` wraps the whole argument list in parentheses.
        let args = if rest.starts_with('(') && find_matching_paren(rest, 0) == Some(rest.len() - 1) {
            self.arguments.parse(&rest[1..rest.len() - 1], rest_offset + 1, 0)?
        } else if rest.is_empty() || rest.starts_with(char::is_whitespace) {
            self.arguments.parse(rest, rest_offset, 0)?
        } else {
            return Err(Error::parse(rest_offset, "unexpected character after block name"));
        };

        Ok(Expression::BlockOpen { name: name.to_string(), args, inverted })
    }

    fn parse_partial(&self, text: &str, offset: usize) -> Result<Expression> {
        let leading = text.len() - text.trim_start().len();
        let mut args = self.arguments.parse(text, offset, 0)?.into_iter();
        let Some(first) = args.next() else {
            return Err(Error::parse(offset, "expected a partial name"));
        };
        let name = match first {
            Argument::String(name) | Argument::Variable(name) => name,
            Argument::Number(n) => n.to_string(),
            _ => return Err(Error::parse(offset + leading, "invalid partial name")),
        };
        let context = args.next();
        if args.next().is_some() {
            return Err(Error::parse(offset, "a partial takes at most one context argument"));
        }
        Ok(Expression::Partial { name, context })
    }

    fn ensure_helper(&self, name: &str) -> Result<()> {
        if self.registry.has(name) {
            Ok(())
        } else {
            Err(Error::UnknownHelper { name: name.to_string() })
        }
    }
}
