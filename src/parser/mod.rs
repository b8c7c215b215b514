//! Template parsing
//!
//! The module is structured as:
//! - `cursor`: explicit scan position threaded through the scanners
//! - `tokenizer`: splits a template into literal and expression spans
//! - `expression`: classifies one expression span
//! - `arguments`: splits argument lists and discovers nested calls

pub mod arguments;
pub mod cursor;
pub mod expression;
pub mod tokenizer;

pub use arguments::{Argument, ArgumentParser, HelperCall};
pub use cursor::Cursor;
pub use expression::{Expression, ExpressionParser};
pub use tokenizer::{apply_whitespace_control, scan, Token, TokenKind};
