use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Malformed template text: unterminated expression or block, unbalanced
    /// parentheses, mismatched block names. `offset` is relative to the
    /// partial named in `partial`, or to the main template when it is `None`.
    #[error("Parse error at offset {offset}{}: {message}.", partial_suffix(.partial))]
    Parse { offset: usize, message: String, partial: Option<String> },

    #[error("Unknown helper '{name}'.")]
    UnknownHelper { name: String },

    /// A helper implementation returned an error. The original error is kept
    /// as the source.
    #[error("Helper '{name}' failed: {source}")]
    HelperExecution {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Unknown partial '{name}'.")]
    UnknownPartial { name: String },

    #[error("IO error: {0}.")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse JSON. Original error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to parse YAML. Original error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration validation failed: {0}.")]
    ConfigValidation(String),
}

impl Error {
    /// Shorthand for building a [`Error::Parse`].
    pub fn parse(offset: usize, message: impl Into<String>) -> Self {
        Error::Parse { offset, message: message.into(), partial: None }
    }

    /// Attributes a parse error to the partial `name` unless an inner
    /// partial already claimed it.
    pub fn in_partial(self, name: &str) -> Self {
        match self {
            Error::Parse { offset, message, partial: None } => {
                Error::Parse { offset, message, partial: Some(name.to_string()) }
            }
            other => other,
        }
    }

    /// Partial whose source the offset of a parse error refers to.
    pub fn partial(&self) -> Option<&str> {
        match self {
            Error::Parse { partial, .. } => partial.as_deref(),
            _ => None,
        }
    }

    /// Source offset of a parse error, if this is one.
    pub fn offset(&self) -> Option<usize> {
        match self {
            Error::Parse { offset, .. } => Some(*offset),
            _ => None,
        }
    }

    /// Maps the offset of a parse error to a 1-based `(line, column)` pair
    /// within `template`.
    pub fn line_col(&self, template: &str) -> Option<(usize, usize)> {
        let offset = self.offset()?.min(template.len());
        let before = template.get(..offset)?;
        let line = before.matches('\n').count() + 1;
        let column = match before.rfind('\n') {
            Some(newline) => before[newline + 1..].chars().count() + 1,
            None => before.chars().count() + 1,
        };
        Some((line, column))
    }
}

fn partial_suffix(partial: &Option<String>) -> String {
    partial.as_ref().map(|name| format!(" in partial '{name}'")).unwrap_or_default()
}

/// Convenience type alias for Results with the crate error type.
///
/// # Type Parameters
/// * `T` - The type of the success value
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Default error handler that prints the error and exits the program.
///
/// # Arguments
/// * `err` - The error to handle
///
/// # Behavior
/// Prints the error message to stderr and exits with status code 1
pub fn default_error_handler(err: Error) {
    eprintln!("{err}");
    std::process::exit(crate::constants::exit_codes::FAILURE);
}
