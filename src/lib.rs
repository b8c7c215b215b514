/// Handles argument parsing and the command runner.
pub mod cli;

/// Renderer options and the optional configuration file.
pub mod config;

/// Constants used across the crate.
pub mod constants;

/// Scope chain and variable path resolution.
pub mod context;

/// Defines custom error types.
pub mod error;

/// Helper registry and the built-in helpers.
pub mod helpers;

/// Reading templates and contexts, writing output.
pub mod ioutils;

/// Template tokenizing and expression parsing.
pub mod parser;

/// Template compilation and rendering.
pub mod renderer;

/// Truthiness and stringification of context values.
pub mod value;

pub use error::{Error, Result};
pub use helpers::{HelperDef, HelperRegistry};
pub use renderer::{new_renderer, render, GlazeRenderer, TemplateRenderer};
