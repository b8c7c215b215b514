//! Template rendering: block matching, evaluation and the public renderer.

pub mod block;
pub mod engine;
pub mod interface;

pub use block::{compile, Block, BlockProcessor, BlockState, Node};
pub use engine::GlazeRenderer;
pub use interface::TemplateRenderer;

/// Creates a renderer with the built-in helpers and default options.
pub fn new_renderer() -> GlazeRenderer {
    GlazeRenderer::new()
}

/// Renders `template` once with a default renderer.
pub fn render(template: &str, context: &serde_json::Value) -> crate::error::Result<String> {
    new_renderer().render(template, context)
}
