use crate::error::Result;

/// Trait for template rendering engines.
pub trait TemplateRenderer {
    /// Registers a partial template that `{{> name}}` includes.
    ///
    /// # Arguments
    /// * `name` - Name to identify the partial
    /// * `template` - Partial content as string
    fn add_partial(&mut self, name: &str, template: &str) -> Result<()>;

    /// Renders a template string with the given context.
    ///
    /// # Arguments
    /// * `template` - Template string to render
    /// * `context` - Context variables for rendering
    ///
    /// # Returns
    /// * `Result<String>` - Rendered template string
    fn render(&self, template: &str, context: &serde_json::Value) -> Result<String>;

    /// Executes a template expression and returns whether it evaluates to true.
    ///
    /// # Arguments
    /// * `expr` - Expression to evaluate, without delimiters
    /// * `context` - Context variables for evaluation
    ///
    /// # Returns
    /// * `Result<bool>` - Whether the expression evaluates to true
    fn execute_expression(&self, expr: &str, context: &serde_json::Value)
        -> Result<bool>;
}
