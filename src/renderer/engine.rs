use super::block::{compile, Block, Node};
use super::interface::TemplateRenderer;
use crate::config::{Config, RenderOptions};
use crate::constants::blocks::{EACH, IF, UNLESS, WITH};
use crate::constants::keywords::{FIRST, INDEX, KEY, LAST};
use crate::context::{Scope, VariableResolver};
use crate::error::{Error, Result};
use crate::helpers::HelperRegistry;
use crate::parser::{Argument, ArgumentParser, Expression, ExpressionParser, HelperCall};
use crate::value::{display, is_defined_truthy};
use indexmap::IndexMap;
use log::debug;
use serde_json::Value;
use std::borrow::Cow;

/// How far the current render has descended, counted in blocks and in
/// partials. Block depth carries into included partials.
#[derive(Debug, Clone, Copy, Default)]
struct Nesting {
    blocks: usize,
    partials: usize,
}

/// Helper-driven template rendering engine.
///
/// Rendering takes `&self` and keeps all per-render state on the stack, so
/// one renderer can serve concurrent renders. Registering helpers or
/// partials needs `&mut self`.
#[derive(Debug, Clone)]
pub struct GlazeRenderer {
    /// Helper implementations, built-ins included
    helpers: HelperRegistry,
    /// Partial templates by name
    partials: IndexMap<String, String>,
    options: RenderOptions,
}

impl GlazeRenderer {
    /// Creates a new GlazeRenderer with the built-in helpers.
    pub fn new() -> Self {
        Self::with_registry(HelperRegistry::with_builtins())
    }

    /// Creates a renderer around an existing registry.
    pub fn with_registry(helpers: HelperRegistry) -> Self {
        Self { helpers, partials: IndexMap::new(), options: RenderOptions::default() }
    }

    /// Creates a renderer with the options and partials of `config`.
    pub fn from_config(config: Config) -> Self {
        let Config { options, partials } = config;
        Self { partials, ..Self::new() }.with_options(options)
    }

    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    pub fn helpers(&self) -> &HelperRegistry {
        &self.helpers
    }

    /// Registers a helper; a later registration under the same name wins.
    pub fn register_helper<F>(&mut self, name: impl Into<String>, helper: F)
    where
        F: Fn(&[Value]) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.helpers.register(name, helper);
    }

    pub fn has_helper(&self, name: &str) -> bool {
        self.helpers.has(name)
    }

    pub fn register_partial(&mut self, name: impl Into<String>, template: impl Into<String>) {
        let name = name.into();
        debug!("Registering partial '{name}'");
        self.partials.insert(name, template.into());
    }

    /// Source of the partial registered under `name`.
    pub fn partial(&self, name: &str) -> Option<&str> {
        self.partials.get(name).map(String::as_str)
    }

    fn parser(&self) -> ExpressionParser<'_> {
        ExpressionParser::new(&self.helpers, self.options.max_depth)
    }

    /// Internal helper to render a template against a root context
    fn render_internal(&self, template: &str, context: &Value) -> Result<String> {
        let nodes = compile(template, &self.parser(), &self.options)?;
        let scope = Scope::root(context);
        let mut out = String::with_capacity(template.len());
        self.render_nodes(&nodes, &scope, Nesting::default(), &mut out)?;
        Ok(out)
    }

    fn render_nodes(
        &self,
        nodes: &[Node<'_>],
        scope: &Scope<'_>,
        nesting: Nesting,
        out: &mut String,
    ) -> Result<()> {
        for node in nodes {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Variable { path, .. } => {
                    if let Some(value) = VariableResolver::resolve(path, scope) {
                        out.push_str(&display(value));
                    }
                }
                Node::Call(call) => {
                    let value = self.eval_call(call, scope)?;
                    out.push_str(&display(&value));
                }
                Node::Block(block) => self.render_block(block, scope, nesting, out)?,
                Node::Partial { name, context, offset } => {
                    self.render_partial(name, context.as_ref(), *offset, scope, nesting, out)?
                }
            }
        }
        Ok(())
    }

    fn render_block(
        &self,
        block: &Block<'_>,
        scope: &Scope<'_>,
        nesting: Nesting,
        out: &mut String,
    ) -> Result<()> {
        if nesting.blocks >= self.options.max_block_depth {
            return Err(Error::parse(
                block.offset,
                format!("blocks nested deeper than {}", self.options.max_block_depth),
            ));
        }
        let nesting = Nesting { blocks: nesting.blocks + 1, ..nesting };

        let subject = self.eval_subject(block.subject(), scope)?;
        let (body, inverse) = block.segments();

        match block.name.as_str() {
            IF | UNLESS => {
                let wanted = block.name == IF;
                let segment =
                    if is_defined_truthy(subject.as_deref()) == wanted { body } else { inverse };
                self.render_nodes(segment, &scope.transparent(), nesting, out)
            }
            WITH => match subject {
                Some(value) if !value.is_null() => {
                    self.render_nodes(body, &scope.child(value), nesting, out)
                }
                _ if !inverse.is_empty() => {
                    self.render_nodes(inverse, &scope.transparent(), nesting, out)
                }
                _ => self.render_nodes(body, &scope.child(Cow::Owned(Value::Null)), nesting, out),
            },
            EACH => self.render_each(subject.as_deref(), body, inverse, scope, nesting, out),
            other => Err(Error::UnknownHelper { name: other.to_string() }),
        }
    }

    /// Renders `body` once per element. Anything that is not an array or an
    /// object iterates zero times and renders `inverse` instead.
    fn render_each(
        &self,
        collection: Option<&Value>,
        body: &[Node<'_>],
        inverse: &[Node<'_>],
        scope: &Scope<'_>,
        nesting: Nesting,
        out: &mut String,
    ) -> Result<()> {
        let iterations = match collection {
            Some(Value::Array(items)) => {
                for (index, item) in items.iter().enumerate() {
                    let child = scope
                        .child(Cow::Borrowed(item))
                        .with_data(INDEX, Value::from(index))
                        .with_data(FIRST, Value::Bool(index == 0))
                        .with_data(LAST, Value::Bool(index + 1 == items.len()));
                    self.render_nodes(body, &child, nesting, out)?;
                }
                items.len()
            }
            Some(Value::Object(map)) => {
                for (index, (key, item)) in map.iter().enumerate() {
                    let child = scope
                        .child(Cow::Borrowed(item))
                        .with_data(KEY, Value::String(key.clone()))
                        .with_data(INDEX, Value::from(index))
                        .with_data(FIRST, Value::Bool(index == 0))
                        .with_data(LAST, Value::Bool(index + 1 == map.len()));
                    self.render_nodes(body, &child, nesting, out)?;
                }
                map.len()
            }
            _ => 0,
        };

        if iterations == 0 {
            self.render_nodes(inverse, &scope.transparent(), nesting, out)?;
        }
        Ok(())
    }

    fn render_partial(
        &self,
        name: &str,
        context: Option<&Argument>,
        offset: usize,
        scope: &Scope<'_>,
        nesting: Nesting,
        out: &mut String,
    ) -> Result<()> {
        let source = self
            .partials
            .get(name)
            .ok_or_else(|| Error::UnknownPartial { name: name.to_string() })?;
        if nesting.partials >= self.options.max_partial_depth {
            return Err(Error::parse(
                offset,
                format!("partials nested deeper than {}", self.options.max_partial_depth),
            ));
        }
        let nodes =
            compile(source, &self.parser(), &self.options).map_err(|err| err.in_partial(name))?;
        let nesting = Nesting { partials: nesting.partials + 1, ..nesting };

        let rendered = match context {
            Some(argument) => {
                let value = self.eval_subject(argument, scope)?.unwrap_or(Cow::Owned(Value::Null));
                self.render_nodes(&nodes, &scope.child(value), nesting, out)
            }
            None => self.render_nodes(&nodes, &scope.transparent(), nesting, out),
        };
        rendered.map_err(|err| err.in_partial(name))
    }

    /// Evaluates arguments innermost first, then calls the helper.
    fn eval_call(&self, call: &HelperCall, scope: &Scope<'_>) -> Result<Value> {
        let args = call
            .args
            .iter()
            .map(|arg| self.eval_argument(arg, scope))
            .collect::<Result<Vec<_>>>()?;
        self.helpers.execute(&call.name, &args)
    }

    /// Helper-argument evaluation. A variable that does not resolve becomes
    /// its own path text.
    fn eval_argument(&self, arg: &Argument, scope: &Scope<'_>) -> Result<Value> {
        Ok(match arg {
            Argument::Number(n) => Value::Number(n.clone()),
            Argument::String(s) => Value::String(s.clone()),
            Argument::Bool(b) => Value::Bool(*b),
            Argument::Null | Argument::Undefined => Value::Null,
            Argument::Variable(path) => VariableResolver::resolve(path, scope)
                .cloned()
                .unwrap_or_else(|| Value::String(path.clone())),
            Argument::HelperCall(call) => self.eval_call(call, scope)?,
        })
    }

    /// Block-subject evaluation: unlike helper arguments, an unresolved
    /// variable stays undefined.
    fn eval_subject<'s>(
        &self,
        arg: &Argument,
        scope: &'s Scope<'_>,
    ) -> Result<Option<Cow<'s, Value>>> {
        Ok(match arg {
            Argument::Variable(path) => VariableResolver::resolve(path, scope).map(Cow::Borrowed),
            Argument::Undefined => None,
            other => Some(Cow::Owned(self.eval_argument(other, scope)?)),
        })
    }

    fn execute_internal(&self, expr: &str, context: &Value) -> Result<bool> {
        let expr = expr.trim();
        let scope = Scope::root(context);

        let arguments = ArgumentParser::new(&self.helpers, self.options.max_depth);
        if let [arg] = arguments.parse(expr, 0, 0)?.as_slice() {
            let quoted = expr.starts_with(['"', '\'']);
            if quoted || !matches!(arg, Argument::String(_)) {
                return Ok(is_defined_truthy(self.eval_subject(arg, &scope)?.as_deref()));
            }
        }

        match self.parser().parse_value(expr, 0)? {
            Expression::HelperCall(call) => {
                Ok(is_defined_truthy(Some(&self.eval_call(&call, &scope)?)))
            }
            Expression::Variable(path) => {
                Ok(is_defined_truthy(VariableResolver::resolve(&path, &scope)))
            }
            other => Err(Error::parse(0, format!("'{expr}' is not a value expression: {other:?}"))),
        }
    }
}

impl Default for GlazeRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRenderer for GlazeRenderer {
    fn add_partial(&mut self, name: &str, template: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(Error::ConfigValidation("partial name must not be empty".into()));
        }
        self.register_partial(name, template);
        Ok(())
    }

    fn render(&self, template: &str, context: &Value) -> Result<String> {
        self.render_internal(template, context)
    }

    fn execute_expression(&self, expr: &str, context: &Value) -> Result<bool> {
        // An empty condition always holds
        if expr.trim().is_empty() {
            return Ok(true);
        }
        self.execute_internal(expr, context)
    }
}
