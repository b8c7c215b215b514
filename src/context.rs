//! Scope chain and variable resolution.
//!
//! Each block body renders in a child [`Scope`] that points at its parent.
//! Lookups walk toward the root and stop at the first scope that defines
//! the name; child data is never merged into the parent.

use crate::constants::keywords::{PARENT, ROOT, THIS};
use indexmap::IndexMap;
use serde_json::Value;
use std::borrow::Cow;

static NULL: Value = Value::Null;

/// One link of the scope chain.
#[derive(Debug)]
pub struct Scope<'a> {
    /// The value `this` refers to. `None` means the scope is transparent and
    /// `this` comes from an enclosing scope.
    this: Option<Cow<'a, Value>>,
    /// Iteration metadata (`@index`, `@key`, ...) introduced by this scope.
    data: IndexMap<&'static str, Value>,
    parent: Option<&'a Scope<'a>>,
}

impl<'a> Scope<'a> {
    /// The root scope; `this` is the whole render context.
    pub fn root(context: &'a Value) -> Self {
        Self { this: Some(Cow::Borrowed(context)), data: IndexMap::new(), parent: None }
    }

    /// A child scope whose `this` is `value`.
    pub fn child<'b>(&'b self, value: Cow<'b, Value>) -> Scope<'b> {
        Scope { this: Some(value), data: IndexMap::new(), parent: Some(self) }
    }

    /// A child scope that shares the parent's `this`.
    pub fn transparent<'b>(&'b self) -> Scope<'b> {
        Scope { this: None, data: IndexMap::new(), parent: Some(self) }
    }

    /// Adds iteration metadata visible in this scope and its children.
    pub fn with_data(mut self, key: &'static str, value: Value) -> Self {
        self.data.insert(key, value);
        self
    }

    /// The current `this` value.
    pub fn this(&self) -> &Value {
        let scope = self.context_scope();
        match &scope.this {
            Some(value) => value.as_ref(),
            None => &NULL,
        }
    }

    /// Nearest scope (starting here) that owns a `this` value.
    fn context_scope(&self) -> &Scope<'a> {
        let mut scope = self;
        while scope.this.is_none() {
            match scope.parent {
                Some(parent) => scope = parent,
                None => break,
            }
        }
        scope
    }

    fn root_scope(&self) -> &Scope<'a> {
        let mut scope = self;
        while let Some(parent) = scope.parent {
            scope = parent;
        }
        scope
    }

    fn lookup_data(&self, key: &str) -> Option<&Value> {
        let mut scope = self;
        loop {
            if let Some(value) = scope.data.get(key) {
                return Some(value);
            }
            scope = scope.parent?;
        }
    }
}

/// Resolves dotted paths against a scope chain.
///
/// Resolution never fails: a missing segment, or a segment applied to a
/// value that is neither an object nor an array, yields `None` (undefined).
pub struct VariableResolver;

impl VariableResolver {
    pub fn resolve<'s>(path: &str, scope: &'s Scope<'_>) -> Option<&'s Value> {
        let mut scope: &'s Scope<'_> = scope;
        let mut path = path;

        while let Some(rest) = path.strip_prefix(PARENT) {
            scope = scope.context_scope().parent?;
            path = rest;
        }

        let mut segments = path.split('.');
        let head = segments.next()?;

        let start = match head {
            THIS => scope.this(),
            ROOT => scope.root_scope().this(),
            name if name.starts_with('@') => scope.lookup_data(name)?,
            name => Self::lookup_name(name, scope)?,
        };

        segments.try_fold(start, |value, segment| member(value, segment))
    }

    /// Finds the innermost scope whose `this` defines `name`.
    fn lookup_name<'s>(name: &str, scope: &'s Scope<'_>) -> Option<&'s Value> {
        let mut current = scope;
        loop {
            if let Some(this) = &current.this {
                if let Some(value) = member(this.as_ref(), name) {
                    return Some(value);
                }
            }
            current = current.parent?;
        }
    }
}

/// One member lookup: object key or array index.
fn member<'v>(value: &'v Value, segment: &str) -> Option<&'v Value> {
    if segment.is_empty() {
        return None;
    }
    match value {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}
