//! Helper registry
//!
//! The module is structured as:
//! - `builtins`: the helpers every registry created with
//!   [`HelperRegistry::with_builtins`] starts with

pub mod builtins;

use crate::error::{Error, Result};
use indexmap::IndexMap;
use log::{debug, trace};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// A helper implementation.
///
/// Helpers receive fully evaluated arguments; an undefined argument arrives
/// as `null`. Returning an error aborts the render with
/// [`Error::HelperExecution`].
pub trait HelperDef: Send + Sync {
    fn call(&self, args: &[Value]) -> anyhow::Result<Value>;
}

impl<F> HelperDef for F
where
    F: Fn(&[Value]) -> anyhow::Result<Value> + Send + Sync,
{
    fn call(&self, args: &[Value]) -> anyhow::Result<Value> {
        self(args)
    }
}

/// Named helpers shared by every render of a renderer.
///
/// Cloning is cheap. The map is copy-on-write: registering on a clone never
/// affects renders running against the original.
#[derive(Clone, Default)]
pub struct HelperRegistry {
    helpers: Arc<IndexMap<String, Arc<dyn HelperDef>>>,
}

impl HelperRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in helpers.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        builtins::register_builtins(&mut registry);
        registry
    }

    /// Registers a closure under `name`, replacing any earlier helper of the
    /// same name.
    pub fn register<F>(&mut self, name: impl Into<String>, helper: F)
    where
        F: Fn(&[Value]) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.register_def(name, helper);
    }

    /// Registers any [`HelperDef`] implementation under `name`.
    pub fn register_def<H>(&mut self, name: impl Into<String>, helper: H)
    where
        H: HelperDef + 'static,
    {
        let name = name.into();
        let helpers = Arc::make_mut(&mut self.helpers);
        if helpers.insert(name.clone(), Arc::new(helper)).is_some() {
            debug!("Helper '{name}' replaced by a new registration");
        }
    }

    pub fn has(&self, name: &str) -> bool {
        self.helpers.contains_key(name)
    }

    /// Calls the helper registered under `name`.
    pub fn execute(&self, name: &str, args: &[Value]) -> Result<Value> {
        let helper = self
            .helpers
            .get(name)
            .ok_or_else(|| Error::UnknownHelper { name: name.to_string() })?;
        trace!("Calling helper '{name}' with {} argument(s)", args.len());
        helper
            .call(args)
            .map_err(|source| Error::HelperExecution { name: name.to_string(), source })
    }

    /// Registered names in registration order.
    fn names(&self) -> impl Iterator<Item = &str> {
        self.helpers.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.helpers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.helpers.is_empty()
    }
}

impl fmt::Debug for HelperRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HelperRegistry").field("helpers", &self.names().collect::<Vec<_>>()).finish()
    }
}
