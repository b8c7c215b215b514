//! Renderer configuration and its optional configuration file.

use crate::constants::{
    CONFIG_FILENAMES, DEFAULT_MAX_BLOCK_DEPTH, DEFAULT_MAX_DEPTH, DEFAULT_MAX_PARTIAL_DEPTH,
};
use crate::error::{Error, Result};
use indexmap::IndexMap;
use log::debug;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Options that change how templates are parsed and rendered.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderOptions {
    /// Remove the line of a block tag (`#`, `^`, `/`, `else`, comments)
    /// that stands alone on it, including its indentation and line break.
    pub trim_standalone: bool,
    /// Maximum nesting of helper calls inside one expression.
    pub max_depth: usize,
    /// Maximum nesting of blocks, including blocks inside included partials.
    pub max_block_depth: usize,
    /// Maximum nesting of partial inclusion.
    pub max_partial_depth: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            trim_standalone: false,
            max_depth: DEFAULT_MAX_DEPTH,
            max_block_depth: DEFAULT_MAX_BLOCK_DEPTH,
            max_partial_depth: DEFAULT_MAX_PARTIAL_DEPTH,
        }
    }
}

/// Contents of a `glaze.json` / `glaze.yaml` file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub options: RenderOptions,
    /// Partial templates by name.
    pub partials: IndexMap<String, String>,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.options.max_depth == 0 {
            return Err(Error::ConfigValidation("maxDepth must be greater than 0".into()));
        }
        if self.options.max_block_depth == 0 {
            return Err(Error::ConfigValidation("maxBlockDepth must be greater than 0".into()));
        }
        if let Some(name) = self.partials.keys().find(|name| name.trim().is_empty()) {
            return Err(Error::ConfigValidation(format!(
                "partial name '{name}' must not be empty"
            )));
        }
        Ok(())
    }

    /// Parses a configuration file, choosing the format by extension.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config: Config = match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)?,
            _ => serde_json::from_str(&content)?,
        };
        config.validate()?;
        debug!(
            "Loaded configuration from '{}' with {} partial(s)",
            path.display(),
            config.partials.len()
        );
        Ok(config)
    }

    /// Looks for the first known configuration file in `dir`.
    pub fn find_in<P: AsRef<Path>>(dir: P) -> Option<PathBuf> {
        CONFIG_FILENAMES
            .iter()
            .map(|name| dir.as_ref().join(name))
            .find(|candidate| candidate.is_file())
    }

    /// Loads `path` if given, otherwise the configuration found in `dir`,
    /// otherwise the defaults.
    pub fn load(path: Option<&Path>, dir: &Path) -> Result<Self> {
        match path.map(Path::to_path_buf).or_else(|| Self::find_in(dir)) {
            Some(path) => Self::from_file(path),
            None => {
                debug!("No configuration file found, using defaults.");
                Ok(Self::default())
            }
        }
    }
}
