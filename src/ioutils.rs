use std::path::Path;

use crate::constants::{FILE_INDICATOR, STDIN_INDICATOR};
use crate::error::{Error, Result};
use log::debug;

pub fn create_dir_all<P: AsRef<Path>>(dest_path: P) -> Result<()> {
    let dest_path = dest_path.as_ref();
    std::fs::create_dir_all(dest_path).map_err(Error::Io)
}

pub fn write_file<P: AsRef<Path>>(content: &str, dest_path: P) -> Result<()> {
    let dest_path = dest_path.as_ref();
    let base_path = std::env::current_dir().unwrap_or_default();
    let abs_path = if dest_path.is_absolute() {
        dest_path.to_path_buf()
    } else {
        base_path.join(dest_path)
    };

    if let Some(parent) = abs_path.parent() {
        create_dir_all(parent)?;
    }
    std::fs::write(abs_path, content).map_err(Error::Io)
}

pub fn read_from(mut reader: impl std::io::Read) -> Result<String> {
    let mut buf = String::new();
    reader.read_to_string(&mut buf).map_err(Error::Io)?;
    Ok(buf)
}

/// Reads a template from `source`, a file path or `-` for stdin.
pub fn read_template(source: &str) -> Result<String> {
    if source == STDIN_INDICATOR {
        debug!("Reading template from stdin");
        return read_from(std::io::stdin().lock());
    }
    debug!("Reading template from '{source}'");
    std::fs::read_to_string(source).map_err(Error::Io)
}

/// Parses a context document, trying JSON first and YAML second.
pub fn parse_context(buf: &str) -> Result<serde_json::Value> {
    if buf.trim().is_empty() {
        return Ok(serde_json::Value::Object(serde_json::Map::new()));
    }
    match serde_json::from_str(buf) {
        Ok(value) => Ok(value),
        Err(json_err) => serde_yaml::from_str(buf).map_err(|yaml_err| {
            debug!("Context is neither JSON ({json_err}) nor YAML ({yaml_err})");
            Error::Json(json_err)
        }),
    }
}

/// Resolves the `--context` argument.
///
/// * `None` gives an empty object
/// * `-` reads the document from stdin
/// * `@path` reads it from a file
/// * anything else is inline JSON
pub fn load_context(arg: Option<&str>) -> Result<serde_json::Value> {
    let Some(arg) = arg else {
        return Ok(serde_json::Value::Object(serde_json::Map::new()));
    };
    if arg == STDIN_INDICATOR {
        debug!("Reading context from stdin");
        return parse_context(&read_from(std::io::stdin().lock())?);
    }
    if let Some(path) = arg.strip_prefix(FILE_INDICATOR) {
        debug!("Reading context from '{path}'");
        let content = std::fs::read_to_string(path)?;
        return parse_context(&content);
    }
    Ok(serde_json::from_str(arg)?)
}
