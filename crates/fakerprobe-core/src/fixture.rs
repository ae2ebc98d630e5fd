//! Fixture files: JSON or YAML documents holding test-input domains
//!
//! Every failure here is a setup failure. Callers abort the run instead of
//! turning a broken fixture into per-case failures.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::request::ParamValue;

/// Parsed fixture document.
pub type FixtureMap = Map<String, Value>;

/// Parse a fixture file into a key → value mapping.
///
/// Format detection follows the extension (`.yaml`/`.yml` → YAML,
/// `.json` → JSON), falling back to content sniffing.
///
/// # Errors
///
/// Returns error if the file is missing, unreadable, not parseable, or not a
/// mapping at the top level.
pub fn load(path: &Path) -> Result<FixtureMap, FixtureError> {
    if !path.exists() {
        return Err(FixtureError::NotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path)
        .map_err(|e| FixtureError::Io(path.to_path_buf(), e.to_string()))?;
    match parse(path, &content)? {
        Value::Object(map) => Ok(map),
        other => Err(FixtureError::Parse(
            path.to_path_buf(),
            format!("expected a mapping at top level, got {}", json_type(&other)),
        )),
    }
}

/// Extract one named array from a fixture file.
///
/// # Errors
///
/// Returns error if the file cannot be loaded, `key` is absent, or its value
/// is not an array.
pub fn list(path: &Path, key: &str) -> Result<Vec<Value>, FixtureError> {
    let map = load(path)?;
    array(&map, path, key)
}

/// Extract one named array from an already loaded document.
///
/// # Errors
///
/// Returns error if `key` is absent or not an array.
pub fn array(map: &FixtureMap, path: &Path, key: &str) -> Result<Vec<Value>, FixtureError> {
    match map.get(key) {
        Some(Value::Array(items)) => Ok(items.clone()),
        Some(other) => Err(FixtureError::NotAnArray {
            path: path.to_path_buf(),
            key: key.to_string(),
            found: json_type(other),
        }),
        None => Err(FixtureError::MissingKey {
            path: path.to_path_buf(),
            key: key.to_string(),
        }),
    }
}

/// Convert fixture values to strings.
///
/// # Errors
///
/// Returns error on the first non-string element.
pub fn strings(values: &[Value], path: &Path, key: &str) -> Result<Vec<String>, FixtureError> {
    values
        .iter()
        .map(|v| {
            v.as_str()
                .map(str::to_string)
                .ok_or_else(|| invalid(path, key, v, "string"))
        })
        .collect()
}

/// Convert fixture values to integers.
///
/// # Errors
///
/// Returns error on the first element that is not an integral number.
pub fn integers(values: &[Value], path: &Path, key: &str) -> Result<Vec<i64>, FixtureError> {
    values
        .iter()
        .map(|v| v.as_i64().ok_or_else(|| invalid(path, key, v, "integer")))
        .collect()
}

/// Convert fixture values to query parameter values (integer or string).
///
/// # Errors
///
/// Returns error on the first element that is neither.
pub fn param_values(
    values: &[Value],
    path: &Path,
    key: &str,
) -> Result<Vec<ParamValue>, FixtureError> {
    values
        .iter()
        .map(|v| match v {
            Value::String(s) => Ok(ParamValue::Str(s.clone())),
            Value::Number(n) => n
                .as_i64()
                .map(ParamValue::Int)
                .ok_or_else(|| invalid(path, key, v, "integer or string")),
            _ => Err(invalid(path, key, v, "integer or string")),
        })
        .collect()
}

fn parse(path: &Path, content: &str) -> Result<Value, FixtureError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let as_yaml = |c: &str| {
        serde_yml::from_str(c)
            .map_err(|e| FixtureError::Parse(path.to_path_buf(), format!("invalid YAML: {e}")))
    };
    let as_json = |c: &str| {
        serde_json::from_str(c)
            .map_err(|e| FixtureError::Parse(path.to_path_buf(), format!("invalid JSON: {e}")))
    };

    match ext.as_str() {
        "yaml" | "yml" => as_yaml(content),
        "json" => as_json(content),
        _ if content.trim_start().starts_with('{') => as_json(content),
        _ => as_yaml(content),
    }
}

fn invalid(path: &Path, key: &str, value: &Value, expected: &'static str) -> FixtureError {
    FixtureError::InvalidValue {
        path: path.to_path_buf(),
        key: key.to_string(),
        value: value.to_string(),
        expected,
    }
}

fn json_type(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    #[error("fixture not found: {0}")]
    NotFound(PathBuf),
    #[error("cannot read fixture {0}: {1}")]
    Io(PathBuf, String),
    #[error("cannot parse fixture {0}: {1}")]
    Parse(PathBuf, String),
    #[error("fixture {path} has no key '{key}'")]
    MissingKey { path: PathBuf, key: String },
    #[error("fixture {path} key '{key}' is a {found}, expected an array")]
    NotAnArray {
        path: PathBuf,
        key: String,
        found: &'static str,
    },
    #[error("fixture {path} key '{key}' holds {value}, expected {expected}")]
    InvalidValue {
        path: PathBuf,
        key: String,
        value: String,
        expected: &'static str,
    },
}
