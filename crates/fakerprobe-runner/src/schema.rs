//! Compiled JSON Schemas per resource, loaded once per run

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use fakerprobe_core::{Resource, ResourceDescriptor};
use serde_json::Value;

use crate::error::SetupError;

/// Errors reported per validation, at most.
const MAX_SCHEMA_ERRORS: usize = 5;

/// A compiled schema and how to apply it.
pub struct CompiledSchema {
    path: PathBuf,
    validator: jsonschema::Validator,
    envelope: bool,
}

impl CompiledSchema {
    /// # Errors
    ///
    /// Returns error if `schema` is not a valid JSON Schema.
    pub fn from_value(schema: &Value, path: impl Into<PathBuf>) -> Result<Self, SetupError> {
        let path = path.into();
        let validator = jsonschema::validator_for(schema)
            .map_err(|e| SetupError::InvalidSchema(path.clone(), e.to_string()))?;
        let envelope = schema
            .get("properties")
            .and_then(|p| p.get("data"))
            .is_some();
        Ok(Self {
            path,
            validator,
            envelope,
        })
    }

    /// # Errors
    ///
    /// Returns error if the file is missing, unreadable, or not a valid schema.
    pub fn load(path: &Path) -> Result<Self, SetupError> {
        if !path.is_file() {
            return Err(SetupError::SchemaNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| SetupError::InvalidSchema(path.to_path_buf(), e.to_string()))?;
        let schema: Value = serde_json::from_str(&content)
            .map_err(|e| SetupError::InvalidSchema(path.to_path_buf(), format!("Invalid JSON: {e}")))?;
        Self::from_value(&schema, path)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True when the schema declares a `data` property and so describes
    /// the whole envelope rather than one record.
    #[must_use]
    pub const fn describes_envelope(&self) -> bool {
        self.envelope
    }

    /// Validate a response body. Envelope schemas see the whole body,
    /// record schemas see every element of `data`.
    ///
    /// Returns at most a handful of messages; empty means valid.
    #[must_use]
    pub fn violations(&self, body: &Value) -> Vec<String> {
        if self.envelope {
            return self
                .validator
                .iter_errors(body)
                .take(MAX_SCHEMA_ERRORS)
                .map(|e| e.to_string())
                .collect();
        }

        let Some(records) = body.get("data").and_then(Value::as_array) else {
            return vec!["data is not an array".to_string()];
        };
        records
            .iter()
            .enumerate()
            .flat_map(|(i, record)| {
                self.validator
                    .iter_errors(record)
                    .map(move |e| format!("data[{i}]: {e}"))
            })
            .take(MAX_SCHEMA_ERRORS)
            .collect()
    }
}

impl std::fmt::Debug for CompiledSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledSchema")
            .field("path", &self.path)
            .field("envelope", &self.envelope)
            .finish_non_exhaustive()
    }
}

/// Every schema a run needs, keyed by resource.
#[derive(Debug, Default)]
pub struct SchemaStore {
    schemas: HashMap<Resource, CompiledSchema>,
}

impl SchemaStore {
    /// Load the schema of each descriptor from `schema_dir`.
    ///
    /// # Errors
    ///
    /// Returns the first missing or invalid schema.
    pub fn load(schema_dir: &Path, descriptors: &[ResourceDescriptor]) -> Result<Self, SetupError> {
        let mut schemas = HashMap::new();
        for d in descriptors {
            let schema = CompiledSchema::load(&schema_dir.join(d.schema_file))?;
            schemas.insert(d.resource, schema);
        }
        Ok(Self { schemas })
    }

    #[must_use]
    pub fn get(&self, resource: Resource) -> Option<&CompiledSchema> {
        self.schemas.get(&resource)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}
