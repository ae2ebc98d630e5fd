//! Project configuration for contract runs

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use crate::request::ParamValue;
use crate::resource::{Probe, Resource};
use crate::verdict::CheckKind;

/// Project configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the service under test (endpoint paths are appended)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Whole-request timeout in seconds. Requests are never retried.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Directory holding fixture data files
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Directory holding JSON Schema documents
    #[serde(default = "default_schema_dir")]
    pub schema_dir: PathBuf,

    /// HTTP headers sent with every request
    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// Resources to test (default: all)
    #[serde(default = "default_resources")]
    pub resources: Vec<Resource>,

    /// Run resource suites on separate threads
    #[serde(default)]
    pub parallel: bool,

    /// Check kinds whose failures do not fail the run
    #[serde(default)]
    pub ignore_checks: Vec<CheckKind>,

    /// Extra negative probes; outcomes are observed, never asserted
    #[serde(default)]
    pub probes: Vec<ConfigProbe>,
}

/// A user-defined probe bound to one resource.
///
/// ```toml
/// [[probes]]
/// resource = "images"
/// label = "huge quantity"
/// params = { _quantity = 5000 }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigProbe {
    pub resource: Resource,
    pub label: String,
    #[serde(default)]
    pub params: BTreeMap<String, ParamValue>,
}

impl ConfigProbe {
    #[must_use]
    pub fn to_probe(&self) -> Probe {
        Probe {
            label: self.label.clone(),
            params: self.params.clone(),
        }
    }
}

fn default_base_url() -> String {
    "https://fakerapi.it/api/v2".to_string()
}

const fn default_timeout_secs() -> u64 {
    10
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("fixtures/data")
}

fn default_schema_dir() -> PathBuf {
    PathBuf::from("fixtures/schemas")
}

fn default_resources() -> Vec<Resource> {
    Resource::ALL.to_vec()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            data_dir: default_data_dir(),
            schema_dir: default_schema_dir(),
            headers: HashMap::new(),
            resources: default_resources(),
            parallel: false,
            ignore_checks: Vec::new(),
            probes: Vec::new(),
        }
    }
}

impl Config {
    /// Load config from file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e.to_string()))?;

        let config: Self = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?
        } else {
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?
        };
        config.validate()?;
        Ok(config)
    }

    /// Load from default location (.fakerprobe.toml)
    ///
    /// # Errors
    ///
    /// Returns error if a config file exists but cannot be read or parsed
    pub fn load_default() -> Result<Self, ConfigError> {
        let candidates = [".fakerprobe.toml", ".fakerprobe.json", "fakerprobe.toml"];

        for name in candidates {
            let path = Path::new(name);
            if path.exists() {
                return Self::load(path);
            }
        }

        // No config file, return default
        Ok(Self::default())
    }

    /// Reject values no run could succeed with.
    ///
    /// # Errors
    ///
    /// Returns error on a zero timeout or an empty resource list.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeout_secs must be positive".into()));
        }
        if self.resources.is_empty() {
            return Err(ConfigError::Invalid("resources must not be empty".into()));
        }
        Ok(())
    }

    /// Probes configured for `resource`.
    pub fn probes_for(&self, resource: Resource) -> impl Iterator<Item = Probe> + '_ {
        self.probes
            .iter()
            .filter(move |p| p.resource == resource)
            .map(ConfigProbe::to_probe)
    }

    /// Schema path for a schema file name.
    #[must_use]
    pub fn schema_path(&self, file: &str) -> PathBuf {
        self.schema_dir.join(file)
    }

    /// Create example config file
    #[must_use]
    pub fn example() -> &'static str {
        r#"# fakerprobe configuration

# Service under test
base_url = "https://fakerapi.it/api/v2"

# Whole-request timeout in seconds (no retries)
timeout_secs = 10

# Fixture data and JSON Schema locations
data_dir = "fixtures/data"
schema_dir = "fixtures/schemas"

# Resources to test
resources = ["company", "product", "user", "image"]

# Run resource suites concurrently
# parallel = true

# Failures of these check kinds are reported but do not fail the run
# (status, envelope, schema, count, determinism, locale, field_presence,
# format, value)
# ignore_checks = ["determinism"]

# HTTP headers sent with every request
# [headers]
# User-Agent = "fakerprobe"

# Extra negative probes: the observed status is logged, never asserted
# [[probes]]
# resource = "images"
# label = "huge quantity"
# params = { _quantity = 5000 }
"#
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read {0}: {1}")]
    Io(PathBuf, String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Invalid config: {0}")]
    Invalid(String),
}
