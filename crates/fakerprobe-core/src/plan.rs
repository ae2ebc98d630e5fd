//! Dry run plan types and config validation
//!
//! Describes what a run *would* do without sending any requests.
//! Used for pre-flight validation and CI previews.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::Config;
use crate::resource::Resource;

// ── Plan types ──

/// Complete dry run plan: suites, case counts, and config warnings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct DryRunPlan {
    pub base_url: String,
    /// Per-resource execution plan
    pub suites: Vec<SuitePlan>,
    /// Total cases that would run
    pub total_cases: u64,
    /// Config/fixture/schema validation results
    pub validations: Vec<Validation>,
}

/// Execution plan for one resource suite.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SuitePlan {
    pub resource: Resource,
    pub endpoint: String,
    /// Schema file the suite validates against
    pub schema: String,
    /// Case names in execution order
    pub cases: Vec<String>,
    /// Number of negative probes among `cases`
    pub probes: u32,
}

/// A validation check result.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Validation {
    pub check: String,
    pub status: ValidationStatus,
    pub message: String,
}

impl Validation {
    pub fn ok(check: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_status(check, ValidationStatus::Ok, message)
    }

    pub fn warning(check: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_status(check, ValidationStatus::Warning, message)
    }

    pub fn error(check: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_status(check, ValidationStatus::Error, message)
    }

    fn with_status(
        check: impl Into<String>,
        status: ValidationStatus,
        message: impl Into<String>,
    ) -> Self {
        Self {
            check: check.into(),
            status,
            message: message.into(),
        }
    }
}

/// Status of a validation check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Ok,
    Warning,
    Error,
}

impl std::fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ok => write!(f, "OK"),
            Self::Warning => write!(f, "WARNING"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

// ── Config validation ──

/// Validate config and the files the selected `resources` need.
#[must_use]
pub fn validate_config(config: &Config, resources: &[Resource]) -> Vec<Validation> {
    let mut checks = Vec::new();

    // Base URL
    if config.base_url.starts_with("http://") || config.base_url.starts_with("https://") {
        checks.push(Validation::ok(
            "base_url",
            format!("base_url: {}", config.base_url),
        ));
    } else {
        checks.push(Validation::error(
            "base_url",
            format!(
                "base_url: {} (missing http:// or https:// prefix)",
                config.base_url
            ),
        ));
    }

    checks.push(Validation::ok(
        "timeout",
        format!("timeout: {}s per request, no retries", config.timeout_secs),
    ));

    // Data directory
    if config.data_dir.is_dir() {
        checks.push(Validation::ok(
            "data_dir",
            format!("data_dir: {} (exists)", config.data_dir.display()),
        ));
    } else {
        checks.push(Validation::error(
            "data_dir",
            format!("data_dir: {} (not found)", config.data_dir.display()),
        ));
    }

    // Schema files of selected resources
    for resource in resources {
        let path = config.schema_path(resource.schema_file());
        if path.is_file() {
            checks.push(Validation::ok(
                "schema",
                format!("schema[{resource}]: {} (exists)", path.display()),
            ));
        } else {
            checks.push(Validation::error(
                "schema",
                format!("schema[{resource}]: {} (not found)", path.display()),
            ));
        }
    }

    // Probes for resources that will not run
    for probe in &config.probes {
        if !resources.contains(&probe.resource) {
            checks.push(Validation::warning(
                "probes",
                format!(
                    "probe '{}' targets {} which is not selected",
                    probe.label, probe.resource
                ),
            ));
        }
    }
    if !config.probes.is_empty() {
        checks.push(Validation::ok(
            "probes",
            format!("probes: {} defined", config.probes.len()),
        ));
    }

    checks
}

// ── Display helpers ──

impl DryRunPlan {
    /// Format as human-readable terminal output.
    #[must_use]
    pub fn to_terminal(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!(
            "Dry run: {} suites, {} cases planned against {}\n",
            self.suites.len(),
            self.total_cases,
            self.base_url,
        ));

        for suite in &self.suites {
            lines.push(format!(
                "{} {} ({} cases, {} probes):",
                suite.resource,
                suite.endpoint,
                suite.cases.len(),
                suite.probes,
            ));
            lines.push(format!("  Schema: {}", suite.schema));
            for case in &suite.cases {
                lines.push(format!("  - {case}"));
            }
            lines.push(String::new());
        }

        lines.push("Config validation:".into());
        for v in &self.validations {
            lines.push(format!("  [{}] {}", v.status, v.message));
        }

        lines.join("\n")
    }

    /// Returns true if any validation has Error status.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.validations
            .iter()
            .any(|v| v.status == ValidationStatus::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigProbe;
    use std::collections::BTreeMap;

    fn config_in(dir: &std::path::Path) -> Config {
        let data_dir = dir.join("data");
        let schema_dir = dir.join("schemas");
        std::fs::create_dir_all(&data_dir).unwrap();
        std::fs::create_dir_all(&schema_dir).unwrap();
        for r in Resource::ALL {
            std::fs::write(schema_dir.join(r.schema_file()), "{}").unwrap();
        }
        Config {
            base_url: "http://localhost:8080".into(),
            data_dir,
            schema_dir,
            ..Config::default()
        }
    }

    fn find<'a>(checks: &'a [Validation], check: &str) -> Vec<&'a Validation> {
        checks.iter().filter(|c| c.check == check).collect()
    }

    #[test]
    fn complete_config_validates() {
        let dir = tempfile::tempdir().unwrap();
        let checks = validate_config(&config_in(dir.path()), &Resource::ALL);
        assert!(checks.iter().all(|c| c.status == ValidationStatus::Ok));
        assert_eq!(find(&checks, "schema").len(), 4);
    }

    #[test]
    fn validate_bad_base_url() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config {
            base_url: "fakerapi.it/api/v2".into(),
            ..config_in(dir.path())
        };
        let checks = validate_config(&cfg, &cfg.resources);
        assert_eq!(find(&checks, "base_url")[0].status, ValidationStatus::Error);
    }

    #[test]
    fn validate_missing_schema() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config_in(dir.path());
        std::fs::remove_file(cfg.schema_path(Resource::User.schema_file())).unwrap();
        let checks = validate_config(&cfg, &cfg.resources);
        let errors: Vec<_> = find(&checks, "schema")
            .into_iter()
            .filter(|c| c.status == ValidationStatus::Error)
            .collect();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("schema[user]"));
    }

    #[test]
    fn validate_missing_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config {
            data_dir: dir.path().join("nope"),
            ..config_in(dir.path())
        };
        let checks = validate_config(&cfg, &cfg.resources);
        assert_eq!(find(&checks, "data_dir")[0].status, ValidationStatus::Error);
    }

    #[test]
    fn validate_probe_for_unselected_resource() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config {
            resources: vec![Resource::Company],
            probes: vec![ConfigProbe {
                resource: Resource::Image,
                label: "huge".into(),
                params: BTreeMap::new(),
            }],
            ..config_in(dir.path())
        };
        let checks = validate_config(&cfg, &cfg.resources);
        assert!(
            find(&checks, "probes")
                .iter()
                .any(|c| c.status == ValidationStatus::Warning && c.message.contains("huge"))
        );
    }

    #[test]
    fn validate_only_narrowed_resources() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config {
            probes: vec![ConfigProbe {
                resource: Resource::Image,
                label: "huge".into(),
                params: BTreeMap::new(),
            }],
            ..config_in(dir.path())
        };
        for r in [Resource::Company, Resource::Product, Resource::Image] {
            std::fs::remove_file(cfg.schema_path(r.schema_file())).unwrap();
        }

        // Configured for every resource, narrowed to users for this run
        assert_eq!(cfg.resources.len(), 4);
        let checks = validate_config(&cfg, &[Resource::User]);
        let schemas = find(&checks, "schema");
        assert_eq!(schemas.len(), 1);
        assert_eq!(schemas[0].status, ValidationStatus::Ok);
        assert!(schemas[0].message.starts_with("schema[user]"));
        assert!(
            find(&checks, "probes")
                .iter()
                .any(|c| c.status == ValidationStatus::Warning && c.message.contains("huge"))
        );
        assert!(!checks.iter().any(|c| c.status == ValidationStatus::Error));
    }

    #[test]
    fn plan_terminal_output() {
        let plan = DryRunPlan {
            base_url: "http://localhost:8080".into(),
            suites: vec![SuitePlan {
                resource: Resource::Image,
                endpoint: "/images".into(),
                schema: "image-schema.json".into(),
                cases: vec!["default".into(), "probe[extreme width]".into()],
                probes: 1,
            }],
            total_cases: 2,
            validations: vec![Validation::warning(
                "probes",
                "probe 'huge' targets image which is not selected",
            )],
        };

        let output = plan.to_terminal();
        assert!(output.contains("1 suites, 2 cases planned"));
        assert!(output.contains("image /images (2 cases, 1 probes):"));
        assert!(output.contains("  - probe[extreme width]"));
        assert!(output.contains("[WARNING] probe 'huge'"));
        assert!(!plan.has_errors());
    }
}
