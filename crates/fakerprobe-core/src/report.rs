//! Run results: per-case outcomes aggregated per suite and per run
//!
//! These are the types persisted by the CLI and described by
//! [`generate_schema`].

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::resource::Resource;
use crate::verdict::{CheckFailure, Severity};

/// Result of one case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CaseResult {
    /// Every check held
    Passed,
    /// First failing check; later checks of the case did not run
    Failed { failure: CheckFailure },
    /// Negative probe: the status is recorded, nothing is asserted
    Observed { observed_status: u16 },
    /// No usable response (transport error or timeout)
    Error { message: String },
}

impl CaseResult {
    /// `None` for a pass.
    #[must_use]
    pub const fn severity(&self) -> Option<Severity> {
        match self {
            Self::Passed => None,
            Self::Observed { .. } => Some(Severity::Info),
            Self::Failed { failure } => Some(failure.severity()),
            Self::Error { .. } => Some(Severity::Critical),
        }
    }

    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. } | Self::Error { .. })
    }
}

/// One executed case.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CaseOutcome {
    pub resource: Resource,
    /// Case name, e.g. `locale[fr_FR]`
    pub name: String,
    /// Request label, e.g. `GET /users?_locale=fr_FR`
    pub request: String,
    /// Status of the last response received, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    /// Seconds spent on the case, all requests included
    #[serde(default)]
    pub elapsed: f64,
    #[serde(flatten)]
    pub result: CaseResult,
}

/// Outcome counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Tally {
    pub total: u64,
    pub passed: u64,
    pub failed: u64,
    pub observed: u64,
    pub errors: u64,
}

impl Tally {
    fn record(&mut self, result: &CaseResult) {
        self.total += 1;
        match result {
            CaseResult::Passed => self.passed += 1,
            CaseResult::Failed { .. } => self.failed += 1,
            CaseResult::Observed { .. } => self.observed += 1,
            CaseResult::Error { .. } => self.errors += 1,
        }
    }

    fn merge(&mut self, other: Self) {
        self.total += other.total;
        self.passed += other.passed;
        self.failed += other.failed;
        self.observed += other.observed;
        self.errors += other.errors;
    }
}

/// All outcomes of one resource suite, in execution order.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SuiteReport {
    pub resource: Resource,
    pub endpoint: String,
    pub cases: Vec<CaseOutcome>,
    /// True when the suite stopped at its first failure
    #[serde(default)]
    pub stopped_early: bool,
}

impl SuiteReport {
    #[must_use]
    pub fn new(resource: Resource, endpoint: impl Into<String>) -> Self {
        Self {
            resource,
            endpoint: endpoint.into(),
            cases: Vec::new(),
            stopped_early: false,
        }
    }

    #[must_use]
    pub fn tally(&self) -> Tally {
        let mut tally = Tally::default();
        for case in &self.cases {
            tally.record(&case.result);
        }
        tally
    }

    pub fn failures(&self) -> impl Iterator<Item = &CaseOutcome> {
        self.cases.iter().filter(|c| c.result.is_failure())
    }
}

/// Whole run: one report per resource suite.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct RunReport {
    pub base_url: String,
    pub suites: Vec<SuiteReport>,
    #[serde(default)]
    pub duration_secs: f64,
}

impl RunReport {
    #[must_use]
    pub fn tally(&self) -> Tally {
        let mut tally = Tally::default();
        for suite in &self.suites {
            tally.merge(suite.tally());
        }
        tally
    }

    pub fn cases(&self) -> impl Iterator<Item = &CaseOutcome> {
        self.suites.iter().flat_map(|s| s.cases.iter())
    }

    pub fn failures(&self) -> impl Iterator<Item = &CaseOutcome> {
        self.suites.iter().flat_map(SuiteReport::failures)
    }
}

/// Generate JSON Schema for the run report format.
#[must_use]
pub fn generate_schema() -> String {
    let schema = schemars::schema_for!(RunReport);
    serde_json::to_string_pretty(&schema).unwrap_or_default()
}
