//! Verdict policy - determines how case outcomes are filtered and judged

use crate::Config;
use crate::report::{CaseOutcome, CaseResult, RunReport};

use super::{CheckKind, Severity};

/// Exit code when no case ran at all.
pub const NO_CASES_EXIT_CODE: i32 = 3;

/// Policy for judging a run
#[derive(Debug, Clone, Default)]
pub struct VerdictPolicy {
    /// Check kinds whose failures are not counted
    pub ignore_checks: Vec<CheckKind>,
}

impl VerdictPolicy {
    /// Policy ignoring the check kinds listed in `config`.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            ignore_checks: config.ignore_checks.clone(),
        }
    }

    /// Also ignore `kinds`.
    #[must_use]
    pub fn with_ignored(mut self, kinds: impl IntoIterator<Item = CheckKind>) -> Self {
        for kind in kinds {
            if !self.ignore_checks.contains(&kind) {
                self.ignore_checks.push(kind);
            }
        }
        self
    }

    /// Whether an outcome counts toward the verdict
    fn counts(&self, outcome: &CaseOutcome) -> bool {
        match &outcome.result {
            CaseResult::Failed { failure } => !self.ignore_checks.contains(&failure.kind),
            _ => true,
        }
    }

    /// Outcomes that fail the run under this policy
    pub fn failures<'a>(&'a self, report: &'a RunReport) -> impl Iterator<Item = &'a CaseOutcome> {
        report
            .failures()
            .filter(move |outcome| self.counts(outcome))
    }

    /// Highest exit code among counted outcomes; 0 when everything passed.
    #[must_use]
    pub fn exit_code(&self, report: &RunReport) -> i32 {
        report
            .cases()
            .filter(|o| self.counts(o))
            .filter_map(|o| o.result.severity())
            .map(Severity::exit_code)
            .max()
            .unwrap_or(0)
    }

    /// Determine verdict from a run report.
    ///
    /// PASS requires at least one case and no counted failure or error.
    /// Observed probe statuses never fail a run.
    #[must_use]
    pub fn verdict(&self, report: &RunReport) -> Verdict {
        let tally = report.tally();
        if tally.total == 0 {
            return Verdict {
                status: VerdictStatus::Fail,
                exit_code: NO_CASES_EXIT_CODE,
                reason: "No cases were run".to_string(),
            };
        }

        let exit_code = self.exit_code(report);
        let failures: Vec<&CaseOutcome> = self.failures(report).collect();
        let ignored = tally.failed + tally.errors - failures.len() as u64;

        if failures.is_empty() {
            let mut reason = format!("All {} cases passed", tally.passed + ignored);
            if tally.observed > 0 {
                reason.push_str(&format!(" ({} probes observed)", tally.observed));
            }
            if ignored > 0 {
                reason.push_str(&format!(" ({ignored} ignored failures)"));
            }
            return Verdict {
                status: VerdictStatus::Pass,
                exit_code,
                reason,
            };
        }

        let errors = failures
            .iter()
            .filter(|o| matches!(o.result, CaseResult::Error { .. }))
            .count();
        let failed = failures.len() - errors;

        let mut parts = Vec::new();
        if failed > 0 {
            parts.push(format!("{failed} failed checks"));
        }
        if errors > 0 {
            parts.push(format!("{errors} errors"));
        }
        Verdict {
            status: VerdictStatus::Fail,
            exit_code,
            reason: format!("{} of {} cases", parts.join(", "), tally.total),
        }
    }
}

/// Final verdict
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub status: VerdictStatus,
    pub exit_code: i32,
    pub reason: String,
}

/// Pass or fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerdictStatus {
    Pass,
    Fail,
}

impl std::fmt::Display for VerdictStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pass => write!(f, "PASS"),
            Self::Fail => write!(f, "FAIL"),
        }
    }
}
