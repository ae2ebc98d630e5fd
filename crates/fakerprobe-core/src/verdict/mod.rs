//! Verdict module - check failures, severity, and policy

mod failure;
mod policy;
mod severity;

pub use failure::{CheckFailure, CheckKind};
pub use policy::{NO_CASES_EXIT_CODE, Verdict, VerdictPolicy, VerdictStatus};
pub use severity::Severity;
