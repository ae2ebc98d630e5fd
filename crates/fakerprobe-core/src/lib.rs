//! fakerprobe-core: Core types for Faker API contract testing
//!
//! This crate holds everything that does not touch the network: fixture
//! loading, request specs, per-resource descriptors, run reports, and the
//! policy that turns a report into a pass/fail verdict.

pub mod config;
pub mod context;
pub mod fixture;
pub mod plan;
pub mod report;
pub mod request;
pub mod resource;
pub mod verdict;

pub use config::{Config, ConfigError, ConfigProbe};
pub use context::{AxisValues, CommonFixtures, TestContext};
pub use fixture::FixtureError;
pub use plan::{DryRunPlan, SuitePlan, Validation, ValidationStatus};
pub use report::{CaseOutcome, CaseResult, RunReport, SuiteReport, Tally};
pub use request::{ParamValue, RequestSpec};
pub use resource::{Probe, Resource, ResourceDescriptor};
pub use verdict::{CheckFailure, CheckKind, Severity, Verdict, VerdictPolicy, VerdictStatus};
