//! fakerprobe-runner: HTTP execution and response assertions
//!
//! Sends `RequestSpec`s with a blocking client, checks responses against
//! the contract, and drives the per-resource suites.

pub mod assertions;
pub mod error;
pub mod executor;
pub mod schema;
pub mod suite;

pub use error::{CaseError, RunnerError, SetupError, TransportError};
pub use executor::{RequestExecutor, Response};
pub use schema::{CompiledSchema, SchemaStore};
pub use suite::{CaseKind, SuiteRunner, TestCase, collect_cases};
