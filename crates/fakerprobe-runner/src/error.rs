//! Runner error types
//!
//! Three tiers: setup errors abort the run before any case executes,
//! transport errors fail one case hard, check failures fail one case softly.

use std::path::PathBuf;

use fakerprobe_core::{CheckFailure, ConfigError, FixtureError};

/// Invalid environment: nothing can run.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error(transparent)]
    Fixture(#[from] FixtureError),
    #[error("Schema not found: {}", .0.display())]
    SchemaNotFound(PathBuf),
    #[error("Invalid schema {}: {}", .0.display(), .1)]
    InvalidSchema(PathBuf, String),
    #[error("Invalid format pattern /{0}/: {1}")]
    InvalidPattern(String, String),
    #[error("Invalid header {0}: {1}")]
    InvalidHeader(String, String),
    #[error("HTTP client error: {0}")]
    Client(String),
}

/// A request that produced no usable response.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{request}: {message}")]
pub struct TransportError {
    /// Request label, e.g. `GET /users?_seed=1`
    pub request: String,
    pub message: String,
    pub timed_out: bool,
}

/// Why a case did not pass.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CaseError {
    #[error(transparent)]
    Check(#[from] CheckFailure),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Setup(#[from] SetupError),
}

impl From<FixtureError> for RunnerError {
    fn from(e: FixtureError) -> Self {
        Self::Setup(SetupError::Fixture(e))
    }
}
