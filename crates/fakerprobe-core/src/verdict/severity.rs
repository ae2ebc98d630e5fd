//! Severity levels for case outcomes
//!
//! Severity directly determines exit codes

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Outcome severity - maps directly to exit codes
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Observed only, e.g. a negative probe's status (exit 0)
    Info,
    /// A contract check failed (exit 1)
    Error,
    /// The request never produced a response (exit 2)
    Critical,
}

impl Severity {
    #[must_use]
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::Info => 0,
            Self::Error => 1,
            Self::Critical => 2,
        }
    }

    /// Human-readable label
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Error => "error",
            Self::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
