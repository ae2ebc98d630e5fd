//! Check failures and their classification

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::Severity;

/// Which contract a failed check was guarding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    /// Status code is not 200 or envelope status is not "OK"
    Status,
    /// Envelope is missing `status`, `code`, `total` or `data`
    Envelope,
    /// Body does not conform to the resource schema
    Schema,
    /// Record count differs from `min(requested, 1000)`
    Count,
    /// Same seed produced different bodies
    Determinism,
    /// Envelope `locale` does not echo the requested locale
    Locale,
    /// Required record field is absent or null
    FieldPresence,
    /// Field value has the wrong format
    Format,
    /// Field value differs from the requested parameter
    Value,
}

impl CheckKind {
    /// Default severity for this check
    #[must_use]
    pub const fn default_severity(self) -> Severity {
        match self {
            Self::Status
            | Self::Envelope
            | Self::Schema
            | Self::Count
            | Self::Determinism
            | Self::Locale
            | Self::FieldPresence
            | Self::Format
            | Self::Value => Severity::Error,
        }
    }

    /// Human-readable description
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Status => "Unexpected status",
            Self::Envelope => "Malformed response envelope",
            Self::Schema => "Response does not match schema",
            Self::Count => "Unexpected record count",
            Self::Determinism => "Seeded responses differ",
            Self::Locale => "Locale not echoed",
            Self::FieldPresence => "Required field missing",
            Self::Format => "Field format mismatch",
            Self::Value => "Field value mismatch",
        }
    }
}

impl std::fmt::Display for CheckKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.description())
    }
}

/// A failed check: what was expected and what the service returned
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct CheckFailure {
    pub kind: CheckKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,
}

impl CheckFailure {
    #[must_use]
    pub fn new(kind: CheckKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            expected: None,
            actual: None,
        }
    }

    /// Failure with a rendered expected-vs-actual message.
    #[must_use]
    pub fn mismatch(
        kind: CheckKind,
        what: &str,
        expected: impl std::fmt::Display,
        actual: impl std::fmt::Display,
    ) -> Self {
        let expected = expected.to_string();
        let actual = actual.to_string();
        Self {
            kind,
            message: format!("{what}: expected {expected}, got {actual}"),
            expected: Some(expected),
            actual: Some(actual),
        }
    }

    #[must_use]
    pub const fn severity(&self) -> Severity {
        self.kind.default_severity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mismatch_renders_expected_and_actual() {
        let f = CheckFailure::mismatch(CheckKind::Count, "data length", 5, 4);
        assert_eq!(f.message, "data length: expected 5, got 4");
        assert_eq!(f.expected.as_deref(), Some("5"));
        assert_eq!(f.actual.as_deref(), Some("4"));
        assert_eq!(f.to_string(), "Unexpected record count: data length: expected 5, got 4");
    }

    #[test]
    fn checks_are_errors() {
        assert_eq!(CheckKind::Schema.default_severity(), Severity::Error);
        assert_eq!(
            CheckFailure::new(CheckKind::Determinism, "bodies differ").severity(),
            Severity::Error
        );
    }

    #[test]
    fn kind_serializes_snake_case() {
        let json = serde_json::to_string(&CheckKind::FieldPresence).unwrap();
        assert_eq!(json, "\"field_presence\"");
    }

    #[test]
    fn plain_failure_omits_expected_actual() {
        let f = CheckFailure::new(CheckKind::Envelope, "body is not JSON");
        let json = serde_json::to_value(&f).unwrap();
        assert!(json.get("expected").is_none());
        assert_eq!(json["kind"], "envelope");
    }
}
