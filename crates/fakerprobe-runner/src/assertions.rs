//! Response assertions
//!
//! No I/O except `assert_deterministic`, which needs two live requests.
//! Every check returns the first violation as a `CheckFailure` carrying
//! expected and actual values.

use std::collections::HashMap;

use fakerprobe_core::request::expected_count;
use fakerprobe_core::resource::{
    AxisCheck, Expectation, FormatCheck, FormatRule, NestedKind, NestedRule,
};
use fakerprobe_core::{CheckFailure, CheckKind, ParamValue, RequestSpec, ResourceDescriptor};
use regex::Regex;
use serde_json::Value;

use crate::error::{CaseError, SetupError};
use crate::executor::{RequestExecutor, Response, STATUS_OK};
use crate::schema::CompiledSchema;

/// Top-level keys of every response envelope.
pub const ENVELOPE_FIELDS: &[&str] = &["status", "code", "total", "data"];

/// Quantity sent with both determinism requests.
pub const DETERMINISM_QUANTITY: u32 = 5;

// ── Helpers ──

/// Scalar rendered as text: strings as-is, anything else as JSON.
fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn records(resp: &Response) -> Result<&[Value], CheckFailure> {
    resp.records().ok_or_else(|| {
        CheckFailure::new(CheckKind::Envelope, "response has no `data` array")
    })
}

fn first_record(resp: &Response) -> Result<&Value, CheckFailure> {
    records(resp)?
        .first()
        .ok_or_else(|| CheckFailure::new(CheckKind::Envelope, "`data` is empty"))
}

/// Apply `check` to `field` of every record, reporting the first record
/// that fails.
fn every_record(
    resp: &Response,
    field: &str,
    kind: CheckKind,
    expected: &str,
    check: impl Fn(&Value) -> bool,
) -> Result<(), CheckFailure> {
    for (i, record) in records(resp)?.iter().enumerate() {
        let value = record.get(field).unwrap_or(&Value::Null);
        if !check(value) {
            return Err(CheckFailure::mismatch(
                kind,
                &format!("data[{i}].{field}"),
                expected,
                value,
            ));
        }
    }
    Ok(())
}

// ── Format patterns ──

/// Regexes of every `FormatCheck::Pattern` rule, compiled once per run.
#[derive(Debug, Default)]
pub struct FormatPatterns {
    compiled: HashMap<&'static str, Regex>,
}

impl FormatPatterns {
    /// # Errors
    ///
    /// Returns error for the first pattern that does not compile.
    pub fn compile(descriptors: &[ResourceDescriptor]) -> Result<Self, SetupError> {
        let mut compiled = HashMap::new();
        for rule in descriptors.iter().flat_map(|d| &d.formats) {
            if let FormatCheck::Pattern(p) = rule.check {
                if !compiled.contains_key(p) {
                    let re = Regex::new(p)
                        .map_err(|e| SetupError::InvalidPattern(p.to_string(), e.to_string()))?;
                    compiled.insert(p, re);
                }
            }
        }
        Ok(Self { compiled })
    }

    /// Pattern not compiled → no match.
    fn is_match(&self, pattern: &str, value: &str) -> bool {
        self.compiled
            .get(pattern)
            .is_some_and(|re| re.is_match(value))
    }
}

// ── Envelope ──

/// Status code 200 and envelope status `OK`.
///
/// # Errors
///
/// Returns the first of the two that does not hold.
pub fn assert_ok(resp: &Response) -> Result<(), CheckFailure> {
    if resp.status_code != 200 {
        return Err(CheckFailure::mismatch(
            CheckKind::Status,
            "status code",
            200,
            resp.status_code,
        ));
    }
    match resp.field("status") {
        Some(Value::String(s)) if s == STATUS_OK => Ok(()),
        Some(other) => Err(CheckFailure::mismatch(
            CheckKind::Status,
            "envelope status",
            STATUS_OK,
            other,
        )),
        None => Err(CheckFailure::mismatch(
            CheckKind::Status,
            "envelope status",
            STATUS_OK,
            "<missing>",
        )),
    }
}

/// Whether the body is a JSON object carrying every key in `fields`.
/// A body that does not parse carries no fields.
#[must_use]
pub fn has_fields(resp: &Response, fields: &[&str]) -> bool {
    resp.json()
        .and_then(Value::as_object)
        .is_some_and(|obj| fields.iter().all(|f| obj.contains_key(*f)))
}

/// Envelope carries `status`, `code`, `total` and `data`.
///
/// # Errors
///
/// Returns failure naming the missing keys.
pub fn assert_envelope_shape(resp: &Response) -> Result<(), CheckFailure> {
    if has_fields(resp, ENVELOPE_FIELDS) {
        return Ok(());
    }
    let missing: Vec<&str> = match resp.json().and_then(Value::as_object) {
        Some(obj) => ENVELOPE_FIELDS
            .iter()
            .copied()
            .filter(|f| !obj.contains_key(*f))
            .collect(),
        None => ENVELOPE_FIELDS.to_vec(),
    };
    Err(CheckFailure::mismatch(
        CheckKind::Envelope,
        "envelope fields",
        ENVELOPE_FIELDS.join(", "),
        format!("missing {}", missing.join(", ")),
    ))
}

/// Body conforms to the resource schema.
///
/// # Errors
///
/// Returns failure with the first few schema violations.
pub fn assert_schema(resp: &Response, schema: &CompiledSchema) -> Result<(), CheckFailure> {
    let Some(body) = resp.json() else {
        return Err(CheckFailure::new(CheckKind::Schema, "body is not JSON"));
    };
    let violations = schema.violations(body);
    if violations.is_empty() {
        Ok(())
    } else {
        Err(CheckFailure::new(
            CheckKind::Schema,
            format!("{}: {}", schema.path().display(), violations.join("; ")),
        ))
    }
}

/// `len(data) == min(requested, MAX_QUANTITY)`.
///
/// # Errors
///
/// Returns failure if `data` is missing or has the wrong length.
pub fn assert_count(resp: &Response, requested: u32) -> Result<(), CheckFailure> {
    let actual = records(resp)?.len();
    let expected = expected_count(requested) as usize;
    if actual == expected {
        Ok(())
    } else {
        Err(CheckFailure::mismatch(
            CheckKind::Count,
            &format!("data length for _quantity={requested}"),
            expected,
            actual,
        ))
    }
}

/// Envelope `locale` echoes the requested locale verbatim.
///
/// # Errors
///
/// Returns failure if `locale` is missing or different.
pub fn assert_locale(resp: &Response, locale: &str) -> Result<(), CheckFailure> {
    match resp.field("locale") {
        Some(Value::String(s)) if s == locale => Ok(()),
        Some(other) => Err(CheckFailure::mismatch(
            CheckKind::Locale,
            "envelope locale",
            locale,
            other,
        )),
        None => Err(CheckFailure::mismatch(
            CheckKind::Locale,
            "envelope locale",
            locale,
            "<missing>",
        )),
    }
}

/// Two requests with the same seed return byte-identical bodies.
///
/// Returns the second response.
///
/// # Errors
///
/// Transport errors of either request, a non-OK first response, or a
/// body mismatch.
pub fn assert_deterministic(
    executor: &RequestExecutor,
    endpoint: &str,
    seed: i64,
) -> Result<Response, CaseError> {
    let spec = RequestSpec::create(endpoint)
        .quantity(DETERMINISM_QUANTITY)
        .seed(seed);

    let first = executor.send(&spec)?;
    assert_ok(&first)?;
    let second = executor.send(&spec)?;

    if first.body == second.body {
        return Ok(second);
    }
    let offset = first
        .body
        .bytes()
        .zip(second.body.bytes())
        .position(|(a, b)| a != b)
        .unwrap_or_else(|| first.body.len().min(second.body.len()));
    Err(CheckFailure::new(
        CheckKind::Determinism,
        format!(
            "bodies for _seed={seed} differ at byte {offset} ({} vs {} bytes)",
            first.body.len(),
            second.body.len()
        ),
    )
    .into())
}

// ── Records ──

/// First record carries every field in `fields`, none of them null.
///
/// # Errors
///
/// Returns failure listing the missing fields.
pub fn assert_fields_present(resp: &Response, fields: &[&str]) -> Result<(), CheckFailure> {
    let record = first_record(resp)?;
    let missing: Vec<&str> = fields
        .iter()
        .copied()
        .filter(|f| record.get(*f).is_none_or(Value::is_null))
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(CheckFailure::new(
            CheckKind::FieldPresence,
            format!("data[0] missing {}", missing.join(", ")),
        ))
    }
}

/// Nested array (non-empty, every element checked) or object on every
/// record carries the rule's fields, none of them null.
///
/// # Errors
///
/// Returns failure for the first nested value with the wrong shape or
/// missing fields.
pub fn assert_nested(resp: &Response, rule: &NestedRule) -> Result<(), CheckFailure> {
    let records = records(resp)?;
    if records.is_empty() {
        return Err(CheckFailure::new(CheckKind::Envelope, "`data` is empty"));
    }

    for (i, record) in records.iter().enumerate() {
        let value = record.get(rule.field).unwrap_or(&Value::Null);
        let path = format!("data[{i}].{}", rule.field);
        match rule.kind {
            NestedKind::Array => {
                let Some(items) = value.as_array() else {
                    return Err(CheckFailure::mismatch(
                        CheckKind::FieldPresence,
                        &path,
                        "array",
                        value,
                    ));
                };
                if items.is_empty() {
                    return Err(CheckFailure::new(
                        CheckKind::FieldPresence,
                        format!("{path} is empty"),
                    ));
                }
                for (j, item) in items.iter().enumerate() {
                    nested_fields(item, rule.required, &format!("{path}[{j}]"))?;
                }
            }
            NestedKind::Object => {
                if !value.is_object() {
                    return Err(CheckFailure::mismatch(
                        CheckKind::FieldPresence,
                        &path,
                        "object",
                        value,
                    ));
                }
                nested_fields(value, rule.required, &path)?;
            }
        }
    }
    Ok(())
}

fn nested_fields(target: &Value, required: &[&str], path: &str) -> Result<(), CheckFailure> {
    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|f| target.get(*f).is_none_or(Value::is_null))
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(CheckFailure::new(
            CheckKind::FieldPresence,
            format!("{path} missing {}", missing.join(", ")),
        ))
    }
}

/// Every record's string field satisfies the rule.
///
/// # Errors
///
/// Returns failure for the first non-string or non-matching value.
pub fn assert_format(
    resp: &Response,
    rule: &FormatRule,
    patterns: &FormatPatterns,
) -> Result<(), CheckFailure> {
    let expected = rule.check.to_string();
    every_record(resp, rule.field, CheckKind::Format, &expected, |v| {
        let Some(s) = v.as_str() else {
            return false;
        };
        match rule.check {
            FormatCheck::Contains(needle) => s.contains(needle),
            FormatCheck::StartsWith(prefix) => s.starts_with(prefix),
            FormatCheck::Pattern(p) => patterns.is_match(p, s),
        }
    })
}

/// Expectation of one valid axis value.
///
/// # Errors
///
/// Returns failure for the first record that does not reflect `value`.
pub fn assert_axis(resp: &Response, check: AxisCheck, value: &ParamValue) -> Result<(), CheckFailure> {
    match check {
        AxisCheck::Count => Ok(()),
        AxisCheck::FieldContainsValue(field) => {
            let needle = value.to_string();
            every_record(
                resp,
                field,
                CheckKind::Value,
                &format!("contains \"{needle}\""),
                |v| text(v).contains(&needle),
            )
        }
        AxisCheck::FieldEqualsValue(field) => {
            every_record(resp, field, CheckKind::Value, &value.to_string(), |v| {
                value.matches_json(v)
            })
        }
        AxisCheck::FirstElementKind(field) => {
            let record = first_record(resp)?;
            let path = format!("data[0].{field}[0]");
            let Some(element) = record
                .get(field)
                .and_then(Value::as_array)
                .and_then(|a| a.first())
            else {
                return Err(CheckFailure::new(
                    CheckKind::FieldPresence,
                    format!("{path} is missing"),
                ));
            };
            let (ok, expected) = match value.as_str() {
                Some("integer") => (element.is_number(), "number"),
                Some("string" | "uuid") => (element.is_string(), "string"),
                _ => (!element.is_null(), "non-null value"),
            };
            if ok {
                Ok(())
            } else {
                Err(CheckFailure::mismatch(CheckKind::Value, &path, expected, element))
            }
        }
    }
}

/// One scenario expectation.
///
/// # Errors
///
/// Returns the failure of the underlying check.
pub fn assert_expectation(
    resp: &Response,
    expectation: &Expectation,
    requested: u32,
    schema: &CompiledSchema,
) -> Result<(), CheckFailure> {
    match expectation {
        Expectation::Count => assert_count(resp, requested),
        Expectation::Schema => assert_schema(resp, schema),
        Expectation::FieldContains { field, needle } => every_record(
            resp,
            field,
            CheckKind::Value,
            &format!("contains \"{needle}\""),
            |v| text(v).contains(needle),
        ),
        Expectation::FieldEquals { field, value } => {
            every_record(resp, field, CheckKind::Value, &value.to_string(), |v| {
                value.matches_json(v)
            })
        }
    }
}
