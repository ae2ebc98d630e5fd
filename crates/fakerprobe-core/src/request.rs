//! Request specs: endpoint + query parameters, built by value
//!
//! A `RequestSpec` is never mutated in place. Every builder call consumes the
//! spec and returns the updated one, so a base spec shared between cases has
//! to be cloned explicitly.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Quantity the service returns when `_quantity` is absent.
pub const DEFAULT_QUANTITY: u32 = 10;

/// Server-side cap on returned records.
pub const MAX_QUANTITY: u32 = 1000;

pub const LOCALE_PARAM: &str = "_locale";
pub const QUANTITY_PARAM: &str = "_quantity";
pub const SEED_PARAM: &str = "_seed";

/// Number of records a response must carry for a requested quantity.
#[must_use]
pub fn expected_count(requested: u32) -> u32 {
    requested.min(MAX_QUANTITY)
}

/// Scalar query parameter value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Str(String),
}

impl ParamValue {
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Str(_) => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            Self::Int(_) => None,
        }
    }

    /// Compare against a JSON value from a response record.
    ///
    /// Integers match JSON numbers with the same integral value; strings match
    /// JSON strings exactly.
    #[must_use]
    pub fn matches_json(&self, value: &serde_json::Value) -> bool {
        match (self, value) {
            (Self::Int(expected), serde_json::Value::Number(n)) => {
                n.as_i64() == Some(*expected)
                    || n.as_f64().is_some_and(|f| f.fract() == 0.0 && f as i64 == *expected)
            }
            (Self::Str(expected), serde_json::Value::String(s)) => s == expected,
            _ => false,
        }
    }
}

impl std::fmt::Display for ParamValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<u32> for ParamValue {
    fn from(v: u32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

/// One API call: endpoint plus accumulated query parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RequestSpec {
    endpoint: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    params: BTreeMap<String, ParamValue>,
}

impl RequestSpec {
    /// Empty parameter set bound to `endpoint` (server defaults apply).
    #[must_use]
    pub fn create(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            params: BTreeMap::new(),
        }
    }

    /// Set `key` to `value`. An existing value for `key` is replaced.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Apply every `(key, value)` pair in order.
    #[must_use]
    pub fn with_all<'a>(self, params: impl IntoIterator<Item = (&'a str, &'a ParamValue)>) -> Self {
        params
            .into_iter()
            .fold(self, |spec, (k, v)| spec.with(k, v.clone()))
    }

    #[must_use]
    pub fn locale(self, locale: impl Into<String>) -> Self {
        self.with(LOCALE_PARAM, ParamValue::Str(locale.into()))
    }

    #[must_use]
    pub fn quantity(self, quantity: u32) -> Self {
        self.with(QUANTITY_PARAM, quantity)
    }

    #[must_use]
    pub fn seed(self, seed: i64) -> Self {
        self.with(SEED_PARAM, seed)
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    #[must_use]
    pub fn param(&self, key: &str) -> Option<&ParamValue> {
        self.params.get(key)
    }

    #[must_use]
    pub fn params(&self) -> &BTreeMap<String, ParamValue> {
        &self.params
    }

    /// `_quantity` as sent, or the server default when unset or not a
    /// non-negative integer.
    #[must_use]
    pub fn requested_quantity(&self) -> u32 {
        self.param(QUANTITY_PARAM)
            .and_then(ParamValue::as_int)
            .and_then(|q| u32::try_from(q).ok())
            .unwrap_or(DEFAULT_QUANTITY)
    }

    /// Query pairs in key order, values rendered as strings.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.params
            .iter()
            .map(|(k, v)| (k.clone(), v.to_string()))
            .collect()
    }

    /// Human-readable label, e.g. `GET /images?_quantity=1&_width=500`.
    #[must_use]
    pub fn label(&self) -> String {
        if self.params.is_empty() {
            return format!("GET {}", self.endpoint);
        }
        let query = self
            .query_pairs()
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        format!("GET {}?{query}", self.endpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn create_has_no_params() {
        let spec = RequestSpec::create("/companies");
        assert_eq!(spec.endpoint(), "/companies");
        assert!(spec.params().is_empty());
        assert!(spec.query_pairs().is_empty());
        assert_eq!(spec.label(), "GET /companies");
    }

    #[test]
    fn shorthands_use_well_known_keys() {
        let spec = RequestSpec::create("/users")
            .locale("fr_FR")
            .quantity(5)
            .seed(42);
        assert_eq!(spec.param("_locale"), Some(&ParamValue::from("fr_FR")));
        assert_eq!(spec.param("_quantity"), Some(&ParamValue::Int(5)));
        assert_eq!(spec.param("_seed"), Some(&ParamValue::Int(42)));
    }

    #[test]
    fn same_key_overwrites() {
        let spec = RequestSpec::create("/images")
            .quantity(3)
            .with("_width", 100)
            .quantity(7)
            .with("_width", "wide");
        assert_eq!(spec.requested_quantity(), 7);
        assert_eq!(spec.param("_width"), Some(&ParamValue::from("wide")));
        assert_eq!(spec.params().len(), 2);
    }

    #[test]
    fn clone_does_not_alias() {
        let base = RequestSpec::create("/products").quantity(2);
        let taxed = base.clone().with("_taxes", 12);
        assert!(base.param("_taxes").is_none());
        assert_eq!(taxed.param("_taxes"), Some(&ParamValue::Int(12)));
    }

    #[test]
    fn requested_quantity_defaults() {
        assert_eq!(RequestSpec::create("/users").requested_quantity(), 10);
        let odd = RequestSpec::create("/users").with("_quantity", "many");
        assert_eq!(odd.requested_quantity(), 10);
        let negative = RequestSpec::create("/users").with("_quantity", -5);
        assert_eq!(negative.requested_quantity(), 10);
    }

    #[test]
    fn label_lists_params_in_key_order() {
        let spec = RequestSpec::create("/images")
            .with("_width", 500)
            .with("_height", 300)
            .quantity(1);
        assert_eq!(
            spec.label(),
            "GET /images?_height=300&_quantity=1&_width=500"
        );
    }

    #[test]
    fn param_value_matches_json() {
        assert!(ParamValue::Int(12).matches_json(&serde_json::json!(12)));
        assert!(ParamValue::Int(12).matches_json(&serde_json::json!(12.0)));
        assert!(!ParamValue::Int(12).matches_json(&serde_json::json!("12")));
        assert!(ParamValue::from("male").matches_json(&serde_json::json!("male")));
        assert!(!ParamValue::from("male").matches_json(&serde_json::json!(1)));
    }

    #[test]
    fn param_value_deserializes_untagged() {
        let v: ParamValue = serde_json::from_str("640").unwrap();
        assert_eq!(v, ParamValue::Int(640));
        let v: ParamValue = serde_json::from_str("\"any\"").unwrap();
        assert_eq!(v, ParamValue::from("any"));
    }

    proptest! {
        #[test]
        fn last_write_wins(values in proptest::collection::vec(any::<i64>(), 1..16)) {
            let spec = values
                .iter()
                .fold(RequestSpec::create("/products"), |s, v| s.with("_taxes", *v));
            prop_assert_eq!(spec.param("_taxes"), Some(&ParamValue::Int(*values.last().unwrap())));
            prop_assert_eq!(spec.params().len(), 1);
        }

        #[test]
        fn expected_count_is_clamped(q in 0u32..100_000) {
            let n = expected_count(q);
            prop_assert!(n <= MAX_QUANTITY);
            prop_assert_eq!(n, q.min(1000));
        }
    }
}
