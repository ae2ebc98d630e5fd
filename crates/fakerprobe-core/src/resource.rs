//! Resource families and their static test descriptors
//!
//! A [`ResourceDescriptor`] is everything that distinguishes one suite from
//! another. The suite executor is generic over it; no resource gets its own
//! code path.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::request::ParamValue;

/// Canonical 8-4-4-4-12 hexadecimal UUID.
pub const UUID_PATTERN: &str =
    "^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$";

/// Resource family exposed by the service.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    #[serde(alias = "companies")]
    Company,
    #[serde(alias = "products")]
    Product,
    #[serde(alias = "users")]
    User,
    #[serde(alias = "images")]
    Image,
}

impl Resource {
    pub const ALL: [Self; 4] = [Self::Company, Self::Product, Self::User, Self::Image];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Company => "company",
            Self::Product => "product",
            Self::User => "user",
            Self::Image => "image",
        }
    }

    #[must_use]
    pub const fn endpoint(self) -> &'static str {
        match self {
            Self::Company => "/companies",
            Self::Product => "/products",
            Self::User => "/users",
            Self::Image => "/images",
        }
    }

    /// Schema file name, relative to the schema directory.
    #[must_use]
    pub const fn schema_file(self) -> &'static str {
        match self {
            Self::Company => "company-schema.json",
            Self::Product => "product-schema.json",
            Self::User => "user-schema.json",
            Self::Image => "image-schema.json",
        }
    }

    /// Parse a resource name; accepts singular, plural, or endpoint form.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim().trim_start_matches('/').to_ascii_lowercase();
        Self::ALL.into_iter().find(|r| {
            name == r.as_str() || name == r.endpoint().trim_start_matches('/')
        })
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shape of a nested field on the first record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NestedKind {
    /// Non-empty array; its first element must carry the required fields.
    Array,
    /// Object carrying the required fields.
    Object,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NestedRule {
    pub field: &'static str,
    pub kind: NestedKind,
    pub required: &'static [&'static str],
}

/// String check applied to one field of every record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatCheck {
    Contains(&'static str),
    StartsWith(&'static str),
    /// Regular expression the whole value must match.
    Pattern(&'static str),
}

impl std::fmt::Display for FormatCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Contains(s) => write!(f, "contains \"{s}\""),
            Self::StartsWith(s) => write!(f, "starts with \"{s}\""),
            Self::Pattern(p) => write!(f, "matches /{p}/"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatRule {
    pub field: &'static str,
    pub check: FormatCheck,
}

/// What a valid axis value must produce in the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisCheck {
    /// Only the record count is checked.
    Count,
    /// `field` of every record contains the value's text.
    FieldContainsValue(&'static str),
    /// `field` of every record equals the value.
    FieldEqualsValue(&'static str),
    /// First element of array `field` has the JSON kind the value names
    /// (`integer` → number, `string`/`uuid` → string).
    FirstElementKind(&'static str),
}

/// One resource-specific query parameter fed from a fixture file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisSpec {
    pub param: &'static str,
    /// Fixture key holding valid values.
    pub valid_key: &'static str,
    /// Fixture key holding invalid/boundary values, if any.
    pub invalid_key: Option<&'static str>,
    /// `_quantity` sent with each axis case.
    pub quantity: u32,
    pub check: AxisCheck,
}

/// Expectation attached to a fixed scenario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expectation {
    /// Record count equals `min(requested, MAX_QUANTITY)`.
    Count,
    /// Body conforms to the resource schema.
    Schema,
    /// `field` of every record contains `needle`.
    FieldContains {
        field: &'static str,
        needle: &'static str,
    },
    /// `field` of every record equals `value`.
    FieldEquals {
        field: &'static str,
        value: ParamValue,
    },
}

/// Fixed parameter set with its expectations. Status 200 + `OK` is always
/// asserted first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    pub name: &'static str,
    pub params: Vec<(&'static str, ParamValue)>,
    pub expectations: Vec<Expectation>,
}

/// Negative/boundary request whose outcome is only observed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Probe {
    pub label: String,
    #[serde(default)]
    pub params: BTreeMap<String, ParamValue>,
}

impl Probe {
    #[must_use]
    pub fn new(label: impl Into<String>, params: &[(&str, ParamValue)]) -> Self {
        Self {
            label: label.into(),
            params: params
                .iter()
                .map(|(k, v)| ((*k).to_string(), v.clone()))
                .collect(),
        }
    }
}

/// Static configuration of one resource suite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDescriptor {
    pub resource: Resource,
    pub endpoint: &'static str,
    pub schema_file: &'static str,
    /// Fixture file with the axis values, relative to the data directory.
    pub fixture_file: Option<&'static str>,
    pub required_fields: &'static [&'static str],
    pub nested: Vec<NestedRule>,
    pub formats: Vec<FormatRule>,
    pub axes: Vec<AxisSpec>,
    pub scenarios: Vec<Scenario>,
    pub probes: Vec<Probe>,
}

impl ResourceDescriptor {
    #[must_use]
    pub fn for_resource(resource: Resource) -> Self {
        match resource {
            Resource::Company => company(),
            Resource::Product => product(),
            Resource::User => user(),
            Resource::Image => image(),
        }
    }

    #[must_use]
    pub fn all() -> Vec<Self> {
        Resource::ALL.into_iter().map(Self::for_resource).collect()
    }

    fn base(resource: Resource) -> Self {
        Self {
            resource,
            endpoint: resource.endpoint(),
            schema_file: resource.schema_file(),
            fixture_file: None,
            required_fields: &[],
            nested: Vec::new(),
            formats: Vec::new(),
            axes: Vec::new(),
            scenarios: Vec::new(),
            probes: Vec::new(),
        }
    }
}

fn combined(seed: i64, quantity: u32, extra: &[(&'static str, ParamValue)]) -> Scenario {
    let mut params = vec![
        ("_locale", ParamValue::from("en_US")),
        ("_quantity", ParamValue::from(quantity)),
        ("_seed", ParamValue::Int(seed)),
    ];
    params.extend(extra.iter().cloned());
    Scenario {
        name: "combined",
        params,
        expectations: vec![Expectation::Count, Expectation::Schema],
    }
}

fn company() -> ResourceDescriptor {
    ResourceDescriptor {
        required_fields: &[
            "id", "name", "email", "vat", "phone", "country", "addresses", "website", "image",
            "contact",
        ],
        nested: vec![
            NestedRule {
                field: "addresses",
                kind: NestedKind::Array,
                required: &[
                    "street",
                    "city",
                    "country",
                    "country_code",
                    "latitude",
                    "longitude",
                ],
            },
            NestedRule {
                field: "contact",
                kind: NestedKind::Object,
                required: &["id", "firstname", "lastname", "email", "phone", "gender"],
            },
        ],
        formats: vec![
            FormatRule {
                field: "email",
                check: FormatCheck::Contains("@"),
            },
            FormatRule {
                field: "phone",
                check: FormatCheck::StartsWith("+"),
            },
            FormatRule {
                field: "website",
                check: FormatCheck::StartsWith("http"),
            },
        ],
        scenarios: vec![combined(12345, 5, &[])],
        ..ResourceDescriptor::base(Resource::Company)
    }
}

fn product() -> ResourceDescriptor {
    ResourceDescriptor {
        fixture_file: Some("products.json"),
        required_fields: &["id", "name", "price", "categories"],
        axes: vec![
            AxisSpec {
                param: "_taxes",
                valid_key: "valid_taxes",
                invalid_key: None,
                quantity: 2,
                check: AxisCheck::FieldEqualsValue("taxes"),
            },
            AxisSpec {
                param: "_categories_type",
                valid_key: "category_types",
                invalid_key: None,
                quantity: 2,
                check: AxisCheck::FirstElementKind("categories"),
            },
        ],
        scenarios: vec![
            Scenario {
                name: "taxes pinned",
                params: vec![("_quantity", 5.into()), ("_taxes", 12.into())],
                expectations: vec![Expectation::FieldEquals {
                    field: "taxes",
                    value: ParamValue::Int(12),
                }],
            },
            Scenario {
                name: "price range",
                params: vec![
                    ("_quantity", 5.into()),
                    ("_price_min", 50.into()),
                    ("_price_max", 500.into()),
                ],
                expectations: vec![],
            },
            combined(
                12345,
                10,
                &[("_taxes", 12.into()), ("_categories_type", "uuid".into())],
            ),
        ],
        ..ResourceDescriptor::base(Resource::Product)
    }
}

fn user() -> ResourceDescriptor {
    ResourceDescriptor {
        fixture_file: Some("users.json"),
        required_fields: &["id", "uuid", "firstname", "email"],
        formats: vec![
            FormatRule {
                field: "uuid",
                check: FormatCheck::Pattern(UUID_PATTERN),
            },
            FormatRule {
                field: "email",
                check: FormatCheck::Contains("@"),
            },
        ],
        axes: vec![AxisSpec {
            param: "_gender",
            valid_key: "genders",
            invalid_key: Some("invalid_genders"),
            quantity: 3,
            check: AxisCheck::Count,
        }],
        scenarios: vec![combined(54321, 5, &[("_gender", "male".into())])],
        ..ResourceDescriptor::base(Resource::User)
    }
}

fn image() -> ResourceDescriptor {
    ResourceDescriptor {
        fixture_file: Some("images.json"),
        required_fields: &["title", "description", "url"],
        formats: vec![FormatRule {
            field: "url",
            check: FormatCheck::StartsWith("https://"),
        }],
        axes: vec![
            AxisSpec {
                param: "_type",
                valid_key: "valid_types",
                invalid_key: Some("invalid_types"),
                quantity: 2,
                check: AxisCheck::Count,
            },
            AxisSpec {
                param: "_width",
                valid_key: "valid_widths",
                invalid_key: Some("invalid_widths"),
                quantity: 1,
                check: AxisCheck::FieldContainsValue("url"),
            },
            AxisSpec {
                param: "_height",
                valid_key: "valid_heights",
                invalid_key: Some("invalid_heights"),
                quantity: 1,
                check: AxisCheck::FieldContainsValue("url"),
            },
        ],
        scenarios: vec![
            Scenario {
                name: "width and height",
                params: vec![
                    ("_quantity", 1.into()),
                    ("_width", 500.into()),
                    ("_height", 300.into()),
                ],
                expectations: vec![
                    Expectation::FieldContains {
                        field: "url",
                        needle: "500",
                    },
                    Expectation::FieldContains {
                        field: "url",
                        needle: "300",
                    },
                ],
            },
            combined(
                12345,
                5,
                &[
                    ("_type", "any".into()),
                    ("_width", 640.into()),
                    ("_height", 480.into()),
                ],
            ),
        ],
        probes: vec![
            Probe::new(
                "zero width and height",
                &[("_quantity", 1.into()), ("_width", 0.into()), ("_height", 0.into())],
            ),
            Probe::new(
                "negative width and height",
                &[
                    ("_quantity", 1.into()),
                    ("_width", (-100).into()),
                    ("_height", (-100).into()),
                ],
            ),
            Probe::new(
                "extreme width",
                &[("_quantity", 1.into()), ("_width", 999_999.into())],
            ),
            Probe::new(
                "extreme height",
                &[("_quantity", 1.into()), ("_height", 999_999.into())],
            ),
        ],
        ..ResourceDescriptor::base(Resource::Image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_and_schemas() {
        assert_eq!(Resource::Company.endpoint(), "/companies");
        assert_eq!(Resource::Image.schema_file(), "image-schema.json");
        let all = ResourceDescriptor::all();
        assert_eq!(all.len(), 4);
        for d in &all {
            assert_eq!(d.endpoint, d.resource.endpoint());
            assert!(!d.required_fields.is_empty());
        }
    }

    #[test]
    fn parse_accepts_common_spellings() {
        assert_eq!(Resource::parse("company"), Some(Resource::Company));
        assert_eq!(Resource::parse("Products"), Some(Resource::Product));
        assert_eq!(Resource::parse("/users"), Some(Resource::User));
        assert_eq!(Resource::parse("images"), Some(Resource::Image));
        assert_eq!(Resource::parse("books"), None);
    }

    #[test]
    fn resource_serde_accepts_plural() {
        let r: Resource = serde_json::from_str("\"images\"").unwrap();
        assert_eq!(r, Resource::Image);
        assert_eq!(serde_json::to_string(&Resource::Image).unwrap(), "\"image\"");
    }

    #[test]
    fn axes_require_fixture_file() {
        for d in ResourceDescriptor::all() {
            if !d.axes.is_empty() {
                assert!(d.fixture_file.is_some(), "{} has axes but no fixture", d.resource);
            }
        }
    }

    #[test]
    fn every_suite_has_a_combined_scenario() {
        for d in ResourceDescriptor::all() {
            let combined = d.scenarios.iter().find(|s| s.name == "combined").unwrap();
            assert!(combined.expectations.contains(&Expectation::Schema));
            assert!(combined.params.iter().any(|(k, _)| *k == "_seed"));
        }
    }

    #[test]
    fn image_probes_are_fixed() {
        let d = ResourceDescriptor::for_resource(Resource::Image);
        assert_eq!(d.probes.len(), 4);
        assert_eq!(d.probes[2].params.get("_width"), Some(&ParamValue::Int(999_999)));
    }
}
