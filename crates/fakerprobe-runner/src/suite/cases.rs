//! Case collection: expands a resource descriptor and the run's fixtures
//! into the ordered list of cases a suite executes

use fakerprobe_core::resource::{AxisCheck, FormatRule, NestedRule, Scenario};
use fakerprobe_core::{AxisValues, CommonFixtures, ParamValue, Probe, RequestSpec, ResourceDescriptor};

use crate::assertions::DETERMINISM_QUANTITY;

/// Quantity for the schema, nested and format cases.
pub(crate) const SAMPLE_QUANTITY: u32 = 3;

/// What a case sends and checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseKind {
    /// Server defaults: ok, envelope shape, default count
    Default,
    /// Small sample validated against the resource schema
    Schema,
    Locale(String),
    Quantity(u32),
    Determinism(i64),
    RequiredFields,
    Nested(NestedRule),
    Format(FormatRule),
    Axis {
        param: &'static str,
        value: ParamValue,
        quantity: u32,
        check: AxisCheck,
    },
    Scenario(Scenario),
    /// Only a response is required; its status is recorded
    Probe(Probe),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    pub name: String,
    pub kind: CaseKind,
}

impl TestCase {
    fn new(name: impl Into<String>, kind: CaseKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    #[must_use]
    pub const fn is_probe(&self) -> bool {
        matches!(self.kind, CaseKind::Probe(_))
    }

    /// The request this case sends. Determinism cases send it twice.
    #[must_use]
    pub fn request(&self, endpoint: &str) -> RequestSpec {
        let base = RequestSpec::create(endpoint);
        match &self.kind {
            CaseKind::Default => base,
            CaseKind::Schema | CaseKind::Format(_) | CaseKind::Nested(_) => {
                base.quantity(SAMPLE_QUANTITY)
            }
            CaseKind::Locale(locale) => base.locale(locale.clone()),
            CaseKind::Quantity(q) => base.quantity(*q),
            CaseKind::Determinism(seed) => base.quantity(DETERMINISM_QUANTITY).seed(*seed),
            CaseKind::RequiredFields => base.quantity(1),
            CaseKind::Axis {
                param,
                value,
                quantity,
                ..
            } => base.quantity(*quantity).with(*param, value.clone()),
            CaseKind::Scenario(s) => base.with_all(s.params.iter().map(|(k, v)| (*k, v))),
            CaseKind::Probe(p) => base.with_all(p.params.iter().map(|(k, v)| (k.as_str(), v))),
        }
    }
}

/// Every case of one suite, in execution order.
///
/// `axes` are the fixture values of the descriptor's axes; `extra_probes`
/// are config-defined probes for this resource and run last.
#[must_use]
pub fn collect_cases(
    descriptor: &ResourceDescriptor,
    common: &CommonFixtures,
    axes: &[AxisValues],
    extra_probes: &[Probe],
) -> Vec<TestCase> {
    let mut cases = vec![
        TestCase::new("default", CaseKind::Default),
        TestCase::new("schema", CaseKind::Schema),
    ];

    cases.extend(
        common
            .locales
            .iter()
            .map(|l| TestCase::new(format!("locale[{l}]"), CaseKind::Locale(l.clone()))),
    );
    cases.extend(
        common
            .quantities
            .iter()
            .map(|q| TestCase::new(format!("quantity[{q}]"), CaseKind::Quantity(*q))),
    );
    cases.extend(
        common
            .seeds
            .iter()
            .map(|s| TestCase::new(format!("determinism[seed={s}]"), CaseKind::Determinism(*s))),
    );

    cases.push(TestCase::new("required fields", CaseKind::RequiredFields));
    cases.extend(descriptor.nested.iter().map(|rule| {
        TestCase::new(format!("nested[{}]", rule.field), CaseKind::Nested(rule.clone()))
    }));
    cases.extend(descriptor.formats.iter().map(|rule| {
        TestCase::new(format!("format[{}]", rule.field), CaseKind::Format(rule.clone()))
    }));

    // Valid axis values, paired with their spec by parameter name
    for axis in &descriptor.axes {
        let Some(values) = axes.iter().find(|v| v.param == axis.param) else {
            continue;
        };
        cases.extend(values.valid.iter().map(|value| {
            TestCase::new(
                format!("axis[{}={value}]", axis.param),
                CaseKind::Axis {
                    param: axis.param,
                    value: value.clone(),
                    quantity: axis.quantity,
                    check: axis.check,
                },
            )
        }));
    }

    cases.extend(descriptor.scenarios.iter().map(|s| {
        TestCase::new(format!("scenario[{}]", s.name), CaseKind::Scenario(s.clone()))
    }));

    // Negative probes: invalid axis values, fixed probes, config probes
    for values in axes {
        let quantity = descriptor
            .axes
            .iter()
            .find(|a| a.param == values.param)
            .map_or(1, |a| a.quantity);
        for value in &values.invalid {
            let label = format!("{}={value}", values.param);
            cases.push(TestCase::new(
                format!("probe[{label}]"),
                CaseKind::Probe(Probe::new(
                    label,
                    &[("_quantity", quantity.into()), (values.param, value.clone())],
                )),
            ));
        }
    }
    cases.extend(
        descriptor
            .probes
            .iter()
            .chain(extra_probes)
            .map(|p| TestCase::new(format!("probe[{}]", p.label), CaseKind::Probe(p.clone()))),
    );

    cases
}
