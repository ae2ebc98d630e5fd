//! Generic suite execution
//!
//! One executor serves every resource: a `ResourceDescriptor` plus the
//! run's `TestContext` expand into cases, each case builds a request,
//! sends it, and runs its assertions.

mod cases;

use std::time::Instant;

use fakerprobe_core::plan::{SuitePlan, Validation, validate_config};
use fakerprobe_core::{
    CaseOutcome, CaseResult, CommonFixtures, Config, DryRunPlan, Probe, Resource,
    ResourceDescriptor, RunReport, SuiteReport, TestContext,
};

use crate::assertions::{
    FormatPatterns, assert_axis, assert_count, assert_deterministic, assert_envelope_shape,
    assert_expectation, assert_fields_present, assert_format, assert_locale, assert_nested,
    assert_ok, assert_schema,
};
use crate::error::{CaseError, RunnerError, SetupError};
use crate::executor::{RequestExecutor, Response};
use crate::schema::{CompiledSchema, SchemaStore};

pub use cases::{CaseKind, TestCase, collect_cases};

/// Everything one suite reads while it runs. Shared, never written.
struct SuiteEnv<'a> {
    descriptor: &'a ResourceDescriptor,
    context: &'a TestContext,
    executor: &'a RequestExecutor,
    schema: &'a CompiledSchema,
    patterns: &'a FormatPatterns,
    probes: Vec<Probe>,
    stop_on_failure: bool,
}

/// Runs resource suites against one service.
pub struct SuiteRunner {
    config: Config,
    resources: Vec<Resource>,
    stop_on_failure: bool,
    parallel: bool,
}

impl SuiteRunner {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            config: config.clone(),
            resources: config.resources.clone(),
            stop_on_failure: false,
            parallel: config.parallel,
        }
    }

    /// Restrict the run to `resources`. Empty keeps the configured set.
    #[must_use]
    pub fn with_resources(mut self, resources: Vec<Resource>) -> Self {
        if !resources.is_empty() {
            self.resources = resources;
        }
        self
    }

    /// Stop each suite at its first failed case
    #[must_use]
    pub fn with_stop_on_failure(mut self, stop: bool) -> Self {
        self.stop_on_failure = stop;
        self
    }

    /// Run suites on separate threads. `false` keeps the configured value.
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel |= parallel;
        self
    }

    /// Descriptors of the selected resources, in canonical order.
    #[must_use]
    pub fn descriptors(&self) -> Vec<ResourceDescriptor> {
        Resource::ALL
            .into_iter()
            .filter(|r| self.resources.contains(r))
            .map(ResourceDescriptor::for_resource)
            .collect()
    }

    /// Generate a dry run plan: collect cases, validate config, fixtures
    /// and schemas. No HTTP requests are sent.
    #[must_use]
    pub fn plan(&self) -> DryRunPlan {
        let descriptors = self.descriptors();
        let mut validations = validate_config(&self.config, &self.resources);
        match RequestExecutor::from_config(&self.config) {
            Ok(_) => validations.push(Validation::ok(
                "headers",
                format!("headers: {} configured", self.config.headers.len()),
            )),
            Err(e @ SetupError::InvalidHeader(..)) => {
                validations.push(Validation::error("headers", e.to_string()));
            }
            Err(e) => validations.push(Validation::error("client", e.to_string())),
        }

        let context = match TestContext::load(&self.config.data_dir, &descriptors) {
            Ok(ctx) => {
                validations.push(Validation::ok(
                    "fixtures",
                    format!(
                        "fixtures: {} locales, {} quantities, {} seeds",
                        ctx.common.locales.len(),
                        ctx.common.quantities.len(),
                        ctx.common.seeds.len()
                    ),
                ));
                Some(ctx)
            }
            Err(e) => {
                validations.push(Validation::error("fixtures", format!("fixtures: {e}")));
                None
            }
        };
        if let Err(e) = SchemaStore::load(&self.config.schema_dir, &descriptors) {
            validations.push(Validation::error("schema_parse", e.to_string()));
        }
        if let Err(e) = FormatPatterns::compile(&descriptors) {
            validations.push(Validation::error("patterns", e.to_string()));
        }

        let empty = CommonFixtures {
            locales: Vec::new(),
            quantities: Vec::new(),
            seeds: Vec::new(),
        };
        let suites: Vec<SuitePlan> = descriptors
            .iter()
            .map(|d| {
                let (common, axes) = context
                    .as_ref()
                    .map_or((&empty, &[][..]), |ctx| (&ctx.common, ctx.axes(d.resource)));
                let probes: Vec<Probe> = self.config.probes_for(d.resource).collect();
                let cases = collect_cases(d, common, axes, &probes);
                SuitePlan {
                    resource: d.resource,
                    endpoint: d.endpoint.to_string(),
                    schema: self.config.schema_path(d.schema_file).display().to_string(),
                    probes: u32::try_from(cases.iter().filter(|c| c.is_probe()).count())
                        .unwrap_or(u32::MAX),
                    cases: cases.into_iter().map(|c| c.name).collect(),
                }
            })
            .collect();

        DryRunPlan {
            base_url: self.config.base_url.clone(),
            total_cases: suites.iter().map(|s| s.cases.len() as u64).sum(),
            suites,
            validations,
        }
    }

    /// Run every selected suite.
    ///
    /// Fixtures, schemas and format patterns are all loaded before the
    /// first request; any problem there aborts the run.
    ///
    /// # Errors
    ///
    /// Returns error on invalid config or any setup failure. Check and
    /// transport failures are recorded in the report instead.
    pub fn run(&self) -> Result<RunReport, RunnerError> {
        let start = Instant::now();
        self.config.validate()?;

        let descriptors = self.descriptors();
        let context = TestContext::load(&self.config.data_dir, &descriptors)?;
        let schemas = SchemaStore::load(&self.config.schema_dir, &descriptors)?;
        let patterns = FormatPatterns::compile(&descriptors)?;
        let executor = RequestExecutor::from_config(&self.config)?;

        let mut envs = Vec::with_capacity(descriptors.len());
        for descriptor in &descriptors {
            let schema = schemas.get(descriptor.resource).ok_or_else(|| {
                SetupError::SchemaNotFound(self.config.schema_path(descriptor.schema_file))
            })?;
            envs.push(SuiteEnv {
                descriptor,
                context: &context,
                executor: &executor,
                schema,
                patterns: &patterns,
                probes: self.config.probes_for(descriptor.resource).collect(),
                stop_on_failure: self.stop_on_failure,
            });
        }

        tracing::info!(
            base_url = %executor.base_url(),
            suites = envs.len(),
            parallel = self.parallel,
            "starting run"
        );

        let suites: Vec<SuiteReport> = if self.parallel {
            std::thread::scope(|scope| {
                let handles: Vec<_> = envs
                    .iter()
                    .map(|env| (env, scope.spawn(move || run_suite(env))))
                    .collect();
                handles
                    .into_iter()
                    .map(|(env, handle)| {
                        handle.join().unwrap_or_else(|_| panicked(env.descriptor))
                    })
                    .collect()
            })
        } else {
            envs.iter().map(run_suite).collect()
        };

        Ok(RunReport {
            base_url: executor.base_url().to_string(),
            suites,
            duration_secs: start.elapsed().as_secs_f64(),
        })
    }
}

/// Report for a suite whose thread panicked.
fn panicked(descriptor: &ResourceDescriptor) -> SuiteReport {
    tracing::error!(resource = %descriptor.resource, "suite thread panicked");
    let mut report = SuiteReport::new(descriptor.resource, descriptor.endpoint);
    report.cases.push(CaseOutcome {
        resource: descriptor.resource,
        name: "suite".to_string(),
        request: format!("GET {}", descriptor.endpoint),
        status_code: None,
        elapsed: 0.0,
        result: CaseResult::Error {
            message: "suite thread panicked".to_string(),
        },
    });
    report.stopped_early = true;
    report
}

fn run_suite(env: &SuiteEnv) -> SuiteReport {
    let d = env.descriptor;
    let cases = collect_cases(
        d,
        &env.context.common,
        env.context.axes(d.resource),
        &env.probes,
    );
    tracing::info!(resource = %d.resource, endpoint = d.endpoint, cases = cases.len(), "suite started");

    let mut report = SuiteReport::new(d.resource, d.endpoint);
    for case in &cases {
        let outcome = execute_case(env, case);
        let failed = outcome.result.is_failure();
        report.cases.push(outcome);
        if failed && env.stop_on_failure {
            report.stopped_early = true;
            break;
        }
    }

    let tally = report.tally();
    tracing::info!(
        resource = %d.resource,
        passed = tally.passed,
        failed = tally.failed,
        errors = tally.errors,
        observed = tally.observed,
        "suite finished"
    );
    report
}

fn execute_case(env: &SuiteEnv, case: &TestCase) -> CaseOutcome {
    let spec = case.request(env.descriptor.endpoint);
    let request = spec.label();
    let start = Instant::now();
    let mut status_code = None;

    let result = match check_case(env, case, &spec, &mut status_code) {
        Ok(resp) if case.is_probe() => {
            tracing::info!(
                resource = %env.descriptor.resource,
                case = %case.name,
                status = resp.status_code,
                "probe observed"
            );
            CaseResult::Observed {
                observed_status: resp.status_code,
            }
        }
        Ok(_) => CaseResult::Passed,
        Err(CaseError::Check(failure)) => {
            tracing::warn!(
                resource = %env.descriptor.resource,
                case = %case.name,
                %request,
                "{failure}"
            );
            CaseResult::Failed { failure }
        }
        Err(CaseError::Transport(e)) => {
            tracing::warn!(
                resource = %env.descriptor.resource,
                case = %case.name,
                timed_out = e.timed_out,
                "transport error: {}",
                e.message
            );
            CaseResult::Error { message: e.message }
        }
    };

    CaseOutcome {
        resource: env.descriptor.resource,
        name: case.name.clone(),
        request,
        status_code,
        elapsed: start.elapsed().as_secs_f64(),
        result,
    }
}

/// Send the case's request(s) and run its checks in order, stopping at the
/// first failure. Returns the last response.
fn check_case(
    env: &SuiteEnv,
    case: &TestCase,
    spec: &fakerprobe_core::RequestSpec,
    status_code: &mut Option<u16>,
) -> Result<Response, CaseError> {
    if let CaseKind::Determinism(seed) = case.kind {
        let resp = assert_deterministic(env.executor, env.descriptor.endpoint, seed)?;
        *status_code = Some(resp.status_code);
        return Ok(resp);
    }

    let resp = env.executor.send(spec)?;
    *status_code = Some(resp.status_code);

    if case.is_probe() {
        return Ok(resp);
    }
    assert_ok(&resp)?;

    match &case.kind {
        CaseKind::Default => {
            assert_envelope_shape(&resp)?;
            assert_count(&resp, spec.requested_quantity())?;
        }
        CaseKind::Schema => assert_schema(&resp, env.schema)?,
        CaseKind::Locale(locale) => assert_locale(&resp, locale)?,
        CaseKind::Quantity(q) => assert_count(&resp, *q)?,
        CaseKind::RequiredFields => {
            assert_fields_present(&resp, env.descriptor.required_fields)?;
        }
        CaseKind::Nested(rule) => assert_nested(&resp, rule)?,
        CaseKind::Format(rule) => assert_format(&resp, rule, env.patterns)?,
        CaseKind::Axis {
            value,
            quantity,
            check,
            ..
        } => {
            assert_count(&resp, *quantity)?;
            assert_axis(&resp, *check, value)?;
        }
        CaseKind::Scenario(scenario) => {
            let requested = spec.requested_quantity();
            for expectation in &scenario.expectations {
                assert_expectation(&resp, expectation, requested, env.schema)?;
            }
        }
        CaseKind::Determinism(_) | CaseKind::Probe(_) => {}
    }

    Ok(resp)
}
