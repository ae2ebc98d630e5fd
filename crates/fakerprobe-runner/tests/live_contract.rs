//! Suites against the public Faker API
//!
//! Needs network access. Run with:
//!   cargo test -p fakerprobe-runner --test live_contract -- --ignored

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use fakerprobe_core::{Config, RequestSpec, Resource, VerdictPolicy};
use fakerprobe_runner::{RequestExecutor, SuiteRunner};

fn live_config(resources: &[Resource]) -> Config {
    Config {
        data_dir: common::fixtures_dir().join("data"),
        schema_dir: common::fixtures_dir().join("schemas"),
        resources: resources.to_vec(),
        ..Config::default()
    }
}

#[test]
#[ignore = "requires network access to fakerapi.it"]
fn live_service_meets_contract() {
    let config = live_config(&Resource::ALL);
    let report = SuiteRunner::from_config(&config).run().unwrap();

    for case in report.failures() {
        eprintln!("{} {}: {:?}", case.resource, case.name, case.result);
    }
    let verdict = VerdictPolicy::default().verdict(&report);
    assert_eq!(verdict.exit_code, 0, "{}", verdict.reason);
}

#[test]
#[ignore = "requires network access to fakerapi.it"]
fn live_seeded_users_repeat() {
    let executor = RequestExecutor::from_config(&live_config(&[Resource::User])).unwrap();
    let spec = RequestSpec::create("/users").quantity(5).seed(12345);

    let first = executor.send(&spec).unwrap();
    let second = executor.send(&spec).unwrap();
    assert_eq!(first.status_code, 200);
    assert_eq!(first.body, second.body);
    assert_eq!(first.records().map(<[_]>::len), Some(5));
}
