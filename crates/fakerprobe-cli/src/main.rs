//! fakerprobe CLI - fixture-driven contract tests for the Faker API

mod logging;
mod storage;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};

use fakerprobe_core::{
    CaseResult, CheckKind, Config, DryRunPlan, Resource, RunReport, ValidationStatus, Verdict,
    VerdictPolicy, VerdictStatus,
};
use fakerprobe_runner::SuiteRunner;

/// Exit code for setup and tool errors.
const SETUP_EXIT_CODE: i32 = 3;

const CONFIG_FILE: &str = ".fakerprobe.toml";

#[derive(Parser)]
#[command(name = "fakerprobe")]
#[command(about = "Fixture-driven contract tests for the Faker API")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, global = true, default_value = "terminal")]
    output: OutputFormat,

    /// Verbose output (debug logs; RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(clap::Args)]
struct RunArgs {
    /// Config file (default: .fakerprobe.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Only run these resources (repeatable): company, product, user, image
    #[arg(short, long = "resource", value_parser = parse_resource)]
    resources: Vec<Resource>,

    /// Show execution plan without sending requests
    #[arg(long)]
    dry_run: bool,

    /// Stop each suite at its first failure
    #[arg(long)]
    stop_on_failure: bool,

    /// Run resource suites concurrently
    #[arg(long)]
    parallel: bool,

    /// Save report files under this directory
    #[arg(long)]
    report_dir: Option<PathBuf>,

    /// Do not fail the run on this check kind (repeatable), e.g. determinism
    #[arg(long = "ignore-check", value_parser = parse_check_kind)]
    ignore_checks: Vec<CheckKind>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the contract suites
    Run(RunArgs),

    /// Show the execution plan and config checks (same as `run --dry-run`)
    Plan(RunArgs),

    /// Initialize config file
    Init,

    /// Check config, fixtures and schemas
    Doctor {
        /// Config file (default: .fakerprobe.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Export JSON Schema for the report format
    Schema,
}

#[derive(Clone, Copy, ValueEnum, PartialEq, Eq)]
enum OutputFormat {
    Terminal,
    Json,
    Silent,
}

fn parse_resource(s: &str) -> Result<Resource, String> {
    Resource::parse(s).ok_or_else(|| {
        format!("unknown resource '{s}' (expected company, product, user or image)")
    })
}

fn parse_check_kind(s: &str) -> Result<CheckKind, String> {
    serde_json::from_value(serde_json::Value::String(s.replace('-', "_")))
        .map_err(|_| format!("unknown check kind '{s}'"))
}

fn policy(cfg: &Config, args: &RunArgs) -> VerdictPolicy {
    VerdictPolicy::from_config(cfg).with_ignored(args.ignore_checks.iter().copied())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(logging::level(
        cli.verbose,
        cli.output == OutputFormat::Silent,
    ));

    match run(cli) {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(SETUP_EXIT_CODE as u8)
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    Ok(match path {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    })
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Run(args) => run_suites(&args, cli.output),
        Commands::Plan(args) => {
            let cfg = load_config(args.config.as_deref())?;
            let runner = SuiteRunner::from_config(&cfg).with_resources(args.resources);
            print_plan(&runner.plan(), cli.output)
        }

        Commands::Init => {
            if Path::new(CONFIG_FILE).exists() {
                eprintln!("{CONFIG_FILE} already exists");
                return Ok(1);
            }

            std::fs::write(CONFIG_FILE, Config::example())?;
            println!("Created {CONFIG_FILE}");
            println!("\nEdit the file to configure:");
            println!("  - base_url: service to test");
            println!("  - data_dir / schema_dir: fixture and schema locations");
            println!("  - resources: which suites to run");
            println!("  - probes: extra negative probes");
            Ok(0)
        }

        Commands::Doctor { config } => doctor(config.as_deref()),

        Commands::Schema => {
            println!("{}", fakerprobe_core::report::generate_schema());
            Ok(0)
        }
    }
}

fn print_plan(plan: &DryRunPlan, output: OutputFormat) -> Result<i32> {
    match output {
        OutputFormat::Terminal => println!("{}", plan.to_terminal()),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(plan)?),
        OutputFormat::Silent => {}
    }
    Ok(if plan.has_errors() { 1 } else { 0 })
}

fn run_suites(args: &RunArgs, output: OutputFormat) -> Result<i32> {
    let cfg = load_config(args.config.as_deref())?;

    let runner = SuiteRunner::from_config(&cfg)
        .with_resources(args.resources.clone())
        .with_stop_on_failure(args.stop_on_failure)
        .with_parallel(args.parallel);

    if args.dry_run {
        return print_plan(&runner.plan(), output);
    }

    if output != OutputFormat::Silent {
        eprintln!("Config:");
        eprintln!("  base_url: {}", cfg.base_url);
        eprintln!("  fixtures: {}", cfg.data_dir.display());
        eprintln!("  schemas:  {}", cfg.schema_dir.display());
        if !cfg.headers.is_empty() {
            eprintln!("  headers:  {} configured", cfg.headers.len());
        }
        eprintln!();
    }

    let report = match runner.run() {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("  No requests were sent. Run `fakerprobe doctor` to check the setup.");
            return Ok(SETUP_EXIT_CODE);
        }
    };

    let verdict = policy(&cfg, args).verdict(&report);

    match output {
        OutputFormat::Terminal => print_terminal(&report, &verdict),
        OutputFormat::Json => {
            let json_output = serde_json::json!({
                "verdict": {
                    "status": verdict.status.to_string(),
                    "exit_code": verdict.exit_code,
                    "reason": verdict.reason,
                },
                "tally": report.tally(),
                "report": report,
            });
            println!("{}", serde_json::to_string_pretty(&json_output)?);
        }
        OutputFormat::Silent => {}
    }

    if let Some(base) = &args.report_dir {
        let data = storage::ReportData {
            config: &cfg,
            report: &report,
            verdict: &verdict,
        };
        match storage::save_report(base, &data) {
            Ok(path) => {
                if output != OutputFormat::Silent {
                    eprintln!("Report saved: {}", path.display());
                }
            }
            Err(e) => eprintln!("Warning: failed to save report: {e}"),
        }
    }

    Ok(verdict.exit_code)
}

fn print_terminal(report: &RunReport, verdict: &Verdict) {
    let tally = report.tally();
    let icon = if verdict.status == VerdictStatus::Pass {
        "PASS"
    } else {
        "FAIL"
    };
    println!("\n{icon}: {}", verdict.reason);
    println!(
        "  Cases: {} total, {} passed, {} failed, {} errors, {} observed",
        tally.total, tally.passed, tally.failed, tally.errors, tally.observed
    );
    println!("  Duration: {:.1}s", report.duration_secs);
    println!("  Exit code: {}", verdict.exit_code);

    println!("\nSuites:");
    for suite in &report.suites {
        let t = suite.tally();
        let stopped = if suite.stopped_early { " (stopped early)" } else { "" };
        println!(
            "  {:<8} {:<11} {}/{} passed{stopped}",
            suite.resource, suite.endpoint, t.passed, t.total - t.observed
        );
    }

    let failures: Vec<_> = report.failures().collect();
    if !failures.is_empty() {
        println!("\nFailures ({}):", failures.len());
        for case in failures {
            match &case.result {
                CaseResult::Failed { failure } => {
                    println!("  [{}] {} -> {}", case.resource, case.name, failure.kind);
                    println!("         {}", case.request);
                    println!("         {}", failure.message);
                    if let (Some(expected), Some(actual)) = (&failure.expected, &failure.actual) {
                        println!("         expected {expected}, got {actual}");
                    }
                }
                CaseResult::Error { message } => {
                    println!("  [{}] {} -> error", case.resource, case.name);
                    println!("         {message}");
                }
                CaseResult::Passed | CaseResult::Observed { .. } => {}
            }
        }
    }

    let observed: Vec<_> = report
        .cases()
        .filter_map(|c| match c.result {
            CaseResult::Observed { observed_status } => Some((c, observed_status)),
            _ => None,
        })
        .collect();
    if !observed.is_empty() {
        println!("\nProbes (observed, not asserted):");
        for (case, status) in observed {
            println!("  [{}] {} -> {status}", case.resource, case.name);
        }
    }
}

fn doctor(config: Option<&Path>) -> Result<i32> {
    println!("fakerprobe doctor");
    println!("=================\n");

    let cfg = match config {
        Some(path) => Config::load(path).map(|c| (c, path.display().to_string())),
        None => Config::load_default().map(|c| (c, "defaults or .fakerprobe.toml".to_string())),
    };
    let cfg = match cfg {
        Ok((cfg, source)) => {
            println!("[OK] Config ({source})");
            cfg
        }
        Err(e) => {
            println!("[NG] Config: {e}");
            return Ok(1);
        }
    };

    let mut ok = true;
    let runner = SuiteRunner::from_config(&cfg);
    let plan = runner.plan();
    for v in &plan.validations {
        let tag = match v.status {
            ValidationStatus::Ok => "OK",
            ValidationStatus::Warning => "--",
            ValidationStatus::Error => {
                ok = false;
                "NG"
            }
        };
        println!("[{tag}] {}", v.message);
    }
    println!("[OK] {} cases across {} suites", plan.total_cases, plan.suites.len());

    if !Path::new(CONFIG_FILE).exists() && config.is_none() {
        println!("\nCreate config file:");
        println!("  fakerprobe init");
    }

    if ok {
        println!("\nReady to probe {}", cfg.base_url);
        Ok(0)
    } else {
        println!("\nFix the NG items above before running.");
        Ok(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_flag_accepts_plural_and_singular() {
        let cli = Cli::try_parse_from([
            "fakerprobe",
            "run",
            "--resource",
            "users",
            "-r",
            "image",
            "--parallel",
        ])
        .unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.resources, vec![Resource::User, Resource::Image]);
        assert!(args.parallel);
        assert!(!args.dry_run);
    }

    #[test]
    fn ignore_check_flags_join_config() {
        let cli = Cli::try_parse_from([
            "fakerprobe",
            "run",
            "--ignore-check",
            "field-presence",
            "--ignore-check",
            "locale",
        ])
        .unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(
            args.ignore_checks,
            vec![CheckKind::FieldPresence, CheckKind::Locale]
        );

        let cfg = Config {
            ignore_checks: vec![CheckKind::Determinism],
            ..Config::default()
        };
        assert_eq!(
            policy(&cfg, &args).ignore_checks,
            vec![
                CheckKind::Determinism,
                CheckKind::FieldPresence,
                CheckKind::Locale
            ]
        );
        assert!(Cli::try_parse_from(["fakerprobe", "run", "--ignore-check", "latency"]).is_err());
    }

    #[test]
    fn unknown_resource_is_rejected() {
        assert!(Cli::try_parse_from(["fakerprobe", "run", "--resource", "orders"]).is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["fakerprobe", "plan", "--output", "json", "-v"]).unwrap();
        assert!(cli.output == OutputFormat::Json);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Plan(_)));
    }

    #[test]
    fn missing_fixtures_plan_exits_one() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = Config {
            data_dir: tmp.path().join("data"),
            schema_dir: tmp.path().join("schemas"),
            ..Config::default()
        };
        let plan = SuiteRunner::from_config(&cfg).plan();
        assert_eq!(print_plan(&plan, OutputFormat::Silent).unwrap(), 1);
    }

    #[test]
    fn setup_failure_exits_three_without_requests() {
        let tmp = tempfile::tempdir().unwrap();
        let config_path = tmp.path().join("probe.toml");
        std::fs::write(
            &config_path,
            format!(
                "base_url = \"http://127.0.0.1:9/api/v2\"\ndata_dir = {:?}\n",
                tmp.path().join("missing").display().to_string()
            ),
        )
        .unwrap();
        let args = RunArgs {
            config: Some(config_path),
            resources: vec![Resource::User],
            dry_run: false,
            stop_on_failure: false,
            parallel: false,
            report_dir: None,
            ignore_checks: vec![],
        };
        assert_eq!(run_suites(&args, OutputFormat::Silent).unwrap(), SETUP_EXIT_CODE);
    }
}
