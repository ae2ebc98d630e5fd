//! Run report persistence
//!
//! With `--report-dir DIR`, every run is saved to
//! `DIR/{host_port}_{unix_secs}/` regardless of `--output` mode.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use fakerprobe_core::{Config, RunReport, Verdict};

/// Everything needed to persist a run.
pub struct ReportData<'a> {
    pub config: &'a Config,
    pub report: &'a RunReport,
    pub verdict: &'a Verdict,
}

/// Save a run under `base`. Returns the run directory.
///
/// Layout:
/// - `config.toml`: the config the run used
/// - `summary.json`: verdict, tally and metadata
/// - `report.json`: every case outcome
/// - `failures.json`: failed and errored cases, only when present
pub fn save_report(base: &Path, data: &ReportData) -> Result<PathBuf, std::io::Error> {
    let finished = unix_secs();
    let dir = base.join(build_dir_name(&data.config.base_url, finished));
    std::fs::create_dir_all(&dir)?;

    let config_toml = toml::to_string_pretty(data.config).map_err(std::io::Error::other)?;
    std::fs::write(dir.join("config.toml"), config_toml)?;

    let tally = data.report.tally();
    let summary = serde_json::json!({
        "verdict": {
            "status": data.verdict.status.to_string(),
            "exit_code": data.verdict.exit_code,
            "reason": data.verdict.reason,
        },
        "tally": tally,
        "suites": data.report.suites.iter().map(|s| serde_json::json!({
            "resource": s.resource,
            "tally": s.tally(),
            "stopped_early": s.stopped_early,
        })).collect::<Vec<_>>(),
        "meta": {
            "finished_at_unix": finished,
            "duration_secs": data.report.duration_secs,
            "base_url": data.report.base_url,
        },
    });
    write_json(&dir.join("summary.json"), &summary)?;
    write_json(&dir.join("report.json"), data.report)?;

    let failures: Vec<_> = data.report.failures().collect();
    if !failures.is_empty() {
        write_json(&dir.join("failures.json"), &failures)?;
    }

    Ok(dir)
}

fn write_json<T: serde::Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), std::io::Error> {
    let json = serde_json::to_string_pretty(value).map_err(std::io::Error::other)?;
    std::fs::write(path, json)
}

fn unix_secs() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// `{host_port}_{unix_secs}` e.g. `fakerapi.it_1760745600`
fn build_dir_name(base_url: &str, secs: u64) -> String {
    format!("{}_{secs}", extract_host_port(base_url))
}

/// `"http://localhost:8080/api/v2"` → `"localhost_8080"`
fn extract_host_port(url: &str) -> String {
    url.split("://")
        .nth(1)
        .unwrap_or(url)
        .split('/')
        .next()
        .filter(|h| !h.is_empty())
        .unwrap_or("unknown")
        .replace(':', "_")
}
