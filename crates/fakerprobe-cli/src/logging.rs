//! Tracing subscriber setup

use std::io::IsTerminal;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::util::SubscriberInitExt;

/// Crates whose events the default filter lets through.
const TARGET_CRATES: &[&str] = &["fakerprobe", "fakerprobe_core", "fakerprobe_runner"];

/// Install a stderr subscriber.
///
/// `RUST_LOG` wins when set; otherwise our crates log at `level` and
/// everything else at warn.
pub fn init(level: LevelFilter) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| build_filter(level));

    // A second init (tests) is not an error worth reporting
    let _ = tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .finish()
        .try_init();
}

/// Level for the CLI flags: `-v` is debug, silent output only shows warnings.
pub const fn level(verbose: bool, silent: bool) -> LevelFilter {
    match (verbose, silent) {
        (true, _) => LevelFilter::DEBUG,
        (false, true) => LevelFilter::WARN,
        (false, false) => LevelFilter::INFO,
    }
}

fn default_directive(level: LevelFilter) -> String {
    let level = level.to_string().to_ascii_lowercase();
    TARGET_CRATES
        .iter()
        .map(|c| format!("{c}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

fn build_filter(level: LevelFilter) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .parse_lossy(default_directive(level))
}
