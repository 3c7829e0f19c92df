//! Argument parsing, logging setup, and mission dispatch.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use sand_mission::config::{
    DEFAULT_DURATION_SECS, DEFAULT_EXTENSION, DEFAULT_MARKER, DEFAULT_ROOT, DEFAULT_SERVER,
};
use sand_mission::{
    Mission, MissionConfig, MissionDuration, MissionSummary, ScanFailurePolicy, parse_server,
};
use sand_telemetry::{
    DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, MissionContextGuard, init_logging,
};
use tracing::info;
use url::Url;
use uuid::Uuid;

use crate::error::{CliError, CliResult};

#[derive(Parser, Debug)]
#[command(name = "sand", about = "Disruption mission agent")]
pub(crate) struct Cli {
    /// Controller base URL.
    #[arg(long, env = "SAND_SERVER", value_parser = parse_url, default_value = DEFAULT_SERVER)]
    server: Url,
    /// Mission length in seconds, or `unbounded`.
    #[arg(
        long,
        env = "SAND_DURATION",
        value_parser = parse_duration,
        default_value_t = MissionDuration::from_secs(DEFAULT_DURATION_SECS)
    )]
    duration: MissionDuration,
    /// Extension of the files to mark, including the leading dot.
    #[arg(long, env = "SAND_EXTENSION", default_value = DEFAULT_EXTENSION)]
    extension: String,
    /// Text appended to each target.
    #[arg(long, env = "SAND_MESSAGE", default_value = DEFAULT_MARKER)]
    message: String,
    /// Directory the scan starts from.
    #[arg(long, env = "SAND_ROOT", default_value = DEFAULT_ROOT)]
    root: PathBuf,
    /// Pause between cycles in milliseconds.
    #[arg(long, env = "SAND_CYCLE_DELAY_MS", default_value_t = 0)]
    cycle_delay_ms: u64,
    /// Controller request timeout in seconds; waits indefinitely when omitted.
    #[arg(long, env = "SAND_HTTP_TIMEOUT_SECS")]
    timeout: Option<u64>,
    /// `abort` ends the mission on a failed scan; `skip` abandons only that cycle.
    #[arg(
        long,
        env = "SAND_ON_SCAN_FAILURE",
        value_parser = parse_scan_policy,
        default_value = "abort"
    )]
    on_scan_failure: ScanFailurePolicy,
    /// Log output format (`json` or `pretty`); inferred from the build when omitted.
    #[arg(long, env = "SAND_LOG_FORMAT", value_parser = parse_log_format)]
    log_format: Option<LogFormat>,
    /// Default log filter when `RUST_LOG` is unset.
    #[arg(long, env = "SAND_LOG_LEVEL", default_value = DEFAULT_LOG_LEVEL)]
    log_level: String,
}

impl Cli {
    fn mission_config(&self) -> MissionConfig {
        let mut config = MissionConfig::new(self.server.clone());
        config.duration = self.duration;
        config.extension.clone_from(&self.extension);
        config.marker.clone_from(&self.message);
        config.root.clone_from(&self.root);
        config.cycle_delay = Duration::from_millis(self.cycle_delay_ms);
        config.request_timeout = self.timeout.map(Duration::from_secs);
        config.on_scan_failure = self.on_scan_failure;
        config
    }
}

/// Parses CLI arguments, installs logging, and runs the mission to completion.
/// Returns the process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();

    let logging = LoggingConfig {
        level: &cli.log_level,
        format: cli.log_format.unwrap_or_else(LogFormat::infer),
        ..LoggingConfig::default()
    };
    if let Err(err) = init_logging(&logging) {
        let err = CliError::failure(err);
        eprintln!("error: {}", err.display_message());
        return err.exit_code();
    }

    let mission_id = Uuid::new_v4().to_string();
    let _context = MissionContextGuard::new(mission_id);

    match execute(&cli).await {
        Ok(summary) => {
            info!(
                cycles = summary.cycles,
                skipped_cycles = summary.skipped_cycles,
                claimed = summary.files_claimed,
                modified = summary.files_modified,
                "mission summary"
            );
            0
        }
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

async fn execute(cli: &Cli) -> CliResult<MissionSummary> {
    let mut mission = Mission::new(cli.mission_config())?;
    Ok(mission.run().await?)
}

fn parse_url(input: &str) -> Result<Url, String> {
    parse_server(input).map_err(|_| format!("invalid URL '{input}'"))
}

fn parse_duration(input: &str) -> Result<MissionDuration, String> {
    input
        .parse()
        .map_err(|_| format!("invalid duration '{input}': expected seconds or 'unbounded'"))
}

fn parse_scan_policy(input: &str) -> Result<ScanFailurePolicy, String> {
    input
        .parse()
        .map_err(|_| format!("invalid scan failure policy '{input}': expected 'abort' or 'skip'"))
}

fn parse_log_format(input: &str) -> Result<LogFormat, String> {
    input
        .parse()
        .map_err(|_| format!("invalid log format '{input}': expected 'json' or 'pretty'"))
}
