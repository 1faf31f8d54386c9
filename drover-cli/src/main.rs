//! Drover — declarative task orchestration CLI.
//!
//! # Usage
//!
//! ```text
//! drover -f <locator> [-f <locator> ...] [-t <target>] [options]
//! drover -f <locator> --list-targets
//! drover -f <locator> -d --daemon-interval 300 --daemon-timeout 3600
//! ```
//!
//! Exit code 1 on an exit-on-failure policy or any top-level run error, 0
//! otherwise.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tabled::{Table, Tabled};

use drover_core::{CancellationToken, RunOutcome};
use drover_daemon::{start_blocking, DaemonSettings, RunRequest};
use drover_plugins::builtin_registry;
use drover_resolver::Resolver;

// ---------------------------------------------------------------------------
// CLI surface
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "drover",
    version,
    about = "Drover is a declarative task orchestration tool",
    long_about = None,
)]
struct Cli {
    /// Document locator: path, directory, http(s) URL, or object-storage
    /// URL (repeatable).
    #[arg(
        short,
        long = "file",
        required = true,
        env = "DROVER_FILE",
        value_delimiter = ','
    )]
    file: Vec<String>,

    /// Target to run.
    #[arg(short, long, default_value = "default", env = "DROVER_TARGET")]
    target: String,

    /// List all available targets instead of running one.
    #[arg(short, long, env = "DROVER_LIST_TARGETS")]
    list_targets: bool,

    /// Enable daemon mode: repeat the run until stopped.
    #[arg(short, long, env = "DROVER_DAEMON", help_heading = "Daemon Control Options")]
    daemon: bool,

    /// Seconds to pause between runs.
    #[arg(
        short = 'i',
        long,
        default_value_t = 60,
        env = "DROVER_DAEMON_INTERVAL",
        help_heading = "Daemon Control Options"
    )]
    daemon_interval: u64,

    /// Terminate the daemon after this many seconds, 0 means no timeout.
    #[arg(
        long,
        default_value_t = 0,
        env = "DROVER_DAEMON_TIMEOUT",
        help_heading = "Daemon Control Options"
    )]
    daemon_timeout: u64,

    /// Terminate the daemon after this many runs, 0 means no limit.
    #[arg(
        long,
        default_value_t = 0,
        env = "DROVER_DAEMON_ITERATIONS",
        help_heading = "Daemon Control Options"
    )]
    daemon_iterations: u32,

    /// Log level.
    #[arg(
        long,
        value_enum,
        default_value_t = LogLevel::Info,
        env = "DROVER_LOG_LEVEL",
        help_heading = "Logging Options"
    )]
    log_level: LogLevel,

    /// Log format.
    #[arg(
        long,
        value_enum,
        default_value_t = LogFormat::Text,
        env = "DROVER_LOG_FORMAT",
        help_heading = "Logging Options"
    )]
    log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

fn init_tracing(level: LogLevel, format: LogFormat) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));
    match format {
        LogFormat::Text => {
            let _ = fmt().with_env_filter(filter).with_target(false).try_init();
        }
        LogFormat::Json => {
            let _ = fmt().json().with_env_filter(filter).with_target(false).try_init();
        }
    }
}

// ---------------------------------------------------------------------------
// Target listing
// ---------------------------------------------------------------------------

#[derive(Tabled)]
struct TargetRow {
    #[tabled(rename = "TARGET")]
    id: String,
    #[tabled(rename = "CHECKS")]
    checks: usize,
    #[tabled(rename = "ACTIONS")]
    actions: usize,
    #[tabled(rename = "DEPENDENCIES")]
    dependencies: String,
}

fn list_targets(files: &[String]) -> Result<()> {
    let registry = Arc::new(builtin_registry());
    let table = Resolver::new(registry)
        .resolve(files, &CancellationToken::new())
        .context("failed to resolve documents")?;

    let rows: Vec<TargetRow> = table
        .summaries()
        .into_iter()
        .map(|summary| TargetRow {
            id: summary.id,
            checks: summary.checks,
            actions: summary.actions,
            dependencies: summary.dependencies.join(", "),
        })
        .collect();
    println!("{}", Table::new(rows));
    Ok(())
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_level, cli.log_format);

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    if cli.list_targets {
        list_targets(&cli.file)?;
        return Ok(ExitCode::SUCCESS);
    }

    let request = RunRequest {
        files: cli.file,
        target: cli.target,
        registry: Arc::new(builtin_registry()),
    };
    let settings = DaemonSettings {
        enabled: cli.daemon,
        interval: Duration::from_secs(cli.daemon_interval),
        timeout: (cli.daemon_timeout > 0).then(|| Duration::from_secs(cli.daemon_timeout)),
        iterations: (cli.daemon_iterations > 0).then_some(cli.daemon_iterations),
    };

    match start_blocking(request, settings).context("run failed")? {
        RunOutcome::Completed => Ok(ExitCode::SUCCESS),
        RunOutcome::Terminate => Ok(ExitCode::FAILURE),
    }
}
