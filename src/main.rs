/*!
 * Sentinel Fire CLI
 *
 * `run` starts the engine and its watchers until Ctrl-C or a deadline,
 * `demo` reports and dispatches a single occurrence, `config` writes the
 * default configuration.
 */

use clap::{Parser, Subcommand, ValueEnum};
use sentinel_core_dispatch::{FireEngine, Location, Severity};
use sentinel_fire::{
    config::{FireConfig, LogLevel},
    error::{Result, SentinelError, EXIT_SUCCESS},
    logging,
    output::{self, OutputWriter, RunReport},
};
use sentinel_watch::WatchSupervisor;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "sentinel-fire")]
#[command(version, about = "Fire occurrence dispatch with drone verification", long_about = None)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Log level
    #[arg(long, value_enum, global = true)]
    log_level: Option<LogLevelArg>,

    /// Write JSON logs to this file instead of stdout
    #[arg(long = "log", value_name = "FILE", global = true)]
    log_file: Option<PathBuf>,

    /// Verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the engine and its background watchers
    Run {
        /// Stop after this many seconds instead of waiting for Ctrl-C
        #[arg(long, value_name = "SECS")]
        duration_secs: Option<u64>,

        /// Print the final report as JSON
        #[arg(long)]
        json: bool,

        /// Export the history ledger as JSON Lines on exit
        #[arg(long, value_name = "FILE")]
        export_history: Option<PathBuf>,
    },

    /// Report one occurrence, dispatch a drone and print the outcome
    Demo {
        /// Coordinates "lat,lon" or a place description
        #[arg(long, default_value = "-3.1,-60.0")]
        location: String,

        #[arg(long, default_value_t = 5)]
        severity: u8,

        #[arg(long, default_value = "Amazônia")]
        region: String,

        /// Print JSON instead of tables
        #[arg(long)]
        json: bool,
    },

    /// Write the default configuration
    Config {
        #[arg(short, long, value_name = "FILE", default_value = "sentinel-fire.toml")]
        output: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevelArg> for LogLevel {
    fn from(arg: LogLevelArg) -> Self {
        match arg {
            LogLevelArg::Error => LogLevel::Error,
            LogLevelArg::Warn => LogLevel::Warn,
            LogLevelArg::Info => LogLevel::Info,
            LogLevelArg::Debug => LogLevel::Debug,
            LogLevelArg::Trace => LogLevel::Trace,
        }
    }
}

fn main() {
    let code = match run() {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            eprintln!("Error [{}]: {}", e.category(), e);
            e.exit_code()
        }
    };
    std::process::exit(code);
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Config { ref output } = cli.command {
        return write_default_config(output);
    }

    let mut config = match cli.config {
        Some(ref path) => FireConfig::from_file(path)?,
        None if matches!(cli.command, Commands::Demo { .. }) => FireConfig::demo_preset(),
        None => FireConfig::default(),
    };
    if let Some(level) = cli.log_level {
        config.logging.level = level.into();
    }
    if cli.log_file.is_some() {
        config.logging.file = cli.log_file.clone();
    }
    config.logging.verbose |= cli.verbose;
    config.validate()?;

    if let Err(e) = logging::init_logging(&config.logging) {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| SentinelError::Runtime(e.to_string()))?;

    match cli.command {
        Commands::Run {
            duration_secs,
            json,
            export_history,
        } => runtime.block_on(run_watchers(
            config,
            duration_secs.map(Duration::from_secs),
            export_history,
            OutputWriter::new(json),
        )),
        Commands::Demo {
            location,
            severity,
            region,
            json,
        } => runtime.block_on(run_demo(
            config,
            &location,
            severity,
            &region,
            OutputWriter::new(json),
        )),
        Commands::Config { .. } => Ok(()),
    }
}

fn write_default_config(path: &Path) -> Result<()> {
    FireConfig::default().to_file(path)?;
    output::print_success(&format!("default configuration written to {}", path.display()));
    Ok(())
}

async fn run_watchers(
    config: FireConfig,
    duration: Option<Duration>,
    export_history: Option<PathBuf>,
    out: OutputWriter,
) -> Result<()> {
    let engine = FireEngine::new(config.engine.clone())?;
    let root = CancellationToken::new();
    let supervisor = WatchSupervisor::start(&engine, &config.watch, &root)?;

    out.info(&format!(
        "watching with {} teams, {} drones, {} mission slot(s); press Ctrl-C to stop",
        config.engine.team_count, config.engine.drone_count, config.engine.max_concurrent_missions
    ));

    match duration {
        Some(limit) => {
            tokio::select! {
                _ = tokio::time::sleep(limit) => info!(secs = limit.as_secs(), "run duration reached"),
                signal = tokio::signal::ctrl_c() => signal?,
            }
        }
        None => tokio::signal::ctrl_c().await?,
    }

    info!("🛑 stopping watchers");
    root.cancel();
    let totals = supervisor.shutdown().await;
    engine.settle().await;

    if let Some(path) = export_history {
        let file = File::create(&path)?;
        let written = engine.history_ledger().export_jsonl(BufWriter::new(file))?;
        info!(records = written, path = %path.display(), "history exported");
    }

    if !engine.is_consistent() {
        warn!("incident store and priority queue disagree at shutdown");
    }
    out.run_report(&RunReport::collect(&engine, totals))
}

async fn run_demo(
    config: FireConfig,
    location: &str,
    severity: u8,
    region: &str,
    out: OutputWriter,
) -> Result<()> {
    let engine = FireEngine::new(config.engine)?;
    let location: Location = location.parse()?;
    let occurrence = engine.report(location, Severity::new(severity)?, region)?;

    let outcome = engine.dispatch_drone(occurrence.id);
    out.dispatch(&occurrence, &outcome)?;
    if outcome.is_accepted() {
        out.info("drone in flight, waiting for verification");
    }

    engine.settle().await;
    out.run_report(&RunReport::collect(&engine, Vec::new()))
}
