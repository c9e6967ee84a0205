//! Quadvote ledger runner
//!
//! Loads settings, opens the configured record store and replays governance
//! scripts against it, printing one JSON report per step.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use qv_governance::{
    vote_weight, GovernanceEngine, InMemoryHoldings, LogFormat, LoggingSettings, Settings,
    StorageBackend,
};
use qv_storage::{GovernanceStore, MemoryStorage, SledStorage};
use qv_time::{Clock, ManualClock, SystemClock};
use qv_types::DomainId;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod script;

use script::{resolve_identity, Script, ScriptRunner, StepReport};

#[derive(Parser)]
#[command(name = "qv-node")]
#[command(about = "Quadratic-voting governance ledger runner", long_about = None)]
#[command(version)]
struct Cli {
    /// Settings file (TOML)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Override logging.level
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Override logging.format
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormatArg>,

    /// Override storage.backend
    #[arg(long, global = true, value_enum)]
    storage_backend: Option<BackendArg>,

    /// Override storage.path
    #[arg(long, global = true)]
    storage_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a JSON script of governance operations
    Run {
        /// Script to replay
        script: PathBuf,
        /// Stop at the first rejected step and exit with an error
        #[arg(long)]
        fail_fast: bool,
    },
    /// Print the vote weight of a resource balance
    Weight {
        balance: u64,
    },
    /// Print the domain id owned by an admin (address or script label)
    DomainId {
        admin: String,
    },
    /// Print the effective settings
    ShowConfig,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormatArg {
    Pretty,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum BackendArg {
    Memory,
    Sled,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = load_settings(&cli)?;

    match cli.command {
        Commands::Run { script, fail_fast } => {
            init_logging(&settings.logging)?;
            run_script(&settings, &script, fail_fast)
        }
        Commands::Weight { balance } => {
            println!("{}", vote_weight(balance));
            Ok(())
        }
        Commands::DomainId { admin } => {
            println!("{}", DomainId::derive(&resolve_identity(&admin)));
            Ok(())
        }
        Commands::ShowConfig => {
            println!("{}", serde_json::to_string_pretty(&settings)?);
            Ok(())
        }
    }
}

fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = Settings::load(cli.config.as_deref()).context("Failed to load settings")?;

    if let Some(level) = &cli.log_level {
        settings.logging.level = level.clone();
    }
    if let Some(format) = cli.log_format {
        settings.logging.format = match format {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Json => LogFormat::Json,
        };
    }
    if let Some(backend) = cli.storage_backend {
        settings.storage.backend = match backend {
            BackendArg::Memory => StorageBackend::Memory,
            BackendArg::Sled => StorageBackend::Sled,
        };
    }
    if let Some(path) = &cli.storage_path {
        settings.storage.path = path.clone();
    }

    settings.validate()?;
    Ok(settings)
}

fn init_logging(config: &LoggingSettings) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    // Reports go to stdout; logs stay on stderr.
    match config.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()?,
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_writer(std::io::stderr),
            )
            .try_init()?,
    }

    Ok(())
}

fn run_script(settings: &Settings, path: &Path, fail_fast: bool) -> Result<()> {
    let script = Script::from_path(path)?;
    let start = script
        .start_time
        .unwrap_or_else(|| SystemClock::new().now());

    info!(
        script = %path.display(),
        steps = script.steps.len(),
        backend = ?settings.storage.backend,
        start,
        "Replaying governance script"
    );

    let reports = match settings.storage.backend {
        StorageBackend::Memory => replay(MemoryStorage::new(), settings, &script, start, fail_fast)?,
        StorageBackend::Sled => {
            let store = Arc::new(SledStorage::open(&settings.storage.path).with_context(|| {
                format!(
                    "Failed to open sled store at {}",
                    settings.storage.path.display()
                )
            })?);
            let reports = replay(Arc::clone(&store), settings, &script, start, fail_fast)?;
            store.flush().context("Failed to flush sled store")?;
            reports
        }
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for report in &reports {
        serde_json::to_writer(&mut out, report)?;
        writeln!(out)?;
    }

    let rejected = reports.iter().filter(|r| r.is_rejected()).count();
    info!(applied = reports.len() - rejected, rejected, "Script finished");

    if fail_fast && rejected > 0 {
        anyhow::bail!("Script stopped at a rejected step");
    }
    Ok(())
}

fn replay<S: GovernanceStore>(
    store: S,
    settings: &Settings,
    script: &Script,
    start: u64,
    fail_fast: bool,
) -> Result<Vec<StepReport>> {
    let engine = GovernanceEngine::with_settings(
        store,
        ManualClock::new(start),
        InMemoryHoldings::new(),
        settings.governance,
    );
    ScriptRunner::new(engine).run(script, fail_fast)
}
