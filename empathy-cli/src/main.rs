use anyhow::{Context, Result};
use clap::Parser;
use empathy_core::config::Config;
use empathy_core::logging::{init_logging_with_config, LogConfig, LogLevel};
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

mod scenario;

use scenario::{replay, Scenario};

#[derive(Parser, Debug)]
#[command(name = "empathy")]
#[command(
    author,
    version,
    about = "Replay and inspect Telepathy group membership",
    long_about = None
)]
struct Args {
    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(short, long)]
    log_level: Option<String>,

    /// Enable JSON formatted logging
    #[arg(long)]
    json_logs: bool,

    /// Configuration file; EMPATHY_* environment variables are used otherwise
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Parser, Debug)]
enum Command {
    /// Run a group against a scenario and print its events as JSON lines
    Replay {
        /// Scenario file (JSON)
        scenario: PathBuf,
    },

    /// Load and validate a configuration file
    CheckConfig {
        /// Configuration file (TOML)
        file: PathBuf,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("invalid configuration {}", path.display())),
        None => Config::from_env().context("invalid EMPATHY_* environment"),
    }
}

fn init_logging(args: &Args, config: &Config) -> Result<()> {
    let mut log_config = LogConfig::try_from(&config.logging)?;

    if let Some(level) = &args.log_level {
        log_config.level = LogLevel::parse(level).unwrap_or_else(|| {
            eprintln!("Invalid log level '{}', using 'info'", level);
            LogLevel::Info
        });
    }
    if args.json_logs {
        log_config.json_format = true;
    }

    init_logging_with_config(log_config)?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(args.config.as_ref())?;
    init_logging(&args, &config)?;
    empathy_core::metrics::init_metrics();

    match &args.command {
        Command::Replay { scenario } => {
            let scenario = Scenario::from_file(scenario)?;

            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            let mut failed = None;

            let summary = replay(scenario, config.group, |event| {
                if failed.is_some() {
                    return;
                }
                let line = serde_json::to_string(event).map_err(anyhow::Error::from);
                let written = line.and_then(|line| writeln!(out, "{}", line).map_err(Into::into));
                if let Err(e) = written {
                    failed = Some(e);
                }
            })
            .await?;

            if let Some(e) = failed {
                return Err(e.context("cannot write event"));
            }

            writeln!(out, "{}", serde_json::to_string(&summary)?)?;
            info!(
                state = %summary.state,
                members = summary.snapshot.members.len(),
                "Replay finished"
            );
        }
        Command::CheckConfig { file } => {
            let config = Config::from_file(file)
                .with_context(|| format!("invalid configuration {}", file.display()))?;
            println!("{}", serde_json::to_string_pretty(&config)?);
            info!(file = %file.display(), "Configuration is valid");
        }
    }

    Ok(())
}
