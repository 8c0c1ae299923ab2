use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use rummo::{util, Config, FailurePolicy};

/// Run a notebook once and mirror its cells into an on-disk snapshot
#[derive(Debug, Parser)]
#[command(name = "rummo", version, about)]
struct Cli {
    /// Path to the user notebook
    user_notebook: PathBuf,

    /// Install the figure capture adapter and save rendered figures
    #[arg(long)]
    capture_figures: bool,

    /// What to do when a cell fails (overrides the config file)
    #[arg(long, value_enum)]
    failure_policy: Option<FailurePolicy>,

    /// Data directory for config and logs (default: ~/.rummo)
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    util::init_data_dir(cli.data_dir.clone());

    // Initialize logging to file (~/.rummo/logs/rummo.log)
    fs::create_dir_all(util::logs_dir())?;

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(util::log_file_path())?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(log_file)
        .with_ansi(false) // Disable ANSI colors in log file
        .init();

    let mut config = Config::load();
    if cli.capture_figures {
        config = config.with_figures(true);
    }
    if let Some(policy) = cli.failure_policy {
        config = config.with_failure_policy(policy);
    }

    let report = rummo::run_once(&cli.user_notebook, &config).await?;
    println!("{}", report.snapshot_path.display());

    if report.is_success() {
        return Ok(ExitCode::SUCCESS);
    }
    for failure in &report.failures {
        eprintln!("{}", failure.error);
    }
    if report.aborted {
        eprintln!("run stopped early ({} policy)", config.failure_policy);
    }
    Ok(ExitCode::FAILURE)
}
