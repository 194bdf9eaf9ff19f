// CLI module - user-facing command-line interface

mod output;

use crate::config::MasterConfig;
use crate::discovery::discover;
use crate::error::Result;
use crate::logging;
use crate::pidfile::PidFile;
use crate::process::Supervisor;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tokio::signal;
use tokio::sync::oneshot;
use tracing::info;

/// apimaster - supervisor for the scraper API service fleet
#[derive(Parser)]
#[command(name = "apimaster")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover services under ROOT and supervise them until SIGINT/SIGTERM
    Run {
        /// Root directory containing the service subdirectories
        #[arg(default_value = ".")]
        root: PathBuf,

        /// Configuration file (TOML or JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Directory for the supervisor log and per-service output logs
        #[arg(long)]
        log_dir: Option<PathBuf>,

        /// Seconds between liveness polls
        #[arg(long)]
        poll_interval: Option<u64>,

        /// Seconds to wait for graceful exit before force kill
        #[arg(long)]
        stop_timeout: Option<u64>,

        /// Do not relaunch services that exit unexpectedly
        #[arg(long)]
        no_restart: bool,

        /// Pid file path
        #[arg(long)]
        pid_file: Option<PathBuf>,
    },

    /// Discover services under ROOT and print them without launching
    List {
        /// Root directory containing the service subdirectories
        #[arg(default_value = ".")]
        root: PathBuf,

        /// Configuration file (TOML or JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

impl Cli {
    /// Run the CLI application
    pub async fn run() -> Result<()> {
        let cli = Cli::parse();
        cli.execute().await
    }

    async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Run {
                root,
                config,
                log_dir,
                poll_interval,
                stop_timeout,
                no_restart,
                pid_file,
            } => {
                let mut config = load_config(config.as_deref())?;

                // Command-line flags override the file
                if let Some(dir) = log_dir {
                    config.log_dir = dir;
                }
                if let Some(secs) = poll_interval {
                    config.poll_interval_secs = secs;
                }
                if let Some(secs) = stop_timeout {
                    config.stop_timeout_secs = secs;
                }
                if no_restart {
                    config.autorestart = false;
                }
                config.validate()?;

                run_supervisor(&root, config, pid_file).await
            }

            Commands::List { root, config } => {
                logging::init_console()?;
                let config = load_config(config.as_deref())?;
                let specs = discover(&root, &config)?;
                output::print_service_table(&specs);
                Ok(())
            }
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<MasterConfig> {
    match path {
        Some(path) => MasterConfig::from_file(path),
        None => Ok(MasterConfig::default()),
    }
}

/// The full supervising run: discover, launch, poll until a termination
/// signal arrives, then shut everything down.
async fn run_supervisor(root: &Path, config: MasterConfig, pid_file: Option<PathBuf>) -> Result<()> {
    let log_path = logging::init(&config.log_dir)?;

    info!("=== apimaster starting ===");
    info!("Log file: {}", log_path.display());

    // Discovery's missing-root failure is the one fatal precondition
    let specs = discover(root, &config)?;

    let pid_file = pid_file.map(PidFile::with_path).unwrap_or_default();
    pid_file.write()?;

    let mut supervisor = Supervisor::new(config);
    supervisor.start_all(&specs).await;

    let shutdown = shutdown_signal();
    let result = supervisor.run(shutdown).await;

    if let Err(e) = pid_file.remove() {
        tracing::warn!("failed to remove pid file: {}", e);
    }

    info!("=== apimaster stopped ===");

    result
}

/// Receiver that fires on SIGINT or SIGTERM.
///
/// The handler task only sends on the channel; the shutdown sequence itself
/// runs inside the supervisor flow, so no state is touched from the handler.
fn shutdown_signal() -> oneshot::Receiver<()> {
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to setup SIGTERM handler");
        let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt())
            .expect("Failed to setup SIGINT handler");

        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM");
            }
            _ = sigint.recv() => {
                info!("Received SIGINT");
            }
        }

        let _ = tx.send(());
    });

    rx
}
