//! fpd daemon - access-control registry and broadcast server
//!
//! Owns the user, device, access log and notification state and serves it
//! to dashboard clients over a Unix socket.
//!
//! # Usage
//!
//! ```bash
//! # Start the daemon (foreground)
//! fpdd start
//!
//! # Start the daemon (background/daemonized)
//! fpdd start -d
//!
//! # Use a specific config file
//! fpdd --config ./fpd.toml start
//!
//! # Stop the daemon
//! fpdd stop
//!
//! # Check daemon status
//! fpdd status
//! ```

use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;
use std::process;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use fpd_core::Registry;
use fpdd::config::DaemonConfig;
use fpdd::registry::spawn_registry;
use fpdd::seed::demo_snapshot;
use fpdd::server::DaemonServer;
use fpdd::simulator::Simulator;

/// fpd daemon - fingerprint access-control registry
#[derive(Parser, Debug)]
#[command(name = "fpdd", version, about)]
struct Args {
    /// Config file (defaults to $XDG_CONFIG_HOME/fpd/config.toml)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the daemon
    Start {
        /// Run as a background daemon (fork to background)
        #[arg(short = 'd', long)]
        daemon: bool,
    },
    /// Stop the running daemon
    Stop,
    /// Show daemon status
    Status,
}

fn state_dir() -> PathBuf {
    dirs::state_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("fpd")
}

fn pid_file_path() -> PathBuf {
    state_dir().join("fpdd.pid")
}

fn log_file_path() -> PathBuf {
    state_dir().join("fpdd.log")
}

fn read_pid() -> Option<u32> {
    fs::read_to_string(pid_file_path()).ok()?.trim().parse().ok()
}

fn write_pid() -> Result<()> {
    let path = pid_file_path();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create state directory")?;
    }
    let mut file = File::create(&path).context("Failed to create PID file")?;
    write!(file, "{}", process::id()).context("Failed to write PID")?;
    Ok(())
}

fn remove_pid_file() {
    let _ = fs::remove_file(pid_file_path());
}

fn is_process_running(pid: u32) -> bool {
    PathBuf::from(format!("/proc/{pid}")).exists()
}

/// Returns the pid of a live daemon, cleaning up a stale pid file.
fn running_daemon_pid() -> Option<u32> {
    if let Some(pid) = read_pid() {
        if is_process_running(pid) {
            return Some(pid);
        }
        remove_pid_file();
    }
    None
}

fn stop_daemon(pid: u32) -> Result<()> {
    #[cfg(unix)]
    {
        let pid = libc::pid_t::try_from(pid).context("PID out of range")?;
        // SAFETY: kill(2) has no memory-safety preconditions.
        let result = unsafe { libc::kill(pid, libc::SIGTERM) };
        if result != 0 {
            bail!("Failed to send SIGTERM to process {pid}");
        }
    }
    #[cfg(not(unix))]
    {
        bail!("Stop command is only supported on Unix systems");
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = DaemonConfig::load(args.config.as_deref()).context("Failed to load config")?;
    let command = args.command.unwrap_or(Command::Start { daemon: false });

    match command {
        Command::Start { daemon } => {
            if let Some(pid) = running_daemon_pid() {
                eprintln!("Daemon is already running (PID {pid})");
                eprintln!("Use 'fpdd stop' to stop it first.");
                process::exit(1);
            }

            if daemon {
                daemonize()?;
            }

            write_pid()?;

            let result = run_daemon(config);

            remove_pid_file();

            result
        }
        Command::Stop => {
            let Some(pid) = running_daemon_pid() else {
                println!("Daemon is not running.");
                return Ok(());
            };

            println!("Stopping daemon (PID {pid})...");
            stop_daemon(pid)?;

            for _ in 0..50 {
                if !is_process_running(pid) {
                    println!("Daemon stopped.");
                    return Ok(());
                }
                std::thread::sleep(std::time::Duration::from_millis(100));
            }

            eprintln!("Daemon did not stop within 5 seconds.");
            process::exit(1);
        }
        Command::Status => {
            let Some(pid) = running_daemon_pid() else {
                println!("Daemon is not running.");
                process::exit(1);
            };

            println!("Daemon is running (PID {pid})");
            if config.socket_path.exists() {
                println!("Socket: {}", config.socket_path.display());
            }
            Ok(())
        }
    }
}

fn daemonize() -> Result<()> {
    use daemonize::Daemonize;

    let log_path = log_file_path();

    if let Some(parent) = log_path.parent() {
        fs::create_dir_all(parent).context("Failed to create log directory")?;
    }

    let stdout = File::create(&log_path).context("Failed to create log file for stdout")?;
    let stderr = stdout
        .try_clone()
        .context("Failed to create log file for stderr")?;

    Daemonize::new()
        .working_directory("/")
        .stdout(stdout)
        .stderr(stderr)
        .start()
        .context("Failed to daemonize")?;

    Ok(())
}

#[tokio::main]
async fn run_daemon(config: DaemonConfig) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("fpdd=info".parse()?)
                .add_directive("fpd_core=info".parse()?),
        )
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        pid = process::id(),
        "fpd daemon starting"
    );

    let cancel_token = CancellationToken::new();

    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        if let Err(e) = wait_for_shutdown_signal().await {
            error!(error = %e, "Error waiting for shutdown signal");
        }
        info!("Shutdown signal received");
        shutdown_token.cancel();
    });

    let registry = spawn_registry(Registry::new());
    info!("Access-control registry started");

    if config.seed_demo_data {
        registry
            .restore(demo_snapshot(Utc::now()))
            .await
            .context("Failed to load demo data")?;
        info!("Demo data loaded");
    }

    let simulator = Simulator::from_config(&config);
    let timers = simulator.spawn_timers(&config, registry.clone(), cancel_token.clone());
    info!(timers = timers.len(), "Simulation timers started");

    let server = DaemonServer::new(
        config.socket_path.clone(),
        registry,
        simulator,
        cancel_token,
    );

    info!(socket = %config.socket_path.display(), "Starting server");

    if let Err(e) = server.run().await {
        error!(error = %e, "Server error");
        return Err(e.into());
    }

    info!("fpd daemon stopped");
    Ok(())
}

async fn wait_for_shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;

        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM");
            }
            _ = sigint.recv() => {
                info!("Received SIGINT");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        info!("Received Ctrl+C");
    }

    Ok(())
}
