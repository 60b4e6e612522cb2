//! Starting `fpdd` on demand.
//!
//! The TUI is useless without the daemon, so before connecting it checks
//! the daemon's pid file and launches `fpdd start -d` if nothing is running.

use std::fs;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

use tracing::{debug, info};

const STARTUP_POLL_INTERVAL: Duration = Duration::from_millis(100);
const STARTUP_POLL_ATTEMPTS: u32 = 30;

/// Pid file written by `fpdd start`.
pub fn pid_file_path() -> PathBuf {
    dirs::state_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("fpd")
        .join("fpdd.pid")
}

fn read_pid() -> Option<u32> {
    fs::read_to_string(pid_file_path()).ok()?.trim().parse().ok()
}

fn is_process_running(pid: u32) -> bool {
    PathBuf::from(format!("/proc/{pid}")).exists()
}

pub fn is_daemon_running() -> bool {
    read_pid().is_some_and(is_process_running)
}

/// Spawns `fpdd start -d`, preferring the binary next to our own.
fn spawn_daemon() -> std::io::Result<()> {
    let fpdd_path = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|d| d.join("fpdd")))
        .filter(|p| p.exists())
        .unwrap_or_else(|| PathBuf::from("fpdd"));

    debug!(path = %fpdd_path.display(), "Starting daemon");

    Command::new(&fpdd_path)
        .args(["start", "-d"])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;

    Ok(())
}

/// Ensures the daemon is running, starting it if necessary.
///
/// Waits up to three seconds for the pid file to show a live process.
pub fn ensure_daemon_running() -> Result<(), String> {
    if is_daemon_running() {
        debug!("Daemon already running");
        return Ok(());
    }

    info!("Daemon not running, starting it");

    spawn_daemon().map_err(|e| format!("Failed to start daemon: {e}"))?;

    for attempt in 1..=STARTUP_POLL_ATTEMPTS {
        thread::sleep(STARTUP_POLL_INTERVAL);

        if is_daemon_running() {
            info!(attempts = attempt, "Daemon started");
            return Ok(());
        }
    }

    Err("Daemon failed to start within 3 seconds".to_string())
}
