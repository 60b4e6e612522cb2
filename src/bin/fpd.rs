//! fpd - terminal dashboard for the fingerprint access-control system
//!
//! Connects to `fpdd` (starting it if needed), mirrors its registry and
//! sends enrollment, deletion and simulation requests back.
//!
//! # Usage
//!
//! ```text
//! fpd                          # Connect to the default socket
//! fpd --socket /run/fpd.sock   # Connect to another daemon
//! fpd --no-spawn               # Never start fpdd automatically
//! ```

use std::fs::{self, OpenOptions};
use std::io::{self, Stdout};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event as CrosstermEvent},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use fpd_tui::app::App;
use fpd_tui::client::{ClientConfig, DaemonClient, DEFAULT_SOCKET_PATH};
use fpd_tui::daemon;
use fpd_tui::error::{Result as TuiResult, TuiError};
use fpd_tui::input::{handle_key_event, Action, ClientCommand, Event};
use fpd_tui::ui;

// ============================================================================
// CLI Arguments
// ============================================================================

/// fpd - fingerprint access-control dashboard
#[derive(Parser, Debug)]
#[command(name = "fpd")]
#[command(about = "Monitor and manage a fingerprint access-control system")]
#[command(version)]
struct Args {
    /// Daemon socket path (defaults to $FPD_SOCKET, then /tmp/fpd.sock)
    #[arg(long, short = 's')]
    socket: Option<PathBuf>,

    /// Do not start fpdd when it is not running
    #[arg(long)]
    no_spawn: bool,
}

// ============================================================================
// Terminal Setup / Cleanup
// ============================================================================

fn setup_terminal() -> TuiResult<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().map_err(|e| TuiError::TerminalInit(e.to_string()))?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).map_err(|e| TuiError::TerminalInit(e.to_string()))?;

    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(|e| TuiError::TerminalInit(e.to_string()))
}

fn cleanup_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> TuiResult<()> {
    disable_raw_mode().map_err(|e| TuiError::TerminalCleanup(e.to_string()))?;

    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .map_err(|e| TuiError::TerminalCleanup(e.to_string()))?;

    terminal
        .show_cursor()
        .map_err(|e| TuiError::TerminalCleanup(e.to_string()))?;

    Ok(())
}

// ============================================================================
// Keyboard Input Task
// ============================================================================

fn spawn_keyboard_task(
    event_tx: mpsc::UnboundedSender<Event>,
    cancel_token: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            if cancel_token.is_cancelled() {
                debug!("Keyboard task shutting down");
                break;
            }

            let poll_result = tokio::task::spawn_blocking(|| {
                if event::poll(Duration::from_millis(50)).unwrap_or(false) {
                    event::read().ok()
                } else {
                    None
                }
            })
            .await;

            let event = match poll_result {
                Ok(Some(CrosstermEvent::Key(key))) => Event::Key(key),
                Ok(Some(CrosstermEvent::Resize(width, height))) => Event::Resize(width, height),
                Ok(_) => continue,
                Err(e) => {
                    error!(error = %e, "Keyboard polling task panicked");
                    break;
                }
            };

            if event_tx.send(event).is_err() {
                debug!("Event channel closed, keyboard task exiting");
                break;
            }
        }
    })
}

// ============================================================================
// Main Event Loop
// ============================================================================

/// Redraws on every event and at least every 100ms so relative timestamps
/// stay current.
async fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
    event_rx: &mut mpsc::UnboundedReceiver<Event>,
    command_tx: &mpsc::UnboundedSender<ClientCommand>,
    cancel_token: &CancellationToken,
) -> Result<()> {
    let tick_rate = Duration::from_millis(100);

    while !cancel_token.is_cancelled() {
        terminal.draw(|frame| ui::render(frame, app))?;

        match tokio::time::timeout(tick_rate, event_rx.recv()).await {
            Ok(Some(event)) => dispatch(event, app, command_tx),
            Ok(None) => {
                warn!("Event channel closed");
                break;
            }
            Err(_) => {}
        }

        if app.should_quit {
            info!("User requested quit");
            cancel_token.cancel();
        }
    }

    Ok(())
}

/// Applies one event to the app, forwarding daemon requests to the client.
fn dispatch(event: Event, app: &mut App, command_tx: &mpsc::UnboundedSender<ClientCommand>) {
    match event {
        Event::Key(key) => match handle_key_event(key, app) {
            Action::Quit => app.quit(),
            Action::Send(command) => {
                debug!(?command, "Sending command to daemon");
                if command_tx.send(command).is_err() {
                    warn!("Daemon client has stopped, dropping command");
                    app.set_error("Not connected to daemon");
                }
            }
            Action::None => {}
        },
        Event::Resize(width, height) => debug!(width, height, "Terminal resized"),
        Event::Snapshot(snapshot) => {
            debug!(
                users = snapshot.users.len(),
                entries = snapshot.access_log.len(),
                "Received registry snapshot"
            );
            app.apply_snapshot(*snapshot);
        }
        Event::Registry(registry_event) => {
            debug!(?registry_event, "Received registry event");
            app.apply_event(registry_event);
        }
        Event::DaemonError(message) => {
            warn!(error = %message, "Daemon rejected request");
            app.set_error(message);
        }
        Event::DaemonDisconnected => {
            warn!("Daemon disconnected");
            app.mark_disconnected();
        }
    }
}

// ============================================================================
// Logging Setup
// ============================================================================

fn get_log_dir() -> Option<PathBuf> {
    if let Ok(xdg_state) = std::env::var("XDG_STATE_HOME") {
        return Some(PathBuf::from(xdg_state).join("fpd"));
    }
    std::env::var("HOME")
        .ok()
        .map(|home| PathBuf::from(home).join(".local/state/fpd"))
}

fn create_log_file() -> Option<std::fs::File> {
    let log_dir = get_log_dir()?;

    if let Err(e) = fs::create_dir_all(&log_dir) {
        eprintln!("Warning: Failed to create log directory {log_dir:?}: {e}");
        return None;
    }

    let log_path = log_dir.join("tui.log");

    match OpenOptions::new().create(true).append(true).open(&log_path) {
        Ok(file) => Some(file),
        Err(e) => {
            eprintln!("Warning: Failed to open log file {log_path:?}: {e}");
            None
        }
    }
}

/// Logs go to a file; stdout belongs to the terminal UI.
fn init_logging() {
    match create_log_file() {
        Some(file) => {
            let filter = EnvFilter::from_default_env().add_directive(
                "fpd_tui=info".parse().unwrap_or_else(|_| {
                    tracing_subscriber::filter::Directive::from(tracing::Level::INFO)
                }),
            );

            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(EnvFilter::new("off"))
                .init();
        }
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging();

    let socket_path = args
        .socket
        .or_else(|| std::env::var_os("FPD_SOCKET").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SOCKET_PATH));

    info!(socket = %socket_path.display(), "fpd TUI starting...");

    if !args.no_spawn {
        if let Err(e) = daemon::ensure_daemon_running() {
            bail!("Failed to ensure daemon is running: {e}");
        }
    }

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();
    let (command_tx, command_rx) = mpsc::unbounded_channel::<ClientCommand>();
    let cancel_token = CancellationToken::new();

    let mut terminal = match setup_terminal() {
        Ok(t) => t,
        Err(e) => {
            error!(error = %e, "Failed to initialize terminal");
            return Err(e.into());
        }
    };

    let mut app = App::new();

    let daemon_client = DaemonClient::new(
        ClientConfig::with_socket(socket_path),
        event_tx.clone(),
        command_rx,
        cancel_token.clone(),
    );
    let daemon_handle = tokio::spawn(async move {
        daemon_client.run().await;
    });

    let keyboard_handle = spawn_keyboard_task(event_tx, cancel_token.clone());

    let result = run_event_loop(
        &mut terminal,
        &mut app,
        &mut event_rx,
        &command_tx,
        &cancel_token,
    )
    .await;

    cancel_token.cancel();

    let _ = tokio::time::timeout(Duration::from_millis(100), daemon_handle).await;
    let _ = tokio::time::timeout(Duration::from_millis(100), keyboard_handle).await;

    if let Err(e) = cleanup_terminal(&mut terminal) {
        error!(error = %e, "Failed to cleanup terminal");
    }

    info!("fpd TUI stopped");

    result
}
