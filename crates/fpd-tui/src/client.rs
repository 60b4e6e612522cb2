//! Daemon connection client for the FPD TUI.
//!
//! This module provides the `DaemonClient` which handles:
//! - Connection to `fpdd` via Unix socket
//! - Automatic reconnection with exponential backoff
//! - Forwarding the snapshot and registry events to the TUI event loop
//! - Sending operator commands (enroll, delete, refresh...) to the daemon
//!
//! **Panic-Free Policy:** no `.unwrap()`, `.expect()`, `panic!()`,
//! `unreachable!()`, or `todo!()` outside tests.

use std::path::PathBuf;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::{Result, TuiError};
use crate::input::{ClientCommand, Event};
use fpd_protocol::{ClientMessage, DaemonMessage, ProtocolVersion};

/// Socket the daemon listens on unless told otherwise.
pub const DEFAULT_SOCKET_PATH: &str = "/tmp/fpd.sock";

// ============================================================================
// Configuration
// ============================================================================

/// Connection behaviour for [`DaemonClient`].
///
/// # Example
///
/// ```rust
/// use fpd_tui::client::ClientConfig;
/// use std::time::Duration;
///
/// let config = ClientConfig {
///     socket_path: std::path::PathBuf::from("/tmp/other-fpd.sock"),
///     retry_initial_delay: Duration::from_millis(500),
///     ..Default::default()
/// };
/// assert_eq!(config.retry_max_delay, Duration::from_secs(30));
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub socket_path: PathBuf,

    /// Delay before the first retry after a failed connect.
    pub retry_initial_delay: Duration,

    pub retry_max_delay: Duration,

    /// Backoff factor applied after every failed attempt.
    pub retry_multiplier: f64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            socket_path: PathBuf::from(DEFAULT_SOCKET_PATH),
            retry_initial_delay: Duration::from_secs(1),
            retry_max_delay: Duration::from_secs(30),
            retry_multiplier: 2.0,
        }
    }
}

impl ClientConfig {
    /// Default config pointed at `socket_path`.
    pub fn with_socket(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
            ..Default::default()
        }
    }

    /// Delay to wait after `current`, capped at `retry_max_delay`.
    pub fn next_delay(&self, current: Duration) -> Duration {
        let next_ms = (current.as_millis() as f64 * self.retry_multiplier) as u64;
        Duration::from_millis(next_ms).min(self.retry_max_delay)
    }
}

// ============================================================================
// Daemon Client
// ============================================================================

/// Keeps the TUI attached to the daemon.
///
/// # Connection Lifecycle
///
/// 1. Connect to the Unix socket, retrying with backoff
/// 2. Send `Connect` and wait for `Connected`
/// 3. Send `Subscribe`; the daemon answers `Subscribed` then a `Snapshot`
/// 4. Forward snapshots and events to the TUI, send its commands
/// 5. On disconnect, notify the TUI and start over
pub struct DaemonClient {
    config: ClientConfig,

    event_tx: mpsc::UnboundedSender<Event>,

    command_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<ClientCommand>>,

    cancel_token: CancellationToken,
}

impl DaemonClient {
    #[must_use]
    pub fn new(
        config: ClientConfig,
        event_tx: mpsc::UnboundedSender<Event>,
        command_rx: mpsc::UnboundedReceiver<ClientCommand>,
        cancel_token: CancellationToken,
    ) -> Self {
        Self {
            config,
            event_tx,
            command_rx: tokio::sync::Mutex::new(command_rx),
            cancel_token,
        }
    }

    /// Runs until the cancellation token fires.
    pub async fn run(&self) {
        info!(
            socket_path = %self.config.socket_path.display(),
            "Daemon client starting"
        );

        loop {
            if self.cancel_token.is_cancelled() {
                info!("Daemon client shutting down (cancelled)");
                return;
            }

            match self.connect_with_retry().await {
                Ok(stream) => {
                    info!("Connected to daemon");

                    if let Err(e) = self.handle_connection(stream).await {
                        warn!(error = %e, "Connection ended with error");
                    }

                    // The TUI may already be gone
                    let _ = self.event_tx.send(Event::DaemonDisconnected);
                }
                Err(e) => {
                    if !self.cancel_token.is_cancelled() {
                        error!(error = %e, "Failed to connect to daemon");
                    }
                }
            }
        }
    }

    /// Retries until connected or cancelled.
    async fn connect_with_retry(&self) -> Result<UnixStream> {
        let mut delay = self.config.retry_initial_delay;
        let mut attempt = 0u32;

        loop {
            attempt = attempt.saturating_add(1);

            if !self.config.socket_path.exists() {
                if attempt == 1 {
                    warn!(
                        socket_path = %self.config.socket_path.display(),
                        "Daemon socket not found, will retry"
                    );
                }
            } else {
                match UnixStream::connect(&self.config.socket_path).await {
                    Ok(stream) => {
                        debug!(attempt, "Connection successful");
                        return Ok(stream);
                    }
                    Err(e) => {
                        debug!(attempt, error = %e, "Connection attempt failed");
                    }
                }
            }

            tokio::select! {
                _ = sleep(delay) => {
                    delay = self.config.next_delay(delay);
                }
                _ = self.cancel_token.cancelled() => {
                    return Err(TuiError::DaemonConnection("cancelled".to_string()));
                }
            }
        }
    }

    async fn handle_connection(&self, stream: UnixStream) -> Result<()> {
        let (reader, mut writer) = stream.into_split();
        let mut buf_reader = BufReader::new(reader);

        self.send_message(&mut writer, &ClientMessage::connect(None))
            .await?;

        let mut line = String::new();
        if buf_reader.read_line(&mut line).await? == 0 {
            return Err(TuiError::DaemonConnection(
                "daemon closed the connection during handshake".to_string(),
            ));
        }

        match serde_json::from_str::<DaemonMessage>(line.trim())? {
            DaemonMessage::Connected {
                protocol_version,
                client_id,
            } => {
                if !ProtocolVersion::CURRENT.is_compatible_with(&protocol_version) {
                    return Err(TuiError::VersionMismatch {
                        client_version: ProtocolVersion::CURRENT.to_string(),
                        daemon_version: protocol_version.to_string(),
                    });
                }
                info!(client_id, protocol_version = %protocol_version, "Handshake complete");
            }
            DaemonMessage::Rejected {
                protocol_version, ..
            } => {
                return Err(TuiError::VersionMismatch {
                    client_version: ProtocolVersion::CURRENT.to_string(),
                    daemon_version: protocol_version.to_string(),
                });
            }
            other => {
                return Err(TuiError::ProtocolError(format!(
                    "Unexpected response to connect: {other:?}"
                )));
            }
        }

        // Subscribing also delivers the initial snapshot
        self.send_message(&mut writer, &ClientMessage::subscribe())
            .await?;

        self.message_loop(&mut buf_reader, &mut writer).await
    }

    async fn send_message<W: AsyncWriteExt + Unpin>(
        &self,
        writer: &mut W,
        message: &ClientMessage,
    ) -> Result<()> {
        let json = serde_json::to_string(message)?;
        writer.write_all(json.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
        debug!(message_type = ?message.message, "Sent message to daemon");
        Ok(())
    }

    /// Multiplexes daemon lines and TUI commands until EOF or cancellation.
    async fn message_loop<R, W>(&self, reader: &mut R, writer: &mut W) -> Result<()>
    where
        R: AsyncBufReadExt + Unpin,
        W: AsyncWriteExt + Unpin,
    {
        let mut line = String::new();

        loop {
            if self.cancel_token.is_cancelled() {
                return Ok(());
            }

            let mut command_rx = self.command_rx.lock().await;

            line.clear();
            tokio::select! {
                read_result = reader.read_line(&mut line) => {
                    drop(command_rx);
                    match read_result {
                        Ok(0) => {
                            info!("Daemon closed connection");
                            return Ok(());
                        }
                        Ok(_) => {
                            // A single bad line is not worth a reconnect
                            if let Err(e) = self.handle_message(line.trim()) {
                                warn!(error = %e, line = %line.trim(), "Failed to handle message");
                            }
                        }
                        Err(e) => return Err(TuiError::Io(e)),
                    }
                }

                command = command_rx.recv() => {
                    drop(command_rx);
                    match command {
                        Some(command) => {
                            let message = command_message(command);
                            if let Err(e) = self.send_message(writer, &message).await {
                                warn!(error = %e, "Failed to send command");
                                return Err(e);
                            }
                        }
                        None => {
                            debug!("Command channel closed");
                            return Ok(());
                        }
                    }
                }

                _ = self.cancel_token.cancelled() => {
                    drop(command_rx);
                    return Ok(());
                }
            }
        }
    }

    /// Parses one daemon line and forwards what the TUI cares about.
    fn handle_message(&self, line: &str) -> Result<()> {
        let message: DaemonMessage = serde_json::from_str(line)?;

        match message {
            DaemonMessage::Snapshot { snapshot } => {
                debug!(
                    users = snapshot.users.len(),
                    log_entries = snapshot.access_log.len(),
                    "Received snapshot"
                );
                let _ = self.event_tx.send(Event::Snapshot(snapshot));
            }
            DaemonMessage::Event { event } => {
                debug!(event = event.name(), "Received registry event");
                let _ = self.event_tx.send(Event::Registry(event));
            }
            DaemonMessage::Error { message, code } => {
                warn!(error_message = %message, error_code = ?code, "Received error from daemon");
                let _ = self.event_tx.send(Event::DaemonError(message));
            }
            DaemonMessage::Connected { .. } | DaemonMessage::Rejected { .. } => {
                warn!("Received unexpected handshake message after connection");
            }
            // Replies to our own commands; the matching events carry the state
            other => {
                debug!(reply = ?other, "Received reply");
            }
        }

        Ok(())
    }
}

fn command_message(command: ClientCommand) -> ClientMessage {
    match command {
        ClientCommand::Enroll(form) => ClientMessage::enroll(form),
        ClientCommand::ConfirmEnrollment(user_id) => ClientMessage::confirm(user_id),
        ClientCommand::DeleteUser(user_id) => ClientMessage::delete_user(user_id),
        ClientCommand::ClearUsers => ClientMessage::clear_users(),
        ClientCommand::SimulateAccess => ClientMessage::simulate_access(),
        ClientCommand::RefreshDevices => ClientMessage::refresh_devices(),
        ClientCommand::Resync => ClientMessage::get_snapshot(),
    }
}

// ============================================================================
// Tests
// ============================================================================
