//! Unix socket server for the fpd daemon.
//!
//! ```text
//!  UnixListener ── accept() ──▶ ConnectionHandler (one task per client)
//!                                     │ requests
//!                                     ▼
//!                               RegistryHandle ── RegistryEvent ──▶ broadcaster
//!                                                                      │
//!                     subscribed clients ◀── DaemonMessage::Event ─────┘
//! ```
//!
//! If the broadcaster falls behind the registry's event channel, the
//! skipped events are gone; every subscriber then gets a fresh snapshot
//! instead so its mirror converges again.

mod connection;

pub use connection::{ConnectionError, ConnectionHandler, Subscriber, SubscriberWriter, SubscribersMap};

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::net::{UnixListener, UnixStream};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use fpd_protocol::DaemonMessage;

use crate::registry::RegistryHandle;
use crate::simulator::Simulator;

pub use crate::config::DEFAULT_SOCKET_PATH;

/// Serves the registry to dashboard clients.
pub struct DaemonServer {
    socket_path: PathBuf,
    registry: RegistryHandle,
    /// Handles on-demand `SimulateAccess` / `RefreshDevices` requests
    simulator: Simulator,
    cancel_token: CancellationToken,
    /// Source of default client ids
    next_connection: AtomicU64,
    subscribers: SubscribersMap,
}

impl DaemonServer {
    pub fn new(
        socket_path: impl Into<PathBuf>,
        registry: RegistryHandle,
        simulator: Simulator,
        cancel_token: CancellationToken,
    ) -> Self {
        Self {
            socket_path: socket_path.into(),
            registry,
            simulator,
            cancel_token,
            next_connection: AtomicU64::new(0),
            subscribers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Accepts connections until the cancellation token fires, then removes
    /// the socket file.
    pub async fn run(&self) -> Result<(), ServerError> {
        let listener = self.bind()?;
        info!(socket = %self.socket_path.display(), "Daemon server listening");

        self.spawn_event_broadcaster();

        loop {
            tokio::select! {
                _ = self.cancel_token.cancelled() => {
                    info!("Server shutdown requested");
                    break;
                }

                accepted = listener.accept() => match accepted {
                    Ok((stream, _addr)) => self.spawn_connection(stream),
                    Err(e) => error!(error = %e, "Failed to accept connection"),
                },
            }
        }

        self.shutdown().await;
        Ok(())
    }

    /// Binds the listener, replacing a stale socket file left by a previous
    /// run and creating the parent directory if needed.
    fn bind(&self) -> Result<UnixListener, ServerError> {
        let setup_error = |e: std::io::Error| ServerError::SocketSetup {
            path: self.socket_path.clone(),
            error: e.to_string(),
        };

        if self.socket_path.exists() {
            std::fs::remove_file(&self.socket_path).map_err(setup_error)?;
        }

        if let Some(parent) = self.socket_path.parent() {
            std::fs::create_dir_all(parent).map_err(setup_error)?;
        }

        UnixListener::bind(&self.socket_path).map_err(setup_error)
    }

    fn spawn_connection(&self, stream: UnixStream) {
        let connection_number = self.next_connection.fetch_add(1, Ordering::Relaxed);
        let (reader, writer) = stream.into_split();
        let handler = ConnectionHandler::new(
            reader,
            writer,
            self.registry.clone(),
            self.simulator,
            Arc::clone(&self.subscribers),
            connection_number,
        );
        let subscribers = Arc::clone(&self.subscribers);

        tokio::spawn(async move {
            let Some(client_id) = handler.run().await else {
                return;
            };
            if subscribers.write().await.remove(&client_id).is_some() {
                debug!(client_id = %client_id, "Removed disconnected subscriber");
            }
        });
    }

    fn spawn_event_broadcaster(&self) {
        let mut events = self.registry.subscribe();
        let registry = self.registry.clone();
        let subscribers = Arc::clone(&self.subscribers);
        let cancel_token = self.cancel_token.clone();

        tokio::spawn(async move {
            loop {
                let received = tokio::select! {
                    _ = cancel_token.cancelled() => break,
                    received = events.recv() => received,
                };

                let msg = match received {
                    Ok(event) => DaemonMessage::event(event),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Event broadcaster lagged, resyncing subscribers");
                        match registry.snapshot().await {
                            Ok(snapshot) => DaemonMessage::snapshot(snapshot),
                            Err(e) => {
                                warn!(error = %e, "Resync snapshot failed");
                                continue;
                            }
                        }
                    }
                    Err(RecvError::Closed) => {
                        debug!("Registry event channel closed");
                        break;
                    }
                };

                broadcast(&subscribers, &msg).await;
            }
            debug!("Event broadcaster stopped");
        });
    }

    async fn shutdown(&self) {
        self.subscribers.write().await.clear();

        if let Err(e) = std::fs::remove_file(&self.socket_path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(
                    socket = %self.socket_path.display(),
                    error = %e,
                    "Failed to remove socket file"
                );
            }
        }

        info!("Server stopped");
    }
}

/// Writes `msg` to every subscriber and drops the ones whose write failed.
async fn broadcast(subscribers: &SubscribersMap, msg: &DaemonMessage) {
    let mut failed = Vec::new();

    for (client_id, subscriber) in subscribers.read().await.iter() {
        let mut writer = subscriber.writer.lock().await;
        if let Err(e) = connection::write_message(&mut writer, msg).await {
            debug!(client_id = %client_id, error = %e, "Failed to deliver to subscriber");
            failed.push(client_id.clone());
        }
    }

    if failed.is_empty() {
        return;
    }

    let mut subs = subscribers.write().await;
    for client_id in failed {
        subs.remove(&client_id);
        debug!(client_id = %client_id, "Dropped unreachable subscriber");
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to setup socket at {path}: {error}")]
    SocketSetup { path: PathBuf, error: String },

    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_error_display() {
        let err = ServerError::SocketSetup {
            path: PathBuf::from("/tmp/test.sock"),
            error: "permission denied".to_string(),
        };
        assert!(err.to_string().contains("/tmp/test.sock"));
        assert!(err.to_string().contains("permission denied"));
    }

    #[tokio::test]
    async fn test_bind_replaces_stale_socket_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("fpd.sock");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"stale").unwrap();

        let server = DaemonServer::new(
            &path,
            crate::registry::spawn_registry(fpd_core::Registry::new()),
            Simulator::default(),
            CancellationToken::new(),
        );

        let listener = server.bind().unwrap();
        drop(listener);
        assert!(path.exists());
    }
}
