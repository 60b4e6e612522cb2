//! Connection handler for individual client connections.
//!
//! Each client connection gets its own `ConnectionHandler` that:
//! - Performs protocol version negotiation
//! - Parses incoming requests and routes them to the registry
//! - Registers the client for change events on `Subscribe`

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{Mutex, RwLock};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use fpd_protocol::{ClientMessage, DaemonMessage, MessageType, ProtocolVersion};

use crate::registry::{RegistryError, RegistryHandle};
use crate::simulator::Simulator;

/// Shared writer half, also used by the event broadcaster
pub type SubscriberWriter = Arc<Mutex<BufWriter<OwnedWriteHalf>>>;

/// A client receiving change events
pub struct Subscriber {
    pub writer: SubscriberWriter,
}

/// Subscribers keyed by client id
pub type SubscribersMap = Arc<RwLock<HashMap<String, Subscriber>>>;

/// Maximum number of concurrent subscribers
pub(crate) const MAX_SUBSCRIBERS: usize = 10;

/// Maximum message size (1 MB)
const MAX_MESSAGE_SIZE: usize = 1_048_576;

/// Idle connections are dropped after 5 minutes
const READ_TIMEOUT: Duration = Duration::from_secs(300);

const WRITE_TIMEOUT: Duration = Duration::from_secs(10);

type ClientId = String;

pub struct ConnectionHandler {
    reader: BufReader<OwnedReadHalf>,

    writer: SubscriberWriter,

    registry: RegistryHandle,

    simulator: Simulator,

    subscribers: SubscribersMap,

    /// Assigned after handshake
    client_id: Option<ClientId>,

    connection_number: u64,
}

impl ConnectionHandler {
    pub fn new(
        reader: OwnedReadHalf,
        writer: OwnedWriteHalf,
        registry: RegistryHandle,
        simulator: Simulator,
        subscribers: SubscribersMap,
        connection_number: u64,
    ) -> Self {
        Self {
            reader: BufReader::new(reader),
            writer: Arc::new(Mutex::new(BufWriter::new(writer))),
            registry,
            simulator,
            subscribers,
            client_id: None,
            connection_number,
        }
    }

    /// Runs handshake and the request loop until the client goes away.
    ///
    /// Returns the client id so the server can drop its subscription.
    pub async fn run(mut self) -> Option<ClientId> {
        debug!(connection = self.connection_number, "New client connected");

        if let Err(e) = self.handle_handshake().await {
            warn!(
                connection = self.connection_number,
                error = %e,
                "Handshake failed"
            );
            return None;
        }
        info!(client_id = ?self.client_id, "Client handshake completed");

        let client_id = self.client_id.clone();

        if let Err(e) = self.process_messages().await {
            debug!(client_id = ?self.client_id, error = %e, "Connection closed");
        }

        info!(client_id = ?self.client_id, "Client disconnected");
        client_id
    }

    /// Expects `Connect` with a compatible protocol version.
    async fn handle_handshake(&mut self) -> Result<(), ConnectionError> {
        let msg = self.read_message().await?;

        let client_version = msg.protocol_version;
        if let Err(e) = ProtocolVersion::CURRENT.negotiate(&client_version) {
            warn!(
                client_version = %client_version,
                server_version = %ProtocolVersion::CURRENT,
                "Protocol version mismatch"
            );
            self.send_message(DaemonMessage::rejected(&e.to_string()))
                .await?;

            return Err(ConnectionError::VersionMismatch {
                client: client_version,
                server: ProtocolVersion::CURRENT,
            });
        }

        match msg.message {
            MessageType::Connect { client_id } => {
                let assigned_id =
                    client_id.unwrap_or_else(|| format!("client-{}", self.connection_number));
                self.client_id = Some(assigned_id.clone());
                self.send_message(DaemonMessage::connected(assigned_id))
                    .await
            }
            other => {
                self.send_message(DaemonMessage::error(
                    "Expected Connect message for handshake",
                ))
                .await?;
                Err(ConnectionError::UnexpectedMessage(format!("{other:?}")))
            }
        }
    }

    async fn process_messages(&mut self) -> Result<(), ConnectionError> {
        loop {
            let msg = match timeout(READ_TIMEOUT, self.read_message()).await {
                Ok(Ok(msg)) => msg,
                Ok(Err(ConnectionError::Eof)) => {
                    debug!(client_id = ?self.client_id, "Client sent EOF");
                    return Ok(());
                }
                Ok(Err(ConnectionError::ParseError(e))) => {
                    // Malformed line: report and keep the connection
                    self.send_message(DaemonMessage::error_with_code(&e, "parse"))
                        .await?;
                    continue;
                }
                Ok(Err(e)) => return Err(e),
                Err(_) => {
                    debug!(client_id = ?self.client_id, "Connection timed out");
                    return Err(ConnectionError::Timeout);
                }
            };

            self.handle_message(msg).await?;
        }
    }

    async fn handle_message(&mut self, msg: ClientMessage) -> Result<(), ConnectionError> {
        match msg.message {
            MessageType::Connect { .. } => {
                self.send_message(DaemonMessage::error("Already connected"))
                    .await?;
            }

            MessageType::GetSnapshot => {
                let result = self.registry.snapshot().await;
                self.reply(result.map(DaemonMessage::snapshot)).await?;
            }

            MessageType::ListUsers => {
                let result = self.registry.list_users().await;
                self.reply(result.map(|users| DaemonMessage::UserList { users }))
                    .await?;
            }

            MessageType::ListDevices => {
                let result = self.registry.list_devices().await;
                self.reply(result.map(|devices| DaemonMessage::DeviceList { devices }))
                    .await?;
            }

            MessageType::ListAccessLog => {
                let result = self.registry.list_access_log().await;
                self.reply(result.map(|entries| DaemonMessage::AccessLog { entries }))
                    .await?;
            }

            MessageType::ListNotifications => {
                let result = self.registry.list_notifications().await;
                self.reply(result.map(|notifications| DaemonMessage::NotificationList {
                    notifications,
                }))
                .await?;
            }

            MessageType::GetStats => {
                let result = self.registry.stats().await;
                self.reply(result.map(|stats| DaemonMessage::Stats { stats }))
                    .await?;
            }

            MessageType::EnrollUser { form } => {
                let result = self.registry.enroll(form).await;
                self.reply(result.map(|user| DaemonMessage::Enrolled { user }))
                    .await?;
            }

            MessageType::ConfirmEnrollment { user_id } => {
                let result = self.registry.confirm_enrollment(user_id).await;
                self.reply(result.map(|changed| DaemonMessage::Confirmed { user_id, changed }))
                    .await?;
            }

            MessageType::DeleteUser { user_id } => {
                let result = self.registry.delete_user(user_id).await;
                self.reply(result.map(|user| DaemonMessage::Deleted { user }))
                    .await?;
            }

            MessageType::ClearUsers => {
                let result = self.registry.clear_users().await;
                self.reply(result.map(|count| DaemonMessage::Cleared { count }))
                    .await?;
            }

            MessageType::RecordAccess { event } => {
                let result = self.registry.record_access(event).await;
                self.reply(result.map(|entry| DaemonMessage::AccessRecorded { entry }))
                    .await?;
            }

            MessageType::RefreshDevice { device_id, status } => {
                let result = self.registry.refresh_device(device_id, status).await;
                self.reply(result.map(|device| DaemonMessage::DeviceRefreshed { device }))
                    .await?;
            }

            MessageType::SimulateAccess => {
                let result = self.simulator.simulate_access(&self.registry).await;
                self.reply(result.map(|entry| DaemonMessage::AccessRecorded { entry }))
                    .await?;
            }

            MessageType::RefreshDevices => {
                let result = self.simulator.refresh_devices(&self.registry).await;
                self.reply(result.map(|devices| DaemonMessage::DevicesRefreshed { devices }))
                    .await?;
            }

            MessageType::Subscribe => {
                self.handle_subscribe().await?;
            }

            MessageType::Unsubscribe => {
                if let Some(ref client_id) = self.client_id {
                    self.subscribers.write().await.remove(client_id);
                }
                debug!(client_id = ?self.client_id, "Client unsubscribed from updates");

                self.send_message(DaemonMessage::Unsubscribed).await?;
            }

            MessageType::Ping { seq } => {
                self.send_message(DaemonMessage::pong(seq)).await?;
            }

            MessageType::Disconnect => {
                debug!(client_id = ?self.client_id, "Client requested disconnect");
                return Err(ConnectionError::Eof);
            }
        }

        Ok(())
    }

    /// Registers for events and replies with a snapshot.
    ///
    /// The writer stays locked between reading the snapshot and writing it,
    /// so events committed after the snapshot are always delivered after it.
    async fn handle_subscribe(&mut self) -> Result<(), ConnectionError> {
        let Some(client_id) = self.client_id.clone() else {
            return self
                .send_message(DaemonMessage::error("Must connect before subscribing"))
                .await;
        };

        {
            let mut subs = self.subscribers.write().await;
            if subs.len() >= MAX_SUBSCRIBERS && !subs.contains_key(&client_id) {
                drop(subs);
                return self
                    .send_message(DaemonMessage::error(&format!(
                        "Too many subscribers (max: {MAX_SUBSCRIBERS})"
                    )))
                    .await;
            }
            subs.insert(
                client_id.clone(),
                Subscriber {
                    writer: Arc::clone(&self.writer),
                },
            );
        }
        debug!(client_id = %client_id, "Client subscribed to updates");

        let mut writer = self.writer.lock().await;
        write_message(&mut writer, &DaemonMessage::Subscribed).await?;

        let msg = match self.registry.snapshot().await {
            Ok(snapshot) => DaemonMessage::snapshot(snapshot),
            Err(e) => registry_error_message(&e),
        };
        write_message(&mut writer, &msg).await
    }

    async fn reply(
        &self,
        result: Result<DaemonMessage, RegistryError>,
    ) -> Result<(), ConnectionError> {
        let msg = result.unwrap_or_else(|e| {
            debug!(client_id = ?self.client_id, code = e.code(), error = %e, "Request rejected");
            registry_error_message(&e)
        });
        self.send_message(msg).await
    }

    /// Reads one line, never buffering more than `MAX_MESSAGE_SIZE + 1` bytes.
    async fn read_message(&mut self) -> Result<ClientMessage, ConnectionError> {
        let mut line = Vec::new();

        let bytes_read = (&mut self.reader)
            .take(MAX_MESSAGE_SIZE as u64 + 1)
            .read_until(b'\n', &mut line)
            .await
            .map_err(|e| ConnectionError::Io(e.to_string()))?;

        if bytes_read == 0 {
            return Err(ConnectionError::Eof);
        }

        if line.len() > MAX_MESSAGE_SIZE {
            return Err(ConnectionError::MessageTooLarge {
                size: line.len(),
                max: MAX_MESSAGE_SIZE,
            });
        }

        let msg: ClientMessage = serde_json::from_slice(&line)
            .map_err(|e| ConnectionError::ParseError(e.to_string()))?;

        debug!(
            client_id = ?self.client_id,
            message_type = ?std::mem::discriminant(&msg.message),
            "Received message"
        );

        Ok(msg)
    }

    async fn send_message(&self, msg: DaemonMessage) -> Result<(), ConnectionError> {
        let mut writer = self.writer.lock().await;
        write_message(&mut writer, &msg).await
    }
}

fn registry_error_message(err: &RegistryError) -> DaemonMessage {
    DaemonMessage::error_with_code(&err.to_string(), err.code())
}

/// Writes one JSON line and flushes, bounded by the write timeout.
pub(crate) async fn write_message(
    writer: &mut BufWriter<OwnedWriteHalf>,
    msg: &DaemonMessage,
) -> Result<(), ConnectionError> {
    let json =
        serde_json::to_string(msg).map_err(|e| ConnectionError::ParseError(e.to_string()))?;

    let write = async {
        writer.write_all(json.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
        Ok::<(), std::io::Error>(())
    };

    match timeout(WRITE_TIMEOUT, write).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(ConnectionError::Io(e.to_string())),
        Err(_) => Err(ConnectionError::WriteTimeout),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("Protocol version mismatch: client {client}, server {server}")]
    VersionMismatch {
        client: ProtocolVersion,
        server: ProtocolVersion,
    },

    #[error("Unexpected message: {0}")]
    UnexpectedMessage(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Connection closed")]
    Eof,

    #[error("Read timeout")]
    Timeout,

    #[error("Write timeout")]
    WriteTimeout,

    #[error("Message too large: {size} bytes (max: {max})")]
    MessageTooLarge { size: usize, max: usize },
}

#[cfg(test)]
mod tests {
    use super::*;
    use fpd_core::{DomainError, UserId};
    use tokio::net::UnixStream;
    use tokio::sync::{broadcast, mpsc};

    /// Handler over one end of a socket pair, with a registry handle whose
    /// actor is already gone.
    fn handler_without_actor() -> (ConnectionHandler, UnixStream) {
        let (server, client) = UnixStream::pair().unwrap();
        let (reader, writer) = server.into_split();
        let (cmd_tx, cmd_rx) = mpsc::channel(1);
        drop(cmd_rx);
        let (event_tx, _) = broadcast::channel(1);

        let handler = ConnectionHandler::new(
            reader,
            writer,
            RegistryHandle::new(cmd_tx, event_tx),
            Simulator::default(),
            Arc::new(RwLock::new(HashMap::new())),
            0,
        );
        (handler, client)
    }

    async fn read_reply(client: &mut BufReader<UnixStream>) -> DaemonMessage {
        let mut line = String::new();
        client.read_line(&mut line).await.unwrap();
        serde_json::from_str(&line).unwrap()
    }

    #[test]
    fn test_connection_error_display() {
        let err = ConnectionError::VersionMismatch {
            client: ProtocolVersion::new(2, 0),
            server: ProtocolVersion::new(1, 0),
        };
        assert!(err.to_string().contains("2.0"));
        assert!(err.to_string().contains("1.0"));
    }

    #[test]
    fn test_registry_error_message_carries_code() {
        let err = RegistryError::Domain(DomainError::UserNotFound(UserId::new(4)));
        match registry_error_message(&err) {
            DaemonMessage::Error { message, code } => {
                assert_eq!(message, "User 4 not found");
                assert_eq!(code.as_deref(), Some("not_found"));
            }
            other => panic!("Expected Error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_reads_report_unavailable_registry() {
        let (mut handler, client) = handler_without_actor();
        let mut client = BufReader::new(client);

        for request in [
            MessageType::ListUsers,
            MessageType::ListDevices,
            MessageType::ListAccessLog,
            MessageType::ListNotifications,
            MessageType::GetStats,
            MessageType::RefreshDevices,
        ] {
            handler
                .handle_message(ClientMessage::new(request))
                .await
                .unwrap();

            match read_reply(&mut client).await {
                DaemonMessage::Error { code, .. } => {
                    assert_eq!(code.as_deref(), Some("unavailable"));
                }
                other => panic!("Expected unavailable error, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_oversized_line_is_rejected_at_limit() {
        let (mut handler, client) = handler_without_actor();
        let (_client_reader, mut client_writer) = client.into_split();

        let writer = tokio::spawn(async move {
            let payload = vec![b'a'; MAX_MESSAGE_SIZE + 64];
            let _ = client_writer.write_all(&payload).await;
            let _ = client_writer.write_all(b"\n").await;
        });

        match handler.read_message().await {
            Err(ConnectionError::MessageTooLarge { size, max }) => {
                assert_eq!(size, MAX_MESSAGE_SIZE + 1);
                assert_eq!(max, MAX_MESSAGE_SIZE);
            }
            other => panic!("Expected MessageTooLarge, got {other:?}"),
        }

        drop(handler);
        let _ = writer.await;
    }

    #[tokio::test]
    async fn test_read_message_parses_line() {
        let (mut handler, client) = handler_without_actor();
        let (_client_reader, mut client_writer) = client.into_split();

        let line = serde_json::to_string(&ClientMessage::clear_users()).unwrap();
        client_writer.write_all(line.as_bytes()).await.unwrap();
        client_writer.write_all(b"\n").await.unwrap();

        let msg = handler.read_message().await.unwrap();
        assert!(matches!(msg.message, MessageType::ClearUsers));
    }
}
