//! Protocol message types for daemon communication.
//!
//! One JSON object per line in each direction. Every client request gets
//! exactly one reply; subscribed clients additionally receive
//! [`DaemonMessage::Event`] lines interleaved with replies.

use crate::event::RegistryEvent;
use crate::form::{RawAccessEvent, RawEnrollForm};
use crate::version::ProtocolVersion;
use fpd_core::{
    AccessLogEntry, DashboardStats, Device, DeviceId, DeviceStatus, DomainError, Notification,
    RegistrySnapshot, User, UserId,
};
use serde::{Deserialize, Serialize};

/// Requests a client can send to the daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageType {
    /// Client handshake
    Connect {
        #[serde(skip_serializing_if = "Option::is_none")]
        client_id: Option<String>,
    },

    /// Everything the dashboard view needs in one consistent read
    GetSnapshot,

    ListUsers,
    ListDevices,
    ListAccessLog,
    ListNotifications,
    GetStats,

    /// Start enrollment from raw form fields
    EnrollUser { form: RawEnrollForm },

    /// Device reports that the fingerprint was captured
    ConfirmEnrollment { user_id: UserId },

    DeleteUser { user_id: UserId },

    ClearUsers,

    /// Access attempt reported by a device
    RecordAccess { event: RawAccessEvent },

    /// Status observation for one device
    RefreshDevice {
        device_id: DeviceId,
        status: DeviceStatus,
    },

    /// Generate one random access event
    SimulateAccess,

    /// Draw a fresh random status for every device
    RefreshDevices,

    /// Start receiving change events
    Subscribe,

    Unsubscribe,

    Ping { seq: u64 },

    /// Client disconnecting gracefully
    Disconnect,
}

/// Envelope for client requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientMessage {
    pub protocol_version: ProtocolVersion,

    #[serde(flatten)]
    pub message: MessageType,
}

impl ClientMessage {
    /// Wraps a request with the current protocol version.
    pub fn new(message: MessageType) -> Self {
        Self {
            protocol_version: ProtocolVersion::CURRENT,
            message,
        }
    }

    pub fn connect(client_id: Option<String>) -> Self {
        Self::new(MessageType::Connect { client_id })
    }

    pub fn get_snapshot() -> Self {
        Self::new(MessageType::GetSnapshot)
    }

    pub fn enroll(form: RawEnrollForm) -> Self {
        Self::new(MessageType::EnrollUser { form })
    }

    pub fn confirm(user_id: UserId) -> Self {
        Self::new(MessageType::ConfirmEnrollment { user_id })
    }

    pub fn delete_user(user_id: UserId) -> Self {
        Self::new(MessageType::DeleteUser { user_id })
    }

    pub fn clear_users() -> Self {
        Self::new(MessageType::ClearUsers)
    }

    pub fn record_access(event: RawAccessEvent) -> Self {
        Self::new(MessageType::RecordAccess { event })
    }

    pub fn simulate_access() -> Self {
        Self::new(MessageType::SimulateAccess)
    }

    pub fn refresh_devices() -> Self {
        Self::new(MessageType::RefreshDevices)
    }

    pub fn subscribe() -> Self {
        Self::new(MessageType::Subscribe)
    }

    pub fn ping(seq: u64) -> Self {
        Self::new(MessageType::Ping { seq })
    }

    pub fn disconnect() -> Self {
        Self::new(MessageType::Disconnect)
    }
}

/// Messages sent from daemon to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DaemonMessage {
    Connected {
        protocol_version: ProtocolVersion,
        client_id: String,
    },

    /// Handshake refused; the client should upgrade to `protocol_version`
    Rejected {
        reason: String,
        protocol_version: ProtocolVersion,
    },

    Snapshot { snapshot: Box<RegistrySnapshot> },

    UserList { users: Vec<User> },

    DeviceList { devices: Vec<Device> },

    /// Newest first
    AccessLog { entries: Vec<AccessLogEntry> },

    /// Newest first
    NotificationList { notifications: Vec<Notification> },

    Stats { stats: DashboardStats },

    Enrolled { user: User },

    /// `changed` is false when the user was already enrolled
    Confirmed { user_id: UserId, changed: bool },

    Deleted { user: User },

    Cleared { count: usize },

    AccessRecorded { entry: AccessLogEntry },

    DeviceRefreshed { device: Device },

    DevicesRefreshed { devices: Vec<Device> },

    /// Pushed to subscribers after each committed change
    Event { event: RegistryEvent },

    Subscribed,

    Unsubscribed,

    Pong { seq: u64 },

    Error {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        code: Option<String>,
    },
}

impl DaemonMessage {
    pub fn connected(client_id: String) -> Self {
        Self::Connected {
            protocol_version: ProtocolVersion::CURRENT,
            client_id,
        }
    }

    pub fn rejected(reason: &str) -> Self {
        Self::Rejected {
            reason: reason.to_string(),
            protocol_version: ProtocolVersion::CURRENT,
        }
    }

    pub fn snapshot(snapshot: RegistrySnapshot) -> Self {
        Self::Snapshot {
            snapshot: Box::new(snapshot),
        }
    }

    pub fn event(event: RegistryEvent) -> Self {
        Self::Event { event }
    }

    pub fn pong(seq: u64) -> Self {
        Self::Pong { seq }
    }

    /// Creates an error response without a code.
    pub fn error(message: &str) -> Self {
        Self::Error {
            message: message.to_string(),
            code: None,
        }
    }

    pub fn error_with_code(message: &str, code: &str) -> Self {
        Self::Error {
            message: message.to_string(),
            code: Some(code.to_string()),
        }
    }

    /// Maps a rejected registry operation onto an error reply.
    pub fn domain_error(err: &DomainError) -> Self {
        Self::error_with_code(&err.to_string(), err.code())
    }
}
