//! Registry actor commands and errors.
//!
//! - `RegistryCommand`: requests sent to the actor, each with a oneshot reply
//! - `RegistryError`: what a caller of the handle can get back
//!
//! Events published after committed changes are
//! [`fpd_protocol::RegistryEvent`], shared with the wire protocol.

use fpd_core::{
    AccessLogEntry, DashboardStats, Device, DeviceId, DeviceStatus, DomainError, Notification,
    RegistrySnapshot, User, UserId,
};
use fpd_protocol::{RawAccessEvent, RawEnrollForm};
use thiserror::Error;
use tokio::sync::oneshot;

// ============================================================================
// Registry Commands
// ============================================================================

/// Commands sent to the registry actor.
///
/// The actor handles them one at a time, so a command's uniqueness checks
/// and its write can never interleave with another command.
#[derive(Debug)]
pub enum RegistryCommand {
    /// Replace the whole state (startup seeding).
    Restore {
        snapshot: Box<RegistrySnapshot>,
        respond_to: oneshot::Sender<Result<(), RegistryError>>,
    },

    /// Start enrollment from raw form fields.
    ///
    /// # Errors
    /// - `DomainError::Validation` for blank or out-of-range fields
    /// - `DomainError::DuplicateId` / `DomainError::DuplicateCard`
    Enroll {
        form: RawEnrollForm,
        respond_to: oneshot::Sender<Result<User, RegistryError>>,
    },

    /// Mark a pending user as enrolled. Replies whether the flag changed.
    ConfirmEnrollment {
        user_id: UserId,
        respond_to: oneshot::Sender<Result<bool, RegistryError>>,
    },

    DeleteUser {
        user_id: UserId,
        respond_to: oneshot::Sender<Result<User, RegistryError>>,
    },

    /// Remove every user. Replies with the number removed.
    ClearUsers {
        respond_to: oneshot::Sender<usize>,
    },

    RecordAccess {
        event: RawAccessEvent,
        respond_to: oneshot::Sender<AccessLogEntry>,
    },

    RefreshDevice {
        device_id: DeviceId,
        status: DeviceStatus,
        respond_to: oneshot::Sender<Result<Device, RegistryError>>,
    },

    GetSnapshot {
        respond_to: oneshot::Sender<RegistrySnapshot>,
    },

    ListUsers {
        respond_to: oneshot::Sender<Vec<User>>,
    },

    ListDevices {
        respond_to: oneshot::Sender<Vec<Device>>,
    },

    /// Newest first.
    ListAccessLog {
        respond_to: oneshot::Sender<Vec<AccessLogEntry>>,
    },

    /// Newest first.
    ListNotifications {
        respond_to: oneshot::Sender<Vec<Notification>>,
    },

    GetStats {
        respond_to: oneshot::Sender<DashboardStats>,
    },
}

// ============================================================================
// Registry Errors
// ============================================================================

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// The registry rejected the operation; nothing changed.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The actor has shut down.
    #[error("registry channel closed")]
    ChannelClosed,
}

impl RegistryError {
    /// Stable wire code for error replies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Domain(err) => err.code(),
            Self::ChannelClosed => "unavailable",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_error_display() {
        let err = RegistryError::from(DomainError::UserNotFound(UserId::new(7)));
        assert_eq!(err.to_string(), "User 7 not found");
        assert_eq!(err.code(), "not_found");

        let err = RegistryError::ChannelClosed;
        assert_eq!(err.to_string(), "registry channel closed");
        assert_eq!(err.code(), "unavailable");
    }

    #[tokio::test]
    async fn test_command_channel_closed_error() {
        let (tx, rx) = oneshot::channel::<Result<User, RegistryError>>();
        drop(tx);
        assert!(rx.await.is_err());
    }
}
