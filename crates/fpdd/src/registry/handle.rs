//! Client interface for interacting with the RegistryActor.
//!
//! Every request returns `Result<_, RegistryError>` and maps a dead actor to
//! `RegistryError::ChannelClosed`, reads included.

use tokio::sync::{broadcast, mpsc, oneshot};

use fpd_core::{
    AccessLogEntry, DashboardStats, Device, DeviceId, DeviceStatus, Notification,
    RegistrySnapshot, User, UserId,
};
use fpd_protocol::{RawAccessEvent, RawEnrollForm, RegistryEvent};

use super::commands::{RegistryCommand, RegistryError};

/// Cheap-to-clone handle to the registry actor.
///
/// ```ignore
/// let user = handle.enroll(form).await?;
/// let mut events = handle.subscribe();
/// while let Ok(event) = events.recv().await {
///     // ...
/// }
/// ```
#[derive(Clone)]
pub struct RegistryHandle {
    sender: mpsc::Sender<RegistryCommand>,
    event_sender: broadcast::Sender<RegistryEvent>,
}

impl RegistryHandle {
    pub fn new(
        sender: mpsc::Sender<RegistryCommand>,
        event_sender: broadcast::Sender<RegistryEvent>,
    ) -> Self {
        Self {
            sender,
            event_sender,
        }
    }

    /// Sends a command and waits for its reply.
    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> RegistryCommand,
    ) -> Result<T, RegistryError> {
        let (tx, rx) = oneshot::channel();

        self.sender
            .send(build(tx))
            .await
            .map_err(|_| RegistryError::ChannelClosed)?;

        rx.await.map_err(|_| RegistryError::ChannelClosed)
    }

    /// Replaces the whole registry state.
    pub async fn restore(&self, snapshot: RegistrySnapshot) -> Result<(), RegistryError> {
        self.request(|respond_to| RegistryCommand::Restore {
            snapshot: Box::new(snapshot),
            respond_to,
        })
        .await?
    }

    /// Starts enrollment from raw form fields.
    ///
    /// # Errors
    ///
    /// - `RegistryError::Domain` with the validation or uniqueness failure
    /// - `RegistryError::ChannelClosed` if the actor has shut down
    pub async fn enroll(&self, form: RawEnrollForm) -> Result<User, RegistryError> {
        self.request(|respond_to| RegistryCommand::Enroll { form, respond_to })
            .await?
    }

    /// Confirms an enrollment. Returns whether the flag changed.
    pub async fn confirm_enrollment(&self, user_id: UserId) -> Result<bool, RegistryError> {
        self.request(|respond_to| RegistryCommand::ConfirmEnrollment {
            user_id,
            respond_to,
        })
        .await?
    }

    pub async fn delete_user(&self, user_id: UserId) -> Result<User, RegistryError> {
        self.request(|respond_to| RegistryCommand::DeleteUser {
            user_id,
            respond_to,
        })
        .await?
    }

    /// Removes every user and returns how many were removed.
    pub async fn clear_users(&self) -> Result<usize, RegistryError> {
        self.request(|respond_to| RegistryCommand::ClearUsers { respond_to })
            .await
    }

    pub async fn record_access(
        &self,
        event: RawAccessEvent,
    ) -> Result<AccessLogEntry, RegistryError> {
        self.request(|respond_to| RegistryCommand::RecordAccess { event, respond_to })
            .await
    }

    pub async fn refresh_device(
        &self,
        device_id: DeviceId,
        status: DeviceStatus,
    ) -> Result<Device, RegistryError> {
        self.request(|respond_to| RegistryCommand::RefreshDevice {
            device_id,
            status,
            respond_to,
        })
        .await?
    }

    pub async fn snapshot(&self) -> Result<RegistrySnapshot, RegistryError> {
        self.request(|respond_to| RegistryCommand::GetSnapshot { respond_to })
            .await
    }

    pub async fn list_users(&self) -> Result<Vec<User>, RegistryError> {
        self.request(|respond_to| RegistryCommand::ListUsers { respond_to })
            .await
    }

    pub async fn list_devices(&self) -> Result<Vec<Device>, RegistryError> {
        self.request(|respond_to| RegistryCommand::ListDevices { respond_to })
            .await
    }

    /// Returns the access log newest first.
    pub async fn list_access_log(&self) -> Result<Vec<AccessLogEntry>, RegistryError> {
        self.request(|respond_to| RegistryCommand::ListAccessLog { respond_to })
            .await
    }

    /// Returns notifications newest first.
    pub async fn list_notifications(&self) -> Result<Vec<Notification>, RegistryError> {
        self.request(|respond_to| RegistryCommand::ListNotifications { respond_to })
            .await
    }

    pub async fn stats(&self) -> Result<DashboardStats, RegistryError> {
        self.request(|respond_to| RegistryCommand::GetStats { respond_to })
            .await
    }

    /// Subscribes to committed changes.
    ///
    /// Synchronous; does not go through the actor.
    pub fn subscribe(&self) -> broadcast::Receiver<RegistryEvent> {
        self.event_sender.subscribe()
    }

    /// Returns `true` while the actor's command channel is open.
    pub fn is_connected(&self) -> bool {
        !self.sender.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_handle() -> (RegistryHandle, mpsc::Receiver<RegistryCommand>) {
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let (event_tx, _event_rx) = broadcast::channel(16);
        (RegistryHandle::new(cmd_tx, event_tx), cmd_rx)
    }

    #[tokio::test]
    async fn test_handle_is_clone() {
        let (handle, _rx) = create_test_handle();
        let cloned = handle.clone();
        assert!(cloned.is_connected());
    }

    #[tokio::test]
    async fn test_enroll_sends_command() {
        let (handle, mut cmd_rx) = create_test_handle();

        let task = tokio::spawn(async move {
            handle
                .enroll(RawEnrollForm {
                    user_id: "1".to_string(),
                    name: "Ann".to_string(),
                    phone: "+1".to_string(),
                    card_id: "C1".to_string(),
                })
                .await
        });

        match cmd_rx.recv().await {
            Some(RegistryCommand::Enroll { form, respond_to }) => {
                assert_eq!(form.name, "Ann");
                drop(respond_to);
            }
            other => panic!("Expected Enroll command, got {other:?}"),
        }

        let result = task.await.unwrap();
        assert_eq!(result, Err(RegistryError::ChannelClosed));
    }

    #[tokio::test]
    async fn test_mutation_channel_closed_error() {
        let (handle, cmd_rx) = create_test_handle();
        drop(cmd_rx);

        let result = handle.delete_user(UserId::new(1)).await;
        assert_eq!(result, Err(RegistryError::ChannelClosed));
        assert!(!handle.is_connected());
    }

    #[tokio::test]
    async fn test_reads_report_channel_closed() {
        let (handle, cmd_rx) = create_test_handle();
        drop(cmd_rx);

        assert_eq!(handle.list_users().await, Err(RegistryError::ChannelClosed));
        assert_eq!(handle.list_devices().await, Err(RegistryError::ChannelClosed));
        assert_eq!(
            handle.list_access_log().await,
            Err(RegistryError::ChannelClosed)
        );
        assert_eq!(
            handle.list_notifications().await,
            Err(RegistryError::ChannelClosed)
        );
        assert_eq!(handle.stats().await, Err(RegistryError::ChannelClosed));
    }

    #[tokio::test]
    async fn test_subscribe_returns_receiver() {
        let (handle, _cmd_rx) = create_test_handle();
        let rx = handle.subscribe();
        assert_eq!(rx.len(), 0);
    }
}
