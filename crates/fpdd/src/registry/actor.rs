//! Registry actor - owns the registry and processes commands.
//!
//! The RegistryActor is the single writer of access-control state. It
//! receives commands via an mpsc channel, applies them to its
//! [`Registry`], and publishes a [`RegistryEvent`] for every committed
//! change, followed by one event per notification the change produced.

use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use fpd_core::{
    AccessLogEntry, Device, DeviceId, DeviceStatus, NotificationId, NotificationKind, Registry,
    RegistrySnapshot, User, UserId,
};
use fpd_protocol::{RawAccessEvent, RawEnrollForm, RegistryEvent};

use super::commands::{RegistryCommand, RegistryError};

/// The registry actor.
///
/// Runs in a single task and handles commands sequentially, so every read
/// observes either none or all of a mutation.
pub struct RegistryActor {
    receiver: mpsc::Receiver<RegistryCommand>,

    registry: Registry,

    /// Newest notification already published to subscribers
    last_published: Option<NotificationId>,

    event_publisher: broadcast::Sender<RegistryEvent>,
}

impl RegistryActor {
    /// Creates an actor around an existing registry.
    ///
    /// Notifications already present in `registry` are treated as published.
    pub fn new(
        receiver: mpsc::Receiver<RegistryCommand>,
        event_publisher: broadcast::Sender<RegistryEvent>,
        registry: Registry,
    ) -> Self {
        let last_published = registry.notifications().first().map(|n| n.id);
        Self {
            receiver,
            registry,
            last_published,
            event_publisher,
        }
    }

    /// Runs the actor event loop until every sender is dropped.
    pub async fn run(mut self) {
        info!("Registry actor starting");

        while let Some(cmd) = self.receiver.recv().await {
            self.handle_command(cmd);
        }

        info!(
            users = self.registry.users().len(),
            access_entries = self.registry.access_log().len(),
            "Registry actor stopped"
        );
    }

    /// Dispatches a command. Reply send errors are ignored; the caller may
    /// have given up waiting.
    fn handle_command(&mut self, cmd: RegistryCommand) {
        match cmd {
            RegistryCommand::Restore {
                snapshot,
                respond_to,
            } => {
                let _ = respond_to.send(self.handle_restore(*snapshot));
            }
            RegistryCommand::Enroll { form, respond_to } => {
                let _ = respond_to.send(self.handle_enroll(form));
            }
            RegistryCommand::ConfirmEnrollment {
                user_id,
                respond_to,
            } => {
                let _ = respond_to.send(self.handle_confirm(user_id));
            }
            RegistryCommand::DeleteUser {
                user_id,
                respond_to,
            } => {
                let _ = respond_to.send(self.handle_delete(user_id));
            }
            RegistryCommand::ClearUsers { respond_to } => {
                let _ = respond_to.send(self.handle_clear());
            }
            RegistryCommand::RecordAccess { event, respond_to } => {
                let _ = respond_to.send(self.handle_record_access(event));
            }
            RegistryCommand::RefreshDevice {
                device_id,
                status,
                respond_to,
            } => {
                let _ = respond_to.send(self.handle_refresh_device(&device_id, status));
            }
            RegistryCommand::GetSnapshot { respond_to } => {
                let _ = respond_to.send(self.registry.snapshot());
            }
            RegistryCommand::ListUsers { respond_to } => {
                let _ = respond_to.send(self.registry.users().to_vec());
            }
            RegistryCommand::ListDevices { respond_to } => {
                let _ = respond_to.send(self.registry.devices().to_vec());
            }
            RegistryCommand::ListAccessLog { respond_to } => {
                let _ = respond_to.send(self.registry.access_log());
            }
            RegistryCommand::ListNotifications { respond_to } => {
                let _ = respond_to.send(self.registry.notifications());
            }
            RegistryCommand::GetStats { respond_to } => {
                let _ = respond_to.send(self.registry.stats());
            }
        }

        self.publish_notifications();
    }

    // ========================================================================
    // Command Handlers
    // ========================================================================

    fn handle_restore(&mut self, snapshot: RegistrySnapshot) -> Result<(), RegistryError> {
        let registry = Registry::restore(snapshot)?;
        self.last_published = registry.notifications().first().map(|n| n.id);
        self.registry = registry;

        info!(
            devices = self.registry.devices().len(),
            users = self.registry.users().len(),
            access_entries = self.registry.access_log().len(),
            "Registry state restored"
        );
        Ok(())
    }

    fn handle_enroll(&mut self, form: RawEnrollForm) -> Result<User, RegistryError> {
        let request = match form.to_request() {
            Ok(request) => request,
            Err(err) => {
                debug!(error = %err, "Rejected enrollment form");
                self.registry.notify(NotificationKind::Error, err.to_string());
                return Err(err.into());
            }
        };

        let user = self.registry.enroll_user(request)?;
        info!(
            user_id = %user.id,
            name = %user.name,
            card_id = %user.card_id,
            "Enrollment started"
        );

        self.publish(RegistryEvent::UserEnrolled { user: user.clone() });
        Ok(user)
    }

    fn handle_confirm(&mut self, user_id: UserId) -> Result<bool, RegistryError> {
        let changed = self.registry.confirm_enrollment(user_id)?;

        if changed {
            if let Some(user) = self.registry.user(user_id).cloned() {
                info!(user_id = %user.id, "Enrollment confirmed");
                self.publish(RegistryEvent::UserConfirmed { user });
            }
        } else {
            debug!(user_id = %user_id, "Enrollment already confirmed");
        }

        Ok(changed)
    }

    fn handle_delete(&mut self, user_id: UserId) -> Result<User, RegistryError> {
        let user = self.registry.delete_user(user_id)?;
        info!(user_id = %user.id, name = %user.name, "User deleted");

        self.publish(RegistryEvent::UserDeleted { user_id });
        Ok(user)
    }

    fn handle_clear(&mut self) -> usize {
        let count = self.registry.clear_all_users();
        warn!(count, "All users cleared");

        self.publish(RegistryEvent::UsersCleared { count });
        count
    }

    fn handle_record_access(&mut self, event: RawAccessEvent) -> AccessLogEntry {
        let entry =
            self.registry
                .record_access_event(event.user_name(), event.card_id(), event.granted);

        if entry.granted {
            debug!(seq = %entry.id, user = %entry.user_name, "Access granted");
        } else {
            info!(
                seq = %entry.id,
                user = %entry.user_name,
                card_id = %entry.card_id,
                "Access denied"
            );
        }

        self.publish(RegistryEvent::AccessRecorded {
            entry: entry.clone(),
        });
        entry
    }

    fn handle_refresh_device(
        &mut self,
        device_id: &DeviceId,
        status: DeviceStatus,
    ) -> Result<Device, RegistryError> {
        let device = self.registry.refresh_device_status(device_id, status)?;
        debug!(device_id = %device.id(), status = %device.status(), "Device status refreshed");

        self.publish(RegistryEvent::DeviceUpdated {
            device: device.clone(),
        });
        Ok(device)
    }

    // ========================================================================
    // Event Publishing
    // ========================================================================

    fn publish(&self, event: RegistryEvent) {
        let name = event.name();
        if self.event_publisher.send(event).is_err() {
            // No subscribers right now
            debug!(event = name, "Event dropped, no subscribers");
        }
    }

    /// Publishes notifications pushed since the last call, oldest first.
    fn publish_notifications(&mut self) {
        let last = self.last_published;
        let fresh: Vec<_> = self
            .registry
            .notifications()
            .into_iter()
            .take_while(|n| last.map_or(true, |last| n.id > last))
            .collect();

        if let Some(newest) = fresh.first() {
            self.last_published = Some(newest.id);
        }

        for notification in fresh.into_iter().rev() {
            self.publish(RegistryEvent::NotificationPushed { notification });
        }
    }

    /// Read access for tests.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use fpd_core::DomainError;
    use tokio::sync::oneshot;

    fn create_actor() -> (RegistryActor, broadcast::Receiver<RegistryEvent>) {
        let (_cmd_tx, cmd_rx) = mpsc::channel(16);
        let (event_tx, event_rx) = broadcast::channel(64);
        let mut registry = Registry::new();
        registry
            .add_device(Device::new(
                DeviceId::new("8C128B2B1838"),
                "Main Entrance",
                DeviceStatus::Online,
                Utc::now(),
                5,
            ))
            .unwrap();
        (RegistryActor::new(cmd_rx, event_tx, registry), event_rx)
    }

    fn form(id: &str, name: &str, card: &str) -> RawEnrollForm {
        RawEnrollForm {
            user_id: id.to_string(),
            name: name.to_string(),
            phone: "+1".to_string(),
            card_id: card.to_string(),
        }
    }

    fn enroll(actor: &mut RegistryActor, id: &str, name: &str, card: &str) -> Result<User, RegistryError> {
        let (tx, mut rx) = oneshot::channel();
        actor.handle_command(RegistryCommand::Enroll {
            form: form(id, name, card),
            respond_to: tx,
        });
        rx.try_recv().unwrap()
    }

    fn drain(rx: &mut broadcast::Receiver<RegistryEvent>) -> Vec<RegistryEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_enroll_publishes_user_then_notification() {
        let (mut actor, mut event_rx) = create_actor();

        let user = enroll(&mut actor, "1", "Ann", "C1").unwrap();
        assert!(!user.enrolled);

        let events = drain(&mut event_rx);
        assert_eq!(events.len(), 2);
        assert!(matches!(events.first(), Some(RegistryEvent::UserEnrolled { .. })));
        match events.get(1) {
            Some(RegistryEvent::NotificationPushed { notification }) => {
                assert_eq!(notification.kind, NotificationKind::Info);
            }
            other => panic!("Expected NotificationPushed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_enroll_duplicate_card_only_notifies() {
        let (mut actor, mut event_rx) = create_actor();
        enroll(&mut actor, "1", "Ann", "C1").unwrap();
        drain(&mut event_rx);

        let err = enroll(&mut actor, "2", "Bob", "C1").unwrap_err();
        assert_eq!(
            err,
            RegistryError::Domain(DomainError::DuplicateCard("C1".into()))
        );
        assert_eq!(actor.registry().users().len(), 1);

        let events = drain(&mut event_rx);
        assert_eq!(events.len(), 1);
        match events.first() {
            Some(RegistryEvent::NotificationPushed { notification }) => {
                assert_eq!(notification.kind, NotificationKind::Error);
            }
            other => panic!("Expected NotificationPushed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_invalid_form_leaves_error_trail() {
        let (mut actor, _event_rx) = create_actor();

        let err = enroll(&mut actor, "25", "Ann", "C1").unwrap_err();
        assert_eq!(err.code(), "validation");
        assert!(actor.registry().users().is_empty());

        let latest = actor.registry().notifications();
        let latest = latest.first().unwrap();
        assert_eq!(latest.kind, NotificationKind::Error);
        assert!(latest.message.contains("between 1 and 20"));
    }

    #[tokio::test]
    async fn test_confirm_publishes_once() {
        let (mut actor, mut event_rx) = create_actor();
        enroll(&mut actor, "3", "Bob", "C3").unwrap();
        drain(&mut event_rx);

        for expected in [true, false] {
            let (tx, mut rx) = oneshot::channel();
            actor.handle_command(RegistryCommand::ConfirmEnrollment {
                user_id: UserId::new(3),
                respond_to: tx,
            });
            assert_eq!(rx.try_recv().unwrap(), Ok(expected));
        }

        let events = drain(&mut event_rx);
        let confirmed = events
            .iter()
            .filter(|e| matches!(e, RegistryEvent::UserConfirmed { .. }))
            .count();
        assert_eq!(confirmed, 1);
    }

    #[tokio::test]
    async fn test_delete_missing_user() {
        let (mut actor, _event_rx) = create_actor();
        enroll(&mut actor, "1", "Ann", "C1").unwrap();

        let (tx, mut rx) = oneshot::channel();
        actor.handle_command(RegistryCommand::DeleteUser {
            user_id: UserId::new(9),
            respond_to: tx,
        });

        let err = rx.try_recv().unwrap().unwrap_err();
        assert_eq!(err.code(), "not_found");
        assert_eq!(actor.registry().users().len(), 1);
    }

    #[tokio::test]
    async fn test_clear_users() {
        let (mut actor, mut event_rx) = create_actor();
        enroll(&mut actor, "1", "Ann", "C1").unwrap();
        enroll(&mut actor, "2", "Bob", "C2").unwrap();
        drain(&mut event_rx);

        let (tx, mut rx) = oneshot::channel();
        actor.handle_command(RegistryCommand::ClearUsers { respond_to: tx });
        assert_eq!(rx.try_recv().unwrap(), 2);

        let events = drain(&mut event_rx);
        assert_eq!(events.first(), Some(&RegistryEvent::UsersCleared { count: 2 }));
    }

    #[tokio::test]
    async fn test_record_access_and_stats() {
        let (mut actor, _event_rx) = create_actor();

        for (name, card, granted) in [("Ann", "C1", true), ("X", "N/A", false)] {
            let (tx, _rx) = oneshot::channel();
            actor.handle_command(RegistryCommand::RecordAccess {
                event: RawAccessEvent {
                    user_name: Some(name.to_string()),
                    card_id: Some(card.to_string()),
                    granted,
                },
                respond_to: tx,
            });
        }

        let (tx, mut rx) = oneshot::channel();
        actor.handle_command(RegistryCommand::GetStats { respond_to: tx });
        let stats = rx.try_recv().unwrap();
        assert_eq!(stats.failed_attempts, 1);
        assert_eq!(stats.today_access, 2);
        assert_eq!(stats.active_devices, 1);
    }

    #[tokio::test]
    async fn test_refresh_device() {
        let (mut actor, mut event_rx) = create_actor();

        let (tx, mut rx) = oneshot::channel();
        actor.handle_command(RegistryCommand::RefreshDevice {
            device_id: DeviceId::new("8C128B2B1838"),
            status: DeviceStatus::Offline,
            respond_to: tx,
        });
        let device = rx.try_recv().unwrap().unwrap();
        assert_eq!(device.status(), DeviceStatus::Offline);

        let events = drain(&mut event_rx);
        assert!(matches!(events.first(), Some(RegistryEvent::DeviceUpdated { .. })));
    }

    #[tokio::test]
    async fn test_restore_does_not_republish_seed_notifications() {
        let (mut actor, mut event_rx) = create_actor();

        let mut seeded = Registry::new();
        seeded.notify(NotificationKind::Success, "seeded");
        let (tx, mut rx) = oneshot::channel();
        actor.handle_command(RegistryCommand::Restore {
            snapshot: Box::new(seeded.snapshot()),
            respond_to: tx,
        });
        assert!(rx.try_recv().unwrap().is_ok());
        assert!(drain(&mut event_rx).is_empty());
        assert_eq!(actor.registry().notifications().len(), 1);
    }
}
