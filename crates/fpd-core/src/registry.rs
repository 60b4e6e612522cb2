//! The registry: sole owner of devices, users, access log and notifications.
//!
//! Every mutation either succeeds completely or fails before any collection
//! is touched. Failed mutations still leave a trail in the notification sink
//! (`error` for bad input and duplicates, `warning` for missing targets).
//!
//! The registry itself is synchronous and single-owner. Serializing access
//! from concurrent callers is the job of whoever holds it (the daemon wraps
//! it in an actor).

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    AccessLogEntry, AccessSeq, CardId, DashboardStats, Device, DeviceId, DeviceStatus,
    DomainError, DomainResult, Notification, NotificationKind, NotificationSink, User, UserId,
};

// ============================================================================
// Requests and Snapshots
// ============================================================================

/// Fields of an enrollment request, already extracted from the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollUser {
    pub id: u32,
    pub name: String,
    pub phone: String,
    pub card_id: String,
}

/// A consistent copy of the whole registry at one point in time.
///
/// `access_log` and `notifications` are newest first.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    pub devices: Vec<Device>,
    pub users: Vec<User>,
    pub access_log: Vec<AccessLogEntry>,
    pub notifications: Vec<Notification>,
    pub stats: DashboardStats,
}

// ============================================================================
// Registry
// ============================================================================

#[derive(Debug, Clone)]
pub struct Registry {
    devices: Vec<Device>,
    /// Users in enrollment order.
    users: Vec<User>,
    /// Entries in append order (oldest first).
    access_log: Vec<AccessLogEntry>,
    notifications: NotificationSink,
    next_seq: AccessSeq,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            devices: Vec::new(),
            users: Vec::new(),
            access_log: Vec::new(),
            notifications: NotificationSink::new(),
            next_seq: AccessSeq::new(1),
        }
    }

    /// Rebuilds a registry from a snapshot, checking every invariant.
    ///
    /// Notifications are re-pushed oldest first so their ids stay
    /// increasing; the snapshot's stats are ignored and recomputed on demand.
    pub fn restore(snapshot: RegistrySnapshot) -> DomainResult<Self> {
        let mut registry = Self::new();

        for device in snapshot.devices {
            registry.add_device(device)?;
        }

        for user in snapshot.users {
            if [user.name.as_str(), user.phone.as_str(), user.card_id.as_str()]
                .iter()
                .any(|field| field.trim().is_empty())
            {
                return Err(DomainError::validation(format!(
                    "user {} has a blank name, phone or card",
                    user.id
                )));
            }
            registry.check_new_user(user.id, &user.card_id)?;
            registry.users.push(user);
        }

        let mut log = snapshot.access_log;
        log.sort_by_key(|entry| entry.id);
        for pair in log.windows(2) {
            if let [a, b] = pair {
                if a.id == b.id {
                    return Err(DomainError::validation(format!(
                        "duplicate access log sequence {}",
                        a.id
                    )));
                }
            }
        }
        if let Some(last) = log.last() {
            registry.next_seq = last.id.next();
        }
        registry.access_log = log;

        for notification in snapshot.notifications.into_iter().rev() {
            registry.notifications.push_at(
                notification.kind,
                notification.message,
                notification.timestamp,
            );
        }

        Ok(registry)
    }

    /// Registers a device. Used at startup; devices are never removed.
    pub fn add_device(&mut self, device: Device) -> DomainResult<()> {
        if self.device_index(device.id()).is_some() {
            return Err(DomainError::validation(format!(
                "device {} is already registered",
                device.id()
            )));
        }
        self.devices.push(device);
        Ok(())
    }

    // ========================================================================
    // User Operations
    // ========================================================================

    /// Starts enrollment of a new user.
    ///
    /// The user is stored with `enrolled = false` until
    /// [`Registry::confirm_enrollment`] is called.
    ///
    /// # Errors
    /// - `DomainError::Validation` if a field is blank or the id is outside 1..=20
    /// - `DomainError::DuplicateId` if the id is taken
    /// - `DomainError::DuplicateCard` if another user holds the card
    pub fn enroll_user(&mut self, request: EnrollUser) -> DomainResult<User> {
        let name = request.name.trim();
        let phone = request.phone.trim();
        let card = request.card_id.trim();

        if name.is_empty() || phone.is_empty() || card.is_empty() || request.id == 0 {
            return Err(self.reject(DomainError::validation("Please fill all fields")));
        }

        let id = UserId::new(request.id);
        if !id.is_valid_slot() {
            return Err(self.reject(DomainError::validation(format!(
                "User ID must be between {} and {}",
                UserId::MIN,
                UserId::MAX
            ))));
        }

        let card_id = CardId::new(card);
        if let Err(err) = self.check_new_user(id, &card_id) {
            return Err(self.reject(err));
        }

        let user = User::pending(id, name, phone, card_id);
        self.users.push(user.clone());
        self.notifications.push(
            NotificationKind::Info,
            format!("Enrollment started for {name}. Please scan fingerprint on device."),
        );

        Ok(user)
    }

    /// Marks a user's fingerprint as captured.
    ///
    /// Returns `true` if the flag changed. Confirming an already enrolled
    /// user is a no-op and emits nothing.
    pub fn confirm_enrollment(&mut self, id: UserId) -> DomainResult<bool> {
        let Some(user) = self.users.iter_mut().find(|u| u.id == id) else {
            return Err(self.reject(DomainError::UserNotFound(id)));
        };

        if user.enrolled {
            return Ok(false);
        }

        user.enrolled = true;
        let message = format!("Fingerprint enrolled for {}", user.name);
        self.notifications.push(NotificationKind::Success, message);
        Ok(true)
    }

    /// Removes a user, returning the removed record.
    pub fn delete_user(&mut self, id: UserId) -> DomainResult<User> {
        let Some(index) = self.users.iter().position(|u| u.id == id) else {
            return Err(self.reject(DomainError::UserNotFound(id)));
        };

        let user = self.users.remove(index);
        self.notifications.push(
            NotificationKind::Success,
            format!("User {} deleted successfully", user.name),
        );
        Ok(user)
    }

    /// Removes every user and returns how many were removed.
    ///
    /// Emits the warning even when the registry was already empty.
    pub fn clear_all_users(&mut self) -> usize {
        let count = self.users.len();
        self.users.clear();
        self.notifications.push(
            NotificationKind::Warning,
            format!("All {count} users cleared from system"),
        );
        count
    }

    // ========================================================================
    // Access Log
    // ========================================================================

    /// Appends an access attempt stamped with the current time.
    pub fn record_access_event(
        &mut self,
        user_name: &str,
        card_id: &str,
        granted: bool,
    ) -> AccessLogEntry {
        self.record_access_event_at(user_name, card_id, granted, Utc::now())
    }

    /// Appends an access attempt with an explicit timestamp.
    pub fn record_access_event_at(
        &mut self,
        user_name: &str,
        card_id: &str,
        granted: bool,
        timestamp: DateTime<Utc>,
    ) -> AccessLogEntry {
        let entry = AccessLogEntry::new(self.next_seq, user_name, card_id, granted, timestamp);
        self.next_seq = self.next_seq.next();
        self.access_log.push(entry.clone());

        if entry.granted {
            self.notifications.push(
                NotificationKind::Success,
                format!("Access granted to {}", entry.user_name),
            );
        } else {
            self.notifications.push(
                NotificationKind::Warning,
                format!("Failed access attempt by {}", entry.user_name),
            );
        }

        entry
    }

    // ========================================================================
    // Devices
    // ========================================================================

    /// Records a status observation for a device.
    pub fn refresh_device_status(
        &mut self,
        device_id: &DeviceId,
        status: DeviceStatus,
    ) -> DomainResult<Device> {
        let Some(device) = self.devices.iter_mut().find(|d| d.id() == device_id) else {
            return Err(self.reject(DomainError::DeviceNotFound(device_id.clone())));
        };

        device.refresh(status, Utc::now());
        let device = device.clone();

        self.notifications.push(
            NotificationKind::Info,
            format!("Device {} status updated: {}", device.name, device.status()),
        );
        Ok(device)
    }

    // ========================================================================
    // Notifications
    // ========================================================================

    /// Pushes operator feedback that does not stem from a registry mutation.
    pub fn notify(&mut self, kind: NotificationKind, message: impl Into<String>) -> Notification {
        self.notifications.push(kind, message)
    }

    // ========================================================================
    // Reads
    // ========================================================================

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn user(&self, id: UserId) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    pub fn device(&self, id: &DeviceId) -> Option<&Device> {
        self.devices.iter().find(|d| d.id() == id)
    }

    /// Returns the access log newest first.
    pub fn access_log(&self) -> Vec<AccessLogEntry> {
        self.access_log.iter().rev().cloned().collect()
    }

    /// Returns the notifications newest first.
    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.snapshot()
    }

    /// Computes the dashboard counters for the process's local day.
    pub fn stats(&self) -> DashboardStats {
        DashboardStats::project(&self.users, &self.devices, &self.access_log, &Local)
    }

    /// Returns a full consistent copy for the dashboard view.
    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            devices: self.devices.clone(),
            users: self.users.clone(),
            access_log: self.access_log(),
            notifications: self.notifications(),
            stats: self.stats(),
        }
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn device_index(&self, id: &DeviceId) -> Option<usize> {
        self.devices.iter().position(|d| d.id() == id)
    }

    fn check_new_user(&self, id: UserId, card_id: &CardId) -> DomainResult<()> {
        if !id.is_valid_slot() {
            return Err(DomainError::validation(format!(
                "User ID must be between {} and {}",
                UserId::MIN,
                UserId::MAX
            )));
        }
        if self.users.iter().any(|u| u.id == id) {
            return Err(DomainError::DuplicateId(id));
        }
        if self.users.iter().any(|u| &u.card_id == card_id) {
            return Err(DomainError::DuplicateCard(card_id.clone()));
        }
        Ok(())
    }

    /// Records a rejected mutation in the notification trail.
    fn reject(&mut self, err: DomainError) -> DomainError {
        let kind = if err.is_not_found() {
            NotificationKind::Warning
        } else {
            NotificationKind::Error
        };
        debug!(code = err.code(), error = %err, "Registry operation rejected");
        self.notifications.push(kind, err.to_string());
        err
    }
}
