//! Application state for the FPD TUI.
//!
//! `App` mirrors the daemon's registry from one snapshot plus the stream of
//! registry events that follows it. Events may overlap the snapshot, so
//! every apply step is idempotent: users upsert by id, log entries dedupe
//! by sequence number, notifications dedupe by id.
//!
//! All code follows the panic-free policy: no `.unwrap()`, `.expect()`,
//! `panic!()`, `unreachable!()`, `todo!()`, or direct indexing `[i]`.

use chrono::{DateTime, Local, Utc};
use fpd_core::{
    AccessLogEntry, DashboardStats, Device, Notification, RegistrySnapshot, User, UserId,
    NOTIFICATION_CAPACITY,
};
use fpd_protocol::{RawEnrollForm, RegistryEvent};

/// How many log entries and notifications the dashboard tab lists.
pub const RECENT_ITEMS: usize = 5;

// ============================================================================
// Connection State
// ============================================================================

/// Connection state of the TUI to the daemon.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum AppState {
    /// Subscribed and receiving events.
    Connected,

    /// Lost connection, attempting reconnect.
    Disconnected {
        since: DateTime<Utc>,
        retry_count: u32,
    },

    #[default]
    Connecting,
}

// ============================================================================
// Tabs
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Dashboard,
    Users,
    Logs,
    Devices,
}

impl Tab {
    pub const ALL: [Tab; 4] = [Tab::Dashboard, Tab::Users, Tab::Logs, Tab::Devices];

    pub fn title(&self) -> &'static str {
        match self {
            Self::Dashboard => "Dashboard",
            Self::Users => "Users",
            Self::Logs => "Access Logs",
            Self::Devices => "Devices",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Self::Dashboard => 0,
            Self::Users => 1,
            Self::Logs => 2,
            Self::Devices => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    #[must_use]
    pub fn next(&self) -> Self {
        Self::from_index((self.index() + 1) % Self::ALL.len()).unwrap_or_default()
    }

    #[must_use]
    pub fn previous(&self) -> Self {
        let len = Self::ALL.len();
        Self::from_index((self.index() + len - 1) % len).unwrap_or_default()
    }
}

// ============================================================================
// Modal State
// ============================================================================

/// Input fields of the enrollment form, in tab order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnrollField {
    #[default]
    UserId,
    Name,
    Phone,
    CardId,
}

impl EnrollField {
    pub const ALL: [EnrollField; 4] = [
        EnrollField::UserId,
        EnrollField::Name,
        EnrollField::Phone,
        EnrollField::CardId,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::UserId => "User ID (1-20)",
            Self::Name => "Full Name",
            Self::Phone => "Phone Number",
            Self::CardId => "Card ID",
        }
    }

    #[must_use]
    pub fn next(&self) -> Self {
        match self {
            Self::UserId => Self::Name,
            Self::Name => Self::Phone,
            Self::Phone => Self::CardId,
            Self::CardId => Self::UserId,
        }
    }

    #[must_use]
    pub fn previous(&self) -> Self {
        match self {
            Self::UserId => Self::CardId,
            Self::Name => Self::UserId,
            Self::Phone => Self::Name,
            Self::CardId => Self::Phone,
        }
    }
}

/// The enrollment modal's text fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrollForm {
    pub user_id: String,
    pub name: String,
    pub phone: String,
    pub card_id: String,
    pub focus: EnrollField,
    /// Validation message shown under the fields
    pub error: Option<String>,
}

impl EnrollForm {
    pub fn value(&self, field: EnrollField) -> &str {
        match field {
            EnrollField::UserId => &self.user_id,
            EnrollField::Name => &self.name,
            EnrollField::Phone => &self.phone,
            EnrollField::CardId => &self.card_id,
        }
    }

    fn focused_mut(&mut self) -> &mut String {
        match self.focus {
            EnrollField::UserId => &mut self.user_id,
            EnrollField::Name => &mut self.name,
            EnrollField::Phone => &mut self.phone,
            EnrollField::CardId => &mut self.card_id,
        }
    }

    pub fn push_char(&mut self, c: char) {
        self.focused_mut().push(c);
        self.error = None;
    }

    pub fn pop_char(&mut self) {
        self.focused_mut().pop();
        self.error = None;
    }

    pub fn focus_next(&mut self) {
        self.focus = self.focus.next();
    }

    pub fn focus_previous(&mut self) {
        self.focus = self.focus.previous();
    }

    pub fn to_raw(&self) -> RawEnrollForm {
        RawEnrollForm {
            user_id: self.user_id.clone(),
            name: self.name.clone(),
            phone: self.phone.clone(),
            card_id: self.card_id.clone(),
        }
    }
}

/// A destructive operation waiting for a yes/no answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingConfirm {
    DeleteUser { id: UserId, name: String },
    ClearUsers,
}

impl PendingConfirm {
    pub fn prompt(&self) -> String {
        match self {
            Self::DeleteUser { name, .. } => {
                format!("Are you sure you want to delete {name}?")
            }
            Self::ClearUsers => {
                "Are you sure you want to clear ALL users? This cannot be undone!".to_string()
            }
        }
    }
}

/// What keyboard input currently drives.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Normal,
    Enroll(EnrollForm),
    Confirm(PendingConfirm),
}

// ============================================================================
// Application
// ============================================================================

/// Core application state for the FPD TUI.
#[derive(Debug, Clone)]
pub struct App {
    pub state: AppState,

    /// Sorted by user id.
    pub users: Vec<User>,

    pub devices: Vec<Device>,

    /// Newest first.
    pub access_log: Vec<AccessLogEntry>,

    /// Newest first, at most `NOTIFICATION_CAPACITY`.
    pub notifications: Vec<Notification>,

    pub tab: Tab,

    pub mode: Mode,

    /// Index into `users`.
    pub selected_user: usize,

    /// Index into `devices`; shown in the header.
    pub selected_device: usize,

    pub should_quit: bool,

    /// Timestamp of the last data update from the daemon.
    pub last_update: DateTime<Utc>,

    /// Last error reported by the daemon, cleared on the next keypress.
    pub last_error: Option<String>,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    pub fn new() -> Self {
        Self {
            state: AppState::Connecting,
            users: Vec::new(),
            devices: Vec::new(),
            access_log: Vec::new(),
            notifications: Vec::new(),
            tab: Tab::Dashboard,
            mode: Mode::Normal,
            selected_user: 0,
            selected_device: 0,
            should_quit: false,
            last_update: Utc::now(),
            last_error: None,
        }
    }

    /// Replaces all mirrored state with a fresh snapshot.
    pub fn apply_snapshot(&mut self, snapshot: RegistrySnapshot) {
        let RegistrySnapshot {
            devices,
            mut users,
            mut access_log,
            mut notifications,
            stats: _,
        } = snapshot;

        users.sort_by_key(|u| u.id);
        access_log.sort_by(|a, b| b.id.cmp(&a.id));
        notifications.sort_by(|a, b| b.id.cmp(&a.id));
        notifications.truncate(NOTIFICATION_CAPACITY);

        self.users = users;
        self.devices = devices;
        self.access_log = access_log;
        self.notifications = notifications;
        self.mark_updated();
    }

    /// Applies one registry event on top of the current state.
    pub fn apply_event(&mut self, event: RegistryEvent) {
        match event {
            RegistryEvent::UserEnrolled { user } | RegistryEvent::UserConfirmed { user } => {
                self.upsert_user(user);
            }
            RegistryEvent::UserDeleted { user_id } => {
                self.users.retain(|u| u.id != user_id);
            }
            RegistryEvent::UsersCleared { .. } => {
                self.users.clear();
            }
            RegistryEvent::AccessRecorded { entry } => {
                if !self.access_log.iter().any(|e| e.id == entry.id) {
                    self.access_log.push(entry);
                    self.access_log.sort_by(|a, b| b.id.cmp(&a.id));
                }
            }
            RegistryEvent::DeviceUpdated { device } => {
                match self.devices.iter_mut().find(|d| d.id() == device.id()) {
                    Some(slot) => *slot = device,
                    None => self.devices.push(device),
                }
            }
            RegistryEvent::NotificationPushed { notification } => {
                if !self.notifications.iter().any(|n| n.id == notification.id) {
                    self.notifications.push(notification);
                    self.notifications.sort_by(|a, b| b.id.cmp(&a.id));
                    self.notifications.truncate(NOTIFICATION_CAPACITY);
                }
            }
        }
        self.mark_updated();
    }

    fn upsert_user(&mut self, user: User) {
        match self.users.binary_search_by_key(&user.id, |u| u.id) {
            Ok(index) => {
                if let Some(slot) = self.users.get_mut(index) {
                    *slot = user;
                }
            }
            Err(index) => self.users.insert(index, user),
        }
    }

    fn mark_updated(&mut self) {
        self.state = AppState::Connected;
        self.last_update = Utc::now();
        self.clamp_selection();
    }

    fn clamp_selection(&mut self) {
        self.selected_user = clamp_index(self.selected_user, self.users.len());
        self.selected_device = clamp_index(self.selected_device, self.devices.len());
    }

    /// Marks the connection as disconnected and increments the retry count.
    pub fn mark_disconnected(&mut self) {
        match &self.state {
            AppState::Disconnected { since, retry_count } => {
                self.state = AppState::Disconnected {
                    since: *since,
                    retry_count: retry_count.saturating_add(1),
                };
            }
            AppState::Connected | AppState::Connecting => {
                self.state = AppState::Disconnected {
                    since: Utc::now(),
                    retry_count: 1,
                };
            }
        }
    }

    /// Dashboard counters, recomputed from the mirrored collections.
    pub fn stats(&self) -> DashboardStats {
        DashboardStats::project(&self.users, &self.devices, &self.access_log, &Local)
    }

    /// Number shown on the notification bell.
    pub fn notification_badge(&self) -> usize {
        self.notifications.len()
    }

    pub fn recent_access(&self) -> impl Iterator<Item = &AccessLogEntry> {
        self.access_log.iter().take(RECENT_ITEMS)
    }

    pub fn recent_notifications(&self) -> impl Iterator<Item = &Notification> {
        self.notifications.iter().take(RECENT_ITEMS)
    }

    pub fn selected_user(&self) -> Option<&User> {
        self.users.get(self.selected_user)
    }

    pub fn selected_device(&self) -> Option<&Device> {
        self.devices.get(self.selected_device)
    }

    /// Navigates to the next user, wrapping around.
    pub fn select_next(&mut self) {
        let count = self.users.len();
        if count == 0 {
            self.selected_user = 0;
            return;
        }
        self.selected_user = (self.selected_user.saturating_add(1)) % count;
    }

    /// Navigates to the previous user, wrapping around.
    pub fn select_previous(&mut self) {
        let count = self.users.len();
        if count == 0 {
            self.selected_user = 0;
        } else if self.selected_user == 0 {
            self.selected_user = count.saturating_sub(1);
        } else {
            self.selected_user = self.selected_user.saturating_sub(1);
        }
    }

    /// Moves the header's device selector to the next device.
    pub fn cycle_device(&mut self) {
        let count = self.devices.len();
        self.selected_device = if count == 0 {
            0
        } else {
            (self.selected_device.saturating_add(1)) % count
        };
    }

    pub fn open_enroll(&mut self) {
        self.mode = Mode::Enroll(EnrollForm::default());
    }

    /// Asks for confirmation before deleting the selected user.
    ///
    /// Returns false when no user is selected.
    pub fn request_delete(&mut self) -> bool {
        let Some(user) = self.selected_user() else {
            return false;
        };
        self.mode = Mode::Confirm(PendingConfirm::DeleteUser {
            id: user.id,
            name: user.name.clone(),
        });
        true
    }

    pub fn request_clear(&mut self) {
        self.mode = Mode::Confirm(PendingConfirm::ClearUsers);
    }

    pub fn close_modal(&mut self) {
        self.mode = Mode::Normal;
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.last_error = Some(message.into());
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }
}

fn clamp_index(index: usize, len: usize) -> usize {
    if len == 0 {
        0
    } else {
        index.min(len.saturating_sub(1))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use fpd_core::{
        AccessSeq, CardId, DeviceId, DeviceStatus, NotificationId, NotificationKind,
    };

    fn user(id: u32, name: &str) -> User {
        User::pending(UserId::new(id), name, "+1", CardId::new(format!("C{id}")))
    }

    fn entry(seq: u64, granted: bool) -> AccessLogEntry {
        AccessLogEntry::new(AccessSeq::new(seq), "Ann", "C1", granted, Utc::now())
    }

    fn notification(id: i64) -> Notification {
        Notification {
            id: NotificationId::new(id),
            kind: NotificationKind::Info,
            message: format!("n{id}"),
            timestamp: Utc::now(),
        }
    }

    fn device(id: &str, status: DeviceStatus) -> Device {
        Device::new(DeviceId::new(id), "Main Entrance", status, Utc::now(), 0)
    }

    fn snapshot() -> RegistrySnapshot {
        RegistrySnapshot {
            devices: vec![device("D1", DeviceStatus::Online)],
            users: vec![user(3, "Cy"), user(1, "Ann")],
            access_log: vec![entry(1, true), entry(2, false)],
            notifications: vec![notification(10), notification(20)],
            stats: DashboardStats::default(),
        }
    }

    #[test]
    fn test_app_new_is_connecting() {
        let app = App::new();
        assert_eq!(app.state, AppState::Connecting);
        assert_eq!(app.tab, Tab::Dashboard);
        assert_eq!(app.mode, Mode::Normal);
        assert!(app.users.is_empty());
        assert!(!app.should_quit);
    }

    #[test]
    fn test_apply_snapshot_orders_collections() {
        let mut app = App::new();
        app.apply_snapshot(snapshot());

        assert_eq!(app.state, AppState::Connected);
        let ids: Vec<u32> = app.users.iter().map(|u| u.id.get()).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(app.access_log.first().map(|e| e.id.get()), Some(2));
        assert_eq!(app.notifications.first().map(|n| n.id.get()), Some(20));
    }

    #[test]
    fn test_events_are_idempotent() {
        let mut app = App::new();
        app.apply_snapshot(snapshot());

        // Replays of state already in the snapshot change nothing
        app.apply_event(RegistryEvent::AccessRecorded { entry: entry(2, false) });
        app.apply_event(RegistryEvent::NotificationPushed {
            notification: notification(20),
        });
        app.apply_event(RegistryEvent::UserEnrolled { user: user(1, "Ann") });

        assert_eq!(app.access_log.len(), 2);
        assert_eq!(app.notifications.len(), 2);
        assert_eq!(app.users.len(), 2);
    }

    #[test]
    fn test_user_events() {
        let mut app = App::new();
        app.apply_snapshot(snapshot());

        app.apply_event(RegistryEvent::UserEnrolled { user: user(2, "Bo") });
        let ids: Vec<u32> = app.users.iter().map(|u| u.id.get()).collect();
        assert_eq!(ids, vec![1, 2, 3]);

        let mut confirmed = user(2, "Bo");
        confirmed.enrolled = true;
        app.apply_event(RegistryEvent::UserConfirmed { user: confirmed });
        assert!(app.users.iter().any(|u| u.id == UserId::new(2) && u.enrolled));

        app.apply_event(RegistryEvent::UserDeleted {
            user_id: UserId::new(3),
        });
        assert_eq!(app.users.len(), 2);

        app.apply_event(RegistryEvent::UsersCleared { count: 2 });
        assert!(app.users.is_empty());
        assert_eq!(app.stats().total_users, 0);
    }

    #[test]
    fn test_notifications_truncate_to_capacity() {
        let mut app = App::new();
        for id in 1..=12 {
            app.apply_event(RegistryEvent::NotificationPushed {
                notification: notification(id),
            });
        }

        assert_eq!(app.notification_badge(), NOTIFICATION_CAPACITY);
        assert_eq!(app.notifications.first().map(|n| n.id.get()), Some(12));
        assert_eq!(app.notifications.last().map(|n| n.id.get()), Some(3));
        assert_eq!(app.recent_notifications().count(), RECENT_ITEMS);
    }

    #[test]
    fn test_device_update_replaces_in_place() {
        let mut app = App::new();
        app.apply_snapshot(snapshot());
        assert_eq!(app.stats().active_devices, 1);

        app.apply_event(RegistryEvent::DeviceUpdated {
            device: device("D1", DeviceStatus::Offline),
        });
        assert_eq!(app.devices.len(), 1);
        assert_eq!(app.stats().active_devices, 0);

        app.apply_event(RegistryEvent::DeviceUpdated {
            device: device("D2", DeviceStatus::Online),
        });
        assert_eq!(app.devices.len(), 2);
    }

    #[test]
    fn test_stats_projection() {
        let mut app = App::new();
        app.apply_snapshot(snapshot());
        app.apply_event(RegistryEvent::AccessRecorded {
            entry: AccessLogEntry::new(
                AccessSeq::new(3),
                "Old",
                "C9",
                false,
                Utc::now() - Duration::days(3),
            ),
        });

        let stats = app.stats();
        assert_eq!(stats.total_users, 2);
        assert_eq!(stats.failed_attempts, 2);
        assert_eq!(stats.today_access, 2);
    }

    #[test]
    fn test_selection_wraps_and_clamps() {
        let mut app = App::new();
        app.apply_snapshot(snapshot());

        app.select_previous();
        assert_eq!(app.selected_user, 1);
        app.select_next();
        assert_eq!(app.selected_user, 0);

        app.selected_user = 1;
        app.apply_event(RegistryEvent::UserDeleted {
            user_id: UserId::new(3),
        });
        assert_eq!(app.selected_user, 0);
    }

    #[test]
    fn test_selection_on_empty() {
        let mut app = App::new();
        app.select_next();
        app.select_previous();
        app.cycle_device();
        assert_eq!(app.selected_user, 0);
        assert_eq!(app.selected_device, 0);
        assert!(app.selected_user().is_none());
    }

    #[test]
    fn test_request_delete_requires_selection() {
        let mut app = App::new();
        assert!(!app.request_delete());
        assert_eq!(app.mode, Mode::Normal);

        app.apply_snapshot(snapshot());
        assert!(app.request_delete());
        assert_eq!(
            app.mode,
            Mode::Confirm(PendingConfirm::DeleteUser {
                id: UserId::new(1),
                name: "Ann".to_string(),
            })
        );
    }

    #[test]
    fn test_mark_disconnected_increments_retry() {
        let mut app = App::new();
        app.mark_disconnected();
        app.mark_disconnected();

        match &app.state {
            AppState::Disconnected { retry_count, .. } => assert_eq!(*retry_count, 2),
            other => panic!("Expected Disconnected state, got {other:?}"),
        }
    }

    #[test]
    fn test_tab_cycle() {
        assert_eq!(Tab::Dashboard.next(), Tab::Users);
        assert_eq!(Tab::Devices.next(), Tab::Dashboard);
        assert_eq!(Tab::Dashboard.previous(), Tab::Devices);
        assert_eq!(Tab::from_index(2), Some(Tab::Logs));
        assert_eq!(Tab::from_index(4), None);
    }

    #[test]
    fn test_enroll_form_editing() {
        let mut form = EnrollForm::default();
        form.push_char('7');
        form.focus_next();
        form.push_char('A');
        form.push_char('x');
        form.pop_char();
        form.focus_previous();
        form.focus_previous();
        assert_eq!(form.focus, EnrollField::CardId);

        let raw = form.to_raw();
        assert_eq!(raw.user_id, "7");
        assert_eq!(raw.name, "A");
        assert!(raw.card_id.is_empty());
    }
}
