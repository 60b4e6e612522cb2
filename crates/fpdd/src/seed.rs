//! Demo state loaded when `seed_demo_data` is enabled.
//!
//! One online reader at the main entrance, three confirmed users, a short
//! access history and two notifications, all timestamped relative to `now`.

use chrono::{DateTime, Duration, Utc};

use fpd_core::{
    AccessLogEntry, AccessSeq, CardId, Device, DeviceId, DeviceStatus, Notification,
    NotificationId, NotificationKind, RegistrySnapshot, User, UserId,
};

/// Hardware id of the demo reader.
pub const DEMO_DEVICE_ID: &str = "8C128B2B1838";

/// Builds the demo snapshot anchored at `now`.
///
/// Notification ids here are placeholders; the registry assigns real ones
/// on restore.
pub fn demo_snapshot(now: DateTime<Utc>) -> RegistrySnapshot {
    let devices = vec![Device::new(
        DeviceId::new(DEMO_DEVICE_ID),
        "Main Entrance",
        DeviceStatus::Online,
        now,
        5,
    )];

    let users = vec![
        User::confirmed(UserId::new(1), "John Doe", "+250780146487", CardId::new("CARD001")),
        User::confirmed(UserId::new(2), "Jane Smith", "+250781234567", CardId::new("CARD002")),
        User::confirmed(UserId::new(3), "Bob Wilson", "+250782345678", CardId::new("CARD003")),
    ];

    // Oldest first so sequence numbers follow time.
    let history = [
        ("Bob Wilson", "CARD003", true, 20),
        ("", "", false, 15),
        ("Jane Smith", "CARD002", true, 10),
        ("John Doe", "CARD001", true, 5),
    ];
    let access_log = history
        .iter()
        .zip(1u64..)
        .map(|(&(name, card, granted, minutes_ago), seq)| {
            AccessLogEntry::new(
                AccessSeq::new(seq),
                name,
                card,
                granted,
                now - Duration::minutes(minutes_ago),
            )
        })
        .collect();

    let notifications = vec![
        notification(
            NotificationKind::Warning,
            "Failed access attempt detected",
            now - Duration::minutes(15),
        ),
        notification(
            NotificationKind::Success,
            &format!("Device {DEMO_DEVICE_ID} connected"),
            now - Duration::hours(1),
        ),
    ];

    RegistrySnapshot {
        devices,
        users,
        access_log,
        notifications,
        ..RegistrySnapshot::default()
    }
}

fn notification(kind: NotificationKind, message: &str, timestamp: DateTime<Utc>) -> Notification {
    Notification {
        id: NotificationId::new(timestamp.timestamp_millis()),
        kind,
        message: message.to_string(),
        timestamp,
    }
}
