//! Change events pushed to subscribed clients.

use fpd_core::{AccessLogEntry, Device, Notification, User, UserId};
use serde::{Deserialize, Serialize};

/// A committed registry change.
///
/// Published only after the mutation has fully applied, so a subscriber
/// replaying events over a snapshot always lands on a consistent state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegistryEvent {
    UserEnrolled { user: User },
    UserConfirmed { user: User },
    UserDeleted { user_id: UserId },
    UsersCleared { count: usize },
    AccessRecorded { entry: AccessLogEntry },
    DeviceUpdated { device: Device },
    NotificationPushed { notification: Notification },
}

impl RegistryEvent {
    /// Short name for log fields.
    pub fn name(&self) -> &'static str {
        match self {
            Self::UserEnrolled { .. } => "user_enrolled",
            Self::UserConfirmed { .. } => "user_confirmed",
            Self::UserDeleted { .. } => "user_deleted",
            Self::UsersCleared { .. } => "users_cleared",
            Self::AccessRecorded { .. } => "access_recorded",
            Self::DeviceUpdated { .. } => "device_updated",
            Self::NotificationPushed { .. } => "notification_pushed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_tagging() {
        let event = RegistryEvent::UsersCleared { count: 3 };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "users_cleared");
        assert_eq!(json["count"], 3);
        assert_eq!(event.name(), "users_cleared");
    }
}
