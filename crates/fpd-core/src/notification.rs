//! Operator notifications and the bounded sink that holds them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// Number of notifications kept by a default sink.
pub const NOTIFICATION_CAPACITY: usize = 10;

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Success,
    Warning,
    Info,
    Error,
}

impl NotificationKind {
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Info => "info",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Notification identifier: creation time in milliseconds since the epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(i64);

impl NotificationId {
    pub const fn new(millis: i64) -> Self {
        Self(millis)
    }

    pub const fn get(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub kind: NotificationKind,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

// ============================================================================
// Notification Sink
// ============================================================================

/// Bounded, newest-first log of notifications.
///
/// Pushing prepends; once the sink holds `capacity` entries the oldest one is
/// dropped. There is no other removal path and no time-based expiry.
///
/// Ids come from the creation timestamp. If the clock has not advanced past
/// the previous id (two pushes in the same millisecond, or a backdated
/// timestamp), the id is bumped to `previous + 1`, keeping ids unique and
/// increasing in insertion order.
#[derive(Debug, Clone)]
pub struct NotificationSink {
    entries: VecDeque<Notification>,
    capacity: usize,
    last_id: Option<NotificationId>,
}

impl Default for NotificationSink {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationSink {
    /// Creates a sink holding at most [`NOTIFICATION_CAPACITY`] entries.
    pub fn new() -> Self {
        Self::with_capacity(NOTIFICATION_CAPACITY)
    }

    /// Creates a sink with a custom capacity (minimum 1).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            last_id: None,
        }
    }

    /// Pushes a notification stamped with the current time.
    pub fn push(&mut self, kind: NotificationKind, message: impl Into<String>) -> Notification {
        self.push_at(kind, message, Utc::now())
    }

    /// Pushes a notification stamped with `timestamp`.
    pub fn push_at(
        &mut self,
        kind: NotificationKind,
        message: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Notification {
        let millis = timestamp.timestamp_millis();
        let id = match self.last_id {
            Some(last) if millis <= last.get() => NotificationId::new(last.get().saturating_add(1)),
            _ => NotificationId::new(millis),
        };
        self.last_id = Some(id);

        let notification = Notification {
            id,
            kind,
            message: message.into(),
            timestamp,
        };

        self.entries.push_front(notification.clone());
        self.entries.truncate(self.capacity);

        notification
    }

    /// Returns the retained notifications, newest first.
    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.entries.iter()
    }

    /// Returns an owned newest-first snapshot.
    pub fn snapshot(&self) -> Vec<Notification> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the most recent notification, if any.
    pub fn latest(&self) -> Option<&Notification> {
        self.entries.front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_push_prepends() {
        let mut sink = NotificationSink::new();
        sink.push(NotificationKind::Info, "first");
        sink.push(NotificationKind::Success, "second");

        let messages: Vec<&str> = sink.iter().map(|n| n.message.as_str()).collect();
        assert_eq!(messages, vec!["second", "first"]);
        assert_eq!(sink.latest().map(|n| n.kind), Some(NotificationKind::Success));
    }

    #[test]
    fn test_length_is_min_of_pushes_and_capacity() {
        for pushes in 0..25usize {
            let mut sink = NotificationSink::new();
            for i in 0..pushes {
                sink.push(NotificationKind::Info, format!("n{i}"));
            }
            assert_eq!(sink.len(), pushes.min(NOTIFICATION_CAPACITY));
        }
    }

    #[test]
    fn test_twelve_pushes_evict_oldest_two() {
        let mut sink = NotificationSink::new();
        for i in 0..12 {
            sink.push(NotificationKind::Warning, format!("n{i}"));
        }

        let messages: Vec<String> = sink.iter().map(|n| n.message.clone()).collect();
        assert_eq!(messages.len(), 10);
        assert!(!messages.contains(&"n0".to_string()));
        assert!(!messages.contains(&"n1".to_string()));
        assert_eq!(messages.first().map(String::as_str), Some("n11"));
        assert_eq!(messages.last().map(String::as_str), Some("n2"));
    }

    #[test]
    fn test_ids_strictly_increase_within_same_millisecond() {
        let mut sink = NotificationSink::new();
        let at = Utc::now();
        let a = sink.push_at(NotificationKind::Info, "a", at);
        let b = sink.push_at(NotificationKind::Info, "b", at);
        let c = sink.push_at(NotificationKind::Info, "c", at - Duration::seconds(10));

        assert_eq!(a.id.get(), at.timestamp_millis());
        assert!(b.id > a.id);
        assert!(c.id > b.id);
    }

    #[test]
    fn test_custom_capacity() {
        let mut sink = NotificationSink::with_capacity(0);
        assert_eq!(sink.capacity(), 1);
        sink.push(NotificationKind::Error, "one");
        sink.push(NotificationKind::Error, "two");
        assert_eq!(sink.len(), 1);
        assert_eq!(sink.latest().map(|n| n.message.as_str()), Some("two"));
    }

    #[test]
    fn test_kind_serialization() {
        let json = serde_json::to_string(&NotificationKind::Warning).unwrap();
        assert_eq!(json, "\"warning\"");
    }
}
