//! Access-control device entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable hardware identifier of a device (e.g., its MAC "8C128B2B1838").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for DeviceId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Reachability of a device as of its last status refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceStatus {
    Online,
    #[default]
    Offline,
}

impl DeviceStatus {
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
        }
    }

    #[must_use]
    pub fn is_online(&self) -> bool {
        matches!(self, Self::Online)
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A fingerprint/card reader installed at an entrance.
///
/// The id never changes after creation. `status` and `last_seen` are only
/// written together, through [`Device::refresh`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    id: DeviceId,
    pub name: String,
    status: DeviceStatus,
    last_seen: DateTime<Utc>,
    pub enrolled_users: u32,
}

impl Device {
    pub fn new(
        id: DeviceId,
        name: impl Into<String>,
        status: DeviceStatus,
        last_seen: DateTime<Utc>,
        enrolled_users: u32,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            status,
            last_seen,
            enrolled_users,
        }
    }

    pub fn id(&self) -> &DeviceId {
        &self.id
    }

    pub fn status(&self) -> DeviceStatus {
        self.status
    }

    pub fn last_seen(&self) -> DateTime<Utc> {
        self.last_seen
    }

    /// Records a status observation.
    pub fn refresh(&mut self, status: DeviceStatus, seen_at: DateTime<Utc>) {
        self.status = status;
        self.last_seen = seen_at;
    }
}
