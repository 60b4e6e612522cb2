//! Access log entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Name recorded when the presented finger or card matched nobody.
pub const UNKNOWN_USER: &str = "Unknown";

/// Card value recorded when no card was presented.
pub const NO_CARD: &str = "N/A";

/// Sequence number of an access log entry.
///
/// Strictly increasing in append order and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessSeq(u64);

impl AccessSeq {
    pub const fn new(seq: u64) -> Self {
        Self(seq)
    }

    pub const fn get(&self) -> u64 {
        self.0
    }

    /// Returns the following sequence number.
    #[must_use]
    pub fn next(&self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for AccessSeq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One access attempt at a device. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessLogEntry {
    pub id: AccessSeq,
    pub user_name: String,
    pub card_id: String,
    pub granted: bool,
    pub timestamp: DateTime<Utc>,
}

impl AccessLogEntry {
    /// Builds an entry, substituting the sentinels for blank name or card.
    pub fn new(
        id: AccessSeq,
        user_name: &str,
        card_id: &str,
        granted: bool,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let user_name = match user_name.trim() {
            "" => UNKNOWN_USER,
            name => name,
        };
        let card_id = match card_id.trim() {
            "" => NO_CARD,
            card => card,
        };

        Self {
            id,
            user_name: user_name.to_string(),
            card_id: card_id.to_string(),
            granted,
            timestamp,
        }
    }

    #[must_use]
    pub fn outcome_label(&self) -> &'static str {
        if self.granted {
            "Granted"
        } else {
            "Denied"
        }
    }
}
