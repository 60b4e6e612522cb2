//! Enrolled user entities and identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Type-Safe Identifiers
// ============================================================================

/// Numeric user id, doubling as the fingerprint-sensor slot.
///
/// The sensor only has slots 1 through 20, so ids outside that range are
/// rejected at enrollment. Construction itself does not validate; use
/// [`UserId::is_valid_slot`] before committing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(u32);

impl UserId {
    /// Lowest sensor slot.
    pub const MIN: u32 = 1;

    /// Highest sensor slot.
    pub const MAX: u32 = 20;

    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Checks that the id falls inside the sensor slot range.
    #[must_use]
    pub fn is_valid_slot(&self) -> bool {
        (Self::MIN..=Self::MAX).contains(&self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for UserId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// RFID card identifier (e.g., "CARD001").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(String);

impl CardId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CardId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for CardId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for CardId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// User
// ============================================================================

/// A user known to the access-control system.
///
/// `enrolled` is false between the enrollment request and the device
/// confirming that a fingerprint was captured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub phone: String,
    pub card_id: CardId,
    pub enrolled: bool,
}

impl User {
    /// Creates a user awaiting fingerprint confirmation.
    pub fn pending(
        id: UserId,
        name: impl Into<String>,
        phone: impl Into<String>,
        card_id: CardId,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            phone: phone.into(),
            card_id,
            enrolled: false,
        }
    }

    /// Creates a user whose fingerprint is already on the device.
    pub fn confirmed(
        id: UserId,
        name: impl Into<String>,
        phone: impl Into<String>,
        card_id: CardId,
    ) -> Self {
        Self {
            enrolled: true,
            ..Self::pending(id, name, phone, card_id)
        }
    }

    /// Returns the status label shown next to the user.
    #[must_use]
    pub fn status_label(&self) -> &'static str {
        if self.enrolled {
            "Enrolled"
        } else {
            "Pending"
        }
    }
}
