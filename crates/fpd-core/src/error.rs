//! Domain-specific error types following panic-free policy.

use crate::{CardId, DeviceId, UserId};
use thiserror::Error;

/// Errors that can occur in registry operations.
///
/// Every variant is recoverable at the calling boundary. The registry checks
/// for all of them before touching any collection, so a returned error means
/// no user, device or access-log state changed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Missing or out-of-range input
    #[error("Invalid input: {0}")]
    Validation(String),

    /// A user with this id is already enrolled
    #[error("User ID {0} already exists")]
    DuplicateId(UserId),

    /// Another user already holds this card
    #[error("Card {0} is already assigned to another user")]
    DuplicateCard(CardId),

    /// The referenced user does not exist
    #[error("User {0} not found")]
    UserNotFound(UserId),

    /// The referenced device does not exist
    #[error("Device {0} not found")]
    DeviceNotFound(DeviceId),
}

impl DomainError {
    /// Creates a validation error from any displayable reason.
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation(reason.into())
    }

    /// Returns the stable wire code for this error kind.
    ///
    /// Both not-found variants share the `not_found` code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::DuplicateId(_) => "duplicate_id",
            Self::DuplicateCard(_) => "duplicate_card",
            Self::UserNotFound(_) | Self::DeviceNotFound(_) => "not_found",
        }
    }

    /// Returns true for the not-found family of errors.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::UserNotFound(_) | Self::DeviceNotFound(_))
    }
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DomainError::DuplicateId(UserId::new(4));
        assert_eq!(err.to_string(), "User ID 4 already exists");

        let err = DomainError::DuplicateCard(CardId::new("CARD001"));
        assert_eq!(
            err.to_string(),
            "Card CARD001 is already assigned to another user"
        );

        let err = DomainError::DeviceNotFound(DeviceId::new("8C128B2B1838"));
        assert_eq!(err.to_string(), "Device 8C128B2B1838 not found");
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(DomainError::validation("x").code(), "validation");
        assert_eq!(DomainError::DuplicateId(UserId::new(1)).code(), "duplicate_id");
        assert_eq!(
            DomainError::DuplicateCard(CardId::new("C1")).code(),
            "duplicate_card"
        );
        assert_eq!(DomainError::UserNotFound(UserId::new(1)).code(), "not_found");
        assert_eq!(
            DomainError::DeviceNotFound(DeviceId::new("D")).code(),
            "not_found"
        );
    }

    #[test]
    fn test_is_not_found() {
        assert!(DomainError::UserNotFound(UserId::new(9)).is_not_found());
        assert!(!DomainError::validation("bad").is_not_found());
    }
}
