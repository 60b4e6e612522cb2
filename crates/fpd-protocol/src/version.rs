//! Protocol version negotiation.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Version of the daemon/client wire protocol, as `major.minor`.
///
/// Clients and daemon interoperate when their major versions match. Minor
/// bumps only add message variants or optional fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolVersion {
    pub major: u16,
    pub minor: u16,
}

impl ProtocolVersion {
    /// Version spoken by this build.
    pub const CURRENT: ProtocolVersion = ProtocolVersion { major: 1, minor: 0 };

    pub const fn new(major: u16, minor: u16) -> Self {
        Self { major, minor }
    }

    /// Parses a version string like "1.0".
    pub fn parse(s: &str) -> Result<Self, VersionError> {
        let invalid = || VersionError::InvalidFormat(s.to_string());

        let (major, minor) = s.split_once('.').ok_or_else(invalid)?;
        let major = major.parse::<u16>().map_err(|_| invalid())?;
        let minor = minor.parse::<u16>().map_err(|_| invalid())?;

        Ok(Self { major, minor })
    }

    pub fn is_compatible_with(&self, other: &ProtocolVersion) -> bool {
        self.major == other.major
    }

    /// Checks a peer's version against ours.
    pub fn negotiate(&self, peer: &ProtocolVersion) -> Result<(), VersionError> {
        if self.is_compatible_with(peer) {
            Ok(())
        } else {
            Err(VersionError::Incompatible {
                got: peer.to_string(),
                expected: self.to_string(),
            })
        }
    }
}

impl Default for ProtocolVersion {
    fn default() -> Self {
        Self::CURRENT
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    #[error("Invalid version format: {0}")]
    InvalidFormat(String),

    #[error("Incompatible protocol version: got {got}, expected {expected}")]
    Incompatible { got: String, expected: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_parse() {
        assert_eq!(ProtocolVersion::parse("1.0").unwrap(), ProtocolVersion::new(1, 0));
        assert_eq!(ProtocolVersion::parse("2.13").unwrap(), ProtocolVersion::new(2, 13));
    }

    #[test]
    fn test_version_parse_invalid() {
        assert!(ProtocolVersion::parse("1").is_err());
        assert!(ProtocolVersion::parse("1.0.0").is_err());
        assert!(ProtocolVersion::parse("a.b").is_err());
    }

    #[test]
    fn test_negotiate() {
        let current = ProtocolVersion::CURRENT;
        assert!(current.negotiate(&ProtocolVersion::new(1, 7)).is_ok());

        let err = current.negotiate(&ProtocolVersion::new(2, 0)).unwrap_err();
        assert_eq!(
            err,
            VersionError::Incompatible {
                got: "2.0".to_string(),
                expected: "1.0".to_string(),
            }
        );
    }
}
