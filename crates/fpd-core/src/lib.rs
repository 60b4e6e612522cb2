//! FPD Core - Shared types for the fingerprint access-control dashboard
//!
//! This crate provides the domain model shared between the daemon (fpdd)
//! and the TUI (fpd): devices, users, access log entries, notifications,
//! and the `Registry` that owns them and enforces their invariants.
//!
//! All code follows the panic-free policy: no `.unwrap()`, `.expect()`,
//! `panic!()`, `unreachable!()`, `todo!()`, or direct indexing `[i]`.

pub mod access;
pub mod device;
pub mod error;
pub mod notification;
pub mod registry;
pub mod stats;
pub mod time;
pub mod user;

// Re-exports for convenience
pub use access::{AccessLogEntry, AccessSeq, NO_CARD, UNKNOWN_USER};
pub use device::{Device, DeviceId, DeviceStatus};
pub use error::{DomainError, DomainResult};
pub use notification::{
    Notification, NotificationId, NotificationKind, NotificationSink, NOTIFICATION_CAPACITY,
};
pub use registry::{EnrollUser, Registry, RegistrySnapshot};
pub use stats::DashboardStats;
pub use time::format_relative;
pub use user::{CardId, User, UserId};
