//! fpd Protocol - Wire protocol for daemon communication
//!
//! Message types exchanged between the access-control daemon and its
//! dashboard clients, plus parsing of raw operator input into typed
//! registry requests.

pub mod event;
pub mod form;
pub mod message;
pub mod version;

pub use event::RegistryEvent;
pub use form::{RawAccessEvent, RawEnrollForm};
pub use message::{ClientMessage, DaemonMessage, MessageType};
pub use version::ProtocolVersion;
