//! FPD TUI - Library modules
//!
//! Terminal dashboard for the fingerprint access-control daemon.
//!
//! # Architecture
//!
//! Three tasks cooperate through channels:
//!
//! 1. **Keyboard Task**: polls crossterm and forwards key events
//! 2. **Daemon Client Task**: keeps a subscribed connection to `fpdd`,
//!    forwards snapshots and registry events, and sends operator commands
//! 3. **Main Event Loop**: applies events to [`App`] and redraws
//!
//! All tasks share a `CancellationToken` for shutdown.

pub mod app;
pub mod client;
pub mod daemon;
pub mod error;
pub mod input;
pub mod ui;

pub use app::App;
pub use client::DaemonClient;
pub use error::{Result, TuiError};
