//! Error types for the FPD TUI.
//!
//! **Panic-Free Policy:** no `.unwrap()`, `.expect()`, `panic!()`,
//! `unreachable!()`, or `todo!()` outside tests.

use std::io;
use thiserror::Error;

/// Errors raised while driving the terminal or talking to `fpdd`.
#[derive(Error, Debug)]
pub enum TuiError {
    /// Raw mode or the alternate screen could not be set up. Usually means
    /// stdout is not a TTY.
    #[error("Failed to initialize terminal: {0}")]
    TerminalInit(String),

    /// The terminal could not be restored on exit; `reset` recovers it.
    #[error("Failed to restore terminal: {0}")]
    TerminalCleanup(String),

    #[error("Failed to connect to daemon: {0}")]
    DaemonConnection(String),

    /// The daemon speaks an incompatible protocol major version.
    #[error("Protocol version mismatch (client: {client_version}, daemon: {daemon_version})")]
    VersionMismatch {
        client_version: String,
        daemon_version: String,
    },

    /// The daemon answered with something the handshake did not expect.
    #[error("Protocol error: {0}")]
    ProtocolError(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to parse message: {0}")]
    ParseError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TuiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_daemon_connection_error_display() {
        let error = TuiError::DaemonConnection("refused".to_string());
        let display = error.to_string();
        assert!(display.contains("Failed to connect to daemon"));
        assert!(display.contains("refused"));
    }

    #[test]
    fn test_version_mismatch_error_display() {
        let error = TuiError::VersionMismatch {
            client_version: "1.0".to_string(),
            daemon_version: "2.0".to_string(),
        };
        let display = error.to_string();
        assert!(display.contains("client: 1.0"));
        assert!(display.contains("daemon: 2.0"));
    }

    #[test]
    fn test_io_error_from_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "socket not found");
        let tui_error: TuiError = io_error.into();
        assert!(matches!(tui_error, TuiError::Io(_)));
    }

    #[test]
    fn test_parse_error_from_conversion() {
        let json_error = serde_json::from_str::<serde_json::Value>("{ nope").unwrap_err();
        let tui_error: TuiError = json_error.into();
        assert!(matches!(tui_error, TuiError::ParseError(_)));
        assert!(tui_error.to_string().contains("Failed to parse message"));
    }
}
