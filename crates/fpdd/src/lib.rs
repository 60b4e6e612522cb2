//! fpd Daemon - Access-control registry and broadcast server
//!
//! This crate provides the daemon side of the dashboard:
//! - `registry` - Actor that owns the single [`fpd_core::Registry`] instance
//! - `server` - Unix socket server for dashboard clients
//! - `simulator` - Random access events and device status draws
//! - `seed` - Demo state loaded at startup
//! - `config` - Daemon configuration file and environment overrides
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌─────────────────────────────┐
//! │  DaemonServer   │────▶│       RegistryActor         │
//! │ (Unix Socket)   │     │   (owns fpd_core::Registry) │
//! └────────┬────────┘     └──────────────┬──────────────┘
//!          │ connections                 │ RegistryEvent
//!          ▼                             ▼
//! ┌─────────────────┐     ┌─────────────────────────────┐
//! │ConnectionHandler│     │     broadcast::Sender       │
//! │  (per client)   │     │    (fan-out to clients)     │
//! └─────────────────┘     └─────────────────────────────┘
//!          ▲
//!          │ RegistryHandle
//! ┌─────────────────┐
//! │    Simulator    │
//! │ (periodic draws)│
//! └─────────────────┘
//! ```
//!
//! Production code never panics: channel closure and I/O failures surface
//! as errors or are logged.

pub mod config;
pub mod registry;
pub mod seed;
pub mod server;
pub mod simulator;
