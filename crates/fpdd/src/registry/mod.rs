//! Access-control registry using the Actor pattern.
//!
//! One `RegistryActor` task owns the [`fpd_core::Registry`]. Everything else
//! (client connections, simulator timers) talks to it through a
//! `RegistryHandle`.
//!
//! ```text
//! ┌─────────────────┐     ┌─────────────────┐     ┌──────────────────┐
//! │ Connection /    │────▶│  RegistryActor  │────▶│ Broadcast Channel│
//! │ Simulator       │     │                 │     │                  │
//! └─────────────────┘     └─────────────────┘     └──────────────────┘
//!     RegistryCommand        fpd_core::Registry       RegistryEvent
//!     (mpsc channel)                                  (to subscribers)
//! ```

use tokio::sync::{broadcast, mpsc};

use fpd_core::Registry;

mod actor;
mod commands;
mod handle;

pub use actor::RegistryActor;
pub use commands::{RegistryCommand, RegistryError};
pub use handle::RegistryHandle;

const COMMAND_BUFFER: usize = 100;
const EVENT_BUFFER: usize = 256;

/// Spawns the registry actor around `registry` and returns a handle.
///
/// The actor stops once every handle has been dropped.
///
/// ```no_run
/// use fpdd::registry::{spawn_registry, RegistryError};
///
/// #[tokio::main]
/// async fn main() -> Result<(), RegistryError> {
///     let handle = spawn_registry(fpd_core::Registry::new());
///     let users = handle.list_users().await?;
///     println!("{} users", users.len());
///     Ok(())
/// }
/// ```
pub fn spawn_registry(registry: Registry) -> RegistryHandle {
    let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_BUFFER);
    let (event_tx, _) = broadcast::channel(EVENT_BUFFER);

    let actor = RegistryActor::new(cmd_rx, event_tx.clone(), registry);
    tokio::spawn(actor.run());

    RegistryHandle::new(cmd_tx, event_tx)
}
