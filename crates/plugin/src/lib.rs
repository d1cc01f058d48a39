//! Host glue for the MediaTek IMS extension.
//!
//! Ties the stack together at process scope: the extension registration
//! entry points the host daemon calls on load/unload, the per-slot wiring,
//! and the NetworkManager IPv4 watcher feeding Wi-Fi configuration pushes.

mod error;
pub mod netwatch;
pub mod registry;
pub mod slot;

use std::sync::Arc;

use tracing::debug;

pub use error::{Error, Result};
pub use netwatch::Ip4Config;
pub use registry::{ExtensionRegistry, MtkImsDriver, SlotDriver};
pub use slot::{Interface, InterfaceKind, Slot};

pub const PLUGIN_NAME: &str = "mtkims";

/// Load-time entry point: register the slot driver with the host registry.
pub fn plugin_init(registry: &ExtensionRegistry) -> Result<()> {
    debug!("");
    registry.register(Arc::new(MtkImsDriver))
}

/// Unload-time entry point.
pub fn plugin_exit(registry: &ExtensionRegistry) {
    debug!("");
    registry.unregister(PLUGIN_NAME);
}
