//! Host extension-registry boundary.
//!
//! The host daemon keeps a registry of loaded extensions and asks the
//! registered driver to build per-slot objects as modems appear. Only the
//! boundary is modeled here; the daemon owns the registry's lifetime.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::debug;

use mtkims_binder::ServiceManager;

use crate::error::{Error, Result};
use crate::slot::Slot;

/// Builds the per-slot objects of one extension.
#[async_trait]
pub trait SlotDriver: Send + Sync {
    fn name(&self) -> &str;
    async fn create_slot(&self, sm: &dyn ServiceManager, slot_index: u32) -> Result<Slot>;
}

/// Extension registry the host consults by name.
#[derive(Default)]
pub struct ExtensionRegistry {
    drivers: Mutex<HashMap<String, Arc<dyn SlotDriver>>>,
}

impl ExtensionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, driver: Arc<dyn SlotDriver>) -> Result<()> {
        let name = driver.name().to_owned();
        let mut drivers = self.drivers.lock().unwrap();
        if drivers.contains_key(&name) {
            return Err(Error::AlreadyRegistered(name));
        }
        debug!("registered extension {}", name);
        drivers.insert(name, driver);
        Ok(())
    }

    pub fn unregister(&self, name: &str) -> bool {
        let removed = self.drivers.lock().unwrap().remove(name).is_some();
        if removed {
            debug!("unregistered extension {}", name);
        }
        removed
    }

    pub fn driver(&self, name: &str) -> Option<Arc<dyn SlotDriver>> {
        self.drivers.lock().unwrap().get(name).cloned()
    }
}

/// The MediaTek IMS slot driver this crate registers.
pub struct MtkImsDriver;

#[async_trait]
impl SlotDriver for MtkImsDriver {
    fn name(&self) -> &str {
        crate::PLUGIN_NAME
    }

    async fn create_slot(&self, sm: &dyn ServiceManager, slot_index: u32) -> Result<Slot> {
        Slot::create(sm, slot_index).await
    }
}
