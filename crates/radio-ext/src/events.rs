//! Handler registries for the unsolicited event signals.
//!
//! The correlator demultiplexes indications into typed signals; interested
//! adapters register plain closures against them. Emission snapshots the
//! handler list before invoking, so a handler may add or remove handlers
//! (including itself) without deadlocking.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Identifies a registered handler for later removal. Ids are unique across
/// every signal in the process, so an id can be resolved against several
/// registries without ambiguity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(pub(crate) u64);

static NEXT_HANDLER_ID: AtomicU64 = AtomicU64::new(1);

struct Inner<A: ?Sized> {
    map: HashMap<u64, Arc<A>>,
}

/// A list of subscribers to one event signal.
pub struct Handlers<T> {
    inner: Mutex<Inner<dyn Fn(&T) + Send + Sync>>,
}

impl<T> Handlers<T> {
    pub fn new() -> Self {
        Self { inner: Mutex::new(Inner { map: HashMap::new() }) }
    }

    pub fn add(&self, handler: impl Fn(&T) + Send + Sync + 'static) -> HandlerId {
        let id = NEXT_HANDLER_ID.fetch_add(1, Ordering::Relaxed);
        self.inner.lock().unwrap().map.insert(id, Arc::new(handler));
        HandlerId(id)
    }

    pub fn remove(&self, id: HandlerId) -> bool {
        self.inner.lock().unwrap().map.remove(&id.0).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().unwrap().map.is_empty()
    }

    pub fn emit(&self, arg: &T) {
        // Snapshot under the lock, invoke outside it.
        let handlers: Vec<_> = self.inner.lock().unwrap().map.values().cloned().collect();
        for handler in handlers {
            handler(arg);
        }
    }
}

impl<T> Default for Handlers<T> {
    fn default() -> Self {
        Self::new()
    }
}
