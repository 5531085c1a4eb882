//! Host wiring: the durable store, the volatile store, and the change bridge accessors share.

use std::{fmt, rc::Rc};

use crate::{
    bridge::{context_bridge, ChangeBridge},
    codec::Codec,
    error::ConfigError,
    item::{LocalItem, LocalItemOptions},
    store::{volatile_store, LocalStore, MemoryLocalStore},
};

/// Stores and change bridge for one execution context.
///
/// Clones share the same stores and bridge.
#[derive(Clone)]
pub struct LocalItemHost {
    durable: Rc<dyn LocalStore>,
    volatile: MemoryLocalStore,
    bridge: ChangeBridge,
}

impl fmt::Debug for LocalItemHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalItemHost")
            .field("volatile", &self.volatile)
            .field("bridge", &self.bridge)
            .finish_non_exhaustive()
    }
}

impl LocalItemHost {
    /// Assembles a host from explicit parts.
    pub fn new(
        durable: impl LocalStore + 'static,
        volatile: MemoryLocalStore,
        bridge: ChangeBridge,
    ) -> Self {
        Self {
            durable: Rc::new(durable),
            volatile,
            bridge,
        }
    }

    /// Host over `durable` using this context's volatile store and change bridge.
    ///
    /// Hosts built this way in one context see each other's writes.
    pub fn with_durable(durable: impl LocalStore + 'static) -> Self {
        Self::new(durable, volatile_store(), context_bridge())
    }

    /// Fully isolated in-memory host, used by tests and headless runs.
    pub fn memory() -> Self {
        Self::new(
            MemoryLocalStore::default(),
            MemoryLocalStore::default(),
            ChangeBridge::new(),
        )
    }

    /// Durable store shared with other execution contexts.
    pub fn durable(&self) -> &Rc<dyn LocalStore> {
        &self.durable
    }

    /// Volatile store private to this execution context.
    pub fn volatile(&self) -> &MemoryLocalStore {
        &self.volatile
    }

    /// Change bridge every accessor on this host subscribes to.
    pub fn bridge(&self) -> &ChangeBridge {
        &self.bridge
    }

    /// Selects the backing store for an accessor.
    pub fn store(&self, use_memory_store: bool) -> Rc<dyn LocalStore> {
        if use_memory_store {
            Rc::new(self.volatile.clone())
        } else {
            self.durable.clone()
        }
    }

    /// Creates a single accessor for `key`.
    ///
    /// # Errors
    ///
    /// Returns an error when the configured default value is rejected by `codec`.
    pub fn item<C: Codec>(
        &self,
        key: impl Into<String>,
        codec: C,
        options: LocalItemOptions<C::Value>,
    ) -> Result<LocalItem<C>, ConfigError> {
        LocalItem::new(self, key, codec, options)
    }
}
