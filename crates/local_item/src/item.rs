//! Entry accessor engine: per-key read/write over a codec and a cached, change-driven view.

use std::{
    cell::{Cell, RefCell},
    fmt,
    rc::{Rc, Weak},
};

use leptos::logging;

use crate::{
    bridge::{ChangeBridge, ChangeSource, Subscription},
    codec::Codec,
    error::{ConfigError, LocalItemError},
    host::LocalItemHost,
    store::LocalStore,
    value::{LocalValue, ValidLocalValue},
};

#[derive(Debug, Clone)]
/// Per-accessor options.
pub struct LocalItemOptions<A> {
    /// Use the volatile per-context store instead of the durable store.
    pub use_memory_store: bool,
    /// Value read back when no entry is stored.
    pub default_value: Option<A>,
}

impl<A> Default for LocalItemOptions<A> {
    fn default() -> Self {
        Self {
            use_memory_store: false,
            default_value: None,
        }
    }
}

impl<A> LocalItemOptions<A> {
    /// Selects the volatile store.
    pub fn with_memory_store(mut self, use_memory_store: bool) -> Self {
        self.use_memory_store = use_memory_store;
        self
    }

    /// Sets the default value.
    pub fn with_default(mut self, value: A) -> Self {
        self.default_value = Some(value);
        self
    }
}

/// Per-key get/set/remove primitives an accessor watch binds to.
///
/// Implementations that write to a shared store are expected to emit the same-context change
/// signal themselves, as [`LocalItem`] does.
pub trait ItemAccess {
    /// Domain value type.
    type Value;
    /// Decode error type.
    type Error;

    /// Reads and interprets the current entry.
    fn get_value(&self) -> LocalValue<Self::Error, Self::Value>;

    /// Encodes and stores `value`.
    ///
    /// # Errors
    ///
    /// Returns an error when encoding or the store write fails.
    fn set_value(&self, value: &Self::Value) -> Result<(), LocalItemError>;

    /// Removes the stored entry.
    ///
    /// # Errors
    ///
    /// Returns an error when the store removal fails.
    fn remove_value(&self) -> Result<(), LocalItemError>;

    /// Whether a change signal from `source` can affect this entry.
    fn observes(&self, source: ChangeSource) -> bool {
        let _ = source;
        true
    }
}

struct ItemInner<C: Codec> {
    key: String,
    codec: C,
    use_memory_store: bool,
    default_value: Option<C::Value>,
    store: Rc<dyn LocalStore>,
    bridge: ChangeBridge,
}

/// Typed accessor for one key. Clones share the same configuration.
pub struct LocalItem<C: Codec> {
    inner: Rc<ItemInner<C>>,
}

impl<C: Codec> Clone for LocalItem<C> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<C: Codec> fmt::Debug for LocalItem<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalItem")
            .field("key", &self.inner.key)
            .field("use_memory_store", &self.inner.use_memory_store)
            .field("has_default", &self.inner.default_value.is_some())
            .finish()
    }
}

impl<C: Codec> LocalItem<C> {
    /// Creates an accessor for `key` on `host`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidDefault`] when the default value does not decode back
    /// through `codec`.
    pub fn new(
        host: &LocalItemHost,
        key: impl Into<String>,
        codec: C,
        options: LocalItemOptions<C::Value>,
    ) -> Result<Self, ConfigError> {
        let key = key.into();
        if let Some(default_value) = &options.default_value {
            if let LocalValue::Invalid(err) = codec.materialize(default_value) {
                return Err(ConfigError::InvalidDefault {
                    key,
                    reason: err.to_string(),
                });
            }
        }

        Ok(Self {
            inner: Rc::new(ItemInner {
                store: host.store(options.use_memory_store),
                bridge: host.bridge().clone(),
                key,
                codec,
                use_memory_store: options.use_memory_store,
                default_value: options.default_value,
            }),
        })
    }

    /// Key of the stored entry.
    pub fn key(&self) -> &str {
        &self.inner.key
    }

    /// Codec used for this entry.
    pub fn codec(&self) -> &C {
        &self.inner.codec
    }

    /// Whether the accessor targets the volatile store.
    pub fn uses_memory_store(&self) -> bool {
        self.inner.use_memory_store
    }

    /// Reads the entry from the selected store.
    ///
    /// A missing entry materializes the default through the codec, so it reads exactly like a
    /// written value. An unreachable store reads as [`LocalValue::Absent`], default or not.
    pub fn read(&self) -> LocalValue<C::Error, C::Value> {
        let inner = &self.inner;
        let raw = match inner.store.get_item(&inner.key) {
            Ok(raw) => raw,
            Err(err) => {
                logging::warn!("local item `{}` read failed: {err}", inner.key);
                return LocalValue::Absent;
            }
        };

        match (raw, &inner.default_value) {
            (Some(raw), _) => inner.codec.decode(&raw),
            (None, Some(default_value)) => inner.codec.materialize(default_value),
            (None, None) => LocalValue::Absent,
        }
    }

    /// Stores `value`, or removes the entry for [`ValidLocalValue::Absent`].
    ///
    /// # Errors
    ///
    /// Returns an error when encoding or the store operation fails.
    pub fn write(&self, value: ValidLocalValue<C::Value>) -> Result<(), LocalItemError> {
        value.fold2(|| self.remove(), |value| self.set(&value))
    }

    /// Encodes and stores `value`, then emits a same-context change.
    ///
    /// # Errors
    ///
    /// Returns an error when encoding or the store write fails.
    pub fn set(&self, value: &C::Value) -> Result<(), LocalItemError> {
        let inner = &self.inner;
        let raw = inner
            .codec
            .encode(value)
            .map_err(|err| LocalItemError::Encode {
                key: inner.key.clone(),
                reason: err.to_string(),
            })?;
        let result = inner
            .store
            .set_item(&inner.key, &raw)
            .map_err(|reason| LocalItemError::Store {
                key: inner.key.clone(),
                reason,
            });
        inner.bridge.notify_local(&inner.key);
        result
    }

    /// Removes the stored entry, then emits a same-context change.
    ///
    /// # Errors
    ///
    /// Returns an error when the store removal fails.
    pub fn remove(&self) -> Result<(), LocalItemError> {
        let inner = &self.inner;
        let result = inner
            .store
            .remove_item(&inner.key)
            .map_err(|reason| LocalItemError::Store {
                key: inner.key.clone(),
                reason,
            });
        inner.bridge.notify_local(&inner.key);
        result
    }
}

impl<C> LocalItem<C>
where
    C: Codec + 'static,
    C::Value: 'static,
    C::Error: 'static,
{
    /// Activates a cached, change-driven view of this entry.
    pub fn watch(
        &self,
        on_change: impl Fn(&LocalValue<C::Error, C::Value>) + 'static,
    ) -> LocalItemWatch<Self> {
        LocalItemWatch::new(self.key(), self.clone(), &self.inner.bridge, on_change)
    }
}

impl<C: Codec> ItemAccess for LocalItem<C> {
    type Value = C::Value;
    type Error = C::Error;

    fn get_value(&self) -> LocalValue<C::Error, C::Value> {
        self.read()
    }

    fn set_value(&self, value: &C::Value) -> Result<(), LocalItemError> {
        self.set(value)
    }

    fn remove_value(&self) -> Result<(), LocalItemError> {
        self.remove()
    }

    fn observes(&self, source: ChangeSource) -> bool {
        !(self.inner.use_memory_store && source == ChangeSource::CrossContext)
    }
}

type ChangeCallback<E, A> = Box<dyn Fn(&LocalValue<E, A>)>;

struct WatchState<A: ItemAccess> {
    key: String,
    access: A,
    cache: RefCell<Rc<LocalValue<A::Error, A::Value>>>,
    on_change: ChangeCallback<A::Error, A::Value>,
    refreshes: Cell<u64>,
}

impl<A: ItemAccess> WatchState<A> {
    fn refresh(&self) {
        let next = Rc::new(self.access.get_value());
        *self.cache.borrow_mut() = next.clone();
        self.refreshes.set(self.refreshes.get().saturating_add(1));
        (self.on_change)(&next);
    }
}

/// Active accessor: the cached value plus its setter, kept in sync through a [`ChangeBridge`].
///
/// The bridge registration is released when the watch is dropped, including during unwinding.
pub struct LocalItemWatch<A: ItemAccess> {
    state: Rc<WatchState<A>>,
    subscription: Subscription,
}

impl<A: ItemAccess> fmt::Debug for LocalItemWatch<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalItemWatch")
            .field("key", &self.state.key)
            .field("subscription", &self.subscription)
            .finish()
    }
}

impl<A> LocalItemWatch<A>
where
    A: ItemAccess + 'static,
    A::Value: 'static,
    A::Error: 'static,
{
    /// Binds `access` under `key` and subscribes to changes of that key on `bridge`.
    ///
    /// The initial value is read immediately; `on_change` runs after every later refresh.
    pub fn new(
        key: impl Into<String>,
        access: A,
        bridge: &ChangeBridge,
        on_change: impl Fn(&LocalValue<A::Error, A::Value>) + 'static,
    ) -> Self {
        let key = key.into();
        let initial = Rc::new(access.get_value());
        let state = Rc::new(WatchState {
            key: key.clone(),
            access,
            cache: RefCell::new(initial),
            on_change: Box::new(on_change),
            refreshes: Cell::new(0),
        });

        let weak: Weak<WatchState<A>> = Rc::downgrade(&state);
        let subscription = bridge.subscribe(key, move |event| {
            let Some(state) = weak.upgrade() else {
                return;
            };
            if state.access.observes(event.source) {
                state.refresh();
            }
        });

        Self {
            state,
            subscription,
        }
    }
}

impl<A: ItemAccess> LocalItemWatch<A> {
    /// Key this watch is bound to.
    pub fn key(&self) -> &str {
        &self.state.key
    }

    /// Shared snapshot of the cached value.
    pub fn snapshot(&self) -> Rc<LocalValue<A::Error, A::Value>> {
        self.state.cache.borrow().clone()
    }

    /// Runs `f` with the cached value.
    pub fn with<R>(&self, f: impl FnOnce(&LocalValue<A::Error, A::Value>) -> R) -> R {
        let snapshot = self.snapshot();
        f(&snapshot)
    }

    /// Writes through the bound primitives and re-derives the cache from the store.
    ///
    /// # Errors
    ///
    /// Returns the write failure; the cache is refreshed either way.
    pub fn set(&self, value: ValidLocalValue<A::Value>) -> Result<(), LocalItemError> {
        let access = &self.state.access;
        let result = value.fold2(|| access.remove_value(), |value| access.set_value(&value));
        self.state.refresh();
        result
    }

    /// Re-reads the entry and publishes it.
    pub fn refresh(&self) {
        self.state.refresh();
    }

    /// Number of refreshes since activation.
    pub fn refresh_count(&self) -> u64 {
        self.state.refreshes.get()
    }

    /// Whether the bridge registration is still held.
    pub fn is_active(&self) -> bool {
        self.subscription.is_active()
    }

    /// Releases the bridge registration now instead of on drop.
    pub fn release(&self) {
        self.subscription.unsubscribe();
    }
}

impl<A> LocalItemWatch<A>
where
    A: ItemAccess,
    A::Value: Clone,
    A::Error: Clone,
{
    /// Clones the cached value.
    pub fn get(&self) -> LocalValue<A::Error, A::Value> {
        self.with(Clone::clone)
    }
}
