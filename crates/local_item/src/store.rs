//! Raw string key/value store contracts and in-process adapters.

use std::{cell::RefCell, collections::HashMap, rc::Rc};

/// Host service persisting raw string entries by key.
///
/// Calls are synchronous; backend failures are reported as strings.
pub trait LocalStore {
    /// Loads the raw entry for `key`.
    fn get_item(&self, key: &str) -> Result<Option<String>, String>;

    /// Stores the raw entry for `key`, replacing any previous value.
    fn set_item(&self, key: &str, raw: &str) -> Result<(), String>;

    /// Removes the entry for `key`. Removing a missing entry succeeds.
    fn remove_item(&self, key: &str) -> Result<(), String>;
}

#[derive(Debug, Clone, Copy, Default)]
/// No-op store for targets without persistent storage and baseline tests.
pub struct NoopLocalStore;

impl LocalStore for NoopLocalStore {
    fn get_item(&self, _key: &str) -> Result<Option<String>, String> {
        Ok(None)
    }

    fn set_item(&self, _key: &str, _raw: &str) -> Result<(), String> {
        Ok(())
    }

    fn remove_item(&self, _key: &str) -> Result<(), String> {
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
/// In-memory store keyed by string. Clones share the same entries.
pub struct MemoryLocalStore {
    inner: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryLocalStore {
    /// Returns the stored keys in sorted order.
    pub fn keys(&self) -> Vec<String> {
        let mut keys = self.inner.borrow().keys().cloned().collect::<Vec<_>>();
        keys.sort();
        keys
    }
}

impl LocalStore for MemoryLocalStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, String> {
        Ok(self.inner.borrow().get(key).cloned())
    }

    fn set_item(&self, key: &str, raw: &str) -> Result<(), String> {
        self.inner
            .borrow_mut()
            .insert(key.to_string(), raw.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), String> {
        self.inner.borrow_mut().remove(key);
        Ok(())
    }
}

impl<S: LocalStore + ?Sized> LocalStore for Rc<S> {
    fn get_item(&self, key: &str) -> Result<Option<String>, String> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, raw: &str) -> Result<(), String> {
        (**self).set_item(key, raw)
    }

    fn remove_item(&self, key: &str) -> Result<(), String> {
        (**self).remove_item(key)
    }
}

thread_local! {
    static VOLATILE_STORE: MemoryLocalStore = MemoryLocalStore::default();
}

/// Returns the volatile store of the current execution context (thread).
///
/// Entries live as long as the thread and are never observable from another context.
pub fn volatile_store() -> MemoryLocalStore {
    VOLATILE_STORE.with(|store| store.clone())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn memory_store_round_trip_overwrite_and_remove() {
        let store = MemoryLocalStore::default();
        let store_obj: &dyn LocalStore = &store;

        store_obj.set_item("theme", "\"dark\"").expect("set");
        store_obj.set_item("theme", "\"light\"").expect("overwrite");
        store_obj.set_item("layout", "{}").expect("set");
        assert_eq!(
            store_obj.get_item("theme").expect("get"),
            Some("\"light\"".to_string())
        );
        assert_eq!(store.keys(), vec!["layout".to_string(), "theme".to_string()]);

        store_obj.remove_item("theme").expect("remove");
        store_obj.remove_item("theme").expect("remove missing");
        assert_eq!(store_obj.get_item("theme").expect("get"), None);
    }

    #[test]
    fn memory_store_clones_share_entries() {
        let store = MemoryLocalStore::default();
        let clone = store.clone();
        clone.set_item("k", "1").expect("set");
        assert_eq!(store.get_item("k").expect("get"), Some("1".to_string()));
    }

    #[test]
    fn volatile_store_is_shared_within_a_thread_only() {
        volatile_store().set_item("volatile.test", "1").expect("set");
        assert_eq!(
            volatile_store().get_item("volatile.test").expect("get"),
            Some("1".to_string())
        );

        let seen_elsewhere = std::thread::spawn(|| {
            volatile_store()
                .get_item("volatile.test")
                .expect("get")
                .is_some()
        })
        .join()
        .expect("join");
        assert!(!seen_elsewhere);
        volatile_store().remove_item("volatile.test").expect("cleanup");
    }

    #[test]
    fn noop_store_is_empty_and_successful() {
        let store = NoopLocalStore;
        store.set_item("k", "v").expect("set");
        assert_eq!(store.get_item("k").expect("get"), None);
        store.remove_item("k").expect("remove");
    }
}
