use local_item::{LocalStore, NoopLocalStore};

use crate::WebLocalStorage;

#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Compile-time selected durable-store strategy.
pub enum HostStrategy {
    /// `window.localStorage`.
    Browser,
    /// Placeholder store for desktop shells without a web storage area.
    DesktopStub,
}

/// Returns the compile-time selected host strategy for the active build.
pub const fn selected_host_strategy() -> HostStrategy {
    #[cfg(feature = "desktop-host-stub")]
    {
        HostStrategy::DesktopStub
    }

    #[cfg(not(feature = "desktop-host-stub"))]
    {
        HostStrategy::Browser
    }
}

/// Returns the selected host strategy as a stable string token.
pub fn host_strategy_name() -> &'static str {
    match selected_host_strategy() {
        HostStrategy::Browser => "browser",
        HostStrategy::DesktopStub => "desktop-stub",
    }
}

/// Adapter enum that erases the concrete durable backend behind [`LocalStore`].
#[derive(Debug, Clone, Copy)]
pub enum LocalStoreAdapter {
    /// Browser `localStorage`.
    Browser(WebLocalStorage),
    /// No-op fallback used when the desktop host is stubbed.
    DesktopStub(NoopLocalStore),
}

impl LocalStore for LocalStoreAdapter {
    fn get_item(&self, key: &str) -> Result<Option<String>, String> {
        match self {
            Self::Browser(store) => store.get_item(key),
            Self::DesktopStub(store) => store.get_item(key),
        }
    }

    fn set_item(&self, key: &str, raw: &str) -> Result<(), String> {
        match self {
            Self::Browser(store) => store.set_item(key, raw),
            Self::DesktopStub(store) => store.set_item(key, raw),
        }
    }

    fn remove_item(&self, key: &str) -> Result<(), String> {
        match self {
            Self::Browser(store) => store.remove_item(key),
            Self::DesktopStub(store) => store.remove_item(key),
        }
    }
}

/// Builds the durable-store adapter for the compile-time selected host strategy.
pub fn local_store() -> LocalStoreAdapter {
    match selected_host_strategy() {
        HostStrategy::Browser => LocalStoreAdapter::Browser(WebLocalStorage),
        HostStrategy::DesktopStub => LocalStoreAdapter::DesktopStub(NoopLocalStore),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_name_matches_selected_strategy() {
        let expected = if cfg!(feature = "desktop-host-stub") {
            "desktop-stub"
        } else {
            "browser"
        };
        assert_eq!(host_strategy_name(), expected);
    }

    #[test]
    fn adapter_variant_follows_strategy() {
        match (selected_host_strategy(), local_store()) {
            (HostStrategy::Browser, LocalStoreAdapter::Browser(_))
            | (HostStrategy::DesktopStub, LocalStoreAdapter::DesktopStub(_)) => {}
            (strategy, adapter) => panic!("{strategy:?} built {adapter:?}"),
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn native_adapter_reads_nothing() {
        let store = local_store();
        store.set_item("k", "v").expect("set");
        assert_eq!(store.get_item("k").expect("get"), None);
    }
}
