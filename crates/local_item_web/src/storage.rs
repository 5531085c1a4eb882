//! `localStorage`-backed implementation of [`local_item::LocalStore`].

use local_item::LocalStore;

#[derive(Debug, Clone, Copy, Default)]
/// Durable store backed by `window.localStorage`, shared by every tab of the origin.
///
/// Off `wasm32` the store is inert: reads find nothing and writes are accepted.
pub struct WebLocalStorage;

#[cfg(target_arch = "wasm32")]
fn local_storage() -> Result<web_sys::Storage, String> {
    web_sys::window()
        .and_then(|w| w.local_storage().ok().flatten())
        .ok_or_else(|| "localStorage unavailable".to_string())
}

impl WebLocalStorage {
    /// Returns whether `localStorage` can be reached in this context.
    pub fn is_available(self) -> bool {
        #[cfg(target_arch = "wasm32")]
        {
            local_storage().is_ok()
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            false
        }
    }
}

impl LocalStore for WebLocalStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, String> {
        #[cfg(target_arch = "wasm32")]
        {
            local_storage()?
                .get_item(key)
                .map_err(|e| format!("localStorage get_item failed: {e:?}"))
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = key;
            Ok(None)
        }
    }

    fn set_item(&self, key: &str, raw: &str) -> Result<(), String> {
        #[cfg(target_arch = "wasm32")]
        {
            local_storage()?
                .set_item(key, raw)
                .map_err(|e| format!("localStorage set_item failed: {e:?}"))
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = (key, raw);
            Ok(())
        }
    }

    fn remove_item(&self, key: &str) -> Result<(), String> {
        #[cfg(target_arch = "wasm32")]
        {
            local_storage()?
                .remove_item(key)
                .map_err(|e| format!("localStorage remove_item failed: {e:?}"))
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = key;
            Ok(())
        }
    }
}
