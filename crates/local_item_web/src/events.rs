//! Wiring of the browser `storage` event into a [`ChangeBridge`].
//!
//! Browsers raise `storage` on every other document of the origin after a `localStorage`
//! write, never on the writing document itself.

use local_item::ChangeBridge;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::{closure::Closure, JsCast};

#[cfg(target_arch = "wasm32")]
struct Registration {
    window: web_sys::Window,
    callback: Closure<dyn FnMut(web_sys::StorageEvent)>,
}

#[cfg(target_arch = "wasm32")]
impl Drop for Registration {
    fn drop(&mut self) {
        let _ = self
            .window
            .remove_event_listener_with_callback("storage", self.callback.as_ref().unchecked_ref());
    }
}

/// Drop-based `storage` event listener forwarding cross-context changes to a bridge.
///
/// A change with no key (`localStorage.clear()` elsewhere) refreshes every watched key.
/// Events for other storage areas are ignored.
pub struct StorageEventListener {
    #[cfg(target_arch = "wasm32")]
    registration: Option<Registration>,
}

impl std::fmt::Debug for StorageEventListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageEventListener")
            .field("attached", &self.is_attached())
            .finish()
    }
}

impl StorageEventListener {
    /// Starts forwarding `storage` events to `bridge`.
    ///
    /// # Errors
    ///
    /// Returns an error when the window is unavailable or the listener cannot be added.
    pub fn attach(bridge: &ChangeBridge) -> Result<Self, String> {
        #[cfg(target_arch = "wasm32")]
        {
            let window = web_sys::window().ok_or_else(|| "window unavailable".to_string())?;
            let local = window.local_storage().ok().flatten();
            let bridge = bridge.clone();
            let callback = Closure::<dyn FnMut(web_sys::StorageEvent)>::wrap(Box::new(
                move |event: web_sys::StorageEvent| {
                    if let (Some(area), Some(local)) = (event.storage_area(), local.as_ref()) {
                        if !js_sys::Object::is(area.as_ref(), local.as_ref()) {
                            return;
                        }
                    }
                    forward(&bridge, event.key());
                },
            ));
            window
                .add_event_listener_with_callback("storage", callback.as_ref().unchecked_ref())
                .map_err(|err| format!("failed to add storage listener: {err:?}"))?;
            Ok(Self {
                registration: Some(Registration { window, callback }),
            })
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = bridge;
            Ok(Self::detached())
        }
    }

    /// Listener that forwards nothing.
    pub fn detached() -> Self {
        Self {
            #[cfg(target_arch = "wasm32")]
            registration: None,
        }
    }

    /// Whether a browser listener is installed.
    pub fn is_attached(&self) -> bool {
        #[cfg(target_arch = "wasm32")]
        {
            self.registration.is_some()
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            false
        }
    }
}

/// Forwards one `storage` event key to `bridge`.
pub fn forward(bridge: &ChangeBridge, key: Option<String>) {
    match key {
        Some(key) => bridge.notify_external(&key),
        None => {
            for key in bridge.registered_keys() {
                bridge.notify_external(&key);
            }
        }
    }
}
