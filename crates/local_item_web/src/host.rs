//! Per-context browser host shared by every accessor created in this document.

use leptos::logging;
use local_item::{context_bridge, volatile_store, LocalItemHost};

use crate::{adapters::local_store, events::StorageEventListener};

struct BrowserHost {
    host: LocalItemHost,
    _listener: StorageEventListener,
}

impl BrowserHost {
    fn attach() -> Self {
        let bridge = context_bridge();
        let listener = StorageEventListener::attach(&bridge).unwrap_or_else(|err| {
            logging::warn!("cross-context storage signals disabled: {err}");
            StorageEventListener::detached()
        });
        Self {
            host: LocalItemHost::new(local_store(), volatile_store(), bridge),
            _listener: listener,
        }
    }
}

thread_local! {
    static BROWSER_HOST: BrowserHost = BrowserHost::attach();
}

/// Returns this context's host: `localStorage` (or the stubbed desktop store) as the durable
/// store, the context-local volatile store, and a bridge fed by the `storage` event.
///
/// Every call returns a clone sharing the same stores and bridge, so writes through one
/// accessor refresh every other accessor for the same key in this context.
pub fn browser_host() -> LocalItemHost {
    BROWSER_HOST.with(|browser| browser.host.clone())
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use local_item::{JsonCodec, LocalItemOptions, LocalStore, LocalValue, ValidLocalValue};
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn hosts_in_one_context_share_a_bridge() {
        let first = browser_host();
        let second = browser_host();
        let _subscription = first.bridge().subscribe("shared", |_| {});
        assert_eq!(second.bridge().listener_count("shared"), 1);
    }

    #[test]
    fn volatile_items_work_without_local_storage() {
        let host = browser_host();
        let item = host
            .item(
                "web-volatile",
                JsonCodec::<local_item::SerdeValidator<u8>>::serde(),
                LocalItemOptions::default().with_memory_store(true),
            )
            .expect("item");
        let watch = item.watch(|_| {});
        watch.set(ValidLocalValue::Valid(3)).expect("set");
        assert_eq!(watch.get(), LocalValue::Valid(3));
        assert_eq!(host.durable().get_item("web-volatile").expect("get"), None);
        watch.set(ValidLocalValue::Absent).expect("remove");
    }
}
