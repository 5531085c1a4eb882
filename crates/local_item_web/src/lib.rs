//! Browser (`wasm32`) wiring for [`local_item`].
//!
//! Provides the `localStorage` durable store, the `storage` event listener that feeds
//! cross-context signals into a [`local_item::ChangeBridge`], and [`browser_host`], the shared
//! per-document host. Off `wasm32` every piece degrades to an inert fallback so native tests
//! and headless builds link.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

/// Compile-time host-strategy selection and the durable-store adapter.
pub mod adapters;
pub mod events;
pub mod host;
pub mod storage;

pub use adapters::{
    host_strategy_name, local_store, selected_host_strategy, HostStrategy, LocalStoreAdapter,
};
pub use events::StorageEventListener;
pub use host::browser_host;
pub use storage::WebLocalStorage;
