//! Typed, codec-validated accessors over a string key/value store, kept in sync with local
//! writes, writes by other consumers in the same context, and writes by other contexts.
//!
//! The crate is the host-agnostic core: tri-state values, codecs, store contracts, the change
//! bridge, the per-key accessor engine, and the family factory. Browser bindings live in
//! `local_item_web` and the reactive signal layer lives in `local_item_leptos`.
//!
//! # Example
//!
//! ```rust
//! use local_item::{
//!     JsonCodec, LocalItemHost, LocalItemOptions, LocalValue, SerdeValidator, ValidLocalValue,
//! };
//!
//! let host = LocalItemHost::memory();
//! let volume = host
//!     .item(
//!         "volume",
//!         JsonCodec::<SerdeValidator<u8>>::serde(),
//!         LocalItemOptions::default().with_default(5),
//!     )
//!     .expect("default value is valid");
//!
//! let watch = volume.watch(|_| {});
//! assert_eq!(watch.get(), LocalValue::Valid(5));
//! watch.set(ValidLocalValue::Valid(9)).expect("write");
//! assert_eq!(volume.read(), LocalValue::Valid(9));
//! ```

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod bridge;
pub mod codec;
pub mod error;
pub mod family;
pub mod host;
pub mod item;
pub mod store;
pub mod value;

pub use bridge::{
    context_bridge, ChangeBridge, ChangeEvent, ChangeListener, ChangeSource, Subscription,
    SubscriptionToken,
};
pub use codec::{Codec, CodecError, JsonCodec, RefineError, Refined, SerdeValidator, Validator};
pub use error::{ConfigError, LocalItemError};
pub use family::{build_local_items, watch_local_items, LocalItemFamily, StorageOptions};
pub use host::LocalItemHost;
pub use item::{ItemAccess, LocalItem, LocalItemOptions, LocalItemWatch};
pub use store::{volatile_store, LocalStore, MemoryLocalStore, NoopLocalStore};
pub use value::{LocalValue, ValidLocalValue};
