//! Leptos bindings for [`local_item`]: each accessor becomes a read signal plus a setter callback.
//!
//! The bridge registration behind a binding is released when the owning reactive scope is
//! cleaned up.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

use std::{collections::BTreeMap, rc::Rc};

use leptos::*;
use local_item::{
    ChangeBridge, Codec, ItemAccess, LocalItem, LocalItemWatch, LocalValue, ValidLocalValue,
};

/// Reactive view of one entry and the callback that writes it.
pub type LocalItemSignal<E, A> = (ReadSignal<LocalValue<E, A>>, Callback<ValidLocalValue<A>>);

/// Name a hook for `key` is published under: `fooBar` becomes `useFooBar`.
pub fn hook_name(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => format!("use{}{}", first.to_uppercase(), chars.as_str()),
        None => "use".to_string(),
    }
}

type ChangeHandler<E, A> = Box<dyn Fn(&LocalValue<E, A>)>;

fn bind<A>(
    activate: impl FnOnce(ChangeHandler<A::Error, A::Value>) -> LocalItemWatch<A>,
) -> LocalItemSignal<A::Error, A::Value>
where
    A: ItemAccess + 'static,
    A::Value: Clone + 'static,
    A::Error: Clone + 'static,
{
    let value = create_rw_signal(LocalValue::Absent);
    let watch = Rc::new(activate(Box::new(move |next| {
        let _ = value.try_set(next.clone());
    })));
    value.set_untracked(watch.get());

    on_cleanup({
        let watch = watch.clone();
        move || watch.release()
    });

    let setter = Callback::new(move |next: ValidLocalValue<A::Value>| {
        if let Err(err) = watch.set(next) {
            logging::warn!("local item write failed: {err}");
        }
    });

    (value.read_only(), setter)
}

/// Binds an accessor to a signal that follows every change of its key on the accessor's host.
pub fn use_local_item<C>(item: &LocalItem<C>) -> LocalItemSignal<C::Error, C::Value>
where
    C: Codec + 'static,
    C::Value: Clone + 'static,
    C::Error: Clone + 'static,
{
    bind(|on_change| item.watch(on_change))
}

/// Binds caller-supplied primitives for `key` to a signal driven by `bridge`.
pub fn use_local_access<A>(
    key: impl Into<String>,
    access: A,
    bridge: &ChangeBridge,
) -> LocalItemSignal<A::Error, A::Value>
where
    A: ItemAccess + 'static,
    A::Value: Clone + 'static,
    A::Error: Clone + 'static,
{
    let key = key.into();
    bind(|on_change| LocalItemWatch::new(key, access, bridge, on_change))
}

/// Binds every accessor of a family, keyed by [`hook_name`].
pub fn use_local_items<C>(
    items: &BTreeMap<String, LocalItem<C>>,
) -> BTreeMap<String, LocalItemSignal<C::Error, C::Value>>
where
    C: Codec + 'static,
    C::Value: Clone + 'static,
    C::Error: Clone + 'static,
{
    items
        .iter()
        .map(|(key, item)| (hook_name(key), use_local_item(item)))
        .collect()
}

/// Binds the per-key primitives of an existing store instance, keyed by [`hook_name`].
///
/// Every binding listens on `bridge`; the primitives are expected to signal their own writes
/// there.
pub fn use_local_access_items<A, I, K>(
    bridge: &ChangeBridge,
    items: I,
) -> BTreeMap<String, LocalItemSignal<A::Error, A::Value>>
where
    A: ItemAccess + 'static,
    A::Value: Clone + 'static,
    A::Error: Clone + 'static,
    I: IntoIterator<Item = (K, A)>,
    K: Into<String>,
{
    items
        .into_iter()
        .map(|(key, access)| {
            let key = key.into();
            (hook_name(&key), use_local_access(key, access, bridge))
        })
        .collect()
}
