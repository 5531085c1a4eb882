//! Change bridge unifying same-context write signals and cross-context store signals into
//! per-key callbacks.
//!
//! Writes performed through this crate call [`ChangeBridge::notify_local`]. The durable store's
//! native "entry changed" mechanism (for example the browser `storage` event) is wired to
//! [`ChangeBridge::notify_external`]; that mechanism never fires for same-context writes, which
//! is why both sources exist.

use std::{
    cell::{Cell, RefCell},
    collections::BTreeMap,
    fmt,
    rc::Rc,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Origin of a change signal.
pub enum ChangeSource {
    /// A write through this crate in the current execution context.
    SameContext,
    /// A write by another execution context sharing the durable store.
    CrossContext,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// One "this key changed" signal.
pub struct ChangeEvent {
    /// Key of the changed entry.
    pub key: String,
    /// Where the change came from.
    pub source: ChangeSource,
}

impl ChangeEvent {
    /// Builds a same-context event.
    pub fn local(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            source: ChangeSource::SameContext,
        }
    }

    /// Builds a cross-context event.
    pub fn external(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            source: ChangeSource::CrossContext,
        }
    }
}

/// Callback invoked for matching change events.
pub type ChangeListener = Rc<dyn Fn(&ChangeEvent)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// Identifies one registration on a [`ChangeBridge`].
pub struct SubscriptionToken(u64);

struct Registration {
    key: String,
    listener: ChangeListener,
}

#[derive(Default)]
struct BridgeState {
    next_token: u64,
    by_token: BTreeMap<SubscriptionToken, Registration>,
}

/// Shared per-key listener registry. Clones share registrations.
#[derive(Clone, Default)]
pub struct ChangeBridge {
    state: Rc<RefCell<BridgeState>>,
}

impl fmt::Debug for ChangeBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("ChangeBridge")
            .field("registrations", &state.by_token.len())
            .finish()
    }
}

impl ChangeBridge {
    /// Creates an isolated bridge.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `listener` for `key` and returns its token.
    ///
    /// The registration lives until [`ChangeBridge::unsubscribe`] is called with the token.
    pub fn register(
        &self,
        key: impl Into<String>,
        listener: impl Fn(&ChangeEvent) + 'static,
    ) -> SubscriptionToken {
        let mut state = self.state.borrow_mut();
        state.next_token = state.next_token.saturating_add(1);
        let token = SubscriptionToken(state.next_token);
        state.by_token.insert(
            token,
            Registration {
                key: key.into(),
                listener: Rc::new(listener),
            },
        );
        token
    }

    /// Registers `listener` for `key` and returns a drop-based handle.
    pub fn subscribe(
        &self,
        key: impl Into<String>,
        listener: impl Fn(&ChangeEvent) + 'static,
    ) -> Subscription {
        let token = self.register(key, listener);
        Subscription {
            bridge: self.clone(),
            token,
            active: Cell::new(true),
        }
    }

    /// Removes exactly the registration identified by `token`.
    ///
    /// Returns `false` when it was already removed.
    pub fn unsubscribe(&self, token: SubscriptionToken) -> bool {
        self.state.borrow_mut().by_token.remove(&token).is_some()
    }

    /// Emits a same-context change for `key`.
    pub fn notify_local(&self, key: &str) {
        self.notify(&ChangeEvent::local(key));
    }

    /// Emits a cross-context change for `key`.
    pub fn notify_external(&self, key: &str) {
        self.notify(&ChangeEvent::external(key));
    }

    /// Invokes every listener registered for `event.key`.
    ///
    /// Listeners may write, subscribe, or unsubscribe while running. A registration removed
    /// during dispatch is not invoked afterwards.
    pub fn notify(&self, event: &ChangeEvent) {
        let matching = self
            .state
            .borrow()
            .by_token
            .iter()
            .filter(|(_, registration)| registration.key == event.key)
            .map(|(token, registration)| (*token, registration.listener.clone()))
            .collect::<Vec<_>>();

        for (token, listener) in matching {
            if self.is_registered(token) {
                listener(event);
            }
        }
    }

    /// Returns whether `token` is still registered.
    pub fn is_registered(&self, token: SubscriptionToken) -> bool {
        self.state.borrow().by_token.contains_key(&token)
    }

    /// Returns the distinct keys that currently have registrations, sorted.
    pub fn registered_keys(&self) -> Vec<String> {
        let mut keys = self
            .state
            .borrow()
            .by_token
            .values()
            .map(|registration| registration.key.clone())
            .collect::<Vec<_>>();
        keys.sort();
        keys.dedup();
        keys
    }

    /// Returns the number of registrations for `key`.
    pub fn listener_count(&self, key: &str) -> usize {
        self.state
            .borrow()
            .by_token
            .values()
            .filter(|registration| registration.key == key)
            .count()
    }
}

thread_local! {
    static CONTEXT_BRIDGE: ChangeBridge = ChangeBridge::new();
}

/// Returns the change bridge of the current execution context (thread).
///
/// Pairs with [`crate::store::volatile_store`]: every host sharing that store must share this
/// bridge so writes reach every watcher of the key.
pub fn context_bridge() -> ChangeBridge {
    CONTEXT_BRIDGE.with(|bridge| bridge.clone())
}

/// Drop-based registration handle returned by [`ChangeBridge::subscribe`].
pub struct Subscription {
    bridge: ChangeBridge,
    token: SubscriptionToken,
    active: Cell<bool>,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("token", &self.token)
            .field("active", &self.active.get())
            .finish()
    }
}

impl Subscription {
    /// Whether the registration is still held by this handle.
    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    /// Unregisters the listener if it is still active.
    pub fn unsubscribe(&self) {
        if self.active.replace(false) {
            self.bridge.unsubscribe(self.token);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn recorder() -> (Rc<RefCell<Vec<ChangeEvent>>>, impl Fn(&ChangeEvent) + 'static) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        (seen, move |event: &ChangeEvent| sink.borrow_mut().push(event.clone()))
    }

    #[test]
    fn both_sources_reach_listeners_for_the_key() {
        let bridge = ChangeBridge::new();
        let (seen, listener) = recorder();
        let _subscription = bridge.subscribe("theme", listener);

        bridge.notify_local("theme");
        bridge.notify_external("theme");
        bridge.notify_local("layout");

        assert_eq!(
            *seen.borrow(),
            vec![ChangeEvent::local("theme"), ChangeEvent::external("theme")]
        );
    }

    #[test]
    fn subscriptions_for_one_key_are_independent() {
        let bridge = ChangeBridge::new();
        let (first_seen, first) = recorder();
        let (second_seen, second) = recorder();
        let first_token = bridge.register("k", first);
        let _second = bridge.subscribe("k", second);

        bridge.notify_local("k");
        assert!(bridge.unsubscribe(first_token));
        assert!(!bridge.unsubscribe(first_token));
        bridge.notify_local("k");

        assert_eq!(first_seen.borrow().len(), 1);
        assert_eq!(second_seen.borrow().len(), 2);
    }

    #[test]
    fn repeated_signals_are_not_deduplicated() {
        let bridge = ChangeBridge::new();
        let (seen, listener) = recorder();
        let _subscription = bridge.subscribe("k", listener);
        bridge.notify_local("k");
        bridge.notify_local("k");
        assert_eq!(seen.borrow().len(), 2);
    }

    #[test]
    fn dropping_the_handle_unregisters() {
        let bridge = ChangeBridge::new();
        let (seen, listener) = recorder();
        let subscription = bridge.subscribe("k", listener);
        assert_eq!(bridge.listener_count("k"), 1);
        assert_eq!(bridge.registered_keys(), vec!["k".to_string()]);
        drop(subscription);
        assert_eq!(bridge.listener_count("k"), 0);
        bridge.notify_local("k");
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn listener_removed_during_dispatch_does_not_fire() {
        let bridge = ChangeBridge::new();
        let (seen, listener) = recorder();
        let victim: Rc<RefCell<Option<SubscriptionToken>>> = Rc::new(RefCell::new(None));

        let remover = {
            let bridge = bridge.clone();
            let victim = victim.clone();
            move |_: &ChangeEvent| {
                if let Some(token) = victim.borrow_mut().take() {
                    bridge.unsubscribe(token);
                }
            }
        };
        let _remover = bridge.subscribe("k", remover);
        *victim.borrow_mut() = Some(bridge.register("k", listener));

        bridge.notify_local("k");
        assert!(seen.borrow().is_empty());
        assert_eq!(bridge.listener_count("k"), 1);
    }

    #[test]
    fn context_bridge_is_shared_within_a_thread_only() {
        let (seen, listener) = recorder();
        let _subscription = context_bridge().subscribe("ctx", listener);
        context_bridge().notify_local("ctx");
        assert_eq!(seen.borrow().len(), 1);

        let seen_elsewhere =
            std::thread::spawn(|| context_bridge().listener_count("ctx")).join().expect("join");
        assert_eq!(seen_elsewhere, 0);
    }

    #[test]
    fn listeners_may_emit_reentrantly() {
        let bridge = ChangeBridge::new();
        let (seen, listener) = recorder();
        let _downstream = bridge.subscribe("b", listener);
        let _upstream = bridge.subscribe("a", {
            let bridge = bridge.clone();
            move |_: &ChangeEvent| bridge.notify_local("b")
        });

        bridge.notify_external("a");
        assert_eq!(*seen.borrow(), vec![ChangeEvent::local("b")]);
    }
}
