//! Accessor family factory: one independent accessor per key from shared options.

use std::{
    any::{type_name, Any},
    collections::{BTreeMap, BTreeSet},
    fmt,
};

use crate::{
    bridge::ChangeBridge,
    codec::Codec,
    error::ConfigError,
    host::LocalItemHost,
    item::{ItemAccess, LocalItem, LocalItemOptions, LocalItemWatch},
    value::LocalValue,
};

/// Options shared by every accessor of a family.
#[derive(Default)]
pub struct StorageOptions {
    use_memory_store: bool,
    default_values: BTreeMap<String, Box<dyn Any>>,
}

impl fmt::Debug for StorageOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageOptions")
            .field("use_memory_store", &self.use_memory_store)
            .field("default_keys", &self.default_values.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl StorageOptions {
    /// Durable store, no defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects the volatile store for every accessor.
    pub fn with_memory_store(mut self, use_memory_store: bool) -> Self {
        self.use_memory_store = use_memory_store;
        self
    }

    /// Sets the default value for `key`. Its type must match the key's codec.
    pub fn with_default<T: 'static>(mut self, key: impl Into<String>, value: T) -> Self {
        self.default_values.insert(key.into(), Box::new(value));
        self
    }
}

/// Builder deriving accessors one key at a time from shared [`StorageOptions`].
///
/// Call [`LocalItemFamily::finish`] after the last key so unused defaults are reported.
pub struct LocalItemFamily<'h> {
    host: &'h LocalItemHost,
    use_memory_store: bool,
    pending_defaults: BTreeMap<String, Box<dyn Any>>,
    keys: BTreeSet<String>,
}

impl fmt::Debug for LocalItemFamily<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalItemFamily")
            .field("use_memory_store", &self.use_memory_store)
            .field("keys", &self.keys)
            .finish_non_exhaustive()
    }
}

impl<'h> LocalItemFamily<'h> {
    /// Starts a family on `host`.
    pub fn new(host: &'h LocalItemHost, options: StorageOptions) -> Self {
        Self {
            host,
            use_memory_store: options.use_memory_store,
            pending_defaults: options.default_values,
            keys: BTreeSet::new(),
        }
    }

    /// Derives the accessor for `key`, resolving its default from the shared options.
    ///
    /// # Errors
    ///
    /// Returns an error when `key` was already derived, or when its default has the wrong type
    /// or is rejected by `codec`.
    pub fn item<C>(&mut self, key: &str, codec: C) -> Result<LocalItem<C>, ConfigError>
    where
        C: Codec,
        C::Value: 'static,
    {
        if !self.keys.insert(key.to_string()) {
            return Err(ConfigError::DuplicateKey {
                key: key.to_string(),
            });
        }

        let default_value = match self.pending_defaults.remove(key) {
            None => None,
            Some(value) => Some(*value.downcast::<C::Value>().map_err(|_| {
                ConfigError::DefaultTypeMismatch {
                    key: key.to_string(),
                    expected: type_name::<C::Value>(),
                }
            })?),
        };

        LocalItem::new(
            self.host,
            key,
            codec,
            LocalItemOptions {
                use_memory_store: self.use_memory_store,
                default_value,
            },
        )
    }

    /// Completes the family.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownDefaultKeys`] when defaults were given for keys that were
    /// never derived.
    pub fn finish(self) -> Result<(), ConfigError> {
        if self.pending_defaults.is_empty() {
            return Ok(());
        }
        Err(ConfigError::UnknownDefaultKeys {
            keys: self.pending_defaults.into_keys().collect(),
        })
    }
}

/// Derives one accessor per entry of `codecs`; the result has exactly the input key set.
///
/// # Errors
///
/// Returns the first configuration fault, see [`LocalItemFamily`].
pub fn build_local_items<C, I, K>(
    host: &LocalItemHost,
    codecs: I,
    options: StorageOptions,
) -> Result<BTreeMap<String, LocalItem<C>>, ConfigError>
where
    C: Codec,
    C::Value: 'static,
    I: IntoIterator<Item = (K, C)>,
    K: Into<String>,
{
    let mut family = LocalItemFamily::new(host, options);
    let mut items = BTreeMap::new();
    for (key, codec) in codecs {
        let key = key.into();
        let item = family.item(&key, codec)?;
        items.insert(key, item);
    }
    family.finish()?;
    Ok(items)
}

/// Activates one watch per entry of an already-assembled store instance.
///
/// Each entry's own get/set/remove primitives are bound under its key; `on_change` receives the
/// key and the refreshed value.
pub fn watch_local_items<A, I, K, F>(
    bridge: &ChangeBridge,
    items: I,
    on_change: F,
) -> BTreeMap<String, LocalItemWatch<A>>
where
    A: ItemAccess + 'static,
    A::Value: 'static,
    A::Error: 'static,
    I: IntoIterator<Item = (K, A)>,
    K: Into<String>,
    F: Fn(&str, &LocalValue<A::Error, A::Value>) + Clone + 'static,
{
    items
        .into_iter()
        .map(|(key, access)| {
            let key = key.into();
            let on_change = on_change.clone();
            let callback_key = key.clone();
            let watch = LocalItemWatch::new(key.clone(), access, bridge, move |value| {
                on_change(&callback_key, value)
            });
            (key, watch)
        })
        .collect()
}

/// Declares a typed family of accessors, one field per key.
///
/// Each field name is the storage key. The generated `build` resolves shared options per key
/// and rejects configuration faults up front.
///
/// ```rust
/// use local_item::{local_items, JsonCodec, LocalItemHost, SerdeValidator, StorageOptions};
///
/// local_items! {
///     pub struct Settings {
///         theme: JsonCodec<SerdeValidator<String>> = JsonCodec::serde(),
///         volume: JsonCodec<SerdeValidator<u8>> = JsonCodec::serde(),
///     }
/// }
///
/// let host = LocalItemHost::memory();
/// let settings = Settings::build(&host, StorageOptions::new().with_default("volume", 7_u8))
///     .expect("valid configuration");
/// assert_eq!(Settings::KEYS, &["theme", "volume"]);
/// assert_eq!(settings.volume.read().into_option(), Some(7));
/// assert!(settings.theme.read().is_absent());
/// ```
#[macro_export]
macro_rules! local_items {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $($field:ident : $codec:ty = $init:expr),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                #[allow(missing_docs)]
                pub $field: $crate::LocalItem<$codec>,
            )+
        }

        impl $name {
            /// Storage keys in declaration order.
            pub const KEYS: &'static [&'static str] = &[$(stringify!($field)),+];

            /// Derives every accessor from shared options.
            ///
            /// # Errors
            ///
            /// Returns the first configuration fault.
            pub fn build(
                host: &$crate::LocalItemHost,
                options: $crate::StorageOptions,
            ) -> ::std::result::Result<Self, $crate::ConfigError> {
                let mut family = $crate::LocalItemFamily::new(host, options);
                let items = Self {
                    $($field: family.item(stringify!($field), $init)?,)+
                };
                family.finish()?;
                Ok(items)
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{codec::SerdeValidator, store::LocalStore, JsonCodec, ValidLocalValue};

    type Counter = JsonCodec<SerdeValidator<u32>>;

    fn counters(keys: &[&str]) -> Vec<(String, Counter)> {
        keys.iter()
            .map(|key| (key.to_string(), JsonCodec::serde()))
            .collect()
    }

    #[test]
    fn build_maps_key_set_bijectively() {
        let host = LocalItemHost::memory();
        let items = build_local_items(&host, counters(&["a", "b", "c"]), StorageOptions::new())
            .expect("build");
        assert_eq!(
            items.keys().cloned().collect::<Vec<_>>(),
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
        assert!(items.iter().all(|(key, item)| item.key() == key));
    }

    #[test]
    fn defaults_resolve_per_key_and_missing_lookup_means_none() {
        let host = LocalItemHost::memory();
        let options = StorageOptions::new().with_default("a", 5_u32);
        let items = build_local_items(&host, counters(&["a", "b"]), options).expect("build");
        assert_eq!(items["a"].read(), LocalValue::Valid(5));
        assert_eq!(items["b"].read(), LocalValue::Absent);
    }

    #[test]
    fn memory_store_flag_applies_to_every_accessor() {
        let host = LocalItemHost::memory();
        let options = StorageOptions::new().with_memory_store(true);
        let items = build_local_items(&host, counters(&["a", "b"]), options).expect("build");
        items["a"].set(&1).expect("set a");
        items["b"].set(&2).expect("set b");

        assert!(items.values().all(LocalItem::uses_memory_store));
        assert_eq!(host.volatile().keys(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(host.durable().get_item("a").expect("get"), None);
    }

    #[test]
    fn default_for_unknown_key_is_rejected() {
        let host = LocalItemHost::memory();
        let options = StorageOptions::new()
            .with_default("a", 1_u32)
            .with_default("zz", 2_u32);
        let err = build_local_items(&host, counters(&["a"]), options).expect_err("unknown key");
        assert_eq!(
            err,
            ConfigError::UnknownDefaultKeys {
                keys: vec!["zz".to_string()]
            }
        );
    }

    #[test]
    fn default_of_wrong_type_is_rejected() {
        let host = LocalItemHost::memory();
        let options = StorageOptions::new().with_default("a", "five".to_string());
        let err = build_local_items(&host, counters(&["a"]), options).expect_err("type mismatch");
        assert!(matches!(err, ConfigError::DefaultTypeMismatch { ref key, .. } if key == "a"));
    }

    #[test]
    fn default_rejected_by_codec_is_reported_at_construction() {
        let host = LocalItemHost::memory();
        let options = StorageOptions::new().with_default("odd", 3_u32);
        let mut family = LocalItemFamily::new(&host, options);
        let err = family
            .item(
                "odd",
                JsonCodec::<SerdeValidator<u32>>::serde().refine("even", |n| n % 2 == 0),
            )
            .expect_err("invalid default");
        assert!(matches!(err, ConfigError::InvalidDefault { ref key, .. } if key == "odd"));
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let host = LocalItemHost::memory();
        let err = build_local_items(&host, counters(&["a", "a"]), StorageOptions::new())
            .expect_err("duplicate");
        assert_eq!(
            err,
            ConfigError::DuplicateKey {
                key: "a".to_string()
            }
        );
    }

    #[test]
    fn watch_local_items_binds_each_entry_under_its_key() {
        let host = LocalItemHost::memory();
        let items = build_local_items(&host, counters(&["a", "b"]), StorageOptions::new())
            .expect("build");
        let changed = Rc::new(RefCell::new(Vec::new()));
        let sink = changed.clone();
        let watches = watch_local_items(host.bridge(), items.clone(), move |key, value| {
            sink.borrow_mut().push((key.to_string(), value.clone()));
        });

        watches["b"].set(ValidLocalValue::Valid(9)).expect("set");
        assert_eq!(watches["b"].get(), LocalValue::Valid(9));
        assert_eq!(watches["a"].get(), LocalValue::Absent);
        assert!(changed.borrow().iter().all(|(key, _)| key == "b"));
        assert_eq!(
            changed.borrow().last(),
            Some(&("b".to_string(), LocalValue::Valid(9)))
        );
        assert_eq!(watches["a"].refresh_count(), 0);
    }
}
