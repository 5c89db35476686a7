// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed, auto-updating property handles.
//!
//! A [`PropertyFactory`] wraps one config and hands out [`Property`] handles
//! for its keys. All handles for one key share a single cache node, and that
//! node is the only listener the factory registers on the config for the
//! key, however many handles (of whatever types or defaults) exist.
//!
//! A handle never caches a decoded value: [`Property::get`] re-reads and
//! re-decodes the current value every time. The node only remembers the last
//! raw value so that handle listeners run when the value actually changed.

use crate::domain::{ListenerId, ListenerRegistry, PropertyChange};
use crate::ports::{Config, ConfigExt, ConfigListener};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::any::Any;
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::{debug, trace};

type NodeCallback = dyn Fn(&KeyNode) + Send + Sync;

/// Per-key subscription shared by every handle for that key.
struct KeyNode {
    key: String,
    config: Arc<dyn Config>,
    last: Mutex<Option<String>>,
    callbacks: ListenerRegistry<NodeCallback>,
    subscription: ListenerId,
}

impl KeyNode {
    fn new(config: Arc<dyn Config>, key: &str) -> Arc<Self> {
        let node = Arc::new_cyclic(|node| {
            let subscription = config.add_listener(Arc::new(KeyForwarder {
                node: node.clone(),
            }));
            debug!(config = config.name(), key, "Subscribed property node");
            let last = config.get_raw_property_uninstrumented(key);
            Self {
                key: key.to_string(),
                config,
                last: Mutex::new(last),
                callbacks: ListenerRegistry::new(),
                subscription,
            }
        });
        // Events fired before the node was reachable were dropped.
        node.refresh();
        node
    }

    fn read<T: Any>(&self, default: T) -> T {
        self.config.get_or::<T>(&self.key, default)
    }

    /// Re-reads the raw value and notifies callbacks if it changed.
    ///
    /// The read happens under `last` so concurrent refreshes record values in
    /// the order they were observed.
    fn refresh(&self) {
        {
            let mut last = self.last.lock();
            let current = self.config.get_raw_property_uninstrumented(&self.key);
            if *last == current {
                return;
            }
            *last = current;
        }
        trace!(key = %self.key, callbacks = self.callbacks.len(), "Property changed");
        self.callbacks.for_each(|callback| callback(self));
    }
}

impl Drop for KeyNode {
    fn drop(&mut self) {
        self.config.remove_listener(self.subscription);
    }
}

struct KeyForwarder {
    node: Weak<KeyNode>,
}

impl KeyForwarder {
    fn refresh(&self) {
        if let Some(node) = self.node.upgrade() {
            node.refresh();
        }
    }
}

impl ConfigListener for KeyForwarder {
    fn on_config_added(&self, _config: &dyn Config) {
        self.refresh();
    }

    fn on_config_removed(&self, _config: &dyn Config) {
        self.refresh();
    }

    fn on_config_updated(&self, _config: &dyn Config, change: &PropertyChange) {
        if let Some(node) = self.node.upgrade() {
            if change.key() == node.key {
                node.refresh();
            }
        }
    }
}

/// Hands out cached property handles for one config.
///
/// # Examples
///
/// ```rust
/// use livecfg::prelude::*;
/// use std::sync::Arc;
///
/// let config = Arc::new(SettableConfig::new());
/// let factory = PropertyFactory::new(config.clone());
///
/// let timeout = factory.get_property("timeout").as_integer(30);
/// assert_eq!(timeout.get(), 30);
///
/// config.set_property("timeout", 5);
/// assert_eq!(timeout.get(), 5);
/// ```
pub struct PropertyFactory {
    config: Arc<dyn Config>,
    nodes: DashMap<String, Arc<KeyNode>>,
}

impl PropertyFactory {
    /// Creates a factory over `config`.
    pub fn new(config: Arc<dyn Config>) -> Self {
        Self {
            config,
            nodes: DashMap::new(),
        }
    }

    /// The config the handles read from.
    pub fn config(&self) -> &Arc<dyn Config> {
        &self.config
    }

    /// Starts a handle for `key`; pick the type with one of the builder's
    /// `as_*` methods.
    pub fn get_property(&self, key: &str) -> PropertyBuilder<'_> {
        PropertyBuilder {
            factory: self,
            key: key.to_string(),
        }
    }

    /// Number of keys with a live cache node.
    pub fn cached_keys(&self) -> usize {
        self.nodes.len()
    }

    fn node(&self, key: &str) -> Arc<KeyNode> {
        if let Some(node) = self.nodes.get(key) {
            return Arc::clone(node.value());
        }
        let entry = self
            .nodes
            .entry(key.to_string())
            .or_insert_with(|| KeyNode::new(Arc::clone(&self.config), key));
        Arc::clone(entry.value())
    }
}

impl fmt::Debug for PropertyFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyFactory")
            .field("config", &self.config.name())
            .field("cached_keys", &self.nodes.len())
            .finish()
    }
}

/// Chooses the type and default of a [`Property`].
pub struct PropertyBuilder<'a> {
    factory: &'a PropertyFactory,
    key: String,
}

macro_rules! typed_builders {
    ($($(#[$doc:meta])* $name:ident => $ty:ty;)*) => {
        $(
            $(#[$doc])*
            pub fn $name(self, default: $ty) -> Property<$ty> {
                self.as_type::<$ty>(default)
            }
        )*
    };
}

impl PropertyBuilder<'_> {
    /// A handle decoding the value as `T`, falling back to `default`.
    ///
    /// `T` must be supported by the config's decoder at the time of each
    /// [`get`](Property::get).
    pub fn as_type<T: Any + Clone + Send + Sync>(self, default: T) -> Property<T> {
        Property {
            node: self.factory.node(&self.key),
            default,
        }
    }

    /// A string handle.
    pub fn as_string(self, default: impl Into<String>) -> Property<String> {
        self.as_type::<String>(default.into())
    }

    typed_builders! {
        /// An `i32` handle.
        as_integer => i32;
        /// An `i64` handle.
        as_long => i64;
        /// An `f64` handle.
        as_double => f64;
        /// An `f32` handle.
        as_float => f32;
        /// An `i16` handle.
        as_short => i16;
        /// An `i8` handle.
        as_byte => i8;
        /// A `bool` handle.
        as_boolean => bool;
        /// An `i128` handle.
        as_big_integer => i128;
        /// A decimal handle.
        as_big_decimal => f64;
        /// A comma-separated list handle.
        as_list => Vec<String>;
    }
}

/// A typed view of one key that always reflects the current value.
pub struct Property<T> {
    node: Arc<KeyNode>,
    default: T,
}

impl<T: Any + Clone + Send + Sync> Property<T> {
    /// The current value, or the default if the key is absent or its value
    /// does not decode.
    pub fn get(&self) -> T {
        self.node.read(self.default.clone())
    }

    /// The key this handle reads.
    pub fn key(&self) -> &str {
        &self.node.key
    }

    /// The value returned when the key is absent or invalid.
    pub fn default_value(&self) -> &T {
        &self.default
    }

    /// Calls `listener` with the new value whenever the raw value of the key
    /// changes.
    ///
    /// Listeners run synchronously on the thread that changed the config.
    pub fn add_listener(&self, listener: impl Fn(T) + Send + Sync + 'static) -> ListenerId {
        let default = self.default.clone();
        let callback: Arc<NodeCallback> =
            Arc::new(move |node: &KeyNode| listener(node.read(default.clone())));
        self.node.callbacks.add(callback)
    }

    /// Removes a listener added with [`add_listener`](Property::add_listener).
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.node.callbacks.remove(id)
    }
}

impl<T: Clone> Clone for Property<T> {
    fn clone(&self) -> Self {
        Self {
            node: Arc::clone(&self.node),
            default: self.default.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("key", &self.node.key)
            .field("default", &self.default)
            .finish()
    }
}
