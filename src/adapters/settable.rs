// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mutable in-memory config.
//!
//! [`SettableConfig`] is the base mutation point of a config tree. Its
//! properties live in an immutable map that is replaced atomically on every
//! write, so readers never observe a half-applied bulk update. Each write
//! notifies listeners after the new map is published.

use crate::domain::{ConfigCore, PropertyChange};
use crate::ports::{Config, Keys};
use arc_swap::ArcSwap;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

static DEFAULT_NAME: &str = "settable";

/// An in-memory config supporting set and clear operations.
///
/// Keys are enumerated in sorted order.
///
/// # Examples
///
/// ```rust
/// use livecfg::prelude::*;
///
/// let config = SettableConfig::with_name("overrides");
/// config.set_property("feature.enabled", true);
/// assert_eq!(config.get_boolean("feature.enabled").unwrap(), Some(true));
///
/// config.clear_property("feature.enabled");
/// assert!(!config.contains_key("feature.enabled"));
/// ```
pub struct SettableConfig {
    core: ConfigCore,
    props: ArcSwap<BTreeMap<String, String>>,
}

impl SettableConfig {
    /// Creates an empty config named `settable`.
    pub fn new() -> Self {
        Self::with_name(DEFAULT_NAME)
    }

    /// Creates an empty config with the given name.
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            core: ConfigCore::new(name),
            props: ArcSwap::from_pointee(BTreeMap::new()),
        }
    }

    /// Sets `key` to `value` and fires one change event.
    ///
    /// The event is fired even when the value is unchanged.
    pub fn set_property(&self, key: impl Into<String>, value: impl ToString) {
        let key = key.into();
        let value = value.to_string();
        let mut existed = false;
        self.props.rcu(|current| {
            let mut next = BTreeMap::clone(current);
            existed = next.insert(key.clone(), value.clone()).is_some();
            next
        });
        let change = if existed {
            PropertyChange::updated(key, value)
        } else {
            PropertyChange::added(key, value)
        };
        self.core.fire_config_updated(self, &change);
    }

    /// Sets every pair in `properties` atomically, then fires one change
    /// event per key in key order.
    pub fn set_properties<I, K, V>(&self, properties: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToString,
    {
        let updates: BTreeMap<String, String> = properties
            .into_iter()
            .map(|(k, v)| (k.into(), v.to_string()))
            .collect();
        if updates.is_empty() {
            return;
        }

        let mut changes = Vec::with_capacity(updates.len());
        self.props.rcu(|current| {
            changes.clear();
            let mut next = BTreeMap::clone(current);
            for (key, value) in &updates {
                let change = match next.insert(key.clone(), value.clone()) {
                    Some(_) => PropertyChange::updated(key.clone(), value.clone()),
                    None => PropertyChange::added(key.clone(), value.clone()),
                };
                changes.push(change);
            }
            next
        });
        for change in &changes {
            self.core.fire_config_updated(self, change);
        }
    }

    /// Removes `key`. Fires a removal event only if the key was present.
    ///
    /// Returns the previous value.
    pub fn clear_property(&self, key: &str) -> Option<String> {
        let mut previous = None;
        self.props.rcu(|current| {
            previous = current.get(key).cloned();
            if previous.is_none() {
                return Arc::clone(current);
            }
            let mut next = BTreeMap::clone(current);
            next.remove(key);
            Arc::new(next)
        });
        if previous.is_some() {
            self.core
                .fire_config_updated(self, &PropertyChange::removed(key));
        }
        previous
    }

    /// Removes every key, firing one removal event per key that was present.
    pub fn clear(&self) {
        let removed = self.props.swap(Arc::new(BTreeMap::new()));
        for key in removed.keys() {
            self.core
                .fire_config_updated(self, &PropertyChange::removed(key.clone()));
        }
    }

    /// Number of keys currently set.
    pub fn len(&self) -> usize {
        self.props.load().len()
    }
}

impl Default for SettableConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl Config for SettableConfig {
    fn core(&self) -> &ConfigCore {
        &self.core
    }

    fn get_raw_property_uninstrumented(&self, key: &str) -> Option<String> {
        self.props.load().get(key).cloned()
    }

    fn keys(&self) -> Keys {
        self.props.load().keys().cloned().collect()
    }

    fn for_each_property_uninstrumented(&self, f: &mut dyn FnMut(&str, &str)) {
        for (key, value) in self.props.load_full().iter() {
            f(key, value);
        }
    }

    fn is_empty(&self) -> bool {
        self.props.load().is_empty()
    }
}

impl fmt::Debug for SettableConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SettableConfig")
            .field("name", &self.name())
            .field("len", &self.len())
            .finish()
    }
}
