// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ordered aggregation of named child configs.
//!
//! This module provides [`CompositeConfig`], which resolves a key by asking
//! its children in precedence order and returning the first value found. The
//! child list is an immutable vector swapped atomically on every structural
//! change, so lookups never observe a partially applied add or remove.

use crate::domain::{ConfigCore, ConfigError, ListenerId, PropertyChange, Result};
use crate::ports::{Config, ConfigListener, Keys};
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::debug;

#[derive(Clone)]
struct Child {
    name: String,
    config: Arc<dyn Config>,
    subscription: Option<ListenerId>,
}

impl Child {
    fn detach(&self) {
        if let Some(id) = self.subscription {
            self.config.remove_listener(id);
        }
    }
}

/// Re-emits a child's events on the composite.
///
/// Held by the child; points back at the composite weakly so a composite
/// that is no longer referenced can be dropped.
struct ChildForwarder {
    composite: Weak<CompositeConfig>,
}

impl ConfigListener for ChildForwarder {
    fn on_config_added(&self, _child: &dyn Config) {
        if let Some(composite) = self.composite.upgrade() {
            composite.core.fire_config_added(&*composite);
        }
    }

    fn on_config_removed(&self, _child: &dyn Config) {
        if let Some(composite) = self.composite.upgrade() {
            composite.core.fire_config_removed(&*composite);
        }
    }

    fn on_config_updated(&self, _child: &dyn Config, change: &PropertyChange) {
        if let Some(composite) = self.composite.upgrade() {
            composite.core.fire_config_updated(&*composite, change);
        }
    }

    fn on_error(&self, error: &ConfigError, _child: &dyn Config) {
        if let Some(composite) = self.composite.upgrade() {
            composite.core.fire_error(error, &*composite);
        }
    }
}

/// A config layering named children by precedence.
///
/// Children are queried first to last; the first child defining a key wins.
/// If none does, the lookup falls through to the parent, if one is set. The
/// composite shares its children and does not control their lifetime.
///
/// # Examples
///
/// ```rust
/// use livecfg::prelude::*;
/// use std::sync::Arc;
///
/// # fn main() -> livecfg::domain::Result<()> {
/// let overrides = Arc::new(SettableConfig::with_name("overrides"));
/// let defaults = Arc::new(MapConfig::builder().put("port", 80).put("host", "a").build());
///
/// let config = CompositeConfig::builder()
///     .name("app")
///     .with_config("overrides", overrides.clone())?
///     .with_config("defaults", defaults)?
///     .build()?;
///
/// assert_eq!(config.get_integer("port")?, Some(80));
/// overrides.set_property("port", 8080);
/// assert_eq!(config.get_integer("port")?, Some(8080));
/// # Ok(())
/// # }
/// ```
pub struct CompositeConfig {
    core: ConfigCore,
    children: ArcSwap<Vec<Child>>,
    writer: Mutex<()>,
    self_ref: Weak<CompositeConfig>,
}

impl CompositeConfig {
    /// Creates an empty composite.
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        let name = name.into();
        Arc::new_cyclic(|self_ref| Self {
            core: ConfigCore::new(name),
            children: ArcSwap::from_pointee(Vec::new()),
            writer: Mutex::new(()),
            self_ref: self_ref.clone(),
        })
    }

    /// Starts building a composite.
    pub fn builder() -> CompositeConfigBuilder {
        CompositeConfigBuilder::default()
    }

    /// Appends `config` as the lowest-precedence child.
    ///
    /// Fails with [`ConfigError::DuplicateName`] if `name` is taken. Fires one
    /// `on_config_added` on success.
    pub fn add_config(&self, name: impl Into<String>, config: Arc<dyn Config>) -> Result<()> {
        self.insert_at(None, name.into(), config)
    }

    /// Inserts `config` at `position` in precedence order, 0 being the
    /// highest. Positions past the end append.
    pub fn insert_config(
        &self,
        position: usize,
        name: impl Into<String>,
        config: Arc<dyn Config>,
    ) -> Result<()> {
        self.insert_at(Some(position), name.into(), config)
    }

    fn insert_at(
        &self,
        position: Option<usize>,
        name: String,
        config: Arc<dyn Config>,
    ) -> Result<()> {
        {
            let _writer = self.writer.lock();
            let current = self.children.load_full();
            if current.iter().any(|child| child.name == name) {
                return Err(ConfigError::DuplicateName { name });
            }

            let mut next = Vec::clone(&current);
            let index = position.unwrap_or(next.len()).min(next.len());
            debug!(composite = self.name(), child = %name, index, "Adding child config");
            next.insert(
                index,
                Child {
                    name: name.clone(),
                    config: Arc::clone(&config),
                    subscription: None,
                },
            );
            self.children.store(Arc::new(next));
            self.attach(&name, &config);
        }
        self.core.fire_config_added(self);
        Ok(())
    }

    /// Replaces the child named `name`, keeping its precedence, or appends
    /// `config` if there is no such child. Returns the replaced child.
    ///
    /// Fires one `on_config_added`.
    pub fn replace_config(
        &self,
        name: impl Into<String>,
        config: Arc<dyn Config>,
    ) -> Option<Arc<dyn Config>> {
        let name = name.into();
        let replaced = {
            let _writer = self.writer.lock();
            let current = self.children.load_full();
            let mut next = Vec::clone(&current);
            let child = Child {
                name: name.clone(),
                config: Arc::clone(&config),
                subscription: None,
            };
            let replaced = match next.iter().position(|c| c.name == name) {
                Some(index) => Some(std::mem::replace(&mut next[index], child)),
                None => {
                    next.push(child);
                    None
                }
            };
            self.children.store(Arc::new(next));
            self.attach(&name, &config);
            replaced
        };

        if let Some(old) = &replaced {
            old.detach();
        }
        debug!(composite = self.name(), child = %name, "Replaced child config");
        self.core.fire_config_added(self);
        replaced.map(|old| old.config)
    }

    /// Removes the child named `name` and returns it.
    ///
    /// Does nothing if there is no such child. Fires one
    /// `on_config_removed` otherwise.
    pub fn remove_config(&self, name: &str) -> Option<Arc<dyn Config>> {
        let removed = {
            let _writer = self.writer.lock();
            let current = self.children.load_full();
            let index = current.iter().position(|child| child.name == name)?;
            let mut next = Vec::clone(&current);
            let removed = next.remove(index);
            self.children.store(Arc::new(next));
            removed
        };

        removed.detach();
        debug!(composite = self.name(), child = name, "Removed child config");
        self.core.fire_config_removed(self);
        Some(removed.config)
    }

    /// Child names in precedence order.
    pub fn config_names(&self) -> Vec<String> {
        self.children
            .load()
            .iter()
            .map(|child| child.name.clone())
            .collect()
    }

    /// The child named `name`.
    pub fn get_config(&self, name: &str) -> Option<Arc<dyn Config>> {
        self.children
            .load()
            .iter()
            .find(|child| child.name == name)
            .map(|child| Arc::clone(&child.config))
    }

    /// Number of children.
    pub fn child_count(&self) -> usize {
        self.children.load().len()
    }

    /// Subscribes to the already published child `name`. Runs under the
    /// writer lock, so a child event fired during subscription already sees
    /// the child in the list.
    fn attach(&self, name: &str, config: &Arc<dyn Config>) {
        let subscription = config.add_listener(Arc::new(ChildForwarder {
            composite: self.self_ref.clone(),
        }));
        let mut next = Vec::clone(&self.children.load_full());
        if let Some(child) = next.iter_mut().find(|child| child.name == name) {
            child.subscription = Some(subscription);
        }
        self.children.store(Arc::new(next));
    }

    /// Union of the children's keys, each once, in precedence order.
    fn visible_keys(&self) -> Vec<String> {
        let children = self.children.load();
        let mut seen = HashSet::new();
        let mut keys = Vec::new();
        for child in children.iter() {
            for key in child.config.keys() {
                if seen.insert(key.clone()) {
                    keys.push(key);
                }
            }
        }
        keys
    }
}

impl Config for CompositeConfig {
    fn core(&self) -> &ConfigCore {
        &self.core
    }

    fn get_raw_property(&self, key: &str) -> Option<String> {
        let children = self.children.load();
        children
            .iter()
            .find_map(|child| child.config.get_raw_property(key))
            .or_else(|| self.parent().and_then(|parent| parent.get_raw_property(key)))
    }

    fn get_raw_property_uninstrumented(&self, key: &str) -> Option<String> {
        let children = self.children.load();
        children
            .iter()
            .find_map(|child| child.config.get_raw_property_uninstrumented(key))
            .or_else(|| {
                self.parent()
                    .and_then(|parent| parent.get_raw_property_uninstrumented(key))
            })
    }

    fn keys(&self) -> Keys {
        Keys::from(self.visible_keys())
    }

    fn for_each_property(&self, f: &mut dyn FnMut(&str, &str)) {
        for key in self.visible_keys() {
            if let Some(value) = self.get_raw_property(&key) {
                f(&key, &value);
            }
        }
    }

    fn instrumentation_enabled(&self) -> bool {
        self.children
            .load()
            .iter()
            .any(|child| child.config.instrumentation_enabled())
    }

    fn is_empty(&self) -> bool {
        self.children
            .load()
            .iter()
            .all(|child| child.config.is_empty())
    }
}

impl Drop for CompositeConfig {
    fn drop(&mut self) {
        for child in self.children.load().iter() {
            child.detach();
        }
    }
}

impl fmt::Debug for CompositeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeConfig")
            .field("name", &self.name())
            .field("children", &self.config_names())
            .finish()
    }
}

/// Builder for [`CompositeConfig`].
#[derive(Default)]
pub struct CompositeConfigBuilder {
    name: Option<String>,
    children: Vec<(String, Arc<dyn Config>)>,
}

impl CompositeConfigBuilder {
    /// Sets the composite name. Defaults to `composite`.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Appends a child. Children added first take precedence.
    pub fn with_config(
        mut self,
        name: impl Into<String>,
        config: Arc<dyn Config>,
    ) -> Result<Self> {
        let name = name.into();
        if self.children.iter().any(|(existing, _)| *existing == name) {
            return Err(ConfigError::DuplicateName { name });
        }
        self.children.push((name, config));
        Ok(self)
    }

    /// Builds the composite.
    pub fn build(self) -> Result<Arc<CompositeConfig>> {
        let name = self.name.unwrap_or_else(|| "composite".to_string());
        let composite = CompositeConfig::new(name);
        for (name, config) in self.children {
            composite.add_config(name, config)?;
        }
        Ok(composite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{MapConfig, SettableConfig};

    fn leaf(pairs: &[(&str, &str)]) -> Arc<dyn Config> {
        let mut builder = MapConfig::builder();
        for (k, v) in pairs {
            builder = builder.put(*k, *v);
        }
        Arc::new(builder.build())
    }

    #[test]
    fn test_first_child_wins() {
        let composite = CompositeConfig::new("c");
        composite.add_config("a", leaf(&[("k", "from-a")])).unwrap();
        composite.add_config("b", leaf(&[("k", "from-b"), ("only-b", "1")])).unwrap();
        assert_eq!(composite.get_raw_property("k").as_deref(), Some("from-a"));
        assert_eq!(composite.get_raw_property("only-b").as_deref(), Some("1"));
    }

    #[test]
    fn test_insert_at_front_takes_precedence() {
        let composite = CompositeConfig::new("c");
        composite.add_config("a", leaf(&[("k", "from-a")])).unwrap();
        composite.insert_config(0, "b", leaf(&[("k", "from-b")])).unwrap();
        assert_eq!(composite.config_names(), vec!["b", "a"]);
        assert_eq!(composite.get_raw_property("k").as_deref(), Some("from-b"));
    }

    #[test]
    fn test_duplicate_name() {
        let composite = CompositeConfig::new("c");
        composite.add_config("a", leaf(&[])).unwrap();
        let err = composite.add_config("a", leaf(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateName { ref name } if name == "a"));
        assert_eq!(composite.child_count(), 1);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let composite = CompositeConfig::new("c");
        assert!(composite.remove_config("missing").is_none());
    }

    #[test]
    fn test_remove_unsubscribes_child() {
        let composite = CompositeConfig::new("c");
        let child = Arc::new(SettableConfig::new());
        composite.add_config("child", child.clone()).unwrap();
        assert_eq!(child.listener_count(), 1);
        composite.remove_config("child").unwrap();
        assert_eq!(child.listener_count(), 0);
    }

    #[test]
    fn test_drop_unsubscribes_children() {
        let child = Arc::new(SettableConfig::new());
        let composite = CompositeConfig::new("c");
        composite.add_config("child", child.clone()).unwrap();
        drop(composite);
        assert_eq!(child.listener_count(), 0);
    }

    #[test]
    fn test_replace_keeps_position() {
        let composite = CompositeConfig::new("c");
        let first = Arc::new(SettableConfig::new());
        composite.add_config("a", first.clone()).unwrap();
        composite.add_config("b", leaf(&[("k", "b")])).unwrap();
        let old = composite.replace_config("a", leaf(&[("k", "a2")]));
        assert!(old.is_some());
        assert_eq!(first.listener_count(), 0);
        assert_eq!(composite.config_names(), vec!["a", "b"]);
        assert_eq!(composite.get_raw_property("k").as_deref(), Some("a2"));
    }

    #[test]
    fn test_keys_are_deduplicated_in_precedence_order() {
        let composite = CompositeConfig::new("c");
        composite.add_config("a", leaf(&[("y", "1"), ("z", "1")])).unwrap();
        composite.add_config("b", leaf(&[("x", "2"), ("y", "2")])).unwrap();
        assert_eq!(composite.keys().collect::<Vec<_>>(), vec!["y", "z", "x"]);
    }

    #[test]
    fn test_falls_through_to_parent() {
        let parent: Arc<dyn Config> = leaf(&[("fallback", "p")]);
        let composite = CompositeConfig::new("c");
        composite.set_parent(&parent);
        assert_eq!(composite.get_raw_property("fallback").as_deref(), Some("p"));
        assert!(!composite.keys().any(|k| k == "fallback"));
    }

    /// Fires an update from inside `add_listener`, as a source that replays
    /// its current state to new listeners would.
    struct ReplayingConfig {
        core: ConfigCore,
    }

    impl Config for ReplayingConfig {
        fn core(&self) -> &ConfigCore {
            &self.core
        }

        fn get_raw_property_uninstrumented(&self, key: &str) -> Option<String> {
            (key == "k").then(|| "v".to_string())
        }

        fn keys(&self) -> Keys {
            Keys::from(vec!["k".to_string()])
        }

        fn add_listener(&self, listener: Arc<dyn ConfigListener>) -> ListenerId {
            let id = self.core.add_listener(listener);
            self.core
                .fire_config_updated(self, &PropertyChange::updated("k", "v"));
            id
        }
    }

    struct ReadOnUpdate {
        seen: Mutex<Vec<Option<String>>>,
    }

    impl ConfigListener for ReadOnUpdate {
        fn on_config_updated(&self, config: &dyn Config, _change: &PropertyChange) {
            self.seen.lock().push(config.get_raw_property("k"));
        }
    }

    #[test]
    fn test_child_is_visible_to_events_fired_on_subscribe() {
        let composite = CompositeConfig::new("c");
        let listener = Arc::new(ReadOnUpdate {
            seen: Mutex::new(Vec::new()),
        });
        composite.add_listener(listener.clone());

        let replaying = Arc::new(ReplayingConfig {
            core: ConfigCore::new("replaying"),
        });
        composite.add_config("replaying", replaying.clone()).unwrap();
        assert_eq!(*listener.seen.lock(), vec![Some("v".to_string())]);

        composite.replace_config("replaying", replaying.clone());
        assert_eq!(listener.seen.lock().len(), 2);
        assert_eq!(listener.seen.lock()[1].as_deref(), Some("v"));
        assert_eq!(replaying.listener_count(), 1);
        composite.remove_config("replaying");
        assert_eq!(replaying.listener_count(), 0);
    }
}
