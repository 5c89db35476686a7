// SPDX-License-Identifier: MIT OR Apache-2.0

//! Immutable in-memory config.

use crate::domain::ConfigCore;
use crate::ports::{Config, Keys};
use std::collections::BTreeMap;
use std::fmt;

/// A config whose properties are fixed at construction.
///
/// Useful for defaults layered under mutable sources. Keys are enumerated in
/// sorted order.
///
/// # Examples
///
/// ```rust
/// use livecfg::prelude::*;
///
/// let defaults = MapConfig::builder()
///     .name("defaults")
///     .put("pool.size", 8)
///     .put("pool.name", "main")
///     .build();
///
/// assert_eq!(defaults.name(), "defaults");
/// assert_eq!(defaults.get_integer("pool.size").unwrap(), Some(8));
/// ```
pub struct MapConfig {
    core: ConfigCore,
    props: BTreeMap<String, String>,
}

impl MapConfig {
    /// Starts building a map config.
    pub fn builder() -> MapConfigBuilder {
        MapConfigBuilder::default()
    }
}

impl Config for MapConfig {
    fn core(&self) -> &ConfigCore {
        &self.core
    }

    fn get_raw_property_uninstrumented(&self, key: &str) -> Option<String> {
        self.props.get(key).cloned()
    }

    fn keys(&self) -> Keys {
        self.props.keys().cloned().collect()
    }

    fn for_each_property_uninstrumented(&self, f: &mut dyn FnMut(&str, &str)) {
        for (key, value) in &self.props {
            f(key, value);
        }
    }

    fn is_empty(&self) -> bool {
        self.props.is_empty()
    }
}

impl fmt::Debug for MapConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapConfig")
            .field("name", &self.name())
            .field("props", &self.props)
            .finish()
    }
}

/// Builder for [`MapConfig`].
#[derive(Debug, Default)]
pub struct MapConfigBuilder {
    name: Option<String>,
    props: BTreeMap<String, String>,
}

impl MapConfigBuilder {
    /// Sets the config name. Defaults to `map`.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Adds one property, replacing an earlier value for the same key.
    pub fn put(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.props.insert(key.into(), value.to_string());
        self
    }

    /// Adds every pair from `properties`.
    pub fn put_all<I, K, V>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToString,
    {
        self.props.extend(
            properties
                .into_iter()
                .map(|(k, v)| (k.into(), v.to_string())),
        );
        self
    }

    /// Builds the config.
    pub fn build(self) -> MapConfig {
        MapConfig {
            core: ConfigCore::new(self.name.unwrap_or_else(|| "map".to_string())),
            props: self.props,
        }
    }
}
