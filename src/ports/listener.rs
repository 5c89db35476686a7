// SPDX-License-Identifier: MIT OR Apache-2.0

//! Change listener trait definition.
//!
//! A [`ConfigListener`] is registered on any config with
//! [`Config::add_listener`](crate::ports::Config::add_listener). Callbacks run
//! synchronously on the thread that performed the mutation, after the new
//! state is visible, so they should return quickly.

use crate::domain::{ConfigError, PropertyChange};
use crate::ports::Config;

/// Receives structural, value and error notifications from a config.
///
/// Every method has an empty default so implementors only override what they
/// care about. The `config` argument is always the config the listener was
/// registered on: a composite re-emits its children's events with itself as
/// the argument, and views do the same.
///
/// # Examples
///
/// ```rust
/// use livecfg::prelude::*;
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// #[derive(Default)]
/// struct Counter(AtomicUsize);
///
/// impl ConfigListener for Counter {
///     fn on_config_updated(&self, _config: &dyn Config, _change: &PropertyChange) {
///         self.0.fetch_add(1, Ordering::SeqCst);
///     }
/// }
///
/// let config = SettableConfig::new();
/// let counter = Arc::new(Counter::default());
/// config.add_listener(counter.clone());
/// config.set_property("a", "1");
/// assert_eq!(counter.0.load(Ordering::SeqCst), 1);
/// ```
pub trait ConfigListener: Send + Sync {
    /// A child config became visible through `config`.
    ///
    /// Listeners should re-query rather than expect per-key changes: the new
    /// child may supply any number of keys.
    fn on_config_added(&self, config: &dyn Config) {
        let _ = config;
    }

    /// A child config stopped being visible through `config`.
    fn on_config_removed(&self, config: &dyn Config) {
        let _ = config;
    }

    /// The raw value of a single key changed.
    fn on_config_updated(&self, config: &dyn Config, change: &PropertyChange) {
        let _ = (config, change);
    }

    /// A source behind `config` failed, e.g. a polling fetch.
    fn on_error(&self, error: &ConfigError, config: &dyn Config) {
        let _ = (error, config);
    }
}
